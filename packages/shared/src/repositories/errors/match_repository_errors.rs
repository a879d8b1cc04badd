#[derive(Debug)]
pub enum MatchRepositoryError {
    NotFound,
    /// The store rejected a conditional write: the row changed since it was read.
    ConditionFailed(String),
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for MatchRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchRepositoryError::NotFound => write!(f, "Match not found"),
            MatchRepositoryError::ConditionFailed(msg) => {
                write!(f, "Conditional write rejected: {}", msg)
            }
            MatchRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            MatchRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for MatchRepositoryError {}
