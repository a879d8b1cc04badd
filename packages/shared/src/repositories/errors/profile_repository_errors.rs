#[derive(Debug)]
pub enum ProfileRepositoryError {
    NotFound,
    AlreadyExists,
    Serialization(String),
    DynamoDb(String),
}

impl std::fmt::Display for ProfileRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileRepositoryError::NotFound => write!(f, "Profile not found"),
            ProfileRepositoryError::AlreadyExists => write!(f, "Profile already exists"),
            ProfileRepositoryError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            ProfileRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
        }
    }
}

impl std::error::Error for ProfileRepositoryError {}
