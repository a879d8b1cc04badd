#[derive(Debug)]
pub enum ConnectionRepositoryError {
    NotFound,
    /// The WebSocket peer has already disconnected.
    Gone(String),
    DynamoDb(String),
    ApiGateway(String),
}

impl std::fmt::Display for ConnectionRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionRepositoryError::NotFound => write!(f, "Connection not found"),
            ConnectionRepositoryError::Gone(id) => write!(f, "Connection {} is gone", id),
            ConnectionRepositoryError::DynamoDb(msg) => write!(f, "DynamoDB error: {}", msg),
            ConnectionRepositoryError::ApiGateway(msg) => {
                write!(f, "API Gateway error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConnectionRepositoryError {}
