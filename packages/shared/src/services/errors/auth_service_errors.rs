use std::fmt;

use crate::config::ConfigError;

#[derive(Debug)]
pub enum AuthServiceError {
    Config(ConfigError),
    JwtError(String),
    InvalidToken,
    ExpiredToken,
}

impl fmt::Display for AuthServiceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthServiceError::Config(err) => write!(f, "Configuration error: {}", err),
            AuthServiceError::JwtError(msg) => write!(f, "JWT error: {}", msg),
            AuthServiceError::InvalidToken => write!(f, "Invalid JWT token"),
            AuthServiceError::ExpiredToken => write!(f, "JWT token has expired"),
        }
    }
}

impl std::error::Error for AuthServiceError {}

impl From<ConfigError> for AuthServiceError {
    fn from(err: ConfigError) -> Self {
        AuthServiceError::Config(err)
    }
}
