use crate::repositories::errors::friendship_repository_errors::FriendshipRepositoryError;
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::repositories::errors::profile_repository_errors::ProfileRepositoryError;

#[derive(Debug)]
pub enum ProfileServiceError {
    ProfileNotFound,
    ValidationError(String),
    RepositoryError(ProfileRepositoryError),
    StatsError(String),
}

impl std::fmt::Display for ProfileServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileServiceError::ProfileNotFound => write!(f, "Profile not found"),
            ProfileServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ProfileServiceError::RepositoryError(err) => write!(f, "Repository error: {}", err),
            ProfileServiceError::StatsError(msg) => {
                write!(f, "Could not compute statistics: {}", msg)
            }
        }
    }
}

impl std::error::Error for ProfileServiceError {}

impl From<ProfileRepositoryError> for ProfileServiceError {
    fn from(err: ProfileRepositoryError) -> Self {
        match err {
            ProfileRepositoryError::NotFound => ProfileServiceError::ProfileNotFound,
            other => ProfileServiceError::RepositoryError(other),
        }
    }
}

impl From<MatchRepositoryError> for ProfileServiceError {
    fn from(err: MatchRepositoryError) -> Self {
        ProfileServiceError::StatsError(err.to_string())
    }
}

impl From<FriendshipRepositoryError> for ProfileServiceError {
    fn from(err: FriendshipRepositoryError) -> Self {
        ProfileServiceError::StatsError(err.to_string())
    }
}
