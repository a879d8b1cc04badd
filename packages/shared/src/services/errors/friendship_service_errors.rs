use crate::repositories::errors::friendship_repository_errors::FriendshipRepositoryError;
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;

#[derive(Debug)]
pub enum FriendshipServiceError {
    ValidationError(String),
    AlreadyRequested,
    RequestNotFound,
    MatchNotFound,
    NotParticipant,
    RepositoryError(FriendshipRepositoryError),
    MatchRepositoryError(MatchRepositoryError),
}

impl std::fmt::Display for FriendshipServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FriendshipServiceError::ValidationError(msg) => {
                write!(f, "Validation error: {}", msg)
            }
            FriendshipServiceError::AlreadyRequested => {
                write!(f, "A friend request already exists between these players")
            }
            FriendshipServiceError::RequestNotFound => write!(f, "Friend request not found"),
            FriendshipServiceError::MatchNotFound => write!(f, "Match not found"),
            FriendshipServiceError::NotParticipant => {
                write!(f, "Player is not part of this match")
            }
            FriendshipServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            FriendshipServiceError::MatchRepositoryError(err) => {
                write!(f, "Match repository error: {}", err)
            }
        }
    }
}

impl std::error::Error for FriendshipServiceError {}

impl From<FriendshipRepositoryError> for FriendshipServiceError {
    fn from(err: FriendshipRepositoryError) -> Self {
        match err {
            FriendshipRepositoryError::AlreadyExists => FriendshipServiceError::AlreadyRequested,
            FriendshipRepositoryError::NotFound => FriendshipServiceError::RequestNotFound,
            other => FriendshipServiceError::RepositoryError(other),
        }
    }
}

impl From<MatchRepositoryError> for FriendshipServiceError {
    fn from(err: MatchRepositoryError) -> Self {
        match err {
            MatchRepositoryError::NotFound => FriendshipServiceError::MatchNotFound,
            other => FriendshipServiceError::MatchRepositoryError(other),
        }
    }
}
