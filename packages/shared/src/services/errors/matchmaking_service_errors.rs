use crate::repositories::errors::match_repository_errors::MatchRepositoryError;

#[derive(Debug)]
pub enum MatchmakingServiceError {
    ValidationError(String),
    RepositoryError(MatchRepositoryError),
    /// No opponent joined before the waiting match expired.
    SearchTimedOut,
    /// The waiting match was removed while the player was still waiting.
    SearchCancelled,
    MatchNotFound,
    NotOwner,
}

impl std::fmt::Display for MatchmakingServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchmakingServiceError::ValidationError(msg) => {
                write!(f, "Validation error: {}", msg)
            }
            MatchmakingServiceError::RepositoryError(err) => {
                write!(f, "Repository error: {}", err)
            }
            MatchmakingServiceError::SearchTimedOut => {
                write!(f, "No opponent found before the search expired")
            }
            MatchmakingServiceError::SearchCancelled => write!(f, "Search was cancelled"),
            MatchmakingServiceError::MatchNotFound => write!(f, "Match not found"),
            MatchmakingServiceError::NotOwner => {
                write!(f, "Only the player who opened a search may cancel it")
            }
        }
    }
}

impl std::error::Error for MatchmakingServiceError {}

impl From<MatchRepositoryError> for MatchmakingServiceError {
    fn from(err: MatchRepositoryError) -> Self {
        match err {
            MatchRepositoryError::NotFound => MatchmakingServiceError::MatchNotFound,
            other => MatchmakingServiceError::RepositoryError(other),
        }
    }
}
