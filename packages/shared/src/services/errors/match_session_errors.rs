use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::services::errors::chess_service_errors::ChessServiceError;

#[derive(Debug)]
pub enum MatchSessionError {
    MatchNotFound,
    NotParticipant,
    /// The match is still waiting for a second player.
    NotActive,
    NotYourTurn,
    IllegalMove(String),
    /// Another write reached the match first; the session has been refreshed.
    Conflict(String),
    AlreadyCompleted,
    ChessError(ChessServiceError),
    RepositoryError(MatchRepositoryError),
}

impl std::fmt::Display for MatchSessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSessionError::MatchNotFound => write!(f, "Match not found"),
            MatchSessionError::NotParticipant => write!(f, "Player is not part of this match"),
            MatchSessionError::NotActive => write!(f, "Match has not started yet"),
            MatchSessionError::NotYourTurn => write!(f, "Not your turn"),
            MatchSessionError::IllegalMove(msg) => write!(f, "Illegal move: {}", msg),
            MatchSessionError::Conflict(msg) => write!(f, "Match changed concurrently: {}", msg),
            MatchSessionError::AlreadyCompleted => write!(f, "Match is already completed"),
            MatchSessionError::ChessError(err) => write!(f, "Chess error: {}", err),
            MatchSessionError::RepositoryError(err) => write!(f, "Repository error: {}", err),
        }
    }
}

impl std::error::Error for MatchSessionError {}

impl From<MatchRepositoryError> for MatchSessionError {
    fn from(err: MatchRepositoryError) -> Self {
        match err {
            MatchRepositoryError::NotFound => MatchSessionError::MatchNotFound,
            other => MatchSessionError::RepositoryError(other),
        }
    }
}

impl From<ChessServiceError> for MatchSessionError {
    fn from(err: ChessServiceError) -> Self {
        match err {
            ChessServiceError::InvalidSquare(_) | ChessServiceError::IllegalMove(_) => {
                MatchSessionError::IllegalMove(err.to_string())
            }
            other => MatchSessionError::ChessError(other),
        }
    }
}
