use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shared::services::errors::{
    auth_service_errors::AuthServiceError, chess_service_errors::ChessServiceError,
    friendship_service_errors::FriendshipServiceError, match_session_errors::MatchSessionError,
    matchmaking_service_errors::MatchmakingServiceError,
    profile_service_errors::ProfileServiceError,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    AuthService(AuthServiceError),
    Matchmaking(MatchmakingServiceError),
    MatchSession(MatchSessionError),
    Profile(ProfileServiceError),
    Friendship(FriendshipServiceError),
    BadRequest(String),
    Unauthorized,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::AuthService(err) => write!(f, "{}", err),
            ApiError::Matchmaking(err) => write!(f, "{}", err),
            ApiError::MatchSession(err) => write!(f, "{}", err),
            ApiError::Profile(err) => write!(f, "{}", err),
            ApiError::Friendship(err) => write!(f, "{}", err),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized => write!(f, "Missing or malformed bearer token"),
        }
    }
}

impl From<AuthServiceError> for ApiError {
    fn from(error: AuthServiceError) -> Self {
        ApiError::AuthService(error)
    }
}

impl From<MatchmakingServiceError> for ApiError {
    fn from(error: MatchmakingServiceError) -> Self {
        ApiError::Matchmaking(error)
    }
}

impl From<MatchSessionError> for ApiError {
    fn from(error: MatchSessionError) -> Self {
        ApiError::MatchSession(error)
    }
}

impl From<ProfileServiceError> for ApiError {
    fn from(error: ProfileServiceError) -> Self {
        ApiError::Profile(error)
    }
}

impl From<FriendshipServiceError> for ApiError {
    fn from(error: FriendshipServiceError) -> Self {
        ApiError::Friendship(error)
    }
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::AuthService(
                AuthServiceError::InvalidToken | AuthServiceError::ExpiredToken,
            ) => StatusCode::UNAUTHORIZED,
            ApiError::AuthService(AuthServiceError::Config(_) | AuthServiceError::JwtError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::Matchmaking(MatchmakingServiceError::ValidationError(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Matchmaking(MatchmakingServiceError::MatchNotFound) => StatusCode::NOT_FOUND,
            ApiError::Matchmaking(MatchmakingServiceError::NotOwner) => StatusCode::FORBIDDEN,
            ApiError::Matchmaking(MatchmakingServiceError::SearchTimedOut) => {
                StatusCode::REQUEST_TIMEOUT
            }
            ApiError::Matchmaking(MatchmakingServiceError::SearchCancelled) => StatusCode::CONFLICT,
            ApiError::Matchmaking(MatchmakingServiceError::RepositoryError(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            ApiError::MatchSession(MatchSessionError::MatchNotFound) => StatusCode::NOT_FOUND,
            ApiError::MatchSession(MatchSessionError::NotParticipant) => StatusCode::FORBIDDEN,
            ApiError::MatchSession(MatchSessionError::IllegalMove(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::MatchSession(
                MatchSessionError::NotActive
                | MatchSessionError::NotYourTurn
                | MatchSessionError::Conflict(_)
                | MatchSessionError::AlreadyCompleted
                | MatchSessionError::ChessError(ChessServiceError::GameOver),
            ) => StatusCode::CONFLICT,
            ApiError::MatchSession(
                MatchSessionError::ChessError(_) | MatchSessionError::RepositoryError(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,

            ApiError::Profile(ProfileServiceError::ProfileNotFound) => StatusCode::NOT_FOUND,
            ApiError::Profile(ProfileServiceError::ValidationError(_)) => StatusCode::BAD_REQUEST,
            ApiError::Profile(
                ProfileServiceError::RepositoryError(_) | ProfileServiceError::StatsError(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,

            ApiError::Friendship(FriendshipServiceError::ValidationError(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Friendship(FriendshipServiceError::AlreadyRequested) => StatusCode::CONFLICT,
            ApiError::Friendship(
                FriendshipServiceError::RequestNotFound | FriendshipServiceError::MatchNotFound,
            ) => StatusCode::NOT_FOUND,
            ApiError::Friendship(FriendshipServiceError::NotParticipant) => StatusCode::FORBIDDEN,
            ApiError::Friendship(
                FriendshipServiceError::RepositoryError(_)
                | FriendshipServiceError::MatchRepositoryError(_),
            ) => StatusCode::INTERNAL_SERVER_ERROR,

            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
