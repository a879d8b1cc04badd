pub mod auth_service_errors;
pub mod chess_service_errors;
pub mod friendship_service_errors;
pub mod match_session_errors;
pub mod matchmaking_service_errors;
pub mod profile_service_errors;
