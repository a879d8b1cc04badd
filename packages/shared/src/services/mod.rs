pub mod auth_service;
pub mod change_feed;
pub mod chess_service;
pub mod errors;
pub mod friendship_service;
pub mod match_session;
pub mod matchmaking_service;
pub mod profile_service;
