pub mod connection_repository_errors;
pub mod friendship_repository_errors;
pub mod match_repository_errors;
pub mod profile_repository_errors;
