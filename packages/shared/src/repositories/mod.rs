pub mod connection_repository;
pub mod errors;
pub mod friendship_repository;
pub mod in_memory_match_repository;
pub mod match_repository;
pub mod profile_repository;
