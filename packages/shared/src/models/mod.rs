pub mod auth;
pub mod change;
pub mod connection;
pub mod frames;
pub mod friendship;
pub mod match_record;
pub mod profile;
pub mod stats;
pub mod time_control;
