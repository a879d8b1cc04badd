use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlayerStats {
    pub friends: usize,
    pub wins: usize,
    pub total_matches: usize,
}
