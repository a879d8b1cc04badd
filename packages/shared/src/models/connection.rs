use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A live WebSocket connection and the match it currently follows.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Connection {
    pub connection_id: String,
    pub player_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    pub connected_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(connection_id: &str, player_id: &str) -> Self {
        Connection {
            connection_id: connection_id.to_string(),
            player_id: player_id.to_string(),
            match_id: None,
            connected_at: Utc::now(),
        }
    }
}
