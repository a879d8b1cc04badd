use serde::{Deserialize, Serialize};

use crate::models::change::MatchChange;

/// Messages pushed to WebSocket clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ServerFrame {
    MatchChange(MatchChange),
    Subscribed { match_id: String },
    Unsubscribed,
    Error { message: String },
}

impl ServerFrame {
    pub fn error(message: impl Into<String>) -> Self {
        ServerFrame::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Messages WebSocket clients send on the `subscribe` and `unsubscribe` routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientFrame {
    Subscribe { match_id: String },
    Unsubscribe,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::change::ChangeKind;
    use crate::models::match_record::Match;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_change_frame_is_flattened_under_action() {
        let record = Match::new_waiting("alice", "10+10", Duration::seconds(60));
        let frame = ServerFrame::MatchChange(MatchChange::upserted(ChangeKind::Snapshot, &record));

        let value = serde_json::to_value(&frame).unwrap();

        assert_eq!(value["action"], "match_change");
        assert_eq!(value["kind"], "snapshot");
        assert_eq!(value["match_id"], record.id.as_str());
        assert_eq!(value["record"]["player1_id"], "alice");
    }

    #[test]
    fn test_client_frames_parse() {
        let subscribe: ClientFrame =
            serde_json::from_value(json!({"action": "subscribe", "match_id": "m-1"})).unwrap();
        assert_eq!(
            subscribe,
            ClientFrame::Subscribe {
                match_id: "m-1".to_string()
            }
        );

        let unsubscribe: ClientFrame =
            serde_json::from_value(json!({"action": "unsubscribe"})).unwrap();
        assert_eq!(unsubscribe, ClientFrame::Unsubscribe);

        assert!(serde_json::from_value::<ClientFrame>(json!({"action": "dance"})).is_err());
    }

    #[test]
    fn test_error_frame() {
        let json = ServerFrame::error("Unknown action").to_json().unwrap();
        assert_eq!(json, r#"{"action":"error","message":"Unknown action"}"#);
    }
}
