use serde::{Deserialize, Serialize};

use crate::models::match_record::Match;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Current row pushed to a new subscriber; never produced by the stream.
    Snapshot,
}

impl ChangeKind {
    /// Maps a DynamoDB stream event name onto a change kind.
    pub fn from_stream_event(event_name: &str) -> Option<Self> {
        match event_name {
            "INSERT" => Some(ChangeKind::Insert),
            "MODIFY" => Some(ChangeKind::Update),
            "REMOVE" => Some(ChangeKind::Delete),
            _ => None,
        }
    }
}

/// One change-feed notification for a match row. `record` carries the new
/// snapshot, or the last known one for deletions when available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchChange {
    pub match_id: String,
    pub kind: ChangeKind,
    pub record: Option<Match>,
}

impl MatchChange {
    pub fn upserted(kind: ChangeKind, record: &Match) -> Self {
        MatchChange {
            match_id: record.id.clone(),
            kind,
            record: Some(record.clone()),
        }
    }

    pub fn deleted(match_id: &str, last_known: Option<Match>) -> Self {
        MatchChange {
            match_id: match_id.to_string(),
            kind: ChangeKind::Delete,
            record: last_known,
        }
    }
}
