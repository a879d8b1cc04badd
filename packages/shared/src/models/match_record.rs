use chess::Color;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Waiting,
    Active,
    Completed,
}

impl MatchStatus {
    /// Position in the lifecycle. Status only ever moves forward.
    pub fn rank(self) -> u8 {
        match self {
            MatchStatus::Waiting => 0,
            MatchStatus::Active => 1,
            MatchStatus::Completed => 2,
        }
    }

    pub fn can_transition_to(self, next: MatchStatus) -> bool {
        matches!(
            (self, next),
            (MatchStatus::Waiting, MatchStatus::Active)
                | (MatchStatus::Active, MatchStatus::Completed)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Waiting => "waiting",
            MatchStatus::Active => "active",
            MatchStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchTransitionError {
    InvalidTransition {
        from: MatchStatus,
        to: MatchStatus,
    },
    AlreadyPaired,
    SelfPairing,
    StaleMoveCount {
        expected: usize,
        actual: usize,
    },
    UnknownWinner(String),
}

impl std::fmt::Display for MatchTransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchTransitionError::InvalidTransition { from, to } => {
                write!(f, "Cannot move match from {} to {}", from, to)
            }
            MatchTransitionError::AlreadyPaired => write!(f, "Match already has two players"),
            MatchTransitionError::SelfPairing => write!(f, "A player cannot join their own match"),
            MatchTransitionError::StaleMoveCount { expected, actual } => write!(
                f,
                "Expected {} recorded moves but match has {}",
                expected, actual
            ),
            MatchTransitionError::UnknownWinner(id) => {
                write!(f, "Winner {} is not a participant", id)
            }
        }
    }
}

impl std::error::Error for MatchTransitionError {}

/// One game between two players, as stored in the matches table.
///
/// `version` is bumped on every write and lets clients discard snapshots they
/// have already seen. `expires_at` (epoch seconds) is only set while the
/// match is `waiting` and doubles as the table's TTL attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub player1_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player2_id: Option<String>,
    pub status: MatchStatus,
    #[serde(default)]
    pub moves: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner_id: Option<String>,
    pub time_control: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Match {
    pub fn new_waiting(player1_id: &str, time_control: &str, search_timeout: Duration) -> Self {
        let now = Utc::now();
        Match {
            id: Uuid::new_v4().to_string(),
            player1_id: player1_id.to_string(),
            player2_id: None,
            status: MatchStatus::Waiting,
            moves: vec![],
            winner_id: None,
            time_control: time_control.to_string(),
            version: 0,
            expires_at: Some((now + search_timeout).timestamp()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_participant(&self, player_id: &str) -> bool {
        self.player1_id == player_id || self.player2_id.as_deref() == Some(player_id)
    }

    /// Player one always plays white.
    pub fn color_of(&self, player_id: &str) -> Option<Color> {
        if self.player1_id == player_id {
            Some(Color::White)
        } else if self.player2_id.as_deref() == Some(player_id) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn player_for(&self, color: Color) -> Option<&str> {
        match color {
            Color::White => Some(self.player1_id.as_str()),
            Color::Black => self.player2_id.as_deref(),
        }
    }

    pub fn opponent_of(&self, player_id: &str) -> Option<&str> {
        match self.color_of(player_id)? {
            Color::White => self.player_for(Color::Black),
            Color::Black => self.player_for(Color::White),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == MatchStatus::Waiting
            && self
                .expires_at
                .map_or(false, |expires_at| expires_at <= now.timestamp())
    }

    pub fn pair(&mut self, player2_id: &str) -> Result<(), MatchTransitionError> {
        self.check_transition(MatchStatus::Active)?;
        if self.player2_id.is_some() {
            return Err(MatchTransitionError::AlreadyPaired);
        }
        if self.player1_id == player2_id {
            return Err(MatchTransitionError::SelfPairing);
        }

        self.player2_id = Some(player2_id.to_string());
        self.status = MatchStatus::Active;
        self.expires_at = None;
        self.touch();
        Ok(())
    }

    pub fn append_move(
        &mut self,
        expected_move_count: usize,
        notation: &str,
    ) -> Result<(), MatchTransitionError> {
        if self.status != MatchStatus::Active {
            return Err(MatchTransitionError::InvalidTransition {
                from: self.status,
                to: MatchStatus::Active,
            });
        }
        if self.moves.len() != expected_move_count {
            return Err(MatchTransitionError::StaleMoveCount {
                expected: expected_move_count,
                actual: self.moves.len(),
            });
        }

        self.moves.push(notation.to_string());
        self.touch();
        Ok(())
    }

    pub fn complete(&mut self, winner_id: Option<&str>) -> Result<(), MatchTransitionError> {
        self.check_transition(MatchStatus::Completed)?;
        if let Some(winner_id) = winner_id {
            if !self.is_participant(winner_id) {
                return Err(MatchTransitionError::UnknownWinner(winner_id.to_string()));
            }
        }

        self.status = MatchStatus::Completed;
        self.winner_id = winner_id.map(str::to_string);
        self.touch();
        Ok(())
    }

    fn check_transition(&self, next: MatchStatus) -> Result<(), MatchTransitionError> {
        if self.status.can_transition_to(next) {
            Ok(())
        } else {
            Err(MatchTransitionError::InvalidTransition {
                from: self.status,
                to: next,
            })
        }
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = Utc::now();
    }
}
