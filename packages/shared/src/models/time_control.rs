use chess::Color;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub const DEFAULT_TIME_CONTROL: &str = "10+10";

/// Base time plus per-move increment, stored on a match as `"<minutes>+<seconds>"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeControl {
    pub base_secs: u32,
    pub increment_secs: u32,
}

impl Default for TimeControl {
    fn default() -> Self {
        TimeControl {
            base_secs: 600,
            increment_secs: 10,
        }
    }
}

impl FromStr for TimeControl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (minutes, increment) = s
            .split_once('+')
            .ok_or_else(|| format!("Invalid time control: {}", s))?;
        let minutes: u32 = minutes
            .trim()
            .parse()
            .map_err(|_| format!("Invalid base minutes in time control: {}", s))?;
        let increment_secs: u32 = increment
            .trim()
            .parse()
            .map_err(|_| format!("Invalid increment in time control: {}", s))?;

        if minutes == 0 {
            return Err(format!("Time control must allow some base time: {}", s));
        }

        let base_secs = minutes
            .checked_mul(60)
            .ok_or_else(|| format!("Base time too long in time control: {}", s))?;

        Ok(TimeControl {
            base_secs,
            increment_secs,
        })
    }
}

impl std::fmt::Display for TimeControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.base_secs / 60, self.increment_secs)
    }
}

/// Client-side countdown for both colours. Only runs while the owning client
/// is alive; the store never enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchClock {
    white_remaining: u32,
    black_remaining: u32,
    increment_secs: u32,
}

impl MatchClock {
    pub fn new(time_control: TimeControl) -> Self {
        MatchClock {
            white_remaining: time_control.base_secs,
            black_remaining: time_control.base_secs,
            increment_secs: time_control.increment_secs,
        }
    }

    pub fn remaining(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white_remaining,
            Color::Black => self.black_remaining,
        }
    }

    /// Charges `secs` to `color`. Returns the colour whose time ran out, if any.
    pub fn tick(&mut self, color: Color, secs: u32) -> Option<Color> {
        let remaining = self.remaining_mut(color);
        *remaining = remaining.saturating_sub(secs);
        if *remaining == 0 {
            Some(color)
        } else {
            None
        }
    }

    pub fn credit_increment(&mut self, color: Color) {
        let increment = self.increment_secs;
        let remaining = self.remaining_mut(color);
        *remaining = remaining.saturating_add(increment);
    }

    pub fn is_flagged(&self) -> Option<Color> {
        if self.white_remaining == 0 {
            Some(Color::White)
        } else if self.black_remaining == 0 {
            Some(Color::Black)
        } else {
            None
        }
    }

    fn remaining_mut(&mut self, color: Color) -> &mut u32 {
        match color {
            Color::White => &mut self.white_remaining,
            Color::Black => &mut self.black_remaining,
        }
    }
}
