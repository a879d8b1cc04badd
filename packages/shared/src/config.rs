use chrono::Duration;
use std::env;

use crate::models::time_control::{TimeControl, DEFAULT_TIME_CONTROL};

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(String),
    Invalid { name: String, value: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{} environment variable must be set", name)
            }
            ConfigError::Invalid { name, value } => {
                write!(f, "{} has an invalid value: {}", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

pub fn env_var(name: &str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name.to_string())),
    }
}

pub fn env_var_or(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError> {
    let value = env_var_or(name, default);
    value.parse().map_err(|_| ConfigError::Invalid {
        name: name.to_string(),
        value,
    })
}

/// Tunables for the matchmaking coordinator.
#[derive(Debug, Clone)]
pub struct MatchmakingConfig {
    /// How long a `waiting` match stays open before it is abandoned.
    pub search_timeout: Duration,
    /// How many times a search retries after losing a join race.
    pub max_join_attempts: usize,
    pub time_control: String,
}

impl Default for MatchmakingConfig {
    fn default() -> Self {
        MatchmakingConfig {
            search_timeout: Duration::seconds(60),
            max_join_attempts: 3,
            time_control: DEFAULT_TIME_CONTROL.to_string(),
        }
    }
}

impl MatchmakingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs: i64 = parse_var("MATCHMAKING_TIMEOUT_SECS", "60")?;
        let max_join_attempts: usize = parse_var("MATCHMAKING_MAX_JOIN_ATTEMPTS", "3")?;
        let time_control = env_var_or("DEFAULT_TIME_CONTROL", DEFAULT_TIME_CONTROL);

        if timeout_secs <= 0 {
            return Err(ConfigError::Invalid {
                name: "MATCHMAKING_TIMEOUT_SECS".to_string(),
                value: timeout_secs.to_string(),
            });
        }
        if time_control.parse::<TimeControl>().is_err() {
            return Err(ConfigError::Invalid {
                name: "DEFAULT_TIME_CONTROL".to_string(),
                value: time_control,
            });
        }

        Ok(MatchmakingConfig {
            search_timeout: Duration::seconds(timeout_secs),
            max_join_attempts: max_join_attempts.max(1),
            time_control,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_reports_missing_name() {
        let result = env_var("CHESS_CONFIG_TEST_SURELY_UNSET");
        assert_eq!(
            result,
            Err(ConfigError::Missing(
                "CHESS_CONFIG_TEST_SURELY_UNSET".to_string()
            ))
        );
    }

    #[test]
    fn test_env_var_or_uses_default() {
        assert_eq!(
            env_var_or("CHESS_CONFIG_TEST_SURELY_UNSET", "fallback"),
            "fallback"
        );
    }

    #[test]
    fn test_default_matchmaking_config() {
        let config = MatchmakingConfig::default();

        assert_eq!(config.search_timeout, Duration::seconds(60));
        assert_eq!(config.max_join_attempts, 3);
        assert_eq!(config.time_control, "10+10");
    }
}
