use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_RATING: i32 = 1200;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Profile {
    pub id: String,
    pub email: String,
    pub username: String,
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chess_interests: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Seed profile for a user seen for the first time. The username defaults
    /// to the local part of their e-mail address.
    pub fn new(id: &str, email: &str) -> Self {
        let now = Utc::now();
        let username = email
            .split('@')
            .next()
            .filter(|local| !local.is_empty())
            .unwrap_or(id)
            .to_string();

        Profile {
            id: id.to_string(),
            email: email.to_string(),
            username,
            rating: DEFAULT_RATING,
            avatar_url: None,
            bio: None,
            chess_interests: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: &ProfileUpdate) {
        if let Some(username) = &update.username {
            self.username = username.trim().to_string();
        }
        if let Some(bio) = &update.bio {
            self.bio = non_empty(bio);
        }
        if let Some(chess_interests) = &update.chess_interests {
            self.chess_interests = non_empty(chess_interests);
        }
        if let Some(avatar_url) = &update.avatar_url {
            self.avatar_url = non_empty(avatar_url);
        }
        self.updated_at = Utc::now();
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Fields a user may edit on their own profile. `None` leaves a field as is,
/// an empty string clears an optional field.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub chess_interests: Option<String>,
    pub avatar_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_defaults() {
        let profile = Profile::new("user-1", "magnus@example.com");

        assert_eq!(profile.id, "user-1");
        assert_eq!(profile.username, "magnus");
        assert_eq!(profile.rating, DEFAULT_RATING);
        assert!(profile.avatar_url.is_none());
        assert!(profile.bio.is_none());
    }

    #[test]
    fn test_new_profile_without_local_part_falls_back_to_id() {
        let profile = Profile::new("user-1", "@example.com");
        assert_eq!(profile.username, "user-1");
    }

    #[test]
    fn test_apply_update_sets_and_clears_fields() {
        let mut profile = Profile::new("user-1", "magnus@example.com");
        profile.bio = Some("old bio".to_string());

        profile.apply_update(&ProfileUpdate {
            username: Some("  carlsen ".to_string()),
            bio: Some("".to_string()),
            chess_interests: Some("endgames".to_string()),
            avatar_url: None,
        });

        assert_eq!(profile.username, "carlsen");
        assert!(profile.bio.is_none());
        assert_eq!(profile.chess_interests.as_deref(), Some("endgames"));
        assert!(profile.avatar_url.is_none());
    }
}
