use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

/// A friend request from `user_id` to `friend_id`.
/// Keyed by `pair_key` so that only one request can exist per pair of users,
/// whichever of them sent it.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Friendship {
    pub pair_key: String,
    pub user_id: String,
    pub friend_id: String,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
}

impl Friendship {
    pub fn new_request(user_id: &str, friend_id: &str) -> Self {
        Friendship {
            pair_key: Self::pair_key(user_id, friend_id),
            user_id: user_id.to_string(),
            friend_id: friend_id.to_string(),
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn pair_key(a: &str, b: &str) -> String {
        if a <= b {
            format!("{}#{}", a, b)
        } else {
            format!("{}#{}", b, a)
        }
    }

    pub fn involves(&self, user_id: &str) -> bool {
        self.user_id == user_id || self.friend_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_key_is_order_independent() {
        assert_eq!(
            Friendship::pair_key("alice", "bob"),
            Friendship::pair_key("bob", "alice")
        );
        assert_eq!(Friendship::pair_key("alice", "bob"), "alice#bob");
    }

    #[test]
    fn test_new_request_is_pending() {
        let request = Friendship::new_request("bob", "alice");

        assert_eq!(request.status, FriendshipStatus::Pending);
        assert_eq!(request.user_id, "bob");
        assert_eq!(request.friend_id, "alice");
        assert_eq!(request.pair_key, "alice#bob");
        assert!(request.involves("alice"));
        assert!(!request.involves("carol"));
    }
}
