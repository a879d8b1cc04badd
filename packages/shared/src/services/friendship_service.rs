use std::sync::Arc;
use tracing::info;

use crate::models::friendship::Friendship;
use crate::repositories::friendship_repository::FriendshipRepository;
use crate::repositories::match_repository::MatchRepository;
use crate::services::errors::friendship_service_errors::FriendshipServiceError;

#[derive(Clone)]
pub struct FriendshipService {
    friendships: Arc<dyn FriendshipRepository + Send + Sync>,
    matches: Arc<dyn MatchRepository + Send + Sync>,
}

impl FriendshipService {
    pub fn new(
        friendships: Arc<dyn FriendshipRepository + Send + Sync>,
        matches: Arc<dyn MatchRepository + Send + Sync>,
    ) -> Self {
        FriendshipService {
            friendships,
            matches,
        }
    }

    pub async fn send_request(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> Result<Friendship, FriendshipServiceError> {
        if requester_id.trim().is_empty() || target_id.trim().is_empty() {
            return Err(FriendshipServiceError::ValidationError(
                "Player IDs cannot be empty".to_string(),
            ));
        }
        if requester_id == target_id {
            return Err(FriendshipServiceError::ValidationError(
                "Players cannot befriend themselves".to_string(),
            ));
        }

        let request = Friendship::new_request(requester_id, target_id);
        self.friendships.create_friendship(&request).await?;

        info!("Player {} sent a friend request to {}", requester_id, target_id);
        Ok(request)
    }

    /// Sends a request to whoever `requester_id` played in `match_id`.
    pub async fn befriend_opponent(
        &self,
        requester_id: &str,
        match_id: &str,
    ) -> Result<Friendship, FriendshipServiceError> {
        let record = self
            .matches
            .get_match(match_id)
            .await?
            .ok_or(FriendshipServiceError::MatchNotFound)?;

        let opponent_id = record
            .opponent_of(requester_id)
            .ok_or(FriendshipServiceError::NotParticipant)?
            .to_string();

        self.send_request(requester_id, &opponent_id).await
    }

    /// `target_id` accepts the pending request `requester_id` sent them.
    pub async fn accept_request(
        &self,
        requester_id: &str,
        target_id: &str,
    ) -> Result<(), FriendshipServiceError> {
        let pair_key = Friendship::pair_key(requester_id, target_id);
        self.friendships
            .accept_friendship(&pair_key, target_id)
            .await?;

        info!("Player {} accepted {}'s friend request", target_id, requester_id);
        Ok(())
    }
}
