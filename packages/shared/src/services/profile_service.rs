use std::sync::Arc;
use tracing::{debug, info};

use crate::models::profile::{Profile, ProfileUpdate};
use crate::models::stats::PlayerStats;
use crate::repositories::errors::profile_repository_errors::ProfileRepositoryError;
use crate::repositories::friendship_repository::FriendshipRepository;
use crate::repositories::match_repository::MatchRepository;
use crate::repositories::profile_repository::ProfileRepository;
use crate::services::errors::profile_service_errors::ProfileServiceError;

pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MAX_BIO_LENGTH: usize = 500;

#[derive(Clone)]
pub struct ProfileService {
    profiles: Arc<dyn ProfileRepository + Send + Sync>,
    matches: Arc<dyn MatchRepository + Send + Sync>,
    friendships: Arc<dyn FriendshipRepository + Send + Sync>,
}

impl ProfileService {
    pub fn new(
        profiles: Arc<dyn ProfileRepository + Send + Sync>,
        matches: Arc<dyn MatchRepository + Send + Sync>,
        friendships: Arc<dyn FriendshipRepository + Send + Sync>,
    ) -> Self {
        ProfileService {
            profiles,
            matches,
            friendships,
        }
    }

    /// Profiles are created the first time a signed-in user is seen.
    pub async fn get_or_create_profile(
        &self,
        user_id: &str,
        email: &str,
    ) -> Result<Profile, ProfileServiceError> {
        match self.profiles.get_profile(user_id).await {
            Ok(profile) => return Ok(profile),
            Err(ProfileRepositoryError::NotFound) => {}
            Err(err) => return Err(err.into()),
        }

        let profile = Profile::new(user_id, email);
        match self.profiles.create_profile(&profile).await {
            Ok(()) => {
                info!("Created profile for user {}", user_id);
                Ok(profile)
            }
            Err(ProfileRepositoryError::AlreadyExists) => {
                debug!("Profile for {} was created concurrently", user_id);
                Ok(self.profiles.get_profile(user_id).await?)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> Result<Profile, ProfileServiceError> {
        Ok(self.profiles.get_profile(user_id).await?)
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Profile, ProfileServiceError> {
        validate_update(update)?;

        let mut profile = self.profiles.get_profile(user_id).await?;
        profile.apply_update(update);
        self.profiles.update_profile(&profile).await?;

        info!("Updated profile for user {}", user_id);
        Ok(profile)
    }

    pub async fn get_stats(&self, user_id: &str) -> Result<PlayerStats, ProfileServiceError> {
        let friends = self.friendships.count_accepted(user_id).await?;
        let wins = self.matches.count_wins(user_id).await?;
        let total_matches = self.matches.count_completed(user_id).await?;

        Ok(PlayerStats {
            friends,
            wins,
            total_matches,
        })
    }
}

fn validate_update(update: &ProfileUpdate) -> Result<(), ProfileServiceError> {
    if let Some(username) = &update.username {
        let username = username.trim();
        if username.is_empty() {
            return Err(ProfileServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(ProfileServiceError::ValidationError(format!(
                "Username cannot be longer than {} characters",
                MAX_USERNAME_LENGTH
            )));
        }
    }
    if let Some(bio) = &update.bio {
        if bio.trim().chars().count() > MAX_BIO_LENGTH {
            return Err(ProfileServiceError::ValidationError(format!(
                "Bio cannot be longer than {} characters",
                MAX_BIO_LENGTH
            )));
        }
    }
    Ok(())
}
