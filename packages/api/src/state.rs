use std::sync::Arc;

use shared::repositories::match_repository::MatchRepository;
use shared::repositories::profile_repository::ProfileRepository;
use shared::services::auth_service::AuthServiceTrait;
use shared::services::friendship_service::FriendshipService;
use shared::services::matchmaking_service::MatchmakingService;
use shared::services::profile_service::ProfileService;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthServiceTrait>,
    pub matchmaking_service: Arc<MatchmakingService>,
    pub profile_service: Arc<ProfileService>,
    pub friendship_service: Arc<FriendshipService>,
    /// Match sessions are opened per request against these.
    pub matches: Arc<dyn MatchRepository + Send + Sync>,
    pub profiles: Arc<dyn ProfileRepository + Send + Sync>,
}
