use std::sync::Arc;

use shared::repositories::connection_repository::ConnectionRepository;
use shared::repositories::match_repository::MatchRepository;

use crate::auth::WebSocketAuth;

#[derive(Clone)]
pub struct AppState {
    pub auth: WebSocketAuth,
    pub connections: Arc<dyn ConnectionRepository>,
    pub matches: Arc<dyn MatchRepository + Send + Sync>,
}
