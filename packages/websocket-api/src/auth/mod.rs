use shared::services::auth_service::AuthServiceTrait;
use shared::services::errors::auth_service_errors::AuthServiceError;
use std::sync::Arc;

#[derive(Clone)]
pub struct WebSocketAuth {
    auth_service: Arc<dyn AuthServiceTrait>,
}

impl WebSocketAuth {
    pub fn new(auth_service: Arc<dyn AuthServiceTrait>) -> Self {
        Self { auth_service }
    }

    /// Resolves the `token` query parameter of a `$connect` request to a
    /// player ID.
    pub fn authenticate_connection(&self, token: Option<&str>) -> Result<String, AuthServiceError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(AuthServiceError::InvalidToken)?;
        self.auth_service.extract_user_id_from_token(token)
    }
}
