use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/friends/{requester_id}/accept", post(accept_request))
}

async fn accept_request(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(requester_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .friendship_service
        .accept_request(&requester_id, &authenticated_user.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
