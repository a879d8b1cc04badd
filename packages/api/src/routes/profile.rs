use axum::{extract::State, routing::get, Json, Router};
use lambda_http::tracing::error;
use shared::models::profile::{Profile, ProfileUpdate};
use shared::models::stats::PlayerStats;

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/profile/stats", get(get_stats))
}

async fn current_profile(
    state: &AppState,
    user: &AuthenticatedUser,
) -> Result<Profile, ApiError> {
    let email = user.email.as_deref().unwrap_or_default();
    state
        .profile_service
        .get_or_create_profile(&user.user_id, email)
        .await
        .map_err(|e| {
            error!("Failed to load profile {}: {}", user.user_id, e);
            ApiError::from(e)
        })
}

async fn get_profile(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<Profile>, ApiError> {
    current_profile(&state, &authenticated_user).await.map(Json)
}

async fn update_profile(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
    current_profile(&state, &authenticated_user).await?;
    let profile = state
        .profile_service
        .update_profile(&authenticated_user.user_id, &payload)
        .await?;
    Ok(Json(profile))
}

async fn get_stats(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<PlayerStats>, ApiError> {
    let stats = state
        .profile_service
        .get_stats(&authenticated_user.user_id)
        .await?;
    Ok(Json(stats))
}
