use axum::{
    extract::{Path, State},
    routing::{delete, post},
    Json, Router,
};
use lambda_http::tracing::{debug, error};
use serde::{Deserialize, Serialize};
use shared::models::match_record::Match;
use shared::services::matchmaking_service::SearchOutcome;

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matchmaking/search", post(search))
        .route("/matchmaking/{match_id}", delete(cancel))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    /// `joined` when a waiting match was taken, `waiting` when a new one was opened.
    pub outcome: String,
    #[serde(rename = "match")]
    pub record: Match,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CancelResponse {
    pub cancelled: bool,
}

async fn search(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
) -> Result<Json<SearchResponse>, ApiError> {
    let outcome = state
        .matchmaking_service
        .search(&authenticated_user.user_id)
        .await
        .map_err(|e| {
            error!("Search failed for {}: {}", authenticated_user.user_id, e);
            ApiError::from(e)
        })?;

    let response = match outcome {
        SearchOutcome::Joined(record) => SearchResponse {
            outcome: "joined".to_string(),
            record,
        },
        SearchOutcome::Waiting(record) => SearchResponse {
            outcome: "waiting".to_string(),
            record,
        },
    };
    debug!(
        "Player {} search outcome: {} ({})",
        authenticated_user.user_id, response.outcome, response.record.id
    );
    Ok(Json(response))
}

async fn cancel(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
) -> Result<Json<CancelResponse>, ApiError> {
    let cancelled = state
        .matchmaking_service
        .cancel(&authenticated_user.user_id, &match_id)
        .await?;
    Ok(Json(CancelResponse { cancelled }))
}
