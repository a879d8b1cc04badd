use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chess::Color;
use lambda_http::tracing::error;
use serde::{Deserialize, Serialize};
use shared::models::friendship::Friendship;
use shared::models::match_record::Match;
use shared::models::profile::Profile;
use shared::services::match_session::MatchSession;

use crate::{error::ApiError, middleware::auth::AuthenticatedUser, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/matches/{match_id}", get(get_match))
        .route("/matches/{match_id}/moves", post(make_move))
        .route("/matches/{match_id}/resign", post(resign))
        .route("/matches/{match_id}/timeout", post(claim_timeout))
        .route("/matches/{match_id}/friend-request", post(befriend_opponent))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MatchView {
    #[serde(rename = "match")]
    pub record: Match,
    pub fen: String,
    pub side_to_move: String,
    pub your_color: String,
    /// Empty unless it is the caller's turn.
    pub legal_moves: Vec<String>,
    pub white: Option<Profile>,
    pub black: Option<Profile>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct TimeoutRequest {
    pub flagged: String,
}

fn color_name(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

fn parse_color(name: &str) -> Result<Color, ApiError> {
    match name.to_ascii_lowercase().as_str() {
        "white" => Ok(Color::White),
        "black" => Ok(Color::Black),
        _ => Err(ApiError::BadRequest(
            "flagged must be white or black".to_string(),
        )),
    }
}

fn view(session: &MatchSession) -> MatchView {
    let legal_moves = if session.is_my_turn() {
        session.legal_moves()
    } else {
        vec![]
    };
    MatchView {
        record: session.snapshot().clone(),
        fen: session.fen(),
        side_to_move: color_name(session.side_to_move()),
        your_color: color_name(session.color()),
        legal_moves,
        white: session.players().white.clone(),
        black: session.players().black.clone(),
    }
}

async fn open_session(
    state: &AppState,
    match_id: &str,
    player_id: &str,
) -> Result<MatchSession, ApiError> {
    MatchSession::load(
        state.matches.clone(),
        state.profiles.clone(),
        match_id,
        player_id,
        false,
    )
    .await
    .map_err(|e| {
        error!("Failed to load match {} for {}: {}", match_id, player_id, e);
        ApiError::from(e)
    })
}

async fn get_match(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
) -> Result<Json<MatchView>, ApiError> {
    let session = open_session(&state, &match_id, &authenticated_user.user_id).await?;
    Ok(Json(view(&session)))
}

async fn make_move(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
    Json(payload): Json<MoveRequest>,
) -> Result<Json<MatchView>, ApiError> {
    let mut session = open_session(&state, &match_id, &authenticated_user.user_id).await?;
    session.try_move(&payload.from, &payload.to).await?;
    Ok(Json(view(&session)))
}

async fn resign(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
) -> Result<Json<MatchView>, ApiError> {
    let mut session = open_session(&state, &match_id, &authenticated_user.user_id).await?;
    session.resign().await?;
    Ok(Json(view(&session)))
}

/// Records a flag fall observed by the caller's clock. The clock only runs on
/// the clients, so any participant's claim for either colour is trusted.
async fn claim_timeout(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
    Json(payload): Json<TimeoutRequest>,
) -> Result<Json<MatchView>, ApiError> {
    let flagged = parse_color(&payload.flagged)?;
    let mut session = open_session(&state, &match_id, &authenticated_user.user_id).await?;
    session.flag(flagged).await?;
    Ok(Json(view(&session)))
}

async fn befriend_opponent(
    State(state): State<AppState>,
    authenticated_user: AuthenticatedUser,
    Path(match_id): Path<String>,
) -> Result<(StatusCode, Json<Friendship>), ApiError> {
    let request = state
        .friendship_service
        .befriend_opponent(&authenticated_user.user_id, &match_id)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}
