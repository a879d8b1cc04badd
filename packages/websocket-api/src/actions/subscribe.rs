use lambda_runtime::Error;
use serde_json::Value;
use shared::models::change::{ChangeKind, MatchChange};
use shared::models::frames::{ClientFrame, ServerFrame};
use shared::repositories::errors::connection_repository_errors::ConnectionRepositoryError;
use tracing::{error, info, warn};

use crate::actions::{reject, send_frame, status};
use crate::state::AppState;

/// Follows a match: after the participant check the subscription is recorded
/// first and the row read afterwards, so no update falls between the two.
pub async fn handle_subscribe(
    connection_id: &str,
    body: Option<&str>,
    state: &AppState,
) -> Result<Value, Error> {
    let match_id = match body.map(serde_json::from_str::<ClientFrame>) {
        Some(Ok(ClientFrame::Subscribe { match_id })) if !match_id.is_empty() => match_id,
        _ => {
            warn!("Malformed subscribe from {}: {:?}", connection_id, body);
            return Ok(reject(state, connection_id, 400, "subscribe requires a match_id").await);
        }
    };

    let connection = match state.connections.get_connection(connection_id).await {
        Ok(connection) => connection,
        Err(ConnectionRepositoryError::NotFound) => {
            return Ok(reject(state, connection_id, 401, "Connection is not registered").await);
        }
        Err(e) => {
            error!("Failed to load connection {}: {}", connection_id, e);
            return Ok(status(500));
        }
    };

    match state.matches.get_match(&match_id).await {
        Ok(Some(record)) if record.is_participant(&connection.player_id) => {}
        Ok(Some(_)) => {
            return Ok(reject(state, connection_id, 403, "Not a participant in this match").await);
        }
        Ok(None) => return Ok(reject(state, connection_id, 404, "Match not found").await),
        Err(e) => {
            error!("Failed to load match {}: {}", match_id, e);
            return Ok(status(500));
        }
    }

    if let Err(e) = state.connections.subscribe(connection_id, &match_id).await {
        error!(
            "Failed to subscribe {} to match {}: {}",
            connection_id, match_id, e
        );
        return Ok(status(500));
    }
    info!(
        "Player {} on {} follows match {}",
        connection.player_id, connection_id, match_id
    );

    let change = match state.matches.get_match(&match_id).await {
        Ok(Some(record)) => MatchChange::upserted(ChangeKind::Snapshot, &record),
        Ok(None) => MatchChange::deleted(&match_id, None),
        Err(e) => {
            error!("Failed to read match {} after subscribing: {}", match_id, e);
            return Ok(status(500));
        }
    };

    let frames = [
        ServerFrame::Subscribed {
            match_id: match_id.clone(),
        },
        ServerFrame::MatchChange(change),
    ];
    for frame in &frames {
        if let Err(e) = send_frame(state, connection_id, frame).await {
            error!("Failed to push to {}: {}", connection_id, e);
            return Ok(status(500));
        }
    }

    Ok(status(200))
}
