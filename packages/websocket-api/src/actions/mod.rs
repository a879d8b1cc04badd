use serde_json::{json, Value};
use shared::models::frames::ServerFrame;
use shared::repositories::errors::connection_repository_errors::ConnectionRepositoryError;
use tracing::{error, info};

use crate::state::AppState;

pub mod connect;
pub mod default;
pub mod disconnect;
pub mod subscribe;
pub mod unsubscribe;

pub fn status(code: u16) -> Value {
    json!({ "statusCode": code })
}

/// Pushes a frame to one connection. A connection reported gone is
/// dropped from the registry.
pub async fn send_frame(
    state: &AppState,
    connection_id: &str,
    frame: &ServerFrame,
) -> Result<(), ConnectionRepositoryError> {
    let message = frame
        .to_json()
        .map_err(|e| ConnectionRepositoryError::ApiGateway(e.to_string()))?;

    match state.connections.send_message(connection_id, &message).await {
        Err(ConnectionRepositoryError::Gone(id)) => {
            info!("Connection {} is gone, removing it", id);
            if let Err(e) = state.connections.remove_connection(&id).await {
                error!("Failed to remove stale connection {}: {}", id, e);
            }
            Err(ConnectionRepositoryError::Gone(id))
        }
        other => other,
    }
}

/// Answers with an error frame and the given status code.
pub async fn reject(state: &AppState, connection_id: &str, code: u16, message: &str) -> Value {
    if let Err(e) = send_frame(state, connection_id, &ServerFrame::error(message)).await {
        error!("Failed to send error frame to {}: {}", connection_id, e);
    }
    status(code)
}
