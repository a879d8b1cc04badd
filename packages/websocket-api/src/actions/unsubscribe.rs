use lambda_runtime::Error;
use serde_json::Value;
use shared::models::frames::ServerFrame;
use tracing::{error, info};

use crate::actions::{send_frame, status};
use crate::state::AppState;

pub async fn handle_unsubscribe(connection_id: &str, state: &AppState) -> Result<Value, Error> {
    if let Err(e) = state.connections.unsubscribe(connection_id).await {
        error!("Failed to unsubscribe {}: {}", connection_id, e);
        return Ok(status(500));
    }
    info!("Connection {} unsubscribed", connection_id);

    if let Err(e) = send_frame(state, connection_id, &ServerFrame::Unsubscribed).await {
        error!("Failed to confirm unsubscribe to {}: {}", connection_id, e);
    }
    Ok(status(200))
}
