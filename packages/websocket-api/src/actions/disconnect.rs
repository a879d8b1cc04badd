use lambda_runtime::Error;
use serde_json::Value;
use tracing::{error, info};

use crate::actions::status;
use crate::state::AppState;

pub async fn handle_disconnect(connection_id: &str, state: &AppState) -> Result<Value, Error> {
    if let Err(e) = state.connections.remove_connection(connection_id).await {
        error!("Failed to remove connection {}: {}", connection_id, e);
    } else {
        info!("Connection {} disconnected", connection_id);
    }

    Ok(status(200))
}
