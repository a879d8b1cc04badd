use lambda_runtime::Error;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::actions::status;
use crate::state::AppState;

pub async fn handle_connect(
    connection_id: &str,
    token: Option<&str>,
    state: &AppState,
) -> Result<Value, Error> {
    let player_id = match state.auth.authenticate_connection(token) {
        Ok(player_id) => player_id,
        Err(e) => {
            warn!("Rejected connection {}: {}", connection_id, e);
            return Ok(status(401));
        }
    };

    if let Err(e) = state
        .connections
        .store_connection(connection_id, &player_id)
        .await
    {
        error!("Failed to store connection {}: {}", connection_id, e);
        return Ok(status(500));
    }

    info!("Player {} connected on {}", player_id, connection_id);
    Ok(status(200))
}
