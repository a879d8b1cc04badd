use lambda_runtime::Error;
use serde_json::Value;
use tracing::debug;

use crate::actions::reject;
use crate::state::AppState;

pub async fn handle_default_message(
    connection_id: &str,
    body: Option<&str>,
    state: &AppState,
) -> Result<Value, Error> {
    debug!("Unroutable message from {}: {:?}", connection_id, body);
    Ok(reject(state, connection_id, 400, "Unknown action").await)
}
