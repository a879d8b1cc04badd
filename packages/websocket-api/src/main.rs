use aws_lambda_events::apigw::ApiGatewayWebsocketProxyRequest;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

pub mod actions;
pub mod auth;
pub mod state;

use actions::{
    connect::handle_connect, default::handle_default_message, disconnect::handle_disconnect,
    subscribe::handle_subscribe, unsubscribe::handle_unsubscribe,
};
use auth::WebSocketAuth;
use shared::config::env_var;
use shared::repositories::connection_repository::DynamoDbConnectionRepository;
use shared::repositories::match_repository::DynamoDbMatchRepository;
use shared::services::auth_service::AuthService;
use state::AppState;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let connections_table = env_var("CONNECTIONS_TABLE")?;
    let matches_table = env_var("MATCHES_TABLE")?;
    let endpoint = env_var("WEBSOCKET_API_ENDPOINT")?;

    let config = aws_config::load_from_env().await;
    let dynamodb_client = aws_sdk_dynamodb::Client::new(&config);
    let api_gateway_client = DynamoDbConnectionRepository::api_gateway_client(&config, &endpoint);

    let state = AppState {
        auth: WebSocketAuth::new(Arc::new(AuthService::new()?)),
        connections: Arc::new(DynamoDbConnectionRepository::new(
            dynamodb_client.clone(),
            api_gateway_client,
            &connections_table,
        )),
        matches: Arc::new(DynamoDbMatchRepository::new(dynamodb_client, &matches_table)),
    };

    run(service_fn(
        move |event: LambdaEvent<ApiGatewayWebsocketProxyRequest>| {
            let state = state.clone();
            async move { websocket_handler(event.payload, &state).await }
        },
    ))
    .await
}

pub async fn websocket_handler(
    event: ApiGatewayWebsocketProxyRequest,
    state: &AppState,
) -> Result<Value, Error> {
    let connection_id = event
        .request_context
        .connection_id
        .as_deref()
        .unwrap_or_default();
    let route_key = event.request_context.route_key.as_deref().unwrap_or_default();
    let body = event.body.as_deref();

    debug!("Route {} for connection {}", route_key, connection_id);
    if connection_id.is_empty() {
        error!("WebSocket event without a connection ID on route {}", route_key);
        return Ok(actions::status(400));
    }

    match route_key {
        "$connect" => {
            let token = event.query_string_parameters.first("token");
            handle_connect(connection_id, token, state).await
        }
        "$disconnect" => handle_disconnect(connection_id, state).await,
        "subscribe" => handle_subscribe(connection_id, body, state).await,
        "unsubscribe" => handle_unsubscribe(connection_id, state).await,
        _ => handle_default_message(connection_id, body, state).await,
    }
}
