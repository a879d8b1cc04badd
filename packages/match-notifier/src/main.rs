use aws_lambda_events::event::dynamodb::Event;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use std::sync::Arc;
use tracing::info;

mod notifier;

use notifier::MatchNotifier;
use shared::config::env_var;
use shared::repositories::connection_repository::DynamoDbConnectionRepository;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let connections_table = env_var("CONNECTIONS_TABLE")?;
    let endpoint = env_var("WEBSOCKET_API_ENDPOINT")?;

    let config = aws_config::load_from_env().await;
    let connections = DynamoDbConnectionRepository::new(
        aws_sdk_dynamodb::Client::new(&config),
        DynamoDbConnectionRepository::api_gateway_client(&config, &endpoint),
        &connections_table,
    );
    let notifier = MatchNotifier::new(Arc::new(connections));

    info!("Match notifier starting");

    run(service_fn(move |event: LambdaEvent<Event>| {
        let notifier = notifier.clone();
        async move { notifier.process_event(event.payload).await }
    }))
    .await
}
