use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use shared::config::{env_var, MatchmakingConfig};
use shared::repositories::match_repository::DynamoDbMatchRepository;
use shared::services::matchmaking_service::MatchmakingService;

#[derive(Debug, Serialize)]
struct SweepReport {
    expired: usize,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let matches_table = env_var("MATCHES_TABLE")?;
    let config = aws_config::load_from_env().await;
    let client = aws_sdk_dynamodb::Client::new(&config);
    let service = MatchmakingService::new(
        Arc::new(DynamoDbMatchRepository::new(client, &matches_table)),
        MatchmakingConfig::from_env()?,
    );

    run(service_fn(move |event: LambdaEvent<Value>| {
        let service = service.clone();
        async move {
            info!("Sweep triggered by {}", event.context.request_id);
            sweep(&service).await
        }
    }))
    .await
}

/// Deletes every waiting match whose search window has closed. The table TTL
/// removes them eventually; this keeps the waiting index free of stale rows.
async fn sweep(service: &MatchmakingService) -> Result<SweepReport, Error> {
    let expired = service
        .expire_stale_searches()
        .await
        .map_err(|e| Error::from(format!("Failed to expire waiting matches: {}", e)))?;

    info!("Sweep finished, {} waiting matches expired", expired);
    Ok(SweepReport { expired })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shared::models::match_record::{Match, MatchStatus};
    use shared::repositories::in_memory_match_repository::InMemoryMatchRepository;
    use shared::repositories::match_repository::MatchRepository;

    #[tokio::test]
    async fn test_sweep_removes_only_expired_searches() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let stale = Match::new_waiting("alice", "10+10", Duration::seconds(-30));
        let fresh = Match::new_waiting("bob", "10+10", Duration::seconds(60));
        repository.create_match(&stale).await.unwrap();
        repository.create_match(&fresh).await.unwrap();
        let service = MatchmakingService::new(repository.clone(), MatchmakingConfig::default());

        let report = sweep(&service).await.unwrap();

        assert_eq!(report.expired, 1);
        assert!(repository.get_match(&stale.id).await.unwrap().is_none());
        assert_eq!(
            repository.get_match(&fresh.id).await.unwrap().unwrap().status,
            MatchStatus::Waiting
        );
    }

    #[tokio::test]
    async fn test_sweep_with_nothing_to_do() {
        let service = MatchmakingService::new(
            Arc::new(InMemoryMatchRepository::new()),
            MatchmakingConfig::default(),
        );

        let report = sweep(&service).await.unwrap();

        assert_eq!(report.expired, 0);
    }
}
