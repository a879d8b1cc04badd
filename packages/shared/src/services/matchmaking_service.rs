use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::MatchmakingConfig;
use crate::models::change::ChangeKind;
use crate::models::match_record::{Match, MatchStatus};
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::repositories::match_repository::MatchRepository;
use crate::services::change_feed::ChangeFeed;
use crate::services::errors::matchmaking_service_errors::MatchmakingServiceError;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The player took the open seat of another player's waiting match.
    Joined(Match),
    /// No seat was free; the player now owns this waiting match.
    Waiting(Match),
}

impl SearchOutcome {
    pub fn record(&self) -> &Match {
        match self {
            SearchOutcome::Joined(record) | SearchOutcome::Waiting(record) => record,
        }
    }

    pub fn into_match(self) -> Match {
        match self {
            SearchOutcome::Joined(record) | SearchOutcome::Waiting(record) => record,
        }
    }
}

/// Pairs players by either joining an open match or opening a new one.
#[derive(Clone)]
pub struct MatchmakingService {
    repository: Arc<dyn MatchRepository + Send + Sync>,
    config: MatchmakingConfig,
}

impl MatchmakingService {
    pub fn new(
        repository: Arc<dyn MatchRepository + Send + Sync>,
        config: MatchmakingConfig,
    ) -> Self {
        MatchmakingService { repository, config }
    }

    pub fn config(&self) -> &MatchmakingConfig {
        &self.config
    }

    pub async fn search(&self, player_id: &str) -> Result<SearchOutcome, MatchmakingServiceError> {
        if player_id.trim().is_empty() {
            return Err(MatchmakingServiceError::ValidationError(
                "Player ID cannot be empty".to_string(),
            ));
        }

        // A repeated search resumes the player's open seat.
        if let Some(existing) = self
            .repository
            .find_own_waiting_match(player_id, Utc::now())
            .await?
        {
            debug!(
                "Player {} is already waiting in match {}",
                player_id, existing.id
            );
            return Ok(SearchOutcome::Waiting(existing));
        }

        for attempt in 1..=self.config.max_join_attempts {
            let candidate = match self
                .repository
                .find_waiting_match(player_id, Utc::now())
                .await?
            {
                Some(candidate) => candidate,
                None => break,
            };

            match self.repository.join_match(&candidate.id, player_id).await {
                Ok(joined) => {
                    info!(
                        "Player {} joined match {} against {}",
                        player_id, joined.id, joined.player1_id
                    );
                    return Ok(SearchOutcome::Joined(joined));
                }
                Err(MatchRepositoryError::ConditionFailed(reason)) => {
                    warn!(
                        "Player {} lost the race for match {} (attempt {}/{}): {}",
                        player_id, candidate.id, attempt, self.config.max_join_attempts, reason
                    );
                }
                Err(MatchRepositoryError::NotFound) => {
                    warn!(
                        "Match {} disappeared before player {} could join (attempt {}/{})",
                        candidate.id, player_id, attempt, self.config.max_join_attempts
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        let waiting = Match::new_waiting(
            player_id,
            &self.config.time_control,
            self.config.search_timeout,
        );
        self.repository.create_match(&waiting).await?;
        info!(
            "Player {} opened waiting match {} ({})",
            player_id, waiting.id, waiting.time_control
        );

        Ok(SearchOutcome::Waiting(waiting))
    }

    /// Blocks until someone joins `waiting` or its expiry passes. An expired
    /// search is cancelled before returning [`MatchmakingServiceError::SearchTimedOut`].
    pub async fn await_opponent(
        &self,
        feed: &dyn ChangeFeed,
        waiting: Match,
    ) -> Result<Match, MatchmakingServiceError> {
        // Subscribe before fetching so a join between the two is not missed.
        let mut subscription = feed.subscribe(&waiting.id);

        let current = match self.repository.get_match(&waiting.id).await? {
            Some(current) => current,
            None => return Err(MatchmakingServiceError::SearchCancelled),
        };
        if current.status != MatchStatus::Waiting {
            return Ok(current);
        }

        let now = Utc::now();
        let expires_at = current
            .expires_at
            .unwrap_or_else(|| (now + self.config.search_timeout).timestamp());
        let remaining = (expires_at - now.timestamp()).max(0) as u64;
        let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(remaining);

        loop {
            match tokio::time::timeout_at(deadline, subscription.recv()).await {
                Ok(Some(change)) => {
                    if change.kind == ChangeKind::Delete {
                        info!("Waiting match {} was removed", waiting.id);
                        return Err(MatchmakingServiceError::SearchCancelled);
                    }
                    match change.record {
                        Some(record) if record.status != MatchStatus::Waiting => {
                            info!(
                                "Waiting match {} was joined by {:?}",
                                record.id, record.player2_id
                            );
                            return Ok(record);
                        }
                        _ => debug!("Ignoring change to waiting match {}", waiting.id),
                    }
                }
                Ok(None) => {
                    warn!(
                        "Change feed closed while waiting on match {}; polling at expiry",
                        waiting.id
                    );
                    tokio::time::sleep_until(deadline).await;
                    break;
                }
                Err(_) => break,
            }
        }

        self.expire_search(&waiting.id).await
    }

    /// Runs a search and, when no seat was free, waits for an opponent.
    pub async fn find_match(
        &self,
        feed: &dyn ChangeFeed,
        player_id: &str,
    ) -> Result<Match, MatchmakingServiceError> {
        match self.search(player_id).await? {
            SearchOutcome::Joined(record) => Ok(record),
            SearchOutcome::Waiting(record) => self.await_opponent(feed, record).await,
        }
    }

    /// Withdraws a search. Returns `false` when the match had already been
    /// paired or removed.
    pub async fn cancel(
        &self,
        player_id: &str,
        match_id: &str,
    ) -> Result<bool, MatchmakingServiceError> {
        let record = self
            .repository
            .get_match(match_id)
            .await?
            .ok_or(MatchmakingServiceError::MatchNotFound)?;

        if record.player1_id != player_id {
            return Err(MatchmakingServiceError::NotOwner);
        }
        if record.status != MatchStatus::Waiting {
            return Ok(false);
        }

        let deleted = self.repository.delete_waiting_match(match_id).await?;
        if deleted {
            info!("Player {} cancelled search {}", player_id, match_id);
        }
        Ok(deleted)
    }

    pub async fn expire_stale_searches(&self) -> Result<usize, MatchmakingServiceError> {
        let deleted = self.repository.delete_expired_waiting(Utc::now()).await?;
        if deleted > 0 {
            info!("Expired {} stale waiting matches", deleted);
        }
        Ok(deleted)
    }

    async fn expire_search(&self, match_id: &str) -> Result<Match, MatchmakingServiceError> {
        if self.repository.delete_waiting_match(match_id).await? {
            info!("Search {} timed out without an opponent", match_id);
            return Err(MatchmakingServiceError::SearchTimedOut);
        }

        // The delete lost to a concurrent join.
        match self.repository.get_match(match_id).await? {
            Some(record) if record.status != MatchStatus::Waiting => Ok(record),
            _ => Err(MatchmakingServiceError::SearchTimedOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::in_memory_match_repository::InMemoryMatchRepository;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration};

    fn config(timeout_secs: i64) -> MatchmakingConfig {
        MatchmakingConfig {
            search_timeout: Duration::seconds(timeout_secs),
            ..MatchmakingConfig::default()
        }
    }

    fn service_with(repository: Arc<InMemoryMatchRepository>) -> MatchmakingService {
        MatchmakingService::new(repository, config(60))
    }

    #[tokio::test]
    async fn test_search_opens_waiting_match_when_none_free() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());

        let outcome = service.search("alice").await.unwrap();

        let record = match outcome {
            SearchOutcome::Waiting(record) => record,
            other => panic!("Expected a waiting match, got {:?}", other),
        };
        assert_eq!(record.player1_id, "alice");
        assert_eq!(record.status, MatchStatus::Waiting);
        assert_eq!(record.time_control, "10+10");
        assert!(record.expires_at.is_some());
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_second_player_joins_first_players_match() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());

        let waiting = service.search("alice").await.unwrap().into_match();
        let outcome = service.search("bob").await.unwrap();

        match outcome {
            SearchOutcome::Joined(record) => {
                assert_eq!(record.id, waiting.id);
                assert_eq!(record.player2_id.as_deref(), Some("bob"));
                assert_eq!(record.status, MatchStatus::Active);
            }
            other => panic!("Expected to join, got {:?}", other),
        }
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_repeated_search_resumes_own_waiting_match() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());

        let first = service.search("alice").await.unwrap().into_match();
        let outcome = service.search("alice").await.unwrap();

        match outcome {
            SearchOutcome::Waiting(record) => assert_eq!(record.id, first.id),
            other => panic!("Expected the existing waiting match, got {:?}", other),
        }
        assert_eq!(repository.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_own_search_is_not_resumed() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());
        let mut stale = Match::new_waiting("alice", "10+10", Duration::seconds(60));
        stale.expires_at = Some(Utc::now().timestamp() - 1);
        repository.create_match(&stale).await.unwrap();

        let record = service.search("alice").await.unwrap().into_match();

        assert_ne!(record.id, stale.id);
        assert_eq!(record.player1_id, "alice");
        assert_eq!(repository.len().await, 2);
    }

    #[tokio::test]
    async fn test_search_rejects_empty_player() {
        let service = service_with(Arc::new(InMemoryMatchRepository::new()));

        let result = service.search("  ").await;

        assert!(matches!(
            result,
            Err(MatchmakingServiceError::ValidationError(_))
        ));
    }

    /// Lets another player grab the candidate right before each join.
    struct RacingRepository {
        inner: InMemoryMatchRepository,
    }

    #[async_trait]
    impl MatchRepository for RacingRepository {
        async fn create_match(&self, record: &Match) -> Result<(), MatchRepositoryError> {
            self.inner.create_match(record).await
        }
        async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError> {
            self.inner.get_match(match_id).await
        }
        async fn find_waiting_match(
            &self,
            excluded_player_id: &str,
            now: DateTime<Utc>,
        ) -> Result<Option<Match>, MatchRepositoryError> {
            self.inner.find_waiting_match(excluded_player_id, now).await
        }
        async fn find_own_waiting_match(
            &self,
            player_id: &str,
            now: DateTime<Utc>,
        ) -> Result<Option<Match>, MatchRepositoryError> {
            self.inner.find_own_waiting_match(player_id, now).await
        }
        async fn join_match(
            &self,
            match_id: &str,
            player2_id: &str,
        ) -> Result<Match, MatchRepositoryError> {
            self.inner.join_match(match_id, "thief").await?;
            self.inner.join_match(match_id, player2_id).await
        }
        async fn append_move(
            &self,
            match_id: &str,
            expected_move_count: usize,
            notation: &str,
        ) -> Result<Match, MatchRepositoryError> {
            self.inner
                .append_move(match_id, expected_move_count, notation)
                .await
        }
        async fn complete_match(
            &self,
            match_id: &str,
            winner_id: Option<&str>,
        ) -> Result<Match, MatchRepositoryError> {
            self.inner.complete_match(match_id, winner_id).await
        }
        async fn delete_waiting_match(
            &self,
            match_id: &str,
        ) -> Result<bool, MatchRepositoryError> {
            self.inner.delete_waiting_match(match_id).await
        }
        async fn delete_expired_waiting(
            &self,
            now: DateTime<Utc>,
        ) -> Result<usize, MatchRepositoryError> {
            self.inner.delete_expired_waiting(now).await
        }
        async fn count_wins(&self, player_id: &str) -> Result<usize, MatchRepositoryError> {
            self.inner.count_wins(player_id).await
        }
        async fn count_completed(&self, player_id: &str) -> Result<usize, MatchRepositoryError> {
            self.inner.count_completed(player_id).await
        }
    }

    #[tokio::test]
    async fn test_lost_join_races_retry_then_open_new_match() {
        let repository = Arc::new(RacingRepository {
            inner: InMemoryMatchRepository::new(),
        });
        for owner in ["alice", "carol"] {
            repository
                .create_match(&Match::new_waiting(owner, "10+10", Duration::seconds(60)))
                .await
                .unwrap();
        }
        let service = MatchmakingService::new(
            repository.clone(),
            MatchmakingConfig {
                max_join_attempts: 3,
                ..MatchmakingConfig::default()
            },
        );

        let outcome = service.search("bob").await.unwrap();

        // Both open matches were stolen, so bob ends up owning a new one.
        let record = match outcome {
            SearchOutcome::Waiting(record) => record,
            other => panic!("Expected a waiting match, got {:?}", other),
        };
        assert_eq!(record.player1_id, "bob");
        assert_eq!(repository.inner.len().await, 3);
        assert_eq!(repository.inner.count_completed("thief").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_await_opponent_returns_joined_match() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());
        let waiting = service.search("alice").await.unwrap().into_match();

        let waiter = {
            let service = service.clone();
            let repository = repository.clone();
            let waiting = waiting.clone();
            tokio::spawn(async move { service.await_opponent(repository.as_ref(), waiting).await })
        };
        let joined = service.search("bob").await.unwrap();

        let record = waiter.await.unwrap().unwrap();
        assert!(matches!(joined, SearchOutcome::Joined(_)));
        assert_eq!(record.id, waiting.id);
        assert_eq!(record.status, MatchStatus::Active);
        assert_eq!(record.player2_id.as_deref(), Some("bob"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_await_opponent_times_out_and_cancels() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = MatchmakingService::new(repository.clone(), config(5));
        let waiting = service.search("alice").await.unwrap().into_match();

        let result = service.await_opponent(repository.as_ref(), waiting.clone()).await;

        assert!(matches!(result, Err(MatchmakingServiceError::SearchTimedOut)));
        assert!(repository.get_match(&waiting.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_await_opponent_ends_when_search_is_cancelled() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());
        let waiting = service.search("alice").await.unwrap().into_match();

        let waiter = {
            let service = service.clone();
            let repository = repository.clone();
            let waiting = waiting.clone();
            tokio::spawn(async move { service.await_opponent(repository.as_ref(), waiting).await })
        };
        assert!(service.cancel("alice", &waiting.id).await.unwrap());

        let result = waiter.await.unwrap();
        assert!(matches!(
            result,
            Err(MatchmakingServiceError::SearchCancelled)
        ));
    }

    #[tokio::test]
    async fn test_find_match_joins_immediately_when_seat_is_free() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());
        service.search("alice").await.unwrap();

        let record = service.find_match(repository.as_ref(), "bob").await.unwrap();

        assert_eq!(record.status, MatchStatus::Active);
        assert_eq!(record.player1_id, "alice");
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());
        let waiting = service.search("alice").await.unwrap().into_match();

        assert!(matches!(
            service.cancel("bob", &waiting.id).await,
            Err(MatchmakingServiceError::NotOwner)
        ));
        assert!(matches!(
            service.cancel("alice", "missing").await,
            Err(MatchmakingServiceError::MatchNotFound)
        ));

        service.search("bob").await.unwrap();
        assert!(!service.cancel("alice", &waiting.id).await.unwrap());
        assert!(repository.get_match(&waiting.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_expire_stale_searches() {
        let repository = Arc::new(InMemoryMatchRepository::new());
        let service = service_with(repository.clone());
        let mut stale = Match::new_waiting("alice", "10+10", Duration::seconds(60));
        stale.expires_at = Some(Utc::now().timestamp() - 1);
        repository.create_match(&stale).await.unwrap();
        service.search("bob").await.unwrap();

        let expired = service.expire_stale_searches().await.unwrap();

        assert_eq!(expired, 1);
        assert_eq!(repository.len().await, 1);
    }
}
