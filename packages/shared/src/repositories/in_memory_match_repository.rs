use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::change::{ChangeKind, MatchChange};
use crate::models::match_record::{Match, MatchStatus};
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;
use crate::repositories::match_repository::MatchRepository;
use crate::services::change_feed::{BroadcastChangeFeed, ChangeFeed, MatchSubscription};

/// Match store held in process memory.
///
/// Applies the same conditions as the DynamoDB table and publishes every
/// successful write to its own change feed.
#[derive(Default)]
pub struct InMemoryMatchRepository {
    matches: RwLock<HashMap<String, Match>>,
    feed: BroadcastChangeFeed,
}

impl InMemoryMatchRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&self) -> &BroadcastChangeFeed {
        &self.feed
    }

    pub async fn len(&self) -> usize {
        self.matches.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.matches.read().await.is_empty()
    }

    async fn update<F>(&self, match_id: &str, apply: F) -> Result<Match, MatchRepositoryError>
    where
        F: FnOnce(&mut Match) -> Result<(), String>,
    {
        let updated = {
            let mut matches = self.matches.write().await;
            let record = matches
                .get_mut(match_id)
                .ok_or(MatchRepositoryError::NotFound)?;

            let mut candidate = record.clone();
            apply(&mut candidate).map_err(MatchRepositoryError::ConditionFailed)?;
            *record = candidate.clone();
            candidate
        };

        self.feed
            .publish(MatchChange::upserted(ChangeKind::Update, &updated));
        Ok(updated)
    }
}

impl ChangeFeed for InMemoryMatchRepository {
    fn subscribe(&self, match_id: &str) -> MatchSubscription {
        self.feed.subscribe(match_id)
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn create_match(&self, record: &Match) -> Result<(), MatchRepositoryError> {
        {
            let mut matches = self.matches.write().await;
            if matches.contains_key(&record.id) {
                return Err(MatchRepositoryError::ConditionFailed(format!(
                    "match {} already exists",
                    record.id
                )));
            }
            matches.insert(record.id.clone(), record.clone());
        }

        self.feed
            .publish(MatchChange::upserted(ChangeKind::Insert, record));
        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError> {
        Ok(self.matches.read().await.get(match_id).cloned())
    }

    async fn find_waiting_match(
        &self,
        excluded_player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, MatchRepositoryError> {
        let matches = self.matches.read().await;
        let found = matches
            .values()
            .filter(|record| record.status == MatchStatus::Waiting)
            .filter(|record| record.player1_id != excluded_player_id)
            .filter(|record| !record.is_expired(now))
            .min_by_key(|record| record.created_at)
            .cloned();

        Ok(found)
    }

    async fn find_own_waiting_match(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, MatchRepositoryError> {
        let matches = self.matches.read().await;
        Ok(matches
            .values()
            .find(|record| {
                record.status == MatchStatus::Waiting
                    && record.player1_id == player_id
                    && !record.is_expired(now)
            })
            .cloned())
    }

    async fn join_match(
        &self,
        match_id: &str,
        player2_id: &str,
    ) -> Result<Match, MatchRepositoryError> {
        self.update(match_id, |record| {
            record.pair(player2_id).map_err(|e| e.to_string())
        })
        .await
    }

    async fn append_move(
        &self,
        match_id: &str,
        expected_move_count: usize,
        notation: &str,
    ) -> Result<Match, MatchRepositoryError> {
        self.update(match_id, |record| {
            record
                .append_move(expected_move_count, notation)
                .map_err(|e| e.to_string())
        })
        .await
    }

    async fn complete_match(
        &self,
        match_id: &str,
        winner_id: Option<&str>,
    ) -> Result<Match, MatchRepositoryError> {
        self.update(match_id, |record| {
            record.complete(winner_id).map_err(|e| e.to_string())
        })
        .await
    }

    async fn delete_waiting_match(&self, match_id: &str) -> Result<bool, MatchRepositoryError> {
        let removed = {
            let mut matches = self.matches.write().await;
            match matches.get(match_id) {
                Some(record) if record.status == MatchStatus::Waiting => matches.remove(match_id),
                _ => None,
            }
        };

        match removed {
            Some(record) => {
                self.feed
                    .publish(MatchChange::deleted(match_id, Some(record)));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_expired_waiting(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, MatchRepositoryError> {
        let expired: Vec<Match> = {
            let mut matches = self.matches.write().await;
            let ids: Vec<String> = matches
                .values()
                .filter(|record| record.is_expired(now))
                .map(|record| record.id.clone())
                .collect();
            ids.iter().filter_map(|id| matches.remove(id)).collect()
        };

        for record in &expired {
            debug!("Expired waiting match {}", record.id);
            self.feed
                .publish(MatchChange::deleted(&record.id, Some(record.clone())));
        }

        Ok(expired.len())
    }

    async fn count_wins(&self, player_id: &str) -> Result<usize, MatchRepositoryError> {
        let matches = self.matches.read().await;
        Ok(matches
            .values()
            .filter(|record| record.status == MatchStatus::Completed)
            .filter(|record| record.winner_id.as_deref() == Some(player_id))
            .count())
    }

    async fn count_completed(&self, player_id: &str) -> Result<usize, MatchRepositoryError> {
        let matches = self.matches.read().await;
        Ok(matches
            .values()
            .filter(|record| record.status == MatchStatus::Completed)
            .filter(|record| record.is_participant(player_id))
            .count())
    }
}
