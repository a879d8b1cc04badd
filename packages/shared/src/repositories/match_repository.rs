use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue, Select};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use serde_dynamo::{from_item, to_item};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::models::match_record::{Match, MatchStatus};
use crate::repositories::errors::match_repository_errors::MatchRepositoryError;

const STATUS_INDEX: &str = "GSI_MatchesByStatus";

/// The data-store boundary for match rows.
///
/// Every state-changing call is conditional on the row still being in the
/// state the caller read; a lost race comes back as
/// [`MatchRepositoryError::ConditionFailed`].
#[async_trait]
pub trait MatchRepository: Send + Sync {
    async fn create_match(&self, record: &Match) -> Result<(), MatchRepositoryError>;

    async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError>;

    /// Oldest-first is not guaranteed; any unexpired waiting match of another
    /// player will do.
    async fn find_waiting_match(
        &self,
        excluded_player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, MatchRepositoryError>;

    /// The player's own unexpired waiting match, if one is still open.
    async fn find_own_waiting_match(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, MatchRepositoryError>;

    async fn join_match(
        &self,
        match_id: &str,
        player2_id: &str,
    ) -> Result<Match, MatchRepositoryError>;

    async fn append_move(
        &self,
        match_id: &str,
        expected_move_count: usize,
        notation: &str,
    ) -> Result<Match, MatchRepositoryError>;

    async fn complete_match(
        &self,
        match_id: &str,
        winner_id: Option<&str>,
    ) -> Result<Match, MatchRepositoryError>;

    /// Returns `false` when the row was already gone or no longer waiting.
    async fn delete_waiting_match(&self, match_id: &str) -> Result<bool, MatchRepositoryError>;

    async fn delete_expired_waiting(&self, now: DateTime<Utc>)
        -> Result<usize, MatchRepositoryError>;

    async fn count_wins(&self, player_id: &str) -> Result<usize, MatchRepositoryError>;

    async fn count_completed(&self, player_id: &str) -> Result<usize, MatchRepositoryError>;
}

pub struct DynamoDbMatchRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbMatchRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }

    fn status_value(status: MatchStatus) -> AttributeValue {
        AttributeValue::S(status.as_str().to_string())
    }

    fn now_value() -> AttributeValue {
        AttributeValue::S(Utc::now().to_rfc3339())
    }

    fn parse_attributes(
        attributes: Option<HashMap<String, AttributeValue>>,
    ) -> Result<Match, MatchRepositoryError> {
        let attributes = attributes.ok_or(MatchRepositoryError::NotFound)?;
        from_item(attributes).map_err(|e| MatchRepositoryError::Serialization(e.to_string()))
    }

    /// First unexpired waiting row whose owner satisfies `player_clause`,
    /// an expression over the `:player` placeholder.
    async fn first_waiting(
        &self,
        player_clause: &str,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, MatchRepositoryError> {
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        // The filter runs after the page is read, so a page can come back
        // empty while later pages still hold candidates.
        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(STATUS_INDEX)
                .key_condition_expression("#status = :waiting")
                .filter_expression(format!(
                    "{} AND (attribute_not_exists(expires_at) OR expires_at > :now)",
                    player_clause
                ))
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(":waiting", Self::status_value(MatchStatus::Waiting))
                .expression_attribute_values(":player", AttributeValue::S(player_id.to_string()))
                .expression_attribute_values(":now", AttributeValue::N(now.timestamp().to_string()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| MatchRepositoryError::DynamoDb(e.to_string()))?;

            if let Some(item) = output.items.and_then(|items| items.into_iter().next()) {
                let record: Match = from_item(item)
                    .map_err(|e| MatchRepositoryError::Serialization(e.to_string()))?;
                return Ok(Some(record));
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => return Ok(None),
            }
        }
    }

    async fn count_with_filter(
        &self,
        filter_expression: &str,
        values: HashMap<String, AttributeValue>,
    ) -> Result<usize, MatchRepositoryError> {
        let mut total = 0usize;
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression(filter_expression)
                .expression_attribute_names("#status", "status")
                .set_expression_attribute_values(Some(values.clone()))
                .select(Select::Count)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| MatchRepositoryError::DynamoDb(e.to_string()))?;

            total += output.count.max(0) as usize;
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(total)
    }
}

#[async_trait]
impl MatchRepository for DynamoDbMatchRepository {
    async fn create_match(&self, record: &Match) -> Result<(), MatchRepositoryError> {
        let item =
            to_item(record).map_err(|e| MatchRepositoryError::Serialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    MatchRepositoryError::ConditionFailed(format!(
                        "match {} already exists",
                        record.id
                    ))
                } else {
                    MatchRepositoryError::DynamoDb(e.to_string())
                }
            })?;

        Ok(())
    }

    async fn get_match(&self, match_id: &str) -> Result<Option<Match>, MatchRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(match_id.to_string()))
            .consistent_read(true)
            .send()
            .await
            .map_err(|e| MatchRepositoryError::DynamoDb(e.to_string()))?;

        match output.item {
            Some(item) => {
                let record: Match = from_item(item)
                    .map_err(|e| MatchRepositoryError::Serialization(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    async fn find_waiting_match(
        &self,
        excluded_player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, MatchRepositoryError> {
        self.first_waiting("player1_id <> :player", excluded_player_id, now)
            .await
    }

    async fn find_own_waiting_match(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, MatchRepositoryError> {
        self.first_waiting("player1_id = :player", player_id, now)
            .await
    }

    async fn join_match(
        &self,
        match_id: &str,
        player2_id: &str,
    ) -> Result<Match, MatchRepositoryError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(match_id.to_string()))
            .update_expression(
                "SET player2_id = :player2, #status = :active, updated_at = :now, version = version + :one REMOVE expires_at",
            )
            .condition_expression(
                "#status = :waiting AND attribute_not_exists(player2_id) AND player1_id <> :player2",
            )
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":player2", AttributeValue::S(player2_id.to_string()))
            .expression_attribute_values(":active", Self::status_value(MatchStatus::Active))
            .expression_attribute_values(":waiting", Self::status_value(MatchStatus::Waiting))
            .expression_attribute_values(":now", Self::now_value())
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    MatchRepositoryError::ConditionFailed(format!(
                        "match {} is no longer waiting for an opponent",
                        match_id
                    ))
                } else {
                    MatchRepositoryError::DynamoDb(e.to_string())
                }
            })?;

        debug!("Player {} joined match {}", player2_id, match_id);
        Self::parse_attributes(output.attributes)
    }

    async fn append_move(
        &self,
        match_id: &str,
        expected_move_count: usize,
        notation: &str,
    ) -> Result<Match, MatchRepositoryError> {
        let output = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(match_id.to_string()))
            .update_expression(
                "SET moves = list_append(moves, :move), updated_at = :now, version = version + :one",
            )
            .condition_expression("#status = :active AND size(moves) = :expected")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(
                ":move",
                AttributeValue::L(vec![AttributeValue::S(notation.to_string())]),
            )
            .expression_attribute_values(":active", Self::status_value(MatchStatus::Active))
            .expression_attribute_values(
                ":expected",
                AttributeValue::N(expected_move_count.to_string()),
            )
            .expression_attribute_values(":now", Self::now_value())
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    MatchRepositoryError::ConditionFailed(format!(
                        "match {} is not active with {} moves",
                        match_id, expected_move_count
                    ))
                } else {
                    MatchRepositoryError::DynamoDb(e.to_string())
                }
            })?;

        Self::parse_attributes(output.attributes)
    }

    async fn complete_match(
        &self,
        match_id: &str,
        winner_id: Option<&str>,
    ) -> Result<Match, MatchRepositoryError> {
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(match_id.to_string()))
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":completed", Self::status_value(MatchStatus::Completed))
            .expression_attribute_values(":active", Self::status_value(MatchStatus::Active))
            .expression_attribute_values(":now", Self::now_value())
            .expression_attribute_values(":one", AttributeValue::N("1".to_string()))
            .return_values(ReturnValue::AllNew);

        request = match winner_id {
            Some(winner_id) => request
                .update_expression(
                    "SET #status = :completed, winner_id = :winner, updated_at = :now, version = version + :one",
                )
                .condition_expression(
                    "#status = :active AND (player1_id = :winner OR player2_id = :winner)",
                )
                .expression_attribute_values(":winner", AttributeValue::S(winner_id.to_string())),
            None => request
                .update_expression(
                    "SET #status = :completed, updated_at = :now, version = version + :one",
                )
                .condition_expression("#status = :active"),
        };

        let output = request.send().await.map_err(|e| {
            if e.as_service_error()
                .map_or(false, |se| se.is_conditional_check_failed_exception())
            {
                MatchRepositoryError::ConditionFailed(format!("match {} is not active", match_id))
            } else {
                MatchRepositoryError::DynamoDb(e.to_string())
            }
        })?;

        Self::parse_attributes(output.attributes)
    }

    async fn delete_waiting_match(&self, match_id: &str) -> Result<bool, MatchRepositoryError> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(match_id.to_string()))
            .condition_expression("#status = :waiting")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(":waiting", Self::status_value(MatchStatus::Waiting))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    Ok(false)
                } else {
                    Err(MatchRepositoryError::DynamoDb(e.to_string()))
                }
            }
        }
    }

    async fn delete_expired_waiting(
        &self,
        now: DateTime<Utc>,
    ) -> Result<usize, MatchRepositoryError> {
        let now_value = AttributeValue::N(now.timestamp().to_string());
        let mut expired_ids = Vec::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(&self.table_name)
                .index_name(STATUS_INDEX)
                .key_condition_expression("#status = :waiting")
                .filter_expression("expires_at <= :now")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(":waiting", Self::status_value(MatchStatus::Waiting))
                .expression_attribute_values(":now", now_value.clone())
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| MatchRepositoryError::DynamoDb(e.to_string()))?;

            for item in output.items.unwrap_or_default() {
                if let Some(AttributeValue::S(id)) = item.get("id") {
                    expired_ids.push(id.clone());
                }
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        let mut deleted = 0;
        for match_id in expired_ids {
            let result = self
                .client
                .delete_item()
                .table_name(&self.table_name)
                .key("id", AttributeValue::S(match_id.clone()))
                .condition_expression("#status = :waiting AND expires_at <= :now")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(":waiting", Self::status_value(MatchStatus::Waiting))
                .expression_attribute_values(":now", now_value.clone())
                .send()
                .await;

            match result {
                Ok(_) => deleted += 1,
                Err(e) => {
                    if e.as_service_error()
                        .map_or(false, |se| se.is_conditional_check_failed_exception())
                    {
                        debug!("Match {} was paired before it could expire", match_id);
                    } else {
                        warn!("Failed to delete expired match {}: {}", match_id, e);
                    }
                }
            }
        }

        Ok(deleted)
    }

    async fn count_wins(&self, player_id: &str) -> Result<usize, MatchRepositoryError> {
        let values = HashMap::from([
            (":player".to_string(), AttributeValue::S(player_id.to_string())),
            (
                ":completed".to_string(),
                Self::status_value(MatchStatus::Completed),
            ),
        ]);

        self.count_with_filter("winner_id = :player AND #status = :completed", values)
            .await
    }

    async fn count_completed(&self, player_id: &str) -> Result<usize, MatchRepositoryError> {
        let values = HashMap::from([
            (":player".to_string(), AttributeValue::S(player_id.to_string())),
            (
                ":completed".to_string(),
                Self::status_value(MatchStatus::Completed),
            ),
        ]);

        self.count_with_filter(
            "(player1_id = :player OR player2_id = :player) AND #status = :completed",
            values,
        )
        .await
    }
}
