use crate::models::friendship::{Friendship, FriendshipStatus};
use crate::repositories::errors::friendship_repository_errors::FriendshipRepositoryError;
use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue, Select};
use aws_sdk_dynamodb::Client;
use serde_dynamo::to_item;
use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

pub struct DynamoDbFriendshipRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbFriendshipRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// Fails with `AlreadyExists` when any request already links the pair.
    async fn create_friendship(&self, friendship: &Friendship)
        -> Result<(), FriendshipRepositoryError>;

    /// Accepts the pending request stored under `pair_key` if it is
    /// addressed to `target_id`.
    async fn accept_friendship(
        &self,
        pair_key: &str,
        target_id: &str,
    ) -> Result<(), FriendshipRepositoryError>;

    async fn count_accepted(&self, user_id: &str) -> Result<usize, FriendshipRepositoryError>;
}

#[async_trait]
impl FriendshipRepository for DynamoDbFriendshipRepository {
    async fn create_friendship(
        &self,
        friendship: &Friendship,
    ) -> Result<(), FriendshipRepositoryError> {
        let item = to_item(friendship)
            .map_err(|e| FriendshipRepositoryError::Serialization(e.to_string()))?;
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(pair_key)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    Err(FriendshipRepositoryError::AlreadyExists)
                } else {
                    Err(FriendshipRepositoryError::DynamoDb(e.to_string()))
                }
            }
        }
    }

    async fn accept_friendship(
        &self,
        pair_key: &str,
        target_id: &str,
    ) -> Result<(), FriendshipRepositoryError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("pair_key", AttributeValue::S(pair_key.to_string()))
            .update_expression("SET #status = :accepted")
            .condition_expression("#status = :pending AND friend_id = :target")
            .expression_attribute_names("#status", "status")
            .expression_attribute_values(
                ":accepted",
                AttributeValue::S(status_str(FriendshipStatus::Accepted).to_string()),
            )
            .expression_attribute_values(
                ":pending",
                AttributeValue::S(status_str(FriendshipStatus::Pending).to_string()),
            )
            .expression_attribute_values(":target", AttributeValue::S(target_id.to_string()))
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    Err(FriendshipRepositoryError::NotFound)
                } else {
                    Err(FriendshipRepositoryError::DynamoDb(e.to_string()))
                }
            }
        }
    }

    async fn count_accepted(&self, user_id: &str) -> Result<usize, FriendshipRepositoryError> {
        let mut total = 0usize;
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let output = self
                .client
                .scan()
                .table_name(&self.table_name)
                .filter_expression("#status = :accepted AND (user_id = :user OR friend_id = :user)")
                .expression_attribute_names("#status", "status")
                .expression_attribute_values(
                    ":accepted",
                    AttributeValue::S(status_str(FriendshipStatus::Accepted).to_string()),
                )
                .expression_attribute_values(":user", AttributeValue::S(user_id.to_string()))
                .select(Select::Count)
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| FriendshipRepositoryError::DynamoDb(e.to_string()))?;

            total += output.count.max(0) as usize;
            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        Ok(total)
    }
}

fn status_str(status: FriendshipStatus) -> &'static str {
    match status {
        FriendshipStatus::Pending => "pending",
        FriendshipStatus::Accepted => "accepted",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_str_matches_serialized_form() {
        for status in [FriendshipStatus::Pending, FriendshipStatus::Accepted] {
            let serialized = serde_json::to_value(status).unwrap();
            assert_eq!(serialized, status_str(status));
        }
    }

    #[test]
    fn test_friendship_item_is_keyed_by_pair() {
        let request = Friendship::new_request("bob", "alice");

        let item: HashMap<String, AttributeValue> = to_item(&request).unwrap();

        assert_eq!(
            item.get("pair_key"),
            Some(&AttributeValue::S("alice#bob".to_string()))
        );
        assert_eq!(
            item.get("status"),
            Some(&AttributeValue::S("pending".to_string()))
        );
    }
}
