use crate::models::profile::Profile;
use crate::repositories::errors::profile_repository_errors::ProfileRepositoryError;
use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use serde_dynamo::{from_item, to_attribute_value, to_item};

#[cfg(test)]
use mockall::automock;

pub struct DynamoDbProfileRepository {
    pub client: Client,
    pub table_name: String,
}

impl DynamoDbProfileRepository {
    pub fn new(client: Client, table_name: &str) -> Self {
        Self {
            client,
            table_name: table_name.to_string(),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn create_profile(&self, profile: &Profile) -> Result<(), ProfileRepositoryError>;
    async fn get_profile(&self, user_id: &str) -> Result<Profile, ProfileRepositoryError>;
    async fn update_profile(&self, profile: &Profile) -> Result<(), ProfileRepositoryError>;
}

#[async_trait]
impl ProfileRepository for DynamoDbProfileRepository {
    async fn create_profile(&self, profile: &Profile) -> Result<(), ProfileRepositoryError> {
        let item =
            to_item(profile).map_err(|e| ProfileRepositoryError::Serialization(e.to_string()))?;
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    Err(ProfileRepositoryError::AlreadyExists)
                } else {
                    Err(ProfileRepositoryError::DynamoDb(e.to_string()))
                }
            }
        }
    }

    async fn get_profile(&self, user_id: &str) -> Result<Profile, ProfileRepositoryError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(
                "id",
                to_attribute_value(user_id)
                    .map_err(|e| ProfileRepositoryError::Serialization(e.to_string()))?,
            )
            .send()
            .await
            .map_err(|e| ProfileRepositoryError::DynamoDb(e.to_string()))?;

        if let Some(item) = output.item {
            let profile: Profile =
                from_item(item).map_err(|e| ProfileRepositoryError::Serialization(e.to_string()))?;
            Ok(profile)
        } else {
            Err(ProfileRepositoryError::NotFound)
        }
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), ProfileRepositoryError> {
        let item =
            to_item(profile).map_err(|e| ProfileRepositoryError::Serialization(e.to_string()))?;
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_exists(id)")
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    Err(ProfileRepositoryError::NotFound)
                } else {
                    Err(ProfileRepositoryError::DynamoDb(e.to_string()))
                }
            }
        }
    }
}
