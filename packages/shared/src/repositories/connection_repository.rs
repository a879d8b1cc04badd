use async_trait::async_trait;
use aws_sdk_apigatewaymanagement::{primitives::Blob, Client as ApiGatewayClient};
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use serde_dynamo::{from_item, from_items, to_item};
use std::collections::HashMap;
use tracing::info;

use crate::models::connection::Connection;
use crate::repositories::errors::connection_repository_errors::ConnectionRepositoryError;

#[cfg(test)]
use mockall::automock;

const MATCH_INDEX: &str = "GSI_ConnectionsByMatch";

#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn store_connection(
        &self,
        connection_id: &str,
        player_id: &str,
    ) -> Result<(), ConnectionRepositoryError>;

    async fn remove_connection(&self, connection_id: &str) -> Result<(), ConnectionRepositoryError>;

    async fn get_connection(
        &self,
        connection_id: &str,
    ) -> Result<Connection, ConnectionRepositoryError>;

    async fn subscribe(
        &self,
        connection_id: &str,
        match_id: &str,
    ) -> Result<(), ConnectionRepositoryError>;

    async fn unsubscribe(&self, connection_id: &str) -> Result<(), ConnectionRepositoryError>;

    async fn connections_for_match(
        &self,
        match_id: &str,
    ) -> Result<Vec<Connection>, ConnectionRepositoryError>;

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), ConnectionRepositoryError>;
}

pub struct DynamoDbConnectionRepository {
    dynamodb_client: DynamoDbClient,
    api_gateway_client: ApiGatewayClient,
    table_name: String,
}

impl DynamoDbConnectionRepository {
    pub fn new(
        dynamodb_client: DynamoDbClient,
        api_gateway_client: ApiGatewayClient,
        table_name: &str,
    ) -> Self {
        Self {
            dynamodb_client,
            api_gateway_client,
            table_name: table_name.to_string(),
        }
    }

    /// Management API client pointed at the deployed WebSocket stage,
    /// e.g. `https://{api-id}.execute-api.{region}.amazonaws.com/{stage}`.
    pub fn api_gateway_client(
        config: &aws_config::SdkConfig,
        endpoint: &str,
    ) -> ApiGatewayClient {
        let api_gateway_config = aws_sdk_apigatewaymanagement::config::Builder::from(config)
            .endpoint_url(endpoint)
            .build();
        ApiGatewayClient::from_conf(api_gateway_config)
    }
}

#[async_trait]
impl ConnectionRepository for DynamoDbConnectionRepository {
    async fn store_connection(
        &self,
        connection_id: &str,
        player_id: &str,
    ) -> Result<(), ConnectionRepositoryError> {
        let connection = Connection::new(connection_id, player_id);
        let item: HashMap<String, AttributeValue> =
            to_item(&connection).map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))?;

        info!(
            "Stored WebSocket connection {} for player: {}",
            connection_id, player_id
        );
        Ok(())
    }

    async fn remove_connection(&self, connection_id: &str) -> Result<(), ConnectionRepositoryError> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                "connection_id",
                AttributeValue::S(connection_id.to_string()),
            )
            .send()
            .await
            .map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))?;

        info!("Removed WebSocket connection: {}", connection_id);
        Ok(())
    }

    async fn get_connection(
        &self,
        connection_id: &str,
    ) -> Result<Connection, ConnectionRepositoryError> {
        let output = self
            .dynamodb_client
            .get_item()
            .table_name(&self.table_name)
            .key(
                "connection_id",
                AttributeValue::S(connection_id.to_string()),
            )
            .send()
            .await
            .map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))?;

        match output.item {
            Some(item) => {
                from_item(item).map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))
            }
            None => Err(ConnectionRepositoryError::NotFound),
        }
    }

    async fn subscribe(
        &self,
        connection_id: &str,
        match_id: &str,
    ) -> Result<(), ConnectionRepositoryError> {
        let result = self
            .dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(
                "connection_id",
                AttributeValue::S(connection_id.to_string()),
            )
            .update_expression("SET match_id = :match_id")
            .condition_expression("attribute_exists(connection_id)")
            .expression_attribute_values(":match_id", AttributeValue::S(match_id.to_string()))
            .send()
            .await;

        match result {
            Ok(_) => {
                info!("Connection {} subscribed to match {}", connection_id, match_id);
                Ok(())
            }
            Err(e) => {
                if e.as_service_error()
                    .map_or(false, |se| se.is_conditional_check_failed_exception())
                {
                    Err(ConnectionRepositoryError::NotFound)
                } else {
                    Err(ConnectionRepositoryError::DynamoDb(e.to_string()))
                }
            }
        }
    }

    async fn unsubscribe(&self, connection_id: &str) -> Result<(), ConnectionRepositoryError> {
        self.dynamodb_client
            .update_item()
            .table_name(&self.table_name)
            .key(
                "connection_id",
                AttributeValue::S(connection_id.to_string()),
            )
            .update_expression("REMOVE match_id")
            .send()
            .await
            .map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))?;

        Ok(())
    }

    async fn connections_for_match(
        &self,
        match_id: &str,
    ) -> Result<Vec<Connection>, ConnectionRepositoryError> {
        let output = self
            .dynamodb_client
            .query()
            .table_name(&self.table_name)
            .index_name(MATCH_INDEX)
            .key_condition_expression("match_id = :match_id")
            .expression_attribute_values(":match_id", AttributeValue::S(match_id.to_string()))
            .send()
            .await
            .map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))?;

        let items = output.items.unwrap_or_default();
        from_items(items).map_err(|e| ConnectionRepositoryError::DynamoDb(e.to_string()))
    }

    async fn send_message(
        &self,
        connection_id: &str,
        message: &str,
    ) -> Result<(), ConnectionRepositoryError> {
        let result = self
            .api_gateway_client
            .post_to_connection()
            .connection_id(connection_id)
            .data(Blob::new(message.as_bytes()))
            .send()
            .await;

        match result {
            Ok(_) => {
                info!("Sent message to connection: {}", connection_id);
                Ok(())
            }
            Err(e) => {
                if e.as_service_error().map_or(false, |se| se.is_gone_exception()) {
                    Err(ConnectionRepositoryError::Gone(connection_id.to_string()))
                } else {
                    Err(ConnectionRepositoryError::ApiGateway(e.to_string()))
                }
            }
        }
    }
}
