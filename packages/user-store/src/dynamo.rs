use crate::store::{StoreError, UserStore};
use crate::types::{Item, USER_ID_ATTRIBUTE};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{self, retry::RetryConfig};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use tracing::{debug, info, instrument};

/// Users table backed by DynamoDB
#[derive(Clone, Debug)]
pub struct DynamoUserStore {
    client: Client,
    table: String,
}

impl DynamoUserStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Build a client from the default credential and region chain.
    ///
    /// `endpoint_url` points the client somewhere other than AWS, e.g.
    /// DynamoDB Local at `http://localhost:8000`.
    pub async fn from_env(table: impl Into<String>, endpoint_url: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(url) = endpoint_url {
            info!(endpoint = %url, "Using DynamoDB endpoint override");
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;
        Self::from_conf(config::Builder::from(&sdk_config), table)
    }

    /// Build from an explicit client config. SDK retries are switched off:
    /// a failed query surfaces after a single attempt.
    pub fn from_conf(builder: config::Builder, table: impl Into<String>) -> Self {
        let conf = builder.retry_config(RetryConfig::disabled()).build();
        Self::new(Client::from_conf(conf), table)
    }
}

#[async_trait]
impl UserStore for DynamoUserStore {
    #[instrument(skip(self), fields(table = %self.table))]
    async fn query_by_user_id(&self, user_id: &str) -> Result<Vec<Item>, StoreError> {
        let output = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("#pk = :pk")
            .expression_attribute_names("#pk", USER_ID_ATTRIBUTE)
            .expression_attribute_values(":pk", AttributeValue::S(user_id.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::new(&self.table, DisplayErrorContext(&e).to_string()))?;

        let items = output.items.unwrap_or_default();
        debug!(count = items.len(), "Query completed");
        Ok(items)
    }

    fn table_name(&self) -> &str {
        &self.table
    }
}
