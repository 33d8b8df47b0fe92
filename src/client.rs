//! The provider client seam.
//!
//! Handlers talk to DynamoDB through [`ItemClient`], which takes the
//! fully-built operation input and returns the operation output. The SDK
//! client implements it by forwarding every field onto its fluent builders;
//! tests and alternative transports provide their own implementation.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig, defaults};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_dynamodb::operation::delete_item::{DeleteItemInput, DeleteItemOutput};
use aws_sdk_dynamodb::operation::get_item::{GetItemInput, GetItemOutput};
use aws_sdk_dynamodb::operation::put_item::{PutItemInput, PutItemOutput};
use aws_sdk_dynamodb::operation::query::{QueryInput, QueryOutput};
use aws_sdk_dynamodb::operation::update_item::{UpdateItemInput, UpdateItemOutput};
use aws_types::sdk_config::{RetryConfig, TimeoutConfig};

use crate::Error;

/// Asynchronous point operations used by the request handlers.
///
/// Implementations must be safe to share across concurrent calls; handlers
/// hold them as `Arc<dyn ItemClient>`.
#[async_trait]
pub trait ItemClient: fmt::Debug + Send + Sync {
    /// Execute a GetItem request
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, Error>;
    /// Execute a PutItem request
    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, Error>;
    /// Execute an UpdateItem request
    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error>;
    /// Execute a DeleteItem request
    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error>;
    /// Execute a single Query page
    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error>;
}

#[async_trait]
impl ItemClient for DynamoDbClient {
    async fn get_item(&self, input: GetItemInput) -> Result<GetItemOutput, Error> {
        let output = DynamoDbClient::get_item(self)
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_consistent_read(input.consistent_read)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .send()
            .await?;
        Ok(output)
    }

    async fn put_item(&self, input: PutItemInput) -> Result<PutItemOutput, Error> {
        let output = DynamoDbClient::put_item(self)
            .set_table_name(input.table_name)
            .set_item(input.item)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .set_return_values_on_condition_check_failure(
                input.return_values_on_condition_check_failure,
            )
            .send()
            .await?;
        Ok(output)
    }

    async fn update_item(&self, input: UpdateItemInput) -> Result<UpdateItemOutput, Error> {
        let output = DynamoDbClient::update_item(self)
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_update_expression(input.update_expression)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .set_return_values_on_condition_check_failure(
                input.return_values_on_condition_check_failure,
            )
            .send()
            .await?;
        Ok(output)
    }

    async fn delete_item(&self, input: DeleteItemInput) -> Result<DeleteItemOutput, Error> {
        let output = DynamoDbClient::delete_item(self)
            .set_table_name(input.table_name)
            .set_key(input.key)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .set_return_values(input.return_values)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_return_item_collection_metrics(input.return_item_collection_metrics)
            .set_return_values_on_condition_check_failure(
                input.return_values_on_condition_check_failure,
            )
            .send()
            .await?;
        Ok(output)
    }

    async fn query(&self, input: QueryInput) -> Result<QueryOutput, Error> {
        let output = DynamoDbClient::query(self)
            .set_table_name(input.table_name)
            .set_index_name(input.index_name)
            .set_select(input.select)
            .set_limit(input.limit)
            .set_consistent_read(input.consistent_read)
            .set_scan_index_forward(input.scan_index_forward)
            .set_exclusive_start_key(input.exclusive_start_key)
            .set_return_consumed_capacity(input.return_consumed_capacity)
            .set_projection_expression(input.projection_expression)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_expression_attribute_names(input.expression_attribute_names)
            .set_expression_attribute_values(input.expression_attribute_values)
            .send()
            .await?;
        Ok(output)
    }
}

/// Load the AWS SDK configuration with sensible defaults
///
/// It configures:
/// - Adaptive retry mode with 3 max attempts
/// - Exponential backoff starting at 1 second
/// - Connect timeout: 3 seconds
/// - Read timeout: 20 seconds
/// - Operation timeout: 60 seconds
/// - LocalStack support via AWS_PROFILE=localstack
pub async fn default_sdk_config() -> SdkConfig {
    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(Duration::from_secs(3))
        .read_timeout(Duration::from_secs(20))
        .operation_timeout(Duration::from_secs(60))
        .build();

    let mut loader = defaults(BehaviorVersion::latest())
        .retry_config(
            RetryConfig::adaptive()
                .with_max_attempts(3)
                .with_initial_backoff(Duration::from_secs(1)),
        )
        .timeout_config(timeout_config);

    // Support LocalStack via AWS_PROFILE=localstack
    if std::env::var("AWS_PROFILE").unwrap_or_default() == "localstack" {
        loader = loader.endpoint_url("http://127.0.0.1:4566");
    }

    loader.load().await
}

/// Wrap a DynamoDB client built from `config` for use with handlers.
///
/// ```rust,no_run
/// # async fn example() {
/// let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
///     .region(aws_config::Region::new("us-west-2"))
///     .load()
///     .await;
/// let client = dynamo_request::client_from_config(&config);
/// # }
/// ```
pub fn client_from_config(config: &SdkConfig) -> Arc<dyn ItemClient> {
    Arc::new(DynamoDbClient::new(config))
}

/// Build a DynamoDB client from [`default_sdk_config`].
///
/// Call this once at startup and hand the result to
/// [`TableAccess::with_client`](crate::TableAccess::with_client) or to
/// [`HandlerOptions::client`](crate::HandlerOptions::client).
pub async fn default_client() -> Arc<dyn ItemClient> {
    let config = default_sdk_config().await;
    client_from_config(&config)
}
