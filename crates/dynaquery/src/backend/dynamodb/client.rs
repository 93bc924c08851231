//! `DynamoClient` over `aws_sdk_dynamodb`.

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{KeysAndAttributes, ReturnConsumedCapacity};
use aws_sdk_dynamodb::Client;

use dynaquery_core::client::{
    BatchGetRequest, BatchGetResponse, BatchWriteRequest, BatchWriteResponse, ClientError,
    ClientResult, DeleteItemRequest, DynamoClient, GetItemRequest, GetItemResponse,
    PutItemRequest, QueryRequest, QueryResponse, UpdateItemRequest,
};

use crate::config::Config;

use super::conversions::{
    from_sdk_capacity, from_sdk_item, from_sdk_write_request, to_sdk_item, to_sdk_write_request,
};
use super::error::{
    map_batch_get_error, map_batch_write_error, map_delete_item_error, map_get_item_error,
    map_put_item_error, map_query_error, map_update_item_error,
};

/// DynamoDB-backed client.
#[derive(Debug, Clone)]
pub struct DynamoDbClient {
    pub(super) client: Client,
}

impl DynamoDbClient {
    /// Wraps an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds an SDK client for the configured region and endpoint.
    ///
    /// Credentials come from the default AWS provider chain.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }

    /// Human readable description of where requests go.
    pub fn target_display(config: &Config) -> String {
        match &config.endpoint_url {
            Some(url) => format!("Local DynamoDB ({url})"),
            None => format!("AWS DynamoDB (region: {})", config.region),
        }
    }

    /// The underlying SDK client.
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl DynamoClient for DynamoDbClient {
    async fn get_item(&self, request: GetItemRequest) -> ClientResult<GetItemResponse> {
        let result = self
            .client
            .get_item()
            .table_name(request.table_name)
            .set_key(Some(to_sdk_item(request.key)))
            .consistent_read(request.consistent_read)
            .send()
            .await
            .map_err(map_get_item_error)?;

        Ok(GetItemResponse {
            item: result.item.map(from_sdk_item).transpose()?,
        })
    }

    async fn put_item(&self, request: PutItemRequest) -> ClientResult<()> {
        self.client
            .put_item()
            .table_name(request.table_name)
            .set_item(Some(to_sdk_item(request.item)))
            .send()
            .await
            .map_err(map_put_item_error)?;

        Ok(())
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> ClientResult<()> {
        self.client
            .delete_item()
            .table_name(request.table_name)
            .set_key(Some(to_sdk_item(request.key)))
            .send()
            .await
            .map_err(map_delete_item_error)?;

        Ok(())
    }

    async fn update_item(&self, request: UpdateItemRequest) -> ClientResult<()> {
        let values = request.expression_attribute_values;
        self.client
            .update_item()
            .table_name(request.table_name)
            .set_key(Some(to_sdk_item(request.key)))
            .update_expression(request.update_expression)
            .set_expression_attribute_names(Some(request.expression_attribute_names))
            // REMOVE-only updates bind no values; an empty map is rejected.
            .set_expression_attribute_values((!values.is_empty()).then(|| to_sdk_item(values)))
            .send()
            .await
            .map_err(map_update_item_error)?;

        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> ClientResult<QueryResponse> {
        let limit = request
            .limit
            .map(i32::try_from)
            .transpose()
            .map_err(|e| ClientError::Validation(format!("Invalid limit: {e}")))?;

        let result = self
            .client
            .query()
            .table_name(request.table_name)
            .set_index_name(request.index_name)
            .key_condition_expression(request.key_condition_expression)
            .set_expression_attribute_names(Some(request.expression_attribute_names))
            .set_expression_attribute_values(Some(to_sdk_item(
                request.expression_attribute_values,
            )))
            .set_limit(limit)
            .scan_index_forward(request.scan_index_forward)
            .set_exclusive_start_key(request.exclusive_start_key.map(to_sdk_item))
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(map_query_error)?;

        Ok(QueryResponse {
            items: result
                .items
                .unwrap_or_default()
                .into_iter()
                .map(from_sdk_item)
                .collect::<Result<_, _>>()?,
            count: usize::try_from(result.count).unwrap_or_default(),
            scanned_count: usize::try_from(result.scanned_count).unwrap_or_default(),
            last_evaluated_key: result.last_evaluated_key.map(from_sdk_item).transpose()?,
            consumed_capacity: result.consumed_capacity.map(from_sdk_capacity),
        })
    }

    async fn batch_get_item(&self, request: BatchGetRequest) -> ClientResult<BatchGetResponse> {
        let keys = KeysAndAttributes::builder()
            .set_keys(Some(request.keys.into_iter().map(to_sdk_item).collect()))
            .build()
            .map_err(|e| ClientError::Validation(e.to_string()))?;

        let mut result = self
            .client
            .batch_get_item()
            .request_items(&request.table_name, keys)
            .send()
            .await
            .map_err(map_batch_get_error)?;

        let items = result
            .responses
            .as_mut()
            .and_then(|responses| responses.remove(&request.table_name))
            .unwrap_or_default()
            .into_iter()
            .map(from_sdk_item)
            .collect::<Result<_, _>>()?;

        let unprocessed_keys = result
            .unprocessed_keys
            .as_mut()
            .and_then(|unprocessed| unprocessed.remove(&request.table_name))
            .map(|k| k.keys)
            .unwrap_or_default()
            .into_iter()
            .map(from_sdk_item)
            .collect::<Result<_, _>>()?;

        Ok(BatchGetResponse {
            items,
            unprocessed_keys,
        })
    }

    async fn batch_write_item(
        &self,
        request: BatchWriteRequest,
    ) -> ClientResult<BatchWriteResponse> {
        let writes = request
            .requests
            .into_iter()
            .map(to_sdk_write_request)
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = self
            .client
            .batch_write_item()
            .request_items(&request.table_name, writes)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await
            .map_err(map_batch_write_error)?;

        let unprocessed = result
            .unprocessed_items
            .as_mut()
            .and_then(|unprocessed| unprocessed.remove(&request.table_name))
            .unwrap_or_default()
            .into_iter()
            .map(from_sdk_write_request)
            .collect::<Result<_, _>>()?;

        let consumed_capacity = result
            .consumed_capacity
            .unwrap_or_default()
            .into_iter()
            .find(|c| c.table_name.as_deref() == Some(request.table_name.as_str()))
            .map(from_sdk_capacity);

        Ok(BatchWriteResponse {
            unprocessed,
            consumed_capacity,
        })
    }
}
