//! Table-level operations shared by every accessor.

use std::sync::Arc;

use dynaquery_core::batch::{RetryPolicy, MAX_BATCH_GET_SIZE};
use dynaquery_core::client::{
    BatchGetRequest, DeleteItemRequest, DynamoClient, GetItemRequest, PutItemRequest,
    QueryRequest, UpdateItemRequest, WriteRequest,
};
use dynaquery_core::codec::{self, Entity};
use dynaquery_core::expression::{ChangeSet, KeyCondition, UpdatePlan};
use dynaquery_core::schema::{IndexMetadata, TableMetadata};
use dynaquery_core::value::{AttributeValue, Key};
use dynaquery_core::{Error, Result};

use crate::batch_write::{BatchWriteExecutor, BatchWriteSummary};
use crate::query::{Cursor, QueryOptions, QueryResult};
use crate::retry::{backoff, with_retry};

/// Backend client shared by every accessor.
pub type SharedClient = Arc<dyn DynamoClient>;

/// A table's metadata bound to a client and retry settings.
///
/// Cheap to clone. Accessors are built from one.
#[derive(Clone)]
pub struct TableHandle {
    metadata: Arc<TableMetadata>,
    client: SharedClient,
    retry: RetryPolicy,
    concurrency: usize,
}

impl std::fmt::Debug for TableHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableHandle")
            .field("table", &self.metadata.name)
            .field("retry", &self.retry)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl TableHandle {
    pub fn new(client: SharedClient, metadata: Arc<TableMetadata>) -> Self {
        Self {
            metadata,
            client,
            retry: RetryPolicy::default(),
            concurrency: 1,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of batch chunks in flight at once. Zero is treated as one.
    pub fn with_batch_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub(crate) fn client(&self) -> &dyn DynamoClient {
        self.client.as_ref()
    }

    pub(crate) fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub(crate) fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub(crate) async fn get<T: Entity>(&self, key: Key) -> Result<Option<T>> {
        codec::check_key(&key)?;
        tracing::debug!(table = %self.name(), "GetItem");
        let response = with_retry(&self.retry, "GetItem", || {
            self.client.get_item(GetItemRequest {
                table_name: self.metadata.name.clone(),
                key: key.clone(),
                consistent_read: false,
            })
        })
        .await?;

        Ok(response
            .item
            .map(|item| codec::deserialize(&self.metadata, &item))
            .transpose()?)
    }

    pub(crate) async fn put<T: Entity>(&self, entity: &T) -> Result<()> {
        let item = codec::serialize(&self.metadata, entity)?;
        tracing::debug!(table = %self.name(), "PutItem");
        with_retry(&self.retry, "PutItem", || {
            self.client.put_item(PutItemRequest {
                table_name: self.metadata.name.clone(),
                item: item.clone(),
            })
        })
        .await
    }

    pub(crate) async fn delete(&self, key: Key) -> Result<()> {
        codec::check_key(&key)?;
        tracing::debug!(table = %self.name(), "DeleteItem");
        with_retry(&self.retry, "DeleteItem", || {
            self.client.delete_item(DeleteItemRequest {
                table_name: self.metadata.name.clone(),
                key: key.clone(),
            })
        })
        .await
    }

    pub(crate) async fn update(&self, key: Key, changes: &ChangeSet) -> Result<()> {
        codec::check_key(&key)?;
        let plan = UpdatePlan::build(&self.metadata, changes);
        if !plan.dropped.is_empty() {
            tracing::warn!(
                table = %self.name(),
                dropped = ?plan.dropped,
                "Ignoring undeclared properties in change set"
            );
        }
        if plan.is_empty() {
            tracing::debug!(table = %self.name(), "Nothing to update");
            return Ok(());
        }

        tracing::debug!(table = %self.name(), expression = %plan.expression, "UpdateItem");
        with_retry(&self.retry, "UpdateItem", || {
            self.client.update_item(UpdateItemRequest {
                table_name: self.metadata.name.clone(),
                key: key.clone(),
                update_expression: plan.expression.clone(),
                expression_attribute_names: plan.names.clone(),
                expression_attribute_values: plan.values.clone(),
            })
        })
        .await
    }

    /// Reads up to `MAX_BATCH_GET_SIZE` items. Keys without an item are
    /// omitted from the result.
    pub(crate) async fn batch_get<T: Entity>(&self, keys: Vec<Key>) -> Result<Vec<T>> {
        if keys.len() > MAX_BATCH_GET_SIZE {
            return Err(Error::BatchSizeExceeded {
                limit: MAX_BATCH_GET_SIZE,
                actual: keys.len(),
            });
        }
        for key in &keys {
            codec::check_key(key)?;
        }

        let mut items = Vec::with_capacity(keys.len());
        let mut pending = keys;
        let mut attempt = 0;

        while !pending.is_empty() {
            tracing::debug!(table = %self.name(), keys = pending.len(), attempt, "BatchGetItem");
            let response = with_retry(&self.retry, "BatchGetItem", || {
                self.client.batch_get_item(BatchGetRequest {
                    table_name: self.metadata.name.clone(),
                    keys: pending.clone(),
                })
            })
            .await?;

            items.extend(response.items);
            pending = response.unprocessed_keys;
            if pending.is_empty() {
                break;
            }

            if !self.retry.should_retry(attempt) {
                tracing::error!(
                    table = %self.name(),
                    unprocessed = pending.len(),
                    "Batch get abandoned with unprocessed keys"
                );
                return Err(Error::BackendUnavailable {
                    operation: "BatchGetItem",
                    message: format!("{} keys remain unprocessed", pending.len()),
                });
            }

            let delay = backoff(&self.retry, attempt);
            tracing::warn!(
                table = %self.name(),
                unprocessed = pending.len(),
                attempt = attempt + 1,
                "Retrying unprocessed keys"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }

        items
            .iter()
            .map(|item| codec::deserialize(&self.metadata, item).map_err(Error::from))
            .collect()
    }

    pub(crate) async fn batch_delete(&self, keys: Vec<Key>) -> Result<BatchWriteSummary> {
        BatchWriteExecutor::new(self.clone())
            .write_all(keys.into_iter().map(WriteRequest::Delete).collect())
            .await
    }

    /// Queries the table, or `index` when given.
    pub(crate) async fn query<T: Entity>(
        &self,
        index: Option<&IndexMetadata>,
        hash: AttributeValue,
        options: QueryOptions<AttributeValue>,
    ) -> Result<QueryResult<T>> {
        let key = index.map_or(&self.metadata.primary_key, |i| &i.key);
        let condition = KeyCondition::build(key, hash, options.range)?;
        let index_name = index.map(|i| i.name.clone());
        let exclusive_start_key = options.cursor.map(Cursor::into_key);

        tracing::debug!(
            table = %self.name(),
            index = ?index_name,
            expression = %condition.expression,
            limit = ?options.limit,
            "Query"
        );

        let response = with_retry(&self.retry, "Query", || {
            self.client.query(QueryRequest {
                table_name: self.metadata.name.clone(),
                index_name: index_name.clone(),
                key_condition_expression: condition.expression.clone(),
                expression_attribute_names: condition.names.clone(),
                expression_attribute_values: condition.values.clone(),
                limit: options.limit,
                scan_index_forward: options.order.scan_index_forward(),
                exclusive_start_key: exclusive_start_key.clone(),
            })
        })
        .await?;

        let records = response
            .items
            .iter()
            .map(|item| codec::deserialize(&self.metadata, item))
            .collect::<std::result::Result<Vec<T>, _>>()?;

        Ok(QueryResult {
            records,
            count: response.count,
            scanned_count: response.scanned_count,
            cursor: response.last_evaluated_key.map(Cursor::new),
            consumed_capacity: response.consumed_capacity,
        })
    }
}
