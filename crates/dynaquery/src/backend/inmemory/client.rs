use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynaquery_core::batch::{MAX_BATCH_GET_SIZE, MAX_BATCH_WRITE_SIZE};
use dynaquery_core::client::{
    BatchGetRequest, BatchGetResponse, BatchWriteRequest, BatchWriteResponse, ClientError,
    ClientResult, DeleteItemRequest, DynamoClient, GetItemRequest, GetItemResponse,
    PutItemRequest, QueryRequest, QueryResponse, UpdateItemRequest, WriteRequest,
};
use dynaquery_core::codec::extract_key;
use dynaquery_core::schema::TableMetadata;

use super::expression::{apply_update, parse_key_condition, parse_update, UpdateOp};
use super::table::Table;

/// In-process backend.
///
/// Tables live in a `HashMap` behind an `Arc<RwLock<_>>`; clones share the
/// same data. Nothing is persisted.
#[derive(Debug, Clone, Default)]
pub struct InMemoryClient {
    tables: Arc<RwLock<HashMap<String, Table>>>,
}

impl InMemoryClient {
    /// Creates a client with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an empty table.
    pub async fn create_table(&self, metadata: &TableMetadata) -> ClientResult<()> {
        let mut tables = self.tables.write().await;
        if tables.contains_key(&metadata.name) {
            return Err(ClientError::Validation(format!(
                "Table already exists: {}",
                metadata.name
            )));
        }
        tables.insert(metadata.name.clone(), Table::new(metadata.clone()));
        tracing::debug!(table = %metadata.name, "In-memory table created");
        Ok(())
    }

    /// Drops a table and all its items.
    pub async fn drop_table(&self, name: &str) -> ClientResult<()> {
        match self.tables.write().await.remove(name) {
            Some(_) => {
                tracing::debug!(table = %name, "In-memory table dropped");
                Ok(())
            }
            None => Err(not_found(name)),
        }
    }

    /// Number of items currently stored in a table.
    pub async fn item_count(&self, name: &str) -> ClientResult<usize> {
        let tables = self.tables.read().await;
        tables.get(name).map(Table::len).ok_or_else(|| not_found(name))
    }
}

fn not_found(table: &str) -> ClientError {
    ClientError::ResourceNotFound(format!("Requested resource not found: Table: {table} not found"))
}

#[async_trait]
impl DynamoClient for InMemoryClient {
    async fn get_item(&self, request: GetItemRequest) -> ClientResult<GetItemResponse> {
        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| not_found(&request.table_name))?;

        Ok(GetItemResponse {
            item: table.get(&request.key)?.cloned(),
        })
    }

    async fn put_item(&self, request: PutItemRequest) -> ClientResult<()> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| not_found(&request.table_name))?;

        table.put(request.item)
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> ClientResult<()> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| not_found(&request.table_name))?;

        table.delete(&request.key)
    }

    async fn update_item(&self, request: UpdateItemRequest) -> ClientResult<()> {
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| not_found(&request.table_name))?;

        let ops = parse_update(
            &request.update_expression,
            &request.expression_attribute_names,
            &request.expression_attribute_values,
        )?;

        for op in &ops {
            let name = match op {
                UpdateOp::Set(name, _) | UpdateOp::Add(name, _) | UpdateOp::Remove(name) => name,
            };
            if table.metadata.is_primary_key_attribute(name) {
                return Err(ClientError::Validation(format!(
                    "Cannot update attribute {name}. This attribute is part of the key"
                )));
            }
        }

        // Validate against a copy so a failing clause leaves the item untouched.
        let item = table.upsert(&request.key)?;
        let mut updated = item.clone();
        apply_update(&mut updated, ops)?;
        *item = updated;
        Ok(())
    }

    async fn query(&self, request: QueryRequest) -> ClientResult<QueryResponse> {
        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| not_found(&request.table_name))?;

        let condition = parse_key_condition(
            &request.key_condition_expression,
            &request.expression_attribute_names,
            &request.expression_attribute_values,
        )?;

        table.query(
            request.index_name.as_deref(),
            &condition,
            request.limit,
            request.scan_index_forward,
            request.exclusive_start_key.as_ref(),
        )
    }

    async fn batch_get_item(&self, request: BatchGetRequest) -> ClientResult<BatchGetResponse> {
        if request.keys.is_empty() || request.keys.len() > MAX_BATCH_GET_SIZE {
            return Err(ClientError::Validation(format!(
                "Too many items requested for the BatchGetItem call: {} (must be between 1 and {MAX_BATCH_GET_SIZE})",
                request.keys.len()
            )));
        }

        let tables = self.tables.read().await;
        let table = tables
            .get(&request.table_name)
            .ok_or_else(|| not_found(&request.table_name))?;

        let mut items = Vec::with_capacity(request.keys.len());
        for key in &request.keys {
            if let Some(item) = table.get(key)? {
                items.push(item.clone());
            }
        }

        Ok(BatchGetResponse {
            items,
            unprocessed_keys: Vec::new(),
        })
    }

    async fn batch_write_item(
        &self,
        request: BatchWriteRequest,
    ) -> ClientResult<BatchWriteResponse> {
        if request.requests.is_empty() || request.requests.len() > MAX_BATCH_WRITE_SIZE {
            return Err(ClientError::Validation(format!(
                "Too many items in the BatchWriteItem call: {} (must be between 1 and {MAX_BATCH_WRITE_SIZE})",
                request.requests.len()
            )));
        }

        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(&request.table_name)
            .ok_or_else(|| not_found(&request.table_name))?;

        // The whole batch is rejected before anything is applied.
        let mut seen = Vec::with_capacity(request.requests.len());
        for write in &request.requests {
            let id = match write {
                WriteRequest::Put(item) => {
                    let key = extract_key(&table.metadata.primary_key, item)
                        .map_err(|e| ClientError::Validation(e.to_string()))?;
                    table.key_id(&key)?
                }
                WriteRequest::Delete(key) => table.key_id(key)?,
            };
            if seen.contains(&id) {
                return Err(ClientError::Validation(
                    "Provided list of item keys contains duplicates".into(),
                ));
            }
            seen.push(id);
        }

        let written = request.requests.len();
        for write in request.requests {
            match write {
                WriteRequest::Put(item) => table.put(item)?,
                WriteRequest::Delete(key) => table.delete(&key)?,
            }
        }

        Ok(BatchWriteResponse {
            unprocessed: Vec::new(),
            consumed_capacity: Some(table.capacity(written)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dynaquery_core::schema::AttributeType;
    use dynaquery_core::value::{AttributeValue, Item, Key};

    fn cards() -> TableMetadata {
        TableMetadata::builder("prod-Card4")
            .attribute("id", AttributeType::Number)
            .attribute("title", AttributeType::String)
            .hash_primary_key("id")
            .build()
            .unwrap()
    }

    fn card(id: u64, title: &str) -> Item {
        Item::from([
            ("id".to_string(), AttributeValue::N(id.to_string())),
            ("title".to_string(), AttributeValue::S(title.into())),
        ])
    }

    fn key(id: u64) -> Key {
        Key::from([("id".to_string(), AttributeValue::N(id.to_string()))])
    }

    async fn client() -> InMemoryClient {
        let client = InMemoryClient::new();
        client.create_table(&cards()).await.unwrap();
        client
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let client = client().await;
        client
            .put_item(PutItemRequest {
                table_name: "prod-Card4".into(),
                item: card(1, "one"),
            })
            .await
            .unwrap();

        let response = client
            .get_item(GetItemRequest {
                table_name: "prod-Card4".into(),
                key: key(1),
                consistent_read: false,
            })
            .await
            .unwrap();
        assert_eq!(response.item, Some(card(1, "one")));

        client
            .delete_item(DeleteItemRequest {
                table_name: "prod-Card4".into(),
                key: key(1),
            })
            .await
            .unwrap();
        assert_eq!(client.item_count("prod-Card4").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let client = InMemoryClient::new();
        let result = client
            .get_item(GetItemRequest {
                table_name: "missing".into(),
                key: key(1),
                consistent_read: false,
            })
            .await;
        assert!(matches!(result, Err(ClientError::ResourceNotFound(_))));
    }

    #[tokio::test]
    async fn test_create_table_twice() {
        let client = client().await;
        assert!(client.create_table(&cards()).await.is_err());
        client.drop_table("prod-Card4").await.unwrap();
        assert!(client.drop_table("prod-Card4").await.is_err());
    }

    #[tokio::test]
    async fn test_update_creates_missing_item() {
        let client = client().await;
        client
            .update_item(UpdateItemRequest {
                table_name: "prod-Card4".into(),
                key: key(9),
                update_expression: "SET #u0 = :u0".into(),
                expression_attribute_names: HashMap::from([("#u0".into(), "title".into())]),
                expression_attribute_values: HashMap::from([(
                    ":u0".into(),
                    AttributeValue::S("nine".into()),
                )]),
            })
            .await
            .unwrap();

        let response = client
            .get_item(GetItemRequest {
                table_name: "prod-Card4".into(),
                key: key(9),
                consistent_read: false,
            })
            .await
            .unwrap();
        assert_eq!(response.item, Some(card(9, "nine")));
    }

    #[tokio::test]
    async fn test_update_rejects_key_attribute() {
        let client = client().await;
        let result = client
            .update_item(UpdateItemRequest {
                table_name: "prod-Card4".into(),
                key: key(1),
                update_expression: "SET #u0 = :u0".into(),
                expression_attribute_names: HashMap::from([("#u0".into(), "id".into())]),
                expression_attribute_values: HashMap::from([(
                    ":u0".into(),
                    AttributeValue::N("2".into()),
                )]),
            })
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert_eq!(client.item_count("prod-Card4").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_write_limits() {
        let client = client().await;
        let requests: Vec<WriteRequest> = (0..26).map(|i| WriteRequest::Put(card(i, "x"))).collect();
        let result = client
            .batch_write_item(BatchWriteRequest {
                table_name: "prod-Card4".into(),
                requests,
            })
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert_eq!(client.item_count("prod-Card4").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_write_rejects_duplicates() {
        let client = client().await;
        let result = client
            .batch_write_item(BatchWriteRequest {
                table_name: "prod-Card4".into(),
                requests: vec![
                    WriteRequest::Put(card(1, "a")),
                    WriteRequest::Delete(key(1)),
                ],
            })
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_batch_get_omits_missing_keys() {
        let client = client().await;
        client
            .put_item(PutItemRequest {
                table_name: "prod-Card4".into(),
                item: card(1, "one"),
            })
            .await
            .unwrap();

        let response = client
            .batch_get_item(BatchGetRequest {
                table_name: "prod-Card4".into(),
                keys: vec![key(1), key(2)],
            })
            .await
            .unwrap();
        assert_eq!(response.items, vec![card(1, "one")]);
        assert!(response.unprocessed_keys.is_empty());
    }

    #[tokio::test]
    async fn test_batch_get_limit() {
        let client = client().await;
        let result = client
            .batch_get_item(BatchGetRequest {
                table_name: "prod-Card4".into(),
                keys: (0..101).map(key).collect(),
            })
            .await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }
}
