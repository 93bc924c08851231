use async_trait::async_trait;

use super::{
    BatchGetRequest, BatchGetResponse, BatchWriteRequest, BatchWriteResponse, ClientError,
    DeleteItemRequest, GetItemRequest, GetItemResponse, PutItemRequest, QueryRequest,
    QueryResponse, UpdateItemRequest,
};

/// Result type for backend client calls.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Low-level store client.
///
/// Kept as close as possible to the store's own API so that everything above
/// it can be exercised against an in-process implementation.
#[async_trait]
pub trait DynamoClient: Send + Sync {
    /// Reads a single item by primary key.
    async fn get_item(&self, request: GetItemRequest) -> ClientResult<GetItemResponse>;

    /// Writes a full item, replacing any existing item with the same key.
    async fn put_item(&self, request: PutItemRequest) -> ClientResult<()>;

    /// Deletes an item by primary key. Missing items are not an error.
    async fn delete_item(&self, request: DeleteItemRequest) -> ClientResult<()>;

    /// Applies an update expression to an item, creating it if absent.
    async fn update_item(&self, request: UpdateItemRequest) -> ClientResult<()>;

    /// Runs a key-condition query against the table or one of its indexes.
    async fn query(&self, request: QueryRequest) -> ClientResult<QueryResponse>;

    /// Reads up to the per-call limit of items by key.
    async fn batch_get_item(&self, request: BatchGetRequest) -> ClientResult<BatchGetResponse>;

    /// Applies up to the per-call limit of puts/deletes.
    async fn batch_write_item(
        &self,
        request: BatchWriteRequest,
    ) -> ClientResult<BatchWriteResponse>;
}
