//! Fixtures shared by the accessor and executor tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use dynaquery_core::batch::RetryPolicy;
use dynaquery_core::client::{
    BatchGetRequest, BatchGetResponse, BatchWriteRequest, BatchWriteResponse, ClientError,
    ClientResult, DeleteItemRequest, DynamoClient, GetItemRequest, GetItemResponse,
    PutItemRequest, QueryRequest, QueryResponse, UpdateItemRequest,
};
use dynaquery_core::schema::{AttributeType, TableMetadata};

use crate::backend::InMemoryClient;
use crate::table::{SharedClient, TableHandle};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: i64,
    pub title: String,
    pub created_at: Option<i64>,
    pub views: Option<i64>,
}

pub fn card(id: i64, title: &str) -> Card {
    Card {
        id,
        title: title.to_string(),
        created_at: None,
        views: None,
    }
}

pub fn card_table() -> TableMetadata {
    TableMetadata::builder("prod-Card")
        .attribute("id", AttributeType::Number)
        .attribute("title", AttributeType::String)
        .attribute_as("createdAt", "created_at", AttributeType::Number)
        .attribute("views", AttributeType::Number)
        .hash_primary_key("id")
        .hash_global_index("title-index", "title")
        .full_global_index("title-created-index", "title", "created_at")
        .build()
        .unwrap()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub user_id: String,
    pub ts: i64,
    pub kind: String,
}

pub fn event(user_id: &str, ts: i64, kind: &str) -> Event {
    Event {
        user_id: user_id.to_string(),
        ts,
        kind: kind.to_string(),
    }
}

pub fn event_table() -> TableMetadata {
    TableMetadata::builder("events")
        .attribute("user_id", AttributeType::String)
        .attribute("ts", AttributeType::Number)
        .attribute("kind", AttributeType::String)
        .full_primary_key("user_id", "ts")
        .full_global_index("kind-ts-index", "kind", "ts")
        .build()
        .unwrap()
}

/// What the next batch write call does instead of (or on top of) the
/// in-memory write.
pub enum BatchFault {
    /// Plain pass-through.
    None,
    /// Writes all but the last `n` requests and reports those as unprocessed.
    Unprocessed(usize),
    Error(ClientError),
    /// Fires the cancellation channel, then never completes.
    Hang(Arc<watch::Sender<bool>>),
}

/// `InMemoryClient` wrapper counting calls and injecting faults.
#[derive(Default)]
pub struct RecordingClient {
    inner: InMemoryClient,
    pub get_calls: AtomicUsize,
    pub put_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub query_calls: AtomicUsize,
    pub batch_get_calls: AtomicUsize,
    pub batch_write_calls: AtomicUsize,
    batch_write_sizes: Mutex<Vec<usize>>,
    batch_faults: Mutex<VecDeque<BatchFault>>,
    call_faults: Mutex<VecDeque<ClientError>>,
    batch_get_unprocessed: Mutex<VecDeque<usize>>,
}

impl RecordingClient {
    pub fn inner(&self) -> &InMemoryClient {
        &self.inner
    }

    pub fn push_batch_fault(&self, fault: BatchFault) {
        self.batch_faults.lock().unwrap().push_back(fault);
    }

    /// Fails the next single-item call or query with `error`.
    pub fn push_call_fault(&self, error: ClientError) {
        self.call_faults.lock().unwrap().push_back(error);
    }

    /// Reports the last `n` keys of the next batch get as unprocessed.
    pub fn push_batch_get_unprocessed(&self, n: usize) {
        self.batch_get_unprocessed.lock().unwrap().push_back(n);
    }

    pub fn batch_write_sizes(&self) -> Vec<usize> {
        self.batch_write_sizes.lock().unwrap().clone()
    }

    pub async fn stored(&self, table: &str) -> usize {
        self.inner.item_count(table).await.unwrap()
    }

    fn call_fault(&self, counter: &AtomicUsize) -> ClientResult<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let fault = self.call_faults.lock().unwrap().pop_front();
        match fault {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DynamoClient for RecordingClient {
    async fn get_item(&self, request: GetItemRequest) -> ClientResult<GetItemResponse> {
        self.call_fault(&self.get_calls)?;
        self.inner.get_item(request).await
    }

    async fn put_item(&self, request: PutItemRequest) -> ClientResult<()> {
        self.call_fault(&self.put_calls)?;
        self.inner.put_item(request).await
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> ClientResult<()> {
        self.call_fault(&self.delete_calls)?;
        self.inner.delete_item(request).await
    }

    async fn update_item(&self, request: UpdateItemRequest) -> ClientResult<()> {
        self.call_fault(&self.update_calls)?;
        self.inner.update_item(request).await
    }

    async fn query(&self, request: QueryRequest) -> ClientResult<QueryResponse> {
        self.call_fault(&self.query_calls)?;
        self.inner.query(request).await
    }

    async fn batch_get_item(&self, request: BatchGetRequest) -> ClientResult<BatchGetResponse> {
        self.batch_get_calls.fetch_add(1, Ordering::SeqCst);
        let unprocessed = self.batch_get_unprocessed.lock().unwrap().pop_front();
        let Some(n) = unprocessed else {
            return self.inner.batch_get_item(request).await;
        };

        let mut keys = request.keys;
        let held_back = keys.split_off(keys.len().saturating_sub(n));
        let mut response = if keys.is_empty() {
            BatchGetResponse::default()
        } else {
            self.inner
                .batch_get_item(BatchGetRequest {
                    table_name: request.table_name,
                    keys,
                })
                .await?
        };
        response.unprocessed_keys.extend(held_back);
        Ok(response)
    }

    async fn batch_write_item(
        &self,
        request: BatchWriteRequest,
    ) -> ClientResult<BatchWriteResponse> {
        self.batch_write_calls.fetch_add(1, Ordering::SeqCst);
        self.batch_write_sizes
            .lock()
            .unwrap()
            .push(request.requests.len());
        let fault = self.batch_faults.lock().unwrap().pop_front();

        match fault {
            None | Some(BatchFault::None) => self.inner.batch_write_item(request).await,
            Some(BatchFault::Unprocessed(n)) => {
                let mut requests = request.requests;
                let held_back = requests.split_off(requests.len().saturating_sub(n));
                let mut response = if requests.is_empty() {
                    BatchWriteResponse::default()
                } else {
                    self.inner
                        .batch_write_item(BatchWriteRequest {
                            table_name: request.table_name,
                            requests,
                        })
                        .await?
                };
                response.unprocessed.extend(held_back);
                Ok(response)
            }
            Some(BatchFault::Error(error)) => Err(error),
            Some(BatchFault::Hang(cancel)) => {
                let _ = cancel.send(true);
                std::future::pending().await
            }
        }
    }
}

/// Registers `metadata` with a fresh recording client and returns a handle
/// that retries without sleeping.
pub async fn setup(metadata: TableMetadata) -> (Arc<RecordingClient>, TableHandle) {
    let client = Arc::new(RecordingClient::default());
    client.inner().create_table(&metadata).await.unwrap();

    let shared: SharedClient = client.clone();
    let table =
        TableHandle::new(shared, Arc::new(metadata)).with_retry_policy(RetryPolicy::immediate(3));
    (client, table)
}
