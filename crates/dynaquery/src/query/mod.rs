//! Typed accessors over a table's primary key and secondary indexes.
//!
//! Every accessor is an independent value holding a [`TableHandle`] and the
//! key types it was checked against when constructed:
//!
//! - [`HashPrimaryKey`] / [`FullPrimaryKey`]: single-item reads and writes,
//!   batch get and batch delete. Both implement [`PrimaryKey`].
//! - [`HashIndex`] / [`FullIndex`]: read-only queries over a named index.
//! - [`Writer`]: writes without caring about the key shape.
//!
//! [`TableHandle`]: crate::TableHandle

mod full_index;
mod full_primary_key;
mod hash_index;
mod hash_primary_key;
mod writer;

use async_trait::async_trait;

use dynaquery_core::client::ConsumedCapacity;
use dynaquery_core::codec::Entity;
use dynaquery_core::expression::{ChangeSet, RangePredicate};
use dynaquery_core::value::{AttributeValue, Key, KeyValue};
use dynaquery_core::Result;

use crate::batch_write::BatchWriteSummary;

pub use full_index::FullIndex;
pub use full_primary_key::FullPrimaryKey;
pub use hash_index::HashIndex;
pub use hash_primary_key::HashPrimaryKey;
pub use writer::Writer;

/// Direction in which range keys are returned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RangeOrder {
    #[default]
    Asc,
    Desc,
}

impl RangeOrder {
    pub(crate) fn scan_index_forward(self) -> bool {
        matches!(self, Self::Asc)
    }
}

/// Opaque continuation token returned by a paginated query.
///
/// Pass it back through [`QueryOptions::cursor`] to resume after the last
/// returned item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(Key);

impl Cursor {
    pub(crate) fn new(key: Key) -> Self {
        Self(key)
    }

    pub(crate) fn into_key(self) -> Key {
        self.0
    }
}

/// Options for a hash+range query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions<R> {
    pub range: Option<RangePredicate<R>>,
    pub order: RangeOrder,
    /// Page size hint. The backend may return fewer items.
    pub limit: Option<u32>,
    pub cursor: Option<Cursor>,
}

impl<R> Default for QueryOptions<R> {
    fn default() -> Self {
        Self {
            range: None,
            order: RangeOrder::Asc,
            limit: None,
            cursor: None,
        }
    }
}

impl<R> QueryOptions<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn range(mut self, predicate: RangePredicate<R>) -> Self {
        self.range = Some(predicate);
        self
    }

    pub fn order(mut self, order: RangeOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

impl<R: KeyValue> QueryOptions<R> {
    pub(crate) fn into_values(self) -> QueryOptions<AttributeValue> {
        QueryOptions {
            range: self.range.map(|p| p.to_attribute_values()),
            order: self.order,
            limit: self.limit,
            cursor: self.cursor,
        }
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult<T> {
    /// Records in the order the store returned them.
    pub records: Vec<T>,
    pub count: usize,
    /// Items examined before filtering, as reported by the backend.
    pub scanned_count: usize,
    /// Present iff more matching items remain.
    pub cursor: Option<Cursor>,
    pub consumed_capacity: Option<ConsumedCapacity>,
}

impl<T> QueryResult<T> {
    pub fn has_more(&self) -> bool {
        self.cursor.is_some()
    }
}

/// Operations shared by the hash-only and hash+range primary key accessors.
#[async_trait]
pub trait PrimaryKey<T: Entity>: Send + Sync {
    /// `H` for hash-only keys, `(H, R)` for hash+range keys.
    type Key: Send + Sync + 'static;

    async fn get(&self, key: Self::Key) -> Result<Option<T>>;

    async fn put(&self, entity: &T) -> Result<()>;

    async fn delete(&self, key: Self::Key) -> Result<()>;

    async fn update(&self, key: Self::Key, changes: ChangeSet) -> Result<()>;

    async fn batch_get(&self, keys: Vec<Self::Key>) -> Result<Vec<T>>;

    async fn batch_delete(&self, keys: Vec<Self::Key>) -> Result<BatchWriteSummary>;
}
