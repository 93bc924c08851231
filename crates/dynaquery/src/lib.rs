//! Typed query and batch-write layer for DynamoDB tables.
//!
//! The imperative shell around `dynaquery_core`: accessors that turn typed
//! lookups into aliased key-condition queries, a batch-write executor that
//! chunks and retries, and the backends that talk to the store.
//!
//! ```ignore
//! let client: SharedClient = Arc::new(InMemoryClient::new());
//! let db = Database::with_config(client, &Config::from_env())
//!     .register::<Card>(card_table);
//!
//! let cards = db.hash_primary_key::<Card, i64>()?;
//! cards.update(100, ChangeSet::new().put("title", "200")).await?;
//!
//! let by_title = db.hash_index::<Card, String>("title-index")?;
//! let page = by_title.query("200".into(), Some(10)).await?;
//! ```

pub mod backend;
mod batch_write;
mod config;
mod database;
mod query;
mod retry;
mod table;

#[cfg(all(test, feature = "inmemory"))]
mod test_support;

pub use batch_write::{BatchWriteExecutor, BatchWriteSummary};
pub use config::Config;
pub use database::Database;
pub use query::{
    Cursor, FullIndex, FullPrimaryKey, HashIndex, HashPrimaryKey, PrimaryKey, QueryOptions,
    QueryResult, RangeOrder, Writer,
};
pub use table::{SharedClient, TableHandle};

pub use dynaquery_core::batch::RetryPolicy;
pub use dynaquery_core::client::{DynamoClient, WriteRequest};
pub use dynaquery_core::codec::Entity;
pub use dynaquery_core::expression::{ChangeSet, RangePredicate, UpdateAction};
pub use dynaquery_core::schema::{AttributeType, TableDefinition, TableMetadata};
pub use dynaquery_core::value::{AttributeValue, KeyValue};
pub use dynaquery_core::{Error, Result};
