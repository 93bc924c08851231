use std::marker::PhantomData;

use dynaquery_core::client::WriteRequest;
use dynaquery_core::codec::{self, Entity};
use dynaquery_core::Result;

use crate::batch_write::{BatchWriteExecutor, BatchWriteSummary};
use crate::table::TableHandle;

/// Writes entities of type `T` regardless of the table's key shape.
pub struct Writer<T> {
    table: TableHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Writer<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> Writer<T> {
    pub fn new(table: TableHandle) -> Self {
        Self {
            table,
            _marker: PhantomData,
        }
    }

    /// Unconditional upsert.
    pub async fn put(&self, entity: &T) -> Result<()> {
        self.table.put(entity).await
    }

    /// Deletes the item stored under the entity's key.
    pub async fn delete(&self, entity: &T) -> Result<()> {
        let item = codec::serialize(self.table.metadata(), entity)?;
        let key = codec::extract_key(&self.table.metadata().primary_key, &item)?;
        self.table.delete(key).await
    }

    /// Writes any number of entities through the batch executor.
    pub async fn batch_put(&self, entities: &[T]) -> Result<BatchWriteSummary> {
        let requests = entities
            .iter()
            .map(|entity| codec::serialize(self.table.metadata(), entity).map(WriteRequest::Put))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        BatchWriteExecutor::new(self.table.clone())
            .write_all(requests)
            .await
    }
}
