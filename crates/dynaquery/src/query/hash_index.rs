use std::marker::PhantomData;

use dynaquery_core::codec::Entity;
use dynaquery_core::schema::IndexMetadata;
use dynaquery_core::value::KeyValue;
use dynaquery_core::Result;

use super::{Cursor, QueryOptions, QueryResult};
use crate::table::TableHandle;

/// Read-only accessor for a secondary index keyed by hash `H` alone.
///
/// Items come back in whatever order the store keeps them.
pub struct HashIndex<T, H> {
    table: TableHandle,
    index: IndexMetadata,
    _marker: PhantomData<fn() -> (T, H)>,
}

impl<T, H> Clone for HashIndex<T, H> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            index: self.index.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity, H: KeyValue> HashIndex<T, H> {
    /// Fails if the table has no index `name` or it is not a hash index of
    /// type `H`.
    pub fn new(table: TableHandle, name: &str) -> Result<Self> {
        let index = table.metadata().index(name)?.clone();
        index.key.check_types(H::SCALAR_TYPE, None)?;
        Ok(Self {
            table,
            index,
            _marker: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.index.name
    }

    pub async fn query(&self, hash: H, limit: Option<u32>) -> Result<QueryResult<T>> {
        self.run(hash, limit, None).await
    }

    /// Resumes a query from the cursor of a previous page.
    pub async fn query_after(
        &self,
        hash: H,
        limit: Option<u32>,
        cursor: Cursor,
    ) -> Result<QueryResult<T>> {
        self.run(hash, limit, Some(cursor)).await
    }

    async fn run(&self, hash: H, limit: Option<u32>, cursor: Option<Cursor>) -> Result<QueryResult<T>> {
        let options = QueryOptions {
            limit,
            cursor,
            ..QueryOptions::default()
        };
        self.table
            .query(Some(&self.index), hash.to_attribute_value(), options)
            .await
    }
}
