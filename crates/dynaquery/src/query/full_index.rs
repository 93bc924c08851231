use std::marker::PhantomData;

use dynaquery_core::codec::Entity;
use dynaquery_core::schema::IndexMetadata;
use dynaquery_core::value::KeyValue;
use dynaquery_core::Result;

use super::{QueryOptions, QueryResult};
use crate::table::TableHandle;

/// Read-only accessor for a secondary index keyed by hash `H` and range `R`.
pub struct FullIndex<T, H, R> {
    table: TableHandle,
    index: IndexMetadata,
    _marker: PhantomData<fn() -> (T, H, R)>,
}

impl<T, H, R> Clone for FullIndex<T, H, R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            index: self.index.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity, H: KeyValue, R: KeyValue> FullIndex<T, H, R> {
    pub fn new(table: TableHandle, name: &str) -> Result<Self> {
        let index = table.metadata().index(name)?.clone();
        index
            .key
            .check_types(H::SCALAR_TYPE, Some(R::SCALAR_TYPE))?;
        Ok(Self {
            table,
            index,
            _marker: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.index.name
    }

    /// Items sharing `hash`, optionally narrowed by a range predicate.
    ///
    /// Ascending by range key unless `options.order` says otherwise.
    pub async fn query(&self, hash: H, options: QueryOptions<R>) -> Result<QueryResult<T>> {
        self.table
            .query(
                Some(&self.index),
                hash.to_attribute_value(),
                options.into_values(),
            )
            .await
    }
}
