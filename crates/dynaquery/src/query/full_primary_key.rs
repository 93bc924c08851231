use std::marker::PhantomData;

use async_trait::async_trait;

use dynaquery_core::codec::Entity;
use dynaquery_core::expression::ChangeSet;
use dynaquery_core::value::{Key, KeyValue};
use dynaquery_core::Result;

use super::{PrimaryKey, QueryOptions, QueryResult};
use crate::batch_write::BatchWriteSummary;
use crate::table::TableHandle;

/// Accessor for a table keyed by hash `H` and range `R`.
///
/// Every single-item operation takes both key parts.
pub struct FullPrimaryKey<T, H, R> {
    table: TableHandle,
    _marker: PhantomData<fn() -> (T, H, R)>,
}

impl<T, H, R> Clone for FullPrimaryKey<T, H, R> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity, H: KeyValue, R: KeyValue> FullPrimaryKey<T, H, R> {
    /// Fails unless the table's primary key is hash `H` plus range `R`.
    pub fn new(table: TableHandle) -> Result<Self> {
        table
            .metadata()
            .primary_key
            .check_types(H::SCALAR_TYPE, Some(R::SCALAR_TYPE))?;
        Ok(Self {
            table,
            _marker: PhantomData,
        })
    }

    pub fn table(&self) -> &TableHandle {
        &self.table
    }

    fn key(&self, hash: &H, range: &R) -> Key {
        let key = &self.table.metadata().primary_key;
        let mut parts = Key::from([(key.hash().name.clone(), hash.to_attribute_value())]);
        if let Some(attribute) = key.range() {
            parts.insert(attribute.name.clone(), range.to_attribute_value());
        }
        parts
    }

    pub async fn get(&self, hash: H, range: R) -> Result<Option<T>> {
        self.table.get(self.key(&hash, &range)).await
    }

    pub async fn put(&self, entity: &T) -> Result<()> {
        self.table.put(entity).await
    }

    pub async fn delete(&self, hash: H, range: R) -> Result<()> {
        self.table.delete(self.key(&hash, &range)).await
    }

    pub async fn update(&self, hash: H, range: R, changes: ChangeSet) -> Result<()> {
        self.table.update(self.key(&hash, &range), &changes).await
    }

    pub async fn batch_get(&self, keys: Vec<(H, R)>) -> Result<Vec<T>> {
        let keys = keys.iter().map(|(h, r)| self.key(h, r)).collect();
        self.table.batch_get(keys).await
    }

    pub async fn batch_delete(&self, keys: Vec<(H, R)>) -> Result<BatchWriteSummary> {
        let keys = keys.iter().map(|(h, r)| self.key(h, r)).collect();
        self.table.batch_delete(keys).await
    }

    /// Queries one partition of the base table.
    pub async fn query(&self, hash: H, options: QueryOptions<R>) -> Result<QueryResult<T>> {
        self.table
            .query(None, hash.to_attribute_value(), options.into_values())
            .await
    }
}

#[async_trait]
impl<T, H, R> PrimaryKey<T> for FullPrimaryKey<T, H, R>
where
    T: Entity,
    H: KeyValue + 'static,
    R: KeyValue + 'static,
{
    type Key = (H, R);

    async fn get(&self, key: (H, R)) -> Result<Option<T>> {
        let (hash, range) = key;
        FullPrimaryKey::get(self, hash, range).await
    }

    async fn put(&self, entity: &T) -> Result<()> {
        FullPrimaryKey::put(self, entity).await
    }

    async fn delete(&self, key: (H, R)) -> Result<()> {
        let (hash, range) = key;
        FullPrimaryKey::delete(self, hash, range).await
    }

    async fn update(&self, key: (H, R), changes: ChangeSet) -> Result<()> {
        let (hash, range) = key;
        FullPrimaryKey::update(self, hash, range, changes).await
    }

    async fn batch_get(&self, keys: Vec<(H, R)>) -> Result<Vec<T>> {
        FullPrimaryKey::batch_get(self, keys).await
    }

    async fn batch_delete(&self, keys: Vec<(H, R)>) -> Result<BatchWriteSummary> {
        FullPrimaryKey::batch_delete(self, keys).await
    }
}
