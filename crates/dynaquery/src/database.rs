//! Entity-keyed accessor factory.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use dynaquery_core::batch::RetryPolicy;
use dynaquery_core::codec::Entity;
use dynaquery_core::schema::TableMetadata;
use dynaquery_core::value::KeyValue;
use dynaquery_core::{Error, Result};

use crate::batch_write::BatchWriteExecutor;
use crate::config::Config;
use crate::query::{FullIndex, FullPrimaryKey, HashIndex, HashPrimaryKey, Writer};
use crate::table::{SharedClient, TableHandle};

/// Maps entity types to their tables and hands out accessors for them.
///
/// Built once at startup. Accessors it returns share the client and the
/// table metadata.
pub struct Database {
    client: SharedClient,
    retry: RetryPolicy,
    concurrency: usize,
    tables: HashMap<TypeId, Arc<TableMetadata>>,
}

impl Database {
    pub fn new(client: SharedClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            concurrency: 1,
            tables: HashMap::new(),
        }
    }

    /// Uses the retry policy and batch concurrency from `config`.
    pub fn with_config(client: SharedClient, config: &Config) -> Self {
        Self {
            retry: config.retry_policy(),
            concurrency: config.batch_concurrency.max(1),
            ..Self::new(client)
        }
    }

    /// Binds entity type `T` to `metadata`, replacing any earlier binding.
    pub fn register<T: Entity>(mut self, metadata: TableMetadata) -> Self {
        tracing::debug!(entity = type_name::<T>(), table = %metadata.name, "Registered entity");
        self.tables.insert(TypeId::of::<T>(), Arc::new(metadata));
        self
    }

    pub fn client(&self) -> &SharedClient {
        &self.client
    }

    pub fn metadata<T: Entity>(&self) -> Result<&TableMetadata> {
        self.tables
            .get(&TypeId::of::<T>())
            .map(Arc::as_ref)
            .ok_or(Error::EntityNotRegistered(type_name::<T>()))
    }

    /// The table bound to `T`, with this database's retry settings.
    pub fn table<T: Entity>(&self) -> Result<TableHandle> {
        let metadata = self
            .tables
            .get(&TypeId::of::<T>())
            .ok_or(Error::EntityNotRegistered(type_name::<T>()))?;

        Ok(TableHandle::new(self.client.clone(), metadata.clone())
            .with_retry_policy(self.retry)
            .with_batch_concurrency(self.concurrency))
    }

    pub fn hash_primary_key<T: Entity, H: KeyValue>(&self) -> Result<HashPrimaryKey<T, H>> {
        HashPrimaryKey::new(self.table::<T>()?)
    }

    pub fn full_primary_key<T: Entity, H: KeyValue, R: KeyValue>(
        &self,
    ) -> Result<FullPrimaryKey<T, H, R>> {
        FullPrimaryKey::new(self.table::<T>()?)
    }

    pub fn hash_index<T: Entity, H: KeyValue>(&self, name: &str) -> Result<HashIndex<T, H>> {
        HashIndex::new(self.table::<T>()?, name)
    }

    pub fn full_index<T: Entity, H: KeyValue, R: KeyValue>(
        &self,
        name: &str,
    ) -> Result<FullIndex<T, H, R>> {
        FullIndex::new(self.table::<T>()?, name)
    }

    pub fn writer<T: Entity>(&self) -> Result<Writer<T>> {
        Ok(Writer::new(self.table::<T>()?))
    }

    pub fn batch_writer<T: Entity>(&self) -> Result<BatchWriteExecutor> {
        Ok(BatchWriteExecutor::new(self.table::<T>()?))
    }
}
