use std::marker::PhantomData;

use async_trait::async_trait;

use dynaquery_core::codec::Entity;
use dynaquery_core::expression::ChangeSet;
use dynaquery_core::value::{Key, KeyValue};
use dynaquery_core::Result;

use super::PrimaryKey;
use crate::batch_write::BatchWriteSummary;
use crate::table::TableHandle;

/// Accessor for a table whose primary key is a hash key of type `H`.
pub struct HashPrimaryKey<T, H> {
    table: TableHandle,
    _marker: PhantomData<fn() -> (T, H)>,
}

impl<T, H> Clone for HashPrimaryKey<T, H> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity, H: KeyValue> HashPrimaryKey<T, H> {
    /// Fails if the table's primary key is not a hash key of type `H`.
    pub fn new(table: TableHandle) -> Result<Self> {
        table.metadata().primary_key.check_types(H::SCALAR_TYPE, None)?;
        Ok(Self {
            table,
            _marker: PhantomData,
        })
    }

    pub fn table(&self) -> &TableHandle {
        &self.table
    }

    fn key(&self, hash: &H) -> Key {
        let attribute = self.table.metadata().primary_key.hash();
        Key::from([(attribute.name.clone(), hash.to_attribute_value())])
    }

    /// Returns `None` when no item has this key.
    pub async fn get(&self, hash: H) -> Result<Option<T>> {
        self.table.get(self.key(&hash)).await
    }

    /// Overwrites the item with the entity's key.
    pub async fn put(&self, entity: &T) -> Result<()> {
        self.table.put(entity).await
    }

    /// Deleting a missing item is not an error.
    pub async fn delete(&self, hash: H) -> Result<()> {
        self.table.delete(self.key(&hash)).await
    }

    /// Applies `changes`, creating the item if it does not exist.
    ///
    /// Properties the table does not declare are ignored.
    pub async fn update(&self, hash: H, changes: ChangeSet) -> Result<()> {
        self.table.update(self.key(&hash), &changes).await
    }

    /// Fetches up to 100 items. Keys without an item are left out.
    pub async fn batch_get(&self, hashes: Vec<H>) -> Result<Vec<T>> {
        let keys = hashes.iter().map(|h| self.key(h)).collect();
        self.table.batch_get(keys).await
    }

    /// Deletes any number of items.
    pub async fn batch_delete(&self, hashes: Vec<H>) -> Result<BatchWriteSummary> {
        let keys = hashes.iter().map(|h| self.key(h)).collect();
        self.table.batch_delete(keys).await
    }
}

#[async_trait]
impl<T: Entity, H: KeyValue + 'static> PrimaryKey<T> for HashPrimaryKey<T, H> {
    type Key = H;

    async fn get(&self, key: H) -> Result<Option<T>> {
        HashPrimaryKey::get(self, key).await
    }

    async fn put(&self, entity: &T) -> Result<()> {
        HashPrimaryKey::put(self, entity).await
    }

    async fn delete(&self, key: H) -> Result<()> {
        HashPrimaryKey::delete(self, key).await
    }

    async fn update(&self, key: H, changes: ChangeSet) -> Result<()> {
        HashPrimaryKey::update(self, key, changes).await
    }

    async fn batch_get(&self, keys: Vec<H>) -> Result<Vec<T>> {
        HashPrimaryKey::batch_get(self, keys).await
    }

    async fn batch_delete(&self, keys: Vec<H>) -> Result<BatchWriteSummary> {
        HashPrimaryKey::batch_delete(self, keys).await
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use std::sync::atomic::Ordering;

    use dynaquery_core::batch::MAX_BATCH_WRITE_SIZE;
    use dynaquery_core::client::ClientError;
    use dynaquery_core::codec::CodecError;
    use dynaquery_core::expression::UpdateAction;
    use dynaquery_core::schema::SchemaError;
    use dynaquery_core::Error;

    use super::*;
    use crate::test_support::{card, card_table, setup, Card};

    async fn cards() -> (
        std::sync::Arc<crate::test_support::RecordingClient>,
        HashPrimaryKey<Card, i64>,
    ) {
        let (client, table) = setup(card_table()).await;
        (client, HashPrimaryKey::new(table).unwrap())
    }

    #[tokio::test]
    async fn test_rejects_mismatched_key_type() {
        let (_, table) = setup(card_table()).await;
        let result = HashPrimaryKey::<Card, String>::new(table);
        assert!(matches!(
            result,
            Err(Error::Schema(SchemaError::KeyTypeMismatch { .. }))
        ));
    }

    #[tokio::test]
    async fn test_get_missing_item_makes_one_call() {
        let (client, accessor) = cards().await;

        assert_eq!(accessor.get(100).await.unwrap(), None);
        assert_eq!(client.get_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let (client, accessor) = cards().await;
        let mut entity = card(100, "100");
        entity.created_at = Some(1_700_000_000);

        accessor.put(&entity).await.unwrap();
        assert_eq!(accessor.get(100).await.unwrap(), Some(entity));

        accessor.delete(100).await.unwrap();
        assert_eq!(accessor.get(100).await.unwrap(), None);

        // Idempotent.
        accessor.delete(100).await.unwrap();
        assert_eq!(client.delete_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (_, accessor) = cards().await;
        let mut entity = card(1, "first");
        entity.views = Some(3);
        accessor.put(&entity).await.unwrap();

        accessor.put(&card(1, "second")).await.unwrap();

        assert_eq!(accessor.get(1).await.unwrap(), Some(card(1, "second")));
    }

    #[tokio::test]
    async fn test_update_replaces_title() {
        let (_, accessor) = cards().await;
        accessor.put(&card(100, "100")).await.unwrap();

        accessor
            .update(100, ChangeSet::new().put("title", "200"))
            .await
            .unwrap();

        assert_eq!(accessor.get(100).await.unwrap(), Some(card(100, "200")));
    }

    #[tokio::test]
    async fn test_update_add_and_delete_attribute() {
        let (_, accessor) = cards().await;
        let mut entity = card(7, "counter");
        entity.created_at = Some(10);
        accessor.put(&entity).await.unwrap();

        accessor
            .update(
                7,
                ChangeSet::new()
                    .add("views", 5_i64)
                    .with("created_at", UpdateAction::DeleteAttribute),
            )
            .await
            .unwrap();
        accessor
            .update(7, ChangeSet::new().add("views", 2_i64))
            .await
            .unwrap();

        let stored = accessor.get(7).await.unwrap().unwrap();
        assert_eq!(stored.views, Some(7));
        assert_eq!(stored.created_at, None);
    }

    #[tokio::test]
    async fn test_update_drops_undeclared_properties() {
        let (client, accessor) = cards().await;
        accessor.put(&card(1, "one")).await.unwrap();

        accessor
            .update(1, ChangeSet::new().put("color", "red").put("title", "uno"))
            .await
            .unwrap();
        assert_eq!(accessor.get(1).await.unwrap(), Some(card(1, "uno")));

        // Nothing left after dropping: no backend call at all.
        accessor
            .update(1, ChangeSet::new().put("color", "blue"))
            .await
            .unwrap();
        assert_eq!(client.update_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_batch_get_omits_missing_keys() {
        let (_, accessor) = cards().await;
        for id in [1, 2, 3] {
            accessor.put(&card(id, &id.to_string())).await.unwrap();
        }

        let mut found = accessor.batch_get(vec![1, 3, 42]).await.unwrap();
        found.sort_by_key(|c| c.id);

        assert_eq!(found, vec![card(1, "1"), card(3, "3")]);
    }

    #[tokio::test]
    async fn test_batch_get_over_limit_fails_fast() {
        let (client, accessor) = cards().await;

        let result = accessor.batch_get((0..101).collect()).await;

        assert_eq!(
            result.unwrap_err(),
            Error::BatchSizeExceeded {
                limit: 100,
                actual: 101
            }
        );
        assert_eq!(client.batch_get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batch_get_retries_unprocessed_keys() {
        let (client, accessor) = cards().await;
        for id in 0..10 {
            accessor.put(&card(id, "x")).await.unwrap();
        }
        client.push_batch_get_unprocessed(4);

        let found = accessor.batch_get((0..10).collect()).await.unwrap();

        assert_eq!(found.len(), 10);
        assert_eq!(client.batch_get_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_batch_get_gives_up_on_unprocessed_keys() {
        let (client, accessor) = cards().await;
        for _ in 0..4 {
            client.push_batch_get_unprocessed(1);
        }

        let result = accessor.batch_get(vec![1, 2]).await;

        assert!(matches!(
            result,
            Err(Error::BackendUnavailable {
                operation: "BatchGetItem",
                ..
            })
        ));
        assert_eq!(client.batch_get_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_batch_delete_beyond_batch_limit() {
        let (client, accessor) = cards().await;
        let ids: Vec<i64> = (0..=MAX_BATCH_WRITE_SIZE as i64).collect();
        for id in &ids {
            accessor.put(&card(*id, "x")).await.unwrap();
        }

        let summary = accessor.batch_delete(ids).await.unwrap();

        assert_eq!(summary.items, 26);
        assert_eq!(summary.chunks, 2);
        assert_eq!(client.stored("prod-Card").await, 0);
    }

    #[tokio::test]
    async fn test_non_finite_key_fails_before_any_call() {
        let (client, table) = setup(card_table()).await;
        let accessor = HashPrimaryKey::<Card, f64>::new(table).unwrap();

        let result = accessor.get(f64::NAN).await;
        assert!(matches!(
            result,
            Err(Error::Codec(CodecError::InvalidNumber { .. }))
        ));
        assert!(accessor.delete(f64::INFINITY).await.is_err());
        assert_eq!(client.get_calls.load(Ordering::SeqCst), 0);
        assert_eq!(client.delete_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_large_ids_do_not_overwrite_each_other() {
        let (client, accessor) = cards().await;
        let id = 9_007_199_254_740_992_i64;
        accessor.put(&card(id, "a")).await.unwrap();
        accessor.put(&card(id + 1, "b")).await.unwrap();

        assert_eq!(client.stored("prod-Card").await, 2);
        assert_eq!(accessor.get(id).await.unwrap(), Some(card(id, "a")));
        assert_eq!(accessor.get(id + 1).await.unwrap(), Some(card(id + 1, "b")));
    }

    #[tokio::test]
    async fn test_transient_get_failure_is_retried() {
        let (client, accessor) = cards().await;
        accessor.put(&card(5, "five")).await.unwrap();
        client.push_call_fault(ClientError::Throttled("slow".into()));

        assert_eq!(accessor.get(5).await.unwrap(), Some(card(5, "five")));
        assert_eq!(client.get_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_table_is_a_backend_error() {
        let (client, accessor) = cards().await;
        client.inner().drop_table("prod-Card").await.unwrap();

        let result = accessor.get(1).await;

        assert!(matches!(
            result,
            Err(Error::Backend {
                operation: "GetItem",
                source: ClientError::ResourceNotFound(_)
            })
        ));
    }

    #[tokio::test]
    async fn test_usable_through_the_trait() {
        let (_, accessor) = cards().await;
        let accessor: &dyn PrimaryKey<Card, Key = i64> = &accessor;

        accessor.put(&card(9, "nine")).await.unwrap();
        assert_eq!(accessor.get(9).await.unwrap(), Some(card(9, "nine")));
        accessor.delete(9).await.unwrap();
        assert_eq!(accessor.get(9).await.unwrap(), None);
    }
}
