//! Table lifecycle driven by `TableMetadata`.

use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, CreateGlobalSecondaryIndexAction, GlobalSecondaryIndex,
    GlobalSecondaryIndexUpdate, IndexStatus as SdkIndexStatus, KeySchemaElement, KeyType,
    LocalSecondaryIndex, Projection, ProjectionType, ScalarAttributeType,
    TableStatus as SdkTableStatus,
};

use dynaquery_core::client::{ClientError, ClientResult};
use dynaquery_core::schema::{Attribute, IndexKind, IndexMetadata, KeySchema, TableMetadata};
use dynaquery_core::value::ScalarType;

use super::error::map_sdk_error;
use super::DynamoDbClient;

const ACTIVATION_POLL_ATTEMPTS: usize = 60;
const ACTIVATION_POLL_DELAY: Duration = Duration::from_secs(2);

/// Observed state of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub status: TableStatus,
    pub global_indexes: Vec<IndexState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexState {
    pub name: String,
    pub status: IndexStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStatus {
    Active,
    Creating,
    Updating,
    Deleting,
}

impl TableState {
    /// Active table with every global index active.
    pub fn is_ready(&self) -> bool {
        self.status == TableStatus::Active
            && self
                .global_indexes
                .iter()
                .all(|i| i.status == IndexStatus::Active)
    }
}

fn build_error(e: impl std::fmt::Display) -> ClientError {
    ClientError::Validation(e.to_string())
}

fn scalar_type(attribute: &Attribute) -> ClientResult<ScalarAttributeType> {
    match attribute.attribute_type.scalar() {
        Some(ScalarType::String) => Ok(ScalarAttributeType::S),
        Some(ScalarType::Number) => Ok(ScalarAttributeType::N),
        Some(ScalarType::Binary) => Ok(ScalarAttributeType::B),
        None => Err(ClientError::Validation(format!(
            "Key attribute {} is not a scalar",
            attribute.name
        ))),
    }
}

fn key_schema(key: &KeySchema) -> ClientResult<Vec<KeySchemaElement>> {
    let mut elements = vec![KeySchemaElement::builder()
        .attribute_name(&key.hash().name)
        .key_type(KeyType::Hash)
        .build()
        .map_err(build_error)?];

    if let Some(range) = key.range() {
        elements.push(
            KeySchemaElement::builder()
                .attribute_name(&range.name)
                .key_type(KeyType::Range)
                .build()
                .map_err(build_error)?,
        );
    }
    Ok(elements)
}

/// Attribute definitions for every key attribute, each declared once.
fn attribute_definitions<'a>(
    keys: impl IntoIterator<Item = &'a KeySchema>,
) -> ClientResult<Vec<AttributeDefinition>> {
    let mut definitions: Vec<AttributeDefinition> = Vec::new();
    for key in keys {
        for attribute in [Some(key.hash()), key.range()].into_iter().flatten() {
            if definitions
                .iter()
                .any(|d| d.attribute_name() == attribute.name)
            {
                continue;
            }
            definitions.push(
                AttributeDefinition::builder()
                    .attribute_name(&attribute.name)
                    .attribute_type(scalar_type(attribute)?)
                    .build()
                    .map_err(build_error)?,
            );
        }
    }
    Ok(definitions)
}

fn projection_all() -> Projection {
    Projection::builder()
        .projection_type(ProjectionType::All)
        .build()
}

impl DynamoDbClient {
    /// Creates a pay-per-request table with all declared indexes.
    pub async fn create_table(&self, metadata: &TableMetadata) -> ClientResult<()> {
        let keys = std::iter::once(&metadata.primary_key).chain(metadata.indexes.iter().map(|i| &i.key));

        let mut request = self
            .client
            .create_table()
            .table_name(&metadata.name)
            .set_key_schema(Some(key_schema(&metadata.primary_key)?))
            .set_attribute_definitions(Some(attribute_definitions(keys)?))
            .billing_mode(BillingMode::PayPerRequest);

        for index in &metadata.indexes {
            request = match index.kind {
                IndexKind::Global => request.global_secondary_indexes(
                    GlobalSecondaryIndex::builder()
                        .index_name(&index.name)
                        .set_key_schema(Some(key_schema(&index.key)?))
                        .projection(projection_all())
                        .build()
                        .map_err(build_error)?,
                ),
                IndexKind::Local => request.local_secondary_indexes(
                    LocalSecondaryIndex::builder()
                        .index_name(&index.name)
                        .set_key_schema(Some(key_schema(&index.key)?))
                        .projection(projection_all())
                        .build()
                        .map_err(build_error)?,
                ),
            };
        }

        request
            .send()
            .await
            .map_err(|e| map_sdk_error("CreateTable", e))?;

        tracing::info!(table = %metadata.name, indexes = metadata.indexes.len(), "Table created");
        Ok(())
    }

    /// Adds a global secondary index to an existing table.
    pub async fn add_global_index(&self, table_name: &str, index: &IndexMetadata) -> ClientResult<()> {
        if index.kind != IndexKind::Global {
            return Err(ClientError::Validation(format!(
                "Local index {} can only be created with the table",
                index.name
            )));
        }

        self.client
            .update_table()
            .table_name(table_name)
            .set_attribute_definitions(Some(attribute_definitions([&index.key])?))
            .global_secondary_index_updates(
                GlobalSecondaryIndexUpdate::builder()
                    .create(
                        CreateGlobalSecondaryIndexAction::builder()
                            .index_name(&index.name)
                            .set_key_schema(Some(key_schema(&index.key)?))
                            .projection(projection_all())
                            .build()
                            .map_err(build_error)?,
                    )
                    .build(),
            )
            .send()
            .await
            .map_err(|e| map_sdk_error("UpdateTable", e))?;

        tracing::info!(table = %table_name, index = %index.name, "Global index added");
        Ok(())
    }

    /// Deletes a table and all its data.
    pub async fn delete_table(&self, table_name: &str) -> ClientResult<()> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| map_sdk_error("DeleteTable", e))?;

        tracing::info!(table = %table_name, "Table deleted");
        Ok(())
    }

    /// Fetches the current table state; `None` if the table does not exist.
    pub async fn describe_table(&self, table_name: &str) -> ClientResult<Option<TableState>> {
        let response = match self.client.describe_table().table_name(table_name).send().await {
            Ok(response) => response,
            Err(err) => {
                return match map_sdk_error("DescribeTable", err) {
                    ClientError::ResourceNotFound(_) => Ok(None),
                    other => Err(other),
                }
            }
        };

        let Some(table) = response.table() else {
            return Ok(None);
        };

        let global_indexes = table
            .global_secondary_indexes()
            .iter()
            .map(|gsi| IndexState {
                name: gsi.index_name().unwrap_or_default().to_string(),
                status: match gsi.index_status() {
                    Some(SdkIndexStatus::Creating) => IndexStatus::Creating,
                    Some(SdkIndexStatus::Updating) => IndexStatus::Updating,
                    Some(SdkIndexStatus::Deleting) => IndexStatus::Deleting,
                    _ => IndexStatus::Active,
                },
            })
            .collect();

        let status = match table.table_status() {
            Some(SdkTableStatus::Creating) => TableStatus::Creating,
            Some(SdkTableStatus::Updating) => TableStatus::Updating,
            Some(SdkTableStatus::Deleting) => TableStatus::Deleting,
            _ => TableStatus::Active,
        };

        Ok(Some(TableState {
            status,
            global_indexes,
        }))
    }

    /// Polls until the table and its global indexes are active.
    pub async fn wait_for_active(&self, table_name: &str) -> ClientResult<()> {
        for attempt in 0..ACTIVATION_POLL_ATTEMPTS {
            if let Some(state) = self.describe_table(table_name).await? {
                if state.is_ready() {
                    return Ok(());
                }
            }
            tracing::debug!(table = %table_name, attempt, "Waiting for table to become active");
            tokio::time::sleep(ACTIVATION_POLL_DELAY).await;
        }

        Err(ClientError::Unavailable(format!(
            "Timeout waiting for table {table_name} to become active"
        )))
    }
}
