//! Table schema metadata.
//!
//! Replaces annotation-driven declaration with an explicit builder. The
//! resulting [`TableMetadata`] is immutable and meant to be shared behind an
//! `Arc` by every accessor bound to the table.

mod builder;
mod definition;
mod error;
mod types;

pub use builder::TableMetadataBuilder;
pub use definition::{AttributeDefinition, IndexDefinition, KeyDefinition, TableDefinition};
pub use error::SchemaError;
pub use types::{Attribute, AttributeType, IndexKind, IndexMetadata, KeySchema, TableMetadata};
