//! DynamoDB backend.
//!
//! Implements [`DynamoClient`](dynaquery_core::client::DynamoClient) using
//! `aws-sdk-dynamodb`, plus the table lifecycle calls used to provision
//! tables from `TableMetadata`.

mod client;
mod conversions;
mod error;
mod table_operations;

pub use client::DynamoDbClient;
pub use table_operations::{IndexState, IndexStatus, TableState, TableStatus};
