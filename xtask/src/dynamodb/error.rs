//! Error types for table provisioning.

use std::path::PathBuf;

use dynaquery_core::client::ClientError;
use dynaquery_core::schema::SchemaError;
use thiserror::Error;

/// Result type alias for dynamodb module.
pub type Result<T> = std::result::Result<T, DynamodbError>;

/// Errors that can occur while provisioning a table.
#[derive(Error, Debug)]
pub enum DynamodbError {
    #[error("DynamoDB error: {0}")]
    Client(#[from] ClientError),

    #[error("Invalid schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("Cannot parse schema file {}: {source}", .path.display())]
    SchemaFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
