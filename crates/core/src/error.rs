use thiserror::Error;

use crate::client::{ClientError, WriteRequest};
use crate::codec::CodecError;
use crate::schema::SchemaError;

/// Errors surfaced by the query layer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Malformed or mistyped range predicate, detected before any call.
    #[error("Invalid predicate: {0}")]
    InvalidPredicate(String),

    /// Input exceeds a hard per-call limit with no chunking path.
    #[error("Batch of {actual} items exceeds the per-call limit of {limit}")]
    BatchSizeExceeded { limit: usize, actual: usize },

    /// Retry budget exhausted with items still unprocessed.
    #[error("Batch write incomplete: {} items remain unprocessed", .unprocessed.len())]
    BatchIncomplete { unprocessed: Vec<WriteRequest> },

    /// Non-retryable rejection of a batch. `unprocessed` holds every item not
    /// confirmed as written, the rejected ones included.
    #[error("Batch request rejected: {message}")]
    BatchRequestInvalid {
        message: String,
        unprocessed: Vec<WriteRequest>,
    },

    /// A batch write stopped because the caller cancelled it.
    #[error(
        "Batch write cancelled: {} committed, {} in unknown state, {} not submitted",
        .committed.len(),
        .unknown.len(),
        .not_submitted.len()
    )]
    BatchCancelled {
        committed: Vec<WriteRequest>,
        unknown: Vec<WriteRequest>,
        not_submitted: Vec<WriteRequest>,
    },

    /// Transient failure that outlived the retry budget.
    #[error("Backend unavailable during {operation}: {message}")]
    BackendUnavailable {
        operation: &'static str,
        message: String,
    },

    /// Non-transient backend failure, passed through.
    #[error("{operation} failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: ClientError,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("No table registered for entity type {0}")]
    EntityNotRegistered(&'static str),
}

/// Result type for query layer operations.
pub type Result<T> = std::result::Result<T, Error>;
