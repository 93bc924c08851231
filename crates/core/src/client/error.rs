use thiserror::Error;

/// Failure reported by a backend client.
///
/// `Throttled` and `Unavailable` are transient: the same request may succeed
/// if sent again later.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("Throughput exceeded: {0}")]
    Throttled(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error("Backend error: {0}")]
    Other(String),
}

impl ClientError {
    /// Returns `true` when retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Throttled(_) | Self::Unavailable(_))
    }
}
