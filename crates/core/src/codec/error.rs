use thiserror::Error;

/// Errors converting between domain entities and attribute maps.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Entity must serialize to an object, got {0}")]
    NotAnObject(&'static str),
    #[error("Missing key attribute: {0}")]
    MissingKeyAttribute(String),
    #[error("Invalid number in attribute {attribute}: {value}")]
    InvalidNumber { attribute: String, value: String },
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}
