use thiserror::Error;

use crate::value::ScalarType;

use super::AttributeType;

/// Errors raised while declaring a schema or binding an accessor to it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Table name must not be empty")]
    EmptyTableName,
    #[error("Attribute declared twice: {0}")]
    DuplicateAttribute(String),
    #[error("Index declared twice: {0}")]
    DuplicateIndex(String),
    #[error("Table {0} declares no primary key")]
    MissingPrimaryKey(String),
    #[error("Table {0} declares more than one primary key")]
    MultiplePrimaryKeys(String),
    #[error("Key references undeclared property: {0}")]
    UndeclaredKeyAttribute(String),
    #[error("Key attribute {attribute} has non-scalar type {attribute_type:?}")]
    NonScalarKey {
        attribute: String,
        attribute_type: AttributeType,
    },
    #[error("Key attribute {attribute} is declared as {declared:?} but accessed as {requested}")]
    KeyTypeMismatch {
        attribute: String,
        declared: AttributeType,
        requested: ScalarType,
    },
    #[error("Expected a {expected} key but the schema declares a {actual} key")]
    KeyShapeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Table {table} has no index named {index}")]
    UnknownIndex { table: String, index: String },
}
