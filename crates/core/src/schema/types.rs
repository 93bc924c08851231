use serde::{Deserialize, Serialize};

use crate::value::ScalarType;

use super::{SchemaError, TableMetadataBuilder};

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Number,
    Binary,
    Boolean,
    List,
    Map,
    StringSet,
    NumberSet,
    BinarySet,
}

impl AttributeType {
    /// Returns the scalar type for `String`, `Number` and `Binary`.
    pub fn scalar(self) -> Option<ScalarType> {
        match self {
            Self::String => Some(ScalarType::String),
            Self::Number => Some(ScalarType::Number),
            Self::Binary => Some(ScalarType::Binary),
            _ => None,
        }
    }
}

/// A declared attribute: the store-native name and the domain property it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub property_name: String,
    pub attribute_type: AttributeType,
}

/// Which attribute(s) play the `hash` and `range` roles of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySchema {
    Hash { hash: Attribute },
    Full { hash: Attribute, range: Attribute },
}

impl KeySchema {
    /// The hash (partition) attribute.
    pub fn hash(&self) -> &Attribute {
        match self {
            Self::Hash { hash } | Self::Full { hash, .. } => hash,
        }
    }

    /// The range (sort) attribute, if any.
    pub fn range(&self) -> Option<&Attribute> {
        match self {
            Self::Hash { .. } => None,
            Self::Full { range, .. } => Some(range),
        }
    }

    /// Returns `true` for hash+range keys.
    pub fn is_full(&self) -> bool {
        matches!(self, Self::Full { .. })
    }

    /// Store-native names of the key attributes, hash first.
    pub fn attribute_names(&self) -> Vec<&str> {
        let mut names = vec![self.hash().name.as_str()];
        if let Some(range) = self.range() {
            names.push(range.name.as_str());
        }
        names
    }

    /// Checks that the key attribute types match the caller's key types.
    pub fn check_types(
        &self,
        hash: ScalarType,
        range: Option<ScalarType>,
    ) -> Result<(), SchemaError> {
        check_attribute_type(self.hash(), hash)?;
        match (self.range(), range) {
            (Some(attr), Some(expected)) => check_attribute_type(attr, expected),
            (None, None) => Ok(()),
            (Some(_), None) => Err(SchemaError::KeyShapeMismatch {
                expected: "hash",
                actual: "hash+range",
            }),
            (None, Some(_)) => Err(SchemaError::KeyShapeMismatch {
                expected: "hash+range",
                actual: "hash",
            }),
        }
    }
}

fn check_attribute_type(attribute: &Attribute, expected: ScalarType) -> Result<(), SchemaError> {
    match attribute.attribute_type.scalar() {
        Some(actual) if actual == expected => Ok(()),
        _ => Err(SchemaError::KeyTypeMismatch {
            attribute: attribute.name.clone(),
            declared: attribute.attribute_type,
            requested: expected,
        }),
    }
}

/// Kind of secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Global,
    Local,
}

/// A named secondary index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMetadata {
    pub name: String,
    pub kind: IndexKind,
    pub key: KeySchema,
}

/// Everything the query layer knows about a table.
///
/// Built once (see [`TableMetadata::builder`]) and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub primary_key: KeySchema,
    pub indexes: Vec<IndexMetadata>,
}

impl TableMetadata {
    /// Starts declaring a table.
    pub fn builder(name: impl Into<String>) -> TableMetadataBuilder {
        TableMetadataBuilder::new(name)
    }

    /// Looks up an attribute by its store-native name.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Looks up an attribute by its domain property name.
    pub fn attribute_by_property(&self, property_name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.property_name == property_name)
    }

    /// Looks up a secondary index by name.
    pub fn index(&self, name: &str) -> Result<&IndexMetadata, SchemaError> {
        self.indexes
            .iter()
            .find(|i| i.name == name)
            .ok_or_else(|| SchemaError::UnknownIndex {
                table: self.name.clone(),
                index: name.to_string(),
            })
    }

    /// Returns `true` if `name` is one of the primary key attributes.
    pub fn is_primary_key_attribute(&self, name: &str) -> bool {
        self.primary_key.attribute_names().contains(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> TableMetadata {
        TableMetadata::builder("prod-Card")
            .attribute("id", AttributeType::Number)
            .attribute("title", AttributeType::String)
            .attribute_as("createdAt", "created_at", AttributeType::Number)
            .full_primary_key("id", "title")
            .hash_global_index("title-index", "title")
            .build()
            .unwrap()
    }

    #[test]
    fn test_attribute_lookups() {
        let table = card();
        assert_eq!(table.attribute("createdAt").unwrap().property_name, "created_at");
        assert_eq!(table.attribute_by_property("created_at").unwrap().name, "createdAt");
        assert!(table.attribute_by_property("createdAt").is_none());
    }

    #[test]
    fn test_key_schema_accessors() {
        let table = card();
        assert!(table.primary_key.is_full());
        assert_eq!(table.primary_key.attribute_names(), vec!["id", "title"]);
        assert!(table.is_primary_key_attribute("title"));
        assert!(!table.is_primary_key_attribute("createdAt"));
    }

    #[test]
    fn test_index_lookup() {
        let table = card();
        let index = table.index("title-index").unwrap();
        assert_eq!(index.kind, IndexKind::Global);
        assert_eq!(index.key.hash().name, "title");
        assert!(matches!(
            table.index("missing"),
            Err(SchemaError::UnknownIndex { .. })
        ));
    }

    #[test]
    fn test_check_types() {
        let table = card();
        assert!(table
            .primary_key
            .check_types(ScalarType::Number, Some(ScalarType::String))
            .is_ok());
        assert!(matches!(
            table
                .primary_key
                .check_types(ScalarType::String, Some(ScalarType::String)),
            Err(SchemaError::KeyTypeMismatch { .. })
        ));
        assert!(matches!(
            table.primary_key.check_types(ScalarType::Number, None),
            Err(SchemaError::KeyShapeMismatch { .. })
        ));
    }
}
