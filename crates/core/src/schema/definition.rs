//! Serializable table declaration.
//!
//! A `TableDefinition` is the configuration-file form of a schema. It goes
//! through the same builder validation as a declaration written in code.

use serde::{Deserialize, Serialize};

use super::{AttributeType, IndexKind, SchemaError, TableMetadata};

/// An attribute entry in a table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    /// Domain property name; defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,
}

/// A key entry: property names for the hash and (optional) range roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDefinition {
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// A secondary index entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub kind: IndexKind,
    /// Ignored for local indexes, which share the table hash key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
}

/// A whole table declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub name: String,
    pub attributes: Vec<AttributeDefinition>,
    pub primary_key: KeyDefinition,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
}

impl TableDefinition {
    /// Parses a JSON table definition.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validates the definition and produces table metadata.
    pub fn into_metadata(self) -> Result<TableMetadata, SchemaError> {
        let mut builder = TableMetadata::builder(self.name);

        for attribute in &self.attributes {
            let property = attribute.property.as_deref().unwrap_or(&attribute.name);
            builder = builder.attribute_as(&attribute.name, property, attribute.attribute_type);
        }

        builder = match &self.primary_key.range {
            Some(range) => builder.full_primary_key(&self.primary_key.hash, range),
            None => builder.hash_primary_key(&self.primary_key.hash),
        };

        for index in &self.indexes {
            builder = match (index.kind, index.hash.as_deref(), index.range.as_deref()) {
                (IndexKind::Local, _, Some(range)) => builder.local_index(&index.name, range),
                (IndexKind::Local, _, None) => {
                    return Err(SchemaError::UndeclaredKeyAttribute(format!(
                        "{} (range key of local index)",
                        index.name
                    )))
                }
                (IndexKind::Global, Some(hash), Some(range)) => {
                    builder.full_global_index(&index.name, hash, range)
                }
                (IndexKind::Global, Some(hash), None) => {
                    builder.hash_global_index(&index.name, hash)
                }
                (IndexKind::Global, None, _) => {
                    return Err(SchemaError::UndeclaredKeyAttribute(format!(
                        "{} (hash key of global index)",
                        index.name
                    )))
                }
            };
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CARD: &str = r#"{
        "name": "prod-Card",
        "attributes": [
            { "name": "id", "type": "number" },
            { "name": "title", "type": "string" },
            { "name": "createdAt", "property": "created_at", "type": "number" }
        ],
        "primary_key": { "hash": "id", "range": "title" },
        "indexes": [
            { "name": "title-index", "kind": "global", "hash": "title" },
            { "name": "by-created", "kind": "local", "range": "created_at" }
        ]
    }"#;

    #[test]
    fn test_parses_and_validates() {
        let table = TableDefinition::from_json(CARD)
            .unwrap()
            .into_metadata()
            .unwrap();

        assert_eq!(table.name, "prod-Card");
        assert_eq!(table.primary_key.attribute_names(), vec!["id", "title"]);
        assert_eq!(table.indexes.len(), 2);
        assert_eq!(
            table.index("by-created").unwrap().key.range().unwrap().name,
            "createdAt"
        );
    }

    #[test]
    fn test_global_index_without_hash_is_rejected() {
        let definition = TableDefinition {
            name: "cards".into(),
            attributes: vec![AttributeDefinition {
                name: "id".into(),
                property: None,
                attribute_type: AttributeType::Number,
            }],
            primary_key: KeyDefinition {
                hash: "id".into(),
                range: None,
            },
            indexes: vec![IndexDefinition {
                name: "broken".into(),
                kind: IndexKind::Global,
                hash: None,
                range: None,
            }],
        };

        assert!(matches!(
            definition.into_metadata(),
            Err(SchemaError::UndeclaredKeyAttribute(_))
        ));
    }

    #[test]
    fn test_unknown_attribute_type_fails_to_parse() {
        let json = r#"{
            "name": "cards",
            "attributes": [{ "name": "id", "type": "uuid" }],
            "primary_key": { "hash": "id" }
        }"#;
        assert!(TableDefinition::from_json(json).is_err());
    }
}
