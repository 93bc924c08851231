//! Explicit schema declaration.

use std::collections::HashSet;

use super::{
    Attribute, AttributeType, IndexKind, IndexMetadata, KeySchema, SchemaError, TableMetadata,
};

#[derive(Debug, Clone)]
enum KeyDeclaration {
    Hash(String),
    Full(String, String),
}

#[derive(Debug, Clone)]
struct IndexDeclaration {
    name: String,
    kind: IndexKind,
    key: KeyDeclaration,
}

/// Builder for [`TableMetadata`].
///
/// Keys and indexes refer to attributes by their domain property name, the
/// same way they are declared on the entity type.
#[derive(Debug, Clone)]
pub struct TableMetadataBuilder {
    name: String,
    attributes: Vec<Attribute>,
    primary_keys: Vec<KeyDeclaration>,
    indexes: Vec<IndexDeclaration>,
}

impl TableMetadataBuilder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            primary_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Declares an attribute whose store name equals its property name.
    pub fn attribute(self, name: &str, attribute_type: AttributeType) -> Self {
        self.attribute_as(name, name, attribute_type)
    }

    /// Declares an attribute stored under `name` for domain property `property_name`.
    pub fn attribute_as(
        mut self,
        name: &str,
        property_name: &str,
        attribute_type: AttributeType,
    ) -> Self {
        self.attributes.push(Attribute {
            name: name.to_string(),
            property_name: property_name.to_string(),
            attribute_type,
        });
        self
    }

    /// Declares a hash-only primary key.
    pub fn hash_primary_key(mut self, hash: &str) -> Self {
        self.primary_keys
            .push(KeyDeclaration::Hash(hash.to_string()));
        self
    }

    /// Declares a hash+range primary key.
    pub fn full_primary_key(mut self, hash: &str, range: &str) -> Self {
        self.primary_keys
            .push(KeyDeclaration::Full(hash.to_string(), range.to_string()));
        self
    }

    /// Declares a hash-only global secondary index.
    pub fn hash_global_index(mut self, name: &str, hash: &str) -> Self {
        self.indexes.push(IndexDeclaration {
            name: name.to_string(),
            kind: IndexKind::Global,
            key: KeyDeclaration::Hash(hash.to_string()),
        });
        self
    }

    /// Declares a hash+range global secondary index.
    pub fn full_global_index(mut self, name: &str, hash: &str, range: &str) -> Self {
        self.indexes.push(IndexDeclaration {
            name: name.to_string(),
            kind: IndexKind::Global,
            key: KeyDeclaration::Full(hash.to_string(), range.to_string()),
        });
        self
    }

    /// Declares a local secondary index.
    ///
    /// The hash key is the table's own hash key; only the range differs.
    pub fn local_index(mut self, name: &str, range: &str) -> Self {
        self.indexes.push(IndexDeclaration {
            name: name.to_string(),
            kind: IndexKind::Local,
            key: KeyDeclaration::Full(String::new(), range.to_string()),
        });
        self
    }

    /// Validates the declaration and produces the metadata.
    pub fn build(self) -> Result<TableMetadata, SchemaError> {
        if self.name.trim().is_empty() {
            return Err(SchemaError::EmptyTableName);
        }

        let mut names = HashSet::new();
        let mut properties = HashSet::new();
        for attribute in &self.attributes {
            if !names.insert(attribute.name.as_str()) {
                return Err(SchemaError::DuplicateAttribute(attribute.name.clone()));
            }
            if !properties.insert(attribute.property_name.as_str()) {
                return Err(SchemaError::DuplicateAttribute(
                    attribute.property_name.clone(),
                ));
            }
        }

        let primary_key = match self.primary_keys.as_slice() {
            [] => return Err(SchemaError::MissingPrimaryKey(self.name.clone())),
            [declaration] => self.resolve(declaration)?,
            _ => return Err(SchemaError::MultiplePrimaryKeys(self.name.clone())),
        };

        let mut index_names = HashSet::new();
        let mut indexes = Vec::with_capacity(self.indexes.len());
        for declaration in &self.indexes {
            if !index_names.insert(declaration.name.as_str()) {
                return Err(SchemaError::DuplicateIndex(declaration.name.clone()));
            }
            let key = match (&declaration.kind, &declaration.key) {
                (IndexKind::Local, KeyDeclaration::Full(_, range)) => KeySchema::Full {
                    hash: primary_key.hash().clone(),
                    range: self.key_attribute(range)?,
                },
                (_, key) => self.resolve(key)?,
            };
            indexes.push(IndexMetadata {
                name: declaration.name.clone(),
                kind: declaration.kind,
                key,
            });
        }

        Ok(TableMetadata {
            name: self.name,
            attributes: self.attributes,
            primary_key,
            indexes,
        })
    }

    fn resolve(&self, declaration: &KeyDeclaration) -> Result<KeySchema, SchemaError> {
        Ok(match declaration {
            KeyDeclaration::Hash(hash) => KeySchema::Hash {
                hash: self.key_attribute(hash)?,
            },
            KeyDeclaration::Full(hash, range) => KeySchema::Full {
                hash: self.key_attribute(hash)?,
                range: self.key_attribute(range)?,
            },
        })
    }

    fn key_attribute(&self, property_name: &str) -> Result<Attribute, SchemaError> {
        let attribute = self
            .attributes
            .iter()
            .find(|a| a.property_name == property_name)
            .ok_or_else(|| SchemaError::UndeclaredKeyAttribute(property_name.to_string()))?;

        if attribute.attribute_type.scalar().is_none() {
            return Err(SchemaError::NonScalarKey {
                attribute: attribute.name.clone(),
                attribute_type: attribute.attribute_type,
            });
        }

        Ok(attribute.clone())
    }
}
