//! Conversion between domain entities and attribute maps.
//!
//! Entities go through `serde_json::Value` on their way to and from the
//! store. Only attributes declared in the table metadata are carried; the
//! property name used by serde is mapped onto the store attribute name.

mod error;
mod json;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::schema::{Attribute, AttributeType, KeySchema, TableMetadata};
use crate::value::{canonical_number, AttributeValue, Item, Key};

pub use error::CodecError;
pub use json::{from_attribute_value, to_attribute_value};

/// Anything that can be stored in and loaded from a table.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Entity for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Serializes an entity into an item holding its declared attributes.
///
/// Absent and `null` properties, and empty sets, are left out of the item.
/// Every primary key attribute must be present.
pub fn serialize<T: Serialize>(metadata: &TableMetadata, entity: &T) -> Result<Item, CodecError> {
    let value = serde_json::to_value(entity).map_err(|e| CodecError::Serialize(e.to_string()))?;
    let mut object = match value {
        Value::Object(object) => object,
        other => return Err(CodecError::NotAnObject(json_kind(&other))),
    };

    let mut item = Item::with_capacity(metadata.attributes.len());
    for attribute in &metadata.attributes {
        match object.remove(&attribute.property_name) {
            None | Some(Value::Null) => {}
            Some(value) => match encode(attribute, value) {
                // The store rejects empty sets.
                AttributeValue::Ss(v) if v.is_empty() => {}
                AttributeValue::Ns(v) if v.is_empty() => {}
                AttributeValue::Bs(v) if v.is_empty() => {}
                encoded => {
                    item.insert(attribute.name.clone(), encoded);
                }
            },
        }
    }

    extract_key(&metadata.primary_key, &item)?;
    Ok(item)
}

/// Deserializes an item into an entity.
///
/// Attributes the table does not declare are ignored.
pub fn deserialize<T: DeserializeOwned>(
    metadata: &TableMetadata,
    item: &Item,
) -> Result<T, CodecError> {
    let mut object = Map::with_capacity(metadata.attributes.len());
    for attribute in &metadata.attributes {
        if let Some(value) = item.get(&attribute.name) {
            object.insert(
                attribute.property_name.clone(),
                from_attribute_value(&attribute.name, value)?,
            );
        }
    }

    serde_json::from_value(Value::Object(object)).map_err(|e| CodecError::Deserialize(e.to_string()))
}

/// Extracts the key attributes described by `key` from an item.
pub fn extract_key(key: &KeySchema, item: &Item) -> Result<Key, CodecError> {
    key.attribute_names()
        .into_iter()
        .map(|name| {
            item.get(name)
                .map(|value| (name.to_string(), value.clone()))
                .ok_or_else(|| CodecError::MissingKeyAttribute(name.to_string()))
        })
        .collect()
}

/// Rejects key values the store would refuse, such as `NaN` numbers.
pub fn check_key(key: &Key) -> Result<(), CodecError> {
    for (name, value) in key {
        check_number(name, value)?;
    }
    Ok(())
}

/// Fails on a number value that is not a finite decimal.
pub fn check_number(attribute: &str, value: &AttributeValue) -> Result<(), CodecError> {
    match value {
        AttributeValue::N(n) if canonical_number(n).is_none() => Err(CodecError::InvalidNumber {
            attribute: attribute.to_string(),
            value: n.clone(),
        }),
        _ => Ok(()),
    }
}

/// Encodes a JSON property value following the attribute's declared type.
///
/// serde represents bytes and sets as JSON arrays; those are folded back into
/// the binary and set variants here. Anything that does not fit the declared
/// type is stored as its natural JSON shape.
pub fn encode(attribute: &Attribute, value: Value) -> AttributeValue {
    match (attribute.attribute_type, value) {
        (AttributeType::Binary, Value::Array(values)) => match bytes(&values) {
            Some(b) => AttributeValue::B(b),
            None => to_attribute_value(Value::Array(values)),
        },
        (AttributeType::StringSet, Value::Array(values))
            if values.iter().all(Value::is_string) =>
        {
            AttributeValue::Ss(
                values
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )
        }
        (AttributeType::NumberSet, Value::Array(values))
            if values.iter().all(Value::is_number) =>
        {
            AttributeValue::Ns(values.iter().map(Value::to_string).collect())
        }
        (AttributeType::BinarySet, Value::Array(values)) => {
            let sets: Option<Vec<Vec<u8>>> = values
                .iter()
                .map(|v| v.as_array().and_then(|a| bytes(a)))
                .collect();
            match sets {
                Some(sets) => AttributeValue::Bs(sets),
                None => to_attribute_value(Value::Array(values)),
            }
        }
        (_, value) => to_attribute_value(value),
    }
}

fn bytes(values: &[Value]) -> Option<Vec<u8>> {
    values
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
