//! Conversions between `serde_json::Value` and `AttributeValue`.

use serde_json::{Map, Number, Value};

use crate::value::AttributeValue;

use super::CodecError;

/// Converts a JSON value into its store-native form.
///
/// `null` becomes `Null(true)`; callers writing items drop nulls before
/// getting here so that absent properties stay absent attributes.
pub fn to_attribute_value(value: Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => {
            AttributeValue::L(values.into_iter().map(to_attribute_value).collect())
        }
        Value::Object(map) => AttributeValue::M(
            map.into_iter()
                .map(|(k, v)| (k, to_attribute_value(v)))
                .collect(),
        ),
    }
}

/// Converts a store-native value back into JSON.
///
/// `attribute` is only used to label errors.
pub fn from_attribute_value(attribute: &str, value: &AttributeValue) -> Result<Value, CodecError> {
    Ok(match value {
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::N(n) => Value::Number(parse_number(attribute, n)?),
        AttributeValue::B(bytes) => bytes_to_json(bytes),
        AttributeValue::Ss(values) => {
            Value::Array(values.iter().cloned().map(Value::String).collect())
        }
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(|n| parse_number(attribute, n).map(Value::Number))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::Bs(values) => Value::Array(values.iter().map(|b| bytes_to_json(b)).collect()),
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(|v| from_attribute_value(attribute, v))
                .collect::<Result<_, _>>()?,
        ),
        AttributeValue::M(map) => {
            let mut object = Map::with_capacity(map.len());
            for (k, v) in map {
                object.insert(k.clone(), from_attribute_value(attribute, v)?);
            }
            Value::Object(object)
        }
    })
}

fn bytes_to_json(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| Value::from(*b)).collect())
}

fn parse_number(attribute: &str, raw: &str) -> Result<Number, CodecError> {
    let invalid = || CodecError::InvalidNumber {
        attribute: attribute.to_string(),
        value: raw.to_string(),
    };
    let trimmed = raw.trim();

    if let Ok(i) = trimmed.parse::<i64>() {
        return Ok(Number::from(i));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Ok(Number::from(u));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_scalars_to_attribute_values() {
        assert_eq!(to_attribute_value(json!("a")), AttributeValue::S("a".into()));
        assert_eq!(to_attribute_value(json!(100)), AttributeValue::N("100".into()));
        assert_eq!(to_attribute_value(json!(true)), AttributeValue::Bool(true));
        assert_eq!(to_attribute_value(json!(null)), AttributeValue::Null(true));
    }

    #[test]
    fn test_nested_values() {
        let value = to_attribute_value(json!({ "tags": ["a", 1] }));
        let AttributeValue::M(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(
            map["tags"],
            AttributeValue::L(vec![
                AttributeValue::S("a".into()),
                AttributeValue::N("1".into())
            ])
        );
    }

    #[test]
    fn test_numbers_parse_to_narrowest_json_number() {
        assert_eq!(
            from_attribute_value("n", &AttributeValue::N("-3".into())).unwrap(),
            json!(-3)
        );
        assert_eq!(
            from_attribute_value("n", &AttributeValue::N("18446744073709551615".into())).unwrap(),
            json!(u64::MAX)
        );
        assert_eq!(
            from_attribute_value("n", &AttributeValue::N("2.5".into())).unwrap(),
            json!(2.5)
        );
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let result = from_attribute_value("price", &AttributeValue::N("abc".into()));
        assert_eq!(
            result,
            Err(CodecError::InvalidNumber {
                attribute: "price".into(),
                value: "abc".into()
            })
        );
    }

    #[test]
    fn test_sets_and_binary_become_arrays() {
        assert_eq!(
            from_attribute_value("b", &AttributeValue::B(vec![1, 2])).unwrap(),
            json!([1, 2])
        );
        assert_eq!(
            from_attribute_value("ss", &AttributeValue::Ss(vec!["x".into()])).unwrap(),
            json!(["x"])
        );
        assert_eq!(
            from_attribute_value("ns", &AttributeValue::Ns(vec!["1".into(), "2".into()])).unwrap(),
            json!([1, 2])
        );
    }
}
