//! Conversions between the core value types and `aws_sdk_dynamodb` types.
//!
//! Pure functions, testable without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::{
    AttributeValue as SdkValue, ConsumedCapacity as SdkCapacity, DeleteRequest, PutRequest,
    WriteRequest as SdkWriteRequest,
};

use dynaquery_core::client::{ClientError, ConsumedCapacity, WriteRequest};
use dynaquery_core::value::AttributeValue;

pub type SdkItem = HashMap<String, SdkValue>;

/// Convert a core value into its SDK form.
pub fn to_sdk_value(value: AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s),
        AttributeValue::N(n) => SdkValue::N(n),
        AttributeValue::B(b) => SdkValue::B(Blob::new(b)),
        AttributeValue::Ss(values) => SdkValue::Ss(values),
        AttributeValue::Ns(values) => SdkValue::Ns(values),
        AttributeValue::Bs(values) => SdkValue::Bs(values.into_iter().map(Blob::new).collect()),
        AttributeValue::Bool(b) => SdkValue::Bool(b),
        AttributeValue::Null(b) => SdkValue::Null(b),
        AttributeValue::L(values) => SdkValue::L(values.into_iter().map(to_sdk_value).collect()),
        AttributeValue::M(map) => SdkValue::M(to_sdk_item(map)),
    }
}

/// Convert an SDK value into the core form.
pub fn from_sdk_value(value: SdkValue) -> Result<AttributeValue, ClientError> {
    Ok(match value {
        SdkValue::S(s) => AttributeValue::S(s),
        SdkValue::N(n) => AttributeValue::N(n),
        SdkValue::B(b) => AttributeValue::B(b.into_inner()),
        SdkValue::Ss(values) => AttributeValue::Ss(values),
        SdkValue::Ns(values) => AttributeValue::Ns(values),
        SdkValue::Bs(values) => {
            AttributeValue::Bs(values.into_iter().map(Blob::into_inner).collect())
        }
        SdkValue::Bool(b) => AttributeValue::Bool(b),
        SdkValue::Null(b) => AttributeValue::Null(b),
        SdkValue::L(values) => AttributeValue::L(
            values
                .into_iter()
                .map(from_sdk_value)
                .collect::<Result<_, _>>()?,
        ),
        SdkValue::M(map) => AttributeValue::M(from_sdk_item(map)?),
        other => {
            return Err(ClientError::Other(format!(
                "Unsupported attribute value: {other:?}"
            )))
        }
    })
}

pub fn to_sdk_item(item: HashMap<String, AttributeValue>) -> SdkItem {
    item.into_iter()
        .map(|(k, v)| (k, to_sdk_value(v)))
        .collect()
}

pub fn from_sdk_item(item: SdkItem) -> Result<HashMap<String, AttributeValue>, ClientError> {
    item.into_iter()
        .map(|(k, v)| from_sdk_value(v).map(|v| (k, v)))
        .collect()
}

pub fn to_sdk_write_request(request: WriteRequest) -> Result<SdkWriteRequest, ClientError> {
    let built = match request {
        WriteRequest::Put(item) => SdkWriteRequest::builder().put_request(
            PutRequest::builder()
                .set_item(Some(to_sdk_item(item)))
                .build()
                .map_err(|e| ClientError::Validation(e.to_string()))?,
        ),
        WriteRequest::Delete(key) => SdkWriteRequest::builder().delete_request(
            DeleteRequest::builder()
                .set_key(Some(to_sdk_item(key)))
                .build()
                .map_err(|e| ClientError::Validation(e.to_string()))?,
        ),
    };
    Ok(built.build())
}

pub fn from_sdk_write_request(request: SdkWriteRequest) -> Result<WriteRequest, ClientError> {
    if let Some(put) = request.put_request {
        return Ok(WriteRequest::Put(from_sdk_item(put.item)?));
    }
    if let Some(delete) = request.delete_request {
        return Ok(WriteRequest::Delete(from_sdk_item(delete.key)?));
    }
    Err(ClientError::Other(
        "Write request has neither a put nor a delete".into(),
    ))
}

pub fn from_sdk_capacity(capacity: SdkCapacity) -> ConsumedCapacity {
    ConsumedCapacity {
        table_name: capacity.table_name,
        capacity_units: capacity.capacity_units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_values_convert_both_ways() {
        let values = vec![
            AttributeValue::S("a".into()),
            AttributeValue::N("1.5".into()),
            AttributeValue::B(vec![1, 2, 3]),
            AttributeValue::Bool(true),
            AttributeValue::Null(true),
        ];
        for value in values {
            let back = from_sdk_value(to_sdk_value(value.clone())).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn test_nested_values() {
        let value = AttributeValue::M(HashMap::from([(
            "tags".to_string(),
            AttributeValue::L(vec![
                AttributeValue::Ss(vec!["x".into()]),
                AttributeValue::Bs(vec![vec![9]]),
            ]),
        )]));
        let sdk = to_sdk_value(value.clone());
        assert!(matches!(sdk, SdkValue::M(_)));
        assert_eq!(from_sdk_value(sdk).unwrap(), value);
    }

    #[test]
    fn test_write_requests() {
        let key = HashMap::from([("id".to_string(), AttributeValue::N("1".into()))]);

        let put = to_sdk_write_request(WriteRequest::Put(key.clone())).unwrap();
        assert!(put.put_request().is_some());
        assert_eq!(
            from_sdk_write_request(put).unwrap(),
            WriteRequest::Put(key.clone())
        );

        let delete = to_sdk_write_request(WriteRequest::Delete(key.clone())).unwrap();
        assert!(delete.delete_request().is_some());
        assert_eq!(
            from_sdk_write_request(delete).unwrap(),
            WriteRequest::Delete(key)
        );
    }

    #[test]
    fn test_empty_write_request_is_an_error() {
        let request = SdkWriteRequest::builder().build();
        assert!(from_sdk_write_request(request).is_err());
    }
}
