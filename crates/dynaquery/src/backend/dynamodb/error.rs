//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `ClientError` from `dynaquery_core::client`, keeping
//! the transient/non-transient distinction the retry loop relies on.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::operation::batch_get_item::BatchGetItemError;
use aws_sdk_dynamodb::operation::batch_write_item::BatchWriteItemError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::update_item::UpdateItemError;

use dynaquery_core::client::ClientError;

/// Timeouts and dispatch failures never reached the service.
fn transport_error<E, R>(err: &SdkError<E, R>) -> Option<ClientError> {
    match err {
        SdkError::TimeoutError(_) => Some(ClientError::Unavailable("Request timed out".into())),
        SdkError::DispatchFailure(failure) => Some(ClientError::Unavailable(format!(
            "Dispatch failure: {failure:?}"
        ))),
        _ => None,
    }
}

/// Classify an error the typed variants did not cover, by error code.
fn from_error_code<E: ProvideErrorMetadata + Debug>(operation: &str, err: &E) -> ClientError {
    let message = err.message().unwrap_or("no message").to_string();
    match err.code() {
        Some("ValidationException") | Some("SerializationException") => {
            ClientError::Validation(message)
        }
        Some("ResourceNotFoundException") => ClientError::ResourceNotFound(message),
        Some("ResourceInUseException") => ClientError::Validation(message),
        Some("ThrottlingException") | Some("ProvisionedThroughputExceededException") => {
            ClientError::Throttled(message)
        }
        Some("ServiceUnavailable") | Some("InternalServerError") => {
            ClientError::Unavailable(message)
        }
        _ => ClientError::Other(format!("{operation} failed: {err:?}")),
    }
}

/// Map any SDK error through its error code. Used by table lifecycle calls.
pub fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> ClientError
where
    E: ProvideErrorMetadata + Debug,
    R: Debug,
{
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err {
        SdkError::ServiceError(service) => from_error_code(operation, service.err()),
        other => ClientError::Other(format!("{operation} failed: {other:?}")),
    }
}

/// Map a GetItem SDK error to ClientError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> ClientError {
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(e) => ClientError::ResourceNotFound(e.to_string()),
        GetItemError::ProvisionedThroughputExceededException(e) => {
            ClientError::Throttled(e.to_string())
        }
        GetItemError::RequestLimitExceeded(e) => ClientError::Throttled(e.to_string()),
        GetItemError::InternalServerError(e) => ClientError::Unavailable(e.to_string()),
        err => from_error_code("GetItem", &err),
    }
}

/// Map a PutItem SDK error to ClientError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> ClientError {
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        PutItemError::ResourceNotFoundException(e) => ClientError::ResourceNotFound(e.to_string()),
        PutItemError::ProvisionedThroughputExceededException(e) => {
            ClientError::Throttled(e.to_string())
        }
        PutItemError::RequestLimitExceeded(e) => ClientError::Throttled(e.to_string()),
        PutItemError::TransactionConflictException(e) => ClientError::Throttled(e.to_string()),
        PutItemError::ItemCollectionSizeLimitExceededException(e) => {
            ClientError::Validation(e.to_string())
        }
        PutItemError::InternalServerError(e) => ClientError::Unavailable(e.to_string()),
        err => from_error_code("PutItem", &err),
    }
}

/// Map a DeleteItem SDK error to ClientError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> ClientError {
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(e) => {
            ClientError::ResourceNotFound(e.to_string())
        }
        DeleteItemError::ProvisionedThroughputExceededException(e) => {
            ClientError::Throttled(e.to_string())
        }
        DeleteItemError::RequestLimitExceeded(e) => ClientError::Throttled(e.to_string()),
        DeleteItemError::TransactionConflictException(e) => ClientError::Throttled(e.to_string()),
        DeleteItemError::InternalServerError(e) => ClientError::Unavailable(e.to_string()),
        err => from_error_code("DeleteItem", &err),
    }
}

/// Map an UpdateItem SDK error to ClientError.
pub fn map_update_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<UpdateItemError, R>,
) -> ClientError {
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        UpdateItemError::ResourceNotFoundException(e) => {
            ClientError::ResourceNotFound(e.to_string())
        }
        UpdateItemError::ProvisionedThroughputExceededException(e) => {
            ClientError::Throttled(e.to_string())
        }
        UpdateItemError::RequestLimitExceeded(e) => ClientError::Throttled(e.to_string()),
        UpdateItemError::TransactionConflictException(e) => ClientError::Throttled(e.to_string()),
        UpdateItemError::ItemCollectionSizeLimitExceededException(e) => {
            ClientError::Validation(e.to_string())
        }
        UpdateItemError::InternalServerError(e) => ClientError::Unavailable(e.to_string()),
        err => from_error_code("UpdateItem", &err),
    }
}

/// Map a Query SDK error to ClientError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> ClientError {
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(e) => ClientError::ResourceNotFound(e.to_string()),
        QueryError::ProvisionedThroughputExceededException(e) => {
            ClientError::Throttled(e.to_string())
        }
        QueryError::RequestLimitExceeded(e) => ClientError::Throttled(e.to_string()),
        QueryError::InternalServerError(e) => ClientError::Unavailable(e.to_string()),
        err => from_error_code("Query", &err),
    }
}

/// Map a BatchGetItem SDK error to ClientError.
pub fn map_batch_get_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchGetItemError, R>,
) -> ClientError {
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        BatchGetItemError::ResourceNotFoundException(e) => {
            ClientError::ResourceNotFound(e.to_string())
        }
        BatchGetItemError::ProvisionedThroughputExceededException(e) => {
            ClientError::Throttled(e.to_string())
        }
        BatchGetItemError::RequestLimitExceeded(e) => ClientError::Throttled(e.to_string()),
        BatchGetItemError::InternalServerError(e) => ClientError::Unavailable(e.to_string()),
        err => from_error_code("BatchGetItem", &err),
    }
}

/// Map a BatchWriteItem SDK error to ClientError.
pub fn map_batch_write_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<BatchWriteItemError, R>,
) -> ClientError {
    if let Some(mapped) = transport_error(&err) {
        return mapped;
    }
    match err.into_service_error() {
        BatchWriteItemError::ResourceNotFoundException(e) => {
            ClientError::ResourceNotFound(e.to_string())
        }
        BatchWriteItemError::ProvisionedThroughputExceededException(e) => {
            ClientError::Throttled(e.to_string())
        }
        BatchWriteItemError::RequestLimitExceeded(e) => ClientError::Throttled(e.to_string()),
        BatchWriteItemError::ItemCollectionSizeLimitExceededException(e) => {
            ClientError::Validation(e.to_string())
        }
        BatchWriteItemError::InternalServerError(e) => ClientError::Unavailable(e.to_string()),
        err => from_error_code("BatchWriteItem", &err),
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_dynamodb::error::ErrorMetadata;
    use aws_sdk_dynamodb::operation::describe_table::DescribeTableError;

    use super::*;

    fn describe_error(code: &str) -> SdkError<DescribeTableError, ()> {
        let meta = ErrorMetadata::builder().code(code).message("boom").build();
        SdkError::service_error(DescribeTableError::generic(meta), ())
    }

    #[test]
    fn test_service_errors_are_mapped_by_code() {
        assert!(matches!(
            map_sdk_error("DescribeTable", describe_error("ResourceNotFoundException")),
            ClientError::ResourceNotFound(_)
        ));
        assert!(matches!(
            map_sdk_error("DescribeTable", describe_error("ThrottlingException")),
            ClientError::Throttled(_)
        ));
        assert!(matches!(
            map_sdk_error("DescribeTable", describe_error("AccessDeniedException")),
            ClientError::Other(_)
        ));
    }

    #[test]
    fn test_timeouts_are_transient() {
        let err: SdkError<DescribeTableError, ()> = SdkError::timeout_error("slow");
        let mapped = map_sdk_error("DescribeTable", err);
        assert!(matches!(mapped, ClientError::Unavailable(_)));
        assert!(mapped.is_transient());
    }
}
