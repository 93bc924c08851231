//! Backend client interface and wire-level request/response types.

mod error;
mod traits;
mod types;

pub use error::ClientError;
pub use traits::{ClientResult, DynamoClient};
pub use types::{
    BatchGetRequest, BatchGetResponse, BatchWriteRequest, BatchWriteResponse, ConsumedCapacity,
    DeleteItemRequest, GetItemRequest, GetItemResponse, PutItemRequest, QueryRequest,
    QueryResponse, UpdateItemRequest, WriteRequest,
};
