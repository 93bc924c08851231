//! Backend implementations of `DynamoClient`.
//!
//! # Feature Flags
//!
//! - `inmemory` (default): in-process backend for tests and local development
//! - `dynamodb`: AWS DynamoDB backend using `aws-sdk-dynamodb`
//!
//! Both can be enabled at once; accessors only see `Arc<dyn DynamoClient>`.

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryClient;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbClient;
