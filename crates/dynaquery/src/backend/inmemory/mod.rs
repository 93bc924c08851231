//! In-memory backend.
//!
//! Implements [`DynamoClient`](dynaquery_core::client::DynamoClient) over
//! `HashMap`s, evaluating the same key-condition and update expressions the
//! accessors send to DynamoDB. Useful for tests and local development.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynaquery::backend::inmemory::InMemoryClient;
//!
//! let client = InMemoryClient::new();
//! client.create_table(&metadata).await?;
//! ```

mod client;
mod expression;
mod table;

pub use client::InMemoryClient;
