//! Functional core of dynaquery.
//!
//! Pure data and pure functions: attribute values, table metadata, expression
//! builders, the entity codec, batch sizing and the backend client contract.
//! No I/O happens in this crate.

pub mod batch;
pub mod client;
pub mod codec;
pub mod error;
pub mod expression;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
