//! Key-condition and update expression builders.
//!
//! Attribute names are always referenced through `#` aliases and values
//! through `:` placeholders. Many natural attribute names (`name`, `date`,
//! `timestamp`...) are reserved words for the store and cannot appear
//! literally in an expression.

mod key_condition;
mod range_key;
mod update;

pub use key_condition::{KeyCondition, HASH_KEY_REF, HASH_VALUE_REF, RANGE_KEY_REF};
pub use range_key::{parse, parse_values, RangeCondition, RangePredicate};
pub use update::{ChangeSet, UpdateAction, UpdatePlan};
