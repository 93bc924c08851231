use std::collections::HashMap;

use crate::codec::check_number;
use crate::error::Result;
use crate::schema::{KeySchema, SchemaError};
use crate::value::AttributeValue;

use super::range_key::{parse_values, RangePredicate};

pub const HASH_KEY_REF: &str = "#hk";
pub const HASH_VALUE_REF: &str = ":hkv";
pub const RANGE_KEY_REF: &str = "#rk";

/// A query key condition with its alias maps.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCondition {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
}

impl KeyCondition {
    /// `#hk = :hkv`, optionally followed by `AND <range condition>`.
    ///
    /// A range predicate against a hash-only key is a schema error.
    pub fn build(
        key: &KeySchema,
        hash: AttributeValue,
        range: Option<RangePredicate<AttributeValue>>,
    ) -> Result<Self> {
        check_number(&key.hash().name, &hash)?;
        let mut condition = Self {
            expression: format!("{HASH_KEY_REF} = {HASH_VALUE_REF}"),
            names: HashMap::from([(HASH_KEY_REF.to_string(), key.hash().name.clone())]),
            values: HashMap::from([(HASH_VALUE_REF.to_string(), hash)]),
        };

        if let Some(predicate) = range {
            let attribute = key.range().ok_or(SchemaError::KeyShapeMismatch {
                expected: "hash+range",
                actual: "hash",
            })?;
            let range_condition = parse_values(predicate, RANGE_KEY_REF)?;

            condition.expression.push_str(" AND ");
            condition.expression.push_str(&range_condition.expression);
            condition
                .names
                .insert(RANGE_KEY_REF.to_string(), attribute.name.clone());
            condition.values.extend(range_condition.values);
        }

        Ok(condition)
    }
}
