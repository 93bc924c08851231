use std::cmp::Ordering;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::{canonical_number, compare_scalars, AttributeValue, KeyValue};

/// A condition on a range key.
#[derive(Debug, Clone, PartialEq)]
pub enum RangePredicate<T> {
    Eq(T),
    Lt(T),
    Lte(T),
    Gt(T),
    Gte(T),
    /// Inclusive on both ends.
    Between(T, T),
    BeginsWith(T),
}

impl<T: KeyValue> RangePredicate<T> {
    /// Converts the operands into store-native values.
    pub fn to_attribute_values(&self) -> RangePredicate<AttributeValue> {
        match self {
            Self::Eq(v) => RangePredicate::Eq(v.to_attribute_value()),
            Self::Lt(v) => RangePredicate::Lt(v.to_attribute_value()),
            Self::Lte(v) => RangePredicate::Lte(v.to_attribute_value()),
            Self::Gt(v) => RangePredicate::Gt(v.to_attribute_value()),
            Self::Gte(v) => RangePredicate::Gte(v.to_attribute_value()),
            Self::Between(lo, hi) => {
                RangePredicate::Between(lo.to_attribute_value(), hi.to_attribute_value())
            }
            Self::BeginsWith(v) => RangePredicate::BeginsWith(v.to_attribute_value()),
        }
    }
}

impl<T> RangePredicate<T> {
    fn operands(&self) -> Vec<&T> {
        match self {
            Self::Eq(v) | Self::Lt(v) | Self::Lte(v) | Self::Gt(v) | Self::Gte(v) => vec![v],
            Self::BeginsWith(v) => vec![v],
            Self::Between(lo, hi) => vec![lo, hi],
        }
    }
}

/// A rendered range-key condition fragment and the values it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeCondition {
    pub expression: String,
    pub values: HashMap<String, AttributeValue>,
}

/// Renders a range predicate against an attribute-name alias.
///
/// `alias` must look like `#name`. The value placeholder is derived from it:
/// `#rk` binds `:rkv`, or `:rkvStart` and `:rkvEnd` for `Between`.
pub fn parse<T: KeyValue>(predicate: &RangePredicate<T>, alias: &str) -> Result<RangeCondition> {
    parse_values(predicate.to_attribute_values(), alias)
}

/// Same as [`parse`] for operands already in store-native form.
pub fn parse_values(
    predicate: RangePredicate<AttributeValue>,
    alias: &str,
) -> Result<RangeCondition> {
    let value_alias = value_alias(alias)?;
    for operand in predicate.operands() {
        if let AttributeValue::N(n) = operand {
            if canonical_number(n).is_none() {
                return Err(Error::InvalidPredicate(format!("{n} is not a finite number")));
            }
        }
    }

    let comparison = |op: &str, value: AttributeValue| RangeCondition {
        expression: format!("{alias} {op} {value_alias}"),
        values: HashMap::from([(value_alias.clone(), value)]),
    };

    let condition = match predicate {
        RangePredicate::Eq(v) => comparison("=", v),
        RangePredicate::Lt(v) => comparison("<", v),
        RangePredicate::Lte(v) => comparison("<=", v),
        RangePredicate::Gt(v) => comparison(">", v),
        RangePredicate::Gte(v) => comparison(">=", v),
        RangePredicate::Between(lo, hi) => {
            match compare_scalars(&lo, &hi) {
                Some(Ordering::Less | Ordering::Equal) => {}
                Some(Ordering::Greater) => {
                    return Err(Error::InvalidPredicate(
                        "between lower bound is ordered after the upper bound".into(),
                    ))
                }
                None => {
                    return Err(Error::InvalidPredicate(format!(
                        "between bounds are not comparable: {} and {}",
                        lo.type_name(),
                        hi.type_name()
                    )))
                }
            }
            let start = format!("{value_alias}Start");
            let end = format!("{value_alias}End");
            RangeCondition {
                expression: format!("{alias} BETWEEN {start} AND {end}"),
                values: HashMap::from([(start, lo), (end, hi)]),
            }
        }
        RangePredicate::BeginsWith(v) => {
            if !matches!(v, AttributeValue::S(_) | AttributeValue::B(_)) {
                return Err(Error::InvalidPredicate(format!(
                    "begins_with requires a string or binary operand, got {}",
                    v.type_name()
                )));
            }
            RangeCondition {
                expression: format!("begins_with({alias}, {value_alias})"),
                values: HashMap::from([(value_alias.clone(), v)]),
            }
        }
    };

    Ok(condition)
}

/// `#rk` -> `:rkv`
fn value_alias(alias: &str) -> Result<String> {
    let body = alias
        .strip_prefix('#')
        .filter(|b| !b.is_empty() && b.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .ok_or_else(|| Error::InvalidPredicate(format!("invalid attribute alias: {alias:?}")))?;
    Ok(format!(":{body}v"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_operators() {
        let cases = [
            (RangePredicate::Eq(5), "#rk = :rkv"),
            (RangePredicate::Lt(5), "#rk < :rkv"),
            (RangePredicate::Lte(5), "#rk <= :rkv"),
            (RangePredicate::Gt(5), "#rk > :rkv"),
            (RangePredicate::Gte(5), "#rk >= :rkv"),
        ];

        for (predicate, expected) in cases {
            let condition = parse(&predicate, "#rk").unwrap();
            assert_eq!(condition.expression, expected);
            assert_eq!(
                condition.values,
                HashMap::from([(":rkv".to_string(), AttributeValue::N("5".into()))])
            );
        }
    }

    #[test]
    fn test_between() {
        let condition = parse(&RangePredicate::Between("a", "m"), "#rk").unwrap();
        assert_eq!(condition.expression, "#rk BETWEEN :rkvStart AND :rkvEnd");
        assert_eq!(condition.values[":rkvStart"], AttributeValue::S("a".into()));
        assert_eq!(condition.values[":rkvEnd"], AttributeValue::S("m".into()));
    }

    #[test]
    fn test_between_equal_bounds_is_allowed() {
        assert!(parse(&RangePredicate::Between(3, 3), "#rk").is_ok());
    }

    #[test]
    fn test_between_out_of_order_is_invalid() {
        let result = parse(&RangePredicate::Between(10, 2), "#rk");
        assert!(matches!(result, Err(Error::InvalidPredicate(_))));

        let result = parse(&RangePredicate::Between("b", "a"), "#rk");
        assert!(matches!(result, Err(Error::InvalidPredicate(_))));
    }

    #[test]
    fn test_between_compares_numbers_numerically() {
        // "9" > "10" as strings but not as numbers
        assert!(parse(&RangePredicate::Between(9, 10), "#rk").is_ok());
    }

    #[test]
    fn test_non_finite_operands_are_invalid() {
        for predicate in [
            RangePredicate::Eq(f64::NAN),
            RangePredicate::Gt(f64::INFINITY),
            RangePredicate::Between(0.0, f64::INFINITY),
        ] {
            let result = parse(&predicate, "#rk");
            assert!(matches!(result, Err(Error::InvalidPredicate(_))));
        }
        assert!(parse(&RangePredicate::Lt(2.5_f64), "#rk").is_ok());
    }

    #[test]
    fn test_between_large_integers_out_of_order_is_invalid() {
        let result = parse(
            &RangePredicate::Between(9_007_199_254_740_993_i64, 9_007_199_254_740_992),
            "#rk",
        );
        assert!(matches!(result, Err(Error::InvalidPredicate(_))));
        assert!(parse(
            &RangePredicate::Between(9_007_199_254_740_992_i64, 9_007_199_254_740_993),
            "#rk"
        )
        .is_ok());
    }

    #[test]
    fn test_begins_with() {
        let condition = parse(&RangePredicate::BeginsWith("2024-"), "#rk").unwrap();
        assert_eq!(condition.expression, "begins_with(#rk, :rkv)");
        assert_eq!(condition.values[":rkv"], AttributeValue::S("2024-".into()));

        let condition = parse(&RangePredicate::BeginsWith(vec![1u8, 2]), "#rk").unwrap();
        assert_eq!(condition.values[":rkv"], AttributeValue::B(vec![1, 2]));
    }

    #[test]
    fn test_begins_with_number_is_invalid() {
        let result = parse(&RangePredicate::BeginsWith(12), "#rk");
        assert!(matches!(result, Err(Error::InvalidPredicate(_))));
    }

    #[test]
    fn test_custom_alias() {
        let condition = parse(&RangePredicate::Gt(1), "#sort_key").unwrap();
        assert_eq!(condition.expression, "#sort_key > :sort_keyv");
        assert!(condition.values.contains_key(":sort_keyv"));
    }

    #[test]
    fn test_invalid_alias() {
        for alias in ["rk", "#", "#r k", "#rk)", ""] {
            let result = parse(&RangePredicate::Eq(1), alias);
            assert!(
                matches!(result, Err(Error::InvalidPredicate(_))),
                "alias {alias:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_expression_never_contains_attribute_name() {
        // Reserved words used as range key names must only be reachable through the alias.
        let name = "timestamp";
        let predicates = [
            RangePredicate::Eq(name),
            RangePredicate::Lt(name),
            RangePredicate::Between(name, "zzz"),
            RangePredicate::BeginsWith(name),
        ];
        for predicate in predicates {
            let condition = parse(&predicate, "#rk").unwrap();
            assert!(!condition.expression.contains(name));
        }
    }
}
