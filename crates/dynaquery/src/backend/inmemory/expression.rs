//! Evaluation of the key-condition and update expression subset the
//! expression builders emit.

use std::cmp::Ordering;
use std::collections::HashMap;

use dynaquery_core::client::{ClientError, ClientResult};
use dynaquery_core::expression::RangePredicate;
use dynaquery_core::value::{compare_scalars, AttributeValue, Item};

/// A parsed key condition, with names and values resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyConditionExpr {
    pub hash_attribute: String,
    pub hash_value: AttributeValue,
    pub range: Option<(String, RangePredicate<AttributeValue>)>,
}

/// A single update clause.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOp {
    Set(String, AttributeValue),
    Add(String, AttributeValue),
    Remove(String),
}

struct Resolver<'a> {
    names: &'a HashMap<String, String>,
    values: &'a HashMap<String, AttributeValue>,
}

impl Resolver<'_> {
    fn name(&self, token: &str) -> ClientResult<String> {
        let token = token.trim();
        if token.starts_with('#') {
            self.names.get(token).cloned().ok_or_else(|| {
                ClientError::Validation(format!(
                    "An expression attribute name used in the document path is not defined; attribute name: {token}"
                ))
            })
        } else if token.is_empty() {
            Err(ClientError::Validation("Empty attribute name".into()))
        } else {
            Ok(token.to_string())
        }
    }

    fn value(&self, token: &str) -> ClientResult<AttributeValue> {
        let token = token.trim();
        self.values.get(token).cloned().ok_or_else(|| {
            ClientError::Validation(format!(
                "An expression attribute value used in expression is not defined; attribute value: {token}"
            ))
        })
    }
}

/// Parses `h = :v [AND <range condition>]`.
pub fn parse_key_condition(
    expression: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> ClientResult<KeyConditionExpr> {
    let resolver = Resolver { names, values };
    let (hash_clause, range_clause) = match expression.split_once(" AND ") {
        Some((hash, range)) => (hash, Some(range)),
        None => (expression, None),
    };

    let (name, value) = hash_clause
        .split_once(" = ")
        .ok_or_else(|| invalid_condition(expression))?;

    let range = range_clause
        .map(|clause| parse_range_clause(clause, &resolver))
        .transpose()?;

    Ok(KeyConditionExpr {
        hash_attribute: resolver.name(name)?,
        hash_value: resolver.value(value)?,
        range,
    })
}

fn parse_range_clause(
    clause: &str,
    resolver: &Resolver<'_>,
) -> ClientResult<(String, RangePredicate<AttributeValue>)> {
    let clause = clause.trim();

    if let Some(args) = clause
        .strip_prefix("begins_with(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let (name, value) = args
            .split_once(',')
            .ok_or_else(|| invalid_condition(clause))?;
        return Ok((
            resolver.name(name)?,
            RangePredicate::BeginsWith(resolver.value(value)?),
        ));
    }

    let tokens: Vec<&str> = clause.split_whitespace().collect();
    match tokens.as_slice() {
        [name, "BETWEEN", lo, "AND", hi] => Ok((
            resolver.name(name)?,
            RangePredicate::Between(resolver.value(lo)?, resolver.value(hi)?),
        )),
        [name, op, value] => {
            let value = resolver.value(value)?;
            let predicate = match *op {
                "=" => RangePredicate::Eq(value),
                "<" => RangePredicate::Lt(value),
                "<=" => RangePredicate::Lte(value),
                ">" => RangePredicate::Gt(value),
                ">=" => RangePredicate::Gte(value),
                _ => return Err(invalid_condition(clause)),
            };
            Ok((resolver.name(name)?, predicate))
        }
        _ => Err(invalid_condition(clause)),
    }
}

fn invalid_condition(expression: &str) -> ClientError {
    ClientError::Validation(format!("Invalid KeyConditionExpression: {expression}"))
}

/// Returns `true` if two scalar values are equal, numbers compared numerically.
pub fn scalar_eq(a: &AttributeValue, b: &AttributeValue) -> bool {
    compare_scalars(a, b) == Some(Ordering::Equal)
}

/// Evaluates a range predicate against an item's range key value.
pub fn matches_range(predicate: &RangePredicate<AttributeValue>, value: &AttributeValue) -> bool {
    use Ordering::{Equal, Greater, Less};

    match predicate {
        RangePredicate::Eq(v) => compare_scalars(value, v) == Some(Equal),
        RangePredicate::Lt(v) => compare_scalars(value, v) == Some(Less),
        RangePredicate::Lte(v) => matches!(compare_scalars(value, v), Some(Less | Equal)),
        RangePredicate::Gt(v) => compare_scalars(value, v) == Some(Greater),
        RangePredicate::Gte(v) => matches!(compare_scalars(value, v), Some(Greater | Equal)),
        RangePredicate::Between(lo, hi) => {
            matches!(compare_scalars(value, lo), Some(Greater | Equal))
                && matches!(compare_scalars(value, hi), Some(Less | Equal))
        }
        RangePredicate::BeginsWith(prefix) => match (value, prefix) {
            (AttributeValue::S(s), AttributeValue::S(p)) => s.starts_with(p.as_str()),
            (AttributeValue::B(b), AttributeValue::B(p)) => b.starts_with(p),
            _ => false,
        },
    }
}

/// Parses `SET a = :v, ... ADD b :w, ... REMOVE c, ...`.
pub fn parse_update(
    expression: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, AttributeValue>,
) -> ClientResult<Vec<UpdateOp>> {
    let resolver = Resolver { names, values };
    let mut sections: Vec<(&str, Vec<&str>)> = Vec::new();

    for token in expression.split_whitespace() {
        match token {
            "SET" | "ADD" | "REMOVE" => sections.push((token, Vec::new())),
            _ => match sections.last_mut() {
                Some((_, tokens)) => tokens.push(token),
                None => return Err(invalid_update(expression)),
            },
        }
    }

    let mut ops = Vec::new();
    for (keyword, tokens) in sections {
        let body = tokens.join(" ");
        for clause in body.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let op = match keyword {
                "SET" => {
                    let (name, value) = clause
                        .split_once(" = ")
                        .ok_or_else(|| invalid_update(expression))?;
                    UpdateOp::Set(resolver.name(name)?, resolver.value(value)?)
                }
                "ADD" => {
                    let (name, value) = clause
                        .split_once(' ')
                        .ok_or_else(|| invalid_update(expression))?;
                    UpdateOp::Add(resolver.name(name)?, resolver.value(value)?)
                }
                _ => UpdateOp::Remove(resolver.name(clause)?),
            };
            ops.push(op);
        }
    }

    if ops.is_empty() {
        return Err(invalid_update(expression));
    }
    Ok(ops)
}

fn invalid_update(expression: &str) -> ClientError {
    ClientError::Validation(format!("Invalid UpdateExpression: {expression:?}"))
}

/// Applies parsed update clauses to an item in place.
pub fn apply_update(item: &mut Item, ops: Vec<UpdateOp>) -> ClientResult<()> {
    for op in ops {
        match op {
            UpdateOp::Set(name, value) => {
                item.insert(name, value);
            }
            UpdateOp::Remove(name) => {
                item.remove(&name);
            }
            UpdateOp::Add(name, value) => {
                let merged = match item.remove(&name) {
                    None => value,
                    Some(current) => add_values(&name, current, value)?,
                };
                item.insert(name, merged);
            }
        }
    }
    Ok(())
}

fn add_values(
    name: &str,
    current: AttributeValue,
    delta: AttributeValue,
) -> ClientResult<AttributeValue> {
    match (current, delta) {
        (AttributeValue::N(a), AttributeValue::N(b)) => add_numbers(name, &a, &b),
        (AttributeValue::Ss(mut a), AttributeValue::Ss(b)) => {
            union(&mut a, b);
            Ok(AttributeValue::Ss(a))
        }
        (AttributeValue::Ns(mut a), AttributeValue::Ns(b)) => {
            union(&mut a, b);
            Ok(AttributeValue::Ns(a))
        }
        (AttributeValue::Bs(mut a), AttributeValue::Bs(b)) => {
            union(&mut a, b);
            Ok(AttributeValue::Bs(a))
        }
        (current, delta) => Err(ClientError::Validation(format!(
            "An operand in the update expression has an incorrect data type: cannot ADD {} to {} attribute {name}",
            delta.type_name(),
            current.type_name()
        ))),
    }
}

fn add_numbers(name: &str, a: &str, b: &str) -> ClientResult<AttributeValue> {
    if let (Ok(x), Ok(y)) = (a.parse::<i64>(), b.parse::<i64>()) {
        if let Some(sum) = x.checked_add(y) {
            return Ok(AttributeValue::N(sum.to_string()));
        }
    }
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => Ok(AttributeValue::N((x + y).to_string())),
        _ => Err(ClientError::Validation(format!(
            "Invalid number in attribute {name}"
        ))),
    }
}

fn union<T: PartialEq>(into: &mut Vec<T>, from: Vec<T>) {
    for value in from {
        if !into.contains(&value) {
            into.push(value);
        }
    }
}
