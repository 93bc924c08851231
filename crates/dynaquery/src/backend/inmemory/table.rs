use std::cmp::Ordering;
use std::collections::HashMap;

use dynaquery_core::client::{ClientError, ClientResult, ConsumedCapacity, QueryResponse};
use dynaquery_core::codec::extract_key;
use dynaquery_core::schema::{KeySchema, TableMetadata};
use dynaquery_core::value::{canonical_number, compare_scalars, AttributeValue, Item, Key};

use super::expression::{matches_range, scalar_eq, KeyConditionExpr};

/// Capacity units reported per item read or written.
const NOMINAL_CAPACITY_PER_ITEM: f64 = 0.5;

/// One table's items, keyed by the canonical form of their primary key.
#[derive(Debug, Clone)]
pub struct Table {
    pub metadata: TableMetadata,
    items: HashMap<String, Item>,
}

impl Table {
    pub fn new(metadata: TableMetadata) -> Self {
        Self {
            metadata,
            items: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, key: &Key) -> ClientResult<Option<&Item>> {
        let id = self.key_id(key)?;
        Ok(self.items.get(&id))
    }

    pub fn put(&mut self, item: Item) -> ClientResult<()> {
        let key = self.primary_key_of(&item)?;
        let id = self.key_id(&key)?;
        self.items.insert(id, item);
        Ok(())
    }

    pub fn delete(&mut self, key: &Key) -> ClientResult<()> {
        let id = self.key_id(key)?;
        self.items.remove(&id);
        Ok(())
    }

    /// Returns a mutable reference to the item at `key`, creating it from the
    /// key attributes if absent.
    pub fn upsert(&mut self, key: &Key) -> ClientResult<&mut Item> {
        let id = self.key_id(key)?;
        Ok(self.items.entry(id).or_insert_with(|| key.clone()))
    }

    /// Canonical identifier for a primary key, validating its shape and types.
    pub fn key_id(&self, key: &Key) -> ClientResult<String> {
        let names = self.metadata.primary_key.attribute_names();
        if key.len() != names.len() {
            return Err(ClientError::Validation(
                "The provided key element does not match the schema".into(),
            ));
        }
        self.canonical_key(&self.metadata.primary_key, key)
    }

    fn primary_key_of(&self, item: &Item) -> ClientResult<Key> {
        extract_key(&self.metadata.primary_key, item).map_err(|e| {
            ClientError::Validation(format!("One or more parameter values were invalid: {e}"))
        })
    }

    fn canonical_key(&self, schema: &KeySchema, key: &Key) -> ClientResult<String> {
        let mut parts = Vec::with_capacity(2);
        for attribute in [Some(schema.hash()), schema.range()].into_iter().flatten() {
            let value = key.get(&attribute.name).ok_or_else(|| {
                ClientError::Validation(format!(
                    "Missing the key {} in the item",
                    attribute.name
                ))
            })?;
            if value.scalar_type() != attribute.attribute_type.scalar() {
                return Err(ClientError::Validation(format!(
                    "Type mismatch for key {}: expected {:?}, got {}",
                    attribute.name,
                    attribute.attribute_type,
                    value.type_name()
                )));
            }
            parts.push(canonical(value));
        }
        Ok(parts.join("\u{1f}"))
    }

    /// Runs a key-condition query over the table or one of its indexes.
    pub fn query(
        &self,
        index_name: Option<&str>,
        condition: &KeyConditionExpr,
        limit: Option<u32>,
        scan_index_forward: bool,
        exclusive_start_key: Option<&Key>,
    ) -> ClientResult<QueryResponse> {
        let key_schema = match index_name {
            Some(name) => {
                &self
                    .metadata
                    .index(name)
                    .map_err(|e| ClientError::Validation(e.to_string()))?
                    .key
            }
            None => &self.metadata.primary_key,
        };

        if condition.hash_attribute != key_schema.hash().name {
            return Err(ClientError::Validation(format!(
                "Query condition missed key schema element: {}",
                key_schema.hash().name
            )));
        }
        let range_name = key_schema.range().map(|r| r.name.as_str());
        if let Some((name, _)) = &condition.range {
            if Some(name.as_str()) != range_name {
                return Err(ClientError::Validation(format!(
                    "Query key condition not supported on attribute: {name}"
                )));
            }
        }
        if let Some(0) = limit {
            return Err(ClientError::Validation(
                "Limit must be greater than or equal to 1".into(),
            ));
        }

        let mut matching: Vec<(&Item, Ordered)> = self
            .items
            .values()
            .filter(|item| {
                item.get(&key_schema.hash().name)
                    .is_some_and(|v| scalar_eq(v, &condition.hash_value))
            })
            .filter(|item| match (&condition.range, range_name) {
                (Some((_, predicate)), Some(name)) => {
                    item.get(name).is_some_and(|v| matches_range(predicate, v))
                }
                // Sparse index: items without the range attribute are not projected.
                (None, Some(name)) => item.contains_key(name),
                _ => true,
            })
            .map(|item| (item, self.ordering_key(key_schema, item)))
            .collect();

        matching.sort_by(|(_, a), (_, b)| a.cmp(b));
        if !scan_index_forward {
            matching.reverse();
        }

        if let Some(start) = exclusive_start_key {
            let start = self.ordering_key(key_schema, start);
            let after = if scan_index_forward {
                Ordering::Greater
            } else {
                Ordering::Less
            };
            matching.retain(|(_, ordered)| ordered.cmp(&start) == after);
        }

        let page_size = limit.map_or(matching.len(), |l| l as usize);
        let has_more = matching.len() > page_size;
        matching.truncate(page_size);

        let last_evaluated_key = match (has_more, matching.last()) {
            (true, Some((item, _))) => Some(self.evaluated_key(key_schema, item)),
            _ => None,
        };

        let items: Vec<Item> = matching.into_iter().map(|(item, _)| item.clone()).collect();
        Ok(QueryResponse {
            count: items.len(),
            scanned_count: items.len(),
            consumed_capacity: Some(self.capacity(items.len())),
            last_evaluated_key,
            items,
        })
    }

    /// Nominal cost of touching `items` items.
    pub fn capacity(&self, items: usize) -> ConsumedCapacity {
        ConsumedCapacity {
            table_name: Some(self.metadata.name.clone()),
            capacity_units: Some(items.max(1) as f64 * NOMINAL_CAPACITY_PER_ITEM),
        }
    }

    /// Index range value first, then the primary key so that ties have a
    /// stable order.
    fn ordering_key(&self, schema: &KeySchema, item: &Item) -> Ordered {
        let range = schema.range().and_then(|r| item.get(&r.name)).cloned();
        let primary = self
            .metadata
            .primary_key
            .attribute_names()
            .into_iter()
            .map(|name| item.get(name).map(canonical).unwrap_or_default())
            .collect::<Vec<_>>()
            .join("\u{1f}");
        Ordered { range, primary }
    }

    /// Key attributes of the index and of the table, as a resume cursor.
    fn evaluated_key(&self, schema: &KeySchema, item: &Item) -> Key {
        schema
            .attribute_names()
            .into_iter()
            .chain(self.metadata.primary_key.attribute_names())
            .filter_map(|name| item.get(name).map(|v| (name.to_string(), v.clone())))
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Ordered {
    range: Option<AttributeValue>,
    primary: String,
}

impl PartialEq for Ordered {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ordered {}

impl PartialOrd for Ordered {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ordered {
    fn cmp(&self, other: &Self) -> Ordering {
        let range = match (&self.range, &other.range) {
            (Some(a), Some(b)) => compare_scalars(a, b).unwrap_or(Ordering::Equal),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
        };
        range.then_with(|| self.primary.cmp(&other.primary))
    }
}

/// Canonical string form of a scalar so that `1` and `1.0` name the same key.
fn canonical(value: &AttributeValue) -> String {
    match value {
        AttributeValue::S(s) => format!("S:{s}"),
        AttributeValue::N(n) => match canonical_number(n) {
            Some(c) => format!("N:{c}"),
            None => format!("N:{n}"),
        },
        AttributeValue::B(b) => {
            let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
            format!("B:{hex}")
        }
        other => format!("?:{other:?}"),
    }
}
