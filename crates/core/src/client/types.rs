use std::collections::HashMap;

use crate::value::{AttributeValue, Item, Key};

/// Backend-reported resource cost of a call.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedCapacity {
    pub table_name: Option<String>,
    pub capacity_units: Option<f64>,
}

/// A single entry of a batch write: put a full item or delete by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteRequest {
    Put(Item),
    Delete(Key),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetItemRequest {
    pub table_name: String,
    pub key: Key,
    pub consistent_read: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetItemResponse {
    pub item: Option<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PutItemRequest {
    pub table_name: String,
    pub item: Item,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteItemRequest {
    pub table_name: String,
    pub key: Key,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemRequest {
    pub table_name: String,
    pub key: Key,
    pub update_expression: String,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub table_name: String,
    pub index_name: Option<String>,
    pub key_condition_expression: String,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
    pub limit: Option<u32>,
    pub scan_index_forward: bool,
    pub exclusive_start_key: Option<Key>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryResponse {
    pub items: Vec<Item>,
    pub count: usize,
    pub scanned_count: usize,
    pub last_evaluated_key: Option<Key>,
    pub consumed_capacity: Option<ConsumedCapacity>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchGetRequest {
    pub table_name: String,
    pub keys: Vec<Key>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchGetResponse {
    pub items: Vec<Item>,
    pub unprocessed_keys: Vec<Key>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchWriteRequest {
    pub table_name: String,
    pub requests: Vec<WriteRequest>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchWriteResponse {
    pub unprocessed: Vec<WriteRequest>,
    pub consumed_capacity: Option<ConsumedCapacity>,
}
