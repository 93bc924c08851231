use std::collections::HashMap;

use crate::schema::TableMetadata;
use crate::value::AttributeValue;

/// What to do with a single property in an update.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateAction {
    /// Replace the attribute value.
    Put(AttributeValue),
    /// Add to a number or union into a set.
    Add(AttributeValue),
    /// Remove the attribute from the item.
    DeleteAttribute,
}

/// Changes keyed by domain property name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    changes: Vec<(String, UpdateAction)>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(self, property: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.with(property, UpdateAction::Put(value.into()))
    }

    pub fn add(self, property: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.with(property, UpdateAction::Add(value.into()))
    }

    pub fn delete_attribute(self, property: impl Into<String>) -> Self {
        self.with(property, UpdateAction::DeleteAttribute)
    }

    /// Sets the action for a property, replacing any earlier one.
    pub fn with(mut self, property: impl Into<String>, action: UpdateAction) -> Self {
        let property = property.into();
        match self.changes.iter().position(|(p, _)| *p == property) {
            Some(index) => self.changes[index].1 = action,
            None => self.changes.push((property, action)),
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UpdateAction)> {
        self.changes.iter().map(|(p, a)| (p.as_str(), a))
    }
}

/// An aliased update expression built from a change set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePlan {
    pub expression: String,
    pub names: HashMap<String, String>,
    pub values: HashMap<String, AttributeValue>,
    /// Properties the table does not declare. They are not part of the plan.
    pub dropped: Vec<String>,
}

impl UpdatePlan {
    /// Resolves property names through `metadata` and renders
    /// `SET #u0 = :u0 ADD #u1 :u1 REMOVE #u2`.
    ///
    /// Undeclared properties are skipped and listed in `dropped`.
    pub fn build(metadata: &TableMetadata, changes: &ChangeSet) -> Self {
        let mut plan = Self::default();
        let mut set = Vec::new();
        let mut add = Vec::new();
        let mut remove = Vec::new();

        for (property, action) in changes.iter() {
            let Some(attribute) = metadata.attribute_by_property(property) else {
                plan.dropped.push(property.to_string());
                continue;
            };

            let index = plan.names.len();
            let name_ref = format!("#u{index}");
            let value_ref = format!(":u{index}");
            plan.names.insert(name_ref.clone(), attribute.name.clone());

            match action {
                UpdateAction::Put(value) => {
                    set.push(format!("{name_ref} = {value_ref}"));
                    plan.values.insert(value_ref, value.clone());
                }
                UpdateAction::Add(value) => {
                    add.push(format!("{name_ref} {value_ref}"));
                    plan.values.insert(value_ref, value.clone());
                }
                UpdateAction::DeleteAttribute => remove.push(name_ref),
            }
        }

        let clauses = [("SET", set), ("ADD", add), ("REMOVE", remove)];
        plan.expression = clauses
            .into_iter()
            .filter(|(_, parts)| !parts.is_empty())
            .map(|(keyword, parts)| format!("{keyword} {}", parts.join(", ")))
            .collect::<Vec<_>>()
            .join(" ");

        plan
    }

    /// Returns `true` when nothing survived name resolution.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeType;

    fn card_table() -> TableMetadata {
        TableMetadata::builder("prod-Card4")
            .attribute("id", AttributeType::Number)
            .attribute("title", AttributeType::String)
            .attribute_as("view_count", "views", AttributeType::Number)
            .attribute("note", AttributeType::String)
            .hash_primary_key("id")
            .build()
            .unwrap()
    }

    #[test]
    fn test_put() {
        let plan = UpdatePlan::build(&card_table(), &ChangeSet::new().put("title", "200"));

        assert_eq!(plan.expression, "SET #u0 = :u0");
        assert_eq!(plan.names["#u0"], "title");
        assert_eq!(plan.values[":u0"], AttributeValue::S("200".into()));
        assert!(plan.dropped.is_empty());
    }

    #[test]
    fn test_all_actions() {
        let changes = ChangeSet::new()
            .put("title", "t")
            .add("views", 1)
            .delete_attribute("note");
        let plan = UpdatePlan::build(&card_table(), &changes);

        assert_eq!(plan.expression, "SET #u0 = :u0 ADD #u1 :u1 REMOVE #u2");
        assert_eq!(plan.names["#u1"], "view_count");
        assert_eq!(plan.names["#u2"], "note");
        assert_eq!(plan.values.len(), 2);
    }

    #[test]
    fn test_multiple_sets_are_comma_separated() {
        let changes = ChangeSet::new().put("title", "t").put("note", "n");
        let plan = UpdatePlan::build(&card_table(), &changes);
        assert_eq!(plan.expression, "SET #u0 = :u0, #u1 = :u1");
    }

    #[test]
    fn test_undeclared_properties_are_dropped() {
        let changes = ChangeSet::new().put("title", "t").put("unknown", "x");
        let plan = UpdatePlan::build(&card_table(), &changes);

        assert_eq!(plan.expression, "SET #u0 = :u0");
        assert_eq!(plan.dropped, vec!["unknown".to_string()]);
    }

    #[test]
    fn test_attribute_names_are_not_property_names() {
        // "view_count" is the store name; "views" is only known to the caller.
        let plan = UpdatePlan::build(&card_table(), &ChangeSet::new().put("view_count", 3));
        assert!(plan.is_empty());
        assert_eq!(plan.dropped, vec!["view_count".to_string()]);
    }

    #[test]
    fn test_empty_change_set() {
        let plan = UpdatePlan::build(&card_table(), &ChangeSet::new());
        assert!(plan.is_empty());
        assert_eq!(plan.expression, "");
    }

    #[test]
    fn test_later_action_replaces_earlier() {
        let changes = ChangeSet::new().put("title", "a").delete_attribute("title");
        assert_eq!(changes.len(), 1);

        let plan = UpdatePlan::build(&card_table(), &changes);
        assert_eq!(plan.expression, "REMOVE #u0");
    }
}
