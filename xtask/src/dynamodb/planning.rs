//! Pure functions for calculating deployment plans (Functional Core).

use dynaquery::backend::dynamodb::TableState;
use dynaquery_core::schema::{Attribute, IndexKind, IndexMetadata, KeySchema, TableMetadata};

/// Planned changes for deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployPlan {
    /// Table doesn't exist, needs to be created.
    CreateTable { metadata: TableMetadata },
    /// Table exists, global indexes need to be added.
    AddGlobalIndexes {
        table_name: String,
        indexes: Vec<IndexMetadata>,
    },
    /// Table is up to date, no changes needed.
    NoChanges { table_name: String },
}

/// Plan for destroying a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestroyPlan {
    /// Table exists and will be deleted.
    DeleteTable { table_name: String },
    /// Table doesn't exist, nothing to do.
    AlreadyGone { table_name: String },
}

/// Pure function: Calculate what changes are needed to reach desired state.
///
/// Local indexes only exist at creation time, so an existing table is only
/// ever extended with global indexes.
pub fn calculate_deploy_plan(current: Option<&TableState>, desired: &TableMetadata) -> DeployPlan {
    let Some(state) = current else {
        return DeployPlan::CreateTable {
            metadata: desired.clone(),
        };
    };

    let indexes: Vec<IndexMetadata> = desired
        .indexes
        .iter()
        .filter(|index| index.kind == IndexKind::Global)
        .filter(|index| !state.global_indexes.iter().any(|g| g.name == index.name))
        .cloned()
        .collect();

    if indexes.is_empty() {
        DeployPlan::NoChanges {
            table_name: desired.name.clone(),
        }
    } else {
        DeployPlan::AddGlobalIndexes {
            table_name: desired.name.clone(),
            indexes,
        }
    }
}

/// Pure function: Calculate destroy plan.
pub fn calculate_destroy_plan(current: Option<&TableState>, table_name: &str) -> DestroyPlan {
    match current {
        Some(_) => DestroyPlan::DeleteTable {
            table_name: table_name.to_string(),
        },
        None => DestroyPlan::AlreadyGone {
            table_name: table_name.to_string(),
        },
    }
}

fn describe(attribute: &Attribute) -> String {
    match attribute.attribute_type.scalar() {
        Some(scalar) => format!("{} ({scalar})", attribute.name),
        None => format!("{} (?)", attribute.name),
    }
}

fn key_lines(key: &KeySchema, indent: &str) -> Vec<String> {
    let mut lines = vec![format!("{indent}Partition key: {}", describe(key.hash()))];
    if let Some(range) = key.range() {
        lines.push(format!("{indent}Sort key: {}", describe(range)));
    }
    lines
}

fn index_label(index: &IndexMetadata) -> &'static str {
    match index.kind {
        IndexKind::Global => "GSI",
        IndexKind::Local => "LSI",
    }
}

/// Pure function: Format a deploy plan for display.
pub fn format_deploy_plan(plan: &DeployPlan) -> Vec<String> {
    match plan {
        DeployPlan::CreateTable { metadata } => {
            let mut lines = vec![format!("+ Create table: {}", metadata.name)];
            lines.extend(key_lines(&metadata.primary_key, "  "));
            for index in &metadata.indexes {
                lines.push(format!("  + {}: {}", index_label(index), index.name));
                lines.extend(key_lines(&index.key, "    "));
            }
            lines.push("  Billing: PAY_PER_REQUEST".to_string());
            lines
        }
        DeployPlan::AddGlobalIndexes {
            table_name,
            indexes,
        } => {
            let mut lines = vec![format!("~ Update table: {}", table_name)];
            for index in indexes {
                lines.push(format!("  + Add GSI: {}", index.name));
            }
            lines
        }
        DeployPlan::NoChanges { table_name } => {
            vec![format!("= Table '{}' is up to date", table_name)]
        }
    }
}

/// Pure function: Format a destroy plan for display.
pub fn format_destroy_plan(plan: &DestroyPlan) -> Vec<String> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            vec![format!(
                "- Delete table: {} (ALL DATA WILL BE LOST)",
                table_name
            )]
        }
        DestroyPlan::AlreadyGone { table_name } => {
            vec![format!("= Table '{}' does not exist", table_name)]
        }
    }
}
