//! Table deployment operations (Imperative Shell).

use dynaquery::backend::DynamoDbClient;

use super::error::Result;
use super::planning::{DeployPlan, DestroyPlan};

/// Execute a deploy plan.
pub async fn execute_deploy_plan(client: &DynamoDbClient, plan: &DeployPlan) -> Result<()> {
    match plan {
        DeployPlan::CreateTable { metadata } => {
            client.create_table(metadata).await?;
            client.wait_for_active(&metadata.name).await?;
        }
        DeployPlan::AddGlobalIndexes {
            table_name,
            indexes,
        } => {
            // One index at a time: the table must be active between updates.
            for index in indexes {
                client.add_global_index(table_name, index).await?;
                client.wait_for_active(table_name).await?;
            }
        }
        DeployPlan::NoChanges { .. } => {}
    }
    Ok(())
}

/// Execute a destroy plan.
pub async fn execute_destroy_plan(client: &DynamoDbClient, plan: &DestroyPlan) -> Result<()> {
    match plan {
        DestroyPlan::DeleteTable { table_name } => {
            client.delete_table(table_name).await?;
        }
        DestroyPlan::AlreadyGone { .. } => {}
    }
    Ok(())
}
