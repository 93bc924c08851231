//! Table provisioning commands.

mod deploy;
mod error;
mod planning;

use std::path::{Path, PathBuf};

pub use error::{DynamodbError, Result};

use crate::prelude::*;
use dialoguer::Confirm;
use dynaquery::backend::DynamoDbClient;
use dynaquery::Config;
use dynaquery_core::schema::{TableDefinition, TableMetadata};

/// Table provisioning commands.
#[derive(Debug, clap::Parser)]
pub struct DynamodbCommand {
    #[command(subcommand)]
    pub action: DynamodbAction,
}

/// Available DynamoDB actions.
#[derive(Debug, clap::Subcommand)]
pub enum DynamodbAction {
    /// Create a table, or add its missing global indexes.
    Deploy(DeployCommand),

    /// Delete a table and all its data.
    Destroy(DestroyCommand),
}

/// Deploy a table described by a schema file.
#[derive(Debug, clap::Parser)]
#[command(long_about = "Create or update a DynamoDB table from a JSON schema file.

The schema file declares the table name, its attributes, the primary key
and any secondary indexes (see schemas/card.json). Missing tables are
created with all their indexes; existing tables get the global indexes
they lack.

The command shows a plan of changes before applying and asks for confirmation.

Environment variables:
  AWS_ENDPOINT_URL    - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION          - AWS region (defaults to us-east-1)
  AWS_PROFILE         - AWS profile to use for credentials")]
pub struct DeployCommand {
    /// Path to the JSON table definition.
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Override the table name from the schema file.
    #[arg(long)]
    pub table_name: Option<String>,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Destroy the table described by a schema file.
#[derive(Debug, clap::Parser)]
pub struct DestroyCommand {
    /// Path to the JSON table definition.
    #[arg(long, value_name = "FILE")]
    pub schema: PathBuf,

    /// Override the table name from the schema file.
    #[arg(long)]
    pub table_name: Option<String>,

    /// Skip confirmation prompts.
    #[arg(long)]
    pub force: bool,
}

/// Main entry point for dynamodb command.
pub async fn run(command: DynamodbCommand, global: crate::Global) -> Result<()> {
    match command.action {
        DynamodbAction::Deploy(deploy_cmd) => run_deploy(deploy_cmd, &global).await,
        DynamodbAction::Destroy(destroy_cmd) => run_destroy(destroy_cmd, &global).await,
    }
}

fn load_schema(path: &Path, table_name: Option<String>) -> Result<TableMetadata> {
    let json = std::fs::read_to_string(path)?;
    let mut definition =
        TableDefinition::from_json(&json).map_err(|source| DynamodbError::SchemaFile {
            path: path.to_path_buf(),
            source,
        })?;
    if let Some(name) = table_name {
        definition.name = name;
    }
    Ok(definition.into_metadata()?)
}

async fn connect(global: &crate::Global) -> DynamoDbClient {
    let config = Config::from_env();

    if !global.is_silent() {
        aprintln!("{} {}", p_b("Target:"), DynamoDbClient::target_display(&config));
        aprintln!();
    }

    DynamoDbClient::from_config(&config).await
}

fn confirm(prompt: &str, default: bool) -> Result<()> {
    let confirmed = Confirm::new()
        .with_prompt(prompt)
        .default(default)
        .interact()
        .map_err(|e| DynamodbError::Prompt(e.to_string()))?;

    if confirmed {
        Ok(())
    } else {
        Err(DynamodbError::UserCancelled)
    }
}

async fn run_deploy(cmd: DeployCommand, global: &crate::Global) -> Result<()> {
    let metadata = load_schema(&cmd.schema, cmd.table_name)?;
    let client = connect(global).await;
    let current_state = client.describe_table(&metadata.name).await?;

    let plan = planning::calculate_deploy_plan(current_state.as_ref(), &metadata);
    tracing::debug!(?plan, "Calculated deploy plan");

    if !global.is_silent() {
        aprintln!("{}", p_c("Deploy Plan:"));
        for line in planning::format_deploy_plan(&plan) {
            if line.starts_with('+') {
                aprintln!("  {}", p_g(&line));
            } else if line.starts_with('~') {
                aprintln!("  {}", p_y(&line));
            } else {
                aprintln!("  {}", line);
            }
        }
        aprintln!();
    }

    if matches!(plan, planning::DeployPlan::NoChanges { .. }) {
        if !global.is_silent() {
            aprintln!("{}", p_g("Infrastructure is up to date."));
        }
        return Ok(());
    }

    if !cmd.force {
        confirm("Apply these changes?", true)?;
    }

    if !global.is_silent() {
        aprintln!("{}", p_b("Applying changes..."));
    }

    deploy::execute_deploy_plan(&client, &plan).await?;

    if !global.is_silent() {
        aprintln!("{}", p_g("Infrastructure deployed successfully."));
    }
    Ok(())
}

async fn run_destroy(cmd: DestroyCommand, global: &crate::Global) -> Result<()> {
    let metadata = load_schema(&cmd.schema, cmd.table_name)?;
    let client = connect(global).await;
    let current_state = client.describe_table(&metadata.name).await?;

    let plan = planning::calculate_destroy_plan(current_state.as_ref(), &metadata.name);

    if !global.is_silent() {
        aprintln!("{}", p_y("Destroy Plan:"));
        for line in planning::format_destroy_plan(&plan) {
            aprintln!("  {}", p_r(&line));
        }
        aprintln!();
    }

    if matches!(plan, planning::DestroyPlan::AlreadyGone { .. }) {
        if !global.is_silent() {
            aprintln!("{}", p_g("Nothing to destroy."));
        }
        return Ok(());
    }

    if !cmd.force {
        confirm(
            "Are you sure you want to delete this table? ALL DATA WILL BE LOST",
            false,
        )?;
    }

    if !global.is_silent() {
        aprintln!("{}", p_b("Deleting table..."));
    }

    deploy::execute_destroy_plan(&client, &plan).await?;

    if !global.is_silent() {
        aprintln!("{}", p_g("Table destroyed successfully."));
    }
    Ok(())
}
