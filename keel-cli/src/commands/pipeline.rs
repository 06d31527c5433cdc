//! Pipeline command handlers
//!
//! Pipeline definitions are JSON files holding a `CreatePipeline` body:
//!
//! ```json
//! {
//!   "name": "deploy",
//!   "owner": { "project": { "project": "web" } },
//!   "steps": {
//!     "build": { "name": "build", "kind": { "type": "build" } },
//!     "ship": { "name": "ship", "depends_on": ["build"], "kind": { "type": "deploy" } }
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use keel_client::OrchestratorClient;
use keel_core::dto::pipeline::CreatePipeline;
use keel_core::validate_pipeline;
use std::path::Path;
use uuid::Uuid;

use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::output;
use crate::types::IdOrPrefix;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Check a pipeline file locally without contacting the orchestrator
    Validate {
        /// Path to a pipeline JSON file
        file: String,
    },
    /// Create a pipeline from a file
    Create {
        /// Path to a pipeline JSON file
        file: String,
    },
    /// Replace an existing pipeline's definition
    Update {
        /// Pipeline ID or unambiguous prefix
        id: String,

        /// Path to a pipeline JSON file
        file: String,
    },
    /// List pipelines
    List {
        /// Only pipelines of this project
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Get pipeline details
    Get {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Delete a pipeline and its runs
    Delete {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Queue a new run of a pipeline
    Run {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
}

/// Handle pipeline commands
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = config.client();

    match command {
        PipelineCommands::Validate { file } => validate_file(&file),
        PipelineCommands::Create { file } => create_pipeline(&client, &file).await,
        PipelineCommands::Update { id, file } => update_pipeline(&client, &id, &file).await,
        PipelineCommands::List { project } => list_pipelines(&client, project.as_deref()).await,
        PipelineCommands::Get { id } => get_pipeline(&client, &id).await,
        PipelineCommands::Delete { id } => delete_pipeline(&client, &id).await,
        PipelineCommands::Run { id } => queue_run(&client, &id).await,
    }
}

/// Read a pipeline definition from disk
fn load_pipeline_file(path: impl AsRef<Path>) -> Result<CreatePipeline> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline file: {}", path.display()))?;

    parse_pipeline(&content)
        .with_context(|| format!("Failed to parse pipeline file: {}", path.display()))
}

fn parse_pipeline(content: &str) -> Result<CreatePipeline> {
    Ok(serde_json::from_str(content)?)
}

fn validate_file(path: &str) -> Result<()> {
    let req = load_pipeline_file(path)?;
    let name = req.name.clone();
    let steps = req.steps.len();

    match validate_pipeline(&req.into_pipeline(Uuid::nil())) {
        Ok(()) => {
            println!(
                "{}",
                format!("✓ Pipeline {} is valid ({} step(s))", name, steps)
                    .green()
                    .bold()
            );
            Ok(())
        }
        Err(err) => {
            println!("{} {}", "✗".red().bold(), err.to_string().red());
            println!("  Field: {}", err.field().yellow());
            Err(anyhow::anyhow!("pipeline {} is invalid", name))
        }
    }
}

async fn create_pipeline(client: &OrchestratorClient, path: &str) -> Result<()> {
    let req = load_pipeline_file(path)?;
    let pipeline = client.create_pipeline(&req).await?;

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  ID:    {}", pipeline.id.to_string().cyan());
    println!("  Name:  {}", pipeline.name.bold());
    println!(
        "  Steps: {}",
        pipeline
            .steps
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
            .dimmed()
    );

    Ok(())
}

async fn update_pipeline(client: &OrchestratorClient, id: &str, path: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;
    let req = load_pipeline_file(path)?;

    let pipeline = client.update_pipeline(uuid, &req).await?;

    println!(
        "{}",
        format!("✓ Pipeline {} updated", pipeline.name).green().bold()
    );

    Ok(())
}

async fn list_pipelines(client: &OrchestratorClient, project: Option<&str>) -> Result<()> {
    let bundles = client.list_pipelines(project).await?;

    if bundles.is_empty() {
        println!("{}", "No pipelines found.".yellow());
    } else {
        println!("{}", format!("Found {} pipeline(s):", bundles.len()).bold());
        println!();
        for bundle in &bundles {
            output::print_pipeline_summary(bundle);
        }
    }

    Ok(())
}

async fn get_pipeline(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;
    let pipeline = client.get_pipeline(uuid).await?;

    output::print_pipeline_details(&pipeline);

    Ok(())
}

async fn delete_pipeline(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;

    client.delete_pipeline(uuid).await?;

    println!(
        "{}",
        format!("✓ Pipeline {} deleted successfully!", uuid)
            .green()
            .bold()
    );

    Ok(())
}

async fn queue_run(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;
    let queued = client.queue_run(uuid).await?;

    println!(
        "{}",
        format!("✓ Run #{} queued", queued.run.sequence).green().bold()
    );
    println!("  Root job: {}", queued.root_job.to_string().cyan());
    for job in &queued.jobs {
        if let Some(op) = job.pipeline_step() {
            println!("    {} {}", job.id.to_string().dimmed(), op.step.name);
        }
    }

    Ok(())
}
