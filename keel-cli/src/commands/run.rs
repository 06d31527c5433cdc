//! Run command handlers

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use keel_core::build_run_tree;
use keel_core::domain::job::Job;
use keel_core::dto::pipeline::PipelineRunBundle;

use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::output;
use crate::types::IdOrPrefix;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Show the tree of a pipeline run
    Tree {
        /// Pipeline ID or unambiguous prefix
        pipeline_id: String,

        /// Run sequence number (defaults to the latest run)
        #[arg(short, long)]
        sequence: Option<u64>,
    },
    /// Build and show a run tree from a JSON file of jobs, offline
    Render {
        /// Path to a JSON array of jobs
        jobs_file: String,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    match command {
        RunCommands::Tree {
            pipeline_id,
            sequence,
        } => {
            let client = config.client();
            let uuid = resolve_pipeline_id(&client, &IdOrPrefix::parse(&pipeline_id)).await?;

            let bundle = match sequence {
                Some(sequence) => client.get_run_tree(uuid, sequence).await?,
                None => client.get_latest_run_tree(uuid).await.map_err(|e| {
                    if e.is_not_found() {
                        anyhow::anyhow!("Pipeline {} has no runs yet", uuid)
                    } else {
                        e.into()
                    }
                })?,
            };

            print_run(&bundle);
            Ok(())
        }
        RunCommands::Render { jobs_file } => render_file(&jobs_file),
    }
}

fn print_run(bundle: &PipelineRunBundle) {
    println!(
        "{} #{} [{}]",
        "Run".bold(),
        bundle.run.sequence,
        output::run_state(bundle.run.state)
    );
    println!();

    match &bundle.tree {
        Some(tree) => print!("{}", output::render_tree(tree)),
        None => println!("{}", "No tree available.".yellow()),
    }
}

fn render_file(path: &str) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read jobs file: {}", path))?;
    let jobs: Vec<Job> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse jobs file: {}", path))?;

    let tree = build_run_tree(&jobs).context("Jobs do not form a valid run tree")?;

    print!("{}", output::render_tree(&tree));
    Ok(())
}
