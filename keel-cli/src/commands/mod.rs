//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod job;
mod pipeline;
mod run;

pub use job::JobCommands;
pub use pipeline::PipelineCommands;
pub use run::RunCommands;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Pipeline management
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Pipeline runs and their trees
    Run {
        #[command(subcommand)]
        command: RunCommands,
    },
    /// Job lifecycle
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },
}

/// Route a command to its handler module
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command, config).await,
        Commands::Run { command } => run::handle_run_command(command, config).await,
        Commands::Job { command } => job::handle_job_command(command, config).await,
    }
}
