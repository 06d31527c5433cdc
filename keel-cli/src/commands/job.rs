//! Job command handlers

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use keel_core::dto::job::{CompleteJob, JobOutcome};
use uuid::Uuid;

use crate::config::Config;
use crate::output;

/// Job subcommands
#[derive(Subcommand)]
pub enum JobCommands {
    /// Get job details
    Get {
        /// Job ID
        id: Uuid,
    },
    /// Acknowledge a queued job
    Ack {
        /// Job ID
        id: Uuid,
    },
    /// Complete a running job
    Complete {
        /// Job ID
        id: Uuid,

        /// Mark the job failed with this message
        #[arg(short, long)]
        error: Option<String>,
    },
    /// Cancel an unfinished job
    Cancel {
        /// Job ID
        id: Uuid,
    },
}

/// Handle job commands
pub async fn handle_job_command(command: JobCommands, config: &Config) -> Result<()> {
    let client = config.client();

    let (job, verb) = match command {
        JobCommands::Get { id } => (client.get_job(id).await?, None),
        JobCommands::Ack { id } => (client.ack_job(id).await?, Some("acknowledged")),
        JobCommands::Complete { id, error } => {
            let job = client.complete_job(id, &completion(error)).await?;
            (job, Some("completed"))
        }
        JobCommands::Cancel { id } => (client.cancel_job(id).await?, Some("cancelled")),
    };

    if let Some(verb) = verb {
        println!("{}", format!("✓ Job {} {}", job.id, verb).green().bold());
        println!();
    }
    output::print_job_details(&job);

    Ok(())
}

fn completion(error: Option<String>) -> CompleteJob {
    match error {
        Some(message) => CompleteJob {
            outcome: JobOutcome::Error,
            error: Some(message),
        },
        None => CompleteJob {
            outcome: JobOutcome::Success,
            error: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_outcome() {
        assert_eq!(completion(None).outcome, JobOutcome::Success);

        let failed = completion(Some("exit status 1".to_string()));
        assert_eq!(failed.outcome, JobOutcome::Error);
        assert_eq!(failed.error.as_deref(), Some("exit status 1"));
    }
}
