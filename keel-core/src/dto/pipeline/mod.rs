//! Pipeline DTOs for inter-service communication

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::domain::job::Job;
use crate::domain::pipeline::{Pipeline, PipelineOwner, PipelineRun, Step};
use crate::domain::tree::RunTreeNode;

/// Request to create or replace a pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipeline {
    pub name: String,
    pub owner: Option<PipelineOwner>,
    pub steps: BTreeMap<String, Step>,
}

impl CreatePipeline {
    /// Materialize the pipeline under the given id
    pub fn into_pipeline(self, id: Uuid) -> Pipeline {
        Pipeline {
            id,
            name: self.name,
            owner: self.owner,
            steps: self.steps,
        }
    }
}

/// Pipeline with run statistics, for listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineBundle {
    pub pipeline: Pipeline,
    pub total_runs: u64,
    /// Absent when the pipeline has never run
    pub last_run: Option<PipelineRunBundle>,
}

/// A pipeline run, optionally with its current tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRunBundle {
    pub run: PipelineRun,
    #[serde(default)]
    pub tree: Option<RunTreeNode>,
}

/// Result of queueing a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRunResponse {
    pub run: PipelineRun,
    /// Job running the root step
    pub root_job: Uuid,
    /// All jobs of the run, in dependency order
    pub jobs: Vec<Job>,
}

/// Optional project filter for listing pipelines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPipelines {
    pub project: Option<String>,
}
