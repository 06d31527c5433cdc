//! Pipeline domain types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Pipeline definition
///
/// Structure shared between orchestrator (persists) and clients (author).
/// Steps are keyed by name; a step's `name` must equal its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub owner: Option<PipelineOwner>,
    pub steps: BTreeMap<String, Step>,
}

impl Pipeline {
    /// Project name of the owning scope, if any
    pub fn project(&self) -> Option<&str> {
        match &self.owner {
            Some(PipelineOwner::Project(p)) => Some(p.project.as_str()),
            None => None,
        }
    }
}

/// Scope that owns a pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineOwner {
    Project(ProjectRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub project: String,
}

impl PipelineOwner {
    pub fn project(name: impl Into<String>) -> Self {
        PipelineOwner::Project(ProjectRef {
            project: name.into(),
        })
    }
}

/// One unit of work in a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    /// Steps that must succeed before this one runs. Empty marks a root.
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub kind: StepKind,
}

impl Step {
    pub fn is_root(&self) -> bool {
        self.depends_on.is_empty()
    }

    /// Whether `name` appears among this step's dependencies
    pub fn depends_on_step(&self, name: &str) -> bool {
        self.depends_on.iter().any(|d| d == name)
    }
}

/// What a step does when executed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepKind {
    Exec(ExecStep),
    Build(BuildStep),
    Deploy(DeployStep),
    Release(ReleaseStep),
    Up,
}

impl StepKind {
    pub fn label(&self) -> &'static str {
        match self {
            StepKind::Exec(_) => "exec",
            StepKind::Build(_) => "build",
            StepKind::Deploy(_) => "deploy",
            StepKind::Release(_) => "release",
            StepKind::Up => "up",
        }
    }
}

/// Run a command inside a container image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecStep {
    pub image: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStep {
    #[serde(default)]
    pub disable_push: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployStep {
    #[serde(default)]
    pub release: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStep {
    #[serde(default)]
    pub prune: bool,
}

/// One execution instance of a pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineRun {
    pub id: Uuid,
    pub pipeline_id: Uuid,
    /// Monotonic per pipeline, starting at 1
    pub sequence: u64,
    pub state: PipelineRunState,
    pub jobs: Vec<Uuid>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Aggregate state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineRunState {
    Pending,
    Running,
    Success,
    Error,
    Cancelled,
}
