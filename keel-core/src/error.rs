//! Error types for pipeline validation and run tree construction

use thiserror::Error;

/// Structural problem with a pipeline definition
///
/// Deterministic and caller-correctable. The Display output names the
/// offending field so it can be surfaced to users unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("owner: cannot be blank")]
    MissingOwner,

    #[error("owner: project: cannot be blank")]
    BlankProject,

    #[error("steps: cannot be blank")]
    NoSteps,

    #[error("steps: {key:?}: name: cannot be blank")]
    BlankStepName { key: String },

    #[error("steps: key {key:?} doesn't match step name {name:?}")]
    KeyMismatch { key: String, name: String },

    #[error("steps: {step:?}: image: cannot be blank")]
    BlankImage { step: String },

    #[error("steps: exactly one root step is required, found {count}: {names:?}")]
    RootCount { count: usize, names: Vec<String> },

    #[error("steps: step {step:?} depends on unknown step {dependency:?}")]
    UnknownDependency { step: String, dependency: String },

    #[error("steps: one or more cycles detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },
}

impl ValidationError {
    /// Name of the field that failed validation
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingOwner => "owner",
            ValidationError::BlankProject => "project",
            ValidationError::NoSteps => "steps",
            ValidationError::BlankStepName { .. } | ValidationError::KeyMismatch { .. } => "name",
            ValidationError::BlankImage { .. } => "image",
            ValidationError::RootCount { .. }
            | ValidationError::UnknownDependency { .. }
            | ValidationError::Cycle { .. } => "depends_on",
        }
    }
}

/// Inconsistency between a job set and a well-formed dependency tree
///
/// Either an upstream invariant was violated or the job data was caught
/// mid-mutation; callers may retry after a short delay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunTreeError {
    #[error("no root step found among {jobs} pipeline step job(s)")]
    NoRoot { jobs: usize },

    #[error("multiple root steps found: {}", .0.join(", "))]
    MultipleRoots(Vec<String>),

    #[error("step {0:?} is claimed by more than one job")]
    DuplicateStep(String),

    #[error("step {step:?} depends on {dependency:?}, which has no job in this run")]
    DanglingDependency { step: String, dependency: String },

    #[error("dependency cycle between jobs: {}", .0.join(" -> "))]
    Cycle(Vec<String>),

    #[error("steps not reachable from the root: {}", .0.join(", "))]
    Unreachable(Vec<String>),
}
