//! Pipeline validation
//!
//! Structural checks a pipeline must pass before the store accepts it.
//! Checks run in a fixed order and the first failure is returned.

use crate::domain::pipeline::{Pipeline, PipelineOwner, StepKind};
use crate::error::ValidationError;
use crate::graph::StepGraph;

/// Validate a pipeline definition
///
/// On success the step graph has exactly one root, every dependency
/// resolves, and there are no cycles.
pub fn validate_pipeline(pipeline: &Pipeline) -> Result<(), ValidationError> {
    validate_owner(pipeline)?;

    if pipeline.steps.is_empty() {
        return Err(ValidationError::NoSteps);
    }

    for (key, step) in &pipeline.steps {
        if step.name.trim().is_empty() {
            return Err(ValidationError::BlankStepName { key: key.clone() });
        }

        if step.name != *key {
            return Err(ValidationError::KeyMismatch {
                key: key.clone(),
                name: step.name.clone(),
            });
        }

        if let StepKind::Exec(exec) = &step.kind {
            if exec.image.trim().is_empty() {
                return Err(ValidationError::BlankImage { step: key.clone() });
            }
        }
    }

    let graph = StepGraph::from_steps(&pipeline.steps);

    let roots = graph.roots();
    if roots.len() != 1 {
        return Err(ValidationError::RootCount {
            count: roots.len(),
            names: roots.iter().map(|r| r.to_string()).collect(),
        });
    }

    // An unresolved edge cannot be traversed, so report it before cycle detection
    if let Some(missing) = graph.unresolved_dependencies().first() {
        return Err(ValidationError::UnknownDependency {
            step: missing.step.clone(),
            dependency: missing.dependency.clone(),
        });
    }

    if let Some(path) = graph.find_cycle() {
        return Err(ValidationError::Cycle { path });
    }

    Ok(())
}

fn validate_owner(pipeline: &Pipeline) -> Result<(), ValidationError> {
    match &pipeline.owner {
        None => Err(ValidationError::MissingOwner),
        Some(PipelineOwner::Project(p)) if p.project.trim().is_empty() => {
            Err(ValidationError::BlankProject)
        }
        Some(_) => Ok(()),
    }
}
