//! Run tree types
//!
//! The derived, hierarchical view of a pipeline run. Trees are value trees
//! rebuilt on every read and never persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pipeline::Step;

/// One step of a run, with live status and its dependents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTreeNode {
    pub step: Step,
    pub state: RunNodeState,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub complete_time: Option<chrono::DateTime<chrono::Utc>>,
    pub job: JobRef,
    pub children: RunTreeChildren,
}

impl RunTreeNode {
    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children.nodes.iter().map(RunTreeNode::node_count).sum::<usize>()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.nodes.is_empty()
    }

    /// Depth-first search for the first node with the given step name
    pub fn find(&self, step_name: &str) -> Option<&RunTreeNode> {
        if self.step.name == step_name {
            return Some(self);
        }
        self.children.nodes.iter().find_map(|c| c.find(step_name))
    }
}

/// Status of a run tree node
///
/// A superset of job states: `Cancelled` is synthesized from an errored
/// job that had a cancellation requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunNodeState {
    Queued,
    Running,
    Success,
    Error,
    Cancelled,
}

/// Reference to a job by id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRef {
    pub id: Uuid,
}

/// Children of a node; always present, possibly empty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunTreeChildren {
    pub mode: ChildrenMode,
    pub nodes: Vec<RunTreeNode>,
}

impl Default for RunTreeChildren {
    fn default() -> Self {
        Self {
            mode: ChildrenMode::Serial,
            nodes: Vec::new(),
        }
    }
}

/// How children execute relative to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChildrenMode {
    Serial,
}
