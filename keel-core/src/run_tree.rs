//! Run tree construction
//!
//! Reassembles the flat job records of a pipeline run into a tree that
//! mirrors the step dependency graph, with live status at every node.

use std::collections::{HashMap, HashSet};

use crate::domain::job::Job;
use crate::domain::pipeline::Step;
use crate::domain::tree::{ChildrenMode, JobRef, RunTreeChildren, RunTreeNode};
use crate::error::RunTreeError;
use crate::projection::project;

/// Build the run tree for a set of jobs
///
/// Jobs that do not run a pipeline step are ignored. Exactly one remaining
/// job must have a step without dependencies; it becomes the root. Every
/// other job appears exactly once, under the first of its dependencies in
/// name order. Siblings are ordered by step name.
///
/// Any job that cannot be placed (dangling dependency, cycle, unreachable
/// from the root) fails the whole build instead of being dropped.
pub fn build_run_tree(jobs: &[Job]) -> Result<RunTreeNode, RunTreeError> {
    let mut entries: Vec<(&Job, &Step)> = jobs
        .iter()
        .filter_map(|job| job.pipeline_step().map(|op| (job, &op.step)))
        .collect();
    entries.sort_by(|a, b| a.1.name.cmp(&b.1.name).then(a.0.id.cmp(&b.0.id)));

    let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(entries.len());
    for (idx, (_, step)) in entries.iter().enumerate() {
        if by_name.insert(step.name.as_str(), idx).is_some() {
            return Err(RunTreeError::DuplicateStep(step.name.clone()));
        }
    }

    let roots: Vec<usize> = (0..entries.len())
        .filter(|&idx| entries[idx].1.is_root())
        .collect();
    let root = match roots.as_slice() {
        [] => {
            return Err(RunTreeError::NoRoot {
                jobs: entries.len(),
            });
        }
        [root] => *root,
        _ => {
            return Err(RunTreeError::MultipleRoots(
                roots.iter().map(|&idx| entries[idx].1.name.clone()).collect(),
            ));
        }
    };

    // Resolved dependencies and dependents per step. Entries are sorted by
    // name, so a lower index is an earlier name.
    let mut dependencies: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    for (idx, (_, step)) in entries.iter().enumerate() {
        let mut seen = HashSet::new();
        for dep in &step.depends_on {
            if !seen.insert(dep.as_str()) {
                continue;
            }
            let parent = *by_name
                .get(dep.as_str())
                .ok_or_else(|| RunTreeError::DanglingDependency {
                    step: step.name.clone(),
                    dependency: dep.clone(),
                })?;
            dependencies[idx].push(parent);
            dependents[parent].push(idx);
        }
    }

    let mut visit = vec![Visit::Unvisited; entries.len()];
    let mut path = Vec::new();
    if let Some(cycle) = find_cycle(&entries, &dependents, root, &mut visit, &mut path) {
        return Err(RunTreeError::Cycle(cycle));
    }

    let unreachable: Vec<String> = (0..entries.len())
        .filter(|&idx| visit[idx] != Visit::Done)
        .map(|idx| entries[idx].1.name.clone())
        .collect();
    if !unreachable.is_empty() {
        return Err(RunTreeError::Unreachable(unreachable));
    }

    // Every step other than the root hangs under its first dependency
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    for idx in (0..entries.len()).filter(|&idx| idx != root) {
        if let Some(&parent) = dependencies[idx].iter().min() {
            children[parent].push(idx);
        }
    }

    Ok(assemble(&entries, &children, root))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// Three-color depth-first search over dependents, starting at the root
///
/// Marks every step it reaches as done. Returns the first cycle found as a
/// closed path of step names.
fn find_cycle(
    entries: &[(&Job, &Step)],
    dependents: &[Vec<usize>],
    idx: usize,
    visit: &mut [Visit],
    path: &mut Vec<usize>,
) -> Option<Vec<String>> {
    visit[idx] = Visit::InProgress;
    path.push(idx);

    for &child in &dependents[idx] {
        match visit[child] {
            Visit::InProgress => {
                let start = path.iter().position(|&p| p == child).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&p| entries[p].1.name.clone())
                    .collect();
                cycle.push(entries[child].1.name.clone());
                return Some(cycle);
            }
            Visit::Unvisited => {
                if let Some(cycle) = find_cycle(entries, dependents, child, visit, path) {
                    return Some(cycle);
                }
            }
            Visit::Done => {}
        }
    }

    path.pop();
    visit[idx] = Visit::Done;
    None
}

fn assemble(entries: &[(&Job, &Step)], children: &[Vec<usize>], idx: usize) -> RunTreeNode {
    let (job, step) = entries[idx];
    let projection = project(job);

    RunTreeNode {
        step: step.clone(),
        state: projection.state,
        start_time: projection.start_time,
        complete_time: projection.complete_time,
        job: JobRef { id: job.id },
        children: RunTreeChildren {
            mode: ChildrenMode::Serial,
            nodes: children[idx]
                .iter()
                .map(|&child| assemble(entries, children, child))
                .collect(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::job::{JobOperation, JobState, PipelineStepOp};
    use crate::domain::pipeline::{ExecStep, Pipeline, PipelineOwner, StepKind};
    use crate::domain::tree::RunNodeState;
    use crate::validate::validate_pipeline;
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn echo_step(name: &str, depends_on: &[&str]) -> Step {
        Step {
            name: name.to_string(),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            kind: StepKind::Exec(ExecStep {
                image: "busybox".to_string(),
                command: Some("echo".to_string()),
                args: vec![name.to_string()],
            }),
        }
    }

    fn job(name: &str, depends_on: &[&str], state: JobState) -> Job {
        Job {
            id: Uuid::new_v4(),
            operation: JobOperation::PipelineStep(PipelineStepOp {
                pipeline_id: Uuid::nil(),
                run_sequence: 1,
                step: echo_step(name, depends_on),
            }),
            state,
            queue_time: ts("2023-01-01T12:59:00Z"),
            ack_time: None,
            complete_time: None,
            cancel_time: None,
            error: None,
        }
    }

    fn names(node: &RunTreeNode) -> Vec<&str> {
        node.children
            .nodes
            .iter()
            .map(|c| c.step.name.as_str())
            .collect()
    }

    #[test]
    fn test_one_queued_step() {
        let j = job("hello", &[], JobState::Queued);
        let tree = build_run_tree(std::slice::from_ref(&j)).unwrap();

        assert_eq!(
            tree,
            RunTreeNode {
                step: echo_step("hello", &[]),
                state: RunNodeState::Queued,
                start_time: None,
                complete_time: None,
                job: JobRef { id: j.id },
                children: RunTreeChildren {
                    mode: ChildrenMode::Serial,
                    nodes: vec![],
                },
            }
        );
    }

    #[test]
    fn test_single_step_states() {
        let ack = ts("2023-01-01T13:00:00Z");
        let cancel = ts("2023-01-01T13:08:00Z");
        let done = ts("2023-01-01T13:10:00Z");

        let cases = [
            (JobState::Running, Some(ack), None, None, RunNodeState::Running),
            (JobState::Success, Some(ack), Some(done), None, RunNodeState::Success),
            (JobState::Error, Some(ack), Some(done), None, RunNodeState::Error),
            (
                JobState::Error,
                Some(ack),
                Some(done),
                Some(cancel),
                RunNodeState::Cancelled,
            ),
        ];

        for (state, ack_time, complete_time, cancel_time, expected) in cases {
            let mut j = job("hello", &[], state);
            j.ack_time = ack_time;
            j.complete_time = complete_time;
            j.cancel_time = cancel_time;

            let tree = build_run_tree(&[j]).unwrap();
            assert_eq!(tree.state, expected);
            assert_eq!(tree.start_time, ack_time);
            assert_eq!(tree.complete_time, complete_time);
            assert!(tree.is_leaf());
        }
    }

    #[test]
    fn test_running_step_with_queued_child() {
        let mut hello = job("hello", &[], JobState::Running);
        hello.ack_time = Some(ts("2023-01-01T13:00:00Z"));
        let bye = job("bye", &["hello"], JobState::Queued);

        let tree = build_run_tree(&[bye.clone(), hello.clone()]).unwrap();

        assert_eq!(tree.step.name, "hello");
        assert_eq!(tree.state, RunNodeState::Running);
        assert_eq!(tree.start_time, Some(ts("2023-01-01T13:00:00Z")));
        assert_eq!(tree.job.id, hello.id);
        assert_eq!(tree.children.nodes.len(), 1);

        let child = &tree.children.nodes[0];
        assert_eq!(child.step, echo_step("bye", &["hello"]));
        assert_eq!(child.state, RunNodeState::Queued);
        assert_eq!(child.job.id, bye.id);
        assert_eq!(child.children.mode, ChildrenMode::Serial);
        assert!(child.children.nodes.is_empty());
    }

    #[test]
    fn test_siblings_ordered_by_name() {
        let jobs = vec![
            job("root", &[], JobState::Success),
            job("zeta", &["root"], JobState::Queued),
            job("alpha", &["root"], JobState::Queued),
            job("mid", &["root"], JobState::Running),
        ];

        let tree = build_run_tree(&jobs).unwrap();
        assert_eq!(names(&tree), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_idempotent_regardless_of_input_order() {
        let jobs = vec![
            job("root", &[], JobState::Success),
            job("b", &["root"], JobState::Running),
            job("a", &["root"], JobState::Queued),
            job("c", &["a", "b"], JobState::Queued),
        ];
        let mut reversed = jobs.clone();
        reversed.reverse();

        let first = build_run_tree(&jobs).unwrap();
        let second = build_run_tree(&jobs).unwrap();
        let third = build_run_tree(&reversed).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, third);
    }

    #[test]
    fn test_multi_parent_step_under_first_parent() {
        let jobs = vec![
            job("root", &[], JobState::Success),
            job("left", &["root"], JobState::Success),
            job("right", &["root"], JobState::Success),
            job("join", &["right", "left", "right"], JobState::Queued),
        ];

        let tree = build_run_tree(&jobs).unwrap();
        assert_eq!(names(&tree), vec!["left", "right"]);
        assert_eq!(names(&tree.children.nodes[0]), vec!["join"]);
        assert!(tree.children.nodes[1].is_leaf());
        assert_eq!(tree.node_count(), 4);
    }

    fn collect_names<'a>(node: &'a RunTreeNode, out: &mut Vec<&'a str>) {
        out.push(node.step.name.as_str());
        for child in &node.children.nodes {
            collect_names(child, out);
        }
    }

    #[test]
    fn test_ladder_of_joins_stays_linear() {
        // Each level has two steps depending on both steps of the level above
        let mut steps = vec![echo_step("root", &[])];
        for level in 1..=30 {
            let above: Vec<String> = if level == 1 {
                vec!["root".to_string()]
            } else {
                vec![format!("l{:02}a", level - 1), format!("l{:02}b", level - 1)]
            };
            let above: Vec<&str> = above.iter().map(String::as_str).collect();
            for side in ["a", "b"] {
                steps.push(echo_step(&format!("l{level:02}{side}"), &above));
            }
        }

        let pipeline = Pipeline {
            id: Uuid::nil(),
            name: "ladder".to_string(),
            owner: Some(PipelineOwner::project("web")),
            steps: steps.iter().map(|s| (s.name.clone(), s.clone())).collect(),
        };
        assert!(validate_pipeline(&pipeline).is_ok());

        let jobs: Vec<Job> = steps
            .iter()
            .map(|s| {
                let deps: Vec<&str> = s.depends_on.iter().map(String::as_str).collect();
                job(&s.name, &deps, JobState::Queued)
            })
            .collect();

        let tree = build_run_tree(&jobs).unwrap();
        assert_eq!(tree.node_count(), 61);

        let mut seen = Vec::new();
        collect_names(&tree, &mut seen);
        seen.sort_unstable();
        let mut expected: Vec<&str> = steps.iter().map(|s| s.name.as_str()).collect();
        expected.sort_unstable();
        assert_eq!(seen, expected);

        let l05a = tree.find("l05a").unwrap();
        assert_eq!(names(l05a), vec!["l06a", "l06b"]);
        assert!(tree.find("l05b").unwrap().is_leaf());
    }

    #[test]
    fn test_join_with_unreachable_parent() {
        let jobs = vec![
            job("root", &[], JobState::Success),
            job("b", &["root"], JobState::Success),
            job("a", &["x"], JobState::Queued),
            job("x", &["a"], JobState::Queued),
            job("join", &["a", "b"], JobState::Queued),
        ];
        assert_eq!(
            build_run_tree(&jobs),
            Err(RunTreeError::Unreachable(vec![
                "a".to_string(),
                "x".to_string()
            ]))
        );
    }

    #[test]
    fn test_non_pipeline_jobs_ignored() {
        let mut noop = job("ignored", &[], JobState::Running);
        noop.operation = JobOperation::Noop;
        let jobs = vec![noop, job("hello", &[], JobState::Queued)];

        let tree = build_run_tree(&jobs).unwrap();
        assert_eq!(tree.step.name, "hello");
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_empty_input_has_no_root() {
        assert_eq!(build_run_tree(&[]), Err(RunTreeError::NoRoot { jobs: 0 }));
    }

    #[test]
    fn test_no_root() {
        let jobs = vec![job("a", &["b"], JobState::Queued), job("b", &["a"], JobState::Queued)];
        assert_eq!(build_run_tree(&jobs), Err(RunTreeError::NoRoot { jobs: 2 }));
    }

    #[test]
    fn test_multiple_roots() {
        let jobs = vec![job("two", &[], JobState::Queued), job("one", &[], JobState::Queued)];
        assert_eq!(
            build_run_tree(&jobs),
            Err(RunTreeError::MultipleRoots(vec![
                "one".to_string(),
                "two".to_string()
            ]))
        );
    }

    #[test]
    fn test_duplicate_step() {
        let jobs = vec![
            job("root", &[], JobState::Queued),
            job("build", &["root"], JobState::Error),
            job("build", &["root"], JobState::Queued),
        ];
        assert_eq!(
            build_run_tree(&jobs),
            Err(RunTreeError::DuplicateStep("build".to_string()))
        );
    }

    #[test]
    fn test_dangling_dependency() {
        let jobs = vec![
            job("root", &[], JobState::Success),
            job("deploy", &["build"], JobState::Queued),
        ];
        assert_eq!(
            build_run_tree(&jobs),
            Err(RunTreeError::DanglingDependency {
                step: "deploy".to_string(),
                dependency: "build".to_string(),
            })
        );
    }

    #[test]
    fn test_cycle_off_the_root_is_unreachable() {
        let jobs = vec![
            job("root", &[], JobState::Success),
            job("A", &["B"], JobState::Queued),
            job("B", &["A"], JobState::Queued),
        ];
        assert_eq!(
            build_run_tree(&jobs),
            Err(RunTreeError::Unreachable(vec![
                "A".to_string(),
                "B".to_string()
            ]))
        );
    }

    #[test]
    fn test_cycle_below_the_root() {
        let jobs = vec![
            job("root", &[], JobState::Success),
            job("a", &["root", "c"], JobState::Queued),
            job("b", &["a"], JobState::Queued),
            job("c", &["b"], JobState::Queued),
        ];
        assert_eq!(
            build_run_tree(&jobs),
            Err(RunTreeError::Cycle(vec![
                "a".to_string(),
                "b".to_string(),
                "c".to_string(),
                "a".to_string()
            ]))
        );
    }
}
