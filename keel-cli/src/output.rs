//! Terminal rendering for pipelines, jobs and run trees

use colored::*;
use keel_core::domain::job::{Job, JobState};
use keel_core::domain::pipeline::{Pipeline, PipelineRunState, Step, StepKind};
use keel_core::domain::tree::{RunNodeState, RunTreeNode};
use keel_core::dto::pipeline::PipelineBundle;

pub fn node_state(state: RunNodeState) -> ColoredString {
    match state {
        RunNodeState::Queued => "queued".dimmed(),
        RunNodeState::Running => "running".blue(),
        RunNodeState::Success => "success".green(),
        RunNodeState::Error => "error".red(),
        RunNodeState::Cancelled => "cancelled".yellow(),
    }
}

pub fn run_state(state: PipelineRunState) -> ColoredString {
    match state {
        PipelineRunState::Pending => "pending".dimmed(),
        PipelineRunState::Running => "running".blue(),
        PipelineRunState::Success => "success".green(),
        PipelineRunState::Error => "error".red(),
        PipelineRunState::Cancelled => "cancelled".yellow(),
    }
}

pub fn job_state(job: &Job) -> ColoredString {
    match job.state {
        JobState::Queued => "queued".dimmed(),
        JobState::Running => "running".blue(),
        JobState::Success => "success".green(),
        JobState::Error if job.cancel_time.is_some() => "cancelled".yellow(),
        JobState::Error => "error".red(),
    }
}

/// Render a run tree, one node per line
///
/// ```text
/// build [success] 12s
/// ├── test [running]
/// └── lint [queued]
/// ```
pub fn render_tree(root: &RunTreeNode) -> String {
    let mut out = String::new();
    out.push_str(&node_line(root));
    out.push('\n');
    render_children(root, "", &mut out);
    out
}

fn render_children(node: &RunTreeNode, prefix: &str, out: &mut String) {
    let count = node.children.nodes.len();
    for (i, child) in node.children.nodes.iter().enumerate() {
        let last = i + 1 == count;
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };

        out.push_str(prefix);
        out.push_str(branch);
        out.push_str(&node_line(child));
        out.push('\n');

        render_children(child, &format!("{prefix}{indent}"), out);
    }
}

fn node_line(node: &RunTreeNode) -> String {
    let mut line = format!("{} [{}]", node.step.name.bold(), node_state(node.state));

    if let (Some(start), Some(end)) = (node.start_time, node.complete_time) {
        let secs = (end - start).num_seconds().max(0);
        line.push_str(&format!(" {}", format!("{secs}s").dimmed()));
    }

    line
}

fn step_line(step: &Step) -> String {
    let detail = match &step.kind {
        StepKind::Exec(exec) => {
            let mut parts = vec![exec.image.clone()];
            parts.extend(exec.command.iter().cloned());
            parts.extend(exec.args.iter().cloned());
            parts.join(" ")
        }
        _ => String::new(),
    };

    let deps = if step.depends_on.is_empty() {
        "root".to_string()
    } else {
        format!("after {}", step.depends_on.join(", "))
    };

    format!(
        "{} {} {} {}",
        step.name.cyan(),
        step.kind.label().bold(),
        detail,
        format!("({deps})").dimmed()
    )
}

pub fn print_pipeline_summary(bundle: &PipelineBundle) {
    let pipeline = &bundle.pipeline;
    let last = match &bundle.last_run {
        Some(last) => format!("#{} {}", last.run.sequence, run_state(last.run.state)),
        None => "never run".dimmed().to_string(),
    };

    println!(
        "  {} {} {}",
        pipeline.id.to_string()[..8].cyan(),
        pipeline.name.bold(),
        format!("({})", pipeline.project().unwrap_or("-")).dimmed()
    );
    println!("    Runs: {}  Last: {}", bundle.total_runs, last);
}

pub fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details".bold().underline());
    println!("  ID:      {}", pipeline.id.to_string().cyan());
    println!("  Name:    {}", pipeline.name.bold());
    println!("  Project: {}", pipeline.project().unwrap_or("-"));
    println!("  Steps:");
    for step in pipeline.steps.values() {
        println!("    - {}", step_line(step));
    }
}

pub fn print_job_details(job: &Job) {
    println!("{}", "Job Details".bold().underline());
    println!("  ID:        {}", job.id.to_string().cyan());
    println!("  State:     {}", job_state(job));

    if let Some(op) = job.pipeline_step() {
        println!("  Pipeline:  {}", op.pipeline_id);
        println!("  Run:       #{}", op.run_sequence);
        println!("  Step:      {}", step_line(&op.step));
    }

    println!(
        "  Queued:    {}",
        job.queue_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    for (label, time) in [
        ("Acked:    ", job.ack_time),
        ("Completed:", job.complete_time),
        ("Cancelled:", job.cancel_time),
    ] {
        if let Some(time) = time {
            println!("  {} {}", label, time.format("%Y-%m-%d %H:%M:%S UTC"));
        }
    }

    if let Some(error) = &job.error {
        println!("  Error:     {}", error.red());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::domain::pipeline::BuildStep;
    use keel_core::domain::tree::{JobRef, RunTreeChildren};
    use uuid::Uuid;

    fn node(name: &str, state: RunNodeState, children: Vec<RunTreeNode>) -> RunTreeNode {
        RunTreeNode {
            step: Step {
                name: name.to_string(),
                depends_on: Vec::new(),
                kind: StepKind::Build(BuildStep::default()),
            },
            state,
            start_time: None,
            complete_time: None,
            job: JobRef { id: Uuid::new_v4() },
            children: RunTreeChildren {
                nodes: children,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_render_tree_layout() {
        colored::control::set_override(false);

        let tree = node(
            "build",
            RunNodeState::Success,
            vec![
                node(
                    "deploy",
                    RunNodeState::Running,
                    vec![node("smoke", RunNodeState::Queued, vec![])],
                ),
                node("lint", RunNodeState::Cancelled, vec![]),
            ],
        );

        let expected = "\
build [success]
├── deploy [running]
│   └── smoke [queued]
└── lint [cancelled]
";
        assert_eq!(render_tree(&tree), expected);
    }

    #[test]
    fn test_render_duration() {
        colored::control::set_override(false);

        let mut root = node("build", RunNodeState::Success, vec![]);
        let start = chrono::Utc::now();
        root.start_time = Some(start);
        root.complete_time = Some(start + chrono::Duration::seconds(42));

        assert_eq!(render_tree(&root), "build [success] 42s\n");
    }
}
