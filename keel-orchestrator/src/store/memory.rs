//! In-memory state store
//!
//! Used when no database is configured, and by the service tests.

use async_trait::async_trait;
use keel_core::domain::job::Job;
use keel_core::domain::pipeline::{Pipeline, PipelineRun};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Result, StateStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    pipelines: HashMap<Uuid, Pipeline>,
    /// Runs per pipeline, keyed by sequence
    runs: HashMap<Uuid, BTreeMap<u64, PipelineRun>>,
    jobs: HashMap<Uuid, Job>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn pipeline_put(&self, pipeline: &Pipeline) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.pipelines.insert(pipeline.id, pipeline.clone());
        Ok(())
    }

    async fn pipeline_get(&self, id: Uuid) -> Result<Option<Pipeline>> {
        let inner = self.inner.read().await;
        Ok(inner.pipelines.get(&id).cloned())
    }

    async fn pipeline_get_by_name(&self, project: &str, name: &str) -> Result<Option<Pipeline>> {
        let inner = self.inner.read().await;
        Ok(inner
            .pipelines
            .values()
            .find(|p| p.project() == Some(project) && p.name == name)
            .cloned())
    }

    async fn pipeline_list(&self, project: Option<&str>) -> Result<Vec<Pipeline>> {
        let inner = self.inner.read().await;
        let mut pipelines: Vec<Pipeline> = inner
            .pipelines
            .values()
            .filter(|p| project.is_none() || p.project() == project)
            .cloned()
            .collect();
        pipelines.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(pipelines)
    }

    async fn pipeline_delete(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.pipelines.remove(&id).is_none() {
            return Ok(false);
        }

        inner.runs.remove(&id);
        inner
            .jobs
            .retain(|_, job| job.pipeline_step().is_none_or(|op| op.pipeline_id != id));

        Ok(true)
    }

    async fn pipeline_run_create(&self, run: &PipelineRun) -> Result<bool> {
        let mut inner = self.inner.write().await;
        match inner.runs.entry(run.pipeline_id).or_default().entry(run.sequence) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(run.clone());
                Ok(true)
            }
        }
    }

    async fn pipeline_run_put(&self, run: &PipelineRun) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner
            .runs
            .entry(run.pipeline_id)
            .or_default()
            .insert(run.sequence, run.clone());
        Ok(())
    }

    async fn pipeline_run_list(&self, pipeline_id: Uuid) -> Result<Vec<PipelineRun>> {
        let inner = self.inner.read().await;
        Ok(inner
            .runs
            .get(&pipeline_id)
            .map(|runs| runs.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn pipeline_run_get(
        &self,
        pipeline_id: Uuid,
        sequence: u64,
    ) -> Result<Option<PipelineRun>> {
        let inner = self.inner.read().await;
        Ok(inner
            .runs
            .get(&pipeline_id)
            .and_then(|runs| runs.get(&sequence))
            .cloned())
    }

    async fn pipeline_run_get_latest(&self, pipeline_id: Uuid) -> Result<Option<PipelineRun>> {
        let inner = self.inner.read().await;
        Ok(inner
            .runs
            .get(&pipeline_id)
            .and_then(|runs| runs.values().next_back())
            .cloned())
    }

    async fn job_put(&self, job: &Job) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn job_get(&self, id: Uuid) -> Result<Option<Job>> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.get(&id).cloned())
    }

    async fn jobs_for_run(&self, pipeline_id: Uuid, sequence: u64) -> Result<Vec<Job>> {
        let inner = self.inner.read().await;
        let Some(run) = inner.runs.get(&pipeline_id).and_then(|r| r.get(&sequence)) else {
            return Ok(Vec::new());
        };

        Ok(run
            .jobs
            .iter()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::domain::job::{JobOperation, JobState, PipelineStepOp};
    use keel_core::domain::pipeline::{PipelineOwner, PipelineRunState, Step, StepKind};

    fn pipeline(project: &str, name: &str) -> Pipeline {
        Pipeline {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner: Some(PipelineOwner::project(project)),
            steps: Default::default(),
        }
    }

    fn run(pipeline_id: Uuid, sequence: u64) -> PipelineRun {
        PipelineRun {
            id: Uuid::new_v4(),
            pipeline_id,
            sequence,
            state: PipelineRunState::Pending,
            jobs: vec![],
            created_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_pipeline_lookup_by_project_and_name() {
        let store = MemoryStore::new();
        let web = pipeline("web", "deploy");
        let api = pipeline("api", "deploy");
        store.pipeline_put(&web).await.unwrap();
        store.pipeline_put(&api).await.unwrap();

        let found = store.pipeline_get_by_name("api", "deploy").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(api.id));

        assert_eq!(store.pipeline_list(Some("web")).await.unwrap().len(), 1);
        assert_eq!(store.pipeline_list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_latest_run_absent_then_highest_sequence() {
        let store = MemoryStore::new();
        let p = pipeline("web", "deploy");
        store.pipeline_put(&p).await.unwrap();

        assert!(store.pipeline_run_get_latest(p.id).await.unwrap().is_none());

        store.pipeline_run_put(&run(p.id, 2)).await.unwrap();
        store.pipeline_run_put(&run(p.id, 1)).await.unwrap();

        let latest = store.pipeline_run_get_latest(p.id).await.unwrap().unwrap();
        assert_eq!(latest.sequence, 2);

        let sequences: Vec<u64> = store
            .pipeline_run_list(p.id)
            .await
            .unwrap()
            .iter()
            .map(|r| r.sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_create_run_refuses_taken_sequence() {
        let store = MemoryStore::new();
        let p = pipeline("web", "deploy");
        store.pipeline_put(&p).await.unwrap();

        let first = run(p.id, 1);
        assert!(store.pipeline_run_create(&first).await.unwrap());
        assert!(!store.pipeline_run_create(&run(p.id, 1)).await.unwrap());

        let stored = store.pipeline_run_get(p.id, 1).await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert!(store.pipeline_run_create(&run(p.id, 2)).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_drops_jobs_outside_any_run() {
        let store = MemoryStore::new();
        let p = pipeline("web", "deploy");
        store.pipeline_put(&p).await.unwrap();

        let orphan = Job {
            id: Uuid::new_v4(),
            operation: JobOperation::PipelineStep(PipelineStepOp {
                pipeline_id: p.id,
                run_sequence: 7,
                step: Step {
                    name: "build".to_string(),
                    depends_on: Vec::new(),
                    kind: StepKind::Up,
                },
            }),
            state: JobState::Queued,
            queue_time: chrono::Utc::now(),
            ack_time: None,
            complete_time: None,
            cancel_time: None,
            error: None,
        };
        let unrelated = Job {
            id: Uuid::new_v4(),
            operation: JobOperation::Noop,
            ..orphan.clone()
        };
        store.job_put(&orphan).await.unwrap();
        store.job_put(&unrelated).await.unwrap();

        assert!(store.pipeline_delete(p.id).await.unwrap());
        assert!(store.job_get(orphan.id).await.unwrap().is_none());
        assert!(store.job_get(unrelated.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_pipeline() {
        let store = MemoryStore::new();
        assert!(!store.pipeline_delete(Uuid::new_v4()).await.unwrap());
    }
}
