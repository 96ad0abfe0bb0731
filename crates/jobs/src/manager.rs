//! The job manager: lifecycle, concurrency, orchestration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pipewright_core::{
    Job, JobEvent, JobEventKind, JobFilter, JobId, JobMetrics, JobResult, JobSpec, JobStatus,
    LoadSummary, QualityReport,
};
use pipewright_etl::{Extractor, Loader, Transformer};
use pipewright_quality::QualityChecker;
use pipewright_storage::JobStore;
use tokio::sync::{broadcast, Mutex};

use crate::error::{JobError, StageError};

/// Error message recorded on cancelled jobs.
const CANCEL_MESSAGE: &str = "job cancelled";

/// Capacity of the lifecycle event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Manager configuration.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Maximum number of jobs that may run concurrently.
    pub max_concurrent_jobs: usize,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 3,
        }
    }
}

/// In-memory manager state: the job map plus the in-flight set used to
/// enforce the concurrency cap.
struct ManagerState {
    jobs: HashMap<JobId, Job>,
    running: HashSet<JobId>,
}

/// Owns job lifecycle and drives extract, transform, quality check,
/// and load per execution.
///
/// All methods take `&self`; the manager is shared behind an `Arc`
/// when executions run concurrently.
pub struct JobManager<S: JobStore> {
    store: Arc<Mutex<S>>,
    state: Mutex<ManagerState>,
    events: broadcast::Sender<JobEvent>,
    config: ManagerConfig,
    extractor: Extractor,
    transformer: Transformer,
    checker: QualityChecker,
    loader: Loader,
}

impl<S: JobStore> JobManager<S> {
    /// Create a manager, reloading every persisted job into memory.
    pub async fn new(store: S, config: ManagerConfig) -> Result<Self, JobError> {
        let jobs: HashMap<JobId, Job> = store
            .list_jobs()
            .await?
            .into_iter()
            .map(|job| (job.id, job))
            .collect();
        tracing::info!(jobs = jobs.len(), "job manager started");

        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            state: Mutex::new(ManagerState {
                jobs,
                running: HashSet::new(),
            }),
            events,
            config,
            extractor: Extractor::new(),
            transformer: Transformer::new(),
            checker: QualityChecker::default(),
            loader: Loader::new(),
        })
    }

    /// Replace the default extractor (e.g. to register a connector).
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Replace the default loader (e.g. to register a connector).
    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = loader;
        self
    }

    /// Replace the default quality checker (e.g. to change thresholds
    /// or register predicates).
    pub fn with_quality_checker(mut self, checker: QualityChecker) -> Self {
        self.checker = checker;
        self
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.events.subscribe()
    }

    /// Validate a spec and create a pending job, persisting it
    /// immediately. Invalid specs are never persisted.
    pub async fn create_job(&self, spec: JobSpec) -> Result<Job, JobError> {
        spec.validate()
            .map_err(|violations| JobError::Validation { violations })?;

        let job = Job::from_spec(spec);
        self.persist(&job).await?;
        self.state.lock().await.jobs.insert(job.id, job.clone());
        tracing::info!(job_id = %job.id, name = %job.name, "job created");
        self.emit(JobEvent::now(job.id, JobEventKind::Created));
        Ok(job)
    }

    /// Execute a job: extract, transform, quality-check, load.
    ///
    /// Fails fast with [`JobError::AlreadyRunning`] or
    /// [`JobError::ConcurrencyLimit`] without changing state. On a
    /// stage failure the job is flipped to `failed` and persisted
    /// before the error is returned.
    pub async fn execute_job(&self, id: JobId) -> Result<Job, JobError> {
        // Admission: validate and mark in-flight atomically.
        let snapshot = {
            let mut state = self.state.lock().await;
            let state = &mut *state;
            let running_count = state.running.len();
            let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
            if job.status == JobStatus::Running {
                return Err(JobError::AlreadyRunning(id));
            }
            if job.status == JobStatus::Paused {
                return Err(JobError::InvalidTransition {
                    id,
                    status: job.status,
                    action: "executed",
                });
            }
            if running_count >= self.config.max_concurrent_jobs {
                return Err(JobError::ConcurrencyLimit {
                    limit: self.config.max_concurrent_jobs,
                });
            }

            let now = chrono::Utc::now();
            job.status = JobStatus::Running;
            job.error = None;
            job.result = None;
            job.metrics = JobMetrics {
                started_at: Some(now),
                ..JobMetrics::default()
            };
            job.updated_at = now;
            state.running.insert(id);
            job.clone()
        };

        if let Err(e) = self.persist(&snapshot).await {
            // Admission could not be recorded; roll it back.
            let mut state = self.state.lock().await;
            state.running.remove(&id);
            if let Some(job) = state.jobs.get_mut(&id) {
                job.status = JobStatus::Pending;
            }
            return Err(e);
        }
        tracing::info!(job_id = %id, "job started");
        self.emit(JobEvent::now(id, JobEventKind::Started));

        let mut extracted = 0;
        let outcome = self.run_pipeline(&snapshot, &mut extracted).await;
        self.finalize(id, extracted, outcome).await
    }

    /// Run the four stages without holding any lock. `extracted` is set
    /// as soon as extraction succeeds, even when a later stage fails.
    async fn run_pipeline(
        &self,
        job: &Job,
        extracted: &mut u64,
    ) -> Result<PipelineOutcome, StageError> {
        let records = self.extractor.extract(&job.source).await?;
        *extracted = records.len() as u64;
        tracing::debug!(job_id = %job.id, extracted = *extracted, "extraction finished");

        let transformed = self
            .transformer
            .transform(records, &job.transformations)?;
        let transformed_count = transformed.len() as u64;
        tracing::debug!(job_id = %job.id, count = transformed_count, "transformation finished");

        let quality = self.checker.perform_checks(&transformed, &job.quality_rules);
        let load = self.loader.load(&transformed, &job.target).await?;

        Ok(PipelineOutcome {
            extracted: *extracted,
            transformed: transformed_count,
            load,
            quality,
        })
    }

    /// Record the outcome of an execution. `total_records` is set from
    /// the extracted count on success and failure alike. A pause or
    /// cancel issued while the pipeline ran takes precedence: the
    /// outcome is discarded and the job keeps its pause/cancel state.
    async fn finalize(
        &self,
        id: JobId,
        extracted: u64,
        outcome: Result<PipelineOutcome, StageError>,
    ) -> Result<Job, JobError> {
        let now = chrono::Utc::now();
        let (job, stage_error) = {
            let mut state = self.state.lock().await;
            state.running.remove(&id);
            let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;

            if job.status != JobStatus::Running {
                tracing::warn!(job_id = %id, status = %job.status, "discarding execution outcome after status change");
                return Ok(job.clone());
            }

            job.metrics.total_records = extracted;
            let mut stage_error = None;
            match outcome {
                Ok(outcome) => {
                    job.status = JobStatus::Completed;
                    job.metrics.processed_records = outcome.load.success_count;
                    job.metrics.error_records = outcome.load.error_count;
                    job.result = Some(JobResult {
                        extracted: outcome.extracted,
                        transformed: outcome.transformed,
                        load: outcome.load,
                        quality: outcome.quality,
                    });
                }
                Err(e) => {
                    job.status = JobStatus::Failed;
                    job.error = Some(e.to_string());
                    stage_error = Some(e);
                }
            }
            job.metrics.finished_at = Some(now);
            job.metrics.duration_ms = job
                .metrics
                .started_at
                .map(|started| (now - started).num_milliseconds());
            job.updated_at = now;
            (job.clone(), stage_error)
        };

        self.persist(&job).await?;
        match stage_error {
            None => {
                tracing::info!(job_id = %id, "job completed");
                self.emit(JobEvent::now(id, JobEventKind::Completed));
                Ok(job)
            }
            Some(source) => {
                tracing::warn!(job_id = %id, error = %source, "job failed");
                self.emit(
                    JobEvent::now(id, JobEventKind::Failed).with_message(source.to_string()),
                );
                Err(JobError::ExecutionFailed { job_id: id, source })
            }
        }
    }

    /// Pause a running job. Does not interrupt in-flight stage I/O;
    /// the execution's outcome is discarded when it finishes.
    pub async fn pause_job(&self, id: JobId) -> Result<Job, JobError> {
        let job = self
            .transition(id, "paused", &[JobStatus::Running], JobStatus::Paused, None)
            .await?;
        self.emit(JobEvent::now(id, JobEventKind::Paused));
        Ok(job)
    }

    /// Resume a paused job back to pending; it can then be executed
    /// again from the start.
    pub async fn resume_job(&self, id: JobId) -> Result<Job, JobError> {
        let job = self
            .transition(id, "resumed", &[JobStatus::Paused], JobStatus::Pending, None)
            .await?;
        self.emit(JobEvent::now(id, JobEventKind::Resumed));
        Ok(job)
    }

    /// Cancel a job: a forced transition to `failed` with a fixed
    /// error message. Completed and already-failed jobs cannot be
    /// cancelled.
    pub async fn cancel_job(&self, id: JobId) -> Result<Job, JobError> {
        let job = self
            .transition(
                id,
                "cancelled",
                &[JobStatus::Pending, JobStatus::Running, JobStatus::Paused],
                JobStatus::Failed,
                Some(CANCEL_MESSAGE),
            )
            .await?;
        self.emit(JobEvent::now(id, JobEventKind::Cancelled));
        Ok(job)
    }

    /// Delete a job that is not currently executing.
    pub async fn delete_job(&self, id: JobId) -> Result<(), JobError> {
        {
            let mut state = self.state.lock().await;
            let job = state.jobs.get(&id).ok_or(JobError::NotFound(id))?;
            if job.status == JobStatus::Running || state.running.contains(&id) {
                return Err(JobError::InvalidTransition {
                    id,
                    status: JobStatus::Running,
                    action: "deleted",
                });
            }
            state.jobs.remove(&id);
        }
        self.store.lock().await.delete_job(id).await?;
        self.emit(JobEvent::now(id, JobEventKind::Deleted));
        Ok(())
    }

    /// Look up a job by id.
    pub async fn get_job(&self, id: JobId) -> Option<Job> {
        self.state.lock().await.jobs.get(&id).cloned()
    }

    /// List jobs matching the filter, newest first.
    pub async fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        let state = self.state.lock().await;
        let mut jobs: Vec<Job> = state
            .jobs
            .values()
            .filter(|job| filter.matches(job))
            .cloned()
            .collect();
        jobs.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        jobs
    }

    /// Validated status transition, persisted before returning.
    async fn transition(
        &self,
        id: JobId,
        action: &'static str,
        allowed_from: &[JobStatus],
        to: JobStatus,
        error_message: Option<&str>,
    ) -> Result<Job, JobError> {
        let job = {
            let mut state = self.state.lock().await;
            let job = state.jobs.get_mut(&id).ok_or(JobError::NotFound(id))?;
            if !allowed_from.contains(&job.status) {
                return Err(JobError::InvalidTransition {
                    id,
                    status: job.status,
                    action,
                });
            }
            job.status = to;
            if let Some(message) = error_message {
                job.error = Some(message.to_string());
            }
            job.updated_at = chrono::Utc::now();
            job.clone()
        };
        self.persist(&job).await?;
        tracing::info!(job_id = %id, status = %to, "job {}", action);
        Ok(job)
    }

    async fn persist(&self, job: &Job) -> Result<(), JobError> {
        self.store.lock().await.save_job(job).await?;
        Ok(())
    }

    fn emit(&self, event: JobEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }
}

/// What one pipeline run produced.
struct PipelineOutcome {
    extracted: u64,
    transformed: u64,
    load: LoadSummary,
    quality: QualityReport,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipewright_storage::{JsonFileStore, MemoryStore};
    use serde_json::json;
    use std::io::Write;

    async fn memory_manager() -> JobManager<MemoryStore> {
        JobManager::new(MemoryStore::new(), ManagerConfig::default())
            .await
            .unwrap()
    }

    fn file_spec(input: &std::path::Path, output: &std::path::Path) -> JobSpec {
        JobSpec::from_value(json!({
            "name": "etl",
            "source": {"type": "json_file", "config": {"path": input}},
            "target": {"type": "json_file", "config": {"path": output}},
            "transformations": [
                {"type": "filter", "config": {"field": "status", "operator": "equals", "value": "active"}}
            ]
        }))
        .unwrap()
    }

    fn write_input(dir: &std::path::Path) -> std::path::PathBuf {
        let input = dir.join("in.json");
        let mut file = std::fs::File::create(&input).unwrap();
        write!(
            file,
            r#"[{{"status":"active","id":1}},{{"status":"inactive","id":2}},{{"status":"active","id":3}}]"#
        )
        .unwrap();
        input
    }

    #[tokio::test]
    async fn invalid_spec_is_rejected_and_not_persisted() {
        let manager = memory_manager().await;
        let spec = JobSpec {
            name: String::new(),
            description: None,
            source: serde_json::from_value(json!({"type": "json_file", "config": {}})).unwrap(),
            target: serde_json::from_value(json!({"type": "json_file", "config": {}})).unwrap(),
            transformations: Vec::new(),
            schedule: None,
            quality_rules: Default::default(),
        };
        let err = manager.create_job(spec).await.unwrap_err();
        assert!(matches!(err, JobError::Validation { .. }));
        assert!(manager.list_jobs(&JobFilter::default()).await.is_empty());
    }

    #[tokio::test]
    async fn execute_unknown_job_is_not_found() {
        let manager = memory_manager().await;
        let err = manager.execute_job(JobId::new()).await.unwrap_err();
        assert!(matches!(err, JobError::NotFound(_)));
    }

    #[tokio::test]
    async fn full_pipeline_filters_loads_and_reports() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.json");

        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();

        let job = manager.create_job(file_spec(&input, &output)).await.unwrap();
        let done = manager.execute_job(job.id).await.unwrap();

        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.metrics.total_records, 3);
        assert_eq!(done.metrics.processed_records, 2);
        assert_eq!(done.metrics.error_records, 0);
        let result = done.result.unwrap();
        assert_eq!(result.extracted, 3);
        assert_eq!(result.transformed, 2);
        assert_eq!(result.load.success_count, 2);
        assert_eq!(result.quality.total_records, 2);
        assert!(done.metrics.duration_ms.is_some());

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_extraction_flips_job_to_failed_and_reraises() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();

        let spec = file_spec(
            &dir.path().join("missing.json"),
            &dir.path().join("out.json"),
        );
        let job = manager.create_job(spec).await.unwrap();
        let err = manager.execute_job(job.id).await.unwrap_err();
        assert!(matches!(err, JobError::ExecutionFailed { .. }));

        let failed = manager.get_job(job.id).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.metrics.total_records, 0);
        assert!(failed.error.unwrap().contains("extraction failed"));
    }

    #[tokio::test]
    async fn failed_transform_keeps_the_extracted_count() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());

        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();

        // Aggregate without aggregations fails after extraction succeeds.
        let spec = JobSpec::from_value(json!({
            "name": "etl",
            "source": {"type": "json_file", "config": {"path": input}},
            "target": {"type": "json_file", "config": {"path": dir.path().join("out.json")}},
            "transformations": [
                {"type": "aggregate", "config": {"group_by": ["status"], "aggregations": []}}
            ]
        }))
        .unwrap();
        let job = manager.create_job(spec).await.unwrap();
        let err = manager.execute_job(job.id).await.unwrap_err();
        assert!(matches!(err, JobError::ExecutionFailed { .. }));

        let failed = manager.get_job(job.id).await.unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.metrics.total_records, 3);
        assert!(failed.error.unwrap().contains("transformation failed"));
    }

    #[tokio::test]
    async fn concurrent_execution_of_same_job_is_rejected_once() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.json");

        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();
        let job = manager.create_job(file_spec(&input, &output)).await.unwrap();

        let (first, second) = tokio::join!(manager.execute_job(job.id), manager.execute_job(job.id));
        assert_eq!(first.unwrap().status, JobStatus::Completed);
        assert!(matches!(second.unwrap_err(), JobError::AlreadyRunning(_)));
    }

    #[tokio::test]
    async fn concurrency_cap_fails_fast() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());

        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(
            store,
            ManagerConfig {
                max_concurrent_jobs: 1,
            },
        )
        .await
        .unwrap();

        let job1 = manager
            .create_job(file_spec(&input, &dir.path().join("out1.json")))
            .await
            .unwrap();
        let job2 = manager
            .create_job(file_spec(&input, &dir.path().join("out2.json")))
            .await
            .unwrap();

        let (first, second) =
            tokio::join!(manager.execute_job(job1.id), manager.execute_job(job2.id));
        assert!(first.is_ok());
        assert!(matches!(
            second.unwrap_err(),
            JobError::ConcurrencyLimit { limit: 1 }
        ));
    }

    #[tokio::test]
    async fn pause_requires_running_and_discards_the_inflight_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.json");

        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();
        let job = manager.create_job(file_spec(&input, &output)).await.unwrap();

        // Pausing a pending job is rejected.
        let err = manager.pause_job(job.id).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));

        // Pause lands while the execution is in flight; the execution's
        // outcome is discarded in favor of the paused status.
        let (executed, paused) = tokio::join!(manager.execute_job(job.id), manager.pause_job(job.id));
        assert!(paused.is_ok());
        assert_eq!(executed.unwrap().status, JobStatus::Paused);

        // Resume returns the job to pending; it can then run again.
        let resumed = manager.resume_job(job.id).await.unwrap();
        assert_eq!(resumed.status, JobStatus::Pending);
        let done = manager.execute_job(job.id).await.unwrap();
        assert_eq!(done.status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn cancel_policies() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.json");

        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();

        // Pending jobs can be cancelled; the cancel is a forced failure.
        let job = manager.create_job(file_spec(&input, &output)).await.unwrap();
        let cancelled = manager.cancel_job(job.id).await.unwrap();
        assert_eq!(cancelled.status, JobStatus::Failed);
        assert_eq!(cancelled.error.as_deref(), Some(CANCEL_MESSAGE));

        // Terminal jobs cannot be cancelled.
        let err = manager.cancel_job(job.id).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));

        let job = manager.create_job(file_spec(&input, &output)).await.unwrap();
        manager.execute_job(job.id).await.unwrap();
        let err = manager.cancel_job(job.id).await.unwrap_err();
        assert!(matches!(err, JobError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn jobs_reload_from_storage_on_startup() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.json");
        let data_dir = dir.path().join("data");

        let job_id = {
            let store = JsonFileStore::new(&data_dir).await.unwrap();
            let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();
            let job = manager.create_job(file_spec(&input, &output)).await.unwrap();
            manager.execute_job(job.id).await.unwrap();
            job.id
        };

        let store = JsonFileStore::new(&data_dir).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();
        let reloaded = manager.get_job(job_id).await.unwrap();
        assert_eq!(reloaded.status, JobStatus::Completed);
        assert_eq!(reloaded.metrics.total_records, 3);
        assert!(reloaded.result.is_some());
    }

    #[tokio::test]
    async fn list_jobs_orders_newest_first_and_filters_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let manager = memory_manager().await;

        let first = manager
            .create_job(file_spec(&input, &dir.path().join("a.json")))
            .await
            .unwrap();
        let second = manager
            .create_job(file_spec(&input, &dir.path().join("b.json")))
            .await
            .unwrap();

        let all = manager.list_jobs(&JobFilter::default()).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        manager.cancel_job(first.id).await.unwrap();
        let failed = manager
            .list_jobs(&JobFilter {
                status: Some(JobStatus::Failed),
                ..JobFilter::default()
            })
            .await;
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, first.id);
    }

    #[tokio::test]
    async fn lifecycle_events_are_broadcast_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let output = dir.path().join("out.json");

        let store = JsonFileStore::new(dir.path().join("data")).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();
        let mut events = manager.subscribe();

        let job = manager.create_job(file_spec(&input, &output)).await.unwrap();
        manager.execute_job(job.id).await.unwrap();

        assert_eq!(events.recv().await.unwrap().kind, JobEventKind::Created);
        assert_eq!(events.recv().await.unwrap().kind, JobEventKind::Started);
        assert_eq!(events.recv().await.unwrap().kind, JobEventKind::Completed);
    }

    #[tokio::test]
    async fn delete_removes_job_from_memory_and_storage() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let data_dir = dir.path().join("data");

        let store = JsonFileStore::new(&data_dir).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();
        let job = manager
            .create_job(file_spec(&input, &dir.path().join("out.json")))
            .await
            .unwrap();

        manager.delete_job(job.id).await.unwrap();
        assert!(manager.get_job(job.id).await.is_none());

        let store = JsonFileStore::new(&data_dir).await.unwrap();
        let manager = JobManager::new(store, ManagerConfig::default()).await.unwrap();
        assert!(manager.get_job(job.id).await.is_none());
    }
}
