//! Error taxonomy for job operations.

use pipewright_core::{JobId, JobStatus};
use pipewright_etl::{ExtractError, LoadError, TransformError};
use pipewright_storage::StoreError;

/// Errors returned by [`JobManager`](crate::JobManager) operations.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The job spec is invalid; nothing was persisted.
    #[error("invalid job spec: {}", violations.join("; "))]
    Validation {
        /// One entry per violated constraint
        violations: Vec<String>,
    },

    /// No job with this id exists.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The job is already executing; at most one execution per job.
    #[error("job {0} is already running")]
    AlreadyRunning(JobId),

    /// The configured cap of concurrently running jobs is reached.
    /// Caller-recoverable: no state was changed, retry later.
    #[error("concurrency limit of {limit} running jobs reached")]
    ConcurrencyLimit {
        /// The configured cap
        limit: usize,
    },

    /// The operation is not allowed in the job's current status.
    #[error("job {id} cannot be {action} while {status}")]
    InvalidTransition {
        /// The job
        id: JobId,
        /// Its current status
        status: JobStatus,
        /// The rejected operation, e.g. "paused"
        action: &'static str,
    },

    /// A pipeline stage failed. The failure was recorded on the job
    /// (status `failed`, error message set) before this was returned.
    #[error("job {job_id} execution failed: {source}")]
    ExecutionFailed {
        /// The job that failed
        job_id: JobId,
        /// The stage error
        #[source]
        source: StageError,
    },

    /// The persistence layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A failure in one of the pipeline stages. Any of these aborts the
/// job and flips it to `failed`.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    /// Extraction failed; no records were produced.
    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    /// A transformation stage failed as a whole.
    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),

    /// The target was unusable. Per-record load failures are counted
    /// in the load summary instead.
    #[error("load failed: {0}")]
    Load(#[from] LoadError),
}
