//! Storage trait abstraction.

use async_trait::async_trait;
use pipewright_core::{Job, JobId};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Job not found
    #[error("not found: {0}")]
    NotFound(JobId),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Storage abstraction for job records.
///
/// This trait allows different backends to be plugged in; the job
/// manager stays independent of the storage mechanism.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Save a job (create or update).
    async fn save_job(&mut self, job: &Job) -> Result<()>;

    /// Load a job by ID.
    async fn load_job(&self, id: JobId) -> Result<Option<Job>>;

    /// List all persisted jobs, in no particular order.
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    /// Delete a job. Deleting an unknown job is not an error.
    async fn delete_job(&mut self, id: JobId) -> Result<()>;
}
