//! Lifecycle events emitted by the job manager.

use serde::{Deserialize, Serialize};

use crate::id::JobId;
use crate::Time;

/// What happened to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobEventKind {
    /// Job was created and persisted
    Created,
    /// Execution started
    Started,
    /// Execution finished successfully
    Completed,
    /// Execution failed
    Failed,
    /// Job was paused
    Paused,
    /// Job was resumed back to pending
    Resumed,
    /// Job was cancelled
    Cancelled,
    /// Job was deleted
    Deleted,
}

/// A lifecycle notification. Events are broadcast in transition order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    /// Job the event concerns
    pub job_id: JobId,

    /// What happened
    pub kind: JobEventKind,

    /// When it happened
    pub timestamp: Time,

    /// Optional detail (e.g. the failure message)
    pub message: Option<String>,
}

impl JobEvent {
    /// Build an event stamped with the current time.
    pub fn now(job_id: JobId, kind: JobEventKind) -> Self {
        Self {
            job_id,
            kind,
            timestamp: chrono::Utc::now(),
            message: None,
        }
    }

    /// Attach a detail message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
