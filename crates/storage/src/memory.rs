//! In-memory storage backend, for tests and embedding.

use std::collections::HashMap;

use async_trait::async_trait;
use pipewright_core::{Job, JobId};

use super::{JobStore, Result};

/// Volatile job store backed by a HashMap.
#[derive(Default)]
pub struct MemoryStore {
    jobs: HashMap<JobId, Job>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn save_job(&mut self, job: &Job) -> Result<()> {
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn load_job(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.get(&id).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.jobs.values().cloned().collect())
    }

    async fn delete_job(&mut self, id: JobId) -> Result<()> {
        self.jobs.remove(&id);
        Ok(())
    }
}
