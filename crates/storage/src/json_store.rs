//! JSON file storage implementation.
//!
//! Stores each job as a pretty-printed `<id>.json` file under a `jobs/`
//! subdirectory of the data directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pipewright_core::{Job, JobId};
use tokio::fs;

use super::{JobStore, Result, StoreError};

/// File-based JSON storage backend.
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Create storage rooted at `root`, creating the `jobs/` directory
    /// if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("jobs")).await?;
        Ok(Self { root })
    }

    fn job_path(&self, id: JobId) -> PathBuf {
        self.root.join("jobs").join(format!("{}.json", id))
    }
}

#[async_trait]
impl JobStore for JsonFileStore {
    async fn save_job(&mut self, job: &Job) -> Result<()> {
        let path = self.job_path(job.id);
        let json = serde_json::to_string_pretty(job)?;
        fs::write(&path, json.as_bytes()).await?;
        tracing::debug!(job_id = %job.id, status = %job.status, "persisted job");
        Ok(())
    }

    async fn load_job(&self, id: JobId) -> Result<Option<Job>> {
        match fs::read_to_string(self.job_path(id)).await {
            Ok(s) => Ok(Some(serde_json::from_str(&s)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();
        let mut entries = fs::read_dir(self.root.join("jobs")).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let s = fs::read_to_string(&path).await?;
            match serde_json::from_str::<Job>(&s) {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable job file");
                }
            }
        }
        Ok(jobs)
    }

    async fn delete_job(&mut self, id: JobId) -> Result<()> {
        fs::remove_file(self.job_path(id)).await.or_else(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Ok(())
            } else {
                Err(e)
            }
        })?;
        Ok(())
    }
}
