//! Pluggable adapter for `database` sources and targets.

use async_trait::async_trait;
use pipewright_core::{LoadSummary, Record};
use serde_json::Value;

use crate::extract::ExtractError;
use crate::load::LoadError;

/// Adapter for a `database` endpoint. Real connector implementations
/// live outside this workspace; callers register one on the
/// [`Extractor`](crate::Extractor) and [`Loader`](crate::Loader) at
/// startup. Without a registered connector, `database` sources and
/// targets fail with an unsupported-kind error.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Fetch all records described by the source config.
    async fn fetch(&self, config: &Value) -> Result<Vec<Record>, ExtractError>;

    /// Store records as described by the target config, reporting
    /// per-record outcomes.
    async fn store(&self, records: &[Record], config: &Value) -> Result<LoadSummary, LoadError>;
}
