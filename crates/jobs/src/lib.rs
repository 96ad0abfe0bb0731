//! Job lifecycle management.
//!
//! The [`JobManager`] owns every job: it validates and persists new
//! jobs, enforces the concurrency cap, orchestrates the ETL stages and
//! the quality checks per execution, and broadcasts lifecycle events.

#![warn(missing_docs)]

mod error;
mod manager;

pub use error::{JobError, StageError};
pub use manager::{JobManager, ManagerConfig};
