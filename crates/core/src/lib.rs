//! Pipewright core data models.
//!
//! This crate defines the fundamental data structures shared by the
//! ETL pipeline, the quality engine, and the job manager.

#![warn(missing_docs)]

// Core identities
mod id;

// Records flowing through pipelines
mod record;

// Job definition and lifecycle
mod job;
mod event;

// Quality rules and reports
mod rules;
mod report;

// Re-exports
pub use id::JobId;

pub use record::{coerce_string, field_value, is_missing, Record};

pub use job::{
    Aggregation, AggregateConfig, AggregateFunction, DedupConfig, EndpointKind, FieldMapping,
    FieldType, FilterConfig, FilterOperator, Job, JobFilter, JobMetrics, JobResult, JobSpec,
    JobStatus, LoadSummary, MapConfig, SourceSpec, TargetSpec, TransformSpec, ValidateAction,
    ValidateConfig,
};
pub use event::{JobEvent, JobEventKind};

pub use rules::{
    AccuracyRules, AnomalyRules, ConsistencyRule, QualityRules, TimelinessRules, ValidityRule,
};
pub use report::{
    Anomaly, AnomalyDetail, MetricKind, MetricResult, Priority, QualityReport, Recommendation,
    RecommendationKind,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
