//! Quality report produced per job execution.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::Time;

/// The six quality dimensions, each scored 0-1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Fraction of non-missing values per field
    Completeness,
    /// Fraction of distinct values per unique field and distinct records
    Uniqueness,
    /// Fraction of values satisfying their constraints
    Validity,
    /// Fraction of records satisfying cross-field rules
    Consistency,
    /// Match rate against reference data
    Accuracy,
    /// Fraction of records within the maximum age
    Timeliness,
}

impl MetricKind {
    /// Fixed weight of this metric in the overall score.
    pub fn weight(self) -> f64 {
        match self {
            MetricKind::Completeness => 0.25,
            MetricKind::Uniqueness => 0.20,
            MetricKind::Validity => 0.25,
            MetricKind::Consistency => 0.15,
            MetricKind::Accuracy => 0.10,
            MetricKind::Timeliness => 0.05,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MetricKind::Completeness => "completeness",
            MetricKind::Uniqueness => "uniqueness",
            MetricKind::Validity => "validity",
            MetricKind::Consistency => "consistency",
            MetricKind::Accuracy => "accuracy",
            MetricKind::Timeliness => "timeliness",
        };
        f.write_str(s)
    }
}

/// Result of computing one quality metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricResult {
    /// Score in [0, 1]
    pub score: f64,

    /// Threshold the score was compared against
    pub threshold: f64,

    /// Whether the score met the threshold
    pub meets_threshold: bool,

    /// Human-readable issues found while computing the metric
    pub issues: Vec<String>,

    /// Field-level score breakdown
    #[serde(default)]
    pub field_scores: BTreeMap<String, f64>,
}

/// A record or value flagged as unusual - not necessarily invalid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    /// Field the anomaly was found in
    pub field: String,

    /// Index of the record in the checked sequence
    pub record_index: usize,

    /// The anomalous value
    pub value: Value,

    /// Type-specific evidence
    #[serde(flatten)]
    pub detail: AnomalyDetail,
}

/// Evidence carried by an anomaly, discriminated by detection type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnomalyDetail {
    /// Numeric value far from the population mean
    StatisticalOutlier {
        /// `|value - mean| / stddev`
        zscore: f64,
        /// Population mean of the field
        mean: f64,
        /// Population standard deviation of the field
        stddev: f64,
    },
    /// Value whose normalized pattern is rare in the dataset
    PatternAnomaly {
        /// Normalized pattern of the value
        pattern: String,
        /// How many values share the pattern
        occurrences: usize,
        /// Share of all values with this pattern, in [0, 1]
        percentage: f64,
    },
}

/// Priority of a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Address immediately
    High,
    /// Address soon
    Medium,
    /// Address when convenient
    Low,
}

/// What a recommendation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    /// A quality metric fell below its threshold
    Metric(MetricKind),
    /// Anomalies were detected
    Anomalies,
}

/// A deterministic, actionable suggestion derived from the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// What the recommendation is about
    pub kind: RecommendationKind,

    /// How urgent it is
    pub priority: Priority,

    /// Human-readable message
    pub message: String,

    /// Short list of suggested actions
    pub actions: Vec<String>,
}

/// Quality report for one execution. Immutable once produced; embedded
/// in the owning job's result rather than persisted on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// When the checks ran
    pub timestamp: Time,

    /// Number of records checked
    pub total_records: usize,

    /// Per-metric results, keyed by metric
    pub metrics: BTreeMap<MetricKind, MetricResult>,

    /// Detected anomalies
    pub anomalies: Vec<Anomaly>,

    /// Weighted overall score
    pub overall_score: f64,

    /// Generated recommendations
    pub recommendations: Vec<Recommendation>,
}
