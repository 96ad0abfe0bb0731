//! Declarative quality rules stored on a job.

use serde::{Deserialize, Serialize};

use crate::job::FieldType;
use crate::record::Record;

/// The full quality-rule set for a job. Every section is optional; the
/// checker computes only the metrics whose rules (or defaults) apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QualityRules {
    /// Restrict completeness checking to these fields; by default every
    /// field seen in the dataset is checked.
    pub completeness_fields: Option<Vec<String>>,

    /// Fields expected to hold unique values
    #[serde(default)]
    pub unique_fields: Vec<String>,

    /// Per-field validity constraints
    #[serde(default)]
    pub validity: Vec<ValidityRule>,

    /// Cross-field consistency rules
    #[serde(default)]
    pub consistency: Vec<ConsistencyRule>,

    /// Accuracy checking against reference data
    pub accuracy: Option<AccuracyRules>,

    /// Timeliness checking against a date field
    pub timeliness: Option<TimelinessRules>,

    /// Anomaly detection configuration
    #[serde(default)]
    pub anomalies: AnomalyRules,
}

/// Constraints a single field's values must all satisfy. A value failing
/// any configured constraint (or one that cannot be evaluated) counts as
/// invalid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidityRule {
    /// Field the rule applies to
    pub field: String,

    /// Expected JSON type
    pub field_type: Option<FieldType>,

    /// Regex the string-coerced value must match
    pub pattern: Option<String>,

    /// Minimum numeric value (inclusive)
    pub min: Option<f64>,

    /// Maximum numeric value (inclusive)
    pub max: Option<f64>,

    /// Name of a custom predicate registered on the checker
    pub predicate: Option<String>,
}

/// A named cross-field consistency rule. The predicate is looked up in
/// the checker's registry; records failing it (or rules naming an
/// unregistered predicate) count as inconsistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyRule {
    /// Human-readable rule name
    pub name: String,

    /// Name of a record predicate registered on the checker
    pub predicate: String,
}

/// Accuracy rules: compare records against reference data located by key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyRules {
    /// Reference records
    pub reference_data: Vec<Record>,

    /// Field used to locate the reference record
    pub key_field: String,

    /// Fields compared against the reference
    pub compare_fields: Vec<String>,
}

/// Timeliness rules: records older than the maximum age are stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinessRules {
    /// Field holding an RFC 3339 timestamp
    pub date_field: String,

    /// Maximum age in seconds
    pub max_age_seconds: i64,
}

/// Anomaly detection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnomalyRules {
    /// Fields scanned for statistical outliers
    #[serde(default)]
    pub numeric_fields: Vec<String>,

    /// Fields scanned for rare value patterns
    #[serde(default)]
    pub pattern_fields: Vec<String>,
}
