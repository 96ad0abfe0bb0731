//! Job model - the unit of ETL work in Pipewright.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::id::JobId;
use crate::report::QualityReport;
use crate::rules::QualityRules;
use crate::Time;

/// A job represents one ETL execution unit with its own source, target,
/// transformation list, and lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Unique identifier
    pub id: JobId,

    /// Job name
    pub name: String,

    /// Detailed description
    pub description: Option<String>,

    /// Where records are extracted from
    pub source: SourceSpec,

    /// Where records are loaded to
    pub target: TargetSpec,

    /// Ordered transformations applied between extract and load
    #[serde(default)]
    pub transformations: Vec<TransformSpec>,

    /// Optional schedule expression (stored, not interpreted by the core)
    pub schedule: Option<String>,

    /// Quality rules evaluated after transformation
    #[serde(default)]
    pub quality_rules: QualityRules,

    /// Current lifecycle status
    pub status: JobStatus,

    /// Execution metrics
    #[serde(default)]
    pub metrics: JobMetrics,

    /// Result of the last completed execution
    pub result: Option<JobResult>,

    /// Error message from the last failed execution
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: Time,

    /// Last update timestamp
    pub updated_at: Time,
}

impl Job {
    /// Build a fresh pending job from a validated spec.
    pub fn from_spec(spec: JobSpec) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: JobId::new(),
            name: spec.name,
            description: spec.description,
            source: spec.source,
            target: spec.target,
            transformations: spec.transformations,
            schedule: spec.schedule,
            quality_rules: spec.quality_rules,
            status: JobStatus::Pending,
            metrics: JobMetrics::default(),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Specification for creating a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    /// Job name (1-100 characters)
    pub name: String,

    /// Optional description (up to 500 characters)
    pub description: Option<String>,

    /// Source specification
    pub source: SourceSpec,

    /// Target specification
    pub target: TargetSpec,

    /// Ordered transformations
    #[serde(default)]
    pub transformations: Vec<TransformSpec>,

    /// Optional schedule expression
    pub schedule: Option<String>,

    /// Quality rules
    #[serde(default)]
    pub quality_rules: QualityRules,
}

impl JobSpec {
    /// Validate field-level constraints, returning every violation found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();
        if self.name.is_empty() {
            violations.push("name must not be empty".to_string());
        }
        if self.name.chars().count() > 100 {
            violations.push("name must be at most 100 characters".to_string());
        }
        if let Some(desc) = &self.description {
            if desc.chars().count() > 500 {
                violations.push("description must be at most 500 characters".to_string());
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Parse a raw JSON value into a spec, reporting missing required
    /// fields by name before attempting the full deserialization.
    pub fn from_value(value: Value) -> Result<Self, Vec<String>> {
        let mut violations = Vec::new();
        let obj = match value.as_object() {
            Some(obj) => obj,
            None => return Err(vec!["job spec must be a JSON object".to_string()]),
        };
        for required in ["name", "source", "target"] {
            match obj.get(required) {
                None | Some(Value::Null) => {
                    violations.push(format!("{} is required", required));
                }
                Some(_) => {}
            }
        }
        if !violations.is_empty() {
            return Err(violations);
        }
        let spec: JobSpec =
            serde_json::from_value(value).map_err(|e| vec![format!("invalid job spec: {}", e)])?;
        spec.validate()?;
        Ok(spec)
    }
}

/// Lifecycle status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Created, not yet executed
    Pending,
    /// Currently executing
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error (or cancelled)
    Failed,
    /// Paused by an explicit pause call
    Paused,
}

impl JobStatus {
    /// Whether the status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Paused => "paused",
        };
        f.write_str(s)
    }
}

/// Execution metrics for a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetrics {
    /// Records extracted from the source; set exactly once, at extraction
    pub total_records: u64,

    /// Records successfully loaded
    pub processed_records: u64,

    /// Records that failed to load
    pub error_records: u64,

    /// Start of the last execution
    pub started_at: Option<Time>,

    /// End of the last execution
    pub finished_at: Option<Time>,

    /// Duration of the last execution in milliseconds
    pub duration_ms: Option<i64>,
}

/// Result of a completed job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    /// Records extracted
    pub extracted: u64,

    /// Records remaining after transformation
    pub transformed: u64,

    /// Load outcome
    pub load: LoadSummary,

    /// Quality report over the transformed records
    pub quality: QualityReport,
}

/// Per-record load outcome. Partial failures are counted, never raised.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    /// Records written successfully
    pub success_count: u64,

    /// Records that failed to write
    pub error_count: u64,

    /// One message per failed record (or one total-failure message)
    pub errors: Vec<String>,
}

/// Kind of data endpoint a source or target points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// JSON file on local disk
    JsonFile,
    /// CSV file on local disk
    CsvFile,
    /// External database via a registered connector
    Database,
    /// HTTP API
    Api,
}

impl std::fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EndpointKind::JsonFile => "json_file",
            EndpointKind::CsvFile => "csv_file",
            EndpointKind::Database => "database",
            EndpointKind::Api => "api",
        };
        f.write_str(s)
    }
}

/// Source specification: a kind plus kind-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Endpoint kind
    #[serde(rename = "type")]
    pub kind: EndpointKind,

    /// Kind-specific configuration
    #[serde(default)]
    pub config: Value,
}

/// Target specification: a kind plus kind-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetSpec {
    /// Endpoint kind
    #[serde(rename = "type")]
    pub kind: EndpointKind,

    /// Kind-specific configuration
    #[serde(default)]
    pub config: Value,
}

/// One transformation stage. Stages apply strictly in list order, each
/// consuming the previous stage's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum TransformSpec {
    /// Keep records matching a field predicate
    Filter(FilterConfig),
    /// Project/rename fields into new records
    Map(MapConfig),
    /// Group records and compute aggregates
    Aggregate(AggregateConfig),
    /// Keep the first record per composite key
    Deduplicate(DedupConfig),
    /// Check records against a field-type schema
    Validate(ValidateConfig),
    /// Unrecognized kind; passes records through with a warning
    #[serde(other)]
    Other,
}

/// Configuration for a `filter` transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Field to test
    pub field: String,

    /// Comparison operator
    pub operator: FilterOperator,

    /// Comparison value (unused by `exists`)
    #[serde(default)]
    pub value: Value,
}

/// Operators supported by `filter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Structural equality
    Equals,
    /// Structural inequality
    NotEquals,
    /// Numeric greater-than
    GreaterThan,
    /// Numeric less-than
    LessThan,
    /// Substring match on the string-coerced value
    Contains,
    /// Field is present and non-null
    Exists,
}

/// Configuration for a `map` transformation: output records contain only
/// the listed target fields, each populated from a source field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    /// Field mappings, in output order
    pub fields: Vec<FieldMapping>,
}

/// One target-field/source-field pair in a `map` transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Name of the field in the output record
    pub target: String,

    /// Name of the field read from the input record
    pub source: String,
}

/// Configuration for an `aggregate` transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateConfig {
    /// Fields forming the composite group key
    pub group_by: Vec<String>,

    /// Aggregates computed per group
    pub aggregations: Vec<Aggregation>,
}

/// One aggregate computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    /// Field the function is applied to
    pub field: String,

    /// Aggregate function
    pub function: AggregateFunction,

    /// Output field name; defaults to `<field>_<function>`
    #[serde(default)]
    pub output: Option<String>,
}

/// Aggregate functions. Non-numeric and null values are excluded from
/// the numeric aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateFunction {
    /// Number of records in the group
    Count,
    /// Sum of numeric values
    Sum,
    /// Mean of numeric values
    Avg,
    /// Minimum numeric value
    Min,
    /// Maximum numeric value
    Max,
}

impl AggregateFunction {
    /// Name used when deriving a default output field.
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "count",
            AggregateFunction::Sum => "sum",
            AggregateFunction::Avg => "avg",
            AggregateFunction::Min => "min",
            AggregateFunction::Max => "max",
        }
    }
}

/// Configuration for a `deduplicate` transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Fields forming the composite dedup key
    pub fields: Vec<String>,
}

/// Configuration for a `validate` transformation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateConfig {
    /// Expected type per field
    pub schema: BTreeMap<String, FieldType>,

    /// What to do with records that fail the schema
    #[serde(default)]
    pub on_failure: ValidateAction,
}

/// Action taken for records failing `validate`. Any action string other
/// than `filter` means pass-through.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidateAction {
    /// Drop the failing record
    Filter,
    /// Pass the failing record through unchanged
    #[default]
    Pass,
}

impl<'de> Deserialize<'de> for ValidateAction {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let action = String::deserialize(deserializer)?;
        Ok(if action == "filter" {
            ValidateAction::Filter
        } else {
            ValidateAction::Pass
        })
    }
}

/// JSON field types recognized by `validate` and validity rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// JSON string
    String,
    /// JSON number
    Number,
    /// JSON boolean
    Boolean,
    /// JSON object
    Object,
    /// JSON array
    Array,
}

impl FieldType {
    /// Whether a JSON value has this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Object => value.is_object(),
            FieldType::Array => value.is_array(),
        }
    }
}

/// Filter for querying jobs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilter {
    /// Filter by status
    pub status: Option<JobStatus>,

    /// Filter by substring of the job name
    pub name_contains: Option<String>,
}

impl JobFilter {
    /// Whether a job passes this filter.
    pub fn matches(&self, job: &Job) -> bool {
        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }
        if let Some(fragment) = &self.name_contains {
            if !job.name.contains(fragment.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_spec() -> Value {
        json!({
            "name": "orders",
            "source": {"type": "json_file", "config": {"path": "in.json"}},
            "target": {"type": "json_file", "config": {"path": "out.json"}}
        })
    }

    #[test]
    fn spec_missing_required_fields_lists_each() {
        let err = JobSpec::from_value(json!({"description": "no name"})).unwrap_err();
        assert!(err.contains(&"name is required".to_string()));
        assert!(err.contains(&"source is required".to_string()));
        assert!(err.contains(&"target is required".to_string()));
    }

    #[test]
    fn spec_rejects_empty_and_oversized_name() {
        let mut v = minimal_spec();
        v["name"] = json!("");
        assert!(JobSpec::from_value(v).is_err());

        let mut v = minimal_spec();
        v["name"] = json!("x".repeat(101));
        let err = JobSpec::from_value(v).unwrap_err();
        assert_eq!(err, vec!["name must be at most 100 characters".to_string()]);
    }

    #[test]
    fn spec_rejects_oversized_description() {
        let mut v = minimal_spec();
        v["description"] = json!("d".repeat(501));
        assert!(JobSpec::from_value(v).is_err());
    }

    #[test]
    fn minimal_spec_parses_into_pending_job() {
        let spec = JobSpec::from_value(minimal_spec()).unwrap();
        let job = Job::from_spec(spec);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.metrics, JobMetrics::default());
        assert!(job.result.is_none());
        assert!(job.transformations.is_empty());
    }

    #[test]
    fn transform_specs_apply_in_declared_order() {
        let specs: Vec<TransformSpec> = serde_json::from_value(json!([
            {"type": "filter", "config": {"field": "status", "operator": "equals", "value": "active"}},
            {"type": "deduplicate", "config": {"fields": ["id"]}}
        ]))
        .unwrap();
        assert!(matches!(specs[0], TransformSpec::Filter(_)));
        assert!(matches!(specs[1], TransformSpec::Deduplicate(_)));
    }

    #[test]
    fn unknown_transform_kind_parses_as_other() {
        let spec: TransformSpec =
            serde_json::from_value(json!({"type": "pivot", "config": {}})).unwrap();
        assert!(matches!(spec, TransformSpec::Other));
    }

    #[test]
    fn job_round_trips_through_json() {
        let spec = JobSpec::from_value(minimal_spec()).unwrap();
        let job = Job::from_spec(spec);
        let encoded = serde_json::to_string(&job).unwrap();
        let decoded: Job = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.id, job.id);
        assert_eq!(decoded.status, job.status);
        assert_eq!(decoded.metrics, job.metrics);
    }
}
