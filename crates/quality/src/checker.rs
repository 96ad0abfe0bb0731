//! The quality checker: six metrics plus anomaly detection.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use pipewright_core::{
    coerce_string, field_value, is_missing, AccuracyRules, ConsistencyRule, MetricKind,
    MetricResult, QualityReport, QualityRules, Record, TimelinessRules, ValidityRule,
};
use serde_json::Value;

use crate::anomaly;
use crate::config::CheckerConfig;
use crate::recommend;

/// Custom predicate over a single field value.
pub type ValuePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Custom cross-field predicate over a whole record.
pub type RecordPredicate = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

/// Computes quality metrics and anomalies over a record sequence.
///
/// Thresholds and weights are fixed at construction; custom predicates
/// referenced by name from validity and consistency rules are
/// registered up front.
pub struct QualityChecker {
    config: CheckerConfig,
    value_predicates: HashMap<String, ValuePredicate>,
    record_predicates: HashMap<String, RecordPredicate>,
}

impl Default for QualityChecker {
    fn default() -> Self {
        Self::new(CheckerConfig::default())
    }
}

impl QualityChecker {
    /// Create a checker with the given configuration.
    pub fn new(config: CheckerConfig) -> Self {
        Self {
            config,
            value_predicates: HashMap::new(),
            record_predicates: HashMap::new(),
        }
    }

    /// Register a named predicate usable from validity rules.
    pub fn register_value_predicate(
        &mut self,
        name: impl Into<String>,
        predicate: ValuePredicate,
    ) {
        self.value_predicates.insert(name.into(), predicate);
    }

    /// Register a named predicate usable from consistency rules.
    pub fn register_record_predicate(
        &mut self,
        name: impl Into<String>,
        predicate: RecordPredicate,
    ) {
        self.record_predicates.insert(name.into(), predicate);
    }

    /// Run all applicable checks and produce a report.
    ///
    /// Completeness, uniqueness, validity, and consistency are always
    /// computed (vacuously 1.0 when no rules apply); accuracy and
    /// timeliness only when configured. Over an empty dataset every
    /// metric scores 1.0.
    pub fn perform_checks(&self, records: &[Record], rules: &QualityRules) -> QualityReport {
        tracing::debug!(records = records.len(), "running quality checks");

        let mut metrics = BTreeMap::new();
        metrics.insert(
            MetricKind::Completeness,
            self.check_completeness(records, rules.completeness_fields.as_deref()),
        );
        metrics.insert(
            MetricKind::Uniqueness,
            self.check_uniqueness(records, &rules.unique_fields),
        );
        metrics.insert(
            MetricKind::Validity,
            self.check_validity(records, &rules.validity),
        );
        metrics.insert(
            MetricKind::Consistency,
            self.check_consistency(records, &rules.consistency),
        );
        if let Some(accuracy) = &rules.accuracy {
            metrics.insert(MetricKind::Accuracy, self.check_accuracy(records, accuracy));
        }
        if let Some(timeliness) = &rules.timeliness {
            metrics.insert(
                MetricKind::Timeliness,
                self.check_timeliness(records, timeliness),
            );
        }

        let anomalies = anomaly::detect(records, &rules.anomalies, &self.config);
        let overall_score = self.overall_score(&metrics);
        let recommendations = recommend::build(&metrics, &anomalies);

        QualityReport {
            timestamp: chrono::Utc::now(),
            total_records: records.len(),
            metrics,
            anomalies,
            overall_score,
            recommendations,
        }
    }

    /// Weighted sum of computed metric scores. Weights of missing
    /// metrics are excluded; the remainder is divided by the applied
    /// weight total only when `normalize_overall` is set.
    fn overall_score(&self, metrics: &BTreeMap<MetricKind, MetricResult>) -> f64 {
        let weighted: f64 = metrics
            .iter()
            .map(|(kind, result)| kind.weight() * result.score)
            .sum();
        if self.config.normalize_overall {
            let applied: f64 = metrics.keys().map(|kind| kind.weight()).sum();
            if applied > 0.0 {
                return weighted / applied;
            }
        }
        weighted
    }

    fn result(&self, kind: MetricKind, score: f64, issues: Vec<String>) -> MetricResult {
        let threshold = self.config.threshold(kind);
        MetricResult {
            score,
            threshold,
            meets_threshold: score >= threshold,
            issues,
            field_scores: BTreeMap::new(),
        }
    }

    /// Per field: fraction of records where the field is non-missing.
    /// Overall score is the mean across fields.
    fn check_completeness(&self, records: &[Record], fields: Option<&[String]>) -> MetricResult {
        let fields: Vec<String> = match fields {
            Some(fields) => fields.to_vec(),
            None => {
                let mut all: BTreeSet<String> = BTreeSet::new();
                for record in records {
                    all.extend(record.keys().cloned());
                }
                all.into_iter().collect()
            }
        };

        let total = records.len();
        let mut field_scores = BTreeMap::new();
        let mut issues = Vec::new();
        for field in &fields {
            let missing = records.iter().filter(|r| is_missing(r, field)).count();
            let score = if total == 0 {
                1.0
            } else {
                1.0 - missing as f64 / total as f64
            };
            if score < self.config.completeness_threshold {
                issues.push(format!(
                    "field '{}' is missing in {} of {} records",
                    field, missing, total
                ));
            }
            field_scores.insert(field.clone(), score);
        }

        let score = if field_scores.is_empty() {
            1.0
        } else {
            field_scores.values().sum::<f64>() / field_scores.len() as f64
        };
        MetricResult {
            field_scores,
            ..self.result(MetricKind::Completeness, score, issues)
        }
    }

    /// Per configured unique field: fraction of distinct values. Plus
    /// whole-record duplicate detection via structural equality. The
    /// overall score is the minimum of all of these.
    fn check_uniqueness(&self, records: &[Record], unique_fields: &[String]) -> MetricResult {
        let total = records.len();
        let mut field_scores = BTreeMap::new();
        let mut issues = Vec::new();

        for field in unique_fields {
            let distinct: HashSet<String> = records
                .iter()
                .map(|r| coerce_string(r.get(field).unwrap_or(&Value::Null)))
                .collect();
            let score = if total == 0 {
                1.0
            } else {
                distinct.len() as f64 / total as f64
            };
            if score < self.config.uniqueness_threshold {
                issues.push(format!(
                    "field '{}' has {} duplicate values",
                    field,
                    total - distinct.len()
                ));
            }
            field_scores.insert(field.clone(), score);
        }

        let distinct_records: HashSet<String> = records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap_or_default())
            .collect();
        let record_score = if total == 0 {
            1.0
        } else {
            distinct_records.len() as f64 / total as f64
        };
        if record_score < self.config.uniqueness_threshold {
            issues.push(format!(
                "{} duplicate records detected",
                total - distinct_records.len()
            ));
        }

        let score = field_scores
            .values()
            .copied()
            .fold(record_score, f64::min);
        MetricResult {
            field_scores,
            ..self.result(MetricKind::Uniqueness, score, issues)
        }
    }

    /// Per rule: fraction of present values satisfying every configured
    /// constraint. A value that cannot be evaluated counts as invalid.
    fn check_validity(&self, records: &[Record], rules: &[ValidityRule]) -> MetricResult {
        let mut field_scores = BTreeMap::new();
        let mut issues = Vec::new();

        for rule in rules {
            let pattern = match &rule.pattern {
                Some(p) => match regex::Regex::new(p) {
                    Ok(re) => Some(Ok(re)),
                    Err(e) => {
                        issues.push(format!(
                            "field '{}': invalid pattern '{}': {}",
                            rule.field, p, e
                        ));
                        Some(Err(()))
                    }
                },
                None => None,
            };
            let predicate = rule.predicate.as_ref().map(|name| {
                let found = self.value_predicates.get(name);
                if found.is_none() {
                    issues.push(format!(
                        "field '{}': unknown predicate '{}'",
                        rule.field, name
                    ));
                }
                found
            });

            let values: Vec<&Value> = records
                .iter()
                .filter_map(|r| field_value(r, &rule.field))
                .collect();
            let valid = values
                .iter()
                .filter(|v| is_valid(v, rule, &pattern, &predicate))
                .count();
            let score = if values.is_empty() {
                1.0
            } else {
                valid as f64 / values.len() as f64
            };
            if score < self.config.validity_threshold {
                issues.push(format!(
                    "field '{}' has {} invalid values out of {}",
                    rule.field,
                    values.len() - valid,
                    values.len()
                ));
            }
            field_scores.insert(rule.field.clone(), score);
        }

        let score = if field_scores.is_empty() {
            1.0
        } else {
            field_scores.values().sum::<f64>() / field_scores.len() as f64
        };
        MetricResult {
            field_scores,
            ..self.result(MetricKind::Validity, score, issues)
        }
    }

    /// Per rule: fraction of records satisfying the named predicate.
    /// A rule naming an unregistered predicate scores 0.
    fn check_consistency(&self, records: &[Record], rules: &[ConsistencyRule]) -> MetricResult {
        let total = records.len();
        let mut field_scores = BTreeMap::new();
        let mut issues = Vec::new();

        for rule in rules {
            let score = match self.record_predicates.get(&rule.predicate) {
                Some(predicate) => {
                    let consistent = records.iter().filter(|r| predicate(r)).count();
                    if total == 0 {
                        1.0
                    } else {
                        consistent as f64 / total as f64
                    }
                }
                None => {
                    issues.push(format!(
                        "rule '{}': unknown predicate '{}'",
                        rule.name, rule.predicate
                    ));
                    0.0
                }
            };
            if score < self.config.consistency_threshold {
                issues.push(format!(
                    "rule '{}' fails for {:.1}% of records",
                    rule.name,
                    (1.0 - score) * 100.0
                ));
            }
            field_scores.insert(rule.name.clone(), score);
        }

        let score = if field_scores.is_empty() {
            1.0
        } else {
            field_scores.values().sum::<f64>() / field_scores.len() as f64
        };
        MetricResult {
            field_scores,
            ..self.result(MetricKind::Consistency, score, issues)
        }
    }

    /// Match rate against reference records located by key. A record is
    /// accurate only if a reference exists and all compared fields
    /// match.
    fn check_accuracy(&self, records: &[Record], rules: &AccuracyRules) -> MetricResult {
        let reference: HashMap<String, &Record> = rules
            .reference_data
            .iter()
            .filter_map(|r| {
                field_value(r, &rules.key_field).map(|key| (coerce_string(key), r))
            })
            .collect();

        let total = records.len();
        let mut accurate = 0usize;
        let mut field_matches: BTreeMap<String, usize> =
            rules.compare_fields.iter().map(|f| (f.clone(), 0)).collect();
        let mut missing_reference = 0usize;

        for record in records {
            let reference_record = field_value(record, &rules.key_field)
                .map(|key| coerce_string(key))
                .and_then(|key| reference.get(&key).copied());
            match reference_record {
                Some(reference_record) => {
                    let mut all_match = true;
                    for field in &rules.compare_fields {
                        if record.get(field) == reference_record.get(field) {
                            *field_matches.entry(field.clone()).or_insert(0) += 1;
                        } else {
                            all_match = false;
                        }
                    }
                    if all_match {
                        accurate += 1;
                    }
                }
                None => missing_reference += 1,
            }
        }

        let mut issues = Vec::new();
        if missing_reference > 0 {
            issues.push(format!(
                "{} records have no reference entry for '{}'",
                missing_reference, rules.key_field
            ));
        }
        let field_scores: BTreeMap<String, f64> = field_matches
            .into_iter()
            .map(|(field, matches)| {
                let score = if total == 0 {
                    1.0
                } else {
                    matches as f64 / total as f64
                };
                (field, score)
            })
            .collect();
        let score = if total == 0 {
            1.0
        } else {
            accurate as f64 / total as f64
        };
        if score < self.config.accuracy_threshold {
            issues.push(format!(
                "{} of {} records do not match the reference data",
                total - accurate,
                total
            ));
        }
        MetricResult {
            field_scores,
            ..self.result(MetricKind::Accuracy, score, issues)
        }
    }

    /// Fraction of records whose date field is within the maximum age.
    /// Missing or unparseable dates count as stale.
    fn check_timeliness(&self, records: &[Record], rules: &TimelinessRules) -> MetricResult {
        let now = chrono::Utc::now();
        let max_age = chrono::Duration::seconds(rules.max_age_seconds);

        let total = records.len();
        let mut timely = 0usize;
        let mut unparseable = 0usize;
        for record in records {
            match field_value(record, &rules.date_field).and_then(parse_timestamp) {
                Some(ts) => {
                    if now.signed_duration_since(ts) <= max_age {
                        timely += 1;
                    }
                }
                None => unparseable += 1,
            }
        }

        let mut issues = Vec::new();
        if unparseable > 0 {
            issues.push(format!(
                "{} records have a missing or unparseable '{}'",
                unparseable, rules.date_field
            ));
        }
        let score = if total == 0 {
            1.0
        } else {
            timely as f64 / total as f64
        };
        if score < self.config.timeliness_threshold {
            issues.push(format!(
                "{} of {} records are older than {} seconds",
                total - timely,
                total,
                rules.max_age_seconds
            ));
        }
        self.result(MetricKind::Timeliness, score, issues)
    }
}

fn is_valid(
    value: &Value,
    rule: &ValidityRule,
    pattern: &Option<Result<regex::Regex, ()>>,
    predicate: &Option<Option<&ValuePredicate>>,
) -> bool {
    if let Some(field_type) = rule.field_type {
        if !field_type.matches(value) {
            return false;
        }
    }
    match pattern {
        Some(Ok(re)) => {
            if !re.is_match(&coerce_string(value)) {
                return false;
            }
        }
        // An uncompilable pattern cannot be evaluated: invalid.
        Some(Err(())) => return false,
        None => {}
    }
    if rule.min.is_some() || rule.max.is_some() {
        match value.as_f64() {
            Some(n) => {
                if rule.min.is_some_and(|min| n < min) || rule.max.is_some_and(|max| n > max) {
                    return false;
                }
            }
            None => return false,
        }
    }
    match predicate {
        Some(Some(predicate)) => predicate(value),
        // An unregistered predicate cannot be evaluated: invalid.
        Some(None) => false,
        None => true,
    }
}

/// Parse an RFC 3339 timestamp, falling back to a bare date.
fn parse_timestamp(value: &Value) -> Option<pipewright_core::Time> {
    let s = value.as_str()?;
    if let Ok(ts) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&chrono::Utc));
    }
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let ts = date.and_hms_opt(0, 0, 0)?;
        return Some(chrono::DateTime::from_naive_utc_and_offset(ts, chrono::Utc));
    }
    None
}
