//! Immutable checker configuration.

use pipewright_core::MetricKind;

/// Thresholds and detection parameters, fixed at construction.
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Minimum acceptable completeness score
    pub completeness_threshold: f64,

    /// Minimum acceptable uniqueness score
    pub uniqueness_threshold: f64,

    /// Minimum acceptable validity score
    pub validity_threshold: f64,

    /// Minimum acceptable consistency score
    pub consistency_threshold: f64,

    /// Minimum acceptable accuracy score
    pub accuracy_threshold: f64,

    /// Minimum acceptable timeliness score
    pub timeliness_threshold: f64,

    /// Z-score above which a numeric value is a statistical outlier
    pub zscore_threshold: f64,

    /// Patterns occurring in less than this share of values are rare
    pub rare_pattern_share: f64,

    /// Divide the overall score by the total applied weight. Off by
    /// default: with only the four always-computed metrics the overall
    /// score then tops out at 0.85.
    pub normalize_overall: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            completeness_threshold: 0.95,
            uniqueness_threshold: 0.99,
            validity_threshold: 0.98,
            consistency_threshold: 0.95,
            accuracy_threshold: 0.95,
            timeliness_threshold: 0.90,
            zscore_threshold: 3.0,
            rare_pattern_share: 0.05,
            normalize_overall: false,
        }
    }
}

impl CheckerConfig {
    /// Threshold configured for a metric.
    pub fn threshold(&self, kind: MetricKind) -> f64 {
        match kind {
            MetricKind::Completeness => self.completeness_threshold,
            MetricKind::Uniqueness => self.uniqueness_threshold,
            MetricKind::Validity => self.validity_threshold,
            MetricKind::Consistency => self.consistency_threshold,
            MetricKind::Accuracy => self.accuracy_threshold,
            MetricKind::Timeliness => self.timeliness_threshold,
        }
    }
}
