//! Deterministic recommendations derived from a report.

use std::collections::BTreeMap;

use pipewright_core::{
    Anomaly, MetricKind, MetricResult, Priority, Recommendation, RecommendationKind,
};

/// Build recommendations from metrics that fell below threshold and
/// from detected anomalies. Output order follows metric order, with an
/// anomaly recommendation last.
pub(crate) fn build(
    metrics: &BTreeMap<MetricKind, MetricResult>,
    anomalies: &[Anomaly],
) -> Vec<Recommendation> {
    let mut recommendations = Vec::new();
    for (kind, result) in metrics {
        if result.meets_threshold {
            continue;
        }
        recommendations.push(Recommendation {
            kind: RecommendationKind::Metric(*kind),
            priority: priority_for(result),
            message: format!(
                "{} score {:.3} is below the threshold of {:.2}",
                kind, result.score, result.threshold
            ),
            actions: actions_for(*kind),
        });
    }
    if !anomalies.is_empty() {
        recommendations.push(Recommendation {
            kind: RecommendationKind::Anomalies,
            priority: Priority::Medium,
            message: format!("{} anomalies detected", anomalies.len()),
            actions: vec![
                "Review the flagged values for data entry errors".to_string(),
                "Check upstream sources for format drift".to_string(),
            ],
        });
    }
    recommendations
}

/// Scores far below threshold are urgent; near misses are not.
fn priority_for(result: &MetricResult) -> Priority {
    if result.score < result.threshold - 0.1 {
        Priority::High
    } else {
        Priority::Medium
    }
}

fn actions_for(kind: MetricKind) -> Vec<String> {
    let actions: &[&str] = match kind {
        MetricKind::Completeness => &[
            "Identify why source fields arrive empty",
            "Add required-field checks at the point of capture",
        ],
        MetricKind::Uniqueness => &[
            "Deduplicate the source data",
            "Enforce unique keys upstream",
        ],
        MetricKind::Validity => &[
            "Tighten input validation at the source",
            "Review the failing values against the configured constraints",
        ],
        MetricKind::Consistency => &[
            "Review the failing cross-field rules",
            "Check whether upstream systems disagree on shared fields",
        ],
        MetricKind::Accuracy => &[
            "Reconcile the dataset with the reference data",
            "Verify the reference data is current",
        ],
        MetricKind::Timeliness => &[
            "Increase the refresh frequency of the source",
            "Investigate delays in the ingestion path",
        ],
    };
    actions.iter().map(|s| s.to_string()).collect()
}
