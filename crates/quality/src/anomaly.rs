//! Statistical outlier and pattern-rarity detection.

use std::collections::HashMap;

use pipewright_core::{coerce_string, field_value, Anomaly, AnomalyDetail, AnomalyRules, Record};
use serde_json::Value;

use crate::config::CheckerConfig;

/// Detect anomalies over all configured fields.
pub(crate) fn detect(
    records: &[Record],
    rules: &AnomalyRules,
    config: &CheckerConfig,
) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    for field in &rules.numeric_fields {
        anomalies.extend(statistical_outliers(records, field, config.zscore_threshold));
    }
    for field in &rules.pattern_fields {
        anomalies.extend(pattern_anomalies(records, field, config.rare_pattern_share));
    }
    anomalies
}

/// Flag values whose z-score against the population mean and standard
/// deviation exceeds the threshold.
fn statistical_outliers(records: &[Record], field: &str, threshold: f64) -> Vec<Anomaly> {
    let values: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| field_value(r, field).and_then(Value::as_f64).map(|v| (i, v)))
        .collect();
    if values.len() < 2 {
        return Vec::new();
    }

    let n = values.len() as f64;
    let mean = values.iter().map(|(_, v)| v).sum::<f64>() / n;
    let variance = values.iter().map(|(_, v)| (v - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    if stddev == 0.0 {
        return Vec::new();
    }

    values
        .into_iter()
        .filter_map(|(index, value)| {
            let zscore = (value - mean).abs() / stddev;
            if zscore > threshold {
                Some(Anomaly {
                    field: field.to_string(),
                    record_index: index,
                    value: records[index]
                        .get(field)
                        .cloned()
                        .unwrap_or(Value::Null),
                    detail: AnomalyDetail::StatisticalOutlier {
                        zscore,
                        mean,
                        stddev,
                    },
                })
            } else {
                None
            }
        })
        .collect()
}

/// Flag values whose normalized pattern occurs in fewer than the rare
/// share of all values.
fn pattern_anomalies(records: &[Record], field: &str, rare_share: f64) -> Vec<Anomaly> {
    let values: Vec<(usize, String)> = records
        .iter()
        .enumerate()
        .filter_map(|(i, r)| field_value(r, field).map(|v| (i, coerce_string(v))))
        .collect();
    if values.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for (_, value) in &values {
        *counts.entry(normalize_pattern(value)).or_insert(0) += 1;
    }

    let total = values.len() as f64;
    values
        .into_iter()
        .filter_map(|(index, value)| {
            let pattern = normalize_pattern(&value);
            let occurrences = counts[&pattern];
            let share = occurrences as f64 / total;
            if occurrences > 0 && share < rare_share {
                Some(Anomaly {
                    field: field.to_string(),
                    record_index: index,
                    value: Value::String(value),
                    detail: AnomalyDetail::PatternAnomaly {
                        pattern,
                        occurrences,
                        percentage: share,
                    },
                })
            } else {
                None
            }
        })
        .collect()
}

/// Normalize a value into a shape pattern: digits become `9`, lowercase
/// letters `a`, uppercase letters `A`, whitespace `_`; everything else
/// is kept as-is.
pub(crate) fn normalize_pattern(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                '9'
            } else if c.is_lowercase() {
                'a'
            } else if c.is_uppercase() {
                'A'
            } else if c.is_whitespace() {
                '_'
            } else {
                c
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(v: serde_json::Value) -> Vec<Record> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn pattern_normalization_shapes() {
        assert_eq!(normalize_pattern("AB-1234"), "AA-9999");
        assert_eq!(normalize_pattern("user 42"), "aaaa_99");
        assert_eq!(normalize_pattern("x@y.com"), "a@a.aaa");
    }

    #[test]
    fn outlier_flagged_when_zscore_exceeds_threshold() {
        // Ten 10s and one 1000: mean 100, population stddev ~284.6,
        // z(1000) ~ 3.16.
        let mut data: Vec<Value> = (0..10).map(|_| json!({"v": 10})).collect();
        data.push(json!({"v": 1000}));
        let records = records(Value::Array(data));

        let anomalies = statistical_outliers(&records, "v", 3.0);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].record_index, 10);
        match &anomalies[0].detail {
            AnomalyDetail::StatisticalOutlier { zscore, mean, .. } => {
                assert!((mean - 100.0).abs() < 1e-9);
                assert!(*zscore > 3.0 && *zscore < 3.2);
            }
            other => panic!("unexpected detail: {:?}", other),
        }
    }

    #[test]
    fn small_sample_outlier_with_lower_threshold() {
        // mean 22, population stddev ~39.0; z(100) ~ 2.0, all others
        // below 0.6, so threshold 1.5 flags exactly the 100.
        let records = records(json!([
            {"v": 1}, {"v": 2}, {"v": 3}, {"v": 4}, {"v": 100}
        ]));
        let anomalies = statistical_outliers(&records, "v", 1.5);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].value, json!(100));
    }

    #[test]
    fn uniform_values_produce_no_outliers() {
        let records = records(json!([{"v": 5}, {"v": 5}, {"v": 5}]));
        assert!(statistical_outliers(&records, "v", 3.0).is_empty());
    }

    #[test]
    fn rare_pattern_is_flagged() {
        // 24 phone-shaped values and one email: 1/25 = 4% < 5%.
        let mut data: Vec<Value> = (0..24)
            .map(|i| json!({"contact": format!("555-{:04}", i)}))
            .collect();
        data.push(json!({"contact": "who@example.com"}));
        let records = records(Value::Array(data));

        let anomalies = pattern_anomalies(&records, "contact", 0.05);
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].value, json!("who@example.com"));
        match &anomalies[0].detail {
            AnomalyDetail::PatternAnomaly { occurrences, .. } => assert_eq!(*occurrences, 1),
            other => panic!("unexpected detail: {:?}", other),
        }
    }

    #[test]
    fn common_patterns_are_not_flagged() {
        let records = records(json!([
            {"code": "AB-12"}, {"code": "CD-34"}, {"code": "EF-56"}
        ]));
        assert!(pattern_anomalies(&records, "code", 0.05).is_empty());
    }
}
