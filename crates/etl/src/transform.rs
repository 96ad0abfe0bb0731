//! Declarative record transformations.

use std::collections::{HashMap, HashSet};

use pipewright_core::{
    coerce_string, field_value, AggregateConfig, AggregateFunction, DedupConfig, FilterConfig,
    FilterOperator, MapConfig, Record, TransformSpec, ValidateAction, ValidateConfig,
};
use serde_json::{Number, Value};

/// Errors raised by unrecoverable transformation stages. Per-record
/// `validate` failures are handled by the stage's configured action and
/// never surface here.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// A stage's configuration cannot be applied to any record
    #[error("invalid transformation config: {0}")]
    Config(String),
}

/// Delimiter joining field values into a composite group/dedup key.
const KEY_DELIMITER: &str = "|";

/// Applies an ordered list of transformations to a record sequence.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transformer;

impl Transformer {
    /// Create a transformer.
    pub fn new() -> Self {
        Self
    }

    /// Apply the given stages strictly in order, each consuming the
    /// previous stage's output. Unknown stage kinds pass records
    /// through unchanged with a warning.
    pub fn transform(
        &self,
        records: Vec<Record>,
        specs: &[TransformSpec],
    ) -> Result<Vec<Record>, TransformError> {
        let mut current = records;
        for spec in specs {
            current = match spec {
                TransformSpec::Filter(config) => apply_filter(current, config),
                TransformSpec::Map(config) => apply_map(current, config),
                TransformSpec::Aggregate(config) => apply_aggregate(current, config)?,
                TransformSpec::Deduplicate(config) => apply_deduplicate(current, config),
                TransformSpec::Validate(config) => apply_validate(current, config),
                TransformSpec::Other => {
                    tracing::warn!("unknown transformation kind, passing records through");
                    current
                }
            };
        }
        Ok(current)
    }
}

fn apply_filter(records: Vec<Record>, config: &FilterConfig) -> Vec<Record> {
    records
        .into_iter()
        .filter(|record| matches_filter(record, config))
        .collect()
}

fn matches_filter(record: &Record, config: &FilterConfig) -> bool {
    let value = record.get(&config.field).unwrap_or(&Value::Null);
    match config.operator {
        FilterOperator::Equals => *value == config.value,
        FilterOperator::NotEquals => *value != config.value,
        FilterOperator::GreaterThan => match (value.as_f64(), config.value.as_f64()) {
            (Some(lhs), Some(rhs)) => lhs > rhs,
            _ => false,
        },
        FilterOperator::LessThan => match (value.as_f64(), config.value.as_f64()) {
            (Some(lhs), Some(rhs)) => lhs < rhs,
            _ => false,
        },
        FilterOperator::Contains => coerce_string(value).contains(&coerce_string(&config.value)),
        FilterOperator::Exists => !value.is_null(),
    }
}

fn apply_map(records: Vec<Record>, config: &MapConfig) -> Vec<Record> {
    records
        .into_iter()
        .map(|record| {
            let mut mapped = Record::new();
            for mapping in &config.fields {
                let value = record.get(&mapping.source).cloned().unwrap_or(Value::Null);
                mapped.insert(mapping.target.clone(), value);
            }
            mapped
        })
        .collect()
}

fn composite_key(record: &Record, fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| coerce_string(record.get(f).unwrap_or(&Value::Null)))
        .collect::<Vec<_>>()
        .join(KEY_DELIMITER)
}

fn apply_aggregate(
    records: Vec<Record>,
    config: &AggregateConfig,
) -> Result<Vec<Record>, TransformError> {
    if config.aggregations.is_empty() {
        return Err(TransformError::Config(
            "aggregate requires at least one aggregation".to_string(),
        ));
    }

    // Group in first-seen order.
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Record>> = HashMap::new();
    for record in records {
        let key = composite_key(&record, &config.group_by);
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(record);
    }

    let mut output = Vec::with_capacity(order.len());
    for key in order {
        let members = &groups[&key];
        let mut record = Record::new();
        for field in &config.group_by {
            let value = members[0].get(field).cloned().unwrap_or(Value::Null);
            record.insert(field.clone(), value);
        }
        for aggregation in &config.aggregations {
            let output_field = aggregation.output.clone().unwrap_or_else(|| {
                format!("{}_{}", aggregation.field, aggregation.function.name())
            });
            record.insert(output_field, aggregate_value(members, aggregation));
        }
        output.push(record);
    }
    Ok(output)
}

fn aggregate_value(members: &[Record], aggregation: &pipewright_core::Aggregation) -> Value {
    if aggregation.function == AggregateFunction::Count {
        return Value::from(members.len() as u64);
    }

    // Non-numeric and null values are excluded from numeric aggregates.
    let values: Vec<f64> = members
        .iter()
        .filter_map(|r| field_value(r, &aggregation.field))
        .filter_map(Value::as_f64)
        .collect();

    let result = match aggregation.function {
        AggregateFunction::Count => unreachable!(),
        AggregateFunction::Sum => Some(values.iter().sum()),
        AggregateFunction::Avg => {
            if values.is_empty() {
                None
            } else {
                Some(values.iter().sum::<f64>() / values.len() as f64)
            }
        }
        AggregateFunction::Min => values.iter().copied().reduce(f64::min),
        AggregateFunction::Max => values.iter().copied().reduce(f64::max),
    };

    match result {
        Some(n) => Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null),
        None => Value::Null,
    }
}

fn apply_deduplicate(records: Vec<Record>, config: &DedupConfig) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(composite_key(record, &config.fields)))
        .collect()
}

fn apply_validate(records: Vec<Record>, config: &ValidateConfig) -> Vec<Record> {
    match config.on_failure {
        ValidateAction::Filter => records
            .into_iter()
            .filter(|record| satisfies_schema(record, config))
            .collect(),
        // Failures are intentionally swallowed: records pass through.
        ValidateAction::Pass => records,
    }
}

fn satisfies_schema(record: &Record, config: &ValidateConfig) -> bool {
    config.schema.iter().all(|(field, field_type)| {
        matches!(field_value(record, field), Some(value) if field_type.matches(value))
    })
}
