//! Records flowing through ETL pipelines.

use serde_json::Value;

/// A single data record: a JSON object mapping field names to values.
pub type Record = serde_json::Map<String, Value>;

/// Look up a field, treating JSON null the same as an absent key.
pub fn field_value<'a>(record: &'a Record, field: &str) -> Option<&'a Value> {
    match record.get(field) {
        Some(Value::Null) | None => None,
        Some(v) => Some(v),
    }
}

/// Coerce a value to a string: strings as-is, everything else via its
/// JSON rendering.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a field counts as missing: absent, null, or an empty string.
pub fn is_missing(record: &Record, field: &str) -> bool {
    match record.get(field) {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: serde_json::Value) -> Record {
        v.as_object().unwrap().clone()
    }

    #[test]
    fn null_and_absent_are_equivalent() {
        let r = record(json!({"a": null, "b": 1}));
        assert!(field_value(&r, "a").is_none());
        assert!(field_value(&r, "missing").is_none());
        assert_eq!(field_value(&r, "b"), Some(&json!(1)));
    }

    #[test]
    fn empty_string_is_missing_but_present() {
        let r = record(json!({"a": ""}));
        assert!(is_missing(&r, "a"));
        assert!(field_value(&r, "a").is_some());
    }
}
