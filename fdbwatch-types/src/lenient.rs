//! Shape-tolerant deserialization helpers.
//!
//! Every field of the status schema goes through one of these. A value is
//! first captured as a [`serde_json::Value`] (which cannot fail on valid
//! JSON) and then converted to the target type. Conversion failures are
//! logged and turned into `None` instead of failing the enclosing object.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Convert a captured value into `T`, or `None` if it is null or has the
/// wrong shape.
pub(crate) fn coerce<T: DeserializeOwned>(value: Value) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(parsed) => Some(parsed),
        Err(err) => {
            warn!(
                expected = std::any::type_name::<T>(),
                error = %err,
                "ignoring status field with unexpected shape"
            );
            None
        }
    }
}

/// `deserialize_with` target for a single optional field.
pub(crate) fn optional<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(coerce(Value::deserialize(deserializer)?))
}

/// `deserialize_with` target for an optional `key -> T` object.
///
/// Entries that do not convert are dropped individually, the rest of the
/// map is kept.
pub(crate) fn map<'de, D, T>(deserializer: D) -> Result<Option<BTreeMap<String, T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Object(entries) => Ok(Some(
            entries
                .into_iter()
                .filter_map(|(key, value)| coerce(value).map(|parsed| (key, parsed)))
                .collect(),
        )),
        other => {
            warn!(found = kind(&other), "expected an object, ignoring status field");
            Ok(None)
        }
    }
}

/// Short name of a JSON value's type, for log messages.
pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "optional")]
        value: Option<f64>,
        #[serde(default, deserialize_with = "map")]
        entries: Option<BTreeMap<String, f64>>,
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce::<f64>(json!(3)), Some(3.0));
        assert_eq!(coerce::<f64>(json!(0.25)), Some(0.25));
    }

    #[test]
    fn test_coerce_null_and_wrong_shape() {
        assert_eq!(coerce::<f64>(Value::Null), None);
        assert_eq!(coerce::<f64>(json!("12")), None);
        assert_eq!(coerce::<u64>(json!(-1)), None);
    }

    #[test]
    fn test_optional_field() {
        let sample: Sample = serde_json::from_value(json!({"value": 7})).unwrap();
        assert_eq!(sample.value, Some(7.0));

        let sample: Sample = serde_json::from_value(json!({})).unwrap();
        assert_eq!(sample.value, None);

        let sample: Sample = serde_json::from_value(json!({"value": [1, 2]})).unwrap();
        assert_eq!(sample.value, None);
    }

    #[test]
    fn test_map_drops_bad_entries() {
        let sample: Sample =
            serde_json::from_value(json!({"entries": {"a": 1, "b": "x", "c": 2.5}})).unwrap();
        let entries = sample.entries.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries.get("a"), Some(&1.0));
        assert_eq!(entries.get("c"), Some(&2.5));
    }

    #[test]
    fn test_map_of_wrong_shape() {
        let sample: Sample = serde_json::from_value(json!({"entries": [1, 2]})).unwrap();
        assert!(sample.entries.is_none());
    }

    #[test]
    fn test_kind() {
        assert_eq!(kind(&json!(null)), "null");
        assert_eq!(kind(&json!({"a": 1})), "object");
        assert_eq!(kind(&json!([1])), "array");
    }
}
