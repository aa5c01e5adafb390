//! Identifier stringification
//!
//! Store adapters render native identifiers and dates in extended-JSON
//! form. Nothing leaves the normalization layer in that form: object ids
//! become their hex string, dates become ISO-8601 strings and wrapped
//! numbers become plain JSON numbers.

use super::datetime::{format_timestamp, parse_datetime_value};
use serde_json::{Map, Value};

/// Converts extended-JSON wrappers anywhere inside `value` to plain values
pub fn stringify_value(value: Value) -> Value {
    match value {
        Value::Object(map) => match unwrap_extended(&map) {
            Some(plain) => plain,
            None => Value::Object(stringify_map(map)),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(stringify_value).collect()),
        other => other,
    }
}

/// Applies [`stringify_value`] to every field of a document
pub fn stringify_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(k, v)| (k, stringify_value(v)))
        .collect()
}

fn unwrap_extended(map: &Map<String, Value>) -> Option<Value> {
    if map.len() != 1 {
        return None;
    }
    let (key, inner) = map.iter().next()?;
    match key.as_str() {
        "$oid" => inner.as_str().map(|s| Value::String(s.to_string())),
        "$date" => {
            let wrapped = Value::Object(map.clone());
            Some(
                parse_datetime_value(&wrapped)
                    .map(|ts| Value::String(format_timestamp(ts)))
                    .unwrap_or(Value::Null),
            )
        }
        "$numberLong" | "$numberInt" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from),
        "$numberDouble" | "$numberDecimal" => inner
            .as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        _ => None,
    }
}
