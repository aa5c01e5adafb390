//! Explode stage
//!
//! Turns every element of an array field into its own row and re-attaches
//! the parent fields (at least the protocol identifier). The store query
//! only guarantees that *some* element matched, so callers re-apply their
//! element predicate to the exploded rows.

use super::flatten::flatten_object;
use crate::domain::Row;
use serde_json::{Map, Value};

/// Explodes `array_field` of `doc` into one flattened row per element
///
/// Parent fields listed in `carry` come first in each row and take
/// precedence over same-named element fields. Non-object elements are
/// stored under `value`. A missing or non-array field yields no rows.
pub fn explode(doc: &Map<String, Value>, array_field: &str, carry: &[&str]) -> Vec<Row> {
    let Some(Value::Array(elements)) = doc.get(array_field) else {
        return Vec::new();
    };

    elements
        .iter()
        .map(|element| {
            let mut row = Row::new();
            for field in carry {
                row.insert(
                    field.to_string(),
                    doc.get(*field).cloned().unwrap_or(Value::Null),
                );
            }
            let flat = match element {
                Value::Object(map) => flatten_object(map.clone()),
                other => {
                    let mut single = Map::new();
                    single.insert("value".to_string(), other.clone());
                    single
                }
            };
            for (key, value) in flat {
                row.entry(key).or_insert(value);
            }
            row
        })
        .collect()
}
