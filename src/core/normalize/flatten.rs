//! Nested-object flattening
//!
//! Converts nested objects into top-level columns named `parent_child`:
//! - `{"content": {"dateStatusAlarm": ..}}` → `content_dateStatusAlarm`
//! - `{"address": {"geo": {"lat": ..}}}` → `address_geo_lat`
//!
//! Arrays are kept as cell values; the explode stage handles the arrays
//! that carry clinical facts.

use serde_json::{Map, Value};

/// Separator between parent and child names
pub const SEPARATOR: &str = "_";

/// Flattens an object into a single-level map
///
/// When a flattened name collides with an existing one, the first
/// occurrence wins.
pub fn flatten_object(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(&mut out, None, map);
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, map: Map<String, Value>) {
    for (key, value) in map {
        let name = match prefix {
            Some(p) => format!("{p}{SEPARATOR}{}", flatten_path(&key)),
            None => flatten_path(&key),
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&name), inner),
            other => {
                out.entry(name).or_insert(other);
            }
        }
    }
}

/// Replaces path separators inside a single key with `_`
///
/// - `.` → `_`
/// - `/` → `_`
/// - `:` → `_`
/// - `|` → `_`
pub fn flatten_path(path: &str) -> String {
    path.replace(['.', '/', ':', '|'], SEPARATOR)
}
