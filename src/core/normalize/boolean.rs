//! ja/nein boolean coercion
//!
//! Only the fixed vocabulary is translated. Everything else, including
//! `null`, numbers and unknown strings, passes through unchanged.

use crate::domain::MetricTable;
use serde_json::Value;

/// Flag columns coerced in mission records
pub const BOOLEAN_FIELDS: [&str; 3] = ["flashingLights", "transportFlashingLights", "nachforderungNA"];

/// Maps a ja/yes/nein/no string to a boolean
pub fn parse_ja_nein(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "ja" | "yes" => Some(true),
        "nein" | "no" => Some(false),
        _ => None,
    }
}

/// Coerces one cell; values outside the vocabulary are returned as-is
pub fn coerce_bool(value: Value) -> Value {
    match &value {
        Value::String(s) => parse_ja_nein(s).map(Value::Bool).unwrap_or(value),
        _ => value,
    }
}

/// Applies [`coerce_bool`] to every column named `field` or ending in `_field`
pub fn coerce_bool_fields(table: &mut MetricTable, fields: &[&str]) {
    let targets: Vec<String> = table
        .columns()
        .iter()
        .filter(|column| {
            fields.iter().any(|field| {
                column.as_str() == *field || column.ends_with(&format!("_{field}"))
            })
        })
        .cloned()
        .collect();

    for column in targets {
        table.map_column(&column, coerce_bool);
    }
}
