//! Vital-sign loader (`protocols_vitals_<code>`)
//!
//! Every vital sign lives in its own collection. Elements carry a raw
//! `value` and its `unit`; no discriminator is involved.

use super::{base_row, collections, or_empty, schema_with, LoadScope, CONTENT_FIELD};
use crate::adapters::store::{FindQuery, RecordStore};
use crate::core::normalize::{explode, parse_number, stringify_map};
use crate::domain::{MetricTable, Result, Row, PROTOCOL_ID};
use serde_json::Value;

/// Recognized vital-sign codes
pub const VITAL_CODES: [&str; 10] = [
    "af", "bd", "bz", "co2", "co", "hb", "hf", "puls", "spo2", "temp",
];

pub fn is_vital_code(code: &str) -> bool {
    VITAL_CODES.contains(&code)
}

pub fn schema() -> Vec<&'static str> {
    schema_with(&["value", "value_num", "unit"])
}

/// Loads all readings of one vital sign
///
/// An unknown code yields an empty table without touching the store.
pub async fn load_vitals(store: &dyn RecordStore, code: &str, scope: LoadScope<'_>) -> MetricTable {
    let schema = schema();
    if !is_vital_code(code) {
        tracing::warn!(code, "Unknown vital-sign code");
        return MetricTable::empty(&schema);
    }

    let collection = collections::vitals(code);
    let result = try_load_vitals(store, code, &collection, scope, &schema).await;
    or_empty(code, &collection, &schema, result)
}

async fn try_load_vitals(
    store: &dyn RecordStore,
    code: &str,
    collection: &str,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let query = FindQuery::new(scope.id_filter()).with_limit(scope.limit);
    let docs = store.find(collection, &query).await?;

    let rows: Vec<Row> = docs
        .into_iter()
        .flat_map(|doc| explode(&stringify_map(doc), CONTENT_FIELD, &[PROTOCOL_ID]))
        .map(|reading| {
            let value = reading.get("value").cloned().unwrap_or(Value::Null);
            let mut row = base_row(&reading, code, collection);
            row.insert("value_num".to_string(), parse_number(&value));
            row.insert("value".to_string(), value);
            row.insert(
                "unit".to_string(),
                reading.get("unit").cloned().unwrap_or(Value::Null),
            );
            row
        })
        .collect();

    Ok(MetricTable::project(rows, schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::FixtureStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_load_pulse_readings() {
        let store = FixtureStore::new("db").with_collection(
            "protocols_vitals_puls",
            vec![json!({"protocolId": "P-1", "content": [
                {"value": "88", "unit": "/min", "timestamp": "2024-03-15T08:31:00", "source": "Monitor"},
                {"value": "n.m.", "unit": "/min"}
            ]})],
        );
        let table = load_vitals(&store, "puls", LoadScope::new(100)).await;
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), schema().as_slice());
        let first = &table.rows()[0];
        assert_eq!(first["metric"], json!("puls"));
        assert_eq!(first["value_num"], json!(88));
        assert_eq!(first["collection"], json!("protocols_vitals_puls"));
        assert_eq!(table.rows()[1]["value_num"], Value::Null);
    }

    #[tokio::test]
    async fn test_decimal_comma_temperature() {
        let store = FixtureStore::new("db").with_collection(
            "protocols_vitals_temp",
            vec![json!({"protocolId": "P-1", "content": [{"value": "36,8", "unit": "°C"}]})],
        );
        let table = load_vitals(&store, "temp", LoadScope::new(100)).await;
        assert_eq!(table.rows()[0]["value_num"], json!(36.8));
    }

    #[tokio::test]
    async fn test_unknown_code_skips_store() {
        let store = FixtureStore::new("db");
        let table = load_vitals(&store, "xyz", LoadScope::new(100)).await;
        assert!(table.is_empty());
        assert_eq!(table.columns(), schema().as_slice());
        assert_eq!(store.query_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_collection_is_empty() {
        let store = FixtureStore::new("db").with_unavailable_collection("protocols_vitals_spo2");
        let table = load_vitals(&store, "spo2", LoadScope::new(100)).await;
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 8);
    }
}
