//! Structured findings loader (`protocols_findings`)

use super::slots::{FindingEntry, PupilSide, ScoreKind, Slot, DISCRIMINATOR, NEUROLOGY};
use super::{base_row, collections, fetch_slots, or_empty, schema_with, LoadScope};
use crate::adapters::store::{Filter, RecordStore};
use crate::core::normalize::parse_number;
use crate::domain::{MetricTable, ProtocolId, Result, Row, PROTOCOL_ID};
use serde_json::Value;
use std::collections::HashMap;

/// Metrics read from findings with one row per element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindingMetric {
    Score(ScoreKind),
    Neurology,
}

impl FindingMetric {
    /// Metric name as exposed by the registry
    pub fn name(self) -> &'static str {
        match self {
            FindingMetric::Score(kind) => kind.discriminator(),
            FindingMetric::Neurology => "Neurologische_Auffälligkeiten",
        }
    }

    fn discriminator(self) -> &'static str {
        match self {
            FindingMetric::Score(kind) => kind.discriminator(),
            FindingMetric::Neurology => NEUROLOGY,
        }
    }

    pub fn schema(self) -> Vec<&'static str> {
        match self {
            FindingMetric::Score(_) => schema_with(&["value", "value_num"]),
            FindingMetric::Neurology => schema_with(&["sign", "detail"]),
        }
    }
}

/// Output schema of the pupil-status metric
pub fn pupil_schema() -> Vec<&'static str> {
    schema_with(&["pupil_left", "pupil_right"])
}

/// Loads a score or neurology finding, one row per matching element
pub async fn load_metric_from_findings(
    store: &dyn RecordStore,
    metric: FindingMetric,
    scope: LoadScope<'_>,
) -> MetricTable {
    let schema = metric.schema();
    let result = try_load_metric(store, metric, scope, &schema).await;
    or_empty(metric.name(), collections::FINDINGS, &schema, result)
}

async fn try_load_metric(
    store: &dyn RecordStore,
    metric: FindingMetric,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let element = Filter::eq(DISCRIMINATOR, metric.discriminator());
    let rows = fetch_slots(store, collections::FINDINGS, &element, scope).await?;

    let out = rows
        .iter()
        .filter_map(|row| {
            let entry = FindingEntry::decode(&Slot::from_row(row)?)?;
            let mut out = base_row(row, metric.name(), collections::FINDINGS);
            match entry {
                FindingEntry::Score { value, .. } => {
                    out.insert("value_num".to_string(), parse_number(&value));
                    out.insert("value".to_string(), value);
                }
                FindingEntry::Neurological { sign, detail } => {
                    out.insert("sign".to_string(), sign);
                    out.insert("detail".to_string(), detail);
                }
                FindingEntry::Pupil { .. } => return None,
            }
            Some(out)
        })
        .collect();

    Ok(MetricTable::project(out, schema))
}

/// Loads left and right pupil reactions merged into one row per mission
///
/// Both sides are queried independently. Timestamp and source come from
/// the left-eye record when there is one.
pub async fn load_pupil_status(store: &dyn RecordStore, scope: LoadScope<'_>) -> MetricTable {
    let schema = pupil_schema();
    let result = try_load_pupils(store, scope, &schema).await;
    or_empty("Pupillenstatus", collections::FINDINGS, &schema, result)
}

async fn try_load_pupils(
    store: &dyn RecordStore,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let left = load_side(store, PupilSide::Left, scope).await?;
    let right = load_side(store, PupilSide::Right, scope).await?;

    let mut right_by_id: HashMap<ProtocolId, Row> = HashMap::new();
    let mut right_order = Vec::new();
    for row in right {
        if let Some(id) = row.get(PROTOCOL_ID).and_then(ProtocolId::from_value) {
            if !right_by_id.contains_key(&id) {
                right_order.push(id.clone());
                right_by_id.insert(id, row);
            }
        }
    }

    let mut merged = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for row in left {
        let Some(id) = row.get(PROTOCOL_ID).and_then(ProtocolId::from_value) else {
            continue;
        };
        if !seen.insert(id.clone()) {
            continue;
        }
        let mut out = base_row(&row, "Pupillenstatus", collections::FINDINGS);
        out.insert("pupil_left".to_string(), reaction(&row));
        out.insert(
            "pupil_right".to_string(),
            right_by_id.get(&id).map(reaction).unwrap_or(Value::Null),
        );
        merged.push(out);
    }
    for id in right_order {
        if seen.contains(&id) {
            continue;
        }
        if let Some(row) = right_by_id.get(&id) {
            let mut out = base_row(row, "Pupillenstatus", collections::FINDINGS);
            out.insert("pupil_left".to_string(), Value::Null);
            out.insert("pupil_right".to_string(), reaction(row));
            merged.push(out);
        }
    }

    Ok(MetricTable::project(merged, schema))
}

async fn load_side(
    store: &dyn RecordStore,
    side: PupilSide,
    scope: LoadScope<'_>,
) -> Result<Vec<Row>> {
    let element = Filter::eq(DISCRIMINATOR, side.discriminator());
    fetch_slots(store, collections::FINDINGS, &element, scope).await
}

fn reaction(row: &Row) -> Value {
    Slot::from_row(row)
        .and_then(|slot| FindingEntry::decode(&slot))
        .and_then(|entry| match entry {
            FindingEntry::Pupil { reaction, .. } => Some(reaction),
            _ => None,
        })
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::FixtureStore;
    use serde_json::json;

    fn store() -> FixtureStore {
        FixtureStore::new("db").with_collection(
            collections::FINDINGS,
            vec![
                json!({"protocolId": "P-1", "content": [
                    {"value_1": "GCS", "value_2": "14", "timestamp": "2024-03-15T08:40:00", "source": "tablet"},
                    {"value_1": "Pupillenreaktion links", "value_2": "prompt", "timestamp": "2024-03-15T08:41:00", "source": "left"},
                    {"value_1": "Pupillenreaktion rechts", "value_2": "träge", "timestamp": "2024-03-15T08:42:00", "source": "right"}
                ]}),
                json!({"protocolId": "P-2", "content": [
                    {"value_1": "Pupillenreaktion rechts", "value_2": "keine", "source": "right-only"},
                    {"value_1": "Neurologische Auffälligkeiten", "value_2": "Aphasie", "value_3": "seit 1h"}
                ]}),
            ],
        )
    }

    #[tokio::test]
    async fn test_gcs_rows() {
        let table = load_metric_from_findings(
            &store(),
            FindingMetric::Score(ScoreKind::Gcs),
            LoadScope::new(100),
        )
        .await;
        assert_eq!(table.len(), 1);
        let row = &table.rows()[0];
        assert_eq!(row["metric"], json!("GCS"));
        assert_eq!(row["value"], json!("14"));
        assert_eq!(row["value_num"], json!(14));
        assert_eq!(row["collection"], json!("protocols_findings"));
        assert_eq!(row["timestamp"], json!("2024-03-15T08:40:00"));
    }

    #[tokio::test]
    async fn test_neurology_rows() {
        let table =
            load_metric_from_findings(&store(), FindingMetric::Neurology, LoadScope::new(100)).await;
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0]["sign"], json!("Aphasie"));
        assert_eq!(table.rows()[0]["detail"], json!("seit 1h"));
    }

    #[tokio::test]
    async fn test_pupils_merge_left_biased() {
        let table = load_pupil_status(&store(), LoadScope::new(100)).await;
        assert_eq!(table.len(), 2);

        let p1 = &table.rows()[0];
        assert_eq!(p1["protocolId"], json!("P-1"));
        assert_eq!(p1["pupil_left"], json!("prompt"));
        assert_eq!(p1["pupil_right"], json!("träge"));
        assert_eq!(p1["source"], json!("left"));
        assert_eq!(p1["timestamp"], json!("2024-03-15T08:41:00"));

        let p2 = &table.rows()[1];
        assert_eq!(p2["pupil_left"], Value::Null);
        assert_eq!(p2["pupil_right"], json!("keine"));
        assert_eq!(p2["source"], json!("right-only"));
    }

    #[tokio::test]
    async fn test_unavailable_collection_yields_schema() {
        let store = FixtureStore::new("db").with_unavailable_collection(collections::FINDINGS);
        let table = load_pupil_status(&store, LoadScope::new(10)).await;
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), pupil_schema().len());
    }
}
