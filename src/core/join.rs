//! Cross-collection join engine
//!
//! Joins two tables on the protocol identifier. Store-internal `_id`
//! columns are excluded from both sides and any other name present on both
//! sides gets a suffix on the right, so no value is silently shadowed.
//!
//! Each identifier appears exactly once in the output. When one input holds
//! several rows for the same identifier, its first row wins.

use crate::domain::{MetricTable, ProtocolId, Row, PROTOCOL_ID};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Store-internal identifier column
pub const INTERNAL_ID: &str = "_id";

/// Suffix appended to conflicting right-hand columns
pub const RIGHT_SUFFIX: &str = "_y";

/// Which identifiers survive the join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Identifiers of either side
    Outer,
    /// Identifiers of the left side only
    Left,
}

/// Joins the mission index with the mission details
pub fn join_index_details(index: MetricTable, details: MetricTable) -> MetricTable {
    join(index, details, JoinKind::Outer)
}

/// Joins two tables on [`PROTOCOL_ID`]
pub fn join(left: MetricTable, right: MetricTable, kind: JoinKind) -> MetricTable {
    let left_columns: Vec<String> = left
        .columns()
        .iter()
        .filter(|c| c.as_str() != INTERNAL_ID && c.as_str() != PROTOCOL_ID)
        .cloned()
        .collect();

    let mut taken: HashSet<String> = left_columns.iter().cloned().collect();
    taken.insert(PROTOCOL_ID.to_string());
    let right_columns: Vec<(String, String)> = right
        .columns()
        .iter()
        .filter(|c| c.as_str() != INTERNAL_ID && c.as_str() != PROTOCOL_ID)
        .map(|c| {
            let mut renamed = c.clone();
            while taken.contains(&renamed) {
                renamed.push_str(RIGHT_SUFFIX);
            }
            taken.insert(renamed.clone());
            (c.clone(), renamed)
        })
        .collect();

    let (left_order, mut left_rows) = key_rows(left.into_rows());
    let (right_order, mut right_rows) = key_rows(right.into_rows());

    let mut schema = vec![PROTOCOL_ID.to_string()];
    schema.extend(left_columns.iter().cloned());
    schema.extend(right_columns.iter().map(|(_, renamed)| renamed.clone()));
    let mut out = MetricTable::with_columns(schema);

    let mut emitted = HashSet::new();
    let right_ids: &[ProtocolId] = match kind {
        JoinKind::Outer => &right_order,
        JoinKind::Left => &[],
    };
    for id in left_order.iter().chain(right_ids) {
        if !emitted.insert(id.clone()) {
            continue;
        }
        let left_row = left_rows.remove(id);
        let right_row = right_rows.remove(id);

        let mut row = Row::new();
        row.insert(PROTOCOL_ID.to_string(), Value::String(id.as_str().to_string()));
        for column in &left_columns {
            let value = left_row
                .as_ref()
                .and_then(|r| r.get(column))
                .cloned()
                .unwrap_or(Value::Null);
            row.insert(column.clone(), value);
        }
        for (original, renamed) in &right_columns {
            let value = right_row
                .as_ref()
                .and_then(|r| r.get(original))
                .cloned()
                .unwrap_or(Value::Null);
            row.insert(renamed.clone(), value);
        }
        out.push_row(row);
    }
    out
}

/// Indexes rows by protocol identifier, keeping the first row per id
fn key_rows(rows: Vec<Row>) -> (Vec<ProtocolId>, HashMap<ProtocolId, Row>) {
    let mut order = Vec::new();
    let mut by_id = HashMap::new();
    let mut missing = 0usize;
    for row in rows {
        match row.get(PROTOCOL_ID).and_then(ProtocolId::from_value) {
            Some(id) => {
                if !by_id.contains_key(&id) {
                    order.push(id.clone());
                    by_id.insert(id, row);
                }
            }
            None => missing += 1,
        }
    }
    if missing > 0 {
        tracing::debug!(rows = missing, "Dropped rows without protocol identifier before join");
    }
    (order, by_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(rows: Vec<Value>) -> MetricTable {
        MetricTable::from_rows(
            rows.into_iter()
                .map(|v| v.as_object().cloned().unwrap())
                .collect(),
        )
    }

    #[test]
    fn test_outer_join_completeness() {
        let index = table(vec![
            json!({"_id": "i1", "protocolId": "A", "missionType": "Notfall", "updatedAt": "x"}),
            json!({"_id": "i2", "protocolId": "B", "missionType": "KTP", "updatedAt": "y"}),
        ]);
        let details = table(vec![
            json!({"_id": "d1", "protocolId": "B", "StatusAlarm": "t1", "updatedAt": "z"}),
            json!({"_id": "d2", "protocolId": "C", "StatusAlarm": "t2", "updatedAt": "w"}),
        ]);
        let joined = join_index_details(index, details);

        let ids: Vec<_> = joined.column_values(PROTOCOL_ID).cloned().collect();
        assert_eq!(ids, vec![json!("A"), json!("B"), json!("C")]);
        assert!(!joined.has_column("_id"));
        assert_eq!(
            joined.columns(),
            &["protocolId", "missionType", "updatedAt", "StatusAlarm", "updatedAt_y"]
        );

        let a = &joined.rows()[0];
        assert_eq!(a["StatusAlarm"], Value::Null);
        let b = &joined.rows()[1];
        assert_eq!(b["updatedAt"], json!("y"));
        assert_eq!(b["updatedAt_y"], json!("z"));
        let c = &joined.rows()[2];
        assert_eq!(c["missionType"], Value::Null);
        assert_eq!(c["StatusAlarm"], json!("t2"));
    }

    #[test]
    fn test_duplicate_ids_appear_once() {
        let left = table(vec![
            json!({"protocolId": "A", "v": 1}),
            json!({"protocolId": "A", "v": 2}),
        ]);
        let right = table(vec![
            json!({"protocolId": "A", "w": 3}),
            json!({"protocolId": "A", "w": 4}),
        ]);
        let joined = join(left, right, JoinKind::Outer);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.rows()[0]["v"], json!(1));
        assert_eq!(joined.rows()[0]["w"], json!(3));
    }

    #[test]
    fn test_left_join_drops_right_only() {
        let left = table(vec![json!({"protocolId": "A", "rea_status": true})]);
        let right = table(vec![
            json!({"protocolId": "A", "targetDestination": "Klinikum Nord"}),
            json!({"protocolId": "B", "targetDestination": "Klinikum Süd"}),
        ]);
        let joined = join(left, right, JoinKind::Left);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.rows()[0]["targetDestination"], json!("Klinikum Nord"));
    }

    #[test]
    fn test_empty_inputs_keep_schema() {
        let joined = join_index_details(
            MetricTable::empty(&["protocolId", "missionDate"]),
            MetricTable::empty(&["protocolId", "StatusAlarm"]),
        );
        assert!(joined.is_empty());
        assert_eq!(joined.columns(), &["protocolId", "missionDate", "StatusAlarm"]);
    }

    #[test]
    fn test_numeric_ids_match_string_ids() {
        let left = table(vec![json!({"protocolId": 4711, "v": 1})]);
        let right = table(vec![json!({"protocolId": "4711", "w": 2})]);
        let joined = join(left, right, JoinKind::Outer);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined.rows()[0]["protocolId"], json!("4711"));
    }
}
