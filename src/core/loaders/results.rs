//! Clinical results loader (`protocols_results`)

use super::index::load_index;
use super::slots::{
    ResultEntry, Slot, DISCRIMINATOR, NACA, PHYSICIAN_REQUEST, REANIMATION, SYMPTOM_ONSET,
};
use super::{base_row, collections, fetch_slots, or_empty, schema_with, LoadScope};
use crate::adapters::store::{Filter, RecordStore};
use crate::core::join::{join, JoinKind};
use crate::core::normalize::datetime::format_timestamp;
use crate::core::normalize::{coerce_bool, combine_date_time, parse_number};
use crate::domain::{MetricTable, ProtocolId, Result, Row, PROTOCOL_ID};
use serde_json::Value;
use std::collections::HashMap;

/// NACA score that denotes resuscitation
pub const NACA_REANIMATION: &str = "6";

/// Results with one row per element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultMetric {
    Naca,
    PhysicianRequest,
}

impl ResultMetric {
    pub fn name(self) -> &'static str {
        match self {
            ResultMetric::Naca => "NACA",
            ResultMetric::PhysicianRequest => "NA-Nachforderung",
        }
    }

    fn discriminator(self) -> &'static str {
        match self {
            ResultMetric::Naca => NACA,
            ResultMetric::PhysicianRequest => PHYSICIAN_REQUEST,
        }
    }

    pub fn schema(self) -> Vec<&'static str> {
        match self {
            ResultMetric::Naca => schema_with(&["value", "value_num"]),
            ResultMetric::PhysicianRequest => schema_with(&["value"]),
        }
    }
}

pub fn reanimation_schema() -> Vec<&'static str> {
    schema_with(&["naca_value", "rea_value", "rea_status"])
}

pub fn reanimation_destination_schema() -> Vec<&'static str> {
    schema_with(&["rea_status", "targetDestination", "leadingDiagnosis"])
}

pub fn symptom_onset_schema() -> Vec<&'static str> {
    schema_with(&["onset", "onset_date", "onset_time", "onset_specification"])
}

/// Loads NACA scores or physician requests, one row per element
pub async fn load_metric_from_results(
    store: &dyn RecordStore,
    metric: ResultMetric,
    scope: LoadScope<'_>,
) -> MetricTable {
    let schema = metric.schema();
    let result = try_load_metric(store, metric, scope, &schema).await;
    or_empty(metric.name(), collections::RESULTS, &schema, result)
}

async fn try_load_metric(
    store: &dyn RecordStore,
    metric: ResultMetric,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let element = Filter::eq(DISCRIMINATOR, metric.discriminator());
    let rows = fetch_slots(store, collections::RESULTS, &element, scope).await?;

    let out: Vec<Row> = rows
        .iter()
        .filter_map(|row| {
            let entry = ResultEntry::decode(&Slot::from_row(row)?)?;
            let mut out = base_row(row, metric.name(), collections::RESULTS);
            match entry {
                ResultEntry::Naca(value) => {
                    out.insert("value_num".to_string(), parse_number(&value));
                    out.insert("value".to_string(), value);
                }
                ResultEntry::PhysicianRequest(value) => {
                    out.insert("value".to_string(), coerce_bool(value));
                }
                _ => return None,
            }
            Some(out)
        })
        .collect();

    Ok(MetricTable::project(out, schema))
}

/// Loads resuscitation evidence from both signals
///
/// A NACA score of 6 and an explicit `Reanimation` result each indicate
/// resuscitation. Rows of both queries are concatenated and every row gets
/// `rea_status = naca_value == "6" || rea_value is ja/yes`.
pub async fn load_reanimation(store: &dyn RecordStore, scope: LoadScope<'_>) -> MetricTable {
    let schema = reanimation_schema();
    let result = try_load_reanimation(store, scope, &schema).await;
    or_empty("Reanimation", collections::RESULTS, &schema, result)
}

async fn try_load_reanimation(
    store: &dyn RecordStore,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let naca_element = Filter::and([
        Filter::eq(DISCRIMINATOR, NACA),
        Filter::is_in("value_2", [Value::from(NACA_REANIMATION), Value::from(6)]),
    ]);
    let rea_element = Filter::eq(DISCRIMINATOR, REANIMATION);

    let naca_rows = fetch_slots(store, collections::RESULTS, &naca_element, scope).await?;
    let rea_rows = fetch_slots(store, collections::RESULTS, &rea_element, scope).await?;

    let naca = reanimation_evidence(&naca_rows, schema);
    let rea = reanimation_evidence(&rea_rows, schema);
    Ok(naca.concat(rea))
}

fn reanimation_evidence(rows: &[Row], schema: &[&str]) -> MetricTable {
    let out: Vec<Row> = rows
        .iter()
        .filter_map(|row| {
            let entry = ResultEntry::decode(&Slot::from_row(row)?)?;
            let (naca_value, rea_value) = match entry {
                ResultEntry::Naca(v) => (v, Value::Null),
                ResultEntry::Reanimation(v) => (Value::Null, v),
                _ => return None,
            };
            let mut out = base_row(row, "Reanimation", collections::RESULTS);
            let status = is_naca_reanimation(&naca_value)
                || coerce_bool(rea_value.clone()) == Value::Bool(true);
            out.insert("naca_value".to_string(), naca_value);
            out.insert("rea_value".to_string(), rea_value);
            out.insert("rea_status".to_string(), Value::Bool(status));
            Some(out)
        })
        .collect();

    MetricTable::project(out, schema)
}

fn is_naca_reanimation(value: &Value) -> bool {
    match value {
        Value::String(s) => s.trim() == NACA_REANIMATION,
        Value::Number(n) => n.as_f64() == Some(6.0),
        _ => false,
    }
}

/// One row per resuscitation mission with its transport destination
///
/// `rea_status` is true if any evidence row of the mission is. Destination
/// and leading diagnosis come from the mission index; missions missing
/// from the index keep them null.
pub async fn load_reanimation_with_destination(
    store: &dyn RecordStore,
    scope: LoadScope<'_>,
) -> MetricTable {
    let schema = reanimation_destination_schema();
    let evidence = load_reanimation(store, scope).await;

    let per_mission = collapse_reanimation(evidence);
    if per_mission.is_empty() {
        return MetricTable::empty(&schema);
    }

    let ids = per_mission.protocol_ids();
    let index = load_index(store, None, LoadScope::new(scope.limit).with_protocol_ids(&ids)).await;
    let index = MetricTable::project(
        index.into_rows(),
        &[PROTOCOL_ID, "targetDestination", "leadingDiagnosis"],
    );

    let joined = join(per_mission, index, JoinKind::Left);
    MetricTable::project(joined.into_rows(), &schema)
}

fn collapse_reanimation(evidence: MetricTable) -> MetricTable {
    let mut order: Vec<ProtocolId> = Vec::new();
    let mut by_id: HashMap<ProtocolId, Row> = HashMap::new();

    for row in evidence.into_rows() {
        let Some(id) = row.get(PROTOCOL_ID).and_then(ProtocolId::from_value) else {
            continue;
        };
        let status = row.get("rea_status") == Some(&Value::Bool(true));
        match by_id.get_mut(&id) {
            Some(existing) => {
                if status {
                    existing.insert("rea_status".to_string(), Value::Bool(true));
                }
            }
            None => {
                let mut out = Row::new();
                for column in ["metric", "timestamp", "source", "collection"] {
                    out.insert(column.to_string(), row.get(column).cloned().unwrap_or(Value::Null));
                }
                out.insert(PROTOCOL_ID.to_string(), Value::String(id.as_str().to_string()));
                out.insert("rea_status".to_string(), Value::Bool(status));
                order.push(id.clone());
                by_id.insert(id, out);
            }
        }
    }

    let rows: Vec<Row> = order
        .into_iter()
        .filter_map(|id| by_id.remove(&id))
        .map(|mut row| {
            row.insert(
                "metric".to_string(),
                Value::String("Reanimation_mit_targetDestination".to_string()),
            );
            row
        })
        .collect();
    MetricTable::project(
        rows,
        &[PROTOCOL_ID, "metric", "timestamp", "source", "collection", "rea_status"],
    )
}

/// Part of a symptom-onset record, classified by its separators
#[derive(Debug, Clone, PartialEq)]
enum OnsetPart {
    Date(String),
    Time(String),
    Specification(Value),
}

fn classify_onset(value: Value) -> OnsetPart {
    match &value {
        Value::String(s) if s.contains('.') => OnsetPart::Date(s.trim().to_string()),
        Value::String(s) if s.contains(':') => OnsetPart::Time(s.trim().to_string()),
        _ => OnsetPart::Specification(value),
    }
}

/// Loads symptom onset merged into one row per mission
///
/// Date and time arrive as separate elements sharing the discriminator.
/// Values containing `.` are dates, values containing `:` are times and
/// anything else is the specification. `onset` is the recombined
/// timestamp, or null.
pub async fn load_symptom_onset(store: &dyn RecordStore, scope: LoadScope<'_>) -> MetricTable {
    let schema = symptom_onset_schema();
    let result = try_load_symptom_onset(store, scope, &schema).await;
    or_empty("Symptombeginn", collections::RESULTS, &schema, result)
}

async fn try_load_symptom_onset(
    store: &dyn RecordStore,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let element = Filter::eq(DISCRIMINATOR, SYMPTOM_ONSET);
    let rows = fetch_slots(store, collections::RESULTS, &element, scope).await?;

    let mut order: Vec<ProtocolId> = Vec::new();
    let mut groups: HashMap<ProtocolId, Row> = HashMap::new();
    for row in &rows {
        let Some(id) = row.get(PROTOCOL_ID).and_then(ProtocolId::from_value) else {
            continue;
        };
        let Some(ResultEntry::SymptomOnset(value)) =
            Slot::from_row(row).and_then(|slot| ResultEntry::decode(&slot))
        else {
            continue;
        };

        let out = groups.entry(id.clone()).or_insert_with(|| {
            order.push(id.clone());
            let mut out = base_row(row, "Symptombeginn", collections::RESULTS);
            for column in ["onset_date", "onset_time", "onset_specification"] {
                out.insert(column.to_string(), Value::Null);
            }
            out
        });

        let (column, value) = match classify_onset(value) {
            OnsetPart::Date(d) => ("onset_date", Value::String(d)),
            OnsetPart::Time(t) => ("onset_time", Value::String(t)),
            OnsetPart::Specification(v) => ("onset_specification", v),
        };
        if out.get(column).map_or(true, Value::is_null) {
            out.insert(column.to_string(), value);
        }
    }

    let mut unparsable = 0usize;
    let merged: Vec<Row> = order
        .into_iter()
        .filter_map(|id| groups.remove(&id))
        .map(|mut row| {
            let date = row.get("onset_date").and_then(Value::as_str);
            let time = row.get("onset_time").and_then(Value::as_str);
            let onset = combine_date_time(date, time);
            if onset.is_none() && date.is_some() && time.is_some() {
                unparsable += 1;
            }
            let onset = onset
                .map(|ts| Value::String(format_timestamp(ts)))
                .unwrap_or(Value::Null);
            row.insert("onset".to_string(), onset);
            row
        })
        .collect();

    if unparsable > 0 {
        tracing::warn!(metric = "Symptombeginn", values = unparsable, "Unparsable symptom onsets set to null");
    }
    Ok(MetricTable::project(merged, schema))
}
