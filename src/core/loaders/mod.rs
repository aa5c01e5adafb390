//! Collection loaders
//!
//! One loader per collection family. Each public `load_*` function issues
//! a store query, unpacks the matching documents and returns a
//! [`MetricTable`] with a fixed schema.
//!
//! Loaders never fail: a store or decoding error is logged at `warn` and
//! replaced by an empty table carrying the full schema, so one broken
//! collection never takes sibling metrics down with it.
//!
//! - [`index`] - mission index and mission detail
//! - [`findings`] - structured findings (GCS, pain, neurology, pupils)
//! - [`measures`] - care measures (medication, intubation, 12-lead ECG)
//! - [`results`] - clinical results (NACA, resuscitation, symptom onset)
//! - [`vitals`] - per-vital-sign collections
//! - [`freetext`] - free-text protocol sections
//! - [`etu`] - dispatch-center mission log
//! - [`slots`] - decoders for the generic `value_1..value_N` slots

pub mod etu;
pub mod findings;
pub mod freetext;
pub mod index;
pub mod measures;
pub mod results;
pub mod slots;
pub mod vitals;

use crate::adapters::store::{Filter, FindQuery, RecordStore};
use crate::core::normalize::datetime::normalize_datetime_value;
use crate::core::normalize::{explode, stringify_map};
use crate::domain::{MetricTable, ProtocolIdSet, Result, Row, PROTOCOL_ID};
use serde_json::Value;

/// Source collection names
pub mod collections {
    pub const INDEX: &str = "nida_index";
    pub const DETAILS: &str = "protocols_details";
    pub const FINDINGS: &str = "protocols_findings";
    pub const MEASURES: &str = "protocols_measures";
    pub const RESULTS: &str = "protocols_results";
    pub const FREETEXTS: &str = "protocols_freetexts";
    pub const ETU: &str = "etu_leitstelle";

    /// Collection holding one vital sign
    pub fn vitals(code: &str) -> String {
        format!("protocols_vitals_{code}")
    }
}

/// Array field holding the slots of findings, measures, results and vitals
pub const CONTENT_FIELD: &str = "content";

/// Columns shared by every metric table
pub const COMMON_COLUMNS: [&str; 5] = [PROTOCOL_ID, "metric", "timestamp", "source", "collection"];

/// Bounds of one load: row limit and optional protocol-id restriction
#[derive(Debug, Clone, Copy)]
pub struct LoadScope<'a> {
    /// Maximum number of documents fetched per query
    pub limit: usize,

    /// Pushed down into the store query when present
    pub protocol_ids: Option<&'a ProtocolIdSet>,
}

impl<'a> LoadScope<'a> {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            protocol_ids: None,
        }
    }

    pub fn with_protocol_ids(mut self, ids: &'a ProtocolIdSet) -> Self {
        self.protocol_ids = Some(ids);
        self
    }

    /// Store-level filter for the protocol-id restriction
    pub fn id_filter(&self) -> Filter {
        match self.protocol_ids {
            Some(ids) => Filter::is_in(PROTOCOL_ID, ids.iter().map(|id| id.as_str())),
            None => Filter::All,
        }
    }
}

/// Builds a schema from the common columns plus metric-specific ones
pub fn schema_with(values: &[&'static str]) -> Vec<&'static str> {
    COMMON_COLUMNS.iter().chain(values).copied().collect()
}

/// Replaces a failed load by an empty, fully-shaped table
pub(crate) fn or_empty(
    metric: &str,
    collection: &str,
    schema: &[&str],
    result: Result<MetricTable>,
) -> MetricTable {
    match result {
        Ok(table) => {
            tracing::debug!(metric, collection, rows = table.len(), "Loaded metric table");
            table
        }
        Err(e) => {
            tracing::warn!(metric, collection, error = %e, "Loader failed, returning empty table");
            MetricTable::empty(schema)
        }
    }
}

/// Fetches documents whose content array holds at least one element
/// matching `element`, then explodes and re-filters them per element
///
/// The store predicate only proves array membership; the second pass
/// keeps exactly the elements that match.
pub(crate) async fn fetch_slots(
    store: &dyn RecordStore,
    collection: &str,
    element: &Filter,
    scope: LoadScope<'_>,
) -> Result<Vec<Row>> {
    let filter = Filter::and([
        Filter::elem_match(CONTENT_FIELD, element.clone()),
        scope.id_filter(),
    ]);
    let query = FindQuery::new(filter).with_limit(scope.limit);
    let docs = store.find(collection, &query).await?;

    let mut rows = Vec::new();
    for doc in docs {
        let doc = stringify_map(doc);
        rows.extend(
            explode(&doc, CONTENT_FIELD, &[PROTOCOL_ID])
                .into_iter()
                .filter(|row| element.matches(row)),
        );
    }
    Ok(rows)
}

/// Starts an output row with the common columns filled in
pub(crate) fn base_row(source_row: &Row, metric: &str, collection: &str) -> Row {
    let mut row = Row::new();
    row.insert(
        PROTOCOL_ID.to_string(),
        source_row.get(PROTOCOL_ID).cloned().unwrap_or(Value::Null),
    );
    row.insert("metric".to_string(), Value::String(metric.to_string()));
    row.insert(
        "timestamp".to_string(),
        normalize_datetime_value(source_row.get("timestamp").cloned().unwrap_or(Value::Null)),
    );
    row.insert(
        "source".to_string(),
        source_row.get("source").cloned().unwrap_or(Value::Null),
    );
    row.insert(
        "collection".to_string(),
        Value::String(collection.to_string()),
    );
    row
}
