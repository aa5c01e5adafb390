//! Dispatch-center mission log (`etu_leitstelle`)
//!
//! The dispatch center exports its own mission log, keyed by dispatch
//! fields rather than protocol ids. Only missions of the service's home
//! district are loaded, newest first.

use super::{collections, or_empty, LoadScope};
use crate::adapters::store::{Filter, FindQuery, RecordStore, SortSpec};
use crate::core::normalize::document_to_row;
use crate::domain::{MetricTable, Result};

/// District the dispatch log is restricted to
pub const ETU_DISTRICT: &str = "Schleswig-Flensburg";

/// District of the mission location
pub const DISTRICT_FIELD: &str = "EO_LANDKREIS";

/// Mission start as recorded by the dispatch center
pub const MISSION_START_FIELD: &str = "EINSATZBEGINN";

pub fn schema() -> Vec<&'static str> {
    vec![MISSION_START_FIELD, DISTRICT_FIELD]
}

/// Loads the dispatch log of [`ETU_DISTRICT`], newest mission first
///
/// The schema is open beyond the mission start and district columns.
/// The protocol-id restriction of `scope` does not apply to this log.
pub async fn load_etu(store: &dyn RecordStore, scope: LoadScope<'_>) -> MetricTable {
    let schema = schema();
    let result = try_load_etu(store, scope, &schema).await;
    or_empty("ETU", collections::ETU, &schema, result)
}

async fn try_load_etu(
    store: &dyn RecordStore,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let query = FindQuery::new(Filter::eq(DISTRICT_FIELD, ETU_DISTRICT))
        .sorted_by(SortSpec::descending(MISSION_START_FIELD))
        .with_limit(scope.limit);
    let docs = store.find(collections::ETU, &query).await?;

    let mut table = MetricTable::empty(schema);
    for doc in docs {
        table.push_row(document_to_row(doc));
    }
    Ok(table)
}
