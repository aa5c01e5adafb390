//! Mission index (`nida_index`) and mission detail (`protocols_details`)

use super::{collections, or_empty, LoadScope};
use crate::adapters::store::{Filter, FindQuery, RecordStore, SortSpec};
use crate::core::join::join_index_details;
use crate::core::normalize::datetime::{
    combine_status_fields, normalize_index_dates, STATUS_NAMES,
};
use crate::core::normalize::{coerce_bool_fields, document_to_row, BOOLEAN_FIELDS};
use crate::domain::{MetricTable, ProtocolIdSet, Result, YearRange, PROTOCOL_ID};

/// Columns every index table carries
pub const INDEX_COLUMNS: [&str; 9] = [
    PROTOCOL_ID,
    "missionDate",
    "missionType",
    "leadingDiagnosis",
    "targetDestination",
    "callSign",
    "patientCity",
    "createdAt",
    "updatedAt",
];

/// Field the year filter applies to
pub const MISSION_DATE: &str = "missionDate";

/// Minimal schema of the details table
pub fn details_columns() -> Vec<&'static str> {
    std::iter::once(PROTOCOL_ID).chain(STATUS_NAMES).collect()
}

/// Guaranteed columns of the index joined with details
pub fn joined_columns() -> Vec<&'static str> {
    INDEX_COLUMNS.iter().copied().chain(STATUS_NAMES).collect()
}

/// Loads the mission index, newest mission first
///
/// `years` restricts `missionDate` to the inclusive range; the scope's
/// protocol ids restrict `protocolId`. Date fields are normalized to
/// ISO-8601 strings.
pub async fn load_index(
    store: &dyn RecordStore,
    years: Option<YearRange>,
    scope: LoadScope<'_>,
) -> MetricTable {
    let result = try_load_index(store, years, scope).await;
    or_empty("Index", collections::INDEX, &INDEX_COLUMNS, result)
}

async fn try_load_index(
    store: &dyn RecordStore,
    years: Option<YearRange>,
    scope: LoadScope<'_>,
) -> Result<MetricTable> {
    let year_filter = match years {
        Some(range) => {
            let (start, end) = range.bounds();
            Filter::date_range(MISSION_DATE, start, end)
        }
        None => Filter::All,
    };
    let query = FindQuery::new(Filter::and([year_filter, scope.id_filter()]))
        .sorted_by(SortSpec::descending(MISSION_DATE))
        .with_limit(scope.limit);

    let docs = store.find(collections::INDEX, &query).await?;
    let mut table = MetricTable::with_columns(INDEX_COLUMNS.iter().map(|c| c.to_string()).collect());
    for doc in docs {
        table.push_row(document_to_row(doc));
    }

    let dropped = normalize_index_dates(&mut table);
    if dropped > 0 {
        tracing::warn!(collection = collections::INDEX, values = dropped, "Unparsable index dates set to null");
    }
    Ok(table)
}

/// Resolves a year range into the protocol ids of its missions
pub async fn resolve_protocol_ids(
    store: &dyn RecordStore,
    years: YearRange,
    limit: usize,
) -> ProtocolIdSet {
    load_index(store, Some(years), LoadScope::new(limit))
        .await
        .protocol_ids()
}

/// Loads mission details, newest alarm first
///
/// Documents are flattened with `_`, the status date/time pairs are
/// recombined and the flashing-light / physician flags coerced to booleans.
pub async fn load_details(store: &dyn RecordStore, scope: LoadScope<'_>) -> MetricTable {
    let result = try_load_details(store, scope).await;
    or_empty("Details", collections::DETAILS, &details_columns(), result)
}

async fn try_load_details(store: &dyn RecordStore, scope: LoadScope<'_>) -> Result<MetricTable> {
    let query = FindQuery::new(scope.id_filter())
        .sorted_by(SortSpec::descending("content.dateStatusAlarm"))
        .with_limit(scope.limit);

    let docs = store.find(collections::DETAILS, &query).await?;
    let mut table = MetricTable::with_columns(vec![PROTOCOL_ID.to_string()]);
    for doc in docs {
        table.push_row(document_to_row(doc));
    }

    let dropped = combine_status_fields(&mut table);
    if dropped > 0 {
        tracing::warn!(collection = collections::DETAILS, values = dropped, "Unparsable status timestamps set to null");
    }
    coerce_bool_fields(&mut table, &BOOLEAN_FIELDS);
    Ok(table)
}

/// Loads the canonical per-mission record: index outer-joined with details
///
/// Both sides use the same scope, so the row limit applies consistently.
pub async fn load_index_with_details(
    store: &dyn RecordStore,
    years: Option<YearRange>,
    scope: LoadScope<'_>,
) -> MetricTable {
    let index = load_index(store, years, scope).await;

    // Without an explicit id set, details follow the loaded index missions
    let index_ids;
    let detail_scope = match (scope.protocol_ids, years) {
        (None, Some(_)) => {
            index_ids = index.protocol_ids();
            scope.with_protocol_ids(&index_ids)
        }
        _ => scope,
    };
    let details = load_details(store, detail_scope).await;

    let mut joined = join_index_details(index, details);
    coerce_bool_fields(&mut joined, &BOOLEAN_FIELDS);
    joined.ensure_columns(&joined_columns());
    joined
}
