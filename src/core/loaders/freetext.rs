//! Free-text protocol sections (`protocols_freetexts`)

use super::{collections, or_empty, LoadScope};
use crate::adapters::store::{FindQuery, RecordStore};
use crate::core::normalize::document_to_row;
use crate::domain::{MetricTable, Result, PROTOCOL_ID};

/// Loads free-text documents, one flattened row per document
///
/// The schema is open; only `protocolId` is guaranteed.
pub async fn load_freetext(store: &dyn RecordStore, scope: LoadScope<'_>) -> MetricTable {
    let result = try_load_freetext(store, scope).await;
    or_empty("Freetext", collections::FREETEXTS, &[PROTOCOL_ID], result)
}

async fn try_load_freetext(store: &dyn RecordStore, scope: LoadScope<'_>) -> Result<MetricTable> {
    let query = FindQuery::new(scope.id_filter()).with_limit(scope.limit);
    let docs = store.find(collections::FREETEXTS, &query).await?;

    let mut table = MetricTable::empty(&[PROTOCOL_ID]);
    for doc in docs {
        table.push_row(document_to_row(doc));
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::FixtureStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_freetext_flattened() {
        let store = FixtureStore::new("db").with_collection(
            collections::FREETEXTS,
            vec![
                json!({"_id": {"$oid": "65f0c0ffee"}, "protocolId": "P-1",
                       "data": [{"title": "Anamnese", "text": "Synkope"}],
                       "meta": {"author": "RS"}}),
                json!({"protocolId": "P-2"}),
            ],
        );
        let table = load_freetext(&store, LoadScope::new(10)).await;
        assert_eq!(table.len(), 2);
        assert_eq!(table.columns()[0], "protocolId");
        assert_eq!(table.rows()[0]["_id"], json!("65f0c0ffee"));
        assert_eq!(table.rows()[0]["meta_author"], json!("RS"));
        assert!(table.rows()[0]["data"].is_array());
        assert_eq!(table.rows()[1]["meta_author"], serde_json::Value::Null);
    }
}
