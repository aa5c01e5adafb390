//! In-memory record store
//!
//! Serves documents from memory, evaluating [`Filter`]s with the same
//! engine the loaders use for their row predicates. Backs the `fixture`
//! store target (a JSON file mapping collection names to document arrays)
//! and the test suites.

use crate::adapters::store::{Document, FindQuery, RecordStore};
use crate::domain::{EmsError, Result, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Record store holding its collections in memory
#[derive(Debug, Default)]
pub struct FixtureStore {
    database: String,
    collections: HashMap<String, Vec<Document>>,
    unavailable: HashSet<String>,
    queries: AtomicUsize,
}

impl FixtureStore {
    /// Creates an empty store
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Adds documents to a collection; non-object values are skipped
    pub fn with_collection(mut self, name: &str, docs: Vec<Value>) -> Self {
        self.insert_many(name, docs);
        self
    }

    /// Makes every query against `name` fail as if the server were down
    pub fn with_unavailable_collection(mut self, name: &str) -> Self {
        self.unavailable.insert(name.to_string());
        self
    }

    /// Appends documents to a collection
    pub fn insert_many(&mut self, name: &str, docs: Vec<Value>) {
        let target = self.collections.entry(name.to_string()).or_default();
        target.extend(docs.into_iter().filter_map(|doc| match doc {
            Value::Object(map) => Some(map),
            _ => None,
        }));
    }

    /// Loads a fixture file of the form `{"collection": [doc, ...], ...}`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or is not
    /// an object of arrays.
    pub fn from_path(path: impl AsRef<Path>, database: &str) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EmsError::Configuration(format!(
                "Failed to read fixture file {}: {}",
                path.display(),
                e
            ))
        })?;
        let parsed: Value = serde_json::from_str(&contents).map_err(|e| {
            EmsError::Configuration(format!(
                "Invalid fixture file {}: {}",
                path.display(),
                e
            ))
        })?;

        let Value::Object(collections) = parsed else {
            return Err(EmsError::Configuration(format!(
                "Fixture file {} must map collection names to document arrays",
                path.display()
            )));
        };

        let mut store = Self::new(database);
        for (name, docs) in collections {
            match docs {
                Value::Array(items) => store.insert_many(&name, items),
                _ => {
                    return Err(EmsError::Configuration(format!(
                        "Fixture collection '{name}' is not an array"
                    )))
                }
            }
        }

        tracing::debug!(
            collections = store.collections.len(),
            "Loaded fixture store"
        );
        Ok(store)
    }

    /// Number of `find` calls served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for FixtureStore {
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if self.unavailable.contains(collection) {
            return Err(StoreError::ConnectionFailed(format!(
                "collection '{collection}' is unavailable"
            ))
            .into());
        }

        let mut docs: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| query.filter.matches(doc))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if let Some(sort) = &query.sort {
            docs.sort_by(|a, b| sort.compare(a, b));
        }
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        Ok(docs)
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn database_name(&self) -> &str {
        &self.database
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::store::{Filter, SortSpec};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn store() -> FixtureStore {
        FixtureStore::new("einsatzdaten").with_collection(
            "nida_index",
            vec![
                json!({"protocolId": "P-1", "missionDate": "2023-05-01T10:00:00"}),
                json!({"protocolId": "P-2", "missionDate": "2024-02-01T10:00:00"}),
                json!({"protocolId": "P-3", "missionDate": "2023-11-01T10:00:00"}),
                json!("not a document"),
            ],
        )
    }

    #[tokio::test]
    async fn test_find_sort_and_limit() {
        let store = store();
        let query = FindQuery::default()
            .sorted_by(SortSpec::descending("missionDate"))
            .with_limit(2);
        let docs = store.find("nida_index", &query).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d["protocolId"].clone()).collect();
        assert_eq!(ids, vec![json!("P-2"), json!("P-3")]);
        assert_eq!(store.query_count(), 1);
    }

    #[tokio::test]
    async fn test_find_with_filter() {
        let store = store();
        let query = FindQuery::new(Filter::is_in("protocolId", ["P-1", "P-9"]));
        let docs = store.find("nida_index", &query).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let docs = store().find("protocols_vitals_xyz", &FindQuery::default()).await.unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_collection() {
        let store = store().with_unavailable_collection("nida_index");
        let err = store.find("nida_index", &FindQuery::default()).await.unwrap_err();
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_from_path_rejects_non_arrays() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"nida_index": {{"protocolId": "P-1"}}}}"#).unwrap();
        assert!(FixtureStore::from_path(file.path(), "db").is_err());
    }
}
