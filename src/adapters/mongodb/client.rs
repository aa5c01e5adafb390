//! MongoDB record store
//!
//! Wraps the official driver. Documents are converted to relaxed extended
//! JSON so the rest of the pipeline only sees `serde_json` values.

use super::filter::{to_query_document, to_sort_document};
use crate::adapters::store::{Document, FindQuery, RecordStore};
use crate::config::StoreConfig;
use crate::domain::{EmsError, Result, StoreError};
use async_trait::async_trait;
use bson::Bson;
use futures::stream::TryStreamExt;
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, FindOptions};
use mongodb::{Client, Database};
use serde_json::Value;
use std::time::Duration;

/// MongoDB implementation of [`RecordStore`]
pub struct MongoRecordStore {
    /// Driver client (cheap to clone, pooled internally)
    client: Client,

    /// Database holding the mission collections
    database: Database,

    database_name: String,
}

impl MongoRecordStore {
    /// Creates a client for the configured server
    ///
    /// The driver connects lazily; an unreachable server surfaces on the
    /// first query as [`StoreError::ConnectionFailed`].
    ///
    /// # Errors
    ///
    /// Returns an error if the connection string is missing or invalid.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        use secrecy::ExposeSecret;

        let uri = config
            .connection_string
            .as_ref()
            .map(|s| s.expose_secret().as_ref().to_string())
            .ok_or_else(|| {
                EmsError::Configuration("store.connection_string is not set".to_string())
            })?;

        let mut options = ClientOptions::parse(uri).await.map_err(|e| {
            StoreError::ConnectionFailed(format!("Invalid MongoDB connection string: {e}"))
        })?;
        let timeout = Duration::from_secs(config.timeout_seconds);
        options.app_name = Some("ems-metrics".to_string());
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);

        let client = Client::with_options(options).map_err(|e| {
            StoreError::ConnectionFailed(format!("Failed to create MongoDB client: {e}"))
        })?;
        let database = client.database(&config.database_name);

        Ok(Self {
            client,
            database,
            database_name: config.database_name.clone(),
        })
    }
}

#[async_trait]
impl RecordStore for MongoRecordStore {
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>> {
        let filter = to_query_document(collection, &query.filter)?;
        let options = FindOptions::builder()
            .limit(query.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX)))
            .sort(query.sort.as_ref().map(to_sort_document))
            .build();

        tracing::debug!(collection, filter = %filter, "Querying MongoDB");

        let coll = self.database.collection::<bson::Document>(collection);
        let mut cursor = coll
            .find(filter, options)
            .await
            .map_err(|e| map_driver_error(collection, e))?;

        let mut docs = Vec::new();
        while let Some(doc) = cursor
            .try_next()
            .await
            .map_err(|e| map_driver_error(collection, e))?
        {
            docs.push(to_json_document(collection, doc)?);
        }

        tracing::debug!(collection, documents = docs.len(), "MongoDB query finished");
        Ok(docs)
    }

    async fn close(&self) -> Result<()> {
        self.client.clone().shutdown().await;
        tracing::debug!(database = %self.database_name, "MongoDB client shut down");
        Ok(())
    }

    fn database_name(&self) -> &str {
        &self.database_name
    }
}

/// Converts a BSON document to relaxed extended JSON
fn to_json_document(collection: &str, doc: bson::Document) -> Result<Document> {
    match Bson::Document(doc).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument {
            collection: collection.to_string(),
            message: format!("expected an object, got {other}"),
        }
        .into()),
    }
}

/// Separates connectivity failures from query failures
fn map_driver_error(collection: &str, err: mongodb::error::Error) -> EmsError {
    match err.kind.as_ref() {
        ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) | ErrorKind::DnsResolve { .. } => {
            StoreError::ConnectionFailed(err.to_string()).into()
        }
        _ => StoreError::QueryFailed {
            collection: collection.to_string(),
            message: err.to_string(),
        }
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};
    use serde_json::json;

    #[test]
    fn test_to_json_document_uses_extended_json() {
        let oid = ObjectId::parse_str("65f1a2b3c4d5e6f708192a3b").unwrap();
        let doc = doc! {"_id": oid, "protocolId": "P-1", "content": [{"value_1": "GCS"}]};
        let json = to_json_document("protocols_findings", doc).unwrap();
        assert_eq!(json["_id"], json!({"$oid": "65f1a2b3c4d5e6f708192a3b"}));
        assert_eq!(json["content"][0]["value_1"], json!("GCS"));
    }
}
