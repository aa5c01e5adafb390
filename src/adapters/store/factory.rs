//! Record store factory

use super::traits::RecordStore;
use crate::adapters::fixture::FixtureStore;
use crate::adapters::mongodb::MongoRecordStore;
use crate::config::schema::{StoreConfig, StoreTarget};
use crate::domain::{EmsError, Result};
use std::sync::Arc;

/// Creates the record store selected by `store.target`
///
/// # Errors
///
/// Returns an error if the fixture cannot be read or the MongoDB client
/// cannot be created.
pub async fn create_record_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.target {
        StoreTarget::MongoDb => {
            tracing::info!(database = %config.database_name, "Creating MongoDB record store");
            let store = MongoRecordStore::connect(config).await?;
            Ok(Arc::new(store) as Arc<dyn RecordStore>)
        }
        StoreTarget::Fixture => {
            let path = config.fixture_path.as_deref().ok_or_else(|| {
                EmsError::Configuration(
                    "store.fixture_path is required when store.target = 'fixture'".to_string(),
                )
            })?;
            tracing::info!(path, "Creating fixture record store");
            let store = FixtureStore::from_path(path, &config.database_name)?;
            Ok(Arc::new(store) as Arc<dyn RecordStore>)
        }
    }
}
