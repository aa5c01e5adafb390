//! CLI command implementations
//!
//! Commands return a process exit code: 0 success, 2 configuration error,
//! 4 record store unreachable. Unexpected failures bubble up as errors and
//! exit with 5.

pub mod eligibility;
pub mod load;
pub mod metrics;
pub mod validate;

use crate::adapters::store::{create_record_store, RecordStore};
use crate::config::{load_config, EmsConfig};
use std::sync::Arc;

pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_CONNECTIVITY: i32 = 4;

/// Loads the configuration, reporting failures as exit code 2
pub(crate) fn load_or_report(config_path: &str) -> Result<EmsConfig, i32> {
    load_config(config_path).map_err(|e| {
        crate::log_error_with_context!(&e, "Failed to load configuration");
        eprintln!("Configuration error: {e}");
        EXIT_CONFIG
    })
}

/// Opens the configured record store, mapping failures to exit codes
pub(crate) async fn connect_or_report(config: &EmsConfig) -> Result<Arc<dyn RecordStore>, i32> {
    create_record_store(&config.store).await.map_err(|e| {
        crate::log_error_with_context!(&e, "Failed to open record store");
        eprintln!("Record store error: {e}");
        if e.is_connectivity() {
            EXIT_CONNECTIVITY
        } else {
            EXIT_CONFIG
        }
    })
}

/// Releases the store; a failed close is logged but does not change the outcome
pub(crate) async fn close_quietly(store: &dyn RecordStore) {
    if let Err(e) = store.close().await {
        tracing::warn!(error = %e, "Failed to close record store");
    }
}
