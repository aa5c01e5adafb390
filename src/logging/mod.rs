//! Logging and observability
//!
//! Structured logging through `tracing`:
//! - human-readable console output on stderr
//! - optional JSON file output with daily or hourly rotation
//! - `RUST_LOG` overrides the configured level
//!
//! # Example
//!
//! ```no_run
//! use ems_metrics::config::LoggingConfig;
//! use ems_metrics::logging::init_logging;
//!
//! let _guard = init_logging("debug", &LoggingConfig::default()).expect("logging");
//! tracing::warn!(collection = "protocols_findings", "Loader failed");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use ems_metrics::domain::EmsError;
/// use ems_metrics::log_error_with_context;
///
/// let error = EmsError::UnknownMetric("Blutdruck".to_string());
/// log_error_with_context!(&error, "Failed to load metric");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a loaded table with its size
///
/// # Example
///
/// ```no_run
/// use ems_metrics::domain::MetricTable;
/// use ems_metrics::log_table_loaded;
///
/// let table = MetricTable::empty(&["protocolId"]);
/// log_table_loaded!("GCS", &table);
/// ```
#[macro_export]
macro_rules! log_table_loaded {
    ($metric:expr, $table:expr) => {
        tracing::info!(
            metric = $metric,
            rows = $table.len(),
            columns = $table.columns().len(),
            "Table loaded"
        );
    };
}
