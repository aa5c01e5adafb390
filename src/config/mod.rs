//! Configuration management.
//!
//! TOML-based configuration with:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `EMS_<SECTION>_<KEY>` overrides
//! - Defaults for every key
//! - Validation on load
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [store]
//! target = "mongodb"
//! connection_string = "${EMS_MONGO_URI}"
//! database_name = "einsatzdaten"
//!
//! [query]
//! default_row_limit = 10000
//!
//! [cache]
//! ttl_seconds = 3600
//!
//! [reference]
//! hospital_table = "data/krankenhausDiagnosen.csv"
//! ```
//!
//! # Loading
//!
//! ```rust,no_run
//! use ems_metrics::config::load_config;
//!
//! # fn example() {
//! match load_config("ems-metrics.toml") {
//!     Ok(config) => println!("Database: {}", config.store.database_name),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, CacheConfig, EmsConfig, LoggingConfig, QueryConfig, ReferenceConfig,
    StoreConfig, StoreTarget,
};
pub use secret::{secret_string, SecretString, SecretValue};
