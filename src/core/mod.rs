//! Core pipeline logic.
//!
//! # Modules
//!
//! - [`normalize`] - identifier stringification, date/time recombination,
//!   boolean coercion, flattening and explode stage
//! - [`loaders`] - one loader per source collection family
//! - [`join`] - protocol-id join of index and detail tables
//! - [`registry`] - metric registry and dispatcher
//! - [`cache`] - time-bounded memoization of dispatcher results
//! - [`eligibility`] - hospital eligibility classifier
//!
//! # Data Flow
//!
//! 1. **Dispatch**: look up the metric, answer from cache when possible
//! 2. **Scope**: resolve a year range into protocol ids via the index
//! 3. **Load**: query the collection, explode and re-filter slot arrays
//! 4. **Normalize**: stringify ids, recombine timestamps, coerce booleans
//! 5. **Join**: merge index and details where the metric needs both
//! 6. **Cache**: keep the table for the configured time-to-live
//!
//! # Example
//!
//! ```rust,no_run
//! use ems_metrics::adapters::store::create_record_store;
//! use ems_metrics::config::load_config;
//! use ems_metrics::core::registry::{Dispatcher, MetricRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("ems-metrics.toml")?;
//! let store = create_record_store(&config.store).await?;
//! let dispatcher = Dispatcher::from_config(store, &config);
//!
//! let gcs = dispatcher.dispatch(&MetricRequest::new("GCS").with_limit(500)).await?;
//! println!("GCS rows: {}", gcs.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod eligibility;
pub mod join;
pub mod loaders;
pub mod normalize;
pub mod registry;
