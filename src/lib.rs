// EMS Metrics - Mission record normalization and metric pipeline
// Copyright (c) 2025 EMS Metrics Contributors
// Licensed under the MIT License

//! # EMS Metrics
//!
//! Turns heterogeneous emergency-medical-service mission documents into
//! flat metric tables keyed by protocol identifier, and checks whether a
//! patient's transport destination can treat the leading diagnosis.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Loaders, normalization, join, registry, cache, eligibility
//! - [`adapters`] - Record store implementations (MongoDB, JSON fixtures)
//! - [`domain`] - Tables, identifiers, reference records and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ems_metrics::adapters::store::create_record_store;
//! use ems_metrics::config::load_config;
//! use ems_metrics::core::registry::{Dispatcher, MetricRequest};
//! use ems_metrics::domain::YearRange;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ems-metrics.toml")?;
//!     let store = create_record_store(&config.store).await?;
//!     let dispatcher = Dispatcher::from_config(store.clone(), &config);
//!
//!     let request = MetricRequest::new("Medikamente")
//!         .with_medication("Acetylsalicylsäure")
//!         .with_years(YearRange::single(2024)?);
//!     let table = dispatcher.dispatch(&request).await?;
//!
//!     for line in table.to_json_lines()? {
//!         println!("{line}");
//!     }
//!     store.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Failure Model
//!
//! Missing or malformed clinical data never raises: loaders log the
//! condition and return an empty table with the metric's full column set.
//! Only caller mistakes such as an unknown metric name, or a missing
//! reference file, surface as [`domain::EmsError`].
//!
//! ## Eligibility
//!
//! ```rust
//! use ems_metrics::core::eligibility::{classify, HospitalTable};
//!
//! let hospitals = HospitalTable::from_csv_str(
//!     "Name;TIA / Schlaganfall;ACS / STEMI /NSTEMI;Reanimation;Polytrauma\n\
//!      ['Stroke Unit Nord'];true;false;false;false\n",
//! )
//! .unwrap();
//! assert!(classify("Stroke Unit Nord", "Verdacht auf Schlaganfall", &hospitals));
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
