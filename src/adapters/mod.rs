//! Record store integrations.
//!
//! - [`store`] - the [`store::RecordStore`] contract, query model and factory
//! - [`mongodb`] - MongoDB implementation
//! - [`fixture`] - in-memory implementation backed by a JSON file
//!
//! Loaders only depend on the trait, so tests run against
//! [`fixture::FixtureStore`] without a server:
//!
//! ```rust
//! use ems_metrics::adapters::fixture::FixtureStore;
//! use ems_metrics::adapters::store::{Filter, FindQuery, RecordStore};
//! use serde_json::json;
//!
//! # async fn example() -> ems_metrics::domain::Result<()> {
//! let store = FixtureStore::new("einsatzdaten")
//!     .with_collection("nida_index", vec![json!({"protocolId": "P-1"})]);
//! let docs = store
//!     .find("nida_index", &FindQuery::new(Filter::eq("protocolId", "P-1")))
//!     .await?;
//! assert_eq!(docs.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod fixture;
pub mod mongodb;
pub mod store;
