//! Record store contract
//!
//! - [`traits`] - the [`RecordStore`] trait
//! - [`query`] - filters, sorting and limits shared by all stores
//! - [`factory`] - builds the configured store

pub mod factory;
pub mod query;
pub mod traits;

pub use factory::create_record_store;
pub use query::{lookup, Document, Filter, FindQuery, SortSpec};
pub use traits::RecordStore;
