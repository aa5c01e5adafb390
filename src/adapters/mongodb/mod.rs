//! MongoDB record store
//!
//! - [`client`] - connection handling and `find`
//! - [`filter`] - translation of store-independent filters into query documents

pub mod client;
pub mod filter;

pub use client::MongoRecordStore;
