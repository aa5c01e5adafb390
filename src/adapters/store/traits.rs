//! Record store abstraction
//!
//! The pipeline only ever reads. A store hands out documents of named
//! collections matching a [`FindQuery`]; it never needs transactions,
//! upserts or schema changes.

use super::query::{Document, FindQuery};
use crate::domain::Result;
use async_trait::async_trait;

/// Read-only access to the mission collections
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Finds documents of `collection` matching `query`
    ///
    /// Native identifiers and dates are rendered in extended-JSON form
    /// (`{"$oid": ..}`, `{"$date": ..}`).
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::StoreError`] wrapped in an `EmsError` when
    /// the store is unreachable or rejects the query.
    async fn find(&self, collection: &str, query: &FindQuery) -> Result<Vec<Document>>;

    /// Releases the connection
    async fn close(&self) -> Result<()>;

    /// Name of the database the collections live in
    fn database_name(&self) -> &str;
}
