//! Domain models and types for the metrics pipeline.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ProtocolId`])
//! - **Tables** ([`MetricTable`]) exchanged between loaders, join engine and dispatcher
//! - **Reference data** ([`HospitalCapabilityRecord`], [`TracerCategory`])
//! - **Error types** ([`EmsError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, EmsError>`]:
//!
//! ```rust
//! use ems_metrics::domain::{EmsError, Result};
//!
//! fn example() -> Result<()> {
//!     Err(EmsError::UnknownMetric("Blutdruck".to_string()))
//! }
//! ```

pub mod errors;
pub mod hospital;
pub mod ids;
pub mod period;
pub mod result;
pub mod table;

// Re-export commonly used types for convenience
pub use errors::{EmsError, StoreError};
pub use hospital::{Capabilities, HospitalCapabilityRecord, TracerCategory};
pub use ids::{parse_protocol_id_list, ProtocolId, ProtocolIdSet, PROTOCOL_ID};
pub use period::YearRange;
pub use result::Result;
pub use table::{MetricTable, Row};
