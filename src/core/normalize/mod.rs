//! Shared normalization routines
//!
//! Every loader passes its documents through these helpers:
//!
//! - [`ids`] - extended-JSON identifiers and dates to plain strings
//! - [`datetime`] - date+time recombination and timestamp parsing
//! - [`boolean`] - ja/nein coercion
//! - [`columns`] - duplicate-column removal
//! - [`flatten`] - nested objects to `parent_child` columns
//! - [`explode`] - array elements to rows
//! - [`numeric`] - measurement strings to numbers

pub mod boolean;
pub mod columns;
pub mod datetime;
pub mod explode;
pub mod flatten;
pub mod ids;
pub mod numeric;

pub use boolean::{coerce_bool, coerce_bool_fields, BOOLEAN_FIELDS};
pub use datetime::{combine_date_time, combine_status_fields, format_timestamp};
pub use explode::explode;
pub use flatten::flatten_object;
pub use ids::{stringify_map, stringify_value};
pub use numeric::parse_number;

use crate::adapters::store::Document;
use crate::domain::Row;

/// Stringifies identifiers and flattens a top-level document into a row
pub fn document_to_row(doc: Document) -> Row {
    flatten_object(stringify_map(doc))
}
