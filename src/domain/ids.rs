//! Domain identifier types with validation
//!
//! The protocol identifier is the only key shared by every source
//! collection; it is always carried as a string once it leaves the
//! normalization layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Name of the protocol identifier column in every table
pub const PROTOCOL_ID: &str = "protocolId";

/// Protocol identifier newtype wrapper
///
/// Identifies one EMS mission across all collections.
///
/// # Examples
///
/// ```
/// use ems_metrics::domain::ids::ProtocolId;
/// use std::str::FromStr;
///
/// let id = ProtocolId::from_str("NIDA-2024-000153").unwrap();
/// assert_eq!(id.as_str(), "NIDA-2024-000153");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProtocolId(String);

impl ProtocolId {
    /// Creates a new ProtocolId from a string
    ///
    /// Surrounding whitespace is trimmed; an empty identifier is rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Protocol ID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Builds a ProtocolId from a table cell
    ///
    /// Numbers are accepted as well as strings, since some exports store
    /// the identifier numerically.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::new(s.as_str()).ok(),
            serde_json::Value::Number(n) => Self::new(n.to_string()).ok(),
            _ => None,
        }
    }

    /// Returns the protocol ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProtocolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProtocolId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered, de-duplicated set of protocol identifiers
pub type ProtocolIdSet = BTreeSet<ProtocolId>;

/// Parses a comma-separated list of protocol identifiers, skipping blanks
pub fn parse_protocol_id_list(input: &str) -> ProtocolIdSet {
    input
        .split(',')
        .filter_map(|s| ProtocolId::new(s).ok())
        .collect()
}
