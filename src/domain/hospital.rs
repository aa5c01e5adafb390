//! Hospital capability reference data
//!
//! Static data describing which destination hospitals can treat which
//! tracer diagnoses. Loaded once per session and never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Tracer diagnosis categories used to judge destination appropriateness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TracerCategory {
    /// TIA / stroke
    Stroke,
    /// ACS / STEMI / NSTEMI
    Acs,
    /// Cardiac arrest with resuscitation
    Reanimation,
    /// Polytrauma
    Polytrauma,
}

impl TracerCategory {
    /// All categories in reporting order
    pub const ALL: [TracerCategory; 4] = [
        TracerCategory::Stroke,
        TracerCategory::Acs,
        TracerCategory::Reanimation,
        TracerCategory::Polytrauma,
    ];

    /// Column header used for this category in the reference table
    pub fn column_name(self) -> &'static str {
        match self {
            TracerCategory::Stroke => "TIA / Schlaganfall",
            TracerCategory::Acs => "ACS / STEMI /NSTEMI",
            TracerCategory::Reanimation => "Reanimation",
            TracerCategory::Polytrauma => "Polytrauma",
        }
    }
}

impl fmt::Display for TracerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// Capability flags of one hospital
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub stroke: bool,
    pub acs: bool,
    pub reanimation: bool,
    pub polytrauma: bool,
}

impl Capabilities {
    /// Returns the flag for a category
    pub fn supports(&self, category: TracerCategory) -> bool {
        match category {
            TracerCategory::Stroke => self.stroke,
            TracerCategory::Acs => self.acs,
            TracerCategory::Reanimation => self.reanimation,
            TracerCategory::Polytrauma => self.polytrauma,
        }
    }
}

/// One hospital of the reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalCapabilityRecord {
    /// Accepted name variants, lowercased and trimmed
    pub name_variants: Vec<String>,

    /// Capability flags per tracer category
    pub capabilities: Capabilities,
}

impl HospitalCapabilityRecord {
    /// Creates a record, normalizing the name variants
    ///
    /// Blank variants are discarded.
    pub fn new<I, S>(names: I, capabilities: Capabilities) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name_variants = names
            .into_iter()
            .map(|n| n.as_ref().trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        Self {
            name_variants,
            capabilities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supports() {
        let caps = Capabilities {
            stroke: true,
            acs: false,
            reanimation: true,
            polytrauma: false,
        };
        assert!(caps.supports(TracerCategory::Stroke));
        assert!(!caps.supports(TracerCategory::Acs));
        assert!(caps.supports(TracerCategory::Reanimation));
        assert!(!caps.supports(TracerCategory::Polytrauma));
    }

    #[test]
    fn test_record_normalizes_names() {
        let record = HospitalCapabilityRecord::new(
            [" Stroke Unit Nord ", "", "SUN"],
            Capabilities::default(),
        );
        assert_eq!(record.name_variants, vec!["stroke unit nord", "sun"]);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(TracerCategory::Acs.to_string(), "ACS / STEMI /NSTEMI");
    }
}
