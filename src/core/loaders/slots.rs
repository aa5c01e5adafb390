//! Decoders for generic slot elements
//!
//! Findings, measures and results store their facts as
//! `{value_1, value_2, .., value_N, timestamp, source}` where `value_1`
//! decides what the other slots mean. Each family gets a tagged enum with
//! one decoder keyed on the discriminator instead of positional access
//! scattered across loaders.

use crate::core::normalize::{coerce_bool, parse_number};
use crate::domain::Row;
use serde_json::Value;

/// Name of the discriminator slot
pub const DISCRIMINATOR: &str = "value_1";

/// One exploded slot element
#[derive(Debug, Clone, PartialEq)]
pub struct Slot<'a> {
    /// Value of `value_1`
    pub kind: &'a str,
    row: &'a Row,
}

impl<'a> Slot<'a> {
    /// Reads the discriminator; elements without one are not slots
    pub fn from_row(row: &'a Row) -> Option<Self> {
        let kind = row.get(DISCRIMINATOR)?.as_str()?.trim();
        Some(Self { kind, row })
    }

    /// Value of `value_<n>`, `null` when absent
    pub fn value(&self, n: usize) -> Value {
        self.row
            .get(&format!("value_{n}"))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Score-like findings holding a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreKind {
    Gcs,
    Pain,
}

impl ScoreKind {
    pub fn discriminator(self) -> &'static str {
        match self {
            ScoreKind::Gcs => "GCS",
            ScoreKind::Pain => "Schmerzen",
        }
    }
}

/// Eye of a pupil reaction finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PupilSide {
    Left,
    Right,
}

impl PupilSide {
    pub fn discriminator(self) -> &'static str {
        match self {
            PupilSide::Left => "Pupillenreaktion links",
            PupilSide::Right => "Pupillenreaktion rechts",
        }
    }
}

pub const NEUROLOGY: &str = "Neurologische Auffälligkeiten";

/// Decoded element of `protocols_findings`
#[derive(Debug, Clone, PartialEq)]
pub enum FindingEntry {
    Score { kind: ScoreKind, value: Value },
    Neurological { sign: Value, detail: Value },
    Pupil { side: PupilSide, reaction: Value },
}

impl FindingEntry {
    pub fn decode(slot: &Slot<'_>) -> Option<Self> {
        let entry = match slot.kind {
            "GCS" => FindingEntry::Score {
                kind: ScoreKind::Gcs,
                value: slot.value(2),
            },
            "Schmerzen" => FindingEntry::Score {
                kind: ScoreKind::Pain,
                value: slot.value(2),
            },
            NEUROLOGY => FindingEntry::Neurological {
                sign: slot.value(2),
                detail: slot.value(3),
            },
            "Pupillenreaktion links" => FindingEntry::Pupil {
                side: PupilSide::Left,
                reaction: slot.value(2),
            },
            "Pupillenreaktion rechts" => FindingEntry::Pupil {
                side: PupilSide::Right,
                reaction: slot.value(2),
            },
            _ => return None,
        };
        Some(entry)
    }
}

/// Measure metrics other than medication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
    Medication,
    Intubation,
    Ecg,
}

impl MeasureKind {
    pub fn discriminator(self) -> &'static str {
        match self {
            MeasureKind::Medication => "Medikamente",
            MeasureKind::Intubation => "Intubation",
            MeasureKind::Ecg => "12-Kanal-EKG",
        }
    }
}

/// Decoded element of `protocols_measures`
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureEntry {
    Medication {
        name: Value,
        dose: Value,
        unit: Value,
        route: Value,
    },
    Intubation {
        airway_type: Value,
        tube_size: Value,
        attempts: Value,
    },
    Ecg {
        finding: Value,
        transmitted: Value,
    },
}

impl MeasureEntry {
    pub fn decode(slot: &Slot<'_>) -> Option<Self> {
        let entry = match slot.kind {
            "Medikamente" => MeasureEntry::Medication {
                name: slot.value(2),
                dose: slot.value(3),
                unit: slot.value(4),
                route: slot.value(5),
            },
            "Intubation" => MeasureEntry::Intubation {
                airway_type: slot.value(2),
                tube_size: slot.value(3),
                attempts: parse_number(&slot.value(4)),
            },
            "12-Kanal-EKG" => MeasureEntry::Ecg {
                finding: slot.value(2),
                transmitted: coerce_bool(slot.value(3)),
            },
            _ => return None,
        };
        Some(entry)
    }

    /// Output columns of the entry
    pub fn into_columns(self) -> Vec<(&'static str, Value)> {
        match self {
            MeasureEntry::Medication {
                name,
                dose,
                unit,
                route,
            } => vec![
                ("med_name", name),
                ("med_dose", dose),
                ("med_unit", unit),
                ("med_route", route),
            ],
            MeasureEntry::Intubation {
                airway_type,
                tube_size,
                attempts,
            } => vec![
                ("airway_type", airway_type),
                ("tube_size", tube_size),
                ("attempts", attempts),
            ],
            MeasureEntry::Ecg {
                finding,
                transmitted,
            } => vec![("ecg_finding", finding), ("ecg_transmitted", transmitted)],
        }
    }
}

pub const NACA: &str = "NACA";
pub const REANIMATION: &str = "Reanimation";
pub const PHYSICIAN_REQUEST: &str = "Nachforderung NA";
pub const SYMPTOM_ONSET: &str = "Symptombeginn";

/// Decoded element of `protocols_results`
#[derive(Debug, Clone, PartialEq)]
pub enum ResultEntry {
    /// NACA severity score
    Naca(Value),
    /// Explicit resuscitation flag (ja/nein)
    Reanimation(Value),
    /// Emergency physician requested afterwards (ja/nein)
    PhysicianRequest(Value),
    /// One half of the symptom onset, or its specification
    SymptomOnset(Value),
}

impl ResultEntry {
    pub fn decode(slot: &Slot<'_>) -> Option<Self> {
        let entry = match slot.kind {
            NACA => ResultEntry::Naca(slot.value(2)),
            REANIMATION => ResultEntry::Reanimation(slot.value(2)),
            PHYSICIAN_REQUEST => ResultEntry::PhysicianRequest(slot.value(2)),
            SYMPTOM_ONSET => ResultEntry::SymptomOnset(slot.value(2)),
            _ => return None,
        };
        Some(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_slot_requires_string_discriminator() {
        assert!(Slot::from_row(&row(json!({"value_1": 3}))).is_none());
        assert!(Slot::from_row(&row(json!({"value_2": "x"}))).is_none());
        let r = row(json!({"value_1": " GCS ", "value_2": "15"}));
        let slot = Slot::from_row(&r).unwrap();
        assert_eq!(slot.kind, "GCS");
        assert_eq!(slot.value(2), json!("15"));
        assert_eq!(slot.value(9), Value::Null);
    }

    #[test]
    fn test_decode_medication() {
        let r = row(json!({
            "value_1": "Medikamente",
            "value_2": "Acetylsalicylsäure 500mg",
            "value_3": "500",
            "value_4": "mg",
            "value_5": "i.v."
        }));
        let entry = MeasureEntry::decode(&Slot::from_row(&r).unwrap()).unwrap();
        let columns = entry.into_columns();
        assert_eq!(columns[0], ("med_name", json!("Acetylsalicylsäure 500mg")));
        assert_eq!(columns[3], ("med_route", json!("i.v.")));
    }

    #[test]
    fn test_decode_ecg_coerces_transmission() {
        let r = row(json!({"value_1": "12-Kanal-EKG", "value_2": "STEMI", "value_3": "ja"}));
        let entry = MeasureEntry::decode(&Slot::from_row(&r).unwrap()).unwrap();
        assert_eq!(
            entry,
            MeasureEntry::Ecg {
                finding: json!("STEMI"),
                transmitted: json!(true)
            }
        );
    }

    #[test]
    fn test_decode_findings_and_results() {
        let r = row(json!({"value_1": "Pupillenreaktion rechts", "value_2": "prompt"}));
        assert_eq!(
            FindingEntry::decode(&Slot::from_row(&r).unwrap()),
            Some(FindingEntry::Pupil {
                side: PupilSide::Right,
                reaction: json!("prompt")
            })
        );

        let r = row(json!({"value_1": "NACA", "value_2": "6"}));
        assert_eq!(
            ResultEntry::decode(&Slot::from_row(&r).unwrap()),
            Some(ResultEntry::Naca(json!("6")))
        );

        let r = row(json!({"value_1": "Unbekannt"}));
        assert!(ResultEntry::decode(&Slot::from_row(&r).unwrap()).is_none());
    }
}
