//! Hospital eligibility classification
//!
//! Maps a free-text leading diagnosis onto a tracer category and a
//! free-text transport destination onto a hospital of the reference table,
//! then reports whether that hospital can treat the category.
//!
//! Diagnosis keywords are scanned in a fixed order and the first substring
//! hit wins. Hospital names match loosely: the destination contains a name
//! variant or a variant contains the destination.
//!
//! # Reference table
//!
//! A `;`-delimited file with a `Name` column holding a list literal of name
//! variants and one boolean column per category:
//!
//! ```text
//! Name;TIA / Schlaganfall;ACS / STEMI /NSTEMI;Reanimation;Polytrauma
//! ['Stroke Unit Nord', 'SUN'];True;False;True;False
//! ```

use crate::domain::{
    Capabilities, EmsError, HospitalCapabilityRecord, MetricTable, Result, TracerCategory,
};
use serde_json::Value;
use std::path::Path;

/// Ordered keyword table; the first keyword contained in the diagnosis wins
///
/// Stroke keywords come from the stroke-unit table, ACS keywords (including
/// the `st-hebung` spellings) from the cardiac-catheter table. `stemi`
/// precedes `nstemi`, so NSTEMI diagnoses also land in ACS through the
/// `stemi` substring.
pub const DIAGNOSIS_KEYWORDS: [(&str, TracerCategory); 19] = [
    ("schlaganfall", TracerCategory::Stroke),
    ("tia", TracerCategory::Stroke),
    ("stroke", TracerCategory::Stroke),
    ("apoplex", TracerCategory::Stroke),
    ("neurologisches defizit", TracerCategory::Stroke),
    ("halbseitenlähmung", TracerCategory::Stroke),
    ("hemiplegie", TracerCategory::Stroke),
    ("parese", TracerCategory::Stroke),
    ("sprachstörung", TracerCategory::Stroke),
    ("stemi", TracerCategory::Acs),
    ("nstemi", TracerCategory::Acs),
    ("acs", TracerCategory::Acs),
    ("herzinfarkt", TracerCategory::Acs),
    ("st-hebung", TracerCategory::Acs),
    ("sthebung", TracerCategory::Acs),
    ("reanimation", TracerCategory::Reanimation),
    ("herz-kreislauf-stillstand", TracerCategory::Reanimation),
    ("polytrauma", TracerCategory::Polytrauma),
    ("schwerverletzt", TracerCategory::Polytrauma),
];

/// Column holding the name-variant list
pub const NAME_COLUMN: &str = "Name";

/// Column added by [`annotate`] with the eligibility flag
pub const ELIGIBLE_COLUMN: &str = "hospital_eligible";

/// Column added by [`annotate`] with the matched category label
pub const CATEGORY_COLUMN: &str = "tracer_category";

const DESTINATION: &str = "targetDestination";
const DIAGNOSIS: &str = "leadingDiagnosis";

/// Hospital capability reference data, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HospitalTable {
    records: Vec<HospitalCapabilityRecord>,
}

impl HospitalTable {
    pub fn new(records: Vec<HospitalCapabilityRecord>) -> Self {
        Self { records }
    }

    /// Reads the `;`-delimited reference file
    ///
    /// # Errors
    ///
    /// Returns [`EmsError::Reference`] if the file cannot be read, a
    /// required column is missing or a capability cell is not a boolean.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| {
                EmsError::Reference(format!(
                    "Failed to open hospital table {}: {e}",
                    path.display()
                ))
            })?;
        let table = Self::from_reader(reader)?;
        tracing::info!(path = %path.display(), hospitals = table.len(), "Loaded hospital reference table");
        Ok(table)
    }

    /// Parses reference data from any `;`-delimited source
    pub fn from_csv_str(data: &str) -> Result<Self> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        Self::from_reader(reader)
    }

    fn from_reader<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<Self> {
        let headers = reader
            .headers()
            .map_err(|e| EmsError::Reference(format!("Unreadable header row: {e}")))?
            .clone();
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}') == name)
                .ok_or_else(|| EmsError::Reference(format!("Missing column '{name}'")))
        };

        let name_idx = position(NAME_COLUMN)?;
        let category_idx = TracerCategory::ALL
            .iter()
            .map(|c| position(c.column_name()))
            .collect::<Result<Vec<_>>>()?;

        let mut records = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| EmsError::Reference(format!("Malformed row {}: {e}", line + 2)))?;
            let cell = |idx: usize| record.get(idx).unwrap_or("");

            let mut flags = [false; 4];
            for (flag, (&idx, category)) in flags
                .iter_mut()
                .zip(category_idx.iter().zip(TracerCategory::ALL))
            {
                *flag = parse_flag(cell(idx)).ok_or_else(|| {
                    EmsError::Reference(format!(
                        "Row {}: '{}' is not a boolean in column '{}'",
                        line + 2,
                        cell(idx),
                        category.column_name()
                    ))
                })?;
            }
            let [stroke, acs, reanimation, polytrauma] = flags;

            records.push(HospitalCapabilityRecord::new(
                parse_name_list(cell(name_idx)),
                Capabilities {
                    stroke,
                    acs,
                    reanimation,
                    polytrauma,
                },
            ));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[HospitalCapabilityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First hospital whose name variants match the destination
    pub fn find_hospital(&self, destination: &str) -> Option<&HospitalCapabilityRecord> {
        let destination = destination.trim().to_lowercase();
        if destination.is_empty() {
            return None;
        }
        self.records.iter().find(|record| {
            record
                .name_variants
                .iter()
                .any(|v| destination.contains(v.as_str()) || v.contains(destination.as_str()))
        })
    }
}

/// Parses a capability cell
fn parse_flag(cell: &str) -> Option<bool> {
    match cell.trim().to_lowercase().as_str() {
        "true" | "wahr" | "ja" | "1" => Some(true),
        "false" | "falsch" | "nein" | "0" => Some(false),
        _ => None,
    }
}

/// Parses a list literal such as `['Klinikum Nord', "KN"]`
///
/// A cell without brackets is read as a single name.
pub fn parse_name_list(cell: &str) -> Vec<String> {
    let cell = cell.trim();
    let Some(inner) = cell.strip_prefix('[').and_then(|c| c.strip_suffix(']')) else {
        return vec![cell.to_string()];
    };

    let mut names = Vec::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\'' && c != '"' {
            continue;
        }
        let quote = c;
        let mut name = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        name.push(escaped);
                    }
                }
                c if c == quote => break,
                c => name.push(c),
            }
        }
        names.push(name);
    }
    names
}

/// Maps a diagnosis text onto its tracer category
pub fn classify_diagnosis(diagnosis: &str) -> Option<TracerCategory> {
    let diagnosis = diagnosis.trim().to_lowercase();
    if diagnosis.is_empty() {
        return None;
    }
    DIAGNOSIS_KEYWORDS
        .iter()
        .find(|(keyword, _)| diagnosis.contains(keyword))
        .map(|&(_, category)| category)
}

/// Whether the destination hospital can treat the category
pub fn classify_for_category(
    destination: &str,
    category: TracerCategory,
    table: &HospitalTable,
) -> bool {
    table
        .find_hospital(destination)
        .is_some_and(|record| record.capabilities.supports(category))
}

/// Whether the destination can treat the diagnosis
///
/// Unrecognized diagnoses and unknown hospitals are never eligible.
pub fn classify(destination: &str, diagnosis: &str, table: &HospitalTable) -> bool {
    classify_diagnosis(diagnosis)
        .is_some_and(|category| classify_for_category(destination, category, table))
}

/// Appends `tracer_category` and `hospital_eligible` to a mission table
///
/// Reads `targetDestination` and `leadingDiagnosis`; non-string cells count
/// as empty.
pub fn annotate(table: &mut MetricTable, hospitals: &HospitalTable) {
    table.set_column(CATEGORY_COLUMN, |row| {
        text(row.get(DIAGNOSIS))
            .and_then(classify_diagnosis)
            .map(|c| Value::String(c.column_name().to_string()))
            .unwrap_or(Value::Null)
    });
    table.set_column(ELIGIBLE_COLUMN, |row| {
        let eligible = match (text(row.get(DESTINATION)), text(row.get(DIAGNOSIS))) {
            (Some(destination), Some(diagnosis)) => classify(destination, diagnosis, hospitals),
            _ => false,
        };
        Value::Bool(eligible)
    });
}

/// Marks resuscitation missions delivered to a resuscitation-capable hospital
///
/// The category comes from `rea_status` instead of the diagnosis text;
/// missions without resuscitation are never eligible.
pub fn annotate_reanimation(table: &mut MetricTable, hospitals: &HospitalTable) {
    table.set_column(ELIGIBLE_COLUMN, |row| {
        let resuscitated = row.get("rea_status") == Some(&Value::Bool(true));
        let eligible = resuscitated
            && text(row.get(DESTINATION)).is_some_and(|destination| {
                classify_for_category(destination, TracerCategory::Reanimation, hospitals)
            });
        Value::Bool(eligible)
    });
}

fn text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

/// Per-category totals of an annotated table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategorySummary {
    pub total: usize,
    pub eligible: usize,
}

impl CategorySummary {
    /// Eligible share in percent; zero when there are no cases
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.eligible as f64 / self.total as f64 * 100.0
        }
    }
}

/// Counts cases and eligible cases per category, in reporting order
pub fn summarize(table: &MetricTable) -> Vec<(TracerCategory, CategorySummary)> {
    TracerCategory::ALL
        .iter()
        .map(|&category| {
            let mut summary = CategorySummary::default();
            for row in table.rows() {
                if text(row.get(CATEGORY_COLUMN)) == Some(category.column_name()) {
                    summary.total += 1;
                    if row.get(ELIGIBLE_COLUMN) == Some(&Value::Bool(true)) {
                        summary.eligible += 1;
                    }
                }
            }
            (category, summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    const TABLE: &str = "\
Name;TIA / Schlaganfall;ACS / STEMI /NSTEMI;Reanimation;Polytrauma
['Stroke Unit Nord', 'SUN'];True;False;wahr;False
['Herzzentrum Mitte'];false;true;true;0
['Kreiskrankenhaus Ost', \"KKH Ost\"];ja;nein;nein;nein
";

    fn table() -> HospitalTable {
        HospitalTable::from_csv_str(TABLE).unwrap()
    }

    #[test]
    fn test_parse_reference_table() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[0].name_variants, vec!["stroke unit nord", "sun"]);
        assert!(table.records()[0].capabilities.reanimation);
        assert_eq!(table.records()[2].name_variants, vec!["kreiskrankenhaus ost", "kkh ost"]);
    }

    #[test]
    fn test_missing_column_is_reference_error() {
        let err = HospitalTable::from_csv_str("Name;Polytrauma\n['A'];true\n").unwrap_err();
        assert!(matches!(err, EmsError::Reference(msg) if msg.contains("TIA / Schlaganfall")));
    }

    #[test]
    fn test_bad_flag_is_reference_error() {
        let data = "Name;TIA / Schlaganfall;ACS / STEMI /NSTEMI;Reanimation;Polytrauma\n['A'];vielleicht;true;true;true\n";
        assert!(matches!(
            HospitalTable::from_csv_str(data),
            Err(EmsError::Reference(_))
        ));
    }

    #[test]
    fn test_missing_file_is_reference_error() {
        let err = HospitalTable::from_path("/nonexistent/krankenhaus.csv").unwrap_err();
        assert!(matches!(err, EmsError::Reference(_)));
    }

    #[test_case("['A', 'B']", &["A", "B"] ; "single quotes")]
    #[test_case("[\"A\", 'B']", &["A", "B"] ; "mixed quotes")]
    #[test_case("['St. Anna\\'s']", &["St. Anna's"] ; "escaped quote")]
    #[test_case("[]", &[] ; "empty list")]
    #[test_case("Klinikum Nord", &["Klinikum Nord"] ; "bare name")]
    fn test_parse_name_list(cell: &str, expected: &[&str]) {
        assert_eq!(parse_name_list(cell), expected);
    }

    #[test_case("Verdacht auf Schlaganfall", Some(TracerCategory::Stroke))]
    #[test_case("V.a. STEMI Hinterwand", Some(TracerCategory::Acs))]
    #[test_case("NSTEMI", Some(TracerCategory::Acs))]
    #[test_case("ST-Hebungsinfarkt", Some(TracerCategory::Acs))]
    #[test_case("Sthebung inferior", Some(TracerCategory::Acs))]
    #[test_case("Herz-Kreislauf-Stillstand", Some(TracerCategory::Reanimation))]
    #[test_case("Polytrauma nach VU", Some(TracerCategory::Polytrauma))]
    #[test_case("Hypoglykämie", None)]
    #[test_case("", None)]
    fn test_classify_diagnosis(diagnosis: &str, expected: Option<TracerCategory>) {
        assert_eq!(classify_diagnosis(diagnosis), expected);
    }

    #[test]
    fn test_classify_stroke_unit() {
        assert!(classify("Stroke Unit Nord", "Verdacht auf Schlaganfall", &table()));
    }

    #[test]
    fn test_classify_polytrauma_not_supported() {
        assert!(!classify("Kreiskrankenhaus Ost", "Polytrauma", &table()));
    }

    #[test]
    fn test_classify_bidirectional_match() {
        let table = table();
        // destination contains a variant
        assert!(classify("SUN Notaufnahme", "TIA", &table));
        // variant contains the destination
        assert!(classify("herzzentrum", "Herzinfarkt", &table));
    }

    #[test]
    fn test_classify_unknown_inputs() {
        let table = table();
        assert!(!classify("Unbekannte Klinik", "Schlaganfall", &table));
        assert!(!classify("Stroke Unit Nord", "Übelkeit", &table));
        assert!(!classify("   ", "Schlaganfall", &table));
    }

    #[test]
    fn test_classify_for_category() {
        let table = table();
        assert!(classify_for_category("Herzzentrum Mitte", TracerCategory::Reanimation, &table));
        assert!(!classify_for_category("KKH Ost", TracerCategory::Reanimation, &table));
    }

    #[test]
    fn test_annotate_reanimation() {
        let mut missions = MetricTable::from_rows(vec![
            json!({"protocolId": "P-1", "rea_status": true, "targetDestination": "Herzzentrum Mitte"}),
            json!({"protocolId": "P-2", "rea_status": true, "targetDestination": "KKH Ost"}),
            json!({"protocolId": "P-3", "rea_status": false, "targetDestination": "Herzzentrum Mitte"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect());

        annotate_reanimation(&mut missions, &table());
        let eligible: Vec<_> = missions.column_values(ELIGIBLE_COLUMN).cloned().collect();
        assert_eq!(eligible, vec![json!(true), json!(false), json!(false)]);
    }

    #[test]
    fn test_annotate_and_summarize() {
        let mut missions = MetricTable::from_rows(vec![
            json!({"protocolId": "P-1", "targetDestination": "Stroke Unit Nord", "leadingDiagnosis": "Apoplex"}),
            json!({"protocolId": "P-2", "targetDestination": "KKH Ost", "leadingDiagnosis": "TIA"}),
            json!({"protocolId": "P-3", "targetDestination": null, "leadingDiagnosis": "Polytrauma"}),
            json!({"protocolId": "P-4", "targetDestination": "Herzzentrum Mitte", "leadingDiagnosis": "Synkope"}),
        ]
        .into_iter()
        .filter_map(|v| v.as_object().cloned())
        .collect());

        annotate(&mut missions, &table());
        let eligible: Vec<_> = missions.column_values(ELIGIBLE_COLUMN).cloned().collect();
        assert_eq!(eligible, vec![json!(true), json!(true), json!(false), json!(false)]);
        assert_eq!(missions.rows()[2][CATEGORY_COLUMN], json!("Polytrauma"));
        assert_eq!(missions.rows()[3][CATEGORY_COLUMN], Value::Null);

        let summary = summarize(&missions);
        assert_eq!(summary[0].0, TracerCategory::Stroke);
        assert_eq!(summary[0].1, CategorySummary { total: 2, eligible: 2 });
        assert_eq!(summary[3].1, CategorySummary { total: 1, eligible: 0 });
        assert_eq!(summary[1].1.percentage(), 0.0);
    }
}
