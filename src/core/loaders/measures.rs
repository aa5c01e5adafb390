//! Care measures loader (`protocols_measures`)

use super::slots::{MeasureEntry, MeasureKind, Slot, DISCRIMINATOR};
use super::{base_row, collections, fetch_slots, or_empty, schema_with, LoadScope};
use crate::adapters::store::{Filter, RecordStore};
use crate::domain::{MetricTable, Result};

/// Output schema of a measure metric
pub fn schema(kind: MeasureKind) -> Vec<&'static str> {
    match kind {
        MeasureKind::Medication => schema_with(&["med_name", "med_dose", "med_unit", "med_route"]),
        MeasureKind::Intubation => schema_with(&["airway_type", "tube_size", "attempts"]),
        MeasureKind::Ecg => schema_with(&["ecg_finding", "ecg_transmitted"]),
    }
}

/// Loads administered medications
///
/// With `name`, only elements whose medication name contains it
/// (ignoring case) are kept, both in the store query and after exploding.
pub async fn load_medications(
    store: &dyn RecordStore,
    name: Option<&str>,
    scope: LoadScope<'_>,
) -> MetricTable {
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let mut element = Filter::eq(DISCRIMINATOR, MeasureKind::Medication.discriminator());
    if let Some(name) = name {
        element = Filter::and([element, Filter::contains_ignore_case("value_2", name)]);
    }
    load_with(store, MeasureKind::Medication, element, scope).await
}

/// Loads intubation or 12-lead ECG measures
pub async fn load_metric_from_measures(
    store: &dyn RecordStore,
    kind: MeasureKind,
    scope: LoadScope<'_>,
) -> MetricTable {
    let element = Filter::eq(DISCRIMINATOR, kind.discriminator());
    load_with(store, kind, element, scope).await
}

async fn load_with(
    store: &dyn RecordStore,
    kind: MeasureKind,
    element: Filter,
    scope: LoadScope<'_>,
) -> MetricTable {
    let schema = schema(kind);
    let result = try_load(store, kind, &element, scope, &schema).await;
    or_empty(kind.discriminator(), collections::MEASURES, &schema, result)
}

async fn try_load(
    store: &dyn RecordStore,
    kind: MeasureKind,
    element: &Filter,
    scope: LoadScope<'_>,
    schema: &[&str],
) -> Result<MetricTable> {
    let rows = fetch_slots(store, collections::MEASURES, element, scope).await?;

    let out = rows
        .iter()
        .filter_map(|row| {
            let entry = MeasureEntry::decode(&Slot::from_row(row)?)?;
            let mut out = base_row(row, kind.discriminator(), collections::MEASURES);
            for (column, value) in entry.into_columns() {
                out.insert(column.to_string(), value);
            }
            Some(out)
        })
        .collect();

    Ok(MetricTable::project(out, schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::fixture::FixtureStore;
    use serde_json::json;

    fn store() -> FixtureStore {
        FixtureStore::new("db").with_collection(
            collections::MEASURES,
            vec![
                json!({"protocolId": "P-1", "content": [
                    {"value_1": "Medikamente", "value_2": "Acetylsalicylsäure 500mg", "value_3": "500", "value_4": "mg", "value_5": "i.v."},
                    {"value_1": "Intubation", "value_2": "Endotracheal", "value_3": "7.5", "value_4": "2"}
                ]}),
                json!({"protocolId": "P-2", "content": [
                    {"value_1": "Medikamente", "value_2": "Morphin", "value_3": "5", "value_4": "mg"},
                    {"value_1": "12-Kanal-EKG", "value_2": "STEMI Vorderwand", "value_3": "nein"}
                ]}),
            ],
        )
    }

    #[tokio::test]
    async fn test_all_medications() {
        let table = load_medications(&store(), None, LoadScope::new(100)).await;
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1]["med_route"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_medication_name_filter_ignores_case() {
        let table = load_medications(&store(), Some("acetylsalicyl"), LoadScope::new(100)).await;
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0]["protocolId"], json!("P-1"));
        assert_eq!(table.rows()[0]["med_dose"], json!("500"));
    }

    #[tokio::test]
    async fn test_blank_medication_name_means_no_filter() {
        let table = load_medications(&store(), Some("  "), LoadScope::new(100)).await;
        assert_eq!(table.len(), 2);
    }

    #[tokio::test]
    async fn test_intubation_and_ecg() {
        let intubation =
            load_metric_from_measures(&store(), MeasureKind::Intubation, LoadScope::new(100)).await;
        assert_eq!(intubation.len(), 1);
        assert_eq!(intubation.rows()[0]["attempts"], json!(2));
        assert_eq!(intubation.rows()[0]["tube_size"], json!("7.5"));

        let ecg = load_metric_from_measures(&store(), MeasureKind::Ecg, LoadScope::new(100)).await;
        assert_eq!(ecg.len(), 1);
        assert_eq!(ecg.rows()[0]["ecg_transmitted"], json!(false));
        assert_eq!(ecg.rows()[0]["metric"], json!("12-Kanal-EKG"));
    }
}
