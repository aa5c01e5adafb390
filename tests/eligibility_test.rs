//! Hospital eligibility over dispatched mission tables

use ems_metrics::adapters::fixture::FixtureStore;
use ems_metrics::core::cache::NoCache;
use ems_metrics::core::eligibility::{
    annotate, annotate_reanimation, summarize, HospitalTable, CATEGORY_COLUMN, ELIGIBLE_COLUMN,
};
use ems_metrics::core::loaders::collections;
use ems_metrics::core::registry::{Dispatcher, MetricRequest};
use ems_metrics::domain::{EmsError, MetricTable, TracerCategory};
use serde_json::{json, Value};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const HOSPITALS: &str = "\u{feff}Name;TIA / Schlaganfall;ACS / STEMI /NSTEMI;Reanimation;Polytrauma
['Stroke Unit Nord', 'SUN'];True;False;True;False
['Herzzentrum Mitte'];False;True;True;False
['Kreiskrankenhaus Ost'];False;False;False;False
";

fn hospital_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn dispatcher() -> Dispatcher {
    let store = FixtureStore::new("einsatzdaten")
        .with_collection(
            collections::INDEX,
            vec![
                json!({"protocolId": "P-1", "missionDate": "2024-01-10T08:00:00",
                       "targetDestination": "Stroke Unit Nord", "leadingDiagnosis": "Schlaganfall"}),
                json!({"protocolId": "P-2", "missionDate": "2024-01-11T08:00:00",
                       "targetDestination": "Kreiskrankenhaus Ost", "leadingDiagnosis": "Polytrauma"}),
                json!({"protocolId": "P-3", "missionDate": "2024-01-12T08:00:00",
                       "targetDestination": "SUN", "leadingDiagnosis": "STEMI Hinterwand"}),
                json!({"protocolId": "P-4", "missionDate": "2024-01-13T08:00:00",
                       "targetDestination": "Herzzentrum Mitte", "leadingDiagnosis": "Synkope"}),
            ],
        )
        .with_collection(
            collections::RESULTS,
            vec![json!({"protocolId": "P-3", "content": [{"value_1": "Reanimation", "value_2": "ja"}]})],
        );
    Dispatcher::new(Arc::new(store), Arc::new(NoCache), 1000)
}

fn by_id<'a>(table: &'a MetricTable, id: &str) -> &'a serde_json::Map<String, Value> {
    table
        .rows()
        .iter()
        .find(|r| r["protocolId"] == json!(id))
        .unwrap()
}

#[test]
fn test_reference_table_from_file_with_bom() {
    let file = hospital_file(HOSPITALS);
    let hospitals = HospitalTable::from_path(file.path()).unwrap();
    assert_eq!(hospitals.len(), 3);
    assert!(hospitals.find_hospital("Stroke Unit Nord (Haus B)").is_some());
}

#[test]
fn test_missing_reference_file() {
    let err = HospitalTable::from_path("/nonexistent/krankenhausDiagnosen.csv").unwrap_err();
    assert!(matches!(err, EmsError::Reference(_)));
}

#[tokio::test]
async fn test_annotate_index_missions() {
    let file = hospital_file(HOSPITALS);
    let hospitals = HospitalTable::from_path(file.path()).unwrap();

    let index = dispatcher().dispatch(&MetricRequest::new("Index")).await.unwrap();
    let mut table = (*index).clone();
    annotate(&mut table, &hospitals);

    assert_eq!(by_id(&table, "P-1")[ELIGIBLE_COLUMN], json!(true));
    assert_eq!(by_id(&table, "P-2")[ELIGIBLE_COLUMN], json!(false));
    // SUN has no cardiac catheter lab
    assert_eq!(by_id(&table, "P-3")[ELIGIBLE_COLUMN], json!(false));
    assert_eq!(by_id(&table, "P-3")[CATEGORY_COLUMN], json!("ACS / STEMI /NSTEMI"));
    assert_eq!(by_id(&table, "P-4")[CATEGORY_COLUMN], Value::Null);

    let summary = summarize(&table);
    let stroke = summary
        .iter()
        .find(|(c, _)| *c == TracerCategory::Stroke)
        .map(|(_, s)| *s)
        .unwrap();
    assert_eq!((stroke.total, stroke.eligible), (1, 1));
    assert!((stroke.percentage() - 100.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_annotate_reanimation_missions() {
    let hospitals = HospitalTable::from_csv_str(HOSPITALS).unwrap();

    let rea = dispatcher()
        .dispatch(&MetricRequest::new("Reanimation_mit_targetDestination"))
        .await
        .unwrap();
    let mut table = (*rea).clone();
    annotate_reanimation(&mut table, &hospitals);

    assert_eq!(table.len(), 1);
    assert_eq!(table.rows()[0]["targetDestination"], json!("SUN"));
    assert_eq!(table.rows()[0][ELIGIBLE_COLUMN], json!(true));
}
