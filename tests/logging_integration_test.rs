//! Integration tests for logging functionality
//!
//! The global subscriber can be installed once per process, so this binary
//! holds a single test.

use ems_metrics::config::LoggingConfig;
use ems_metrics::logging::init_logging;
use ems_metrics::logging::structured::LOG_FILE_PREFIX;
use tempfile::TempDir;

#[test]
fn test_local_logging_writes_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "daily".to_string(),
    };
    assert!(!log_path.exists());

    let guard = init_logging("debug", &config).unwrap();
    assert!(guard.has_file_output());
    assert!(log_path.is_dir());

    tracing::info!(target: "ems_metrics", metric = "GCS", "Table loaded");
    drop(guard);

    let log_files: Vec<_> = std::fs::read_dir(&log_path)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX))
        })
        .collect();
    assert_eq!(log_files.len(), 1);

    let contents = std::fs::read_to_string(&log_files[0]).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("Table loaded"))
        .expect("event written to file");
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["fields"]["metric"], "GCS");
    assert_eq!(event["level"], "INFO");
}
