//! Error scenario integration tests
//!
//! Tests failure modes and how they surface through the pipelines:
//! 1. Missing and malformed JSON exports
//! 2. Corrupt SQLite rows
//! 3. Unparseable timestamps
//! 4. Error categories and recoverability

use chrono::{DateTime, TimeZone, Utc};
use launchscope::config::Config;
use launchscope::error::{Error, ErrorCategory, LaunchscopeErrorTrait};
use launchscope::pipeline::{IntelligencePipeline, TrendPipeline};
use launchscope::storage::{JsonFileRepository, SqliteRepository, StorageError};
use rusqlite::Connection;
use tempfile::TempDir;

use super::fixtures::{seed_sqlite, write_json_export};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 11, 0, 0).unwrap()
}

// ============================================================================
// JSON Export Tests
// ============================================================================

#[test]
fn test_empty_export_directory_yields_empty_results() {
    let dir = TempDir::new().unwrap();
    let config = Config::default();

    let trends = TrendPipeline::new(JsonFileRepository::new(dir.path()), &config);
    assert!(trends.entity_trends(now()).unwrap().is_empty());
    assert!(trends.category_trends(now()).unwrap().is_empty());

    let intel = IntelligencePipeline::new(JsonFileRepository::new(dir.path()), &config);
    assert!(intel.success_patterns(10).unwrap().is_empty());
    assert!(intel.market_gaps(10).unwrap().is_empty());
}

#[test]
fn test_malformed_snapshot_export() {
    let dir = TempDir::new().unwrap();
    write_json_export(dir.path());
    std::fs::write(dir.path().join("snapshots.json"), "[{\"entity_id\": ").unwrap();

    let err = TrendPipeline::new(JsonFileRepository::new(dir.path()), &Config::default())
        .entity_trends(now())
        .unwrap_err();

    assert!(matches!(err, Error::Storage(StorageError::Json { .. })));
    assert_eq!(err.category(), ErrorCategory::Data);
    assert!(!err.is_recoverable());
}

#[test]
fn test_unparseable_timestamp_in_export() {
    let dir = TempDir::new().unwrap();
    write_json_export(dir.path());
    std::fs::write(
        dir.path().join("entities.json"),
        r#"[{"id": "acme", "name": "Acme", "launch_timestamp": "03/05/2024 9am"}]"#,
    )
    .unwrap();

    let err = TrendPipeline::new(JsonFileRepository::new(dir.path()), &Config::default())
        .entity_trends(now())
        .unwrap_err();

    assert!(matches!(err, Error::Analytics(_)));
    assert!(err.to_string().contains("03/05/2024 9am"));
}

#[test]
fn test_unparseable_record_date_only_matters_for_trends() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("records.json"),
        r#"[
            {"id": "1", "name": "A", "metric_primary": 10, "metric_secondary": 1, "launched_at": "soon",
             "structured_analysis": {"icp": "chefs", "problem": "inventory", "niche": "food"}},
            {"id": "2", "name": "B", "metric_primary": 10, "metric_secondary": 1, "launched_at": "soon",
             "structured_analysis": {"icp": "chefs", "problem": "inventory", "niche": "food"}}
        ]"#,
    )
    .unwrap();

    let pipeline = IntelligencePipeline::new(JsonFileRepository::new(dir.path()), &Config::default());

    assert_eq!(pipeline.success_patterns(10).unwrap().len(), 1);
    assert!(pipeline.niche_profile("food", now()).is_err());
}

// ============================================================================
// SQLite Tests
// ============================================================================

#[test]
fn test_negative_metric_row() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("launchscope.db");
    drop(seed_sqlite(&path));

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "INSERT INTO snapshots (entity_id, entity_name, metric_primary, metric_secondary, captured_at)
         VALUES ('acme', 'Acme', -5, 0, '2024-03-05T10:45:00Z')",
        [],
    )
    .unwrap();
    drop(conn);

    let err = TrendPipeline::new(SqliteRepository::new(&path).unwrap(), &Config::default())
        .entity_trends(now())
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Storage(StorageError::NegativeMetric { value: -5, .. })
    ));
    assert_eq!(err.category(), ErrorCategory::Data);
}

#[test]
fn test_corrupt_category_labels() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("launchscope.db");
    drop(seed_sqlite(&path));

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE entities SET category_labels = 'AI, Dev' WHERE id = 'acme'",
        [],
    )
    .unwrap();
    drop(conn);

    let err = TrendPipeline::new(SqliteRepository::new(&path).unwrap(), &Config::default())
        .category_trends(now())
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Storage(StorageError::CategoryLabels { ref entity_id, .. }) if entity_id == "acme"
    ));
}

#[test]
fn test_database_under_a_file() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();

    let err = SqliteRepository::new(blocker.join("db.sqlite")).unwrap_err();
    assert!(matches!(err, StorageError::Io { .. }));
    assert_eq!(err.category(), ErrorCategory::Storage);
}
