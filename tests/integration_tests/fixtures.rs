//! Test fixtures for integration tests
//!
//! Provides a JSON export and helpers that load the same data into every
//! repository backend.

use std::path::Path;

use launchscope::models::{EnrichedRecord, Entity, Snapshot};
use launchscope::storage::{MockRepository, SqliteRepository};

/// Two launches on 2024-03-05 in overlapping categories
pub const ENTITIES_JSON: &str = r#"[
    {"id": "acme", "name": "Acme", "launch_timestamp": "2024-03-05T09:00:00Z", "category_labels": ["Developer Tools", "AI"]},
    {"id": "beta", "name": "Beta", "launch_timestamp": "2024-03-05 10:00:00", "category_labels": ["AI"]},
    {"id": "solo", "name": "Solo", "launch_timestamp": "2024-03-05T10:00:00Z"}
]"#;

/// Hourly-ish snapshots, deliberately out of order
pub const SNAPSHOTS_JSON: &str = r#"[
    {"entity_id": "acme", "entity_name": "Acme", "metric_primary": 80, "metric_secondary": 9, "captured_at": "2024-03-05T10:30:00Z"},
    {"entity_id": "acme", "entity_name": "Acme", "metric_primary": 40, "metric_secondary": 4, "captured_at": "2024-03-05T09:30:00Z"},
    {"entity_id": "beta", "entity_name": "Beta", "metric_primary": 15, "metric_secondary": 1, "captured_at": "2024-03-05 10:20:00"},
    {"entity_id": "solo", "entity_name": "Solo", "metric_primary": 3, "metric_secondary": 0, "captured_at": "2024-03-05T10:05:00Z"}
]"#;

/// Enriched records, one of them never classified
pub const RECORDS_JSON: &str = r#"[
    {"id": "1", "name": "Clausebot", "metric_primary": 320, "metric_secondary": 30, "launched_at": "2024-03-04T09:00:00Z",
     "structured_analysis": {"icp": "lawyers", "problem": "contracts", "niche": "legal", "pricing_model": "subscription"}},
    {"id": "2", "name": "Redline", "metric_primary": 280, "metric_secondary": 10, "launched_at": "2024-03-03T09:00:00Z",
     "structured_analysis": {"icp": "lawyers", "problem": "contracts", "niche": "legal"}},
    {"id": "3", "name": "Billwise", "metric_primary": 20, "metric_secondary": 0, "launched_at": "2024-02-20T09:00:00Z",
     "structured_analysis": {"icp": "lawyers", "problem": "billing", "niche": "legal"}},
    {"id": "4", "name": "Mystery", "metric_primary": 900, "metric_secondary": 90, "launched_at": "2024-03-04T09:00:00Z"},
    {"id": "5", "name": "Vague", "metric_primary": 500, "metric_secondary": 50, "launched_at": "2024-03-04T09:00:00Z",
     "structured_analysis": {"icp": "unknown", "problem": "N/A", "niche": ""}}
]"#;

pub fn entities() -> Vec<Entity> {
    serde_json::from_str(ENTITIES_JSON).unwrap()
}

pub fn snapshots() -> Vec<Snapshot> {
    serde_json::from_str(SNAPSHOTS_JSON).unwrap()
}

pub fn records() -> Vec<EnrichedRecord> {
    serde_json::from_str(RECORDS_JSON).unwrap()
}

/// Write the export files into `dir`
pub fn write_json_export(dir: &Path) {
    std::fs::write(dir.join("entities.json"), ENTITIES_JSON).unwrap();
    std::fs::write(dir.join("snapshots.json"), SNAPSHOTS_JSON).unwrap();
    std::fs::write(dir.join("records.json"), RECORDS_JSON).unwrap();
}

/// Load the fixtures into a SQLite database at `path`
pub fn seed_sqlite(path: &Path) -> SqliteRepository {
    let repo = SqliteRepository::new(path).unwrap();
    for entity in entities() {
        repo.upsert_entity(&entity).unwrap();
    }
    for snapshot in snapshots() {
        repo.insert_snapshot(&snapshot).unwrap();
    }
    for record in records() {
        repo.upsert_record(&record).unwrap();
    }
    repo
}

pub fn seed_mock() -> MockRepository {
    MockRepository::with_data(entities(), snapshots(), records())
}
