//! Read-only repository over a directory of JSON exports
//!
//! Expects `entities.json`, `snapshots.json` and `records.json`, each a JSON
//! array in the wire shape of the corresponding model. A missing file reads
//! as an empty collection.

use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::{Path, PathBuf};

use super::repository::{RecordRepository, SnapshotRepository};
use super::{StorageError, StorageResult};
use crate::models::{EnrichedRecord, Entity, Snapshot};

pub const ENTITIES_FILE: &str = "entities.json";
pub const SNAPSHOTS_FILE: &str = "snapshots.json";
pub const RECORDS_FILE: &str = "records.json";

/// JSON-file implementation of both repositories
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    dir: PathBuf,
}

impl JsonFileRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_array<T: DeserializeOwned>(&self, file: &str) -> StorageResult<Vec<T>> {
        let path = self.dir.join(file);

        let handle = match File::open(&path) {
            Ok(handle) => handle,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "JSON export missing, treating as empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let items: Vec<T> =
            serde_json::from_reader(BufReader::new(handle)).map_err(|source| StorageError::Json {
                path: path.display().to_string(),
                source,
            })?;

        tracing::debug!(path = %path.display(), count = items.len(), "Loaded JSON export");
        Ok(items)
    }
}

impl SnapshotRepository for JsonFileRepository {
    fn load_entities(&self) -> StorageResult<Vec<Entity>> {
        self.read_array(ENTITIES_FILE)
    }

    fn load_snapshots(&self) -> StorageResult<Vec<Snapshot>> {
        self.read_array(SNAPSHOTS_FILE)
    }
}

impl RecordRepository for JsonFileRepository {
    fn load_records(&self) -> StorageResult<Vec<EnrichedRecord>> {
        self.read_array(RECORDS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_files_are_empty() {
        let dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(dir.path());

        assert!(repo.load_entities().unwrap().is_empty());
        assert!(repo.load_snapshots().unwrap().is_empty());
        assert!(repo.load_records().unwrap().is_empty());
    }

    #[test]
    fn test_reads_wire_shapes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(ENTITIES_FILE),
            r#"[{"id": "e1", "name": "Acme", "launch_timestamp": "2024-03-05 09:00:00", "category_labels": ["AI"]}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(SNAPSHOTS_FILE),
            r#"[{"entity_id": "e1", "entity_name": "Acme", "metric_primary": 4, "metric_secondary": 1, "captured_at": "2024-03-05T09:30:00Z"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join(RECORDS_FILE),
            r#"[{"id": "r1", "name": "Acme", "metric_primary": 4, "metric_secondary": 1, "launched_at": "2024-03-05T09:00:00Z"}]"#,
        )
        .unwrap();

        let repo = JsonFileRepository::new(dir.path());

        assert_eq!(repo.load_entities().unwrap()[0].primary_category(), Some("AI"));
        assert_eq!(repo.load_snapshots().unwrap()[0].metric_primary, 4);
        assert!(repo.load_records().unwrap()[0].structured_analysis.is_none());
    }

    #[test]
    fn test_malformed_json_reports_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SNAPSHOTS_FILE), "{not json").unwrap();

        let err = JsonFileRepository::new(dir.path()).load_snapshots().unwrap_err();
        assert!(matches!(err, StorageError::Json { .. }));
        assert!(err.to_string().contains(SNAPSHOTS_FILE));
    }

    #[test]
    fn test_negative_metric_fails_to_parse() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SNAPSHOTS_FILE),
            r#"[{"entity_id": "e1", "entity_name": "Acme", "metric_primary": -4, "metric_secondary": 1, "captured_at": "2024-03-05T09:30:00Z"}]"#,
        )
        .unwrap();

        assert!(JsonFileRepository::new(dir.path()).load_snapshots().is_err());
    }
}
