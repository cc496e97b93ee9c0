//! Data access for snapshots, entities and enriched records
//!
//! The analytics core never touches storage. Pipelines receive one of the
//! repositories below at construction time and hand the fetched data to the
//! core as plain slices.

pub mod json;
pub mod repository;

use thiserror::Error;

pub use json::JsonFileRepository;
pub use repository::{MockRepository, RecordRepository, SnapshotRepository, SqliteRepository};

/// Errors raised while loading data
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed category labels for entity {entity_id}: {source}")]
    CategoryLabels {
        entity_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Negative metric {value} in {table} row {id}")]
    NegativeMetric { table: &'static str, id: String, value: i64 },

    #[error("Repository lock poisoned")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
