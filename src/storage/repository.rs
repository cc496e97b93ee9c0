//! Repository Pattern for Data Access
//!
//! Trait-based repositories decouple the pipelines from where snapshots and
//! records live, enabling:
//! - Testing pipelines against in-memory data
//! - Swappable backends (SQLite, JSON exports)
//! - A pure analytics core with no persistence dependency
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              TrendPipeline / IntelligencePipeline           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Repository Traits                         │
//! │          SnapshotRepository, RecordRepository               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//! ┌─────────────────┐ ┌─────────────────┐ ┌─────────────────┐
//! │     SQLite      │ │   JSON files    │ │      Mock       │
//! └─────────────────┘ └─────────────────┘ └─────────────────┘
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard, RwLock};

use rusqlite::{params, Connection, OpenFlags, Row};

use super::{StorageError, StorageResult};
use crate::models::{Attribute, EnrichedRecord, Entity, Snapshot, StructuredAnalysis};

// ============================================================================
// Repository Traits
// ============================================================================

/// Source of tracked entities and their popularity snapshots
pub trait SnapshotRepository: Send + Sync {
    /// All tracked entities
    fn load_entities(&self) -> StorageResult<Vec<Entity>>;

    /// All snapshots, in capture order where the backend knows it
    fn load_snapshots(&self) -> StorageResult<Vec<Snapshot>>;
}

/// Source of enriched launch records
pub trait RecordRepository: Send + Sync {
    /// Every enriched record, with or without structured analysis
    fn load_records(&self) -> StorageResult<Vec<EnrichedRecord>>;
}

impl<T: SnapshotRepository + ?Sized> SnapshotRepository for &T {
    fn load_entities(&self) -> StorageResult<Vec<Entity>> {
        (**self).load_entities()
    }

    fn load_snapshots(&self) -> StorageResult<Vec<Snapshot>> {
        (**self).load_snapshots()
    }
}

impl<T: RecordRepository + ?Sized> RecordRepository for &T {
    fn load_records(&self) -> StorageResult<Vec<EnrichedRecord>> {
        (**self).load_records()
    }
}

// ============================================================================
// SQLite Implementation
// ============================================================================

fn metric(table: &'static str, id: &str, value: i64) -> StorageResult<u64> {
    u64::try_from(value).map_err(|_| StorageError::NegativeMetric {
        table,
        id: id.to_string(),
        value,
    })
}

/// SQLite implementation of both repositories
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) a database file
    pub fn new(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let repo = Self {
            conn: Mutex::new(conn),
        };
        repo.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite repository initialized");
        Ok(repo)
    }

    /// Open an existing database without creating or migrating anything
    ///
    /// Fails with [`StorageError::Io`] when `path` does not exist.
    pub fn open_read_only(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();

        std::fs::metadata(path).map_err(|source| StorageError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        tracing::debug!(path = %path.display(), "SQLite repository opened read-only");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create in-memory repository (for testing)
    pub fn in_memory() -> StorageResult<Self> {
        let repo = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        repo.create_schema()?;
        Ok(repo)
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn create_schema(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS entities (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    launch_timestamp TEXT NOT NULL,
                    category_labels TEXT NOT NULL DEFAULT '[]'
                );

                CREATE TABLE IF NOT EXISTS snapshots (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    entity_id TEXT NOT NULL,
                    entity_name TEXT NOT NULL,
                    metric_primary INTEGER NOT NULL DEFAULT 0,
                    metric_secondary INTEGER NOT NULL DEFAULT 0,
                    captured_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_snapshots_entity
                    ON snapshots(entity_id, captured_at);

                CREATE TABLE IF NOT EXISTS records (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    metric_primary INTEGER NOT NULL DEFAULT 0,
                    metric_secondary INTEGER NOT NULL DEFAULT 0,
                    has_analysis INTEGER NOT NULL DEFAULT 0,
                    icp TEXT,
                    problem TEXT,
                    niche TEXT,
                    pricing_model TEXT,
                    launched_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_records_niche
                    ON records(niche);
                "#,
        )?;

        Ok(())
    }

    /// Insert or replace an entity
    pub fn upsert_entity(&self, entity: &Entity) -> StorageResult<()> {
        let labels = serde_json::to_string(&entity.category_labels).map_err(|source| {
            StorageError::CategoryLabels {
                entity_id: entity.id.clone(),
                source,
            }
        })?;

        self.conn()?.execute(
            "INSERT OR REPLACE INTO entities (id, name, launch_timestamp, category_labels)
             VALUES (?1, ?2, ?3, ?4)",
            params![entity.id, entity.name, entity.launch_timestamp, labels],
        )?;
        Ok(())
    }

    /// Append a snapshot
    pub fn insert_snapshot(&self, snapshot: &Snapshot) -> StorageResult<()> {
        self.conn()?.execute(
            "INSERT INTO snapshots (entity_id, entity_name, metric_primary, metric_secondary, captured_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                snapshot.entity_id,
                snapshot.entity_name,
                snapshot.metric_primary as i64,
                snapshot.metric_secondary as i64,
                snapshot.captured_at
            ],
        )?;
        Ok(())
    }

    /// Insert or replace an enriched record
    pub fn upsert_record(&self, record: &EnrichedRecord) -> StorageResult<()> {
        let analysis = record.structured_analysis.as_ref();
        let field = |f: fn(&StructuredAnalysis) -> &Attribute| {
            analysis.and_then(|a| f(a).known().map(str::to_string))
        };

        self.conn()?.execute(
            "INSERT OR REPLACE INTO records
                (id, name, metric_primary, metric_secondary, has_analysis,
                 icp, problem, niche, pricing_model, launched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.id,
                record.name,
                record.metric_primary as i64,
                record.metric_secondary as i64,
                analysis.is_some(),
                field(|a| &a.icp),
                field(|a| &a.problem),
                field(|a| &a.niche),
                field(|a| &a.pricing_model),
                record.launched_at
            ],
        )?;
        Ok(())
    }

    fn read_record(row: &Row<'_>) -> rusqlite::Result<(EnrichedRecord, i64, i64)> {
        let has_analysis: bool = row.get(4)?;
        let analysis = has_analysis.then(|| -> rusqlite::Result<StructuredAnalysis> {
            Ok(StructuredAnalysis {
                icp: Attribute::parse(row.get::<_, Option<String>>(5)?.as_deref()),
                problem: Attribute::parse(row.get::<_, Option<String>>(6)?.as_deref()),
                niche: Attribute::parse(row.get::<_, Option<String>>(7)?.as_deref()),
                pricing_model: Attribute::parse(row.get::<_, Option<String>>(8)?.as_deref()),
            })
        });

        Ok((
            EnrichedRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                metric_primary: 0,
                metric_secondary: 0,
                structured_analysis: analysis.transpose()?,
                launched_at: row.get(9)?,
            },
            row.get(2)?,
            row.get(3)?,
        ))
    }
}

impl SnapshotRepository for SqliteRepository {
    fn load_entities(&self) -> StorageResult<Vec<Entity>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, launch_timestamp, category_labels FROM entities ORDER BY launch_timestamp, id",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(id, name, launch_timestamp, labels)| {
                let category_labels = serde_json::from_str(&labels).map_err(|source| {
                    StorageError::CategoryLabels {
                        entity_id: id.clone(),
                        source,
                    }
                })?;
                Ok(Entity {
                    id,
                    name,
                    launch_timestamp,
                    category_labels,
                })
            })
            .collect()
    }

    fn load_snapshots(&self) -> StorageResult<Vec<Snapshot>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT entity_id, entity_name, metric_primary, metric_secondary, captured_at
             FROM snapshots ORDER BY captured_at, seq",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(entity_id, entity_name, primary, secondary, captured_at)| {
                Ok(Snapshot {
                    metric_primary: metric("snapshots", &entity_id, primary)?,
                    metric_secondary: metric("snapshots", &entity_id, secondary)?,
                    entity_id,
                    entity_name,
                    captured_at,
                })
            })
            .collect()
    }
}

impl RecordRepository for SqliteRepository {
    fn load_records(&self) -> StorageResult<Vec<EnrichedRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, metric_primary, metric_secondary, has_analysis,
                    icp, problem, niche, pricing_model, launched_at
             FROM records ORDER BY launched_at, id",
        )?;

        let rows = stmt
            .query_map([], Self::read_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(mut record, primary, secondary)| {
                record.metric_primary = metric("records", &record.id, primary)?;
                record.metric_secondary = metric("records", &record.id, secondary)?;
                Ok(record)
            })
            .collect()
    }
}

// ============================================================================
// Mock Implementation (for testing)
// ============================================================================

/// In-memory implementation of both repositories
///
/// Useful for testing without database dependencies.
#[derive(Debug, Default)]
pub struct MockRepository {
    entities: RwLock<Vec<Entity>>,
    snapshots: RwLock<Vec<Snapshot>>,
    records: RwLock<Vec<EnrichedRecord>>,
}

impl MockRepository {
    /// Create a new mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock pre-filled with data
    pub fn with_data(entities: Vec<Entity>, snapshots: Vec<Snapshot>, records: Vec<EnrichedRecord>) -> Self {
        Self {
            entities: RwLock::new(entities),
            snapshots: RwLock::new(snapshots),
            records: RwLock::new(records),
        }
    }

    pub fn upsert_entity(&self, entity: &Entity) -> StorageResult<()> {
        let mut entities = self.entities.write().map_err(|_| StorageError::LockPoisoned)?;
        entities.retain(|e| e.id != entity.id);
        entities.push(entity.clone());
        Ok(())
    }

    pub fn insert_snapshot(&self, snapshot: &Snapshot) -> StorageResult<()> {
        self.snapshots
            .write()
            .map_err(|_| StorageError::LockPoisoned)?
            .push(snapshot.clone());
        Ok(())
    }

    pub fn upsert_record(&self, record: &EnrichedRecord) -> StorageResult<()> {
        let mut records = self.records.write().map_err(|_| StorageError::LockPoisoned)?;
        records.retain(|r| r.id != record.id);
        records.push(record.clone());
        Ok(())
    }
}

impl SnapshotRepository for MockRepository {
    fn load_entities(&self) -> StorageResult<Vec<Entity>> {
        Ok(self.entities.read().map_err(|_| StorageError::LockPoisoned)?.clone())
    }

    fn load_snapshots(&self) -> StorageResult<Vec<Snapshot>> {
        Ok(self.snapshots.read().map_err(|_| StorageError::LockPoisoned)?.clone())
    }
}

impl RecordRepository for MockRepository {
    fn load_records(&self) -> StorageResult<Vec<EnrichedRecord>> {
        Ok(self.records.read().map_err(|_| StorageError::LockPoisoned)?.clone())
    }
}
