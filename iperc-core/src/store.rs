//! Record persistence
//!
//! Records are stored whole, keyed by id, as their JSON wire form. Reading a
//! record back rebuilds every row through validation, so derived risk fields
//! always match probability and severity.

use crate::config::{ResolvedConfig, StoreKind};
use crate::record::EvaluationRecord;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key-value store of evaluation records
pub trait RecordStore {
    /// Insert or replace the record with `record.id`
    fn put(&mut self, record: &EvaluationRecord) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<EvaluationRecord>>;

    /// Records ordered by id, at most `limit` of them when given
    fn list(&self, limit: Option<usize>) -> Result<Vec<EvaluationRecord>>;
}

/// Open the store selected by configuration
pub fn open_store(config: &ResolvedConfig) -> Result<Box<dyn RecordStore>> {
    match config.store {
        StoreKind::Memory => {
            log::debug!("using in-memory store");
            Ok(Box::new(MemoryStore::new()))
        }
        StoreKind::Sqlite => Ok(Box::new(SqliteStore::open(&config.data_path)?)),
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, EvaluationRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn put(&mut self, record: &EvaluationRecord) -> Result<()> {
        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<EvaluationRecord>> {
        Ok(self.records.get(id).cloned())
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<EvaluationRecord>> {
        Ok(self
            .records
            .values()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }
}

/// Durable store backed by a single SQLite table
///
/// Schema: `evaluations(id TEXT PRIMARY KEY, body TEXT, updated_at TEXT)` where
/// `body` is the record JSON.
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (and create if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database: {}", path.display()))?;
        let store = SqliteStore {
            conn,
            path: Some(path.to_path_buf()),
        };
        store.init_schema()?;
        log::debug!("opened record store at {}", path.display());
        Ok(store)
    }

    /// Database that lives only as long as this value
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
        let store = SqliteStore { conn, path: None };
        store.init_schema()?;
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn init_schema(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS evaluations (
                    id TEXT PRIMARY KEY,
                    body TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );",
            )
            .context("failed to initialize evaluations table")
    }
}

fn decode(id: &str, body: &str) -> Result<EvaluationRecord> {
    serde_json::from_str(body).with_context(|| format!("corrupt stored record: {}", id))
}

impl RecordStore for SqliteStore {
    fn put(&mut self, record: &EvaluationRecord) -> Result<()> {
        let body = serde_json::to_string(record)
            .with_context(|| format!("failed to serialize {}", record.id))?;
        self.conn
            .execute(
                "INSERT INTO evaluations (id, body, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
                params![record.id, body, record.updated_at.to_rfc3339()],
            )
            .with_context(|| format!("failed to store {}", record.id))?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<EvaluationRecord>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM evaluations WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("failed to load {}", id))?;
        body.map(|b| decode(id, &b)).transpose()
    }

    fn list(&self, limit: Option<usize>) -> Result<Vec<EvaluationRecord>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(|l| l.min(i64::MAX as usize) as i64).unwrap_or(-1);
        let mut stmt = self
            .conn
            .prepare("SELECT id, body FROM evaluations ORDER BY id LIMIT ?1")
            .context("failed to prepare listing query")?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .context("failed to list records")?
            .collect::<rusqlite::Result<Vec<(String, String)>>>()
            .context("failed to read record rows")?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, body) in rows {
            records.push(decode(&id, &body)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RecordDraft, RowInput};
    use chrono::{TimeZone, Utc};

    fn record(company: &str) -> EvaluationRecord {
        let draft = RecordDraft {
            company: company.to_string(),
            area: "Logística".to_string(),
            process: "Estiba".to_string(),
            rows: vec![RowInput::new("Apilado", "Caída de carga", "Contusión", 2, 10)],
        };
        EvaluationRecord::create(&draft, Utc.with_ymd_and_hms(2026, 1, 5, 7, 0, 0).unwrap())
            .unwrap()
    }

    fn exercise(store: &mut dyn RecordStore) {
        let a = record("Empresa A");
        let b = record("Empresa B");
        store.put(&a).unwrap();
        store.put(&b).unwrap();

        assert_eq!(store.get(&a.id).unwrap(), Some(a.clone()));
        assert_eq!(store.get("IPERC-2026-000000").unwrap(), None);

        let listed = store.list(None).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].id < listed[1].id);
        assert_eq!(store.list(Some(1)).unwrap().len(), 1);

        let mut changed = a.clone();
        changed.company = "Empresa A2".to_string();
        store.put(&changed).unwrap();
        assert_eq!(store.get(&a.id).unwrap().unwrap().company, "Empresa A2");
        assert_eq!(store.list(None).unwrap().len(), 2);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        exercise(&mut store);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_sqlite_in_memory_round_trip() {
        let mut store = SqliteStore::in_memory().unwrap();
        exercise(&mut store);
        assert!(store.path().is_none());
    }

    #[test]
    fn test_sqlite_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("iperc.db");
        let r = record("Persistente SAC");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.put(&r).unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(&r.id).unwrap(), Some(r));
    }

    #[test]
    fn test_sqlite_corrupt_body_is_an_error() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO evaluations (id, body, updated_at) VALUES ('X', '{}', '')",
                [],
            )
            .unwrap();
        let err = store.get("X").unwrap_err();
        assert!(err.to_string().contains("corrupt stored record: X"));
    }

    #[test]
    fn test_open_store_by_kind() {
        let mut config = ResolvedConfig::defaults().unwrap();
        config.store = StoreKind::Memory;
        let store = open_store(&config).unwrap();
        assert!(store.list(None).unwrap().is_empty());

        let dir = tempfile::tempdir().unwrap();
        config.store = StoreKind::Sqlite;
        config.data_path = dir.path().join("iperc.db");
        let mut store = open_store(&config).unwrap();
        store.put(&record("Sqlite")).unwrap();
        assert!(config.data_path.exists());
    }
}
