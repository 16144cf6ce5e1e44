//! SQLite persistence for subjects and alert records.
//!
//! Single connection behind a mutex; blocking rusqlite work runs on the
//! blocking pool. Alert records are append-only: this pipeline never
//! updates or deletes them.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a subject named '{0}' already exists")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("could not create database directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("blocking task failed: {0}")]
    Runtime(String),
}

/// One row of the alerts listing: subject name, score, and the alert
/// creation time rendered as `YYYY-MM-DDTHH:MM:SSZ`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRow {
    pub record_id: String,
    pub stress_score: f64,
    pub timestamp: String,
}

/// Store handle shared across requests.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl Store {
    /// Open or create the database at `path` and initialize the schema.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        info!("Opening database at: {}", path.display());

        let db_path = path.clone();
        let conn = tokio::task::spawn_blocking(move || -> Result<Connection, StoreError> {
            let conn = Connection::open(&db_path)?;

            // WAL for concurrent readers; NORMAL is durable enough under WAL.
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
            conn.pragma_update(None, "foreign_keys", "ON")?;

            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS subjects (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL UNIQUE,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS alerts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    subject_id TEXT NOT NULL REFERENCES subjects(id),
                    is_stressed INTEGER NOT NULL,
                    stress_score REAL NOT NULL,
                    analysis TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts(created_at);
                "#,
            )?;

            Ok(conn)
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a subject under a unique name and return its generated id.
    ///
    /// The insert commits immediately in its own transaction; a UNIQUE
    /// violation on the name maps to [`StoreError::Conflict`]. Concurrent
    /// registrations of the same name serialize on this constraint.
    pub async fn insert_subject(&self, name: &str) -> Result<Uuid, StoreError> {
        let conn = Arc::clone(&self.conn);
        let name = name.to_string();

        tokio::task::spawn_blocking(move || -> Result<Uuid, StoreError> {
            let conn = conn.blocking_lock();
            let id = Uuid::new_v4();

            let result = conn.execute(
                "INSERT INTO subjects (id, name, created_at) VALUES (?1, ?2, ?3)",
                params![id.to_string(), name, Utc::now()],
            );

            match result {
                Ok(_) => {
                    debug!(subject_id = %id, "Inserted subject");
                    Ok(id)
                }
                Err(rusqlite::Error::SqliteFailure(e, Some(msg)))
                    if e.code == rusqlite::ErrorCode::ConstraintViolation
                        && msg.contains("UNIQUE") =>
                {
                    Err(StoreError::Conflict(name))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))?
    }

    /// Look up a subject id by name.
    pub async fn find_subject(&self, name: &str) -> Result<Option<Uuid>, StoreError> {
        let conn = Arc::clone(&self.conn);
        let name = name.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<Uuid>, StoreError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare("SELECT id FROM subjects WHERE name = ?1")?;

            let mut rows = stmt.query(params![name])?;
            match rows.next()? {
                Some(row) => {
                    let id: String = row.get(0)?;
                    Ok(Uuid::parse_str(&id).ok())
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))?
    }

    /// Append an alert record. Single atomic write.
    pub async fn insert_alert(
        &self,
        subject_id: Uuid,
        is_stressed: bool,
        stress_score: f64,
        analysis: &str,
    ) -> Result<(), StoreError> {
        let conn = Arc::clone(&self.conn);
        let analysis = analysis.to_string();

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO alerts (subject_id, is_stressed, stress_score, analysis, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    subject_id.to_string(),
                    is_stressed,
                    stress_score,
                    analysis,
                    Utc::now()
                ],
            )?;
            debug!(subject_id = %subject_id, stress_score, "Inserted alert record");
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))?
    }

    /// List alerted subjects, most recent first.
    pub async fn list_alerts(&self) -> Result<Vec<AlertRow>, StoreError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || -> Result<Vec<AlertRow>, StoreError> {
            let conn = conn.blocking_lock();
            let mut stmt = conn.prepare(
                "SELECT s.name, a.stress_score, a.created_at
                 FROM alerts a
                 JOIN subjects s ON a.subject_id = s.id
                 WHERE a.is_stressed = 1
                 ORDER BY a.created_at DESC, a.id DESC",
            )?;

            let rows = stmt.query_map([], |row| {
                let created_at: DateTime<Utc> = row.get(2)?;
                Ok(AlertRow {
                    record_id: row.get(0)?,
                    stress_score: row.get(1)?,
                    timestamp: created_at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                })
            })?;

            let mut alerts = Vec::new();
            for row in rows {
                alerts.push(row?);
            }
            Ok(alerts)
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))?
    }

    /// Number of alert rows on file (test and diagnostics helper).
    pub async fn alert_count(&self) -> Result<u64, StoreError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || -> Result<u64, StoreError> {
            let conn = conn.blocking_lock();
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
        .map_err(|e| StoreError::Runtime(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn scratch_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("test.db")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_insert_and_find_subject() {
        let (_dir, store) = scratch_store().await;

        let id = store.insert_subject("student-42").await.unwrap();
        let found = store.find_subject("student-42").await.unwrap();
        assert_eq!(found, Some(id));

        let missing = store.find_subject("nobody").await.unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_duplicate_subject_name_conflicts() {
        let (_dir, store) = scratch_store().await;

        store.insert_subject("student-42").await.unwrap();
        let result = store.insert_subject("student-42").await;

        match result {
            Err(StoreError::Conflict(name)) => assert_eq!(name, "student-42"),
            other => panic!("expected Conflict, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_alert_listing_is_newest_first() {
        let (_dir, store) = scratch_store().await;

        let a = store.insert_subject("subject-a").await.unwrap();
        let b = store.insert_subject("subject-b").await.unwrap();

        store.insert_alert(a, true, 71.0, "first").await.unwrap();
        store.insert_alert(b, true, 88.0, "second").await.unwrap();

        let alerts = store.list_alerts().await.unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].record_id, "subject-b");
        assert_eq!(alerts[1].record_id, "subject-a");
    }

    #[tokio::test]
    async fn test_alert_timestamp_rendering() {
        let (_dir, store) = scratch_store().await;

        let id = store.insert_subject("subject-a").await.unwrap();
        store.insert_alert(id, true, 71.0, "analysis").await.unwrap();

        let alerts = store.list_alerts().await.unwrap();
        let ts = &alerts[0].timestamp;

        // YYYY-MM-DDTHH:MM:SSZ, no subseconds
        assert_eq!(ts.len(), 20);
        assert!(ts.ends_with('Z'));
        assert_eq!(&ts[10..11], "T");
    }

    #[tokio::test]
    async fn test_unstressed_rows_are_not_listed() {
        let (_dir, store) = scratch_store().await;

        let id = store.insert_subject("subject-a").await.unwrap();
        store.insert_alert(id, false, 12.0, "calm").await.unwrap();

        let alerts = store.list_alerts().await.unwrap();
        assert!(alerts.is_empty());
        assert_eq!(store.alert_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");

        {
            let store = Store::open(&path).await.unwrap();
            store.insert_subject("persistent").await.unwrap();
        }

        let store = Store::open(&path).await.unwrap();
        assert!(store.find_subject("persistent").await.unwrap().is_some());
    }
}
