//! SQLite-backed session store.
//!
//! Every `save` rewrites the `sessions` table inside one transaction, keeping
//! the log order in the `position` column. The log is capped at a few
//! hundred rows, so a full rewrite stays cheap.

use std::path::Path;

use chrono::DateTime;
use rusqlite::{params, Connection};
use tracing::debug;

use super::{data_dir, SessionStore};
use crate::error::StoreError;
use crate::session::{SessionKind, SessionRecord};

const SCHEMA_VERSION: i32 = 1;

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at `<data dir>/coherence.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(dir.join("coherence.db"))
    }

    /// Open the store at an explicit path.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );",
        )?;
        let current: i32 = self
            .conn
            .query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
                row.get(0)
            })?;

        if current < 1 {
            self.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS sessions (
                    position      INTEGER PRIMARY KEY,
                    id            TEXT NOT NULL UNIQUE,
                    started_at_ms INTEGER NOT NULL,
                    duration_ms   INTEGER NOT NULL,
                    completed     INTEGER NOT NULL,
                    breath_count  INTEGER NOT NULL,
                    accuracy_pct  INTEGER NOT NULL,
                    average_rpm   INTEGER NOT NULL,
                    kind          TEXT NOT NULL DEFAULT 'standard'
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_started_at ON sessions(started_at_ms);",
            )?;
        }

        if current < SCHEMA_VERSION {
            self.conn.execute("DELETE FROM schema_version", [])?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            debug!(from = current, to = SCHEMA_VERSION, "migrated session store");
        }
        Ok(())
    }
}

impl SessionStore for SqliteStore {
    fn load(&self) -> Result<Vec<SessionRecord>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at_ms, duration_ms, completed, breath_count,
                    accuracy_pct, average_rpm, kind
             FROM sessions
             ORDER BY position",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (id, started_at_ms, duration_ms, completed, breath_count, accuracy_pct, average_rpm, kind) =
                row?;
            let started_at = DateTime::from_timestamp_millis(started_at_ms).ok_or_else(|| {
                StoreError::Corrupt {
                    id: id.clone(),
                    message: format!("timestamp out of range: {started_at_ms}"),
                }
            })?;
            let kind = kind
                .parse::<SessionKind>()
                .map_err(|message| StoreError::Corrupt {
                    id: id.clone(),
                    message,
                })?;
            records.push(SessionRecord {
                id,
                started_at,
                duration_ms,
                completed,
                breath_count,
                accuracy_pct,
                average_rpm,
                kind,
            });
        }
        Ok(records)
    }

    fn save(&mut self, records: &[SessionRecord]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM sessions", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO sessions (position, id, started_at_ms, duration_ms, completed,
                                       breath_count, accuracy_pct, average_rpm, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for (position, record) in records.iter().enumerate() {
                stmt.execute(params![
                    position as i64,
                    record.id,
                    record.started_at.timestamp_millis(),
                    record.duration_ms,
                    record.completed,
                    record.breath_count,
                    record.accuracy_pct,
                    record.average_rpm,
                    record.kind.as_str(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}
