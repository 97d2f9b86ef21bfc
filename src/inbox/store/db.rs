// SPDX-License-Identifier: MIT

//! SQLite database handle shared by the durable checkpoint store and run
//! ledger.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

/// `rusqlite::Connection` is `!Sync`, so access is serialized behind a
/// `Mutex`. Every store operation is a single short statement or a
/// read-then-write under one guard.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a database file and run migrations
    pub fn open(path: impl AsRef<Path>) -> Result<Self, rusqlite::Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory {}: {}", parent.display(), e)),
                )
            })?;
        }

        let db = Self {
            conn: Mutex::new(Connection::open(path)?),
        };
        db.run_migrations()?;
        log::info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, rusqlite::Error> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Lock the connection. A panic while holding the lock cannot leave a
    /// half-applied statement behind, so a poisoned lock is recovered.
    pub fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn run_migrations(&self) -> Result<(), rusqlite::Error> {
        self.conn().execute_batch(
            "CREATE TABLE IF NOT EXISTS workflow_runs (
                run_id TEXT PRIMARY KEY,
                thread_id TEXT,
                task TEXT,
                status TEXT NOT NULL DEFAULT 'running',
                started_at TEXT NOT NULL,
                finished_at TEXT,
                result TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_workflow_runs_started ON workflow_runs(started_at);

            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT PRIMARY KEY,
                completed_node TEXT NOT NULL,
                step INTEGER NOT NULL,
                state TEXT NOT NULL,
                saved_at TEXT NOT NULL
            );",
        )
    }
}
