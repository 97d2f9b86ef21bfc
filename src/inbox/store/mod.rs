// SPDX-License-Identifier: MIT

//! Persistence: checkpoint store and run ledger
//!
//! Both come in an in-memory and a SQLite flavor behind the same trait. The
//! backend is picked once at startup; the engine never branches on it.

mod checkpoint;
mod db;
mod ledger;
mod sqlite;

pub use checkpoint::{Checkpoint, CheckpointStore, MemoryCheckpointStore};
pub use db::Database;
pub use ledger::{MemoryRunLedger, RunLedger, RunRecord, RunStatus};
pub use sqlite::{SqliteCheckpointStore, SqliteRunLedger};

use std::sync::Arc;

use crate::inbox::config::{CheckpointBackend, StorageConfig};

/// The pair of stores a workflow app runs against
#[derive(Clone)]
pub struct Stores {
    pub checkpoints: Arc<dyn CheckpointStore>,
    pub ledger: Arc<dyn RunLedger>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            checkpoints: Arc::new(MemoryCheckpointStore::new()),
            ledger: Arc::new(MemoryRunLedger::new()),
        }
    }

    pub fn sqlite(db: Arc<Database>) -> Self {
        Self {
            checkpoints: Arc::new(SqliteCheckpointStore::new(db.clone())),
            ledger: Arc::new(SqliteRunLedger::new(db)),
        }
    }

    /// Open the configured backend. If the database cannot be opened the
    /// in-memory stores are used instead and the run is not durable.
    pub fn from_config(config: &StorageConfig) -> Self {
        match config.checkpoint_backend {
            CheckpointBackend::Memory => {
                log::info!("Using in-memory checkpoint store and run ledger");
                Self::in_memory()
            }
            CheckpointBackend::Sqlite => match Database::open(&config.database_path) {
                Ok(db) => Self::sqlite(Arc::new(db)),
                Err(e) => {
                    log::warn!(
                        "Failed to open database {}: {}. Falling back to in-memory stores",
                        config.database_path.display(),
                        e
                    );
                    Self::in_memory()
                }
            },
        }
    }
}
