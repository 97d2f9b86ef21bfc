// SPDX-License-Identifier: MIT

//! Checkpoint storage keyed by resumption key
//!
//! A checkpoint is the shared state as it stood after a node completed,
//! plus the name of that node. Stores keep only the latest checkpoint per
//! key (last write wins) and never expose one key's data under another.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::adk::error::CheckpointError;
use crate::inbox::workflow::state::SharedState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Node whose output `state` reflects
    pub completed_node: String,
    /// Number of nodes executed in this run so far
    pub step: u32,
    pub state: SharedState,
    pub saved_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(completed_node: impl Into<String>, step: u32, state: SharedState) -> Self {
        Self {
            completed_node: completed_node.into(),
            step,
            state,
            saved_at: Utc::now(),
        }
    }
}

/// Key-value persistence for checkpoints
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Store `checkpoint` as the latest for `key`. Either the whole
    /// checkpoint is written or the previous one stays in place.
    async fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError>;

    async fn load(&self, key: &str) -> Result<Option<Checkpoint>, CheckpointError>;

    /// Remove the checkpoint for `key`. Returns whether one existed.
    async fn delete(&self, key: &str) -> Result<bool, CheckpointError>;
}

/// In-memory checkpoint store
///
/// Checkpoints are kept serialized so a load always yields a fresh value
/// and never aliases state handed to another run.
#[derive(Clone, Default)]
pub struct MemoryCheckpointStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        // Serialize before taking the lock so a failure leaves the entry as it was
        let encoded = serde_json::to_string(checkpoint)?;
        self.entries.write().await.insert(key.to_string(), encoded);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .map(|encoded| serde_json::from_str(encoded).map_err(CheckpointError::from))
            .transpose()
    }

    async fn delete(&self, key: &str) -> Result<bool, CheckpointError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
