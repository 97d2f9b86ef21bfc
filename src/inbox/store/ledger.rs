// SPDX-License-Identifier: MIT

//! Run ledger: durable record of each run's lifecycle
//!
//! A record starts `running` and moves exactly once to `completed` or
//! `failed`. Repeating the same terminal update is a no-op; any other
//! update after the terminal one is rejected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::adk::error::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: Uuid,
    /// External correlation key, the resumption key when run through the engine
    pub thread_id: Option<String>,
    pub task: Option<String>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<Value>,
}

impl RunRecord {
    pub fn start(thread_id: Option<&str>, task: Option<&str>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            thread_id: thread_id.map(str::to_string),
            task: task.map(str::to_string),
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            result: None,
        }
    }
}

/// What a status update does to an existing record
#[derive(Debug, PartialEq)]
pub(crate) enum Transition {
    Apply,
    NoOp,
}

/// Decide whether `record` may move to `status` with `result`
pub(crate) fn check_transition(
    record: &RunRecord,
    status: RunStatus,
    result: Option<&Value>,
) -> Result<Transition, LedgerError> {
    let invalid = || LedgerError::InvalidTransition {
        run_id: record.run_id,
        from: record.status.to_string(),
        to: status.to_string(),
    };

    if !status.is_terminal() {
        return Err(invalid());
    }
    if record.status == RunStatus::Running {
        return Ok(Transition::Apply);
    }
    if record.status == status && record.result.as_ref() == result {
        return Ok(Transition::NoOp);
    }
    Err(invalid())
}

/// Persistence for run records
#[async_trait]
pub trait RunLedger: Send + Sync {
    /// Create a `running` record and return its fresh id
    async fn create(&self, thread_id: Option<&str>, task: Option<&str>)
        -> Result<Uuid, LedgerError>;

    /// Record the task selected for a run
    async fn set_task(&self, run_id: Uuid, task: &str) -> Result<(), LedgerError>;

    /// Move a run to a terminal status, stamping `finished_at`
    async fn update_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        result: Option<&Value>,
    ) -> Result<(), LedgerError>;

    async fn get(&self, run_id: Uuid) -> Result<Option<RunRecord>, LedgerError>;

    /// Most recently started runs first
    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>, LedgerError>;
}

/// In-memory run ledger
#[derive(Clone, Default)]
pub struct MemoryRunLedger {
    records: Arc<RwLock<HashMap<Uuid, RunRecord>>>,
}

impl MemoryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunLedger for MemoryRunLedger {
    async fn create(
        &self,
        thread_id: Option<&str>,
        task: Option<&str>,
    ) -> Result<Uuid, LedgerError> {
        let record = RunRecord::start(thread_id, task);
        let run_id = record.run_id;
        self.records.write().await.insert(run_id, record);
        Ok(run_id)
    }

    async fn set_task(&self, run_id: Uuid, task: &str) -> Result<(), LedgerError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&run_id)
            .ok_or(LedgerError::NotFound(run_id))?;
        record.task = Some(task.to_string());
        Ok(())
    }

    async fn update_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        result: Option<&Value>,
    ) -> Result<(), LedgerError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(&run_id)
            .ok_or(LedgerError::NotFound(run_id))?;

        if check_transition(record, status, result)? == Transition::Apply {
            record.status = status;
            record.finished_at = Some(Utc::now());
            record.result = result.cloned();
        }
        Ok(())
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunRecord>, LedgerError> {
        Ok(self.records.read().await.get(&run_id).cloned())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>, LedgerError> {
        let mut records: Vec<RunRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        records.truncate(limit);
        Ok(records)
    }
}
