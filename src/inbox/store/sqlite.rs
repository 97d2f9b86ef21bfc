// SPDX-License-Identifier: MIT

//! SQLite-backed checkpoint store and run ledger
//!
//! Timestamps are stored as RFC 3339 text, JSON payloads as text.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use super::checkpoint::{Checkpoint, CheckpointStore};
use super::db::Database;
use super::ledger::{check_transition, RunLedger, RunRecord, RunStatus, Transition};
use crate::adk::error::{CheckpointError, LedgerError};

fn parse_time(text: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", text, e))
}

pub struct SqliteCheckpointStore {
    db: Arc<Database>,
}

impl SqliteCheckpointStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        let state = serde_json::to_string(&checkpoint.state)?;
        // Single upsert statement: the row is replaced whole or not at all
        self.db.conn().execute(
            "INSERT INTO checkpoints (thread_id, completed_node, step, state, saved_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(thread_id) DO UPDATE SET
                completed_node = excluded.completed_node,
                step = excluded.step,
                state = excluded.state,
                saved_at = excluded.saved_at",
            params![
                key,
                checkpoint.completed_node,
                checkpoint.step,
                state,
                checkpoint.saved_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        let row: Option<(String, u32, String, String)> = self
            .db
            .conn()
            .query_row(
                "SELECT completed_node, step, state, saved_at FROM checkpoints WHERE thread_id = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        let Some((completed_node, step, state, saved_at)) = row else {
            return Ok(None);
        };

        Ok(Some(Checkpoint {
            completed_node,
            step,
            state: serde_json::from_str(&state)?,
            saved_at: parse_time(&saved_at).map_err(CheckpointError::Storage)?,
        }))
    }

    async fn delete(&self, key: &str) -> Result<bool, CheckpointError> {
        let removed = self
            .db
            .conn()
            .execute("DELETE FROM checkpoints WHERE thread_id = ?1", params![key])?;
        Ok(removed > 0)
    }
}

pub struct SqliteRunLedger {
    db: Arc<Database>,
}

const RUN_COLUMNS: &str = "run_id, thread_id, task, status, started_at, finished_at, result";

/// Raw column values of one `workflow_runs` row
struct RunRow {
    run_id: String,
    thread_id: Option<String>,
    task: Option<String>,
    status: String,
    started_at: String,
    finished_at: Option<String>,
    result: Option<String>,
}

impl RunRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            run_id: row.get(0)?,
            thread_id: row.get(1)?,
            task: row.get(2)?,
            status: row.get(3)?,
            started_at: row.get(4)?,
            finished_at: row.get(5)?,
            result: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<RunRecord, LedgerError> {
        let run_id = Uuid::parse_str(&self.run_id)
            .map_err(|e| LedgerError::Storage(format!("invalid run_id '{}': {}", self.run_id, e)))?;
        Ok(RunRecord {
            run_id,
            thread_id: self.thread_id,
            task: self.task,
            status: self.status.parse().map_err(LedgerError::Storage)?,
            started_at: parse_time(&self.started_at).map_err(LedgerError::Storage)?,
            finished_at: self
                .finished_at
                .as_deref()
                .map(parse_time)
                .transpose()
                .map_err(LedgerError::Storage)?,
            result: self
                .result
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?,
        })
    }
}

impl SqliteRunLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn fetch(conn: &rusqlite::Connection, run_id: Uuid) -> Result<Option<RunRecord>, LedgerError> {
        conn.query_row(
            &format!("SELECT {} FROM workflow_runs WHERE run_id = ?1", RUN_COLUMNS),
            params![run_id.to_string()],
            RunRow::from_row,
        )
        .optional()?
        .map(RunRow::into_record)
        .transpose()
    }
}

#[async_trait]
impl RunLedger for SqliteRunLedger {
    async fn create(
        &self,
        thread_id: Option<&str>,
        task: Option<&str>,
    ) -> Result<Uuid, LedgerError> {
        let record = RunRecord::start(thread_id, task);
        self.db.conn().execute(
            "INSERT INTO workflow_runs (run_id, thread_id, task, status, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.run_id.to_string(),
                record.thread_id,
                record.task,
                record.status.as_str(),
                record.started_at.to_rfc3339(),
            ],
        )?;
        Ok(record.run_id)
    }

    async fn set_task(&self, run_id: Uuid, task: &str) -> Result<(), LedgerError> {
        let updated = self.db.conn().execute(
            "UPDATE workflow_runs SET task = ?1 WHERE run_id = ?2",
            params![task, run_id.to_string()],
        )?;
        if updated == 0 {
            return Err(LedgerError::NotFound(run_id));
        }
        Ok(())
    }

    async fn update_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        result: Option<&Value>,
    ) -> Result<(), LedgerError> {
        let encoded = result.map(serde_json::to_string).transpose()?;
        let conn = self.db.conn();
        let record = Self::fetch(&conn, run_id)?.ok_or(LedgerError::NotFound(run_id))?;

        if check_transition(&record, status, result)? == Transition::NoOp {
            return Ok(());
        }
        // Guard on status so a concurrent writer cannot be overwritten
        let updated = conn.execute(
            "UPDATE workflow_runs SET status = ?1, finished_at = ?2, result = ?3
             WHERE run_id = ?4 AND status = 'running'",
            params![
                status.as_str(),
                Utc::now().to_rfc3339(),
                encoded,
                run_id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(LedgerError::InvalidTransition {
                run_id,
                from: record.status.to_string(),
                to: status.to_string(),
            });
        }
        Ok(())
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunRecord>, LedgerError> {
        Self::fetch(&self.db.conn(), run_id)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>, LedgerError> {
        let conn = self.db.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM workflow_runs ORDER BY started_at DESC LIMIT ?1",
            RUN_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![limit as i64], RunRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RunRow::into_record).collect()
    }
}
