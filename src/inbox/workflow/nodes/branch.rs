// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::adk::BoxError;
use crate::inbox::executor::{reject_error_payload, TaskExecutor};
use crate::inbox::store::{RunLedger, RunStatus};
use crate::inbox::workflow::node::{Node, RunContext};
use crate::inbox::workflow::state::{SharedState, StatePatch, TaskKind};

/// Instruction sent to the executor for `kind`
pub fn instruction_for(kind: TaskKind, raw_input: &str) -> String {
    let job = match kind {
        TaskKind::ProcessInbox => {
            "Process the Gmail inbox. Fetch unread emails, classify them, ignore spam, \
             apply appropriate labels (e.g., Client, Billing, Personal, Spam), and generate \
             professional replies where needed."
        }
        TaskKind::DailySummary => {
            "Create a concise daily summary of important emails. Highlight key threads, \
             mention the sender and subject briefly, and assign a rough priority \
             (High / Medium / Low) where appropriate."
        }
    };
    format!(
        "Task: {}\n\nYour job: {}\n\nUser instruction: {}",
        kind, job, raw_input
    )
}

/// Runs the executor for one task kind and closes the run record
///
/// Executor failures become an error result and a `failed` run; ledger
/// failures are logged and never fail the node.
pub struct BranchNode {
    kind: TaskKind,
    executor: Arc<dyn TaskExecutor>,
    ledger: Arc<dyn RunLedger>,
}

impl BranchNode {
    pub fn new(
        kind: TaskKind,
        executor: Arc<dyn TaskExecutor>,
        ledger: Arc<dyn RunLedger>,
    ) -> Self {
        Self {
            kind,
            executor,
            ledger,
        }
    }
}

#[async_trait]
impl Node for BranchNode {
    async fn execute(
        &self,
        state: &SharedState,
        _ctx: &RunContext,
    ) -> Result<StatePatch, BoxError> {
        if state.result.is_some() {
            log::warn!("{} skipped, result already set", self.kind);
            return Ok(StatePatch::new().log(format!(
                "{}: result already set, executor not invoked",
                self.kind
            )));
        }

        let raw_input = state.raw_input.as_deref().unwrap_or_default();
        let instruction = instruction_for(self.kind, raw_input);
        log::debug!("{} instruction: {}", self.kind, instruction);

        let outcome = self
            .executor
            .invoke(&instruction)
            .await
            .and_then(reject_error_payload);

        let (result, status, mut patch): (Value, RunStatus, StatePatch) = match outcome {
            Ok(output) => {
                log::info!("{} completed", self.kind);
                (
                    output,
                    RunStatus::Completed,
                    StatePatch::new().log(format!("{}: completed", self.kind)),
                )
            }
            Err(e) => {
                log::error!("{} executor failed: {}", self.kind, e);
                (
                    json!({ "error": e.to_string(), "task": self.kind.as_str() }),
                    RunStatus::Failed,
                    StatePatch::new().log(format!("{}: executor failed: {}", self.kind, e)),
                )
            }
        };

        match state.run_id {
            Some(run_id) => {
                if let Err(e) = self.ledger.update_status(run_id, status, Some(&result)).await {
                    log::warn!("Failed to mark run {} {}: {}", run_id, status, e);
                    patch.push_log(format!(
                        "{}: failed to mark run {} {}: {}",
                        self.kind, run_id, status, e
                    ));
                }
            }
            None => patch.push_log(format!("{}: no run id, run record not updated", self.kind)),
        }

        Ok(patch.result(result))
    }
}
