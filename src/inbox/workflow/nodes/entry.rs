// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::adk::BoxError;
use crate::inbox::store::RunLedger;
use crate::inbox::workflow::node::{Node, RunContext};
use crate::inbox::workflow::state::{SharedState, StatePatch};

/// Starts a run: fills in a default instruction and opens a run record
pub struct EntryNode {
    ledger: Arc<dyn RunLedger>,
    default_instruction: String,
}

impl EntryNode {
    pub fn new(ledger: Arc<dyn RunLedger>, default_instruction: impl Into<String>) -> Self {
        Self {
            ledger,
            default_instruction: default_instruction.into(),
        }
    }
}

#[async_trait]
impl Node for EntryNode {
    async fn execute(&self, state: &SharedState, ctx: &RunContext) -> Result<StatePatch, BoxError> {
        let mut patch = StatePatch::new();
        let mut notes = Vec::new();

        if state.instruction().is_none() {
            patch = patch.raw_input(self.default_instruction.clone());
            notes.push(format!(
                "entry: no instruction given, using default '{}'",
                self.default_instruction
            ));
        }

        let run_id = match state.run_id {
            Some(run_id) => run_id,
            None => match self.ledger.create(Some(ctx.thread_id.as_str()), None).await {
                Ok(run_id) => {
                    log::info!("Created run {} for thread {}", run_id, ctx.thread_id);
                    run_id
                }
                Err(e) => {
                    let run_id = Uuid::new_v4();
                    log::warn!("Run ledger unavailable, run {} is unrecorded: {}", run_id, e);
                    notes.push(format!(
                        "entry: run ledger unavailable, run {} is unrecorded: {}",
                        run_id, e
                    ));
                    run_id
                }
            },
        };

        patch = patch.run_id(run_id).log(format!("entry: run {}", run_id));
        for note in notes {
            patch.push_log(note);
        }
        Ok(patch)
    }
}
