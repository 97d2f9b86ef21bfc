// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::sync::Arc;

use crate::adk::BoxError;
use crate::inbox::store::RunLedger;
use crate::inbox::workflow::node::{Node, RunContext};
use crate::inbox::workflow::state::{SharedState, StatePatch, TaskKind};

/// Keyword classifier over the instruction text
///
/// Groups are checked in order and the first group with a keyword occurring
/// anywhere in the text (case-insensitive) wins.
#[derive(Debug, Clone)]
pub struct Classifier {
    groups: Vec<(TaskKind, Vec<String>)>,
    fallback: TaskKind,
}

impl Classifier {
    pub fn new(fallback: TaskKind) -> Self {
        Self {
            groups: Vec::new(),
            fallback,
        }
    }

    pub fn with_group<I, S>(mut self, kind: TaskKind, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        self.groups.push((kind, keywords));
        self
    }

    pub fn classify(&self, text: &str) -> TaskKind {
        let text = text.to_lowercase();
        self.groups
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(kind, _)| *kind)
            .unwrap_or(self.fallback)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(TaskKind::ProcessInbox).with_group(TaskKind::DailySummary, ["summary", "daily"])
    }
}

/// Picks the task for the run and records it on the run record
pub struct ClassifyNode {
    classifier: Classifier,
    ledger: Arc<dyn RunLedger>,
}

impl ClassifyNode {
    pub fn new(classifier: Classifier, ledger: Arc<dyn RunLedger>) -> Self {
        Self { classifier, ledger }
    }
}

#[async_trait]
impl Node for ClassifyNode {
    async fn execute(
        &self,
        state: &SharedState,
        _ctx: &RunContext,
    ) -> Result<StatePatch, BoxError> {
        let task = self
            .classifier
            .classify(state.raw_input.as_deref().unwrap_or_default());
        log::info!("Classified run as {}", task);

        let mut patch = StatePatch::new()
            .task(task)
            .log(format!("classify: task={}", task));

        if let Some(run_id) = state.run_id {
            if let Err(e) = self.ledger.set_task(run_id, task.as_str()).await {
                log::warn!("Failed to record task on run {}: {}", run_id, e);
                patch.push_log(format!("classify: failed to record task on run {}: {}", run_id, e));
            }
        }
        Ok(patch)
    }
}
