// SPDX-License-Identifier: MIT

//! Compiled graph execution
//!
//! A run executes one node at a time. After each node the resulting state is
//! checkpointed under the resumption key together with the node's name, so
//! a later invocation with the same key continues at that node's successor.

use std::collections::HashMap;
use std::sync::Arc;

use super::types::{Edge, InvokeConfig, END};
use crate::adk::error::{CheckpointError, GraphError};
use crate::inbox::store::{Checkpoint, CheckpointStore};
use crate::inbox::workflow::node::{Node, RunContext};
use crate::inbox::workflow::state::{SharedState, StatePatch};

pub struct CompiledGraph {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: String,
    checkpoints: Arc<dyn CheckpointStore>,
    step_limit: u32,
}

impl CompiledGraph {
    pub(super) fn new(
        nodes: HashMap<String, Arc<dyn Node>>,
        edges: HashMap<String, Edge>,
        entry: String,
        checkpoints: Arc<dyn CheckpointStore>,
        step_limit: u32,
    ) -> Self {
        Self {
            nodes,
            edges,
            entry,
            checkpoints,
            step_limit,
        }
    }

    /// Cap the number of nodes a single invocation may execute
    pub fn with_step_limit(mut self, step_limit: u32) -> Self {
        self.step_limit = step_limit.max(1);
        self
    }

    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    /// Latest checkpoint stored for `thread_id`
    pub async fn get_state(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        self.checkpoints.load(thread_id).await
    }

    /// Node that follows `node` given `state`, or [`END`]
    fn successor(&self, node: &str, state: &SharedState) -> Result<String, GraphError> {
        let edge = self
            .edges
            .get(node)
            .ok_or_else(|| GraphError::UnknownNode(node.to_string()))?;

        match edge {
            Edge::Direct(target) => Ok(target.clone()),
            Edge::Conditional { router, targets } => {
                let label = router.route(state);
                log::debug!("Router on '{}' chose '{}'", node, label);
                targets
                    .get(&label)
                    .cloned()
                    .ok_or_else(|| GraphError::UnknownRoute {
                        node: node.to_string(),
                        label,
                    })
            }
        }
    }

    /// Run the graph for `config.thread_id`
    ///
    /// If a checkpoint exists for the key, `initial` is ignored and the run
    /// continues after the checkpointed node. Otherwise `initial` must not
    /// carry a `task` or a `result`. A thread whose last checkpoint
    /// leads to [`END`] returns its stored state without executing anything.
    pub async fn invoke(
        &self,
        initial: SharedState,
        config: &InvokeConfig,
    ) -> Result<SharedState, GraphError> {
        let key = config.thread_id.as_str();
        let ctx = RunContext::new(key);

        let (mut state, mut current, mut step) = match self.checkpoints.load(key).await {
            Ok(Some(checkpoint)) => {
                let next = self.successor(&checkpoint.completed_node, &checkpoint.state)?;
                if next == END {
                    log::info!("Thread '{}' already finished, returning stored state", key);
                    return Ok(checkpoint.state);
                }
                log::info!(
                    "Resuming thread '{}' after '{}' at '{}'",
                    key,
                    checkpoint.completed_node,
                    next
                );
                (checkpoint.state, next, checkpoint.step)
            }
            Ok(None) => {
                initial.check_fresh().map_err(GraphError::InvalidInitialState)?;
                (initial, self.entry.clone(), 0)
            }
            Err(e) => {
                initial.check_fresh().map_err(GraphError::InvalidInitialState)?;
                log::warn!("Failed to load checkpoint for '{}': {}", key, e);
                let note = format!("checkpoint: failed to load, starting fresh: {}", e);
                let state = append_log(initial, note, &self.entry)?;
                (state, self.entry.clone(), 0)
            }
        };

        let mut executed: u32 = 0;
        while current != END {
            if executed >= self.step_limit {
                log::error!("Thread '{}' exceeded {} steps", key, self.step_limit);
                return Err(GraphError::StepLimitExceeded(self.step_limit));
            }
            let node = self
                .nodes
                .get(&current)
                .ok_or_else(|| GraphError::UnknownNode(current.clone()))?;

            log::info!("Executing node: {}", current);
            let patch = node
                .execute(&state, &ctx)
                .await
                .map_err(|e| GraphError::node_failed(&current, e.to_string()))?;
            state = state
                .apply(patch)
                .map_err(|source| GraphError::StateViolation {
                    node: current.clone(),
                    source,
                })?;
            executed += 1;
            step += 1;

            let checkpoint = Checkpoint::new(current.as_str(), step, state.clone());
            match self.checkpoints.save(key, &checkpoint).await {
                Ok(()) => log::debug!("Checkpoint saved for '{}' after '{}'", key, current),
                Err(e) => {
                    log::warn!(
                        "Failed to save checkpoint for '{}' after '{}': {}",
                        key,
                        current,
                        e
                    );
                    let note = format!("checkpoint: failed to save after {}: {}", current, e);
                    state = append_log(state, note, &current)?;
                }
            }

            current = self.successor(&current, &state)?;
            log::info!("Node {} completed, next: {}", checkpoint.completed_node, current);
        }

        Ok(state)
    }
}

fn append_log(state: SharedState, line: String, node: &str) -> Result<SharedState, GraphError> {
    state
        .apply(StatePatch::new().log(line))
        .map_err(|source| GraphError::StateViolation {
            node: node.to_string(),
            source,
        })
}
