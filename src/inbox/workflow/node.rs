// SPDX-License-Identifier: MIT

//! Node contract
//!
//! A node reads the current state and returns the changes it wants made.
//! Recoverable failures (executor errors, ledger hiccups) are recorded in
//! the returned patch; an `Err` is reserved for faults the engine should
//! surface to the caller.

use async_trait::async_trait;

use super::state::{SharedState, StatePatch};
use crate::adk::BoxError;

/// Per-invocation data handed to every node
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Resumption key of the current run
    pub thread_id: String,
}

impl RunContext {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }
}

#[async_trait]
pub trait Node: Send + Sync {
    async fn execute(&self, state: &SharedState, ctx: &RunContext) -> Result<StatePatch, BoxError>;
}
