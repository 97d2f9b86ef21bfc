// SPDX-License-Identifier: MIT

//! Conditional routing
//!
//! A router maps the shared state to a label; the graph maps labels to
//! node names. Routers must be pure and must not fail.

use super::state::{SharedState, TaskKind};

pub trait Router: Send + Sync {
    /// Label of the branch to take next
    fn route(&self, state: &SharedState) -> String;

    /// Every label `route` can return, checked against the target map when
    /// the graph is compiled
    fn labels(&self) -> Vec<String>;
}

/// Routes on `state.task` alone. An unset task takes the fallback branch.
#[derive(Debug, Clone, Copy)]
pub struct TaskRouter {
    fallback: TaskKind,
}

impl TaskRouter {
    pub fn new(fallback: TaskKind) -> Self {
        Self { fallback }
    }
}

impl Default for TaskRouter {
    fn default() -> Self {
        Self::new(TaskKind::ProcessInbox)
    }
}

impl Router for TaskRouter {
    fn route(&self, state: &SharedState) -> String {
        state.task.unwrap_or(self.fallback).as_str().to_string()
    }

    fn labels(&self) -> Vec<String> {
        TaskKind::ALL.iter().map(|k| k.as_str().to_string()).collect()
    }
}
