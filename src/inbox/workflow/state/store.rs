// SPDX-License-Identifier: MIT

//! Runtime state for workflow execution
//!
//! Nodes never mutate a [`SharedState`] in place. They return a
//! [`StatePatch`] and the engine derives the next state with
//! [`SharedState::apply`], which enforces the write-once fields:
//!
//! | field       | rule                                                    |
//! |-------------|---------------------------------------------------------|
//! | `raw_input` | set while empty, immutable afterwards                   |
//! | `task`      | set once; re-setting the same value is a no-op          |
//! | `run_id`    | set once; re-setting the same value is a no-op          |
//! | `result`    | set at most once per run; a second write is rejected    |
//! | `log`       | append only                                             |
//! | `emails`    | opaque auxiliary payload, carried through untouched     |

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::schema::TaskKind;
use crate::adk::error::StateError;

/// The record passed between nodes and stored in checkpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    /// Caller's original instruction
    #[serde(default)]
    pub raw_input: Option<String>,
    #[serde(default)]
    pub task: Option<TaskKind>,
    /// Foreign key into the run ledger
    #[serde(default)]
    pub run_id: Option<Uuid>,
    /// Output of whichever branch executed
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub result: Option<Value>,
    /// Ordered trace of steps and notable events
    #[serde(default)]
    pub log: Vec<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "present"
    )]
    pub emails: Option<Value>,
}

/// Keeps an explicit JSON `null` as `Some(Value::Null)` so a stored state
/// loads back equal to what was saved.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl SharedState {
    pub fn new(raw_input: impl Into<String>) -> Self {
        Self {
            raw_input: Some(raw_input.into()),
            ..Default::default()
        }
    }

    /// `raw_input` if present and not blank
    pub fn instruction(&self) -> Option<&str> {
        self.raw_input
            .as_deref()
            .filter(|input| !input.trim().is_empty())
    }

    /// Fields a fresh run may not start with: `task` comes from
    /// classification and `result` from a branch.
    pub fn check_fresh(&self) -> Result<(), StateError> {
        if let Some(task) = self.task {
            return Err(StateError::PresetTask(task.to_string()));
        }
        if self.result.is_some() {
            return Err(StateError::PresetResult);
        }
        Ok(())
    }

    /// Derive the next state from this one. `self` is left untouched, and on
    /// error nothing from the patch is applied.
    pub fn apply(&self, patch: StatePatch) -> Result<SharedState, StateError> {
        if let Some(input) = &patch.raw_input {
            if let Some(current) = self.instruction() {
                if current != input {
                    return Err(StateError::RawInputImmutable);
                }
            }
        }
        if let (Some(current), Some(next)) = (self.task, patch.task) {
            if current != next {
                return Err(StateError::TaskAlreadySet(current.to_string()));
            }
        }
        if let (Some(current), Some(next)) = (self.run_id, patch.run_id) {
            if current != next {
                return Err(StateError::RunIdAlreadySet(current));
            }
        }
        if self.result.is_some() && patch.result.is_some() {
            return Err(StateError::ResultAlreadySet);
        }

        let mut next = self.clone();
        if patch.raw_input.is_some() {
            next.raw_input = patch.raw_input;
        }
        next.task = next.task.or(patch.task);
        next.run_id = next.run_id.or(patch.run_id);
        if patch.result.is_some() {
            next.result = patch.result;
        }
        next.log.extend(patch.log);
        Ok(next)
    }
}

/// Changes a node wants made to the shared state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub raw_input: Option<String>,
    pub task: Option<TaskKind>,
    pub run_id: Option<Uuid>,
    pub result: Option<Value>,
    pub log: Vec<String>,
}

impl StatePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw_input(mut self, input: impl Into<String>) -> Self {
        self.raw_input = Some(input.into());
        self
    }

    pub fn task(mut self, task: TaskKind) -> Self {
        self.task = Some(task);
        self
    }

    pub fn run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = Some(run_id);
        self
    }

    pub fn result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn log(mut self, line: impl Into<String>) -> Self {
        self.log.push(line.into());
        self
    }

    /// Append a log line through a mutable reference
    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
    }
}
