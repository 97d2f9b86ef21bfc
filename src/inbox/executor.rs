// SPDX-License-Identifier: MIT

//! Task-executor capability consumed by branch nodes
//!
//! The engine treats an executor as one atomic call: an instruction goes in,
//! a single structured result or a single failure comes out.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::adk::agent::Agent;
use crate::adk::error::ExecutorError;

#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn invoke(&self, instruction: &str) -> Result<Value, ExecutorError>;
}

/// Runs an [`Agent`] and wraps its final answer as
/// `{ "agent": <name>, "output": <text> }`
pub struct AgentExecutor {
    agent: Arc<dyn Agent>,
}

impl AgentExecutor {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl TaskExecutor for AgentExecutor {
    async fn invoke(&self, instruction: &str) -> Result<Value, ExecutorError> {
        let name = self.agent.name().to_string();
        log::info!("Invoking agent {}", name);
        match self.agent.run(instruction.to_string()).await {
            Ok(output) => Ok(json!({ "agent": name, "output": output })),
            Err(e) => Err(ExecutorError::Agent {
                agent: name,
                message: e.to_string(),
            }),
        }
    }
}

/// Treat a result carrying a top-level `error` field as a failure
pub fn reject_error_payload(value: Value) -> Result<Value, ExecutorError> {
    match value.get("error") {
        Some(Value::String(message)) => Err(ExecutorError::ErrorPayload(message.clone())),
        Some(other) if !other.is_null() => Err(ExecutorError::ErrorPayload(other.to_string())),
        _ => Ok(value),
    }
}
