// SPDX-License-Identifier: MIT

//! Agent module - the agent abstraction branch nodes delegate to
//!
//! `LLMAgent` is the only implementation: a tool-calling loop over a
//! [`Model`](crate::adk::model::Model).

mod llm;

pub use llm::LLMAgent;

use crate::adk::BoxError;
use async_trait::async_trait;

/// Core agent trait
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &str;

    /// Run the agent on one instruction and return its final text answer
    async fn run(&self, input: String) -> Result<String, BoxError>;
}
