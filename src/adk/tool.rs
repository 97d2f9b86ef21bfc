// SPDX-License-Identifier: MIT

use super::BoxError;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that can be called by agents.
///
/// `name()`, `description()` and `schema()` borrow from the implementor so
/// the agent loop can advertise tools on every turn without allocating.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name, unique within an agent's tool set
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    async fn execute(&self, input: Value) -> Result<Value, BoxError>;
}
