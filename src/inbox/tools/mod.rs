// SPDX-License-Identifier: MIT

//! Mailbox tools and the registry the agent factory draws from

pub mod gmail;

use crate::adk::tool::Tool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its own name, replacing any previous one
    pub async fn register(&self, tool: Arc<dyn Tool>) {
        log::debug!("Registered tool: {}", tool.name());
        let mut tools = self.tools.write().await;
        tools.insert(tool.name().to_string(), tool);
    }

    pub async fn register_all(&self, tools: Vec<Arc<dyn Tool>>) {
        for tool in tools {
            self.register(tool).await;
        }
    }

    pub async fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        tools.get(name).cloned()
    }

    /// Tools for `names` in the given order. Missing names are logged and
    /// skipped.
    pub async fn select(&self, names: &[&str]) -> Vec<Arc<dyn Tool>> {
        let tools = self.tools.read().await;
        names
            .iter()
            .filter_map(|name| {
                let tool = tools.get(*name).cloned();
                if tool.is_none() {
                    log::warn!("Tool not found: {}", name);
                }
                tool
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::BoxError;
    use async_trait::async_trait;
    use once_cell::sync::Lazy;
    use serde_json::{json, Value};

    static MOCK_SCHEMA: Lazy<Value> = Lazy::new(|| {
        json!({
            "type": "object",
            "properties": {}
        })
    });

    struct MockTool {
        name: String,
    }

    impl MockTool {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
            })
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "mock"
        }

        fn schema(&self) -> &Value {
            &MOCK_SCHEMA
        }

        async fn execute(&self, _input: Value) -> Result<Value, BoxError> {
            Ok(json!({"result": "mock"}))
        }
    }

    #[tokio::test]
    async fn test_register_and_get_tool() {
        let registry = ToolRegistry::new();
        registry.register(MockTool::new("apply_label")).await;

        let retrieved = registry.get("apply_label").await;
        assert_eq!(retrieved.unwrap().name(), "apply_label");
        assert!(registry.get("send_reply").await.is_none());
    }

    #[tokio::test]
    async fn test_select_keeps_order_and_skips_missing() {
        let registry = ToolRegistry::new();
        registry
            .register_all(vec![
                MockTool::new("send_reply"),
                MockTool::new("fetch_unread_emails"),
            ])
            .await;

        let selected = registry
            .select(&["fetch_unread_emails", "apply_label", "send_reply"])
            .await;
        let names: Vec<&str> = selected.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["fetch_unread_emails", "send_reply"]);
    }

    #[tokio::test]
    async fn test_registry_is_shared_between_clones() {
        let registry = ToolRegistry::new();
        let cloned = registry.clone();
        cloned.register(MockTool::new("apply_label")).await;
        assert!(registry.get("apply_label").await.is_some());
    }
}
