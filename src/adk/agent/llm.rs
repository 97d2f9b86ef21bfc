// SPDX-License-Identifier: MIT

//! LLM Agent - tool-calling loop
//!
//! Sends the instruction to the model, executes any requested tool calls,
//! feeds the results back and stops at the first non-empty text answer.

use super::Agent;
use crate::adk::model::{Content, GenerationConfig, Model, Part};
use crate::adk::tool::Tool;
use crate::adk::BoxError;
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_MAX_TURNS: u32 = 10;

pub struct LLMAgent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub tools: Vec<Arc<dyn Tool>>,
    generation: GenerationConfig,
    max_turns: u32,
    tool_map: HashMap<String, usize>,
}

impl LLMAgent {
    pub fn new(
        name: String,
        description: String,
        instruction: String,
        model: Arc<dyn Model>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        let tool_map: HashMap<String, usize> = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        Self {
            name,
            description,
            instruction,
            model,
            tools,
            generation: GenerationConfig::default(),
            max_turns: DEFAULT_MAX_TURNS,
            tool_map,
        }
    }

    pub fn with_generation_config(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns.max(1);
        self
    }

    fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tool_map.get(name).map(|&i| &self.tools[i])
    }

    /// Execute one tool call. Tool failures are reported back to the model
    /// as an error payload rather than aborting the loop.
    async fn call_tool(&self, name: &str, args: &serde_json::Value) -> serde_json::Value {
        let Some(tool) = self.get_tool(name) else {
            log::error!("Agent {} requested unknown tool {}", self.name, name);
            return json!({ "error": format!("Tool {} not found", name) });
        };

        match tool.execute(args.clone()).await {
            Ok(res) => res,
            Err(e) => {
                log::error!("Tool {} failed: {}", name, e);
                json!({ "error": e.to_string() })
            }
        }
    }
}

#[async_trait]
impl Agent for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: String) -> Result<String, BoxError> {
        let mut history = vec![Content::system(self.instruction.clone()), Content::user(input)];

        for turn in 0..self.max_turns {
            log::info!("Agent {} turn {}/{}", self.name, turn + 1, self.max_turns);
            let response = self
                .model
                .generate_content(&history, Some(&self.generation), Some(&self.tools))
                .await?;

            let calls: Vec<(String, String, serde_json::Value)> = response
                .parts
                .iter()
                .filter_map(|part| match part {
                    Part::FunctionCall { id, name, args } => {
                        Some((id.clone(), name.clone(), args.clone()))
                    }
                    _ => None,
                })
                .collect();

            if calls.is_empty() {
                let text = response.text();
                if text.is_empty() {
                    log::warn!("Agent {} received empty response with no tool calls", self.name);
                }
                return Ok(text);
            }

            let mut responses = Vec::with_capacity(calls.len());
            for (id, name, args) in calls {
                log::info!("Tool call: {} {}", name, args);
                let result = self.call_tool(&name, &args).await;
                log::debug!("Tool {} response: {}", name, result);
                responses.push(Part::FunctionResponse {
                    id,
                    name,
                    response: result,
                });
            }

            history.push(response);
            history.push(Content {
                role: "user".to_string(),
                parts: responses,
            });
        }

        log::error!(
            "Agent {} reached max turns without text response",
            self.name
        );
        Err(format!("Max turns reached: {}", self.max_turns).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    static EMPTY_SCHEMA: Lazy<Value> = Lazy::new(|| json!({"type": "object", "properties": {}}));

    /// Replays scripted responses and records every history it was sent
    struct ScriptedModel {
        responses: Vec<Content>,
        index: AtomicUsize,
        seen: Mutex<Vec<Vec<Content>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Content>) -> Self {
            Self {
                responses,
                index: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate_content(
            &self,
            history: &[Content],
            _config: Option<&GenerationConfig>,
            _tools: Option<&[Arc<dyn Tool>]>,
        ) -> Result<Content, BoxError> {
            self.seen.lock().unwrap().push(history.to_vec());
            let idx = self.index.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(idx)
                .cloned()
                .ok_or_else(|| "script exhausted".into())
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "apply_label"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn schema(&self) -> &Value {
            &EMPTY_SCHEMA
        }

        async fn execute(&self, _input: Value) -> Result<Value, BoxError> {
            Err("label service down".into())
        }
    }

    fn text(t: &str) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::Text(t.to_string())],
        }
    }

    fn call(id: &str, name: &str) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                id: id.to_string(),
                name: name.to_string(),
                args: json!({}),
            }],
        }
    }

    fn agent(model: Arc<ScriptedModel>, tools: Vec<Arc<dyn Tool>>) -> LLMAgent {
        LLMAgent::new(
            "gmail_agent".to_string(),
            "test".to_string(),
            "You are a mail agent.".to_string(),
            model,
            tools,
        )
    }

    #[tokio::test]
    async fn test_returns_first_text_answer() {
        let model = Arc::new(ScriptedModel::new(vec![text("All caught up.")]));
        let result = agent(model, vec![]).run("Process my inbox".to_string()).await;
        assert_eq!(result.unwrap(), "All caught up.");
    }

    #[tokio::test]
    async fn test_tool_error_is_fed_back_to_model() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("call_1", "apply_label"),
            text("Could not label."),
        ]));
        let result = agent(model.clone(), vec![Arc::new(FailingTool)])
            .run("label it".to_string())
            .await
            .unwrap();
        assert_eq!(result, "Could not label.");

        let seen = model.seen.lock().unwrap();
        let second_turn = &seen[1];
        match &second_turn.last().unwrap().parts[0] {
            Part::FunctionResponse { id, response, .. } => {
                assert_eq!(id, "call_1");
                assert_eq!(response["error"], "label service down");
            }
            other => panic!("Expected FunctionResponse, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_reported_not_fatal() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("call_9", "delete_everything"),
            text("ok"),
        ]));
        let result = agent(model, vec![]).run("x".to_string()).await;
        assert_eq!(result.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_max_turns_is_an_error() {
        let model = Arc::new(ScriptedModel::new(vec![
            call("a", "apply_label"),
            call("b", "apply_label"),
        ]));
        let result = agent(model, vec![Arc::new(FailingTool)])
            .with_max_turns(2)
            .run("loop".to_string())
            .await;
        assert!(result.unwrap_err().to_string().contains("Max turns"));
    }
}
