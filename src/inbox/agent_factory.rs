// SPDX-License-Identifier: MIT

//! Agent factory - builds the mail agent from configuration
//!
//! The mail agent is an [`LLMAgent`] over an OpenAI-compatible chat model
//! with the mailbox tools bound to it.

use crate::adk::agent::{Agent, LLMAgent};
use crate::adk::model::openai::OpenAIModel;
use crate::adk::model::{GenerationConfig, Model};
use crate::adk::BoxError;
use crate::inbox::config::LlmConfig;
use crate::inbox::tools::ToolRegistry;

use std::sync::Arc;

pub const MAIL_AGENT_NAME: &str = "gmail_agent";

/// Tools the mail agent is given, in the order the model sees them
pub const MAIL_AGENT_TOOLS: [&str; 3] = ["fetch_unread_emails", "send_reply", "apply_label"];

pub const MAIL_AGENT_PROMPT: &str = "You are a Gmail Automation AI Agent.

Your responsibilities:
- Process Gmail inbox intelligently.
- Identify important emails.
- Apply correct labels.
- Generate professional replies when appropriate.
- Ignore spam.
- Create concise daily summaries.

Agent Requirements:
1. Understand the user's instruction clearly.
2. Pick the correct tool when needed.
3. Use tools ONLY when necessary.
4. Carefully analyze the output of each tool call.
5. Always return a clean, concise final result.
6. Do not hallucinate tool usage; only use the provided tools.

Tasks you can perform:
- process_inbox: Fetch unread emails, classify them, reply, label.
- daily_summary: Produce a summary of today's important emails.";

/// Factory for the agents branch nodes delegate to
pub struct AgentFactory<'a> {
    registry: &'a ToolRegistry,
}

impl<'a> AgentFactory<'a> {
    pub fn new(registry: &'a ToolRegistry) -> Self {
        Self { registry }
    }

    /// Chat model described by `config`
    pub fn create_model(config: &LlmConfig) -> Result<Arc<dyn Model>, BoxError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or("GROQ_API_KEY must be set")?;

        log::debug!("Using model '{}' at {}", config.model, config.base_url);
        Ok(Arc::new(OpenAIModel::new(
            api_key,
            config.base_url.clone(),
            config.model.clone(),
        )))
    }

    /// Mail agent over an existing model
    pub async fn build_mail_agent_with(
        &self,
        model: Arc<dyn Model>,
        config: &LlmConfig,
    ) -> Arc<dyn Agent> {
        let tools = self.registry.select(&MAIL_AGENT_TOOLS).await;
        log::info!(
            "Building agent '{}' with {} tools",
            MAIL_AGENT_NAME,
            tools.len()
        );

        Arc::new(
            LLMAgent::new(
                MAIL_AGENT_NAME.to_string(),
                "Triages, labels, replies to and summarizes Gmail messages".to_string(),
                MAIL_AGENT_PROMPT.to_string(),
                model,
                tools,
            )
            .with_generation_config(GenerationConfig {
                temperature: Some(config.temperature),
                ..Default::default()
            })
            .with_max_turns(config.max_turns),
        )
    }

    pub async fn build_mail_agent(&self, config: &LlmConfig) -> Result<Arc<dyn Agent>, BoxError> {
        let model = Self::create_model(config)?;
        Ok(self.build_mail_agent_with(model, config).await)
    }
}
