// SPDX-License-Identifier: MIT

//! Application configuration
//!
//! Layered lowest to highest: built-in defaults, an optional YAML file,
//! then environment variables (the binary loads `.env` into the
//! environment first).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::adk::error::ConfigError;
use crate::adk::model::openai::GROQ_BASE_URL;

/// Environment variable naming the config file when `--config` is absent
pub const CONFIG_PATH_ENV: &str = "INBOX_FLOW_CONFIG";

pub const DEFAULT_MODEL: &str = "openai/gpt-oss-120b";
pub const DEFAULT_INSTRUCTION: &str = "Process my inbox.";
pub const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub gmail: GmailConfig,
    pub storage: StorageConfig,
    pub workflow: WorkflowConfig,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Tool-calling round trips before the agent gives up
    pub max_turns: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    pub access_token: Option<String>,
    pub user_id: String,
    pub api_base: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub checkpoint_backend: CheckpointBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Instruction used when a run starts without one
    pub default_instruction: String,
    pub step_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            gmail: GmailConfig::default(),
            storage: StorageConfig::default(),
            workflow: WorkflowConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: GROQ_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_turns: 10,
        }
    }
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            user_id: "me".to_string(),
            api_base: GMAIL_API_BASE.to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("inbox_flow.db"),
            checkpoint_backend: CheckpointBackend::Sqlite,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            default_instruction: DEFAULT_INSTRUCTION.to_string(),
            step_limit: crate::inbox::workflow::graph::DEFAULT_STEP_LIMIT,
        }
    }
}

impl CheckpointBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointBackend::Memory => "memory",
            CheckpointBackend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for CheckpointBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for CheckpointBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(CheckpointBackend::Memory),
            "sqlite" => Ok(CheckpointBackend::Sqlite),
            other => Err(ConfigError::invalid(
                "CHECKPOINT_BACKEND",
                format!("expected 'memory' or 'sqlite', got '{}'", other),
            )),
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file at `path` (or `$INBOX_FLOW_CONFIG`), then
    /// the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        log::debug!("Loaded config file {}", path.display());
        Self::from_yaml_str(&content).map_err(|e| ConfigError::File {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Overlay values from `lookup` (normally the environment). Blank values
    /// are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("GROQ_API_KEY").or_else(|| get("LLM_API_KEY")) {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = get("LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = get("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(temp) = get("LLM_TEMPERATURE") {
            self.llm.temperature = temp.trim().parse().map_err(|_| {
                ConfigError::invalid("LLM_TEMPERATURE", format!("not a number: {}", temp))
            })?;
        }
        if let Some(token) = get("GMAIL_ACCESS_TOKEN") {
            self.gmail.access_token = Some(token);
        }
        if let Some(user) = get("GMAIL_USER_ID") {
            self.gmail.user_id = user;
        }
        if let Some(base) = get("GMAIL_API_BASE") {
            self.gmail.api_base = base;
        }
        if let Some(path) = get("DATABASE_PATH") {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(backend) = get("CHECKPOINT_BACKEND") {
            self.storage.checkpoint_backend = backend.parse()?;
        }
        if let Some(instruction) = get("DEFAULT_INSTRUCTION") {
            self.workflow.default_instruction = instruction;
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(())
    }

    /// Check everything a run needs. Inspection commands skip this.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()));
        }
        if self
            .gmail
            .access_token
            .as_deref()
            .map_or(true, |t| t.trim().is_empty())
        {
            return Err(ConfigError::MissingEnvVar("GMAIL_ACCESS_TOKEN".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::invalid(
                "llm.temperature",
                "must be between 0.0 and 2.0",
            ));
        }
        if self.workflow.step_limit == 0 {
            return Err(ConfigError::invalid("workflow.step_limit", "must be at least 1"));
        }
        if self.workflow.default_instruction.trim().is_empty() {
            return Err(ConfigError::invalid(
                "workflow.default_instruction",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
