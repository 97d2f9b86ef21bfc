// SPDX-License-Identifier: MIT

//! Typed error handling for inbox-flow
//!
//! Only graph definition faults are meant to reach the caller of the build
//! step. Everything that happens inside a run is either absorbed into the
//! shared state log or surfaced as a [`GraphError`] with the last checkpoint
//! left intact.

use thiserror::Error;

/// Top-level error type for inbox-flow
#[derive(Debug, Error)]
pub enum InboxFlowError {
    /// Configuration errors (missing env vars, invalid config)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Graph definition or execution errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Run ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Faults in the graph definition (caught by `compile`) and faults the
/// engine surfaces while driving a run.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph has no entry point")]
    MissingEntryPoint,

    #[error("Entry point already set to '{0}'")]
    DuplicateEntryPoint(String),

    #[error("Node '{0}' is registered twice")]
    DuplicateNode(String),

    #[error("Node name '{0}' is reserved")]
    ReservedName(String),

    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    #[error("Node '{0}' already has an outgoing edge")]
    DuplicateEdge(String),

    #[error("Node '{0}' has no outgoing edge")]
    MissingEdge(String),

    #[error("Router on '{node}' can produce label '{label}' with no target")]
    UnmappedRoute { node: String, label: String },

    #[error("Node '{0}' is not reachable from the entry point")]
    Unreachable(String),

    #[error("No path to the end of the graph from '{0}'")]
    NoPathToEnd(String),

    /// A router produced a label that is not in its target map
    #[error("Router on '{node}' returned unknown label '{label}'")]
    UnknownRoute { node: String, label: String },

    #[error("Node '{node}' failed: {message}")]
    NodeFailed { node: String, message: String },

    #[error("State violation after node '{node}': {source}")]
    StateViolation {
        node: String,
        #[source]
        source: StateError,
    },

    #[error("Max steps reached: {0}")]
    StepLimitExceeded(u32),

    /// The caller's initial state carries fields only the graph may write
    #[error("Initial state rejected: {0}")]
    InvalidInitialState(#[source] StateError),
}

/// Invariant violations detected while applying a node's patch to the
/// shared state.
#[derive(Debug, Error, PartialEq)]
pub enum StateError {
    #[error("result is already set for this run")]
    ResultAlreadySet,

    #[error("task is already set to '{0}'")]
    TaskAlreadySet(String),

    #[error("run_id is already set to {0}")]
    RunIdAlreadySet(uuid::Uuid),

    #[error("raw_input is immutable once set")]
    RawInputImmutable,

    #[error("task '{0}' is chosen by the graph and must not be preset")]
    PresetTask(String),

    #[error("result must not be set before the run starts")]
    PresetResult,
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Run not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("Invalid status transition for run {run_id}: {from} -> {to}")]
    InvalidTransition {
        run_id: uuid::Uuid,
        from: String,
        to: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

/// Failures of the external task-executor capability
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Agent '{agent}' failed: {message}")]
    Agent { agent: String, message: String },

    #[error("Executor returned an error payload: {0}")]
    ErrorPayload(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to read config file {path}: {message}")]
    File { path: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl GraphError {
    pub fn node_failed(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NodeFailed {
            node: node.into(),
            message: message.into(),
        }
    }
}

/// Result alias used across the workflow engine
pub type Result<T, E = InboxFlowError> = std::result::Result<T, E>;
