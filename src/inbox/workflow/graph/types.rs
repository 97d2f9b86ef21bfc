// SPDX-License-Identifier: MIT

//! Graph definition types

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::inbox::workflow::router::Router;

/// Terminal marker. Not a node; edges pointing here end the run.
pub const END: &str = "__end__";

/// Default ceiling on nodes executed per invocation
pub const DEFAULT_STEP_LIMIT: u32 = 25;

/// Outgoing edge of a node. Each node has exactly one.
#[derive(Clone)]
pub enum Edge {
    /// Always continue at the target
    Direct(String),
    /// Ask the router for a label, then look the label up in `targets`
    Conditional {
        router: Arc<dyn Router>,
        targets: BTreeMap<String, String>,
    },
}

impl Edge {
    /// Every node name this edge can lead to
    pub fn targets(&self) -> Vec<&str> {
        match self {
            Edge::Direct(target) => vec![target.as_str()],
            Edge::Conditional { targets, .. } => targets.values().map(String::as_str).collect(),
        }
    }
}

impl fmt::Debug for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edge::Direct(target) => f.debug_tuple("Direct").field(target).finish(),
            Edge::Conditional { targets, .. } => f
                .debug_struct("Conditional")
                .field("targets", targets)
                .finish_non_exhaustive(),
        }
    }
}

/// Caller-side settings for one invocation
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeConfig {
    /// Resumption key. Checkpoints are stored and looked up under it.
    pub thread_id: String,
}

impl InvokeConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
        }
    }

    /// Fresh `session:<uuid>` key
    pub fn session() -> Self {
        Self::new(format!("session:{}", Uuid::new_v4()))
    }
}
