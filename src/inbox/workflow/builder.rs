// SPDX-License-Identifier: MIT

//! Workflow builder - wires the inbox graph
//!
//! ```text
//! entry -> classify -+-> process_inbox -> END
//!                    +-> daily_summary -> END
//! ```

use std::sync::Arc;

use crate::adk::error::GraphError;
use crate::adk::BoxError;
use crate::inbox::agent_factory::AgentFactory;
use crate::inbox::config::{AppConfig, WorkflowConfig};
use crate::inbox::executor::{AgentExecutor, TaskExecutor};
use crate::inbox::store::Stores;
use crate::inbox::tools::{gmail, ToolRegistry};
use crate::inbox::workflow::graph::{CompiledGraph, GraphBuilder, InvokeConfig, END};
use crate::inbox::workflow::nodes::{BranchNode, Classifier, ClassifyNode, EntryNode};
use crate::inbox::workflow::router::TaskRouter;
use crate::inbox::workflow::state::{SharedState, TaskKind};

pub const ENTRY_NODE: &str = "entry";
pub const CLASSIFY_NODE: &str = "classify";

/// Compile the inbox graph around `executor` and the given stores
pub fn build_graph(
    executor: Arc<dyn TaskExecutor>,
    stores: &Stores,
    workflow: &WorkflowConfig,
) -> Result<CompiledGraph, GraphError> {
    let mut graph = GraphBuilder::new();
    graph
        .add_node(
            ENTRY_NODE,
            Arc::new(EntryNode::new(
                stores.ledger.clone(),
                workflow.default_instruction.clone(),
            )),
        )?
        .add_node(
            CLASSIFY_NODE,
            Arc::new(ClassifyNode::new(Classifier::default(), stores.ledger.clone())),
        )?;

    for kind in TaskKind::ALL {
        graph.add_node(
            kind.as_str(),
            Arc::new(BranchNode::new(
                kind,
                executor.clone(),
                stores.ledger.clone(),
            )),
        )?;
        graph.add_edge(kind.as_str(), END)?;
    }

    graph.set_entry_point(ENTRY_NODE)?;
    graph.add_edge(ENTRY_NODE, CLASSIFY_NODE)?;
    graph.add_conditional_edges(
        CLASSIFY_NODE,
        Arc::new(TaskRouter::default()),
        TaskKind::ALL.map(|kind| (kind.as_str(), kind.as_str())),
    )?;

    Ok(graph
        .compile(stores.checkpoints.clone())?
        .with_step_limit(workflow.step_limit))
}

/// A compiled inbox workflow and the stores it runs against
pub struct InboxFlow {
    pub graph: CompiledGraph,
    pub stores: Stores,
}

impl InboxFlow {
    pub fn new(
        executor: Arc<dyn TaskExecutor>,
        stores: Stores,
        workflow: &WorkflowConfig,
    ) -> Result<Self, GraphError> {
        let graph = build_graph(executor, &stores, workflow)?;
        Ok(Self { graph, stores })
    }

    /// Run `raw_input` under `config.thread_id`, resuming if the thread has
    /// a checkpoint
    pub async fn run(
        &self,
        raw_input: &str,
        config: &InvokeConfig,
    ) -> Result<SharedState, GraphError> {
        self.graph.invoke(SharedState::new(raw_input), config).await
    }
}

/// High-level builder: registers the mailbox tools, builds the mail agent
/// and opens the configured stores
pub struct Builder {
    registry: ToolRegistry,
}

impl Builder {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub async fn build(&self, config: &AppConfig) -> Result<InboxFlow, BoxError> {
        config.validate()?;

        let tools = gmail::create_tools(&config.gmail)?;
        self.registry.register_all(tools).await;

        let agent = AgentFactory::new(&self.registry)
            .build_mail_agent(&config.llm)
            .await?;
        let executor = Arc::new(AgentExecutor::new(agent));
        let stores = Stores::from_config(&config.storage);

        Ok(InboxFlow::new(executor, stores, &config.workflow)?)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new(ToolRegistry::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::ExecutorError;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Fixed;

    #[async_trait]
    impl TaskExecutor for Fixed {
        async fn invoke(&self, _instruction: &str) -> Result<Value, ExecutorError> {
            Ok(json!({"output": "ok"}))
        }
    }

    #[test]
    fn test_inbox_graph_compiles() {
        let graph = build_graph(Arc::new(Fixed), &Stores::in_memory(), &WorkflowConfig::default());
        assert_eq!(graph.unwrap().entry_point(), "entry");
    }

    #[tokio::test]
    async fn test_builder_rejects_missing_credentials() {
        let err = Builder::default()
            .build(&AppConfig::default())
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[tokio::test]
    async fn test_builder_with_memory_backend() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("gsk_test".to_string());
        config.gmail.access_token = Some("ya29.test".to_string());
        config.storage.checkpoint_backend = crate::inbox::config::CheckpointBackend::Memory;

        let registry = ToolRegistry::new();
        let flow = Builder::new(registry.clone()).build(&config).await.unwrap();
        assert_eq!(flow.graph.entry_point(), "entry");
        assert!(registry.get("apply_label").await.is_some());
    }
}
