//! Integration tests for the inbox workflow
//!
//! These tests drive the compiled graph end to end using mock executors,
//! instrumented stores and on-disk SQLite databases.

use async_trait::async_trait;
use inbox_flow::adk::agent::LLMAgent;
use inbox_flow::adk::error::{
    CheckpointError, ExecutorError, GraphError, LedgerError, StateError,
};
use inbox_flow::adk::model::{Content, GenerationConfig, Model, Part};
use inbox_flow::adk::tool::Tool;
use inbox_flow::adk::BoxError;
use inbox_flow::inbox::config::WorkflowConfig;
use inbox_flow::inbox::executor::{AgentExecutor, TaskExecutor};
use inbox_flow::inbox::store::{
    Checkpoint, CheckpointStore, Database, MemoryCheckpointStore, MemoryRunLedger, RunLedger,
    RunRecord, RunStatus, Stores,
};
use inbox_flow::inbox::workflow::builder::InboxFlow;
use inbox_flow::inbox::workflow::graph::InvokeConfig;
use inbox_flow::inbox::workflow::node::{Node, RunContext};
use inbox_flow::inbox::workflow::nodes::{Classifier, ClassifyNode, EntryNode};
use inbox_flow::inbox::workflow::state::{SharedState, TaskKind};
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ============================================================================
// Mock Components
// ============================================================================

/// Executor that echoes the instruction it received and counts calls
#[derive(Default)]
struct EchoExecutor {
    calls: AtomicUsize,
    instructions: Mutex<Vec<String>>,
}

#[async_trait]
impl TaskExecutor for EchoExecutor {
    async fn invoke(&self, instruction: &str) -> Result<Value, ExecutorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.instructions
            .lock()
            .unwrap()
            .push(instruction.to_string());
        Ok(json!({ "agent": "mock_agent", "output": instruction }))
    }
}

struct FailingExecutor;

#[async_trait]
impl TaskExecutor for FailingExecutor {
    async fn invoke(&self, _instruction: &str) -> Result<Value, ExecutorError> {
        Err(ExecutorError::Agent {
            agent: "gmail_agent".to_string(),
            message: "Groq API error (503)".to_string(),
        })
    }
}

/// Checkpoint store that refuses to save after one particular node
struct FailingSaveStore {
    inner: MemoryCheckpointStore,
    fail_after: &'static str,
}

#[async_trait]
impl CheckpointStore for FailingSaveStore {
    async fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        if checkpoint.completed_node == self.fail_after {
            return Err(CheckpointError::Storage("disk full".to_string()));
        }
        self.inner.save(key, checkpoint).await
    }

    async fn load(&self, key: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        self.inner.load(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool, CheckpointError> {
        self.inner.delete(key).await
    }
}

/// Checkpoint store whose reads always fail
struct UnreadableStore {
    inner: MemoryCheckpointStore,
}

#[async_trait]
impl CheckpointStore for UnreadableStore {
    async fn save(&self, key: &str, checkpoint: &Checkpoint) -> Result<(), CheckpointError> {
        self.inner.save(key, checkpoint).await
    }

    async fn load(&self, _key: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        Err(CheckpointError::Storage("connection reset".to_string()))
    }

    async fn delete(&self, key: &str) -> Result<bool, CheckpointError> {
        self.inner.delete(key).await
    }
}

/// Run ledger that counts calls before delegating
#[derive(Default)]
struct CountingLedger {
    inner: MemoryRunLedger,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

#[async_trait]
impl RunLedger for CountingLedger {
    async fn create(
        &self,
        thread_id: Option<&str>,
        task: Option<&str>,
    ) -> Result<Uuid, LedgerError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.inner.create(thread_id, task).await
    }

    async fn set_task(&self, run_id: Uuid, task: &str) -> Result<(), LedgerError> {
        self.inner.set_task(run_id, task).await
    }

    async fn update_status(
        &self,
        run_id: Uuid,
        status: RunStatus,
        result: Option<&Value>,
    ) -> Result<(), LedgerError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_status(run_id, status, result).await
    }

    async fn get(&self, run_id: Uuid) -> Result<Option<RunRecord>, LedgerError> {
        self.inner.get(run_id).await
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>, LedgerError> {
        self.inner.list_recent(limit).await
    }
}

/// Run ledger that is always unavailable
struct DownLedger;

#[async_trait]
impl RunLedger for DownLedger {
    async fn create(&self, _: Option<&str>, _: Option<&str>) -> Result<Uuid, LedgerError> {
        Err(LedgerError::Storage("database is locked".to_string()))
    }

    async fn set_task(&self, _: Uuid, _: &str) -> Result<(), LedgerError> {
        Err(LedgerError::Storage("database is locked".to_string()))
    }

    async fn update_status(
        &self,
        _: Uuid,
        _: RunStatus,
        _: Option<&Value>,
    ) -> Result<(), LedgerError> {
        Err(LedgerError::Storage("database is locked".to_string()))
    }

    async fn get(&self, _: Uuid) -> Result<Option<RunRecord>, LedgerError> {
        Err(LedgerError::Storage("database is locked".to_string()))
    }

    async fn list_recent(&self, _: usize) -> Result<Vec<RunRecord>, LedgerError> {
        Err(LedgerError::Storage("database is locked".to_string()))
    }
}

/// Mock model that returns predefined responses
struct MockModel {
    responses: Vec<Content>,
    response_index: AtomicUsize,
}

impl MockModel {
    fn new(responses: Vec<Content>) -> Self {
        Self {
            responses,
            response_index: AtomicUsize::new(0),
        }
    }

    fn text_response(text: &str) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::Text(text.to_string())],
        }
    }

    fn tool_call_response(id: &str, tool_name: &str, args: Value) -> Content {
        Content {
            role: "model".to_string(),
            parts: vec![Part::FunctionCall {
                id: id.to_string(),
                name: tool_name.to_string(),
                args,
            }],
        }
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate_content(
        &self,
        _history: &[Content],
        _config: Option<&GenerationConfig>,
        _tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content, BoxError> {
        let idx = self.response_index.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(idx)
            .cloned()
            .ok_or_else(|| "No more mock responses".into())
    }
}

static FETCH_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "limit": {"type": "integer"}
        }
    })
});

/// Stand-in for the Gmail fetch tool
struct MockFetchTool {
    calls: AtomicUsize,
}

#[async_trait]
impl Tool for MockFetchTool {
    fn name(&self) -> &str {
        "fetch_unread_emails"
    }

    fn description(&self) -> &str {
        "Fetches unread emails"
    }

    fn schema(&self) -> &Value {
        &FETCH_SCHEMA
    }

    async fn execute(&self, _input: Value) -> Result<Value, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(json!({
            "emails": [{
                "id": "m1",
                "thread_id": "t1",
                "subject": "Invoice",
                "sender": "billing@example.com",
                "snippet": "Your invoice is attached",
                "body": "Your invoice is attached."
            }]
        }))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn flow_with(executor: Arc<dyn TaskExecutor>, stores: Stores) -> InboxFlow {
    InboxFlow::new(executor, stores, &WorkflowConfig::default()).unwrap()
}

fn position(log: &[String], prefix: &str) -> usize {
    log.iter()
        .position(|line| line.starts_with(prefix))
        .unwrap_or_else(|| panic!("no log line starting with '{}' in {:?}", prefix, log))
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

#[tokio::test]
async fn test_process_inbox_scenario() {
    let executor = Arc::new(EchoExecutor::default());
    let stores = Stores::in_memory();
    let flow = flow_with(executor.clone(), stores.clone());

    let state = flow
        .run("Process my inbox", &InvokeConfig::new("session:inbox"))
        .await
        .unwrap();

    assert_eq!(state.task, Some(TaskKind::ProcessInbox));
    let entry = position(&state.log, "entry:");
    let classify = position(&state.log, "classify:");
    let branch = position(&state.log, "process_inbox:");
    assert!(entry < classify && classify < branch);

    let instruction = executor.instructions.lock().unwrap()[0].clone();
    assert!(instruction.starts_with("Task: process_inbox"));
    assert_eq!(
        state.result,
        Some(json!({ "agent": "mock_agent", "output": instruction }))
    );

    let record = stores.ledger.get(state.run_id.unwrap()).await.unwrap().unwrap();
    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.task.as_deref(), Some("process_inbox"));
    assert_eq!(record.thread_id.as_deref(), Some("session:inbox"));
    assert_eq!(record.result, state.result);
}

#[tokio::test]
async fn test_daily_summary_scenario() {
    let executor = Arc::new(EchoExecutor::default());
    let flow = flow_with(executor.clone(), Stores::in_memory());

    let state = flow
        .run("Give me a daily summary", &InvokeConfig::new("session:summary"))
        .await
        .unwrap();

    assert_eq!(state.task, Some(TaskKind::DailySummary));
    let classify = position(&state.log, "classify:");
    let branch = position(&state.log, "daily_summary:");
    assert!(position(&state.log, "entry:") < classify && classify < branch);
    assert!(state.result.unwrap()["output"]
        .as_str()
        .unwrap()
        .starts_with("Task: daily_summary"));
}

#[tokio::test]
async fn test_checkpoint_save_failure_after_classify_is_absorbed() {
    let executor = Arc::new(EchoExecutor::default());
    let ledger = Arc::new(MemoryRunLedger::new());
    let stores = Stores {
        checkpoints: Arc::new(FailingSaveStore {
            inner: MemoryCheckpointStore::new(),
            fail_after: "classify",
        }),
        ledger: ledger.clone(),
    };
    let flow = flow_with(executor, stores);

    let state = flow
        .run("Process my inbox", &InvokeConfig::new("session:flaky"))
        .await
        .unwrap();

    assert!(state.result.is_some());
    let fault = position(&state.log, "checkpoint: failed to save after classify");
    assert!(fault < position(&state.log, "process_inbox:"));

    let record = ledger.get(state.run_id.unwrap()).await.unwrap().unwrap();
    assert_eq!(record.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_empty_input_uses_default_instruction() {
    let executor = Arc::new(EchoExecutor::default());
    let flow = flow_with(executor.clone(), Stores::in_memory());

    for (i, input) in ["", "   "].iter().enumerate() {
        let state = flow
            .run(input, &InvokeConfig::new(format!("session:empty-{}", i)))
            .await
            .unwrap();
        assert_eq!(state.raw_input.as_deref(), Some("Process my inbox."));
        assert_eq!(state.task, Some(TaskKind::ProcessInbox));
        assert!(state.result.is_some());
    }

    let instructions = executor.instructions.lock().unwrap();
    assert!(instructions
        .iter()
        .all(|i| i.ends_with("User instruction: Process my inbox.")));
}

#[tokio::test]
async fn test_executor_failure_marks_run_failed() {
    let stores = Stores::in_memory();
    let flow = flow_with(Arc::new(FailingExecutor), stores.clone());

    let state = flow
        .run("Give me a daily summary", &InvokeConfig::new("session:fail"))
        .await
        .unwrap();

    let result = state.result.clone().unwrap();
    assert_eq!(result["task"], "daily_summary");
    assert!(result["error"].as_str().unwrap().contains("503"));
    position(&state.log, "daily_summary: executor failed");

    let record = stores.ledger.get(state.run_id.unwrap()).await.unwrap().unwrap();
    assert_eq!(record.status, RunStatus::Failed);
    assert!(record.finished_at.is_some());
}

#[tokio::test]
async fn test_preset_result_is_rejected_before_routing() {
    let executor = Arc::new(EchoExecutor::default());
    let stores = Stores::in_memory();
    let flow = flow_with(executor.clone(), stores.clone());
    let config = InvokeConfig::new("session:stale-result");

    for _ in 0..2 {
        let mut initial = SharedState::new("Process my inbox");
        initial.result = Some(json!("stale"));
        let err = flow.graph.invoke(initial, &config).await.unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidInitialState(StateError::PresetResult)
        ));
    }

    assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    assert!(stores.ledger.list_recent(10).await.unwrap().is_empty());
    assert!(stores.checkpoints.load("session:stale-result").await.unwrap().is_none());

    // A clean retry on the same key runs normally
    let state = flow.run("Process my inbox", &config).await.unwrap();
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    assert!(state.result.is_some());
}

#[tokio::test]
async fn test_preset_task_is_rejected_before_routing() {
    let executor = Arc::new(EchoExecutor::default());
    let stores = Stores::in_memory();
    let flow = flow_with(executor.clone(), stores.clone());

    let mut initial = SharedState::new("Process my inbox");
    initial.task = Some(TaskKind::DailySummary);
    let err = flow
        .graph
        .invoke(initial, &InvokeConfig::new("session:preset-task"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GraphError::InvalidInitialState(StateError::PresetTask(task)) if task == "daily_summary"
    ));
    assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
    assert!(stores.ledger.list_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_full_stack_with_llm_agent_and_tool_call() {
    let model = Arc::new(MockModel::new(vec![
        MockModel::tool_call_response("call_1", "fetch_unread_emails", json!({"limit": 5})),
        MockModel::text_response("1 unread email from billing@example.com labeled Billing."),
    ]));
    let tool = Arc::new(MockFetchTool {
        calls: AtomicUsize::new(0),
    });
    let agent = Arc::new(LLMAgent::new(
        "gmail_agent".to_string(),
        "mail agent".to_string(),
        "You are a Gmail Automation AI Agent.".to_string(),
        model,
        vec![tool.clone() as Arc<dyn Tool>],
    ));
    let flow = flow_with(Arc::new(AgentExecutor::new(agent)), Stores::in_memory());

    let state = flow
        .run("Process my inbox", &InvokeConfig::new("session:agent"))
        .await
        .unwrap();

    assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        state.result,
        Some(json!({
            "agent": "gmail_agent",
            "output": "1 unread email from billing@example.com labeled Billing."
        }))
    );
}

// ============================================================================
// Resumption
// ============================================================================

#[tokio::test]
async fn test_resume_after_classify_runs_only_the_branch() {
    let executor = Arc::new(EchoExecutor::default());
    let ledger = Arc::new(CountingLedger::default());
    let checkpoints = Arc::new(MemoryCheckpointStore::new());

    // Drive entry and classify by hand, as an interrupted run would have
    let ctx = RunContext::new("session:resume");
    let entry = EntryNode::new(ledger.clone(), "Process my inbox.");
    let classify = ClassifyNode::new(Classifier::default(), ledger.clone());
    let state = SharedState::new("Give me a daily summary");
    let state = state
        .apply(entry.execute(&state, &ctx).await.unwrap())
        .unwrap();
    let state = state
        .apply(classify.execute(&state, &ctx).await.unwrap())
        .unwrap();
    checkpoints
        .save("session:resume", &Checkpoint::new("classify", 2, state.clone()))
        .await
        .unwrap();

    let stores = Stores {
        checkpoints: checkpoints.clone(),
        ledger: ledger.clone(),
    };
    let flow = flow_with(executor.clone(), stores);
    let resumed = flow
        .run("this input is ignored", &InvokeConfig::new("session:resume"))
        .await
        .unwrap();

    // entry ran once (by hand), never again
    assert_eq!(ledger.creates.load(Ordering::SeqCst), 1);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(resumed.run_id, state.run_id);
    assert_eq!(resumed.raw_input.as_deref(), Some("Give me a daily summary"));
    assert_eq!(resumed.log.len(), 3);
    assert!(resumed.log[2].starts_with("daily_summary:"));

    let last = checkpoints.load("session:resume").await.unwrap().unwrap();
    assert_eq!(last.completed_node, "daily_summary");
    assert_eq!(last.step, 3);
}

#[tokio::test]
async fn test_finished_thread_returns_stored_state() {
    let executor = Arc::new(EchoExecutor::default());
    let ledger = Arc::new(CountingLedger::default());
    let stores = Stores {
        checkpoints: Arc::new(MemoryCheckpointStore::new()),
        ledger: ledger.clone(),
    };
    let flow = flow_with(executor.clone(), stores);
    let config = InvokeConfig::new("session:done");

    let first = flow.run("Process my inbox", &config).await.unwrap();
    let second = flow.run("Give me a daily summary", &config).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    assert_eq!(ledger.creates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_checkpoint_load_failure_starts_fresh() {
    let stores = Stores {
        checkpoints: Arc::new(UnreadableStore {
            inner: MemoryCheckpointStore::new(),
        }),
        ledger: Arc::new(MemoryRunLedger::new()),
    };
    let flow = flow_with(Arc::new(EchoExecutor::default()), stores);

    let state = flow
        .run("Process my inbox", &InvokeConfig::new("session:unreadable"))
        .await
        .unwrap();

    assert!(state.log[0].starts_with("checkpoint: failed to load"));
    assert!(state.result.is_some());
}

#[tokio::test]
async fn test_unknown_checkpointed_node_is_surfaced() {
    let checkpoints = Arc::new(MemoryCheckpointStore::new());
    checkpoints
        .save(
            "session:stale",
            &Checkpoint::new("triage", 2, SharedState::new("Process my inbox")),
        )
        .await
        .unwrap();
    let stores = Stores {
        checkpoints: checkpoints.clone(),
        ledger: Arc::new(MemoryRunLedger::new()),
    };
    let flow = flow_with(Arc::new(EchoExecutor::default()), stores);

    let err = flow
        .run("Process my inbox", &InvokeConfig::new("session:stale"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::UnknownNode(name) if name == "triage"));

    // The stored checkpoint is left as it was
    let kept = checkpoints.load("session:stale").await.unwrap().unwrap();
    assert_eq!(kept.completed_node, "triage");
}

// ============================================================================
// Run Ledger Bookkeeping
// ============================================================================

#[tokio::test]
async fn test_one_create_and_one_terminal_update_per_run() {
    let ledger = Arc::new(CountingLedger::default());
    let stores = Stores {
        checkpoints: Arc::new(MemoryCheckpointStore::new()),
        ledger: ledger.clone(),
    };
    let flow = flow_with(Arc::new(EchoExecutor::default()), stores);

    let state = flow
        .run("Give me a daily summary", &InvokeConfig::new("session:count"))
        .await
        .unwrap();

    assert_eq!(ledger.creates.load(Ordering::SeqCst), 1);
    assert_eq!(ledger.updates.load(Ordering::SeqCst), 1);
    let record = ledger.get(state.run_id.unwrap()).await.unwrap().unwrap();
    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.task.as_deref(), Some("daily_summary"));
}

#[tokio::test]
async fn test_ledger_outage_does_not_abort_run() {
    let stores = Stores {
        checkpoints: Arc::new(MemoryCheckpointStore::new()),
        ledger: Arc::new(DownLedger),
    };
    let flow = flow_with(Arc::new(EchoExecutor::default()), stores);

    let state = flow
        .run("Process my inbox", &InvokeConfig::new("session:down"))
        .await
        .unwrap();

    assert!(state.run_id.is_some());
    assert!(state.result.is_some());
    position(&state.log, "entry: run ledger unavailable");
    position(&state.log, "classify: failed to record task");
    position(&state.log, "process_inbox: failed to mark run");
}

// ============================================================================
// Concurrency and Durability
// ============================================================================

#[tokio::test]
async fn test_concurrent_runs_are_isolated() {
    let stores = Stores::in_memory();
    let flow = Arc::new(flow_with(Arc::new(EchoExecutor::default()), stores.clone()));

    let inputs: Vec<String> = (0..8)
        .map(|i| {
            if i % 2 == 0 {
                format!("Process my inbox #{}", i)
            } else {
                format!("Daily summary #{}", i)
            }
        })
        .collect();

    let runs = inputs.iter().enumerate().map(|(i, input)| {
        let flow = flow.clone();
        async move {
            flow.run(input, &InvokeConfig::new(format!("session:c{}", i)))
                .await
                .unwrap()
        }
    });
    let states = futures::future::join_all(runs).await;

    for (i, state) in states.iter().enumerate() {
        assert_eq!(state.raw_input.as_deref(), Some(inputs[i].as_str()));
        let expected = if i % 2 == 0 {
            TaskKind::ProcessInbox
        } else {
            TaskKind::DailySummary
        };
        assert_eq!(state.task, Some(expected));
        assert!(state.result.as_ref().unwrap()["output"]
            .as_str()
            .unwrap()
            .ends_with(inputs[i].as_str()));

        let checkpoint = stores
            .checkpoints
            .load(&format!("session:c{}", i))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&checkpoint.state, state);
    }

    let run_ids: std::collections::HashSet<_> = states.iter().map(|s| s.run_id).collect();
    assert_eq!(run_ids.len(), 8);
}

#[tokio::test]
async fn test_sqlite_stores_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inbox_flow.db");

    let state = {
        let stores = Stores::sqlite(Arc::new(Database::open(&path).unwrap()));
        let flow = flow_with(Arc::new(EchoExecutor::default()), stores);
        flow.run("Give me a daily summary", &InvokeConfig::new("session:disk"))
            .await
            .unwrap()
    };

    let reopened = Stores::sqlite(Arc::new(Database::open(&path).unwrap()));
    let checkpoint = reopened
        .checkpoints
        .load("session:disk")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(checkpoint.state, state);
    assert_eq!(checkpoint.completed_node, "daily_summary");

    let record = reopened
        .ledger
        .get(state.run_id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.result, state.result);

    // A second invocation on the reopened stores does not re-execute
    let executor = Arc::new(EchoExecutor::default());
    let flow = flow_with(executor.clone(), reopened);
    let again = flow
        .run("anything", &InvokeConfig::new("session:disk"))
        .await
        .unwrap();
    assert_eq!(again, state);
    assert_eq!(executor.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_sqlite_terminal_update_is_idempotent() {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let stores = Stores::sqlite(db);
    let run_id = stores.ledger.create(Some("session:idem"), None).await.unwrap();
    let result = json!({"agent": "gmail_agent", "output": "done"});

    stores
        .ledger
        .update_status(run_id, RunStatus::Completed, Some(&result))
        .await
        .unwrap();
    let once = stores.ledger.get(run_id).await.unwrap().unwrap();
    stores
        .ledger
        .update_status(run_id, RunStatus::Completed, Some(&result))
        .await
        .unwrap();
    let twice = stores.ledger.get(run_id).await.unwrap().unwrap();

    assert_eq!(once, twice);
}
