// Agent loop tests - full turns against a scripted model and an in-memory worker.

#[path = "../support/mod.rs"]
mod support;

use async_trait::async_trait;
use graphbees_core::agent::{Agent, AgentOptions, AgentSettings, FinishReason};
use graphbees_core::domain::solver::SolverBridge;
use graphbees_core::model::{ModelError, ModelProvider, ModelRequest, ModelResponse};
use graphbees_core::tools::ToolDispatcher;
use graphbees_core::types::{MessageRole, ToolCallRequest};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use support::{FakeLauncher, Reply, runtime, worker};
use tokio::sync::Mutex;

/// Plays back `script`, then repeats its last entry forever.
struct LoopingModel {
    script: Mutex<Vec<ModelResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl LoopingModel {
    fn new(script: Vec<ModelResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ModelProvider for LoopingModel {
    async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
        self.requests.lock().await.push(request);
        let mut script = self.script.lock().await;
        match script.len() {
            0 => Err(ModelError::invalid_response("looping", "empty script")),
            1 => Ok(script[0].clone()),
            _ => Ok(script.remove(0)),
        }
    }
}

fn call(id: &str, name: &str, arguments: Value) -> ToolCallRequest {
    ToolCallRequest {
        id: id.into(),
        name: name.into(),
        arguments,
    }
}

fn agent(model: Arc<LoopingModel>, launcher: Arc<FakeLauncher>, max_rounds: usize) -> Agent<LoopingModel> {
    let bridge: Arc<dyn SolverBridge> = runtime(launcher);
    Agent::new(
        model,
        ToolDispatcher::new(bridge),
        AgentSettings {
            provider: "looping".into(),
            model: "test".into(),
            max_tokens: None,
            max_rounds,
            system_prompt: "use the tools".into(),
        },
    )
}

fn graph_worker() -> Arc<FakeLauncher> {
    worker(|algorithm, input| match algorithm {
        "pagerank" => {
            let nodes = input["node_count"].as_u64().unwrap_or(0) as usize;
            Reply::Result(json!({"scores": vec![1.0 / nodes as f64; nodes]}))
        }
        "k_core_decomposition" => Reply::Result(json!({"core_numbers": [[1, 1], [2, 1]]})),
        other => Reply::Error(-32601, format!("unexpected {other}")),
    })
}

#[tokio::test]
async fn model_that_never_stops_calling_tools_is_cut_off() {
    let model = LoopingModel::new(vec![ModelResponse::with_tool_calls(
        String::new(),
        vec![call("again", "pagerank", json!({"edges": [[0, 1], [1, 2]]}))],
    )]);
    let agent = agent(model.clone(), graph_worker(), 2);
    let mut conversation = agent.new_conversation();

    let outcome = agent
        .run_turn(&mut conversation, "rank forever", &AgentOptions::default())
        .await
        .expect("turn ends");

    assert_eq!(outcome.finish, FinishReason::RoundLimit);
    assert_eq!(outcome.rounds, 2);
    assert_eq!(outcome.tool_logs.len(), 2);
    assert!(outcome.tool_logs.iter().all(|log| log.is_success()));
    assert_eq!(model.requests.lock().await.len(), 2);
    assert!(!outcome.answer.is_empty());
}

#[tokio::test]
async fn tool_results_are_fed_back_in_call_order() {
    let model = LoopingModel::new(vec![
        ModelResponse::with_tool_calls(
            String::new(),
            vec![
                call("a", "k_core_decomposition", json!({"edges": [[0, 1]]})),
                call("b", "pagerank", json!({"edges": [[0, 1], [1, 2]]})),
            ],
        ),
        ModelResponse::new("Node 1 is most central.".to_string()),
    ]);
    let agent = agent(model.clone(), graph_worker(), 4);
    let mut conversation = agent.new_conversation();

    let outcome = agent
        .run_turn(&mut conversation, "analyse my graph", &AgentOptions::default())
        .await
        .expect("answered");

    assert_eq!(outcome.finish, FinishReason::Answered);
    assert_eq!(outcome.answer, "Node 1 is most central.");
    let tools: Vec<&str> = outcome.tool_logs.iter().map(|log| log.tool.as_str()).collect();
    assert_eq!(tools, ["k_core_decomposition", "pagerank"]);

    let requests = model.requests.lock().await;
    let tool_messages: Vec<_> = requests[1]
        .messages
        .iter()
        .filter(|message| message.role == MessageRole::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 2);
    assert_eq!(tool_messages[0].tool_call_id.as_deref(), Some("a"));
    assert_eq!(tool_messages[1].tool_call_id.as_deref(), Some("b"));
    assert!(!requests[0].tools.is_empty());

    assert_eq!(
        conversation.last_assistant().map(|m| m.content.as_str()),
        Some("Node 1 is most central.")
    );
}

#[tokio::test(start_paused = true)]
async fn cancelled_turn_leaves_conversation_untouched() {
    let model = LoopingModel::new(vec![ModelResponse::with_tool_calls(
        String::new(),
        vec![call("slow", "pagerank", json!({"edges": [[0, 1]]}))],
    )]);
    let agent = agent(model, worker(|_, _| Reply::Silent), 3);
    let mut conversation = agent.new_conversation();
    let before = conversation.len();

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        agent.run_turn(&mut conversation, "this will be interrupted", &AgentOptions::default()),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(conversation.len(), before);
}
