// Dispatcher tests - model tool calls through the normalizer to a fake worker.

#[path = "../support/mod.rs"]
mod support;

use graphbees_core::domain::solver::{SolverBridge, SolverErrorKind};
use graphbees_core::tools::{ToolDispatcher, ToolFailure};
use graphbees_core::types::ToolCallRequest;
use serde_json::{Value, json};
use std::sync::Arc;
use support::{FakeLauncher, Reply, runtime, worker};

fn dispatcher(launcher: Arc<FakeLauncher>) -> ToolDispatcher {
    let bridge: Arc<dyn SolverBridge> = runtime(launcher);
    ToolDispatcher::new(bridge)
}

fn knapsack_worker() -> Arc<FakeLauncher> {
    worker(|algorithm, _| match algorithm {
        "ptas_knapsack" | "exact_knapsack" => {
            Reply::Result(json!({"objective": 7, "selected": [1, 2]}))
        }
        other => Reply::Error(-32601, format!("unexpected {other}")),
    })
}

#[tokio::test]
async fn unknown_tools_fail_without_starting_the_worker() {
    let launcher = knapsack_worker();
    let log = dispatcher(launcher.clone())
        .dispatch("nonexistent_tool", json!({}))
        .await;

    assert!(matches!(
        log.failure(),
        Some(ToolFailure::UnknownTool { name }) if name == "nonexistent_tool"
    ));
    assert!(log.meta.is_none());
    assert!(log.elapsed_s >= 0.0);
    assert_eq!(launcher.launch_count(), 0);
}

#[tokio::test]
async fn invalid_arguments_fail_without_starting_the_worker() {
    let launcher = knapsack_worker();
    let log = dispatcher(launcher.clone())
        .dispatch("max_coverage", json!({"subsets": [[0, 1]]}))
        .await;

    match log.failure() {
        Some(ToolFailure::ValidationError { field, message }) => {
            assert_eq!(field, "k");
            assert_eq!(message, "is required");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(launcher.launch_count(), 0);
}

#[tokio::test]
async fn knapsack_call_round_trips_through_the_worker() {
    let dispatcher = dispatcher(knapsack_worker());
    let call = ToolCallRequest {
        id: "call_1".into(),
        name: "ptas_knapsack".into(),
        arguments: json!({"weights": [2, 3, 4], "values": [3, 4, 5], "capacity": 5}),
    };

    let log = dispatcher.dispatch_call(&call).await;

    assert!(log.is_success(), "{:?}", log.failure());
    assert_eq!(log.call_id.as_deref(), Some("call_1"));
    assert_eq!(log.threads, Some(4));
    let value = log.value().expect("value");
    assert_eq!(value["items"], json!([0, 1]));
    assert!(value["total_weight"].as_u64().is_some_and(|weight| weight <= 5));

    let meta = log.meta.as_ref().expect("catalog entry");
    assert_eq!(meta.guarantee, "(1+ε)-approximation");

    let content: Value = serde_json::from_str(&log.model_content()).expect("json content");
    assert_eq!(content["value"]["value"], 7);
    assert_eq!(content["guarantee"], "(1+ε)-approximation");
    assert!(content["elapsed_s"].as_f64().is_some());
}

#[tokio::test]
async fn worker_errors_are_reported_as_solver_failures() {
    let dispatcher = dispatcher(worker(|_, _| {
        Reply::Error(-32000, "DomainError: infeasible".into())
    }));
    let log = dispatcher
        .dispatch("max_coverage", json!({"subsets": [[0, 1], [2]], "k": 1}))
        .await;

    match log.failure() {
        Some(ToolFailure::SolverExecutionError { reason, message }) => {
            assert_eq!(*reason, SolverErrorKind::Runtime);
            assert!(message.contains("DomainError"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let content: Value = serde_json::from_str(&log.model_content()).expect("json content");
    assert!(content.get("error").is_some());
}

#[tokio::test]
async fn logs_serialize_with_status_and_summary() {
    let dispatcher = dispatcher(knapsack_worker());
    let log = dispatcher
        .dispatch(
            "exact_knapsack",
            json!({"weights": [2, 3, 4], "values": [3, 4, 5], "capacity": 5}),
        )
        .await;

    let encoded = serde_json::to_value(&log).expect("serializes");
    assert_eq!(encoded["status"], "success");
    assert_eq!(encoded["tool"], "exact_knapsack");
    assert!(encoded["input_summary"].as_str().is_some_and(|s| s.contains("capacity=5")));
    assert!(encoded["started_at"].as_str().is_some());
}

#[tokio::test]
async fn repeated_failure_log_skips_the_worker() {
    let launcher = knapsack_worker();
    let dispatcher = dispatcher(launcher.clone());
    let call = ToolCallRequest {
        id: "call_2".into(),
        name: "bin_packing".into(),
        arguments: json!({"items": [1], "bin_capacity": 2}),
    };
    let previous = ToolFailure::SolverExecutionError {
        reason: SolverErrorKind::Timeout,
        message: "solve timed out after 5s".into(),
    };

    let log = dispatcher.repeated_failure(&call, &previous);

    match log.failure() {
        Some(ToolFailure::SolverExecutionError { reason, message }) => {
            assert_eq!(*reason, SolverErrorKind::Timeout);
            assert!(message.contains("not retried"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(launcher.launch_count(), 0);
}
