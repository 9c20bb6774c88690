// Solver runtime tests - lifecycle and marshalling against an in-memory worker.

#[path = "../support/mod.rs"]
mod support;

use graphbees_core::domain::solver::{SolverBridge, SolverErrorKind};
use graphbees_core::domain::tools::ToolKind;
use graphbees_core::runtime::RuntimeError;
use graphbees_core::tools::normalize;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use support::{FakeLauncher, Reply, initialize_reply, runtime, worker};

#[tokio::test]
async fn concurrent_first_calls_start_one_worker() {
    let launcher = worker(|_, _| Reply::Result(json!({"scores": [0.5, 0.5]})));
    let runtime = runtime(launcher.clone());

    let results = futures::future::join_all((0..8).map(|_| runtime.init())).await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(launcher.launch_count(), 1);
    let info = runtime.info().expect("initialized");
    assert_eq!(info.runtime_version, "1.12.1");
    assert_eq!(info.threads, 4);
}

#[tokio::test(start_paused = true)]
async fn concurrent_solves_reach_the_worker_one_at_a_time() {
    let launcher = worker(|_, _| {
        Reply::After(Duration::from_millis(50), json!({"scores": [0.5, 0.5]}))
    });
    let runtime = runtime(launcher.clone());
    let input = normalize(ToolKind::Pagerank, &json!({"edges": [[0, 1]]})).expect("valid");

    let results = futures::future::join_all((0..4).map(|_| runtime.solve(&input))).await;

    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert_eq!(launcher.launch_count(), 1);
    assert_eq!(launcher.peak_in_flight(), 1);
}

#[tokio::test]
async fn handshake_sends_protocol_and_packages() {
    let seen = Arc::new(Mutex::new(Value::Null));
    let captured = seen.clone();
    let launcher = FakeLauncher::new(move |method, params| {
        if method == "initialize" {
            *captured.lock().expect("lock") = params.clone();
        }
        initialize_reply("1.12.0")
    });
    let runtime = runtime(launcher);

    runtime.init().await.expect("init");

    let params = seen.lock().expect("lock").clone();
    assert_eq!(params["protocol_version"], "graphbees-worker/1");
    assert_eq!(params["threads"], "auto");
    assert!(
        params["packages"]
            .as_array()
            .is_some_and(|packages| packages.iter().any(|p| p == "JuliAlg"))
    );
}

#[tokio::test]
async fn old_runtime_is_rejected_and_retried_on_next_call() {
    let launcher = FakeLauncher::new(|method, _| match method {
        "initialize" => initialize_reply("1.10.4"),
        _ => Reply::Error(-32601, "unexpected".into()),
    });
    let runtime = runtime(launcher.clone());

    let err = runtime.init().await.unwrap_err();
    assert!(matches!(
        &err,
        RuntimeError::UnsupportedVersion { found, required }
            if found == "1.10.4" && required == "1.12.0"
    ));
    assert!(err.is_initialization());
    assert!(err.user_message().contains("1.12.0"));
    assert!(runtime.info().is_none());

    assert!(runtime.init().await.is_err());
    assert_eq!(launcher.launch_count(), 2);
}

#[tokio::test]
async fn mismatched_protocol_fails_handshake() {
    let launcher = FakeLauncher::new(|_, _| {
        Reply::Result(json!({
            "protocol_version": "graphbees-worker/0",
            "runtime_version": "1.12.1",
            "threads": 1,
        }))
    });
    let err = runtime(launcher).init().await.unwrap_err();
    assert!(matches!(err, RuntimeError::Handshake { .. }));
}

#[tokio::test(start_paused = true)]
async fn silent_handshake_times_out_as_handshake_error() {
    let launcher = FakeLauncher::new(|_, _| Reply::Silent);
    let err = runtime(launcher).init().await.unwrap_err();
    assert!(matches!(err, RuntimeError::Handshake { .. }));
    assert!(err.to_string().contains("timed out"));
}

#[tokio::test(start_paused = true)]
async fn silent_solve_reports_timeout() {
    let runtime = runtime(worker(|_, _| Reply::Silent));
    let input = normalize(ToolKind::Pagerank, &json!({"edges": [[0, 1], [1, 2]]})).expect("valid");

    let err = runtime.solve(&input).await.unwrap_err();

    assert_eq!(err.kind, SolverErrorKind::Timeout);
    assert_eq!(err.tool, "pagerank");
}

#[tokio::test]
async fn worker_exceptions_become_runtime_failures() {
    let runtime = runtime(worker(|_, _| {
        Reply::Error(-32000, "BoundsError: attempt to access 3-element Vector".into())
    }));
    let input = normalize(
        ToolKind::MaxCoverage,
        &json!({"subsets": [[0, 1], [1, 2]], "k": 1}),
    )
    .expect("valid");

    let err = runtime.solve(&input).await.unwrap_err();

    assert_eq!(err.kind, SolverErrorKind::Runtime);
    assert!(err.message.contains("BoundsError"));
}

#[tokio::test]
async fn invalid_params_are_protocol_failures() {
    let runtime = runtime(worker(|_, _| Reply::Error(-32602, "bad input".into())));
    let input = normalize(ToolKind::KCoreDecomposition, &json!({"edges": [[0, 1]]})).expect("valid");
    let err = runtime.solve(&input).await.unwrap_err();
    assert_eq!(err.kind, SolverErrorKind::Protocol);
}

#[tokio::test]
async fn k_core_request_is_one_based_and_reply_is_shifted_back() {
    let sent = Arc::new(Mutex::new(Value::Null));
    let captured = sent.clone();
    let runtime = runtime(worker(move |algorithm, input| {
        assert_eq!(algorithm, "k_core_decomposition");
        *captured.lock().expect("lock") = input.clone();
        Reply::Result(json!({"core_numbers": [[1, 2], [2, 2], [3, 2], [4, 1]]}))
    }));
    let input = normalize(
        ToolKind::KCoreDecomposition,
        &json!({"edges": [[0, 1], [1, 2], [0, 2], [2, 3]]}),
    )
    .expect("valid");

    let value = runtime.solve(&input).await.expect("solved");

    let wire = sent.lock().expect("lock").clone();
    assert_eq!(wire["node_count"], 4);
    assert_eq!(wire["edges"], json!([[1, 2], [2, 3], [1, 3], [3, 4]]));
    assert_eq!(value, json!([[0, 2], [1, 2], [2, 2], [3, 1]]));
}

#[tokio::test]
async fn knapsack_selection_maps_back_to_items() {
    let runtime = runtime(worker(|algorithm, input| {
        assert_eq!(algorithm, "ptas_knapsack");
        assert_eq!(input["weights"], json!([2, 3, 4]));
        Reply::Result(json!({"objective": 7, "selected": [1, 2]}))
    }));
    let input = normalize(
        ToolKind::PtasKnapsack,
        &json!({"weights": [2, 3, 4], "values": [3, 4, 5], "capacity": 5}),
    )
    .expect("valid");

    let value = runtime.solve(&input).await.expect("solved");

    assert_eq!(value["value"], 7);
    assert_eq!(value["items"], json!([0, 1]));
    assert_eq!(value["total_weight"], 5);
    assert!(value.get("selected_labels").is_none());
}

#[tokio::test]
async fn runtime_info_is_reported_after_first_solve() {
    let runtime = runtime(worker(|_, _| Reply::Result(json!({"scores": [1.0, 0.0]}))));
    assert!(runtime.runtime_info().is_none());

    let input = normalize(
        ToolKind::BetweennessCentrality,
        &json!({"edges": [[0, 1]]}),
    )
    .expect("valid");
    runtime.solve(&input).await.expect("solved");

    assert_eq!(runtime.runtime_info().map(|info| info.threads), Some(4));
    runtime.shutdown().await;
}
