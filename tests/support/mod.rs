// In-memory solver worker speaking the line-delimited JSON-RPC protocol.

#![allow(dead_code)]

use async_trait::async_trait;
use graphbees_core::config::RuntimeConfig;
use graphbees_core::runtime::{RuntimeError, SolverRuntime, WorkerLauncher, WorkerStreams};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, WriteHalf};
use tokio::sync::Mutex as AsyncMutex;

/// How the fake worker answers one request.
pub enum Reply {
    Result(Value),
    Error(i64, String),
    /// Answers with `Result` once the delay has passed.
    After(Duration, Value),
    /// Never answers.
    Silent,
}

pub type Behaviour = Arc<dyn Fn(&str, &Value) -> Reply + Send + Sync>;

/// `solve` requests received but not yet answered.
#[derive(Default)]
pub struct InFlight {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlight {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct FakeLauncher {
    pub launches: AtomicUsize,
    behaviour: Behaviour,
    in_flight: Arc<InFlight>,
}

impl FakeLauncher {
    pub fn new(behaviour: impl Fn(&str, &Value) -> Reply + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            launches: AtomicUsize::new(0),
            behaviour: Arc::new(behaviour),
            in_flight: Arc::new(InFlight::default()),
        })
    }

    pub fn launch_count(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// Highest number of `solve` requests the worker held at once.
    pub fn peak_in_flight(&self) -> usize {
        self.in_flight.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkerLauncher for FakeLauncher {
    async fn launch(&self, _config: &RuntimeConfig) -> Result<WorkerStreams, RuntimeError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        let (client, worker) = tokio::io::duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(client);
        tokio::spawn(serve(worker, self.behaviour.clone(), self.in_flight.clone()));
        Ok(WorkerStreams {
            reader: Box::new(reader),
            writer: Box::new(writer),
            child: None,
        })
    }
}

type SharedWriter = Arc<AsyncMutex<WriteHalf<DuplexStream>>>;

/// Answers every request from its own task so that pipelined requests
/// overlap the way they would in a worker that does not wait for the client.
async fn serve(stream: DuplexStream, behaviour: Behaviour, in_flight: Arc<InFlight>) {
    let (reader, writer) = tokio::io::split(stream);
    let writer: SharedWriter = Arc::new(AsyncMutex::new(writer));
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(message) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        let (Some(id), Some(method)) = (message.get("id").cloned(), message["method"].as_str())
        else {
            continue;
        };
        let solving = method == "solve";
        if solving {
            in_flight.enter();
        }
        let params = message.get("params").cloned().unwrap_or(Value::Null);
        let reply = behaviour(method, &params);
        let writer = writer.clone();
        let in_flight = in_flight.clone();
        tokio::spawn(async move {
            let response = match reply {
                Reply::Result(result) => json!({"jsonrpc": "2.0", "id": id, "result": result}),
                Reply::Error(code, text) => {
                    json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": text}})
                }
                Reply::After(delay, result) => {
                    tokio::time::sleep(delay).await;
                    json!({"jsonrpc": "2.0", "id": id, "result": result})
                }
                Reply::Silent => return,
            };
            if solving {
                in_flight.leave();
            }
            let mut encoded = response.to_string();
            encoded.push('\n');
            let _ = writer.lock().await.write_all(encoded.as_bytes()).await;
        });
    }
}

pub fn initialize_reply(version: &str) -> Reply {
    Reply::Result(json!({
        "protocol_version": "graphbees-worker/1",
        "runtime_version": version,
        "threads": 4,
        "packages": ["JuliAlg", "Graphs", "JuMP", "HiGHS"],
    }))
}

/// Healthy worker that hands every `solve` to `solve`.
pub fn worker(
    solve: impl Fn(&str, &Value) -> Reply + Send + Sync + 'static,
) -> Arc<FakeLauncher> {
    FakeLauncher::new(move |method, params| match method {
        "initialize" => initialize_reply("1.12.1"),
        "solve" => solve(
            params["algorithm"].as_str().unwrap_or_default(),
            &params["input"],
        ),
        _ => Reply::Error(-32601, format!("unknown method {method}")),
    })
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        call_timeout: Duration::from_secs(5),
        init_timeout: Duration::from_secs(5),
        ..RuntimeConfig::default()
    }
}

pub fn runtime(launcher: Arc<FakeLauncher>) -> Arc<SolverRuntime> {
    Arc::new(SolverRuntime::with_launcher(runtime_config(), launcher))
}
