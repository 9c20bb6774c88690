use super::connection::WorkerConnection;
use super::error::RuntimeError;
use super::launcher::{ProcessLauncher, WorkerLauncher};
use super::protocol::{
    InitializeParams, InitializeResult, METHOD_INITIALIZE, METHOD_SHUTDOWN, METHOD_SOLVE,
    PROTOCOL_VERSION, REQUIRED_PACKAGES,
};
use crate::config::RuntimeConfig;
use crate::config::runtime::version_at_least;
use crate::domain::solver::RuntimeInfo;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OnceCell};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Process-wide owner of the solver worker.
///
/// The worker is started on first use (or by [`SolverRuntime::init`]) and
/// kept for the lifetime of the runtime. Calls are serialized through a
/// single gate because the worker executes one request at a time.
pub struct SolverRuntime {
    config: RuntimeConfig,
    launcher: Arc<dyn WorkerLauncher>,
    handle: OnceCell<RuntimeHandle>,
    gate: AsyncMutex<()>,
}

struct RuntimeHandle {
    connection: WorkerConnection,
    info: RuntimeInfo,
}

impl SolverRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self::with_launcher(config, Arc::new(ProcessLauncher))
    }

    pub fn with_launcher(config: RuntimeConfig, launcher: Arc<dyn WorkerLauncher>) -> Self {
        Self {
            config,
            launcher,
            handle: OnceCell::new(),
            gate: AsyncMutex::new(()),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Starts the worker if needed. Concurrent callers share one start; a
    /// failed start caches nothing, so the next call tries again.
    pub async fn init(&self) -> Result<&RuntimeInfo, RuntimeError> {
        Ok(&self.handle().await?.info)
    }

    pub fn info(&self) -> Option<&RuntimeInfo> {
        self.handle.get().map(|handle| &handle.info)
    }

    /// Sends one `solve` request and returns the worker's raw reply.
    pub async fn solve_raw(&self, params: Value) -> Result<Value, RuntimeError> {
        let handle = self.handle().await?;
        let _turn = self.gate.lock().await;
        let algorithm = params
            .get("algorithm")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        debug!(algorithm = %algorithm, "Dispatching solve request");

        bounded(
            "solve",
            self.config.call_timeout,
            handle.connection.request(METHOD_SOLVE, params),
        )
        .await
    }

    /// Asks the worker to exit and closes the connection.
    pub async fn shutdown(&self) {
        let Some(handle) = self.handle.get() else {
            return;
        };
        if !handle.connection.is_closed() {
            if let Err(err) = handle.connection.notify(METHOD_SHUTDOWN, json!({})).await {
                debug!(%err, "failed to send shutdown notification");
            }
        }
        handle.connection.shutdown().await;
    }

    async fn handle(&self) -> Result<&RuntimeHandle, RuntimeError> {
        self.handle.get_or_try_init(|| self.start()).await
    }

    async fn start(&self) -> Result<RuntimeHandle, RuntimeError> {
        let streams = self.launcher.launch(&self.config).await?;
        let connection = WorkerConnection::start(streams);

        match self.handshake(&connection).await {
            Ok(info) => {
                info!(
                    runtime_version = %info.runtime_version,
                    threads = info.threads,
                    "Solver runtime ready"
                );
                Ok(RuntimeHandle { connection, info })
            }
            Err(err) => {
                warn!(%err, "Solver runtime initialization failed");
                connection.shutdown().await;
                Err(err)
            }
        }
    }

    async fn handshake(&self, connection: &WorkerConnection) -> Result<RuntimeInfo, RuntimeError> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION,
            threads: self.config.threads.to_json(),
            packages: &REQUIRED_PACKAGES,
        };
        let params =
            serde_json::to_value(&params).map_err(|source| RuntimeError::InvalidJson { source })?;

        let reply = bounded(
            "initialize",
            self.config.init_timeout,
            connection.request(METHOD_INITIALIZE, params),
        )
        .await
        .map_err(into_handshake_error)?;

        let parsed: InitializeResult =
            serde_json::from_value(reply).map_err(|err| RuntimeError::Handshake {
                message: format!("unexpected initialize reply: {err}"),
            })?;
        if let Some(version) = parsed.protocol_version.as_deref() {
            if version != PROTOCOL_VERSION {
                return Err(RuntimeError::Handshake {
                    message: format!("worker speaks {version}, expected {PROTOCOL_VERSION}"),
                });
            }
        }
        if !version_at_least(&parsed.info.runtime_version, &self.config.min_version) {
            return Err(RuntimeError::UnsupportedVersion {
                found: parsed.info.runtime_version,
                required: self.config.min_version.clone(),
            });
        }
        Ok(parsed.info)
    }
}

async fn bounded<F>(operation: &'static str, limit: Duration, call: F) -> Result<Value, RuntimeError>
where
    F: std::future::Future<Output = Result<Value, RuntimeError>>,
{
    timeout(limit, call)
        .await
        .map_err(|_| RuntimeError::Timeout {
            operation,
            seconds: limit.as_secs(),
        })?
}

fn into_handshake_error(err: RuntimeError) -> RuntimeError {
    if err.is_initialization() {
        err
    } else {
        RuntimeError::Handshake {
            message: err.to_string(),
        }
    }
}
