use super::error::RuntimeError;
use super::launcher::{BoxedReader, BoxedWriter, WorkerStreams};
use super::protocol::{LogParams, METHOD_NOT_FOUND};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::Child;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tracing::{debug, error, info, trace, warn};

type Responder = oneshot::Sender<Result<Value, RuntimeError>>;

/// JSON-RPC client over a worker's line-delimited byte streams.
///
/// A background task reads replies and routes them to waiting requests by
/// id. Replies whose requester has gone away are dropped.
#[derive(Clone)]
pub struct WorkerConnection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    writer: AsyncMutex<Option<BufWriter<BoxedWriter>>>,
    pending: Mutex<HashMap<String, Responder>>,
    child: AsyncMutex<Option<Child>>,
    id_counter: AtomicU64,
    closed: AtomicBool,
}

impl WorkerConnection {
    pub fn start(streams: WorkerStreams) -> Self {
        let inner = Arc::new(ConnectionInner {
            writer: AsyncMutex::new(Some(BufWriter::new(streams.writer))),
            pending: Mutex::new(HashMap::new()),
            child: AsyncMutex::new(streams.child),
            id_counter: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });

        let reader_inner = Arc::clone(&inner);
        tokio::spawn(async move {
            reader_inner.reader_loop(streams.reader).await;
        });

        Self { inner }
    }

    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RuntimeError> {
        self.inner.send_request(method, params).await
    }

    pub async fn notify(&self, method: &str, params: Value) -> Result<(), RuntimeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params
        });
        self.inner.write_message(&payload).await
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Stops the worker and fails every outstanding request.
    pub async fn shutdown(&self) {
        self.inner.reset().await;
    }
}

/// Removes a request from the pending table when its future is dropped.
struct PendingSlot<'a> {
    pending: &'a Mutex<HashMap<String, Responder>>,
    id: String,
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        lock(self.pending).remove(&self.id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ConnectionInner {
    async fn send_request(&self, method: &str, params: Value) -> Result<Value, RuntimeError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RuntimeError::Terminated);
        }

        let id = self.next_id();
        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id.clone(), tx);
        let _slot = PendingSlot {
            pending: &self.pending,
            id: id.clone(),
        };

        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params
        });
        debug!(id = %id, method, "Sending request to solver worker");
        self.write_message(&payload).await?;

        match rx.await {
            Ok(Ok(value)) => Ok(value.get("result").cloned().unwrap_or(Value::Null)),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(RuntimeError::Cancelled),
        }
    }

    async fn reader_loop(self: Arc<Self>, reader: BoxedReader) {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(raw)) => {
                    let trimmed = raw.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Value>(trimmed) {
                        Ok(value) => {
                            if let Err(err) = self.process_inbound_message(value).await {
                                warn!(%err, "failed to process message from solver worker");
                            }
                        }
                        Err(source) => {
                            // Package managers occasionally print to stdout.
                            warn!(line = trimmed, %source, "ignoring non-JSON line from solver worker");
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(%err, "failed to read from solver worker");
                    break;
                }
            }
        }

        info!("Solver worker closed its output");
        self.reset().await;
    }

    async fn process_inbound_message(&self, value: Value) -> Result<(), RuntimeError> {
        match (value.get("id").cloned(), value.get("method").is_some()) {
            (Some(id), true) => self.handle_worker_request(id, value).await,
            (Some(id), false) => {
                self.handle_response(id, value);
                Ok(())
            }
            (None, true) => {
                self.handle_notification(value);
                Ok(())
            }
            (None, false) => Ok(()),
        }
    }

    fn handle_response(&self, id: Value, value: Value) {
        let Some(key) = response_key(&id) else {
            return;
        };
        let Some(sender) = lock(&self.pending).remove(&key) else {
            debug!(response_id = key, "discarding reply for abandoned request");
            return;
        };

        let outcome = match value.get("error") {
            Some(error) => Err(match error.as_object() {
                Some(err) => RuntimeError::Remote {
                    code: err.get("code").and_then(Value::as_i64).unwrap_or(-32000),
                    message: err
                        .get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string(),
                },
                None => RuntimeError::protocol("malformed error payload in response"),
            }),
            None => Ok(value),
        };
        let _ = sender.send(outcome);
    }

    async fn handle_worker_request(&self, id: Value, value: Value) -> Result<(), RuntimeError> {
        let method = value
            .get("method")
            .and_then(Value::as_str)
            .unwrap_or_default();
        match method {
            "ping" => self.send_response(id, json!({})).await,
            other => {
                warn!(method = other, "solver worker sent unsupported request");
                let error = json!({
                    "code": METHOD_NOT_FOUND,
                    "message": format!("client does not implement method '{other}'"),
                });
                self.send_error(id, error).await
            }
        }
    }

    fn handle_notification(&self, value: Value) {
        let method = value.get("method").and_then(Value::as_str).unwrap_or("");
        if method != "log" {
            debug!(method, "received notification from solver worker");
            return;
        }
        let params = value.get("params").cloned().unwrap_or(Value::Null);
        match serde_json::from_value::<LogParams>(params) {
            Ok(log) => match log.level.to_ascii_lowercase().as_str() {
                "error" => error!(target: "graphbees::worker", "{}", log.message),
                "warn" | "warning" => warn!(target: "graphbees::worker", "{}", log.message),
                "debug" => debug!(target: "graphbees::worker", "{}", log.message),
                "trace" => trace!(target: "graphbees::worker", "{}", log.message),
                _ => info!(target: "graphbees::worker", "{}", log.message),
            },
            Err(err) => debug!(%err, "malformed log notification from solver worker"),
        }
    }

    async fn send_response(&self, id: Value, result: Value) -> Result<(), RuntimeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "result": result
        });
        self.write_message(&payload).await
    }

    async fn send_error(&self, id: Value, error: Value) -> Result<(), RuntimeError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": error
        });
        self.write_message(&payload).await
    }

    async fn write_message(&self, message: &Value) -> Result<(), RuntimeError> {
        let mut encoded = serde_json::to_string(message)
            .map_err(|source| RuntimeError::InvalidJson { source })?;
        encoded.push('\n');

        let mut writer = self.writer.lock().await;
        let stream = writer.as_mut().ok_or(RuntimeError::Terminated)?;
        stream
            .write_all(encoded.as_bytes())
            .await
            .map_err(|err| RuntimeError::transport(err.to_string()))?;
        stream
            .flush()
            .await
            .map_err(|err| RuntimeError::transport(err.to_string()))?;
        Ok(())
    }

    async fn reset(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.writer.lock().await.take();

        if let Some(mut child) = self.child.lock().await.take() {
            if let Err(err) = child.kill().await {
                debug!(%err, "failed to kill solver worker (may have already exited)");
            }
            let _ = child.wait().await;
        }

        let drained: Vec<Responder> = lock(&self.pending).drain().map(|(_, tx)| tx).collect();
        for sender in drained {
            let _ = sender.send(Err(RuntimeError::Terminated));
        }
    }

    fn next_id(&self) -> String {
        let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
        format!("req-{id}")
    }
}

fn response_key(id: &Value) -> Option<String> {
    match id {
        Value::String(value) => Some(value.clone()),
        Value::Number(num) => Some(num.to_string()),
        _ => None,
    }
}
