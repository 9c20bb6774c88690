use super::input::ToolInput;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Why a solver call did not produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverErrorKind {
    /// The algorithm itself raised inside the worker.
    Runtime,
    Timeout,
    /// The worker could not be started or has gone away.
    Unavailable,
    /// The worker answered with something we could not decode.
    Protocol,
}

impl SolverErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SolverErrorKind::Runtime => "runtime",
            SolverErrorKind::Timeout => "timeout",
            SolverErrorKind::Unavailable => "unavailable",
            SolverErrorKind::Protocol => "protocol",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{tool} failed ({}): {message}", .kind.as_str())]
pub struct SolverError {
    pub tool: String,
    pub kind: SolverErrorKind,
    pub message: String,
}

impl SolverError {
    pub fn new(tool: impl Into<String>, kind: SolverErrorKind, message: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            kind,
            message: message.into(),
        }
    }
}

/// What the worker reported during its handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeInfo {
    pub runtime_version: String,
    pub threads: usize,
    #[serde(default)]
    pub packages: Vec<String>,
}

/// Executes normalized tool inputs.
///
/// Implemented by the worker-backed runtime; tests substitute stubs.
#[async_trait]
pub trait SolverBridge: Send + Sync {
    async fn solve(&self, input: &ToolInput) -> Result<Value, SolverError>;

    /// `None` until the runtime has been initialized.
    fn runtime_info(&self) -> Option<RuntimeInfo>;
}
