use crate::domain::solver::SolverErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("failed to launch solver worker '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("solver worker handshake failed: {message}")]
    Handshake { message: String },
    #[error("solver runtime {found} is older than the required {required}")]
    UnsupportedVersion { found: String, required: String },
    #[error("solver worker transport error: {message}")]
    Transport { message: String },
    #[error("solver worker sent invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },
    #[error("solver worker protocol error: {message}")]
    Protocol { message: String },
    #[error("solver worker returned JSON-RPC error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("solver worker terminated unexpectedly")]
    Terminated,
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        operation: &'static str,
        seconds: u64,
    },
    #[error("solver request cancelled")]
    Cancelled,
}

impl RuntimeError {
    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Launch, handshake and version failures. Fatal during startup warm-up.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            RuntimeError::Launch { .. }
                | RuntimeError::Handshake { .. }
                | RuntimeError::UnsupportedVersion { .. }
        )
    }

    pub fn solver_kind(&self) -> SolverErrorKind {
        match self {
            RuntimeError::Remote { code, .. } if is_protocol_code(*code) => {
                SolverErrorKind::Protocol
            }
            RuntimeError::Remote { .. } => SolverErrorKind::Runtime,
            RuntimeError::Timeout { .. } => SolverErrorKind::Timeout,
            RuntimeError::InvalidJson { .. } | RuntimeError::Protocol { .. } => {
                SolverErrorKind::Protocol
            }
            RuntimeError::Launch { .. }
            | RuntimeError::Handshake { .. }
            | RuntimeError::UnsupportedVersion { .. }
            | RuntimeError::Transport { .. }
            | RuntimeError::Terminated
            | RuntimeError::Cancelled => SolverErrorKind::Unavailable,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            RuntimeError::Launch { command, .. } => format!(
                "Could not start the solver runtime '{command}'. Is Julia installed and on PATH?"
            ),
            RuntimeError::UnsupportedVersion { found, required } => format!(
                "GraphBees requires Julia >= {required}, but found Julia {found}. \
                 Point [runtime].command at a newer Julia binary."
            ),
            RuntimeError::Handshake { message } => {
                format!("The solver runtime failed to initialize: {message}")
            }
            RuntimeError::Timeout { seconds, .. } => {
                format!("The solver runtime did not answer within {seconds}s.")
            }
            RuntimeError::Terminated => "The solver runtime exited unexpectedly.".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON-RPC codes meaning the request itself was rejected, not the algorithm.
fn is_protocol_code(code: i64) -> bool {
    matches!(code, -32700 | -32600 | -32601 | -32602)
}
