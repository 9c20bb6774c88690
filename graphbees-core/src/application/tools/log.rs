use super::registry::ToolMeta;
use crate::domain::solver::{SolverError, SolverErrorKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// Why a tool call produced no value. Serialized as-is into the tool
/// message the model reads.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "kind")]
pub enum ToolFailure {
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },
    #[error("invalid argument '{field}': {message}")]
    ValidationError { field: String, message: String },
    #[error("solver execution failed ({}): {message}", .reason.as_str())]
    SolverExecutionError {
        reason: SolverErrorKind,
        message: String,
    },
}

impl From<SolverError> for ToolFailure {
    fn from(err: SolverError) -> Self {
        ToolFailure::SolverExecutionError {
            reason: err.kind,
            message: err.message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { value: Value },
    Failure { error: ToolFailure },
}

/// Record of one dispatched tool call.
#[derive(Debug, Clone, Serialize)]
pub struct ToolLog {
    pub tool: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_id: Option<String>,
    /// `None` when the tool name is not registered.
    pub meta: Option<ToolMeta>,
    pub arguments: Value,
    pub input_summary: String,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
    pub elapsed_s: f64,
    /// Worker threads at the time of the call, once the runtime is up.
    pub threads: Option<usize>,
    pub started_at: DateTime<Utc>,
}

impl ToolLog {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ToolOutcome::Success { .. })
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.outcome {
            ToolOutcome::Success { value } => Some(value),
            ToolOutcome::Failure { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match &self.outcome {
            ToolOutcome::Success { .. } => None,
            ToolOutcome::Failure { error } => Some(error),
        }
    }

    /// JSON text sent back to the model as the tool message.
    pub fn model_content(&self) -> String {
        let payload = match &self.outcome {
            ToolOutcome::Success { value } => json!({
                "value": value,
                "guarantee": self.meta.as_ref().map(|meta| meta.guarantee),
                "complexity": self.meta.as_ref().map(|meta| meta.complexity),
                "elapsed_s": self.elapsed_s,
            }),
            ToolOutcome::Failure { error } => json!({ "error": error }),
        };
        payload.to_string()
    }
}

/// Compact one-line rendering of tool arguments for display.
///
/// Long arrays and objects are replaced by their size.
pub fn summarize_arguments(arguments: &Value) -> String {
    let Value::Object(map) = arguments else {
        return arguments.to_string();
    };
    map.iter()
        .map(|(key, value)| match value {
            Value::Array(items) if items.len() > 6 => format!("{key}=[{} items]", items.len()),
            Value::Object(entries) if entries.len() > 4 => {
                format!("{key}={{{} entries}}", entries.len())
            }
            Value::String(text) => format!("{key}={text}"),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
