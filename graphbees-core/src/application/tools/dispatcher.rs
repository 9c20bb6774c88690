use super::log::{ToolFailure, ToolLog, ToolOutcome, summarize_arguments};
use super::normalizer::normalize;
use super::registry::{self, ToolEntry};
use crate::domain::solver::{SolverBridge, SolverErrorKind};
use crate::types::{ToolCallRequest, ToolDefinition};
use chrono::Utc;
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Routes tool calls through the normalizer to the solver bridge.
///
/// `dispatch` never fails: every problem ends up in the returned
/// [`ToolLog`] as a [`ToolFailure`].
#[derive(Clone)]
pub struct ToolDispatcher {
    bridge: Arc<dyn SolverBridge>,
}

impl ToolDispatcher {
    pub fn new(bridge: Arc<dyn SolverBridge>) -> Self {
        Self { bridge }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        registry::definitions()
    }

    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolLog {
        self.run(name, None, arguments).await
    }

    pub async fn dispatch_call(&self, call: &ToolCallRequest) -> ToolLog {
        self.run(&call.name, Some(call.id.clone()), call.arguments.clone())
            .await
    }

    /// Log for a call that is not sent to the runtime because an identical
    /// call already failed during the same turn.
    pub fn repeated_failure(&self, call: &ToolCallRequest, previous: &ToolFailure) -> ToolLog {
        let (reason, message) = match previous {
            ToolFailure::SolverExecutionError { reason, message } => (*reason, message.as_str()),
            other => (SolverErrorKind::Runtime, other_message(other)),
        };
        warn!(tool = %call.name, "Skipping repeat of a call that already failed this turn");
        ToolLog {
            tool: call.name.clone(),
            call_id: Some(call.id.clone()),
            meta: registry::lookup(&call.name).map(|entry| entry.meta.clone()),
            input_summary: summarize_arguments(&call.arguments),
            arguments: call.arguments.clone(),
            outcome: ToolOutcome::Failure {
                error: ToolFailure::SolverExecutionError {
                    reason,
                    message: format!(
                        "identical call already failed in this turn and was not retried: {message}"
                    ),
                },
            },
            elapsed_s: 0.0,
            threads: self.threads(),
            started_at: Utc::now(),
        }
    }

    async fn run(&self, name: &str, call_id: Option<String>, arguments: Value) -> ToolLog {
        let started_at = Utc::now();
        let timer = Instant::now();
        let entry = registry::lookup(name);

        let outcome = match entry {
            None => {
                warn!(requested_tool = %name, "Unknown tool requested by model");
                ToolOutcome::Failure {
                    error: ToolFailure::UnknownTool {
                        name: name.to_string(),
                    },
                }
            }
            Some(entry) => self.execute(entry, &arguments).await,
        };

        let elapsed_s = round_secs(timer.elapsed().as_secs_f64());
        match &outcome {
            ToolOutcome::Success { .. } => {
                info!(tool = %name, elapsed_s, "Tool executed");
            }
            ToolOutcome::Failure { error } => {
                warn!(tool = %name, elapsed_s, error = %error, "Tool call failed");
            }
        }

        ToolLog {
            tool: name.to_string(),
            call_id,
            meta: entry.map(|entry| entry.meta.clone()),
            input_summary: summarize_arguments(&arguments),
            arguments,
            outcome,
            elapsed_s,
            threads: self.threads(),
            started_at,
        }
    }

    async fn execute(&self, entry: &ToolEntry, arguments: &Value) -> ToolOutcome {
        let attempt = async {
            let input = match normalize(entry.kind, arguments) {
                Ok(input) => input,
                Err(err) => {
                    debug!(tool = %entry.kind, field = err.field, "Arguments rejected");
                    return Err(ToolFailure::ValidationError {
                        field: err.field.to_string(),
                        message: err.message,
                    });
                }
            };
            self.bridge
                .solve(&input)
                .await
                .map_err(ToolFailure::from)
        };

        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(Ok(value)) => ToolOutcome::Success { value },
            Ok(Err(error)) => ToolOutcome::Failure { error },
            Err(panic) => ToolOutcome::Failure {
                error: ToolFailure::SolverExecutionError {
                    reason: SolverErrorKind::Runtime,
                    message: format!("internal error: {}", panic_message(panic.as_ref())),
                },
            },
        }
    }

    fn threads(&self) -> Option<usize> {
        self.bridge.runtime_info().map(|info| info.threads)
    }
}

fn other_message(failure: &ToolFailure) -> &str {
    match failure {
        ToolFailure::UnknownTool { name } => name,
        ToolFailure::ValidationError { message, .. }
        | ToolFailure::SolverExecutionError { message, .. } => message,
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(text) = panic.downcast_ref::<&'static str>() {
        text
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text
    } else {
        "panic"
    }
}

fn round_secs(secs: f64) -> f64 {
    (secs * 10_000.0).round() / 10_000.0
}
