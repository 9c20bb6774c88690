//! JSON-lines front end.
//!
//! One request object per input line, one response object per output line.

use graphbees_core::agent::{Agent, AgentOptions};
use graphbees_core::model::ModelProvider;
use graphbees_core::tools::ToolLog;
use graphbees_core::types::Conversation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct StdioRequest {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    max_rounds: Option<usize>,
    #[serde(default)]
    reset: bool,
    #[serde(default)]
    close: bool,
    #[serde(default)]
    shutdown: bool,
}

#[derive(Debug, Default, Serialize)]
struct StdioResponse {
    session_id: Option<String>,
    answer: Option<String>,
    tool_logs: Vec<ToolLog>,
    error: Option<String>,
}

impl StdioResponse {
    fn error(session_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            session_id,
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

struct StdioSessions<'a, P: ModelProvider> {
    agent: &'a Agent<P>,
    allow_shutdown: bool,
    sessions: HashMap<String, Conversation>,
}

impl<'a, P: ModelProvider> StdioSessions<'a, P> {
    fn new(agent: &'a Agent<P>, allow_shutdown: bool) -> Self {
        Self {
            agent,
            allow_shutdown,
            sessions: HashMap::new(),
        }
    }

    /// Returns the response and whether the loop should stop.
    async fn handle_line(&mut self, line: &str) -> (StdioResponse, bool) {
        let request: StdioRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "Rejected malformed stdio request");
                return (StdioResponse::error(None, format!("invalid request: {err}")), false);
            }
        };

        if request.shutdown {
            if self.allow_shutdown {
                info!("Shutdown requested over stdio");
                return (
                    StdioResponse {
                        session_id: request.session_id,
                        ..StdioResponse::default()
                    },
                    true,
                );
            }
            return (
                StdioResponse::error(request.session_id, "shutdown is disabled by configuration"),
                false,
            );
        }

        if request.close {
            let Some(session_id) = request.session_id else {
                return (StdioResponse::error(None, "'close' needs a session_id"), false);
            };
            if self.sessions.remove(&session_id).is_some() {
                debug!(session = %session_id, "Closed session");
            }
            return (
                StdioResponse {
                    session_id: Some(session_id),
                    ..StdioResponse::default()
                },
                false,
            );
        }

        let Some(prompt) = request.prompt.filter(|prompt| !prompt.trim().is_empty()) else {
            let response = if request.reset {
                if let Some(conversation) = request
                    .session_id
                    .as_ref()
                    .and_then(|id| self.sessions.get_mut(id))
                {
                    conversation.reset();
                }
                StdioResponse {
                    session_id: request.session_id,
                    ..StdioResponse::default()
                }
            } else {
                StdioResponse::error(request.session_id, "missing 'prompt'")
            };
            return (response, false);
        };

        // Requests without an id get a one-shot conversation that is not kept.
        let mut one_shot;
        let conversation = match &request.session_id {
            Some(session_id) => self
                .sessions
                .entry(session_id.clone())
                .or_insert_with(|| self.agent.new_conversation()),
            None => {
                one_shot = self.agent.new_conversation();
                &mut one_shot
            }
        };
        if request.reset {
            debug!(session = ?request.session_id, "Resetting session");
            conversation.reset();
        }

        let options = AgentOptions {
            max_rounds: request.max_rounds,
            ..AgentOptions::default()
        };
        let response = match self.agent.run_turn(conversation, prompt, &options).await {
            Ok(outcome) => StdioResponse {
                session_id: request.session_id,
                answer: Some(outcome.answer),
                tool_logs: outcome.tool_logs,
                error: None,
            },
            Err(err) => {
                warn!(session = ?request.session_id, error = %err, "Turn failed");
                StdioResponse::error(request.session_id, err.user_message())
            }
        };
        (response, false)
    }
}

pub async fn run<P: ModelProvider>(agent: &Agent<P>, allow_shutdown: bool) -> io::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(agent, allow_shutdown, stdin, stdout).await
}

pub async fn serve<P, R, W>(
    agent: &Agent<P>,
    allow_shutdown: bool,
    reader: R,
    mut writer: W,
) -> io::Result<()>
where
    P: ModelProvider,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut sessions = StdioSessions::new(agent, allow_shutdown);
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let (response, stop) = sessions.handle_line(&line).await;
        let encoded = serde_json::to_string(&response).map_err(io::Error::other)?;
        writer.write_all(encoded.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        if stop {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use graphbees_core::agent::AgentSettings;
    use graphbees_core::domain::input::ToolInput;
    use graphbees_core::domain::solver::{RuntimeInfo, SolverBridge, SolverError};
    use graphbees_core::model::{ModelError, ModelRequest, ModelResponse};
    use graphbees_core::tools::ToolDispatcher;
    use serde_json::Value;
    use std::sync::Arc;

    /// Replies with the number of messages it was sent.
    struct CountingProvider;

    #[async_trait]
    impl ModelProvider for CountingProvider {
        async fn chat(&self, request: ModelRequest) -> Result<ModelResponse, ModelError> {
            Ok(ModelResponse::new(request.messages.len().to_string()))
        }
    }

    struct NoBridge;

    #[async_trait]
    impl SolverBridge for NoBridge {
        async fn solve(&self, input: &ToolInput) -> Result<Value, SolverError> {
            Err(SolverError::new(
                input.kind().name(),
                graphbees_core::domain::solver::SolverErrorKind::Unavailable,
                "no runtime",
            ))
        }

        fn runtime_info(&self) -> Option<RuntimeInfo> {
            None
        }
    }

    fn agent() -> Agent<CountingProvider> {
        let settings = AgentSettings {
            provider: "test".into(),
            model: "m".into(),
            max_tokens: None,
            max_rounds: 2,
            system_prompt: "sys".into(),
        };
        Agent::new(
            Arc::new(CountingProvider),
            ToolDispatcher::new(Arc::new(NoBridge)),
            settings,
        )
    }

    async fn exchange(input: &str, allow_shutdown: bool) -> Vec<Value> {
        let agent = agent();
        let mut output = Vec::new();
        serve(&agent, allow_shutdown, input.as_bytes(), &mut output)
            .await
            .expect("serve");
        String::from_utf8(output)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[tokio::test]
    async fn sessions_keep_history_between_requests() {
        let responses = exchange(
            "{\"prompt\":\"a\",\"session_id\":\"s1\"}\n{\"prompt\":\"b\",\"session_id\":\"s1\"}\n",
            false,
        )
        .await;
        // system + user, then system + user + assistant + user
        assert_eq!(responses[0]["answer"], "2");
        assert_eq!(responses[1]["answer"], "4");
        assert_eq!(responses[1]["session_id"], "s1");
        assert!(responses[1]["error"].is_null());
    }

    #[tokio::test]
    async fn reset_clears_history() {
        let responses = exchange(
            "{\"prompt\":\"a\",\"session_id\":\"s\"}\n{\"prompt\":\"b\",\"session_id\":\"s\",\"reset\":true}\n",
            false,
        )
        .await;
        assert_eq!(responses[1]["answer"], "2");
    }

    #[tokio::test]
    async fn shutdown_requires_permission() {
        let refused = exchange("{\"shutdown\":true}\n{\"prompt\":\"still here\"}\n", false).await;
        assert_eq!(refused.len(), 2);
        assert!(refused[0]["error"].as_str().is_some());

        let honoured = exchange("{\"shutdown\":true}\n{\"prompt\":\"never read\"}\n", true).await;
        assert_eq!(honoured.len(), 1);
        assert!(honoured[0]["error"].is_null());
    }

    #[tokio::test]
    async fn malformed_lines_get_error_responses() {
        let responses = exchange("not json\n", false).await;
        assert!(
            responses[0]["error"]
                .as_str()
                .is_some_and(|message| message.starts_with("invalid request"))
        );
        assert!(responses[0]["session_id"].is_null());
    }

    #[tokio::test]
    async fn requests_without_an_id_are_not_kept() {
        let agent = agent();
        let mut sessions = StdioSessions::new(&agent, false);
        for _ in 0..3 {
            let (response, stop) = sessions.handle_line("{\"prompt\":\"hi\"}").await;
            assert!(!stop);
            assert_eq!(response.answer.as_deref(), Some("2"));
            assert!(response.session_id.is_none());
        }
        assert!(sessions.sessions.is_empty());
    }

    #[tokio::test]
    async fn close_drops_the_session() {
        let agent = agent();
        let mut sessions = StdioSessions::new(&agent, false);
        sessions
            .handle_line("{\"prompt\":\"a\",\"session_id\":\"s\"}")
            .await;
        assert_eq!(sessions.sessions.len(), 1);

        let (closed, _) = sessions
            .handle_line("{\"session_id\":\"s\",\"close\":true}")
            .await;
        assert!(closed.error.is_none());
        assert_eq!(closed.session_id.as_deref(), Some("s"));
        assert!(sessions.sessions.is_empty());

        let (fresh, _) = sessions
            .handle_line("{\"prompt\":\"b\",\"session_id\":\"s\"}")
            .await;
        assert_eq!(fresh.answer.as_deref(), Some("2"));

        let (refused, _) = sessions.handle_line("{\"close\":true}").await;
        assert!(refused.error.is_some());
    }
}
