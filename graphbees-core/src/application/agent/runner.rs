use super::errors::AgentError;
use super::models::{AgentOptions, AgentSettings, FinishReason, TurnOutcome};
use crate::application::tools::{ToolDispatcher, ToolFailure, ToolLog};
use crate::infrastructure::model::{ModelProvider, ModelRequest};
use crate::types::{ChatMessage, Conversation, MessageRole, ToolCallRequest, ToolDefinition};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

enum TurnState {
    AwaitingModel,
    Dispatching(ChatMessage),
    Finalized { answer: String, finish: FinishReason },
}

/// Messages and logs produced by the turn in progress. Nothing reaches the
/// conversation until the turn is finalized.
struct Turn {
    messages: Vec<ChatMessage>,
    logs: Vec<ToolLog>,
    failed: HashMap<String, ToolFailure>,
    rounds: usize,
}

pub struct Agent<P: ModelProvider> {
    provider: Arc<P>,
    dispatcher: ToolDispatcher,
    tools: Vec<ToolDefinition>,
    settings: AgentSettings,
}

impl<P: ModelProvider> Agent<P> {
    pub fn new(provider: Arc<P>, dispatcher: ToolDispatcher, settings: AgentSettings) -> Self {
        let tools = dispatcher.definitions();
        Self {
            provider,
            dispatcher,
            tools,
            settings,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Fresh conversation seeded with the configured system prompt.
    pub fn new_conversation(&self) -> Conversation {
        Conversation::with_system_prompt(self.settings.system_prompt.clone())
    }

    /// Runs one user turn to completion.
    ///
    /// On error, or if the returned future is dropped, `conversation` is
    /// left exactly as it was.
    pub async fn run_turn(
        &self,
        conversation: &mut Conversation,
        prompt: impl Into<String>,
        options: &AgentOptions,
    ) -> Result<TurnOutcome, AgentError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(AgentError::EmptyPrompt);
        }

        let provider = options
            .provider
            .clone()
            .unwrap_or_else(|| self.settings.provider.clone());
        let model = options
            .model
            .clone()
            .unwrap_or_else(|| self.settings.model.clone());
        let max_rounds = options.max_rounds.unwrap_or(self.settings.max_rounds).max(1);
        info!(provider = %provider, model = %model, max_rounds, "Agent turn started");

        let mut turn = Turn {
            messages: vec![ChatMessage::new(MessageRole::User, prompt)],
            logs: Vec::new(),
            failed: HashMap::new(),
            rounds: 0,
        };
        let mut state = TurnState::AwaitingModel;

        loop {
            state = match state {
                TurnState::AwaitingModel if turn.rounds >= max_rounds => {
                    warn!(max_rounds, "Round limit reached, summarizing gathered results");
                    TurnState::Finalized {
                        answer: round_limit_summary(max_rounds, &turn.logs),
                        finish: FinishReason::RoundLimit,
                    }
                }
                TurnState::AwaitingModel => {
                    let request = ModelRequest {
                        provider: provider.clone(),
                        model: model.clone(),
                        messages: conversation
                            .messages()
                            .iter()
                            .chain(turn.messages.iter())
                            .cloned()
                            .collect(),
                        tools: self.tools.clone(),
                        max_tokens: self.settings.max_tokens,
                    };
                    debug!(
                        round = turn.rounds + 1,
                        messages = request.messages.len(),
                        "Submitting turn to model provider"
                    );
                    let message = self.provider.chat(request).await?.message;
                    if message.requests_tools() {
                        turn.rounds += 1;
                        TurnState::Dispatching(message)
                    } else {
                        TurnState::Finalized {
                            answer: message.content,
                            finish: FinishReason::Answered,
                        }
                    }
                }
                TurnState::Dispatching(message) => {
                    let calls = message.tool_calls.clone();
                    turn.messages.push(message);
                    for call in &calls {
                        let log = self.dispatch(&mut turn, call).await;
                        turn.messages
                            .push(ChatMessage::tool_result(call.id.clone(), log.model_content()));
                        turn.logs.push(log);
                    }
                    TurnState::AwaitingModel
                }
                TurnState::Finalized { answer, finish } => {
                    info!(
                        rounds = turn.rounds,
                        tool_calls = turn.logs.len(),
                        ?finish,
                        "Agent turn finished"
                    );
                    turn.messages
                        .push(ChatMessage::new(MessageRole::Assistant, answer.clone()));
                    conversation.extend(turn.messages);
                    return Ok(TurnOutcome {
                        answer,
                        tool_logs: turn.logs,
                        rounds: turn.rounds,
                        finish,
                    });
                }
            };
        }
    }

    async fn dispatch(&self, turn: &mut Turn, call: &ToolCallRequest) -> ToolLog {
        let key = fingerprint(call);
        if let Some(previous) = turn.failed.get(&key) {
            return self.dispatcher.repeated_failure(call, previous);
        }
        let log = self.dispatcher.dispatch_call(call).await;
        if let Some(failure @ ToolFailure::SolverExecutionError { .. }) = log.failure() {
            turn.failed.insert(key, failure.clone());
        }
        log
    }
}

fn fingerprint(call: &ToolCallRequest) -> String {
    // Object keys serialize in sorted order, so equal arguments give equal text.
    format!("{}\u{0}{}", call.name, call.arguments)
}

fn round_limit_summary(max_rounds: usize, logs: &[ToolLog]) -> String {
    let mut summary = format!(
        "I reached the limit of {max_rounds} tool rounds before finishing my answer."
    );
    if logs.is_empty() {
        summary.push_str(" No tool results were gathered.");
        return summary;
    }
    summary.push_str(" Results gathered so far:");
    for log in logs {
        let name = log
            .meta
            .as_ref()
            .map(|meta| meta.display_name)
            .unwrap_or(log.tool.as_str());
        let line = match (log.value(), log.failure()) {
            (Some(value), _) => format!("\n- {name} ({}): {}", log.input_summary, value),
            (None, Some(failure)) => format!("\n- {name}: failed, {failure}"),
            (None, None) => format!("\n- {name}: no result"),
        };
        summary.push_str(&line);
    }
    summary
}
