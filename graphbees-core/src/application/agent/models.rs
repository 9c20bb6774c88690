use crate::application::tools::ToolLog;
use crate::config::AppConfig;
use serde::Serialize;

/// Per-turn overrides. `None` falls back to [`AgentSettings`].
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub max_rounds: Option<usize>,
}

/// Defaults every turn starts from.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub provider: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub max_rounds: usize,
    pub system_prompt: String,
}

impl AgentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        let system_prompt = config
            .system_prompt
            .clone()
            .filter(|prompt| !prompt.trim().is_empty())
            .unwrap_or_else(|| super::prompt::DEFAULT_SYSTEM_PROMPT.to_string());
        Self {
            provider: config.default_provider.clone(),
            model: config.model.clone(),
            max_tokens: Some(config.max_tokens),
            max_rounds: config.agent.max_rounds,
            system_prompt,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// The model replied without requesting tools.
    Answered,
    /// The round cap was hit; the answer was assembled locally.
    RoundLimit,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub answer: String,
    pub tool_logs: Vec<ToolLog>,
    /// Model replies that requested tools.
    pub rounds: usize,
    pub finish: FinishReason,
}
