use super::error::ConfigError;
use super::provider::ModelProviderConfig;
use super::runtime::RuntimeConfig;
use std::path::Path;

/// Agent loop limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Model calls allowed to request tools within one turn.
    pub max_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: super::defaults::DEFAULT_MAX_ROUNDS,
        }
    }
}

/// Application configuration loaded from graphbees.toml
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub default_provider: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub max_tokens: u32,
    /// Whether a front end may stop the process on request.
    pub allow_shutdown: bool,
    pub agent: AgentConfig,
    pub providers: Vec<ModelProviderConfig>,
    pub runtime: RuntimeConfig,
}

impl AppConfig {
    /// Load configuration from a file path (or default path if None)
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        super::loader::load_config(path)
    }

    /// Build configuration purely from `LLM_API`, `LLM_URL` and `MODEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        super::loader::config_from_env()
    }

    pub fn default_provider_config(&self) -> Option<&ModelProviderConfig> {
        self.providers
            .iter()
            .find(|provider| provider.id == self.default_provider)
    }
}
