use super::app::{AgentConfig, AppConfig};
use super::defaults::{
    CONFIG_PATH, DEFAULT_MAX_TOKENS, DEFAULT_OPENAI_API_PATH, DEFAULT_PROVIDER_ID,
    ENV_ALLOW_SHUTDOWN, ENV_API_KEY, ENV_BASE_URL, ENV_MODEL, ENV_PATH,
};
use super::error::ConfigError;
use super::provider::{ModelInfo, ModelProviderConfig, RawProviderConfig};
use super::runtime::{RawRuntime, RuntimeConfig};
use dotenvy::from_filename;
use serde::Deserialize;
use std::env;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Once;
use tracing::{debug, info};

static ENV_LOADER: Once = Once::new();

/// Raw configuration structure for deserialization from TOML
#[derive(Debug, Deserialize, Default)]
pub(super) struct RawConfig {
    pub model: Option<String>,
    pub default_provider: Option<String>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub allow_shutdown: Option<bool>,
    #[serde(default)]
    pub agent: RawAgent,
    #[serde(default)]
    pub providers: Vec<RawProviderConfig>,
    #[serde(default)]
    pub runtime: RawRuntime,
}

#[derive(Debug, Deserialize, Default)]
pub(super) struct RawAgent {
    pub max_rounds: Option<usize>,
}

/// Ensures environment variables are loaded from config/.env
pub fn ensure_env_loaded() {
    ENV_LOADER.call_once(|| {
        let _ = from_filename(ENV_PATH);
    });
}

/// Load and validate configuration.
///
/// An explicit path must exist. Without one, the default path is tried and
/// a missing file falls back to [`config_from_env`].
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => match read_config(Path::new(CONFIG_PATH)) {
            Err(ConfigError::NotFound { .. }) => {
                info!("No configuration file found, using environment variables");
                config_from_env()?
            }
            other => other?,
        },
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");

    let content = fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            ConfigError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_and_build(parsed)
}

fn validate_and_build(parsed: RawConfig) -> Result<AppConfig, ConfigError> {
    let model = parsed.model.ok_or(ConfigError::MissingModel)?;
    let default_provider = parsed
        .default_provider
        .ok_or(ConfigError::MissingDefaultProvider)?;

    if parsed.providers.is_empty() {
        return Err(ConfigError::NoProvidersConfigured);
    }

    let mut providers: Vec<ModelProviderConfig> = Vec::new();
    for raw_provider in parsed.providers {
        if raw_provider.endpoint.is_none() {
            return Err(ConfigError::MissingEndpoint {
                provider: raw_provider.id.clone(),
            });
        }
        providers.push(ModelProviderConfig::from(raw_provider));
    }
    let Some(provider) = providers.iter_mut().find(|p| p.id == default_provider) else {
        return Err(ConfigError::ProviderNotFound {
            provider: default_provider,
        });
    };
    provider.ensure_model(&model);

    let agent = match parsed.agent.max_rounds {
        Some(0) => {
            return Err(ConfigError::InvalidAgent {
                field: "max_rounds",
                reason: "at least one round is required".to_string(),
            });
        }
        Some(max_rounds) => AgentConfig { max_rounds },
        None => AgentConfig::default(),
    };

    Ok(AppConfig {
        default_provider,
        model,
        system_prompt: parsed.system_prompt,
        max_tokens: parsed.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        allow_shutdown: parsed.allow_shutdown.unwrap_or(false),
        agent,
        providers,
        runtime: RuntimeConfig::try_from(parsed.runtime)?,
    })
}

/// Builds a single OpenAI-compatible provider from the environment.
pub fn config_from_env() -> Result<AppConfig, ConfigError> {
    ensure_env_loaded();
    let _api_key = non_empty_env(ENV_API_KEY).ok_or(ConfigError::MissingEnv { var: ENV_API_KEY })?;
    let endpoint =
        non_empty_env(ENV_BASE_URL).ok_or(ConfigError::MissingEnv { var: ENV_BASE_URL })?;
    let model = non_empty_env(ENV_MODEL).ok_or(ConfigError::MissingEnv { var: ENV_MODEL })?;

    let provider = ModelProviderConfig {
        id: DEFAULT_PROVIDER_ID.to_string(),
        provider_type: "openai".to_string(),
        endpoint,
        api_key: Some(ENV_API_KEY.to_string()),
        api_path: Some(DEFAULT_OPENAI_API_PATH.to_string()),
        models: vec![ModelInfo {
            name: model.clone(),
            display_name: None,
        }],
    };

    Ok(AppConfig {
        default_provider: DEFAULT_PROVIDER_ID.to_string(),
        model,
        system_prompt: None,
        max_tokens: DEFAULT_MAX_TOKENS,
        allow_shutdown: false,
        agent: AgentConfig::default(),
        providers: vec![provider],
        runtime: RuntimeConfig::default(),
    })
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Some(model) = non_empty_env(ENV_MODEL) {
        if model != config.model {
            info!(model = %model, "Overriding model from environment");
        }
        config.model = model;
    }
    let endpoint = non_empty_env(ENV_BASE_URL);
    let model = config.model.clone();
    if let Some(provider) = config
        .providers
        .iter_mut()
        .find(|provider| provider.id == config.default_provider)
    {
        if let Some(endpoint) = endpoint {
            provider.endpoint = endpoint;
        }
        provider.ensure_model(&model);
    }
    if let Some(flag) = non_empty_env(ENV_ALLOW_SHUTDOWN) {
        config.allow_shutdown = matches!(
            flag.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        );
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}
