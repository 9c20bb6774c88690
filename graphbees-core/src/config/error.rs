use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found at {path:?}")]
    NotFound { path: PathBuf },

    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("missing required field 'model' in configuration")]
    MissingModel,

    #[error("missing required field 'default_provider' in configuration")]
    MissingDefaultProvider,

    #[error("no providers configured - at least one [[providers]] entry is required")]
    NoProvidersConfigured,

    #[error("default provider '{provider}' not found in configured providers")]
    ProviderNotFound { provider: String },

    #[error("provider '{provider}' is missing required field 'endpoint'")]
    MissingEndpoint { provider: String },

    #[error("environment variable {var} must be set when no configuration file is present")]
    MissingEnv { var: &'static str },

    #[error("invalid [runtime] setting '{field}': {reason}")]
    InvalidRuntime { field: &'static str, reason: String },

    #[error("invalid [agent] setting '{field}': {reason}")]
    InvalidAgent { field: &'static str, reason: String },
}

impl ConfigError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::NotFound { path } => format!(
                "No configuration found at {}. Create it or set LLM_API, LLM_URL and MODEL.",
                path.display()
            ),
            ConfigError::MissingEnv { var } => {
                format!("Set {var} (or provide config/graphbees.toml) before starting.")
            }
            other => other.to_string(),
        }
    }
}
