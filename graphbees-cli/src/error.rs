use graphbees_core::agent::AgentError;
use graphbees_core::config::ConfigError;
use graphbees_core::runtime::RuntimeError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    pub fn user_message(&self) -> String {
        match self {
            CliError::Config(err) => err.user_message(),
            CliError::Runtime(err) => err.user_message(),
            CliError::Agent(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}
