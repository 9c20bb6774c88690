pub mod app;
pub mod defaults;
pub mod error;
pub mod loader;
pub mod provider;
pub mod runtime;

pub use app::{AgentConfig, AppConfig};
pub use defaults::CONFIG_PATH;
pub use error::ConfigError;
pub use provider::{ModelInfo, ModelProviderConfig};
pub use runtime::{RuntimeConfig, ThreadSetting};
