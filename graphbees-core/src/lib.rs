//! GraphBees core
//!
//! A language model picks an optimization or graph algorithm and its
//! arguments; the arguments are normalized into typed inputs, solved by a
//! Julia worker process and the results are fed back to the model.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use application::{agent, tools};
pub use config::{AppConfig, ConfigError, ModelProviderConfig, RuntimeConfig};
pub use domain::types;
pub use infrastructure::{model, runtime};
