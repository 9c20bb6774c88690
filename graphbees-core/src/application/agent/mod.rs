//! # Agent Module
//!
//! Drives one conversation: asks the model for the next action, runs the
//! requested tools through the [`ToolDispatcher`], feeds the results back and
//! repeats until the model answers or the round cap is reached.
//!
//! ## Turn states
//!
//! `AwaitingModel -> (Dispatching -> AwaitingModel)* -> Finalized`
//!
//! [`ToolDispatcher`]: crate::application::tools::ToolDispatcher

mod errors;
mod models;
mod prompt;
mod runner;


pub use errors::AgentError;
pub use models::{AgentOptions, AgentSettings, FinishReason, TurnOutcome};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use runner::Agent;
