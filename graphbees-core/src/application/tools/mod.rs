//! Tool catalog, argument normalization and dispatch.

mod dispatcher;
mod log;
pub mod normalizer;
pub mod registry;

pub use dispatcher::ToolDispatcher;
pub use log::{ToolFailure, ToolLog, ToolOutcome, summarize_arguments};
pub use normalizer::{ValidationError, normalize};
pub use registry::{ToolEntry, ToolMeta};
