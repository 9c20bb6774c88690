//! Solver runtime bridge
//!
//! Owns the long-lived Julia worker and translates typed tool inputs into
//! `solve` requests over its stdio.
//!
//! - `launcher` - starting worker processes
//! - `connection` - JSON-RPC over line-delimited streams
//! - `handle` - the shared [`SolverRuntime`]
//! - `protocol` - wire types
//! - `bridge` - marshalling and the [`SolverBridge`](crate::domain::solver::SolverBridge) impl

mod bridge;
mod connection;
mod error;
mod handle;
mod launcher;
pub mod protocol;

pub use connection::WorkerConnection;
pub use error::RuntimeError;
pub use handle::SolverRuntime;
pub use launcher::{BoxedReader, BoxedWriter, ProcessLauncher, WorkerLauncher, WorkerStreams};
