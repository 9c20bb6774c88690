use super::error::RuntimeError;
use crate::config::RuntimeConfig;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tracing::info;

pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Byte streams of a started worker. `child` is `None` for in-process
/// workers that have no OS process behind them.
pub struct WorkerStreams {
    pub reader: BoxedReader,
    pub writer: BoxedWriter,
    pub child: Option<Child>,
}

/// Starts solver workers.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    async fn launch(&self, config: &RuntimeConfig) -> Result<WorkerStreams, RuntimeError>;
}

/// Spawns the worker as a child process speaking over its stdio.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessLauncher;

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn launch(&self, config: &RuntimeConfig) -> Result<WorkerStreams, RuntimeError> {
        let mut command = Command::new(&config.command);
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .env("JULIA_NUM_THREADS", config.threads.env_value());
        if let Some(dir) = &config.workdir {
            command.current_dir(dir);
        }
        if !config.args.is_empty() {
            command.args(&config.args);
        }
        for (key, value) in &config.env {
            command.env(key, value);
        }

        info!(
            command = %config.command.display(),
            threads = %config.threads,
            "Launching solver worker"
        );

        let mut child = command.spawn().map_err(|source| RuntimeError::Launch {
            command: config.command.display().to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RuntimeError::transport("failed to capture worker stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RuntimeError::transport("failed to capture worker stdout"))?;

        Ok(WorkerStreams {
            reader: Box::new(stdout),
            writer: Box::new(stdin),
            child: Some(child),
        })
    }
}
