use super::defaults::{
    DEFAULT_CALL_TIMEOUT_SECS, DEFAULT_INIT_TIMEOUT_SECS, DEFAULT_MIN_RUNTIME_VERSION,
    DEFAULT_RUNTIME_COMMAND, DEFAULT_WORKER_SCRIPT,
};
use super::error::ConfigError;
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// Thread count requested from the solver worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadSetting {
    /// Let the runtime pick (Julia's `--threads=auto`).
    #[default]
    Auto,
    Fixed(NonZeroUsize),
}

impl ThreadSetting {
    /// Value exported as `JULIA_NUM_THREADS`.
    pub fn env_value(&self) -> String {
        match self {
            ThreadSetting::Auto => "auto".to_string(),
            ThreadSetting::Fixed(count) => count.to_string(),
        }
    }

    /// Value sent in the worker handshake.
    pub fn to_json(&self) -> Value {
        match self {
            ThreadSetting::Auto => json!("auto"),
            ThreadSetting::Fixed(count) => json!(count.get()),
        }
    }
}

impl fmt::Display for ThreadSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.env_value())
    }
}

/// How the solver worker process is launched and supervised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub command: PathBuf,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub workdir: Option<PathBuf>,
    pub threads: ThreadSetting,
    pub call_timeout: Duration,
    pub init_timeout: Duration,
    pub min_version: String,
    /// Initialize the worker at startup instead of on first tool call.
    pub warm_up: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from(DEFAULT_RUNTIME_COMMAND),
            args: vec![
                "--startup-file=no".to_string(),
                DEFAULT_WORKER_SCRIPT.to_string(),
            ],
            env: HashMap::new(),
            workdir: None,
            threads: ThreadSetting::Auto,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            init_timeout: Duration::from_secs(DEFAULT_INIT_TIMEOUT_SECS),
            min_version: DEFAULT_MIN_RUNTIME_VERSION.to_string(),
            warm_up: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawThreads {
    Count(u64),
    Keyword(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawRuntime {
    command: Option<String>,
    args: Option<Vec<String>>,
    #[serde(default)]
    env: HashMap<String, String>,
    workdir: Option<String>,
    threads: Option<RawThreads>,
    call_timeout_secs: Option<u64>,
    init_timeout_secs: Option<u64>,
    min_version: Option<String>,
    warm_up: Option<bool>,
}

impl TryFrom<RawRuntime> for RuntimeConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRuntime) -> Result<Self, Self::Error> {
        let expand = |s: &str| -> String {
            shellexpand::full(s)
                .map(|cow| cow.into_owned())
                .unwrap_or_else(|_| s.to_string())
        };
        let defaults = RuntimeConfig::default();

        let command = raw
            .command
            .map(|command| PathBuf::from(expand(&command)))
            .unwrap_or(defaults.command);
        let args = raw
            .args
            .map(|args| args.iter().map(|arg| expand(arg)).collect())
            .unwrap_or(defaults.args);
        let workdir = raw.workdir.map(|dir| PathBuf::from(expand(&dir)));
        let threads = match raw.threads {
            None => ThreadSetting::Auto,
            Some(raw) => parse_threads(raw)?,
        };

        let call_timeout = positive_secs("call_timeout_secs", raw.call_timeout_secs)?
            .unwrap_or(defaults.call_timeout);
        let init_timeout = positive_secs("init_timeout_secs", raw.init_timeout_secs)?
            .unwrap_or(defaults.init_timeout);

        let min_version = raw.min_version.unwrap_or(defaults.min_version);
        if parse_version(&min_version).is_none() {
            return Err(ConfigError::InvalidRuntime {
                field: "min_version",
                reason: format!("'{min_version}' is not a dotted numeric version"),
            });
        }

        Ok(Self {
            command,
            args,
            env: raw.env,
            workdir,
            threads,
            call_timeout,
            init_timeout,
            min_version,
            warm_up: raw.warm_up.unwrap_or(defaults.warm_up),
        })
    }
}

fn parse_threads(raw: RawThreads) -> Result<ThreadSetting, ConfigError> {
    match raw {
        RawThreads::Count(count) => usize::try_from(count)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(ThreadSetting::Fixed)
            .ok_or_else(|| ConfigError::InvalidRuntime {
                field: "threads",
                reason: "thread count must be a positive integer".to_string(),
            }),
        RawThreads::Keyword(keyword) if keyword.trim().eq_ignore_ascii_case("auto") => {
            Ok(ThreadSetting::Auto)
        }
        RawThreads::Keyword(other) => other
            .trim()
            .parse::<NonZeroUsize>()
            .map(ThreadSetting::Fixed)
            .map_err(|_| ConfigError::InvalidRuntime {
                field: "threads",
                reason: format!("expected \"auto\" or a positive integer, got '{other}'"),
            }),
    }
}

fn positive_secs(field: &'static str, value: Option<u64>) -> Result<Option<Duration>, ConfigError> {
    match value {
        Some(0) => Err(ConfigError::InvalidRuntime {
            field,
            reason: "timeout must be at least one second".to_string(),
        }),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}

/// Parses `"1.12.0"` (optionally with a pre-release suffix) into components.
pub fn parse_version(text: &str) -> Option<Vec<u64>> {
    let core = text.trim().trim_start_matches('v');
    let core = core.split(['-', '+']).next()?;
    if core.is_empty() {
        return None;
    }
    core.split('.').map(|part| part.parse::<u64>().ok()).collect()
}

/// `true` when `found` is the same as or newer than `required`.
pub fn version_at_least(found: &str, required: &str) -> bool {
    match (parse_version(found), parse_version(required)) {
        (Some(mut found), Some(mut required)) => {
            let width = found.len().max(required.len());
            found.resize(width, 0);
            required.resize(width, 0);
            found >= required
        }
        _ => false,
    }
}
