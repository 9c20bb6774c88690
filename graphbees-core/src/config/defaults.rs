pub const CONFIG_PATH: &str = "config/graphbees.toml";
pub const ENV_PATH: &str = "config/.env";

pub const DEFAULT_PROVIDER_ID: &str = "default";
pub const DEFAULT_OPENAI_API_PATH: &str = "/chat/completions";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_MAX_ROUNDS: usize = 8;

pub const DEFAULT_RUNTIME_COMMAND: &str = "julia";
pub const DEFAULT_WORKER_SCRIPT: &str = "worker/graphbees_worker.jl";
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_INIT_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_MIN_RUNTIME_VERSION: &str = "1.12.0";

/// Environment variables read when no configuration file is present.
pub const ENV_API_KEY: &str = "LLM_API";
pub const ENV_BASE_URL: &str = "LLM_URL";
pub const ENV_MODEL: &str = "MODEL";
pub const ENV_ALLOW_SHUTDOWN: &str = "GRAPHBEES_ALLOW_SHUTDOWN";
