// Config loading tests - AppConfig::load validation and environment fallback.

use graphbees_core::config::{AppConfig, ConfigError, ThreadSetting};
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::tempdir;

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("graphbees.toml");
    fs::write(&path, content).expect("Failed to write config");
    path
}

fn clear_env() {
    unsafe {
        env::remove_var("LLM_API");
        env::remove_var("LLM_URL");
        env::remove_var("MODEL");
        env::remove_var("GRAPHBEES_ALLOW_SHUTDOWN");
    }
}

const MINIMAL: &str = r#"
model = "deepseek-chat"
default_provider = "deepseek"

[[providers]]
id = "deepseek"
type = "openai"
endpoint = "https://api.deepseek.com"
api_key = "LLM_API"
models = ["deepseek-chat"]
"#;

#[test]
fn returns_error_when_file_not_found() {
    let result = AppConfig::load(Some(Path::new("/nonexistent/path/graphbees.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound { .. })));
}

#[test]
#[serial]
fn minimal_file_gets_defaults() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), MINIMAL);

    let config = AppConfig::load(Some(&path)).expect("valid config");
    assert_eq!(config.model, "deepseek-chat");
    assert_eq!(config.max_tokens, 4096);
    assert_eq!(config.agent.max_rounds, 8);
    assert!(!config.allow_shutdown);
    assert_eq!(config.runtime.threads, ThreadSetting::Auto);
    assert_eq!(config.runtime.call_timeout, Duration::from_secs(120));
    assert_eq!(config.runtime.init_timeout, Duration::from_secs(600));
    assert_eq!(config.runtime.min_version, "1.12.0");
    assert!(config.runtime.warm_up);
}

#[test]
#[serial]
fn runtime_and_agent_sections_are_parsed() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let content = format!(
        "{MINIMAL}\n[agent]\nmax_rounds = 3\n\n[runtime]\ncommand = \"/opt/julia/bin/julia\"\nthreads = 4\ncall_timeout_secs = 30\nwarm_up = false\n\n[runtime.env]\nJULIA_DEPOT_PATH = \"/tmp/depot\"\n"
    );
    let path = write_config(dir.path(), &content);

    let config = AppConfig::load(Some(&path)).expect("valid config");
    assert_eq!(config.agent.max_rounds, 3);
    assert_eq!(config.runtime.command, PathBuf::from("/opt/julia/bin/julia"));
    assert_eq!(config.runtime.threads.env_value(), "4");
    assert_eq!(config.runtime.call_timeout, Duration::from_secs(30));
    assert!(!config.runtime.warm_up);
    assert_eq!(
        config.runtime.env.get("JULIA_DEPOT_PATH").map(String::as_str),
        Some("/tmp/depot")
    );
}

#[test]
#[serial]
fn invalid_thread_setting_is_rejected() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), &format!("{MINIMAL}\n[runtime]\nthreads = \"lots\"\n"));

    let result = AppConfig::load(Some(&path));
    assert!(matches!(
        result,
        Err(ConfigError::InvalidRuntime {
            field: "threads",
            ..
        })
    ));
}

#[test]
fn zero_rounds_are_rejected() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), &format!("{MINIMAL}\n[agent]\nmax_rounds = 0\n"));
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::InvalidAgent { .. })
    ));
}

#[test]
fn returns_error_when_model_missing() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
default_provider = "local"

[[providers]]
id = "local"
type = "ollama"
endpoint = "http://127.0.0.1:11434"
"#,
    );
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::MissingModel)
    ));
}

#[test]
fn returns_error_when_no_providers() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
model = "llama3.1"
default_provider = "local"
"#,
    );
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::NoProvidersConfigured)
    ));
}

#[test]
fn returns_error_when_provider_missing_endpoint() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
model = "llama3.1"
default_provider = "local"

[[providers]]
id = "local"
type = "ollama"
"#,
    );
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::MissingEndpoint { .. })
    ));
}

#[test]
fn returns_error_when_default_provider_not_in_list() {
    let dir = tempdir().expect("tempdir");
    let path = write_config(
        dir.path(),
        r#"
model = "llama3.1"
default_provider = "nonexistent"

[[providers]]
id = "local"
type = "ollama"
endpoint = "http://127.0.0.1:11434"
"#,
    );
    assert!(matches!(
        AppConfig::load(Some(&path)),
        Err(ConfigError::ProviderNotFound { .. })
    ));
}

#[test]
#[serial]
fn environment_overrides_model_and_endpoint() {
    clear_env();
    let dir = tempdir().expect("tempdir");
    let path = write_config(dir.path(), MINIMAL);
    unsafe {
        env::set_var("MODEL", "deepseek-reasoner");
        env::set_var("LLM_URL", "https://proxy.example.com");
        env::set_var("GRAPHBEES_ALLOW_SHUTDOWN", "true");
    }

    let config = AppConfig::load(Some(&path)).expect("valid config");
    clear_env();

    assert_eq!(config.model, "deepseek-reasoner");
    assert!(config.allow_shutdown);
    let provider = config.default_provider_config().expect("default provider");
    assert_eq!(provider.endpoint, "https://proxy.example.com");
    assert!(provider.models.iter().any(|m| m.name == "deepseek-reasoner"));
}

#[test]
#[serial]
fn env_only_configuration_builds_openai_provider() {
    clear_env();
    unsafe {
        env::set_var("LLM_API", "sk-test");
        env::set_var("LLM_URL", "https://api.deepseek.com");
        env::set_var("MODEL", "deepseek-chat");
    }

    let config = AppConfig::from_env().expect("env config");
    clear_env();

    let provider = config.default_provider_config().expect("default provider");
    assert_eq!(provider.provider_type, "openai");
    assert_eq!(provider.api_key.as_deref(), Some("LLM_API"));
    assert_eq!(config.model, "deepseek-chat");
}

#[test]
#[serial]
fn env_only_configuration_names_missing_variable() {
    clear_env();
    unsafe {
        env::set_var("LLM_API", "sk-test");
    }
    let result = AppConfig::from_env();
    clear_env();
    assert!(matches!(
        result,
        Err(ConfigError::MissingEnv { var: "LLM_URL" })
    ));
}
