mod cli;
mod error;
mod logging;
mod repl;
mod stdio;

use clap::Parser;
use cli::{Cli, Command};
use error::CliError;
use graphbees_core::agent::{Agent, AgentOptions, AgentSettings};
use graphbees_core::config::{AppConfig, ConfigError};
use graphbees_core::domain::solver::SolverBridge;
use graphbees_core::model::DynamicModelProvider;
use graphbees_core::runtime::SolverRuntime;
use graphbees_core::tools::ToolDispatcher;
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command();
    logging::init(command == Command::Stdio);
    debug!(?command, config = ?cli.config, "CLI arguments parsed");

    match run(cli, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, command: Command) -> Result<(), CliError> {
    if command == Command::Tools {
        println!("{}", repl::catalog());
        return Ok(());
    }

    let config = load_config(&cli)?;
    let runtime = Arc::new(SolverRuntime::new(config.runtime.clone()));

    if command == Command::WarmUp {
        let info = runtime.init().await?;
        println!(
            "Julia {} with {} thread(s); packages: {}",
            info.runtime_version,
            info.threads,
            info.packages.join(", ")
        );
        runtime.shutdown().await;
        return Ok(());
    }

    if config.runtime.warm_up {
        info!("Warming up solver runtime");
        match runtime.init().await {
            Ok(info) => info!(
                version = %info.runtime_version,
                threads = info.threads,
                "Solver runtime ready"
            ),
            Err(err) if err.is_initialization() => return Err(err.into()),
            Err(err) => warn!(error = %err, "Solver warm-up failed, continuing"),
        }
    }

    let provider = Arc::new(DynamicModelProvider::from_configs(&config.providers));
    let bridge: Arc<dyn SolverBridge> = runtime.clone();
    let agent = Agent::new(
        provider,
        ToolDispatcher::new(bridge),
        AgentSettings::from_config(&config),
    );
    let options = AgentOptions::default();

    let result = match command {
        Command::Chat => repl::run(&agent, &options).await.map_err(CliError::from),
        Command::Ask { prompt } => ask(&agent, prompt.join(" "), &options).await,
        Command::Stdio => stdio::run(&agent, config.allow_shutdown)
            .await
            .map_err(CliError::from),
        Command::Tools | Command::WarmUp => Ok(()),
    };

    runtime.shutdown().await;
    info!("GraphBees finished");
    result
}

async fn ask(
    agent: &Agent<DynamicModelProvider>,
    prompt: String,
    options: &AgentOptions,
) -> Result<(), CliError> {
    let mut conversation = agent.new_conversation();
    let outcome = agent.run_turn(&mut conversation, prompt, options).await?;
    let output = json!({
        "answer": outcome.answer,
        "tool_logs": outcome.tool_logs,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig, CliError> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(provider) = &cli.provider {
        info!(provider = %provider, "Using provider from command line");
        config.default_provider = provider.clone();
    }
    if let Some(model) = &cli.model {
        info!(model = %model, "Using model from command line");
        config.model = model.clone();
    }

    let model = config.model.clone();
    let Some(provider) = config
        .providers
        .iter_mut()
        .find(|provider| provider.id == config.default_provider)
    else {
        return Err(ConfigError::ProviderNotFound {
            provider: config.default_provider.clone(),
        }
        .into());
    };
    provider.ensure_model(&model);
    Ok(config)
}
