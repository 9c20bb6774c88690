//! Interactive line-based chat.

use graphbees_core::agent::{Agent, AgentOptions, FinishReason, TurnOutcome};
use graphbees_core::model::ModelProvider;
use graphbees_core::tools::registry;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdout};
use tracing::{debug, info};

enum LoopControl {
    Continue,
    Exit,
}

pub async fn run<P: ModelProvider>(agent: &Agent<P>, options: &AgentOptions) -> io::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut conversation = agent.new_conversation();

    write_line(&mut stdout, "GraphBees: describe an optimization or graph problem.").await?;
    print_help(&mut stdout).await?;

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            write_line(&mut stdout, "\nBye.").await?;
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            match handle_command(command, &mut conversation, &mut stdout).await? {
                LoopControl::Continue => continue,
                LoopControl::Exit => break,
            }
        }

        debug!(chars = input.len(), "Submitting prompt");
        let result = tokio::select! {
            result = agent.run_turn(&mut conversation, input, options) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        match result {
            Some(Ok(outcome)) => print_outcome(&mut stdout, &outcome).await?,
            Some(Err(err)) => write_line(&mut stdout, &format!("Error: {}", err.user_message())).await?,
            None => {
                info!("Turn cancelled from keyboard");
                write_line(&mut stdout, "\n(cancelled; the conversation is unchanged)").await?;
            }
        }
    }

    stdout.flush().await
}

async fn handle_command(
    command: &str,
    conversation: &mut graphbees_core::types::Conversation,
    stdout: &mut Stdout,
) -> io::Result<LoopControl> {
    match command.trim().to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => Ok(LoopControl::Exit),
        "reset" | "clear" => {
            conversation.reset();
            write_line(stdout, "Conversation cleared.").await?;
            Ok(LoopControl::Continue)
        }
        "tools" => {
            write_line(stdout, &catalog()).await?;
            Ok(LoopControl::Continue)
        }
        "help" | "?" => {
            print_help(stdout).await?;
            Ok(LoopControl::Continue)
        }
        other => {
            write_line(stdout, &format!("Unknown command '/{other}'. Try /help.")).await?;
            Ok(LoopControl::Continue)
        }
    }
}

/// Tool catalog as aligned text lines.
pub fn catalog() -> String {
    let entries = registry::entries();
    let width = entries
        .iter()
        .map(|entry| entry.definition.name.len())
        .max()
        .unwrap_or(0);
    entries
        .iter()
        .map(|entry| {
            format!(
                "{:<width$}  {} | {} | {}",
                entry.definition.name,
                entry.meta.algorithm,
                entry.meta.guarantee,
                entry.meta.complexity,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

async fn print_outcome(stdout: &mut Stdout, outcome: &TurnOutcome) -> io::Result<()> {
    for log in &outcome.tool_logs {
        let name = log
            .meta
            .as_ref()
            .map(|meta| meta.display_name)
            .unwrap_or(log.tool.as_str());
        let status = match log.failure() {
            None => format!("ok in {:.4}s", log.elapsed_s),
            Some(failure) => format!("failed: {failure}"),
        };
        write_line(stdout, &format!("  [{name}] {} -> {status}", log.input_summary)).await?;
    }
    if outcome.finish == FinishReason::RoundLimit {
        write_line(stdout, "  (tool round limit reached)").await?;
    }
    write_line(stdout, "").await?;
    write_line(stdout, &outcome.answer).await
}

async fn print_help(stdout: &mut Stdout) -> io::Result<()> {
    write_line(
        stdout,
        "Commands: /tools list algorithms, /reset clear history, /quit exit. Ctrl-C cancels a running turn.",
    )
    .await
}

async fn write_line(stdout: &mut Stdout, text: &str) -> io::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}
