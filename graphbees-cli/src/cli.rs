use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "graphbees",
    version,
    about = "Optimization assistant that answers with exact and approximation algorithms"
)]
pub struct Cli {
    /// Configuration file (defaults to config/graphbees.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Model to use instead of the configured one
    #[arg(long, global = true)]
    pub model: Option<String>,
    /// Provider id to use instead of `default_provider`
    #[arg(long, global = true)]
    pub provider: Option<String>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive conversation (default)
    Chat,
    /// Answer one prompt and print the result as JSON
    Ask {
        #[arg(required = true, trailing_var_arg = true)]
        prompt: Vec<String>,
    },
    /// JSON-lines requests on stdin, responses on stdout
    Stdio,
    /// Print the tool catalog
    Tools,
    /// Start the solver runtime and report its version
    WarmUp,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_is_the_default_command() {
        let cli = Cli::parse_from(["graphbees"]);
        assert_eq!(cli.command(), Command::Chat);
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::parse_from([
            "graphbees", "ask", "--model", "deepseek-chat", "pack", "my", "boxes",
        ]);
        assert_eq!(cli.model.as_deref(), Some("deepseek-chat"));
        assert_eq!(
            cli.command(),
            Command::Ask {
                prompt: vec!["pack".into(), "my".into(), "boxes".into()]
            }
        );
    }
}
