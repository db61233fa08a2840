// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{ListCommand, RunCommand, ValidateCommand};
use crate::error::CliResult;

/// Portcullis - hook gateway for coding assistants
#[derive(Parser, Debug)]
#[command(name = "portcullis")]
#[command(bin_name = "portcullis")]
#[command(about = "Run configured hooks around assistant operations")]
#[command(
    long_about = "Portcullis runs the hooks configured for an assistant event and reports the aggregate decision.\n\nExit codes for 'run': 0 allowed, 1 blocked, 3 unusable arguments."
)]
#[command(version)]
#[command(author = "Portcullis Contributors")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Execute the hooks configured for an event
    #[command(about = "Execute the hooks configured for an event and report the decision")]
    Run {
        /// Event to fire (PreToolUse, PostToolUse, SessionStart, ...)
        #[arg(value_name = "EVENT")]
        event: String,

        /// Tool name for the operation context
        #[arg(long)]
        tool: Option<String>,

        /// Command line for the operation context
        #[arg(long)]
        command: Option<String>,

        /// File path for the operation context
        #[arg(long)]
        path: Option<String>,

        /// File content for the operation context
        #[arg(long)]
        content: Option<String>,

        /// Exit code of the completed operation
        #[arg(long)]
        exit_code: Option<i32>,

        /// Whether the completed operation succeeded
        #[arg(long)]
        success: Option<bool>,

        /// Session identifier
        #[arg(long)]
        session_id: Option<String>,

        /// Extra context parameters as a JSON object
        #[arg(long)]
        params: Option<String>,

        /// Configuration file to use instead of the default
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Directory relative handler paths resolve against
        #[arg(long, value_name = "DIR")]
        handlers_dir: Option<PathBuf>,

        /// Print the full execution result as JSON on stdout
        #[arg(long)]
        json: bool,

        /// Do not read a context document from stdin
        #[arg(long)]
        no_stdin: bool,
    },

    /// Validate a hooks configuration
    #[command(about = "Validate matchers, command templates, and dispatch rules in a configuration")]
    Validate {
        /// Configuration file to validate instead of the default
        #[arg(value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// List configured hooks by event
    #[command(about = "List the hooks the configuration registers for each event")]
    List {
        /// Configuration file to list instead of the default
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

/// Parses arguments and dispatches to the command handlers.
pub struct CommandRouter;

impl CommandRouter {
    /// Parse CLI arguments and route to the handler. Returns the
    /// process exit code.
    pub async fn route() -> CliResult<i32> {
        let cli = Cli::parse();
        crate::logging::init(cli.verbose);
        Self::execute(cli).await
    }

    /// Execute a parsed command line.
    pub async fn execute(cli: Cli) -> CliResult<i32> {
        match cli.command {
            Commands::Run {
                event,
                tool,
                command,
                path,
                content,
                exit_code,
                success,
                session_id,
                params,
                config,
                handlers_dir,
                json,
                no_stdin,
            } => {
                let cmd = RunCommand {
                    event,
                    tool,
                    command,
                    path,
                    content,
                    exit_code,
                    success,
                    session_id,
                    params,
                    config,
                    handlers_dir,
                    json,
                    no_stdin,
                };
                cmd.execute().await
            }
            Commands::Validate { config } => {
                let cmd = ValidateCommand::new(config);
                cmd.execute()
            }
            Commands::List { config } => {
                let cmd = ListCommand::new(config);
                cmd.execute()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_parses_event_and_context_flags() {
        let cli = Cli::try_parse_from([
            "portcullis",
            "run",
            "PreToolUse",
            "--tool",
            "Write",
            "--path",
            "src/main.rs",
            "--json",
            "--no-stdin",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                event,
                tool,
                path,
                json,
                no_stdin,
                ..
            } => {
                assert_eq!(event, "PreToolUse");
                assert_eq!(tool.as_deref(), Some("Write"));
                assert_eq!(path.as_deref(), Some("src/main.rs"));
                assert!(json);
                assert!(no_stdin);
            }
            other => panic!("parsed wrong command: {other:?}"),
        }
    }

    #[test]
    fn test_run_parses_exit_code_and_success() {
        let cli = Cli::try_parse_from([
            "portcullis",
            "run",
            "PostToolUse",
            "--exit-code",
            "7",
            "--success",
            "false",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                exit_code, success, ..
            } => {
                assert_eq!(exit_code, Some(7));
                assert_eq!(success, Some(false));
            }
            other => panic!("parsed wrong command: {other:?}"),
        }
    }

    #[test]
    fn test_validate_takes_positional_config() {
        let cli = Cli::try_parse_from(["portcullis", "validate", "hooks.json"]).unwrap();
        match cli.command {
            Commands::Validate { config } => {
                assert_eq!(config, Some(PathBuf::from("hooks.json")));
            }
            other => panic!("parsed wrong command: {other:?}"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["portcullis", "list", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Cli::try_parse_from(["portcullis"]).is_err());
    }
}
