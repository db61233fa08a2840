// Portcullis CLI library

pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod router;

pub use error::{CliError, CliResult, EXIT_BLOCKED, EXIT_FAILURE, EXIT_OK, EXIT_USAGE};
pub use router::{Cli, CommandRouter, Commands};
