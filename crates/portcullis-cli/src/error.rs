// CLI error type and process exit codes

use thiserror::Error;

/// Exit code when every hook allowed the operation.
pub const EXIT_OK: i32 = 0;
/// Exit code when a hook blocked the operation, or validation found
/// problems.
pub const EXIT_BLOCKED: i32 = 1;
/// Exit code for operational failures.
pub const EXIT_FAILURE: i32 = 2;
/// Exit code for unusable command line arguments.
pub const EXIT_USAGE: i32 = 3;

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] portcullis_hooks::HooksError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// User-facing error message with a pointer to the next step.
    pub fn user_message(&self) -> String {
        match self {
            CliError::InvalidArgument { message } => {
                format!("Invalid argument: {message}\n\nRun 'portcullis --help' for usage information.")
            }
            CliError::Io(err) => {
                format!("File operation failed: {err}")
            }
            CliError::Config(err) => {
                format!("Configuration error: {err}\n\nRun 'portcullis validate' to inspect the configuration.")
            }
            CliError::Internal(msg) => {
                format!("Internal error: {msg}")
            }
        }
    }

    /// The process exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgument { .. } => EXIT_USAGE,
            _ => EXIT_FAILURE,
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_maps_to_usage_exit() {
        let err = CliError::InvalidArgument {
            message: "bad event".to_string(),
        };
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert!(err.user_message().contains("--help"));
    }

    #[test]
    fn test_other_errors_map_to_failure_exit() {
        let err = CliError::Internal("boom".to_string());
        assert_eq!(err.exit_code(), EXIT_FAILURE);
    }
}
