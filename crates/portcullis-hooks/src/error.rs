//! Error types for the hooks engine

use thiserror::Error;

/// Result type for hooks operations
pub type Result<T> = std::result::Result<T, HooksError>;

/// Errors that can occur while loading configuration or executing hooks
#[derive(Error, Debug)]
pub enum HooksError {
    /// A hook definition is structurally invalid
    #[error("Invalid hook configuration: {0}")]
    InvalidConfiguration(String),

    /// An event name was not recognized
    #[error("Unknown hook event: {0}")]
    UnknownEvent(String),

    /// A hook failed while executing
    #[error("Hook execution failed: {0}")]
    Execution(String),

    /// A handler or command exceeded its time budget
    #[error("Execution timed out after {0}ms")]
    Timeout(u64),

    /// A command template failed safety validation
    #[error("Unsafe command template: {0}")]
    UnsafeTemplate(String),

    /// A template still contained placeholders after substitution
    #[error("Substitution failed: {0}")]
    Substitution(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
