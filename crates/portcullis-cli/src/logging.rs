// Logging initialization for the CLI binary

use tracing::Level;

/// Installs the global tracing subscriber. Diagnostics go to stderr so
/// stdout stays reserved for command output, which hosts may parse.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init(true);
        init(false);
    }
}
