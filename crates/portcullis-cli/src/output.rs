// Output formatting and styling

use colored::Colorize;

use portcullis_hooks::{ExecutionResult, MessageKind, ResultMessage};

/// Output styling configuration
pub struct OutputStyle {
    pub use_colors: bool,
}

impl Default for OutputStyle {
    fn default() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
        }
    }
}

impl OutputStyle {
    /// Format success message
    pub fn success(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✓".green().bold(), msg)
        } else {
            format!("✓ {}", msg)
        }
    }

    /// Format error message
    pub fn error(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "✗".red().bold(), msg)
        } else {
            format!("✗ {}", msg)
        }
    }

    /// Format warning message
    pub fn warning(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "⚠".yellow(), msg)
        } else {
            format!("⚠ {}", msg)
        }
    }

    /// Format info message
    pub fn info(&self, msg: &str) -> String {
        if self.use_colors {
            format!("{} {}", "ℹ".blue(), msg)
        } else {
            format!("ℹ {}", msg)
        }
    }

    /// Format header
    pub fn header(&self, title: &str) -> String {
        if self.use_colors {
            title.bold().to_string()
        } else {
            title.to_string()
        }
    }

    /// Format a list item
    pub fn list_item(&self, item: &str) -> String {
        format!("  • {}", item)
    }
}

/// Renders an execution result for a human reader.
///
/// Per-hook messages come first in the order the scheduler produced
/// them, then warnings, then a one-line verdict.
pub fn print_result(result: &ExecutionResult) {
    let style = OutputStyle::default();

    for message in &result.messages {
        let text = message_text(message);
        match message.kind {
            MessageKind::Block => println!("{}", style.error(&text)),
            MessageKind::Confirm | MessageKind::Warn => println!("{}", style.warning(&text)),
            MessageKind::Info => println!("{}", style.info(&text)),
        }
    }
    for warning in &result.warnings {
        println!("{}", style.warning(&message_text(warning)));
    }

    if result.blocked {
        println!("{}", style.error("Operation blocked"));
    } else if result.confirm {
        println!("{}", style.warning("Confirmation required"));
    } else {
        println!(
            "{}",
            style.success(&format!(
                "{}: {} hooks ran, none objected",
                result.event,
                result.executed.len()
            ))
        );
    }
}

fn message_text(message: &ResultMessage) -> String {
    match (&message.id, &message.message) {
        (Some(id), Some(text)) => format!("[{id}] {text}"),
        (Some(id), None) => format!("[{id}]"),
        (None, Some(text)) => text.clone(),
        (None, None) => String::new(),
    }
}

/// Print an error to stderr.
pub fn print_error(msg: &str) {
    let style = OutputStyle::default();
    eprintln!("{}", style.error(msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_style_without_colors() {
        let style = OutputStyle { use_colors: false };
        assert_eq!(style.success("test"), "✓ test");
        assert_eq!(style.error("test"), "✗ test");
        assert_eq!(style.warning("test"), "⚠ test");
        assert_eq!(style.info("test"), "ℹ test");
    }

    #[test]
    fn test_message_text_prefixes_hook_id() {
        let message = ResultMessage::for_hook(
            MessageKind::Block,
            "no-push",
            Some("Force push refused".to_string()),
        );
        assert_eq!(message_text(&message), "[no-push] Force push refused");
    }

    #[test]
    fn test_message_text_without_id() {
        let message = ResultMessage::info("Hooks disabled");
        assert_eq!(message_text(&message), "Hooks disabled");
    }

    #[test]
    fn test_list_item_formatting() {
        let style = OutputStyle { use_colors: false };
        let result = style.list_item("fmt-check  command");
        assert!(result.contains("•"));
        assert!(result.contains("fmt-check"));
    }
}
