//! Validate command handler
//!
//! Lints a hooks configuration without executing anything: matcher
//! syntax, command template injection rules, dispatch exclusivity, and
//! event names. Destructive-looking commands are reported as advisories
//! and do not fail validation.

use std::path::PathBuf;
use std::str::FromStr;

use portcullis_hooks::{config, matcher, shell, HookDefinition, HookEvent, HooksError};

use crate::error::{CliResult, EXIT_BLOCKED, EXIT_OK};
use crate::output::OutputStyle;

/// Validate command handler
pub struct ValidateCommand {
    config: Option<PathBuf>,
}

impl ValidateCommand {
    /// Create a new validate command
    pub fn new(config: Option<PathBuf>) -> Self {
        Self { config }
    }

    /// Execute the validate command, returning the process exit code.
    pub fn execute(self) -> CliResult<i32> {
        let style = OutputStyle::default();
        let path = config::resolve_config_path(self.config);

        let raw = match config::read_raw(&path) {
            Ok(raw) => raw,
            Err(HooksError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                println!(
                    "{}",
                    style.info(&format!("No hooks configuration at {}", path.display()))
                );
                return Ok(EXIT_OK);
            }
            Err(err) => return Err(err.into()),
        };

        let mut problems = Vec::new();
        let mut advisories = Vec::new();
        let mut total = 0usize;

        let mut entries: Vec<_> = raw.hooks.iter().collect();
        entries.sort_by_key(|(event, _)| event.as_str());

        for (event, hooks) in entries {
            if HookEvent::from_str(event).is_err() {
                problems.push(format!("unknown event '{event}'"));
            }
            for hook in hooks {
                total += 1;
                let label = format!("{event}/{}", hook.id);

                if let Some(expression) = &hook.matcher {
                    let validation = matcher::validate(expression);
                    if !validation.valid {
                        problems.push(format!(
                            "{label}: invalid matcher: {}",
                            validation.error.unwrap_or_default()
                        ));
                    }
                }

                if let Some(template) = &hook.command {
                    let lint = shell::validate_command_template(template);
                    for error in lint.errors {
                        problems.push(format!("{label}: {error}"));
                    }
                    let safety = shell::check_command_safety(template);
                    for warning in safety.warnings {
                        advisories.push(format!("{label}: {warning}"));
                    }
                }

                if let Err(err) = HookDefinition::try_from(hook.clone()) {
                    problems.push(format!("{label}: {err}"));
                }
            }
        }

        for problem in &problems {
            println!("{}", style.error(problem));
        }
        for advisory in &advisories {
            println!("{}", style.warning(advisory));
        }

        if problems.is_empty() {
            println!(
                "{}",
                style.success(&format!(
                    "Configuration valid: {total} hooks ({})",
                    path.display()
                ))
            );
            Ok(EXIT_OK)
        } else {
            println!(
                "{}",
                style.error(&format!(
                    "{} problem(s) in {}",
                    problems.len(),
                    path.display()
                ))
            );
            Ok(EXIT_BLOCKED)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_valid_config_passes() {
        let file = write_config(
            r#"{"hooks": {"PreToolUse": [
                {"id": "guard", "matcher": "tool == 'Bash'", "action": "block"}
            ]}}"#,
        );
        let cmd = ValidateCommand::new(Some(file.path().to_path_buf()));
        assert_eq!(cmd.execute().unwrap(), EXIT_OK);
    }

    #[test]
    fn test_broken_matcher_fails() {
        let file = write_config(
            r#"{"hooks": {"PreToolUse": [
                {"id": "guard", "matcher": "tool ==", "action": "block"}
            ]}}"#,
        );
        let cmd = ValidateCommand::new(Some(file.path().to_path_buf()));
        assert_eq!(cmd.execute().unwrap(), EXIT_BLOCKED);
    }

    #[test]
    fn test_ambiguous_dispatch_fails() {
        let file = write_config(
            r#"{"hooks": {"PreToolUse": [
                {"id": "both", "action": "allow", "command": "true"}
            ]}}"#,
        );
        let cmd = ValidateCommand::new(Some(file.path().to_path_buf()));
        assert_eq!(cmd.execute().unwrap(), EXIT_BLOCKED);
    }

    #[test]
    fn test_injection_prone_template_fails() {
        let file = write_config(
            r#"{"hooks": {"PostToolUse": [
                {"id": "fmt", "command": "rustfmt $({{path}})"}
            ]}}"#,
        );
        let cmd = ValidateCommand::new(Some(file.path().to_path_buf()));
        assert_eq!(cmd.execute().unwrap(), EXIT_BLOCKED);
    }

    #[test]
    fn test_unknown_event_name_fails() {
        let file = write_config(
            r#"{"hooks": {"OnTeapot": [
                {"id": "steep", "action": "warn"}
            ]}}"#,
        );
        let cmd = ValidateCommand::new(Some(file.path().to_path_buf()));
        assert_eq!(cmd.execute().unwrap(), EXIT_BLOCKED);
    }

    #[test]
    fn test_dangerous_command_is_advisory_only() {
        let file = write_config(
            r#"{"hooks": {"PostToolUse": [
                {"id": "cleanup", "command": "rm -rf /tmp/scratch"}
            ]}}"#,
        );
        let cmd = ValidateCommand::new(Some(file.path().to_path_buf()));
        assert_eq!(cmd.execute().unwrap(), EXIT_OK);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let cmd = ValidateCommand::new(Some(PathBuf::from("/no/such/hooks.json")));
        assert_eq!(cmd.execute().unwrap(), EXIT_OK);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        let file = write_config("{not json");
        let cmd = ValidateCommand::new(Some(file.path().to_path_buf()));
        assert!(cmd.execute().is_err());
    }
}
