//! Shell escaping and command template safety
//!
//! Command hooks are written as templates (`git add {{path}}`) that get
//! filled in from the operation context and run through `sh -c`. Every
//! substituted value is single-quoted first, so context data can never
//! smuggle shell syntax into the command. Templates themselves are
//! linted before substitution: constructs that would let a placeholder
//! feed another command (pipes, redirects, command substitution) are
//! rejected outright.
//!
//! [`check_command_safety`] is advisory only. It flags command lines
//! that look destructive so configuration linting can surface them; it
//! never blocks execution.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

const SHELL_METACHARACTERS: &[char] = &[
    '|', '&', ';', '<', '>', '(', ')', '$', '`', '\\', '"', '\'', ' ', '\t', '\n', '*', '?', '[',
    ']', '#', '~', '=', '%', '!', '{', '}',
];

/// Whether `c` has meaning to a POSIX shell outside quotes.
pub fn is_shell_metacharacter(c: char) -> bool {
    SHELL_METACHARACTERS.contains(&c)
}

/// Quotes `arg` for safe interpolation into a shell command line.
///
/// Arguments without metacharacters pass through untouched; everything
/// else is single-quoted, with embedded single quotes rewritten as
/// `'\''`.
pub fn escape_shell_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }
    if !arg.chars().any(is_shell_metacharacter) {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

/// Escapes each argument and joins them with spaces.
pub fn escape_shell_args<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .map(|arg| escape_shell_arg(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Outcome of linting a command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateValidation {
    pub valid: bool,
    pub errors: Vec<String>,
}

fn template_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"\$\(", "Command substitution $() is not allowed"),
            (r"`", "Backtick command substitution is not allowed"),
            (r"\|.*\{\{", "Pipe before placeholder is dangerous"),
            (r"\{\{.*\}\}.*\|", "Pipe after placeholder is dangerous"),
            (r";\s*\{\{", "Semicolon before placeholder is dangerous"),
            (r"\{\{.*\}\}.*;\s*\w", "Semicolon after placeholder with command is dangerous"),
            (r">\s*\{\{", "Redirect to placeholder is dangerous"),
            (r"\{\{.*\}\}.*>", "Redirect after placeholder is dangerous"),
        ]
        .into_iter()
        .map(|(pattern, message)| (Regex::new(pattern).expect("template rule pattern"), message))
        .collect()
    })
}

/// Lints a command template for constructs that would let a substituted
/// placeholder reach another command. Returns every violated rule.
pub fn validate_command_template(template: &str) -> TemplateValidation {
    let errors: Vec<String> = template_rules()
        .iter()
        .filter(|(pattern, _)| pattern.is_match(template))
        .map(|(_, message)| (*message).to_string())
        .collect();
    TemplateValidation {
        valid: errors.is_empty(),
        errors,
    }
}

/// Controls for [`safe_substitute`].
#[derive(Debug, Clone, Copy)]
pub struct SubstituteOptions {
    /// Lint the template before substituting. On by default; turn off
    /// only for templates that were already validated at load time.
    pub validate_template: bool,
}

impl Default for SubstituteOptions {
    fn default() -> Self {
        Self {
            validate_template: true,
        }
    }
}

/// Outcome of substituting values into a template.
///
/// `command` is `None` only when template validation failed; leftover
/// placeholders still produce a command, flagged unsafe, so callers can
/// report what was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSubstituteResult {
    pub command: Option<String>,
    pub safe: bool,
    pub errors: Vec<String>,
}

/// Replaces every `{{key}}` in `template` with the shell-escaped value
/// from `values`.
pub fn safe_substitute(
    template: &str,
    values: &HashMap<String, String>,
    options: SubstituteOptions,
) -> SafeSubstituteResult {
    if options.validate_template {
        let validation = validate_command_template(template);
        if !validation.valid {
            return SafeSubstituteResult {
                command: None,
                safe: false,
                errors: validation.errors,
            };
        }
    }

    let mut command = template.to_string();
    for (key, value) in values {
        let placeholder = format!("{{{{{key}}}}}");
        command = command.replace(&placeholder, &escape_shell_arg(value));
    }

    let leftover: Vec<&str> = placeholder_pattern()
        .find_iter(&command)
        .map(|m| m.as_str())
        .collect();
    if leftover.is_empty() {
        SafeSubstituteResult {
            command: Some(command),
            safe: true,
            errors: Vec::new(),
        }
    } else {
        let errors = vec![format!(
            "Unsubstituted placeholders: {}",
            leftover.join(", ")
        )];
        SafeSubstituteResult {
            command: Some(command),
            safe: false,
            errors,
        }
    }
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{[^}]+\}\}").expect("placeholder pattern"))
}

/// Advisory scan of a full command line for destructive idioms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSafety {
    pub safe: bool,
    pub warnings: Vec<String>,
}

fn safety_rules() -> &'static [(Regex, &'static str)] {
    static RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    RULES.get_or_init(|| {
        [
            (r"rm\s+-rf\s+[/~]", "Removing root or home directory"),
            (r"rm\s+-rf\s+\*", "Removing with wildcard"),
            (r">\s*/dev/sd", "Writing to block device"),
            (r"mkfs\.", "Formatting filesystem"),
            (r"dd\s+.*of=/dev", "DD to device"),
            (r"chmod\s+777", "Setting world-writable permissions"),
            (r"curl.*\|\s*(ba)?sh", "Piping curl to shell"),
            (r"wget.*\|\s*(ba)?sh", "Piping wget to shell"),
            (r"eval\s", "Using eval"),
            (r"\$\([^)]*\)", "Command substitution detected"),
        ]
        .into_iter()
        .map(|(pattern, message)| (Regex::new(pattern).expect("safety rule pattern"), message))
        .collect()
    })
}

/// Flags destructive-looking commands. Purely informational; the caller
/// decides what to do with the warnings.
pub fn check_command_safety(command: &str) -> CommandSafety {
    let warnings: Vec<String> = safety_rules()
        .iter()
        .filter(|(pattern, _)| pattern.is_match(command))
        .map(|(_, message)| (*message).to_string())
        .collect();
    CommandSafety {
        safe: warnings.is_empty(),
        warnings,
    }
}
