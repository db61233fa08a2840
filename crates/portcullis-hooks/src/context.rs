//! Operation context assembly
//!
//! Every hook run evaluates against an [`OperationContext`] describing the
//! operation the host is about to perform (or just performed). The context
//! is assembled from up to three sources, highest priority first:
//!
//! 1. a JSON document on stdin,
//! 2. `PORTCULLIS_*` environment variables,
//! 3. caller-supplied overrides (CLI flags or host API arguments).
//!
//! Merging fills unset fields only; a lower-priority source never replaces
//! a value a higher-priority source already provided. The `source` field
//! records the highest-priority source that contributed at least one field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::Result;

/// Environment variable holding the serialized context for handler
/// subprocesses.
pub const CONTEXT_ENV_VAR: &str = "PORTCULLIS_CONTEXT";

/// Environment variable overriding the stdin read deadline, in
/// milliseconds.
pub const STDIN_TIMEOUT_ENV: &str = "PORTCULLIS_STDIN_TIMEOUT";

const DEFAULT_STDIN_TIMEOUT_MS: u64 = 5_000;

/// Where the highest-priority context fields came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    Stdin,
    Env,
    Args,
    Test,
}

impl ContextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextSource::Stdin => "stdin",
            ContextSource::Env => "env",
            ContextSource::Args => "args",
            ContextSource::Test => "test",
        }
    }
}

/// A fully assembled operation context.
///
/// Serialized with camelCase keys; matcher expressions address fields by
/// those serialized names (`exitCode`, `sessionId`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationContext {
    pub timestamp: DateTime<Utc>,
    pub source: ContextSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub cwd: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl OperationContext {
    pub fn new() -> Self {
        Self {
            timestamp: Utc::now(),
            source: ContextSource::Args,
            tool: None,
            command: None,
            path: None,
            content: None,
            exit_code: None,
            success: None,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            session_id: None,
            params: None,
        }
    }

    /// A minimal context for tests and examples.
    pub fn for_test() -> Self {
        Self {
            source: ContextSource::Test,
            ..Self::new()
        }
    }

    fn fill(&mut self, overrides: ContextOverrides) {
        self.tool = self.tool.take().or(overrides.tool);
        self.command = self.command.take().or(overrides.command);
        self.path = self.path.take().or(overrides.path);
        self.content = self.content.take().or(overrides.content);
        self.exit_code = self.exit_code.take().or(overrides.exit_code);
        self.success = self.success.take().or(overrides.success);
        self.session_id = self.session_id.take().or(overrides.session_id);
        self.params = self.params.take().or(overrides.params);
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// A partial context, as read from stdin or supplied by a caller.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContextOverrides {
    pub tool: Option<String>,
    pub command: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub exit_code: Option<i32>,
    pub success: Option<bool>,
    pub cwd: Option<PathBuf>,
    pub session_id: Option<String>,
    pub params: Option<Value>,
}

impl ContextOverrides {
    fn is_empty(&self) -> bool {
        self.tool.is_none()
            && self.command.is_none()
            && self.path.is_none()
            && self.content.is_none()
            && self.exit_code.is_none()
            && self.success.is_none()
            && self.cwd.is_none()
            && self.session_id.is_none()
            && self.params.is_none()
    }
}

/// Controls for [`build_context`].
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Read a JSON context document from stdin before consulting the
    /// environment. Callers should disable this when stdin is a terminal.
    pub read_stdin: bool,
    pub overrides: ContextOverrides,
}

/// Assembles a context from stdin, the environment, and `options.overrides`.
///
/// Stdin is read with a deadline so a host that forgets to close the pipe
/// cannot wedge the run; whatever arrived before the deadline is used if
/// it parses. The working directory defaults to the process cwd and can
/// only be replaced by a stdin document.
pub async fn build_context(options: ContextOptions) -> OperationContext {
    let stdin_doc = if options.read_stdin {
        read_stdin_document().await
    } else {
        None
    };
    let env_doc = env_context();
    let args_doc = options.overrides;

    let mut context = OperationContext::new();
    let mut source = None;

    if let Some(doc) = stdin_doc {
        if !doc.is_empty() {
            source = Some(ContextSource::Stdin);
        }
        if let Some(cwd) = doc.cwd.clone() {
            context.cwd = cwd;
        }
        context.fill(doc);
    }
    if !env_doc.is_empty() {
        source.get_or_insert(ContextSource::Env);
    }
    context.fill(env_doc);
    if !args_doc.is_empty() {
        source.get_or_insert(ContextSource::Args);
    }
    context.fill(args_doc);

    context.source = source.unwrap_or(ContextSource::Args);
    normalize_context(&mut context);
    context
}

/// Reads `PORTCULLIS_*` variables into a partial context. Empty values
/// and unparsable numbers count as unset.
pub fn env_context() -> ContextOverrides {
    ContextOverrides {
        tool: non_empty_var("PORTCULLIS_TOOL"),
        command: non_empty_var("PORTCULLIS_COMMAND"),
        path: non_empty_var("PORTCULLIS_PATH"),
        content: non_empty_var("PORTCULLIS_CONTENT"),
        exit_code: non_empty_var("PORTCULLIS_EXIT_CODE").and_then(|v| v.parse().ok()),
        success: non_empty_var("PORTCULLIS_SUCCESS").map(|v| v == "true"),
        cwd: None,
        session_id: non_empty_var("PORTCULLIS_SESSION_ID"),
        params: None,
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Canonicalizes a freshly merged context in place: trims string fields,
/// resolves a relative path against the context cwd, and title-cases the
/// tool name (`shell` is an alias for `Bash`).
pub fn normalize_context(context: &mut OperationContext) {
    if let Some(tool) = context.tool.take() {
        context.tool = Some(canonical_tool_name(tool.trim()));
    }
    if let Some(command) = context.command.take() {
        context.command = Some(command.trim().to_string());
    }
    if let Some(path) = context.path.take() {
        let trimmed = path.trim();
        if !trimmed.is_empty() && Path::new(trimmed).is_relative() {
            context.path = Some(context.cwd.join(trimmed).to_string_lossy().into_owned());
        } else {
            context.path = Some(trimmed.to_string());
        }
    }
}

fn canonical_tool_name(tool: &str) -> String {
    let mut chars = tool.chars();
    let titled: String = match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    };
    if titled == "Shell" {
        "Bash".to_string()
    } else {
        titled
    }
}

/// The context as environment variable pairs for a subprocess. Unset
/// fields produce no pair.
pub fn export_env_vars(context: &OperationContext) -> Vec<(String, String)> {
    let mut vars = vec![
        (
            "PORTCULLIS_TIMESTAMP".to_string(),
            context.timestamp.to_rfc3339(),
        ),
        (
            "PORTCULLIS_SOURCE".to_string(),
            context.source.as_str().to_string(),
        ),
        (
            "PORTCULLIS_CWD".to_string(),
            context.cwd.to_string_lossy().into_owned(),
        ),
    ];
    let mut push = |name: &str, value: Option<String>| {
        if let Some(value) = value {
            vars.push((name.to_string(), value));
        }
    };
    push("PORTCULLIS_TOOL", context.tool.clone());
    push("PORTCULLIS_COMMAND", context.command.clone());
    push("PORTCULLIS_PATH", context.path.clone());
    push("PORTCULLIS_CONTENT", context.content.clone());
    push("PORTCULLIS_EXIT_CODE", context.exit_code.map(|c| c.to_string()));
    push("PORTCULLIS_SUCCESS", context.success.map(|s| s.to_string()));
    push("PORTCULLIS_SESSION_ID", context.session_id.clone());
    push(
        "PORTCULLIS_PARAMS",
        context
            .params
            .as_ref()
            .map(|p| serde_json::to_string(p).unwrap_or_default()),
    );
    vars
}

/// Pretty-prints the context for `PORTCULLIS_CONTEXT`.
pub fn serialize_context(context: &OperationContext) -> Result<String> {
    Ok(serde_json::to_string_pretty(context)?)
}

async fn read_stdin_document() -> Option<ContextOverrides> {
    let text = read_stdin_with_deadline(stdin_timeout()).await?;
    match serde_json::from_str(&text) {
        Ok(doc) => Some(doc),
        Err(err) => {
            debug!(error = %err, "stdin was not a JSON context document, ignoring");
            None
        }
    }
}

/// Reads stdin until EOF or the deadline, whichever comes first. A
/// partial read at the deadline is kept; a read error keeps whatever
/// arrived before it.
async fn read_stdin_with_deadline(timeout: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + timeout;
    let mut stdin = tokio::io::stdin();
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match tokio::time::timeout_at(deadline, stdin.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(n)) => buf.extend_from_slice(&chunk[..n]),
            Ok(Err(err)) => {
                debug!(error = %err, "stdin read failed");
                break;
            }
            Err(_) => {
                debug!("stdin read deadline reached, keeping partial input");
                break;
            }
        }
    }
    if buf.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn stdin_timeout() -> Duration {
    let ms = std::env::var(STDIN_TIMEOUT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_STDIN_TIMEOUT_MS);
    Duration::from_millis(ms)
}
