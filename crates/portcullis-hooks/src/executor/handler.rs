//! Handler subprocess protocol
//!
//! A handler is an external program registered for a hook. It receives
//! the operation context twice over: as individual `PORTCULLIS_*`
//! environment variables and as one JSON document in
//! `PORTCULLIS_CONTEXT`. It answers on stdout, ideally with JSON:
//!
//! ```json
//! {"result": {"action": "block", "messages": [{"message": "not on main"}]}}
//! ```
//!
//! A handler can only decide the operation's fate by exiting zero. A
//! non-zero exit demotes whatever it printed to a warning, so a crashing
//! handler degrades to advice instead of vetoing operations it never
//! actually judged. Handlers that print non-JSON are treated as opaque:
//! exit zero allows, anything else warns, and the raw output is kept.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{capture_pipe, non_empty};
use crate::context::{export_env_vars, OperationContext, CONTEXT_ENV_VAR};
use crate::types::HookAction;

/// What a handler run produced. Always well-formed; failures are
/// expressed as warn-level outcomes rather than errors.
pub(crate) struct HandlerOutcome {
    pub action: HookAction,
    pub message: Option<String>,
    pub output: Option<Value>,
}

pub(crate) async fn run_handler(
    program: &Path,
    context: &OperationContext,
    context_json: &str,
    timeout: Duration,
) -> HandlerOutcome {
    let mut child = match Command::new(program)
        .envs(export_env_vars(context))
        .env(CONTEXT_ENV_VAR, context_json)
        .current_dir(&context.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            warn!(program = %program.display(), error = %err, "handler failed to spawn");
            return HandlerOutcome {
                action: HookAction::Warn,
                message: Some(format!("Handler error: {err}")),
                output: None,
            };
        }
    };

    let stdout_capture = capture_pipe(child.stdout.take());
    let stderr_capture = capture_pipe(child.stderr.take());

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(err)) => {
            warn!(program = %program.display(), error = %err, "handler wait failed");
            return HandlerOutcome {
                action: HookAction::Warn,
                message: Some(format!("Handler error: {err}")),
                output: None,
            };
        }
        Err(_) => {
            warn!(program = %program.display(), "handler timed out, killing");
            let _ = child.start_kill();
            let _ = tokio::time::timeout(Duration::from_secs(1), child.wait()).await;
            let partial = stdout_capture.settle().await;
            return HandlerOutcome {
                action: HookAction::Warn,
                message: Some("Handler timed out".to_string()),
                output: non_empty(&partial).map(Value::String),
            };
        }
    };

    let stdout = stdout_capture.settle().await;
    let stderr = stderr_capture.settle().await;
    let clean_exit = status.success();

    match serde_json::from_str::<Value>(stdout.trim()) {
        Ok(parsed) => {
            let verdict = parsed.get("result");
            let action = if clean_exit {
                verdict
                    .and_then(|r| r.get("action"))
                    .and_then(Value::as_str)
                    .map(HookAction::from_wire)
                    .unwrap_or(HookAction::Allow)
            } else {
                debug!(program = %program.display(), %status, "handler exited non-zero, demoting to warn");
                HookAction::Warn
            };
            let message = verdict
                .and_then(|r| r.get("messages"))
                .and_then(|m| m.get(0))
                .and_then(|m| m.get("message"))
                .and_then(Value::as_str)
                .or_else(|| parsed.get("message").and_then(Value::as_str))
                .map(String::from);
            HandlerOutcome {
                action,
                message,
                output: Some(parsed),
            }
        }
        Err(_) => {
            let action = if clean_exit {
                HookAction::Allow
            } else {
                HookAction::Warn
            };
            HandlerOutcome {
                action,
                message: non_empty(&stderr).or_else(|| non_empty(&stdout)),
                output: non_empty(&stdout).map(Value::String),
            }
        }
    }
}
