//! Command hook execution
//!
//! A command hook is a shell template filled in from the context
//! (`{{path}}`, `{{tool}}`, `{{command}}`) and run through `sh -c`.
//! Substitution goes through [`safe_substitute`], so an unsafe template
//! is refused before anything is spawned. Command hooks cannot error;
//! every failure mode collapses to `success: false`, which the executor
//! maps to the hook's `on_failure` action.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{capture_pipe, non_empty};
use crate::context::OperationContext;
use crate::shell::{safe_substitute, SubstituteOptions};

pub(crate) struct CommandOutcome {
    pub success: bool,
    pub message: Option<String>,
    pub output: Option<Value>,
}

impl CommandOutcome {
    fn failed(message: String, output: Option<Value>) -> Self {
        Self {
            success: false,
            message: Some(message),
            output,
        }
    }
}

pub(crate) async fn run_command(
    hook_id: &str,
    template: &str,
    context: &OperationContext,
    timeout: Duration,
    silent: bool,
) -> CommandOutcome {
    let values = context_values(context);
    let substituted = safe_substitute(template, &values, SubstituteOptions::default());
    let command = match substituted.command {
        Some(command) if substituted.safe => command,
        _ => {
            return CommandOutcome::failed(
                format!(
                    "Unsafe command template: {}",
                    substituted.errors.join(", ")
                ),
                None,
            );
        }
    };

    debug!(hook_id = %hook_id, command = %command, "running command hook");

    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(&command)
        .current_dir(&context.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            warn!(hook_id = %hook_id, error = %err, "command failed to spawn");
            return CommandOutcome::failed(format!("Command failed: {err}"), None);
        }
    };

    let stdout_capture = capture_pipe(child.stdout.take());
    let stderr_capture = capture_pipe(child.stderr.take());

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(err)) => {
            return CommandOutcome::failed(format!("Command failed: {err}"), None);
        }
        Err(_) => {
            warn!(hook_id = %hook_id, "command timed out, killing");
            let _ = child.start_kill();
            let _ = tokio::time::timeout(Duration::from_secs(1), child.wait()).await;
            let partial = stdout_capture.settle().await;
            return CommandOutcome::failed(
                "Command timed out".to_string(),
                non_empty(&partial).map(Value::String),
            );
        }
    };

    let stdout = stdout_capture.settle().await;
    let stderr = stderr_capture.settle().await;

    if status.success() {
        CommandOutcome {
            success: true,
            message: if silent {
                None
            } else {
                Some(format!("Executed: {hook_id}"))
            },
            output: non_empty(&stdout).map(Value::String),
        }
    } else {
        CommandOutcome::failed(
            format!("Command failed: {status}"),
            non_empty(&stdout)
                .or_else(|| non_empty(&stderr))
                .map(Value::String),
        )
    }
}

fn context_values(context: &OperationContext) -> HashMap<String, String> {
    [
        ("path", context.path.clone()),
        ("tool", context.tool.clone()),
        ("command", context.command.clone()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value.unwrap_or_default()))
    .collect()
}
