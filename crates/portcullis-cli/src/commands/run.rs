//! Run command handler
//!
//! Fires the hooks configured for one event and reports the aggregate
//! decision. The exit code is the contract with the host: [`EXIT_OK`]
//! when the operation may proceed, [`EXIT_BLOCKED`] when a hook refused
//! it. With `--json` the full execution result is printed on stdout for
//! the host to parse; without it a human-readable summary is printed.

use std::path::PathBuf;

use serde_json::{json, Value};
use tracing::debug;

use portcullis_hooks::{
    build_context, BridgeOptions, ContextOptions, ContextOverrides, ExecutionResult, HookEvent,
    HooksBridge,
};

use crate::error::{CliError, CliResult, EXIT_BLOCKED, EXIT_OK};
use crate::output;

/// Run command handler
#[derive(Debug, Default)]
pub struct RunCommand {
    pub event: String,
    pub tool: Option<String>,
    pub command: Option<String>,
    pub path: Option<String>,
    pub content: Option<String>,
    pub exit_code: Option<i32>,
    pub success: Option<bool>,
    pub session_id: Option<String>,
    pub params: Option<String>,
    pub config: Option<PathBuf>,
    pub handlers_dir: Option<PathBuf>,
    pub json: bool,
    pub no_stdin: bool,
}

impl RunCommand {
    /// Execute the run command, returning the process exit code.
    pub async fn execute(self) -> CliResult<i32> {
        let event = self.event.parse::<HookEvent>().map_err(|_| {
            let known = HookEvent::ALL.map(|event| event.as_str()).join(", ");
            CliError::InvalidArgument {
                message: format!(
                    "unknown hook event '{}', expected one of: {known}",
                    self.event
                ),
            }
        })?;

        let overrides = ContextOverrides {
            tool: self.tool,
            command: self.command,
            path: self.path,
            content: self.content,
            exit_code: self.exit_code,
            success: self.success,
            cwd: None,
            session_id: self.session_id,
            params: self.params.map(parse_params),
        };

        // Only consume stdin when something is actually piped in; a
        // terminal on stdin would make the deadline read pointless.
        let read_stdin = !self.no_stdin && !atty::is(atty::Stream::Stdin);
        let context = build_context(ContextOptions {
            read_stdin,
            overrides,
        })
        .await;
        debug!(event = %event.as_str(), source = %context.source.as_str(), "assembled context");

        let bridge = HooksBridge::new(BridgeOptions {
            config_path: self.config,
            handlers_dir: self.handlers_dir,
        });
        let result = bridge.execute_hooks(event.as_str(), &context).await;

        if self.json {
            let rendered = serde_json::to_string_pretty(&result)
                .map_err(|err| CliError::Internal(format!("failed to render result: {err}")))?;
            println!("{rendered}");
        } else {
            output::print_result(&result);
        }

        Ok(exit_code_for(&result))
    }
}

/// Maps an execution result to the process exit code.
pub fn exit_code_for(result: &ExecutionResult) -> i32 {
    if result.blocked {
        EXIT_BLOCKED
    } else {
        EXIT_OK
    }
}

/// Extra parameters arrive as a JSON string; anything unparsable is
/// kept verbatim under a `raw` key rather than dropped.
fn parse_params(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or_else(|_| json!({ "raw": raw }))
}
