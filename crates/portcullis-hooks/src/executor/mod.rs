//! Single-hook execution
//!
//! [`HookExecutor`] runs one hook against one operation: gate on the
//! matcher expression, gate on the environment condition, then dispatch
//! on the hook's kind. Subprocess dispatch is infallible by construction;
//! the one internal error path left (context serialization) is contained
//! into the result according to the engine's `fail_on_error` setting.

mod command;
mod condition;
mod handler;

pub use condition::ConditionEvaluator;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::context::{serialize_context, OperationContext};
use crate::error::HooksError;
use crate::matcher;
use crate::types::{HookAction, HookDefinition, HookDispatch, HookResult};

use command::run_command;
use handler::run_handler;

pub struct HookExecutor {
    handlers: HashMap<String, PathBuf>,
    timeout: Duration,
    fail_on_error: bool,
}

impl HookExecutor {
    pub fn new(timeout: Duration, fail_on_error: bool) -> Self {
        Self {
            handlers: HashMap::new(),
            timeout,
            fail_on_error,
        }
    }

    /// Registers the program to run for a handler hook. Path resolution
    /// and existence checks are the caller's job.
    pub fn register_handler(&mut self, hook_id: impl Into<String>, program: PathBuf) {
        self.handlers.insert(hook_id.into(), program);
    }

    /// Runs `hook` against the context. `context_value` is the context
    /// serialized once by the caller so matcher evaluation does not
    /// redo it per hook.
    pub async fn execute(
        &self,
        hook: &HookDefinition,
        context: &OperationContext,
        context_value: &Value,
    ) -> HookResult {
        let mut result = HookResult::unmatched(&hook.id);

        if let Some(matcher) = &hook.matcher {
            if !matcher::matches(matcher, context_value) {
                debug!(hook_id = %hook.id, "matcher did not match");
                return result;
            }
        }
        result.matched = true;

        if let Some(condition) = &hook.condition {
            if !ConditionEvaluator::evaluate(condition) {
                debug!(hook_id = %hook.id, "condition not satisfied");
                result.matched = false;
                return result;
            }
        }

        match &hook.dispatch {
            HookDispatch::Action { action } => {
                result.executed = true;
                result.action = *action;
                result.message = hook.message.clone();
            }
            HookDispatch::Handler { .. } => {
                let Some(program) = self.handlers.get(&hook.id) else {
                    result.executed = true;
                    result.action = HookAction::Warn;
                    result.message = Some(format!("Handler not found: {}", hook.id));
                    return result;
                };
                match serialize_context(context) {
                    Ok(json) => {
                        let outcome = run_handler(program, context, &json, self.timeout).await;
                        result.executed = true;
                        result.action = outcome.action;
                        result.message = outcome.message;
                        result.output = outcome.output;
                    }
                    Err(err) => return self.contain_error(result, err),
                }
            }
            HookDispatch::Command {
                template,
                on_failure,
                silent,
            } => {
                let outcome = run_command(&hook.id, template, context, self.timeout, *silent).await;
                result.executed = true;
                result.action = if outcome.success {
                    HookAction::Allow
                } else {
                    *on_failure
                };
                result.message = outcome.message;
                result.output = outcome.output;
            }
        }

        result
    }

    /// Folds an internal failure into the result: block when the engine
    /// is strict about errors, warn otherwise.
    fn contain_error(&self, mut result: HookResult, err: HooksError) -> HookResult {
        result.error = Some(err.to_string());
        result.message = Some(format!("Hook error: {err}"));
        result.action = if self.fail_on_error {
            HookAction::Block
        } else {
            HookAction::Warn
        };
        result
    }
}

const PIPE_SETTLE: Duration = Duration::from_secs(1);

/// Incremental capture of a child pipe.
///
/// A background task appends chunks to a shared buffer as they arrive,
/// so the pipe can never back up and whatever was written before a kill
/// is still available afterwards.
pub(crate) struct PipeCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
    task: Option<JoinHandle<()>>,
}

pub(crate) fn capture_pipe(pipe: Option<impl AsyncRead + Unpin + Send + 'static>) -> PipeCapture {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let task = pipe.map(|mut pipe| {
        let sink = Arc::clone(&buffer);
        tokio::spawn(async move {
            let mut chunk = [0u8; 4096];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
                }
            }
        })
    });
    PipeCapture { buffer, task }
}

impl PipeCapture {
    /// Returns everything the pipe produced, waiting at most a short
    /// grace period for EOF. A grandchild that inherited the pipe and
    /// outlived the handler cannot stall the engine.
    pub(crate) async fn settle(mut self) -> String {
        if let Some(task) = self.task.take() {
            let abort = task.abort_handle();
            if tokio::time::timeout(PIPE_SETTLE, task).await.is_err() {
                abort.abort();
            }
        }
        let buffer = self.buffer.lock().await;
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

impl Drop for PipeCapture {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

pub(crate) fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
