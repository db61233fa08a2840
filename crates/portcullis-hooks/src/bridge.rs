//! Event scheduling and decision folding
//!
//! [`HooksBridge`] is the host-facing entry point: it owns the loaded
//! configuration and a [`HookExecutor`], and turns "event X happened
//! with context Y" into one aggregated [`ExecutionResult`].
//!
//! Hooks for an event run in configuration order. Sequentially, a block
//! short-circuits: hooks after the blocking one are not started, and do
//! not appear in the result. In parallel mode every hook runs to
//! completion and the results are folded in configuration order, so a
//! block cannot cancel its neighbors. Either way, every evaluated hook
//! leaves a [`HookResult`] in `executed`, matched or not.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{load_config, resolve_config_path};
use crate::context::OperationContext;
use crate::executor::HookExecutor;
use crate::types::{
    ExecutionResult, HookAction, HookDefinition, HookDispatch, HookResult, HooksConfig,
    MessageKind, ResultMessage,
};

/// Where to find the configuration and handler programs.
#[derive(Debug, Clone, Default)]
pub struct BridgeOptions {
    /// Configuration file; resolved against the environment override
    /// and the per-user default when absent.
    pub config_path: Option<PathBuf>,
    /// Base directory for relative handler paths. Defaults to the
    /// directory the configuration file lives in.
    pub handlers_dir: Option<PathBuf>,
}

pub struct HooksBridge {
    config: HooksConfig,
    executor: HookExecutor,
}

impl HooksBridge {
    /// Loads the configuration and registers handler programs. Loading
    /// degrades on errors, so construction always succeeds; a broken
    /// setup yields a disabled bridge.
    pub fn new(options: BridgeOptions) -> Self {
        let config_path = resolve_config_path(options.config_path);
        let config = load_config(&config_path);
        let handlers_dir = options.handlers_dir.unwrap_or_else(|| {
            config_path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."))
        });
        Self::with_config(config, &handlers_dir)
    }

    /// Builds a bridge from an in-memory configuration. Handler paths
    /// resolve against `handlers_dir`.
    pub fn with_config(config: HooksConfig, handlers_dir: &Path) -> Self {
        let settings = &config.settings;
        let mut executor = HookExecutor::new(
            std::time::Duration::from_millis(settings.timeout_ms),
            settings.fail_on_error,
        );
        register_handlers(&config, handlers_dir, &mut executor);
        Self { config, executor }
    }

    pub fn config(&self) -> &HooksConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.settings.enabled
    }

    /// Runs every hook configured for `event` and folds the results.
    ///
    /// Unknown event names select no hooks and return an empty result;
    /// a disabled engine returns a result carrying only an info message.
    pub async fn execute_hooks(&self, event: &str, context: &OperationContext) -> ExecutionResult {
        let mut result = ExecutionResult::empty(event);

        if !self.is_enabled() {
            debug!(event = %event, "hooks are disabled");
            result.messages.push(ResultMessage::info("Hooks disabled"));
            return result;
        }

        let hooks = match self.config.hooks.get(event) {
            Some(hooks) if !hooks.is_empty() => hooks,
            _ => return result,
        };

        let context_value = serde_json::to_value(context).unwrap_or(Value::Null);
        info!(
            event = %event,
            hooks = hooks.len(),
            parallel = self.config.settings.parallel_hooks,
            "executing hooks"
        );

        if self.config.settings.parallel_hooks {
            let runs = hooks
                .iter()
                .map(|hook| self.executor.execute(hook, context, &context_value));
            for (hook, hook_result) in hooks.iter().zip(join_all(runs).await) {
                fold_result(&mut result, hook, hook_result);
            }
        } else {
            for hook in hooks {
                if result.blocked {
                    break;
                }
                let hook_result = self.executor.execute(hook, context, &context_value).await;
                fold_result(&mut result, hook, hook_result);
            }
        }

        result
    }
}

/// Registers every handler hook's program with the executor. A handler
/// whose program does not exist is left unregistered and reports
/// "Handler not found" when it fires.
fn register_handlers(config: &HooksConfig, handlers_dir: &Path, executor: &mut HookExecutor) {
    for hook in config.hooks.values().flatten() {
        let HookDispatch::Handler { path } = &hook.dispatch else {
            continue;
        };
        let program = if Path::new(path).is_absolute() {
            PathBuf::from(path)
        } else {
            handlers_dir.join(path)
        };
        if program.exists() {
            executor.register_handler(&hook.id, program);
        } else {
            warn!(
                hook_id = %hook.id,
                program = %program.display(),
                "handler program not found"
            );
        }
    }
}

/// Records a hook result on the aggregate. Every result lands in
/// `executed`; only matched results steer the decision. The message
/// falls back to the definition's own when the run produced none.
fn fold_result(result: &mut ExecutionResult, hook: &HookDefinition, hook_result: HookResult) {
    debug!(
        hook_id = %hook_result.id,
        matched = hook_result.matched,
        action = %hook_result.action,
        "hook evaluated"
    );
    if hook_result.matched {
        let message = hook_result.message.clone().or_else(|| hook.message.clone());
        match hook_result.action {
            HookAction::Block => {
                result.blocked = true;
                result.messages.push(ResultMessage::for_hook(
                    MessageKind::Block,
                    &hook_result.id,
                    message,
                ));
            }
            HookAction::Confirm => {
                result.confirm = true;
                result.messages.push(ResultMessage::for_hook(
                    MessageKind::Confirm,
                    &hook_result.id,
                    message,
                ));
            }
            HookAction::Warn => {
                result.warnings.push(ResultMessage::for_hook(
                    MessageKind::Warn,
                    &hook_result.id,
                    message,
                ));
            }
            HookAction::Allow => {}
        }
    }
    result.executed.push(hook_result);
}
