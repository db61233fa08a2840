//! Portcullis Hooks Engine
//!
//! Policy hooks that let a coding-assistant host delegate allow, block,
//! confirm, and warn decisions to user-configured rules.
//!
//! # Overview
//!
//! The host fires a lifecycle event (`PreToolUse`, `PostToolUse`, ...)
//! with a context describing the operation at hand. The engine runs the
//! hooks configured for that event and folds their individual verdicts
//! into one [`ExecutionResult`] the host acts on: refuse the operation,
//! ask the user first, surface warnings, or proceed.
//!
//! # Architecture
//!
//! The engine consists of five main components:
//!
//! 1. **Bridge** (`bridge`): Schedules hooks per event and folds decisions
//! 2. **Executor** (`executor`): Runs a single hook (action, handler, or command)
//! 3. **Matcher** (`matcher`): Expression DSL gating hooks on the context
//! 4. **Context** (`context`): Assembles the operation context from stdin, env, and args
//! 5. **Configuration** (`config`): Loads and validates the hooks file
//!
//! # Quick Start
//!
//! ```ignore
//! use portcullis_hooks::{
//!     build_context, BridgeOptions, ContextOptions, ContextOverrides, HooksBridge,
//! };
//!
//! // Load ~/.portcullis/hooks.json and register handler programs
//! let bridge = HooksBridge::new(BridgeOptions::default());
//!
//! // Describe the operation about to happen
//! let context = build_context(ContextOptions {
//!     read_stdin: false,
//!     overrides: ContextOverrides {
//!         tool: Some("Bash".to_string()),
//!         command: Some("git push --force".to_string()),
//!         ..Default::default()
//!     },
//! })
//! .await;
//!
//! // Ask the hooks for a decision
//! let outcome = bridge.execute_hooks("PreToolUse", &context).await;
//! if outcome.blocked {
//!     eprintln!("operation refused by hooks");
//! }
//! ```
//!
//! # Configuration
//!
//! Hooks live in a JSON file (`~/.portcullis/hooks.json`):
//!
//! ```json
//! {
//!   "settings": { "enabled": true, "timeoutMs": 30000 },
//!   "hooks": {
//!     "PreToolUse": [
//!       {
//!         "id": "no-force-push",
//!         "matcher": "tool == 'Bash' && command contains 'push --force'",
//!         "action": "block",
//!         "message": "force pushes go through review"
//!       }
//!     ]
//!   }
//! }
//! ```
//!
//! # Hook Kinds
//!
//! Every hook carries exactly one dispatch kind:
//!
//! - **Action**: resolve immediately with a fixed verdict
//! - **Handler**: spawn an external program that reports a verdict as JSON on stdout
//! - **Command**: substitute context values into a shell template and run it
//!
//! # Decision Folding
//!
//! Any matched block makes the whole result blocked; any matched confirm
//! sets the confirm flag; warns accumulate. Sequential execution stops at
//! the first block, parallel execution runs everything and folds in
//! configuration order.
//!
//! # Matching
//!
//! Two small DSLs gate each hook, with deliberately different failure
//! policies. Matcher expressions (`tool == 'Bash' && command matches
//! 'rm\s+-rf'`) fail closed: an expression that does not parse matches
//! nothing. Environment conditions (`file_exists('package.json')`) fail
//! open: an unrecognized clause is treated as satisfied, since conditions
//! only narrow where a hook runs.
//!
//! # Error Handling
//!
//! All fallible operations return `Result<T>`, an alias for
//! `std::result::Result<T, HooksError>`. Hook execution itself never
//! errors: subprocess failures, timeouts, and bad handler output are
//! folded into warn (or block, with `failOnError`) results so one broken
//! hook cannot take the host down.

pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod matcher;
pub mod shell;
pub mod types;

// Re-export public types
pub use bridge::{BridgeOptions, HooksBridge};
pub use context::{
    build_context, export_env_vars, serialize_context, ContextOptions, ContextOverrides,
    ContextSource, OperationContext,
};
pub use error::{HooksError, Result};
pub use executor::{ConditionEvaluator, HookExecutor};
pub use matcher::{MatchError, ValidationResult};
pub use types::{
    ExecutionResult, HookAction, HookDefinition, HookDispatch, HookEvent, HookResult, HooksConfig,
    HooksSettings, MessageKind, ResultMessage,
};
