//! Core types for the hooks engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::HooksError;

/// Decision verb a hook resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookAction {
    /// Let the operation proceed
    Allow,
    /// Refuse the operation
    Block,
    /// Ask the user before proceeding
    Confirm,
    /// Let the operation proceed but surface a warning
    Warn,
}

impl HookAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookAction::Allow => "allow",
            HookAction::Block => "block",
            HookAction::Confirm => "confirm",
            HookAction::Warn => "warn",
        }
    }

    /// Parses an action name from a handler report. Unrecognized names fall
    /// back to allow, which the folding step treats as a no-op.
    pub fn from_wire(value: &str) -> HookAction {
        match value {
            "block" => HookAction::Block,
            "confirm" => HookAction::Confirm,
            "warn" => HookAction::Warn,
            _ => HookAction::Allow,
        }
    }
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a hook produces its decision.
///
/// Exactly one dispatch kind is attached to every definition; configurations
/// mixing several kinds (or declaring none) are rejected at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum HookDispatch {
    /// Resolve immediately with a fixed action
    Action { action: HookAction },
    /// Spawn a handler program that reports a decision on stdout
    Handler { path: String },
    /// Substitute context values into a shell command template and run it
    Command {
        template: String,
        on_failure: HookAction,
        silent: bool,
    },
}

impl HookDispatch {
    pub fn kind(&self) -> &'static str {
        match self {
            HookDispatch::Action { .. } => "action",
            HookDispatch::Handler { .. } => "handler",
            HookDispatch::Command { .. } => "command",
        }
    }
}

/// A single configured hook.
#[derive(Debug, Clone, PartialEq)]
pub struct HookDefinition {
    /// Identifier used in logs, results, and handler registration
    pub id: String,
    /// Matcher expression gating the hook; absent matches everything
    pub matcher: Option<String>,
    /// Environment precondition, e.g. `file_exists('package.json')`
    pub condition: Option<String>,
    /// Message shown when the hook fires and produces none of its own
    pub message: Option<String>,
    pub dispatch: HookDispatch,
}

/// Wire form of a hook definition as it appears in the configuration file.
///
/// The flat shape keeps hand-written configs short; [`HookDefinition`]
/// enforces dispatch exclusivity on conversion.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHookDefinition {
    pub id: String,
    #[serde(default)]
    pub matcher: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub action: Option<HookAction>,
    #[serde(default)]
    pub handler: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub on_failure: Option<HookAction>,
    #[serde(default)]
    pub silent: Option<bool>,
}

impl TryFrom<RawHookDefinition> for HookDefinition {
    type Error = HooksError;

    fn try_from(raw: RawHookDefinition) -> Result<Self, HooksError> {
        let RawHookDefinition {
            id,
            matcher,
            condition,
            message,
            action,
            handler,
            command,
            on_failure,
            silent,
        } = raw;

        let dispatch = match (action, handler, command) {
            (Some(action), None, None) => HookDispatch::Action { action },
            (None, Some(path), None) => HookDispatch::Handler { path },
            (None, None, Some(template)) => HookDispatch::Command {
                template,
                on_failure: on_failure.unwrap_or(HookAction::Warn),
                silent: silent.unwrap_or(false),
            },
            (None, None, None) => {
                return Err(HooksError::InvalidConfiguration(format!(
                    "hook '{id}' declares no action, handler, or command"
                )))
            }
            _ => {
                return Err(HooksError::InvalidConfiguration(format!(
                    "hook '{id}' declares more than one of action, handler, and command"
                )))
            }
        };

        Ok(HookDefinition {
            id,
            matcher,
            condition,
            message,
            dispatch,
        })
    }
}

/// Scheduler settings shared by every hook in a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HooksSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Per-hook time budget in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Dispatch all hooks of an event concurrently instead of in order
    #[serde(default)]
    pub parallel_hooks: bool,
    /// Turn contained hook errors into blocks instead of warnings
    #[serde(default)]
    pub fail_on_error: bool,
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for HooksSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            timeout_ms: default_timeout_ms(),
            parallel_hooks: false,
            fail_on_error: false,
        }
    }
}

/// Wire form of a configuration document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHooksConfig {
    #[serde(default)]
    pub settings: HooksSettings,
    #[serde(default)]
    pub hooks: HashMap<String, Vec<RawHookDefinition>>,
}

/// A validated hooks configuration: settings plus ordered definitions per
/// event name. Order within an event is load-bearing; deny rules placed
/// first are evaluated first.
#[derive(Debug, Clone, Default)]
pub struct HooksConfig {
    pub settings: HooksSettings,
    pub hooks: HashMap<String, Vec<HookDefinition>>,
}

/// Outcome of evaluating a single hook. Produced for every evaluated hook,
/// matched or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookResult {
    pub id: String,
    pub matched: bool,
    pub executed: bool,
    pub action: HookAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl HookResult {
    /// Result for a hook whose matcher or condition did not select it.
    pub fn unmatched(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            matched: false,
            executed: false,
            action: HookAction::Allow,
            message: None,
            error: None,
            output: None,
        }
    }
}

/// Classification of a message attached to an execution result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Block,
    Confirm,
    Warn,
}

/// A user-facing message produced while executing hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ResultMessage {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            id: None,
            message: Some(message.into()),
        }
    }

    pub fn for_hook(kind: MessageKind, id: impl Into<String>, message: Option<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
            message,
        }
    }
}

/// Aggregated outcome of running every hook configured for one event.
/// This is the sole artifact returned to the host; a fresh value is built
/// per call and no state is carried between events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub event: String,
    pub timestamp: DateTime<Utc>,
    pub blocked: bool,
    pub confirm: bool,
    pub warnings: Vec<ResultMessage>,
    pub messages: Vec<ResultMessage>,
    pub executed: Vec<HookResult>,
}

impl ExecutionResult {
    pub fn empty(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            timestamp: Utc::now(),
            blocked: false,
            confirm: false,
            warnings: Vec::new(),
            messages: Vec::new(),
            executed: Vec::new(),
        }
    }
}

/// Lifecycle events a host can fire hooks for.
///
/// The scheduler itself is string-keyed, so unknown event names simply select
/// no hooks; this enum is the typed surface for callers that validate event
/// names up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HookEvent {
    PreToolUse,
    PostToolUse,
    SessionStart,
    SessionEnd,
    PreCompact,
    Stop,
}

impl HookEvent {
    pub const ALL: [HookEvent; 6] = [
        HookEvent::PreToolUse,
        HookEvent::PostToolUse,
        HookEvent::SessionStart,
        HookEvent::SessionEnd,
        HookEvent::PreCompact,
        HookEvent::Stop,
    ];

    /// Canonical name, used as the configuration key.
    pub fn as_str(&self) -> &'static str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::SessionStart => "SessionStart",
            HookEvent::SessionEnd => "SessionEnd",
            HookEvent::PreCompact => "PreCompact",
            HookEvent::Stop => "Stop",
        }
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookEvent {
    type Err = HooksError;

    /// Accepts canonical PascalCase names and kebab-case aliases.
    fn from_str(s: &str) -> Result<Self, HooksError> {
        match s {
            "PreToolUse" | "pre-tool-use" => Ok(HookEvent::PreToolUse),
            "PostToolUse" | "post-tool-use" => Ok(HookEvent::PostToolUse),
            "SessionStart" | "session-start" => Ok(HookEvent::SessionStart),
            "SessionEnd" | "session-end" => Ok(HookEvent::SessionEnd),
            "PreCompact" | "pre-compact" => Ok(HookEvent::PreCompact),
            "Stop" | "stop" => Ok(HookEvent::Stop),
            other => Err(HooksError::UnknownEvent(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_hook(fields: Value) -> RawHookDefinition {
        serde_json::from_value(fields).unwrap()
    }

    #[test]
    fn test_action_dispatch_conversion() {
        let hook = HookDefinition::try_from(raw_hook(json!({
            "id": "block-push",
            "matcher": "command contains 'git push'",
            "action": "block",
            "message": "pushes are reviewed first"
        })))
        .unwrap();

        assert_eq!(
            hook.dispatch,
            HookDispatch::Action {
                action: HookAction::Block
            }
        );
        assert_eq!(hook.message.as_deref(), Some("pushes are reviewed first"));
    }

    #[test]
    fn test_command_dispatch_defaults() {
        let hook = HookDefinition::try_from(raw_hook(json!({
            "id": "fmt",
            "command": "cargo fmt -- {{path}}"
        })))
        .unwrap();

        match hook.dispatch {
            HookDispatch::Command {
                on_failure, silent, ..
            } => {
                assert_eq!(on_failure, HookAction::Warn);
                assert!(!silent);
            }
            other => panic!("expected command dispatch, got {other:?}"),
        }
    }

    #[test]
    fn test_command_dispatch_reads_camel_case_fields() {
        let hook = HookDefinition::try_from(raw_hook(json!({
            "id": "strict-fmt",
            "command": "cargo fmt --check",
            "onFailure": "block",
            "silent": true
        })))
        .unwrap();

        assert_eq!(
            hook.dispatch,
            HookDispatch::Command {
                template: "cargo fmt --check".to_string(),
                on_failure: HookAction::Block,
                silent: true,
            }
        );
    }

    #[test]
    fn test_mixed_dispatch_rejected() {
        let err = HookDefinition::try_from(raw_hook(json!({
            "id": "confused",
            "action": "allow",
            "handler": "check.sh"
        })))
        .unwrap_err();

        assert!(err.to_string().contains("more than one"));
    }

    #[test]
    fn test_missing_dispatch_rejected() {
        let err = HookDefinition::try_from(raw_hook(json!({
            "id": "empty",
            "matcher": "tool == 'Bash'"
        })))
        .unwrap_err();

        assert!(err.to_string().contains("no action, handler, or command"));
    }

    #[test]
    fn test_settings_defaults() {
        let settings: HooksSettings = serde_json::from_str("{}").unwrap();
        assert!(!settings.enabled);
        assert_eq!(settings.timeout_ms, 30_000);
        assert!(!settings.parallel_hooks);
        assert!(!settings.fail_on_error);
    }

    #[test]
    fn test_action_wire_format() {
        assert_eq!(serde_json::to_string(&HookAction::Block).unwrap(), "\"block\"");
        let parsed: HookAction = serde_json::from_str("\"confirm\"").unwrap();
        assert_eq!(parsed, HookAction::Confirm);
    }

    #[test]
    fn test_unknown_wire_action_falls_back_to_allow() {
        assert_eq!(HookAction::from_wire("bogus"), HookAction::Allow);
        assert_eq!(HookAction::from_wire("block"), HookAction::Block);
    }

    #[test]
    fn test_event_parses_both_casings() {
        assert_eq!(
            "pre-tool-use".parse::<HookEvent>().unwrap(),
            HookEvent::PreToolUse
        );
        assert_eq!(
            "PreToolUse".parse::<HookEvent>().unwrap(),
            HookEvent::PreToolUse
        );
        assert!("NotAnEvent".parse::<HookEvent>().is_err());
    }

    #[test]
    fn test_result_message_wire_shape() {
        let message = ResultMessage::for_hook(
            MessageKind::Block,
            "block-push",
            Some("no pushes".to_string()),
        );
        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["type"], "block");
        assert_eq!(value["id"], "block-push");
    }
}
