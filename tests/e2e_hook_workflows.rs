//! End-to-end hook workflows
//!
//! Exercises the full path a host goes through: configuration on disk,
//! bridge construction, hook execution against an operation context, and
//! the exit code the CLI reports back.

use std::path::Path;

use portcullis_cli::commands::exit_code_for;
use portcullis_cli::commands::RunCommand;
use portcullis_cli::{CliError, EXIT_BLOCKED, EXIT_OK};
use portcullis_hooks::{
    BridgeOptions, HookEvent, HooksBridge, MessageKind, OperationContext,
};

fn write_config(dir: &Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("hooks.json");
    std::fs::write(&path, contents).unwrap();
    path
}

fn bash_context(command: &str) -> OperationContext {
    let mut context = OperationContext::for_test();
    context.tool = Some("Bash".to_string());
    context.command = Some(command.to_string());
    context
}

#[tokio::test]
async fn test_blocking_hook_stops_the_sequence_and_maps_to_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{
            "settings": {"enabled": true, "timeoutMs": 5000},
            "hooks": {"PreToolUse": [
                {"id": "no-force-push", "matcher": "command matches 'push\\s+--force'", "action": "block", "message": "Force push refused"},
                {"id": "later", "action": "warn", "message": "never reached"}
            ]}
        }"#,
    );

    let bridge = HooksBridge::new(BridgeOptions {
        config_path: Some(config),
        handlers_dir: None,
    });
    let context = bash_context("git push --force origin main");
    let result = bridge.execute_hooks("PreToolUse", &context).await;

    assert!(result.blocked);
    assert_eq!(result.executed.len(), 1);
    assert_eq!(result.messages.len(), 1);
    assert_eq!(result.messages[0].kind, MessageKind::Block);
    assert_eq!(
        result.messages[0].message.as_deref(),
        Some("Force push refused")
    );
    assert_eq!(exit_code_for(&result), EXIT_BLOCKED);
}

#[tokio::test]
async fn test_non_matching_operation_passes_clean() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{
            "settings": {"enabled": true},
            "hooks": {"PreToolUse": [
                {"id": "no-force-push", "matcher": "command matches 'push\\s+--force'", "action": "block"}
            ]}
        }"#,
    );

    let bridge = HooksBridge::new(BridgeOptions {
        config_path: Some(config),
        handlers_dir: None,
    });
    let context = bash_context("git status");
    let result = bridge.execute_hooks("PreToolUse", &context).await;

    assert!(!result.blocked);
    assert!(result.messages.is_empty());
    assert_eq!(exit_code_for(&result), EXIT_OK);
}

#[tokio::test]
async fn test_disabled_engine_reports_and_allows() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{"settings": {"enabled": false}, "hooks": {"PreToolUse": [
            {"id": "guard", "action": "block"}
        ]}}"#,
    );

    let bridge = HooksBridge::new(BridgeOptions {
        config_path: Some(config),
        handlers_dir: None,
    });
    let result = bridge
        .execute_hooks("PreToolUse", &OperationContext::for_test())
        .await;

    assert!(!result.blocked);
    assert!(result.executed.is_empty());
    assert_eq!(result.messages[0].message.as_deref(), Some("Hooks disabled"));
}

#[tokio::test]
async fn test_aliased_event_keys_still_fire() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{"settings": {"enabled": true}, "hooks": {"pre-tool-use": [
            {"id": "guard", "action": "warn", "message": "heads up"}
        ]}}"#,
    );

    let bridge = HooksBridge::new(BridgeOptions {
        config_path: Some(config),
        handlers_dir: None,
    });
    let result = bridge
        .execute_hooks("PreToolUse", &OperationContext::for_test())
        .await;

    assert_eq!(result.executed.len(), 1);
    assert_eq!(result.warnings.len(), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn test_handler_script_decision_flows_through() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("deny.sh");
    std::fs::write(
        &script,
        "#!/bin/sh\nprintf '{\"result\": {\"action\": \"block\"}, \"message\": \"handler says no\"}'\n",
    )
    .unwrap();
    let mut perms = std::fs::metadata(&script).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&script, perms).unwrap();

    let config = write_config(
        dir.path(),
        r#"{"settings": {"enabled": true, "timeoutMs": 5000}, "hooks": {"PreToolUse": [
            {"id": "deny", "handler": "deny.sh"}
        ]}}"#,
    );

    let bridge = HooksBridge::new(BridgeOptions {
        config_path: Some(config),
        handlers_dir: Some(dir.path().to_path_buf()),
    });
    let result = bridge
        .execute_hooks("PreToolUse", &OperationContext::for_test())
        .await;

    assert!(result.blocked);
    assert_eq!(
        result.messages[0].message.as_deref(),
        Some("handler says no")
    );
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_hook_substitutes_and_runs_in_context_cwd() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{"settings": {"enabled": true, "timeoutMs": 5000}, "hooks": {"PostToolUse": [
            {"id": "touch-marker", "command": "touch {{path}}"}
        ]}}"#,
    );

    let bridge = HooksBridge::new(BridgeOptions {
        config_path: Some(config),
        handlers_dir: None,
    });
    let mut context = OperationContext::for_test();
    context.path = Some("marker.txt".to_string());
    context.cwd = dir.path().to_path_buf();
    let result = bridge.execute_hooks("PostToolUse", &context).await;

    assert!(!result.blocked);
    assert_eq!(result.executed.len(), 1);
    assert!(dir.path().join("marker.txt").exists());
}

#[tokio::test]
async fn test_cli_run_rejects_unknown_event() {
    let cmd = RunCommand {
        event: "NotAnEvent".to_string(),
        no_stdin: true,
        ..Default::default()
    };
    let err = cmd.execute().await.unwrap_err();
    assert!(matches!(err, CliError::InvalidArgument { .. }));
}

#[tokio::test]
async fn test_cli_run_executes_config_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        r#"{"settings": {"enabled": true}, "hooks": {"PreToolUse": [
            {"id": "no-rm", "matcher": "command contains 'rm -rf'", "action": "block", "message": "refused"}
        ]}}"#,
    );

    let cmd = RunCommand {
        event: "PreToolUse".to_string(),
        tool: Some("Bash".to_string()),
        command: Some("rm -rf /tmp/x".to_string()),
        config: Some(config),
        json: true,
        no_stdin: true,
        ..Default::default()
    };
    assert_eq!(cmd.execute().await.unwrap(), EXIT_BLOCKED);
}

#[test]
fn test_event_names_parse_canonical_and_kebab_case() {
    assert_eq!(
        "PreToolUse".parse::<HookEvent>().unwrap(),
        HookEvent::PreToolUse
    );
    assert_eq!(
        "pre-tool-use".parse::<HookEvent>().unwrap(),
        HookEvent::PreToolUse
    );
    assert!("Sideways".parse::<HookEvent>().is_err());
    for event in HookEvent::ALL {
        assert_eq!(event.as_str().parse::<HookEvent>().unwrap(), event);
    }
}
