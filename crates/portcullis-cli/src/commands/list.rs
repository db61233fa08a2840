//! List command handler

use std::path::PathBuf;

use portcullis_hooks::{config, HookDefinition, HookDispatch, HookEvent};

use crate::error::{CliResult, EXIT_OK};
use crate::output::OutputStyle;

/// List command handler
pub struct ListCommand {
    config: Option<PathBuf>,
}

impl ListCommand {
    /// Create a new list command
    pub fn new(config: Option<PathBuf>) -> Self {
        Self { config }
    }

    /// Execute the list command. Shows what `run` would load, so a
    /// broken configuration lists as empty rather than erroring.
    pub fn execute(self) -> CliResult<i32> {
        let style = OutputStyle::default();
        let path = config::resolve_config_path(self.config);
        let config = config::load_config(&path);

        if !config.settings.enabled {
            println!("{}", style.warning("Hooks are disabled"));
        }

        let mut shown = 0usize;
        for event in HookEvent::ALL {
            let Some(hooks) = config.hooks.get(event.as_str()) else {
                continue;
            };
            if hooks.is_empty() {
                continue;
            }
            println!("{}", style.header(event.as_str()));
            for hook in hooks {
                shown += 1;
                println!("{}", style.list_item(&describe(hook)));
            }
        }

        if shown == 0 {
            println!(
                "{}",
                style.info(&format!("No hooks configured ({})", path.display()))
            );
        }
        Ok(EXIT_OK)
    }
}

fn describe(hook: &HookDefinition) -> String {
    let detail = match &hook.dispatch {
        HookDispatch::Action { action } => format!("action: {action}"),
        HookDispatch::Handler { path } => format!("handler: {path}"),
        HookDispatch::Command { template, .. } => format!("command: {template}"),
    };
    let mut line = format!("{}  {detail}", hook.id);
    if let Some(matcher) = &hook.matcher {
        line.push_str(&format!("  when {matcher}"));
    }
    if let Some(condition) = &hook.condition {
        line.push_str(&format!("  if {condition}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use portcullis_hooks::HookAction;
    use std::io::Write;

    #[test]
    fn test_describe_includes_dispatch_and_matcher() {
        let hook = HookDefinition {
            id: "no-push".to_string(),
            matcher: Some("command contains 'push'".to_string()),
            condition: None,
            message: None,
            dispatch: HookDispatch::Action {
                action: HookAction::Block,
            },
        };
        let line = describe(&hook);
        assert!(line.contains("no-push"));
        assert!(line.contains("action: block"));
        assert!(line.contains("when command contains 'push'"));
    }

    #[test]
    fn test_list_tolerates_missing_config() {
        let cmd = ListCommand::new(Some(PathBuf::from("/no/such/hooks.json")));
        assert_eq!(cmd.execute().unwrap(), EXIT_OK);
    }

    #[test]
    fn test_list_reads_configured_hooks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"{"settings": {"enabled": true}, "hooks": {"PreToolUse": [
                {"id": "guard", "command": "echo ok"}
            ]}}"#,
        )
        .unwrap();
        let cmd = ListCommand::new(Some(file.path().to_path_buf()));
        assert_eq!(cmd.execute().unwrap(), EXIT_OK);
    }
}
