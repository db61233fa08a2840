//! Configuration loading
//!
//! The configuration is a single JSON document: scheduler settings plus
//! hook definitions grouped by event name, for example:
//!
//! ```json
//! {
//!   "settings": { "enabled": true, "timeoutMs": 10000 },
//!   "hooks": {
//!     "PreToolUse": [
//!       { "id": "no-push", "matcher": "command contains 'git push'", "action": "block" }
//!     ]
//!   }
//! }
//! ```
//!
//! It is looked up from an explicit path, then the
//! `PORTCULLIS_HOOKS_CONFIG` variable, then `~/.portcullis/hooks.json`.
//! [`load_config`] degrades to the disabled default on any failure so a
//! broken hook setup never takes the host down; [`try_load_config`] is
//! the strict variant for tooling that wants the error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, warn};

use crate::error::{HooksError, Result};
use crate::types::{HookDefinition, HookEvent, HooksConfig, RawHooksConfig};

/// Environment variable overriding the configuration path.
pub const CONFIG_PATH_ENV: &str = "PORTCULLIS_HOOKS_CONFIG";

const CONFIG_DIR: &str = ".portcullis";
const CONFIG_FILE: &str = "hooks.json";

/// Decides which configuration file to use: explicit path first, then
/// the environment override, then the per-user default.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    default_config_path()
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

/// Loads the configuration, falling back to the disabled default when
/// the file is missing, unreadable, or malformed.
pub fn load_config(path: &Path) -> HooksConfig {
    match try_load_config(path) {
        Ok(config) => config,
        Err(HooksError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no hooks configuration, hooks stay disabled");
            HooksConfig::default()
        }
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "failed to load hooks configuration, hooks stay disabled"
            );
            HooksConfig::default()
        }
    }
}

/// Strict load: read, parse, and validate, propagating the first error.
pub fn try_load_config(path: &Path) -> Result<HooksConfig> {
    parse_config(read_raw(path)?)
}

/// Reads the wire form without dispatch validation. Lint tooling uses
/// this to report every problem in a file instead of stopping at the
/// first.
pub fn read_raw(path: &Path) -> Result<RawHooksConfig> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Validates the wire form, enforcing dispatch exclusivity per hook.
/// Hook order within an event is preserved. Recognized event names are
/// folded to their canonical spelling so kebab-case keys fire too;
/// unrecognized names are kept as written and never fire.
pub fn parse_config(raw: RawHooksConfig) -> Result<HooksConfig> {
    let mut hooks = HashMap::new();
    for (event, definitions) in raw.hooks {
        let converted = definitions
            .into_iter()
            .map(HookDefinition::try_from)
            .collect::<Result<Vec<_>>>()?;
        let key = HookEvent::from_str(&event)
            .map(|known| known.as_str().to_string())
            .unwrap_or(event);
        hooks.insert(key, converted);
    }
    Ok(HooksConfig {
        settings: raw.settings,
        hooks,
    })
}
