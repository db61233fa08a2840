//! Environment condition checks
//!
//! Hooks can carry a `condition` alongside their matcher: a conjunction
//! of predicate calls evaluated against the host environment rather
//! than the operation context, for example
//! `file_exists('package.json') && env_set('CI')`.
//!
//! Unlike matcher expressions, conditions are deliberately forgiving:
//! a clause that is not a recognized call, or that names an unknown
//! predicate, counts as satisfied. A condition only ever narrows where
//! a hook runs; it cannot fail an operation on its own.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

fn call_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(\w+)\(['"]([^'"]+)['"]\)"#).expect("condition call pattern")
    })
}

pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// Evaluates a `&&`-joined list of predicate calls. Every clause
    /// must hold; unrecognized clauses hold vacuously.
    pub fn evaluate(condition: &str) -> bool {
        condition.split("&&").map(str::trim).all(Self::evaluate_part)
    }

    fn evaluate_part(part: &str) -> bool {
        let Some(caps) = call_pattern().captures(part) else {
            return true;
        };
        let argument = &caps[2];
        match &caps[1] {
            "file_exists" => Self::file_exists(argument),
            "has_dependency" => Self::has_dependency(argument),
            "env_set" => Self::env_set(argument),
            _ => true,
        }
    }

    fn file_exists(path: &str) -> bool {
        Path::new(path).exists()
    }

    /// True when the project in the working directory declares `name`
    /// in its package.json or Cargo.toml dependency tables.
    fn has_dependency(name: &str) -> bool {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::has_dependency_in(&cwd, name)
    }

    fn has_dependency_in(dir: &Path, name: &str) -> bool {
        Self::package_json_declares(&dir.join("package.json"), name)
            || Self::cargo_toml_declares(&dir.join("Cargo.toml"), name)
    }

    fn package_json_declares(manifest: &Path, name: &str) -> bool {
        let Ok(raw) = std::fs::read_to_string(manifest) else {
            return false;
        };
        let Ok(doc) = serde_json::from_str::<Value>(&raw) else {
            return false;
        };
        ["dependencies", "devDependencies"].iter().any(|section| {
            doc.get(*section)
                .and_then(Value::as_object)
                .is_some_and(|deps| deps.contains_key(name))
        })
    }

    fn cargo_toml_declares(manifest: &Path, name: &str) -> bool {
        let Ok(raw) = std::fs::read_to_string(manifest) else {
            return false;
        };
        let Ok(doc) = raw.parse::<toml::Table>() else {
            return false;
        };
        ["dependencies", "dev-dependencies"].iter().any(|section| {
            doc.get(*section)
                .and_then(|v| v.as_table())
                .is_some_and(|deps| deps.contains_key(name))
        })
    }

    fn env_set(name: &str) -> bool {
        std::env::var(name).map(|v| !v.is_empty()).unwrap_or(false)
    }
}
