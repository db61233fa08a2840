//! Evaluates parsed matcher expressions against an operation context

use regex::Regex;
use serde_json::Value;

use super::parser::{AstNode, CompareOp};

/// Walks an expression tree and resolves identifiers against a JSON
/// context document. Evaluation is total: comparisons against missing
/// or mistyped fields yield `false` (or `true` for the negated forms)
/// rather than an error.
pub struct Evaluator<'a> {
    context: &'a Value,
}

impl<'a> Evaluator<'a> {
    pub fn new(context: &'a Value) -> Self {
        Self { context }
    }

    pub fn evaluate(&self, node: &AstNode) -> bool {
        match node {
            AstNode::Comparison { left, op, right } => self.compare(left, *op, right),
            AstNode::And(lhs, rhs) => self.evaluate(lhs) && self.evaluate(rhs),
            AstNode::Or(lhs, rhs) => self.evaluate(lhs) || self.evaluate(rhs),
            AstNode::Not(inner) => !self.evaluate(inner),
        }
    }

    fn compare(&self, left: &str, op: CompareOp, right: &str) -> bool {
        let value = self.resolve(left);
        match op {
            CompareOp::Eq => matches!(value, Some(Value::String(s)) if s == right),
            CompareOp::Ne => !matches!(value, Some(Value::String(s)) if s == right),
            CompareOp::Matches => {
                matches!(value, Some(Value::String(s)) if regex_match(s, right))
            }
            CompareOp::NotMatches => {
                !matches!(value, Some(Value::String(s)) if regex_match(s, right))
            }
            CompareOp::StartsWith => {
                matches!(value, Some(Value::String(s)) if s.starts_with(right))
            }
            CompareOp::EndsWith => {
                matches!(value, Some(Value::String(s)) if s.ends_with(right))
            }
            CompareOp::Contains => {
                matches!(value, Some(Value::String(s)) if s.contains(right))
            }
            CompareOp::In => {
                let Some(value) = value else {
                    return false;
                };
                let needle = stringify(value);
                right.split(',').map(str::trim).any(|c| c == needle)
            }
        }
    }

    /// Resolves a dotted path against the context, descending through
    /// nested objects. Returns `None` as soon as a segment is absent.
    fn resolve(&self, path: &str) -> Option<&Value> {
        let mut current = self.context;
        for part in path.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }
}

/// Interprets `pattern` as a regular expression; if it fails to compile,
/// degrades to a plain substring test so a typo in a rule never turns
/// into a hard failure.
fn regex_match(value: &str, pattern: &str) -> bool {
    match Regex::new(pattern) {
        Ok(re) => re.is_match(value),
        Err(_) => value.contains(pattern),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
