//! Matcher expression DSL
//!
//! Hooks decide whether they apply to an operation by evaluating a small
//! boolean expression against the operation context. Expressions compare
//! context fields with string literals:
//!
//! ```text
//! tool == 'Bash' && command matches 'rm\s+-rf'
//! path endsWith '.rs' || tool in 'Write, Edit'
//! ```
//!
//! Eight comparison operators are supported (`==`, `!=`, `matches`,
//! `!matches`, `startsWith`, `endsWith`, `contains`, `in`) plus `&&`,
//! `||`, `!` and parentheses. `matches` treats its right operand as a
//! regular expression and falls back to a substring test when the
//! pattern does not compile.
//!
//! The scanner is deliberately lenient: characters it does not recognize
//! are skipped, unterminated strings run to the end of input, and tokens
//! after a complete expression are ignored. The parser is not: a
//! malformed expression is a [`MatchError`], and [`matches`] treats it
//! as a non-match so a broken rule can never approve an operation.

mod evaluator;
mod parser;
mod tokenizer;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use evaluator::Evaluator;
use parser::{AstNode, Parser};
use tokenizer::Tokenizer;

pub use tokenizer::TokenKind;

/// Parse failure for a matcher expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Expected {expected}, got {found}")]
pub struct MatchError {
    pub expected: &'static str,
    pub found: TokenKind,
}

/// Outcome of statically checking an expression without evaluating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }
}

/// Evaluates `expression` against `context`.
///
/// An empty or whitespace-only expression matches everything. An
/// expression that fails to parse matches nothing; the failure is
/// logged once per call.
pub fn matches(expression: &str, context: &Value) -> bool {
    if expression.trim().is_empty() {
        return true;
    }
    match parse(expression) {
        Ok(ast) => Evaluator::new(context).evaluate(&ast),
        Err(err) => {
            warn!(
                expression = %expression,
                error = %err,
                "invalid matcher expression, treating as no match"
            );
            false
        }
    }
}

/// Checks `expression` for syntax errors without evaluating it.
///
/// Any expression accepted here evaluates cleanly under [`matches`];
/// the empty expression is valid and matches everything.
pub fn validate(expression: &str) -> ValidationResult {
    if expression.trim().is_empty() {
        return ValidationResult::ok();
    }
    match parse(expression) {
        Ok(_) => ValidationResult::ok(),
        Err(err) => ValidationResult {
            valid: false,
            error: Some(err.to_string()),
        },
    }
}

fn parse(expression: &str) -> Result<AstNode, MatchError> {
    Parser::new(Tokenizer::new(expression).tokenize()).parse()
}
