//! Recursive-descent parser for matcher expressions

use super::tokenizer::{Token, TokenKind};
use super::MatchError;

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Matches,
    NotMatches,
    StartsWith,
    EndsWith,
    Contains,
    In,
}

impl CompareOp {
    fn from_token(value: &str) -> Option<CompareOp> {
        match value {
            "==" => Some(CompareOp::Eq),
            "!=" => Some(CompareOp::Ne),
            "matches" => Some(CompareOp::Matches),
            "!matches" => Some(CompareOp::NotMatches),
            "startsWith" => Some(CompareOp::StartsWith),
            "endsWith" => Some(CompareOp::EndsWith),
            "contains" => Some(CompareOp::Contains),
            "in" => Some(CompareOp::In),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Matches => "matches",
            CompareOp::NotMatches => "!matches",
            CompareOp::StartsWith => "startsWith",
            CompareOp::EndsWith => "endsWith",
            CompareOp::Contains => "contains",
            CompareOp::In => "in",
        }
    }
}

/// A parsed matcher expression. Trees are immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// `left OP right`; `right` is always a literal string, never a lookup
    Comparison {
        left: String,
        op: CompareOp,
        right: String,
    },
    And(Box<AstNode>, Box<AstNode>),
    Or(Box<AstNode>, Box<AstNode>),
    Not(Box<AstNode>),
}

/// Grammar, lowest to highest precedence:
///
/// ```text
/// Expr       := Or
/// Or         := And ('||' And)*
/// And        := Unary ('&&' Unary)*
/// Unary      := '!' Unary | Primary
/// Primary    := '(' Expr ')' | Comparison
/// Comparison := IDENTIFIER OPERATOR (STRING | IDENTIFIER)
/// ```
///
/// There is no recovery; the first unexpected token fails the parse. Tokens
/// after a complete top-level expression are ignored.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<AstNode, MatchError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<AstNode, MatchError> {
        let mut node = self.parse_and()?;
        while self.at_logical("||") {
            self.pos += 1;
            let right = self.parse_and()?;
            node = AstNode::Or(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<AstNode, MatchError> {
        let mut node = self.parse_unary()?;
        while self.at_logical("&&") {
            self.pos += 1;
            let right = self.parse_unary()?;
            node = AstNode::And(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn parse_unary(&mut self) -> Result<AstNode, MatchError> {
        if self.at_logical("!") {
            self.pos += 1;
            let operand = self.parse_unary()?;
            return Ok(AstNode::Not(Box::new(operand)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<AstNode, MatchError> {
        if self.current().kind == TokenKind::LParen {
            self.pos += 1;
            let node = self.parse_or()?;
            self.expect(TokenKind::RParen)?;
            return Ok(node);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<AstNode, MatchError> {
        let left = self.expect(TokenKind::Identifier)?.value;
        let op_token = self.expect(TokenKind::Operator)?;
        let op = CompareOp::from_token(&op_token.value).ok_or(MatchError {
            expected: "comparison operator",
            found: TokenKind::Operator,
        })?;

        let right = match self.current().kind {
            TokenKind::Str | TokenKind::Identifier => self.advance().value,
            found => {
                return Err(MatchError {
                    expected: "string or identifier",
                    found,
                })
            }
        };

        Ok(AstNode::Comparison { left, op, right })
    }

    fn current(&self) -> &Token {
        // The token stream always ends with Eof.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_logical(&self, value: &str) -> bool {
        let token = self.current();
        token.kind == TokenKind::Logical && token.value == value
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, MatchError> {
        if self.current().kind == kind {
            Ok(self.advance())
        } else {
            Err(MatchError {
                expected: kind.describe(),
                found: self.current().kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tokenizer::Tokenizer;
    use super::*;

    fn parse(input: &str) -> Result<AstNode, MatchError> {
        Parser::new(Tokenizer::new(input).tokenize()).parse()
    }

    fn comparison(left: &str, op: CompareOp, right: &str) -> AstNode {
        AstNode::Comparison {
            left: left.to_string(),
            op,
            right: right.to_string(),
        }
    }

    #[test]
    fn test_single_comparison() {
        assert_eq!(
            parse("tool == 'Bash'").unwrap(),
            comparison("tool", CompareOp::Eq, "Bash")
        );
    }

    #[test]
    fn test_bare_identifier_right_operand_is_literal() {
        assert_eq!(
            parse("tool == Bash").unwrap(),
            comparison("tool", CompareOp::Eq, "Bash")
        );
    }

    #[test]
    fn test_not_binds_tighter_than_and() {
        let ast = parse("!tool == 'Bash' && command == 'x'").unwrap();
        assert_eq!(
            ast,
            AstNode::And(
                Box::new(AstNode::Not(Box::new(comparison(
                    "tool",
                    CompareOp::Eq,
                    "Bash"
                )))),
                Box::new(comparison("command", CompareOp::Eq, "x")),
            )
        );
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let ast = parse("a == '1' || b == '2' && c == '3'").unwrap();
        assert_eq!(
            ast,
            AstNode::Or(
                Box::new(comparison("a", CompareOp::Eq, "1")),
                Box::new(AstNode::And(
                    Box::new(comparison("b", CompareOp::Eq, "2")),
                    Box::new(comparison("c", CompareOp::Eq, "3")),
                )),
            )
        );
    }

    #[test]
    fn test_parens_override_precedence() {
        let ast = parse("(a == '1' || b == '2') && c == '3'").unwrap();
        assert_eq!(
            ast,
            AstNode::And(
                Box::new(AstNode::Or(
                    Box::new(comparison("a", CompareOp::Eq, "1")),
                    Box::new(comparison("b", CompareOp::Eq, "2")),
                )),
                Box::new(comparison("c", CompareOp::Eq, "3")),
            )
        );
    }

    #[test]
    fn test_missing_operand_is_an_error() {
        let err = parse("tool ==").unwrap_err();
        assert_eq!(
            err,
            MatchError {
                expected: "string or identifier",
                found: TokenKind::Eof,
            }
        );
    }

    #[test]
    fn test_missing_close_paren_is_an_error() {
        let err = parse("(tool == 'Bash'").unwrap_err();
        assert_eq!(
            err,
            MatchError {
                expected: "')'",
                found: TokenKind::Eof,
            }
        );
    }

    #[test]
    fn test_operator_without_left_identifier_is_an_error() {
        let err = parse("== 'Bash'").unwrap_err();
        assert_eq!(
            err,
            MatchError {
                expected: "identifier",
                found: TokenKind::Operator,
            }
        );
    }

    #[test]
    fn test_trailing_tokens_are_ignored() {
        assert_eq!(
            parse("tool == 'Bash' whatever").unwrap(),
            comparison("tool", CompareOp::Eq, "Bash")
        );
    }
}
