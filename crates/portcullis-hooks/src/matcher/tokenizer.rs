//! Lexer for matcher expressions

use std::fmt;

/// Comparison operators, longest first so prefix matching never picks a
/// shorter operator over a longer one.
pub(crate) const OPERATORS: [&str; 8] = [
    "==",
    "!=",
    "!matches",
    "matches",
    "startsWith",
    "endsWith",
    "contains",
    "in",
];

/// Lexical token kinds produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Str,
    Operator,
    Logical,
    LParen,
    RParen,
    Eof,
}

impl TokenKind {
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Str => "string",
            TokenKind::Operator => "operator",
            TokenKind::Logical => "logical operator",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Eof => "end of expression",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A single token with its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
}

impl Token {
    fn new(kind: TokenKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Left-to-right scanner for matcher expressions.
///
/// Lexing is lenient: unrecognized characters are skipped rather than
/// reported, so malformed input surfaces as a parse error (or as a
/// non-match) instead of a lexer failure. Operators are matched by prefix
/// before identifiers are considered.
pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
}

impl Tokenizer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Scans the whole input, always ending with an `Eof` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();

        while self.pos < self.chars.len() {
            self.skip_whitespace();
            if self.pos >= self.chars.len() {
                break;
            }

            let c = self.chars[self.pos];

            if c == '(' {
                tokens.push(Token::new(TokenKind::LParen, "("));
                self.pos += 1;
            } else if c == ')' {
                tokens.push(Token::new(TokenKind::RParen, ")"));
                self.pos += 1;
            } else if c == '\'' || c == '"' {
                tokens.push(self.read_string(c));
            } else if let Some(op) = self.peek_operator() {
                tokens.push(Token::new(TokenKind::Operator, op));
                self.pos += op.len();
            } else if let Some(logical) = self.peek_logical() {
                tokens.push(Token::new(TokenKind::Logical, logical));
                self.pos += logical.len();
            } else if c.is_ascii_alphabetic() || c == '_' {
                tokens.push(self.read_identifier());
            } else {
                // Lenient lexing: anything unrecognized is dropped.
                self.pos += 1;
            }
        }

        tokens.push(Token::new(TokenKind::Eof, ""));
        tokens
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn remaining_starts_with(&self, prefix: &str) -> bool {
        let mut pos = self.pos;
        for expected in prefix.chars() {
            if self.chars.get(pos) != Some(&expected) {
                return false;
            }
            pos += 1;
        }
        true
    }

    fn peek_operator(&self) -> Option<&'static str> {
        OPERATORS
            .iter()
            .find(|op| self.remaining_starts_with(op))
            .copied()
    }

    fn peek_logical(&self) -> Option<&'static str> {
        if self.remaining_starts_with("&&") {
            Some("&&")
        } else if self.remaining_starts_with("||") {
            Some("||")
        } else if self.chars.get(self.pos) == Some(&'!') {
            Some("!")
        } else {
            None
        }
    }

    /// Reads a quoted string. A backslash escapes the next character; an
    /// unterminated string runs to the end of input.
    fn read_string(&mut self, quote: char) -> Token {
        self.pos += 1;
        let mut value = String::new();

        while self.pos < self.chars.len() && self.chars[self.pos] != quote {
            if self.chars[self.pos] == '\\' && self.pos + 1 < self.chars.len() {
                value.push(self.chars[self.pos + 1]);
                self.pos += 2;
            } else {
                value.push(self.chars[self.pos]);
                self.pos += 1;
            }
        }

        if self.pos < self.chars.len() {
            self.pos += 1;
        }
        Token::new(TokenKind::Str, value)
    }

    fn read_identifier(&mut self) -> Token {
        let mut value = String::new();
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            if c.is_ascii_alphanumeric() || c == '_' {
                value.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        Token::new(TokenKind::Identifier, value)
    }
}
