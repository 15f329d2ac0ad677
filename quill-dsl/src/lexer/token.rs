//! Lexer token types

use std::fmt;

/// Token kinds of a tag section.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Symbols
    At,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    /// A lone `:`; `::` stays inside a word.
    Colon,
    Equals,

    /// A run of whitespace.
    Whitespace { newline: bool },

    /// Quoted string content without its quotes, escapes kept verbatim.
    Quoted(String),

    /// Anything between delimiters.
    Word(String),

    Eof,
}

impl TokenKind {
    pub fn is_whitespace(&self) -> bool {
        matches!(self, TokenKind::Whitespace { .. })
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, TokenKind::Whitespace { newline: true })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::At => write!(f, "@"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Equals => write!(f, "="),
            TokenKind::Whitespace { .. } => write!(f, "whitespace"),
            TokenKind::Quoted(s) => write!(f, "'{}'", s),
            TokenKind::Word(w) => write!(f, "{}", w),
            TokenKind::Eof => write!(f, "end of comment"),
        }
    }
}

/// Source location span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            start: 0,
            end: 0,
            line: 1,
            column: 1,
        }
    }
}

/// A token with its kind and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
