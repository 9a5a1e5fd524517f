//! Text → AST for the query language.
//!
//! Two stages in the usual shape: a `logos`-derived lexer producing
//! span-based tokens ([`lexer`]), and a Pratt parser over the token stream
//! ([`grammar`]) implementing the JMESPath-style grammar the traversal
//! compiler consumes. Syntax errors are [`ParseError`]s, deliberately a
//! separate family from the compiler's two diagnostic kinds, which only
//! cover expressions that already parsed.

mod grammar;
mod lexer;
#[cfg(test)]
mod lexer_tests;

pub use grammar::parse;
pub use lexer::{Token, TokenKind, lex, token_text};

/// A syntax error with the byte offset it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at offset {offset}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}
