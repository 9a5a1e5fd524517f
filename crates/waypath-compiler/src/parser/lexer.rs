//! Lexer for the query language.
//!
//! Produces span-based tokens; text is sliced from the source only when a
//! token's payload is needed. Unlike a resilient editor-facing lexer this
//! one fails fast: the first unrecognized character aborts the parse.

use logos::Logos;
use std::ops::Range;

use super::ParseError;

/// Token kinds. Longest match wins, so `==`/`!=`/`<=`/`>=`/`&&`/`||` take
/// precedence over their one-character prefixes.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum TokenKind {
    #[token("(")]
    ParenOpen,

    #[token(")")]
    ParenClose,

    #[token("[")]
    BracketOpen,

    #[token("]")]
    BracketClose,

    #[token("{")]
    BraceOpen,

    #[token("}")]
    BraceClose,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token("*")]
    Star,

    #[token("@")]
    At,

    #[token("?")]
    Question,

    #[token("==")]
    EqEq,

    #[token("!=")]
    BangEq,

    #[token("<=")]
    LtEq,

    #[token(">=")]
    GtEq,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,

    #[token("!")]
    Bang,

    /// Signed integer, used by index and slice specifiers.
    #[regex(r"-?[0-9]+")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    /// JSON-string-quoted identifier: `"foo bar"`.
    #[regex(r#""([^"\\]|\\.)*""#)]
    QuotedIdent,

    /// Raw string: `'foo'`, with `\'` and `\\` escapes.
    #[regex(r"'(\\.|[^'\\])*'")]
    RawString,

    /// Backtick literal holding a JSON payload.
    #[regex(r"`[^`]*`")]
    JsonLiteral,
}

/// Zero-copy token: kind plus source span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Tokenize `source`, failing on the first unrecognized character.
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(item) = lexer.next() {
        match item {
            Ok(kind) => tokens.push(Token {
                kind,
                span: lexer.span(),
            }),
            Err(()) => {
                return Err(ParseError::new(
                    "unrecognized character",
                    lexer.span().start,
                ));
            }
        }
    }
    Ok(tokens)
}

/// The text slice for a token. O(1) slice into the source.
pub fn token_text<'src>(source: &'src str, token: &Token) -> &'src str {
    &source[token.span.clone()]
}
