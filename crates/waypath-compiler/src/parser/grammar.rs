//! Pratt parser for the query language.
//!
//! # Grammar (EBNF-ish)
//!
//! ```text
//! expression = field | "@" | literal | raw-string | "(" expression ")"
//!            | "!" expression | expression binop expression
//!            | expression "." step | expression bracket
//!            | "[" expression ("," expression)* "]"
//!            | "{" key ":" expression ("," ...)* "}"
//!            | name "(" args ")"
//! step       = field | "*" | function | multi-select-list | multi-select-hash
//! bracket    = "[]" | "[*]" | "[?" expression "]" | "[" index-or-slice "]"
//! ```
//!
//! Standard JMESPath binding powers; the parser is fail-fast (the first
//! syntax error aborts) since callers compile one short expression at a
//! time and never need recovery.

use crate::ast::{Comparator, Expr, Literal};

use super::ParseError;
use super::lexer::{Token, TokenKind, lex, token_text};

const BP_OR: u8 = 2;
const BP_AND: u8 = 3;
const BP_CMP: u8 = 5;
const BP_FLATTEN: u8 = 9;
/// Tokens binding below this cannot continue a projection.
const BP_PROJECTION: u8 = 10;
const BP_STAR: u8 = 20;
const BP_FILTER: u8 = 21;
const BP_DOT: u8 = 40;
const BP_NOT: u8 = 45;
const BP_BRACKET: u8 = 55;

/// Nesting limit. Queries are short; this only guards pathological input.
const MAX_DEPTH: u32 = 256;

/// Parse `source` into an expression tree.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expr(0)?;
    if let Some(token) = parser.tokens.get(parser.pos) {
        return Err(ParseError::new("unexpected trailing input", token.span.start));
    }
    Ok(expr)
}

struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    depth: u32,
}

fn bx(expr: Expr) -> Box<Expr> {
    Box::new(expr)
}

impl Parser<'_> {
    fn parse_expr(&mut self, rbp: u8) -> Result<Expr, ParseError> {
        self.enter()?;
        let left = self.parse_prefix()?;
        let expr = self.parse_led_loop(left, rbp);
        self.depth -= 1;
        expr
    }

    /// Apply infix parsers while the upcoming token binds tighter than `rbp`.
    fn parse_led_loop(&mut self, mut left: Expr, rbp: u8) -> Result<Expr, ParseError> {
        while self.next_lbp() > rbp {
            left = self.parse_infix(left)?;
        }
        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.bump("expected expression")?;
        match token.kind {
            TokenKind::Ident => {
                let name = token_text(self.source, &token).to_string();
                if self.peek_kind() == Some(TokenKind::ParenOpen) {
                    self.parse_function(name)
                } else {
                    Ok(Expr::Field(name))
                }
            }
            TokenKind::QuotedIdent => Ok(Expr::Field(self.unquote_ident(&token)?)),
            TokenKind::RawString => Ok(Expr::Literal(Literal::String(unescape_raw(
                token_text(self.source, &token),
            )))),
            TokenKind::JsonLiteral => self.parse_json_literal(&token),
            TokenKind::At => Ok(Expr::Current),
            TokenKind::Bang => Ok(Expr::Not(bx(self.parse_expr(BP_NOT)?))),
            TokenKind::ParenOpen => {
                let inner = self.parse_expr(0)?;
                self.expect(TokenKind::ParenClose, "expected `)`")?;
                Ok(inner)
            }
            TokenKind::BraceOpen => self.parse_multi_select_hash(),
            TokenKind::BracketOpen => self.parse_bracket(Expr::Current, true),
            TokenKind::Star => Ok(Expr::ObjectProjection(
                bx(Expr::Current),
                bx(self.parse_projection_rhs(BP_STAR)?),
            )),
            _ => Err(error_at(&token, "expected expression")),
        }
    }

    fn parse_infix(&mut self, left: Expr) -> Result<Expr, ParseError> {
        let token = self.bump("expected operator")?;
        match token.kind {
            TokenKind::Dot => self.parse_dot(left),
            TokenKind::BracketOpen => self.parse_bracket(left, false),
            TokenKind::AndAnd => Ok(Expr::And(bx(left), bx(self.parse_expr(BP_AND)?))),
            TokenKind::OrOr => Ok(Expr::Or(bx(left), bx(self.parse_expr(BP_OR)?))),
            kind => {
                let op = match kind {
                    TokenKind::EqEq => Comparator::Eq,
                    TokenKind::BangEq => Comparator::Ne,
                    TokenKind::Lt => Comparator::Lt,
                    TokenKind::LtEq => Comparator::Lte,
                    TokenKind::Gt => Comparator::Gt,
                    TokenKind::GtEq => Comparator::Gte,
                    _ => return Err(error_at(&token, "unexpected token")),
                };
                Ok(Expr::Comparison {
                    op,
                    left: bx(left),
                    right: bx(self.parse_expr(BP_CMP)?),
                })
            }
        }
    }

    /// A step after `.`: either `left.*` (object projection) or a
    /// sub-expression step.
    fn parse_dot(&mut self, left: Expr) -> Result<Expr, ParseError> {
        if self.peek_kind() == Some(TokenKind::Star) {
            self.pos += 1;
            return Ok(Expr::ObjectProjection(
                bx(left),
                bx(self.parse_projection_rhs(BP_STAR)?),
            ));
        }
        let step = self.parse_dot_step()?;
        // A step off the current value is just the step itself; wrapping it
        // would only add a no-op indirection for projection continuations.
        Ok(if left.is_current() {
            step
        } else {
            Expr::Subexpression(bx(left), bx(step))
        })
    }

    fn parse_dot_step(&mut self) -> Result<Expr, ParseError> {
        let token = self.bump("expected identifier after `.`")?;
        match token.kind {
            TokenKind::Ident => {
                let name = token_text(self.source, &token).to_string();
                if self.peek_kind() == Some(TokenKind::ParenOpen) {
                    self.parse_function(name)
                } else {
                    Ok(Expr::Field(name))
                }
            }
            TokenKind::QuotedIdent => Ok(Expr::Field(self.unquote_ident(&token)?)),
            TokenKind::BracketOpen => self.parse_multi_select_list(),
            TokenKind::BraceOpen => self.parse_multi_select_hash(),
            _ => Err(error_at(
                &token,
                "expected identifier, `*`, `[`, or `{` after `.`",
            )),
        }
    }

    /// Everything that can follow `[`. The opening bracket is consumed.
    /// Multi-select lists are only valid in prefix position (`allow_multi_select`).
    fn parse_bracket(&mut self, left: Expr, allow_multi_select: bool) -> Result<Expr, ParseError> {
        match self.peek_kind() {
            Some(TokenKind::Question) => {
                self.pos += 1;
                let comparison = self.parse_expr(0)?;
                self.expect(TokenKind::BracketClose, "expected `]` after filter")?;
                let right = self.parse_projection_rhs(BP_FILTER)?;
                Ok(Expr::FilterProjection {
                    left: bx(left),
                    comparison: bx(comparison),
                    right: bx(right),
                })
            }
            Some(TokenKind::BracketClose) => {
                self.pos += 1;
                let right = self.parse_projection_rhs(BP_FLATTEN)?;
                Ok(Expr::Projection(bx(Expr::Flatten(bx(left))), bx(right)))
            }
            Some(TokenKind::Star) if self.peek2_kind() == Some(TokenKind::BracketClose) => {
                self.pos += 2;
                let right = self.parse_projection_rhs(BP_STAR)?;
                Ok(Expr::Projection(bx(left), bx(right)))
            }
            Some(TokenKind::Number) | Some(TokenKind::Colon) => {
                let index = self.parse_index_or_slice()?;
                Ok(match left {
                    Expr::Current => index,
                    _ => Expr::Subexpression(bx(left), bx(index)),
                })
            }
            _ if allow_multi_select => self.parse_multi_select_list(),
            _ => Err(self.error("expected index, slice, `*`, `?`, or `]` in brackets")),
        }
    }

    /// The continuation of a projection: `Current` when the next token
    /// cannot extend it, otherwise the per-element expression.
    fn parse_projection_rhs(&mut self, rbp: u8) -> Result<Expr, ParseError> {
        if self.next_lbp() < BP_PROJECTION {
            return Ok(Expr::Current);
        }
        let first = match self.peek_kind() {
            Some(TokenKind::Dot) => {
                self.pos += 1;
                self.parse_dot(Expr::Current)?
            }
            Some(TokenKind::BracketOpen) => {
                self.pos += 1;
                self.parse_bracket(Expr::Current, false)?
            }
            _ => return Err(self.error("expected `.` or `[` to continue projection")),
        };
        self.parse_led_loop(first, rbp)
    }

    fn parse_multi_select_list(&mut self) -> Result<Expr, ParseError> {
        let mut items = vec![self.parse_expr(0)?];
        while self.peek_kind() == Some(TokenKind::Comma) {
            self.pos += 1;
            items.push(self.parse_expr(0)?);
        }
        self.expect(TokenKind::BracketClose, "expected `]` after multi-select list")?;
        Ok(Expr::MultiSelectList(items))
    }

    fn parse_multi_select_hash(&mut self) -> Result<Expr, ParseError> {
        let mut entries = Vec::new();
        loop {
            let token = self.bump("expected key in multi-select hash")?;
            let key = match token.kind {
                TokenKind::Ident => token_text(self.source, &token).to_string(),
                TokenKind::QuotedIdent => self.unquote_ident(&token)?,
                _ => return Err(error_at(&token, "expected key in multi-select hash")),
            };
            self.expect(TokenKind::Colon, "expected `:` after key")?;
            entries.push((key, self.parse_expr(0)?));
            if self.peek_kind() == Some(TokenKind::Comma) {
                self.pos += 1;
                continue;
            }
            break;
        }
        self.expect(TokenKind::BraceClose, "expected `}` after multi-select hash")?;
        Ok(Expr::MultiSelectHash(entries))
    }

    /// Index or slice specifier; the cursor sits on a number or `:`.
    fn parse_index_or_slice(&mut self) -> Result<Expr, ParseError> {
        let start = if self.peek_kind() == Some(TokenKind::Number) {
            Some(self.parse_number()?)
        } else {
            None
        };
        if let Some(index) = start
            && self.peek_kind() == Some(TokenKind::BracketClose)
        {
            self.pos += 1;
            return Ok(Expr::Index(index));
        }
        self.expect(TokenKind::Colon, "expected `:` in slice")?;
        let stop = if self.peek_kind() == Some(TokenKind::Number) {
            Some(self.parse_number()?)
        } else {
            None
        };
        let step = if self.peek_kind() == Some(TokenKind::Colon) {
            self.pos += 1;
            if self.peek_kind() == Some(TokenKind::Number) {
                Some(self.parse_number()?)
            } else {
                None
            }
        } else {
            None
        };
        self.expect(TokenKind::BracketClose, "expected `]` after slice")?;
        Ok(Expr::Slice { start, stop, step })
    }

    fn parse_function(&mut self, name: String) -> Result<Expr, ParseError> {
        self.pos += 1; // consume `(`
        let mut args = Vec::new();
        if self.peek_kind() != Some(TokenKind::ParenClose) {
            args.push(self.parse_expr(0)?);
            while self.peek_kind() == Some(TokenKind::Comma) {
                self.pos += 1;
                args.push(self.parse_expr(0)?);
            }
        }
        self.expect(TokenKind::ParenClose, "expected `)` after function arguments")?;
        Ok(Expr::Function { name, args })
    }

    fn parse_number(&mut self) -> Result<i64, ParseError> {
        let token = self.bump("expected number")?;
        token_text(self.source, &token)
            .parse()
            .map_err(|_| error_at(&token, "number out of range"))
    }

    fn parse_json_literal(&mut self, token: &Token) -> Result<Expr, ParseError> {
        let text = token_text(self.source, token);
        let inner = &text[1..text.len() - 1];
        let value: serde_json::Value = serde_json::from_str(inner.trim())
            .map_err(|_| error_at(token, "invalid JSON in literal"))?;
        let literal = match value {
            serde_json::Value::Null => Literal::Null,
            serde_json::Value::Bool(value) => Literal::Bool(value),
            serde_json::Value::Number(value) => {
                Literal::Number(value.as_f64().unwrap_or_default())
            }
            serde_json::Value::String(value) => Literal::String(value),
            serde_json::Value::Array(_) => Literal::Array,
            serde_json::Value::Object(_) => Literal::Object,
        };
        Ok(Expr::Literal(literal))
    }

    fn unquote_ident(&self, token: &Token) -> Result<String, ParseError> {
        serde_json::from_str(token_text(self.source, token))
            .map_err(|_| error_at(token, "invalid quoted identifier"))
    }

    /// Left binding power of the upcoming token. `[]` binds as flatten,
    /// which is much weaker than the other bracket forms.
    fn next_lbp(&self) -> u8 {
        match self.peek_kind() {
            Some(TokenKind::OrOr) => BP_OR,
            Some(TokenKind::AndAnd) => BP_AND,
            Some(
                TokenKind::EqEq
                | TokenKind::BangEq
                | TokenKind::Lt
                | TokenKind::LtEq
                | TokenKind::Gt
                | TokenKind::GtEq,
            ) => BP_CMP,
            Some(TokenKind::Dot) => BP_DOT,
            Some(TokenKind::BracketOpen) => {
                if self.peek2_kind() == Some(TokenKind::BracketClose) {
                    BP_FLATTEN
                } else {
                    BP_BRACKET
                }
            }
            _ => 0,
        }
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    fn peek2_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| t.kind)
    }

    fn bump(&mut self, what: &str) -> Result<Token, ParseError> {
        match self.tokens.get(self.pos) {
            Some(token) => {
                let token = token.clone();
                self.pos += 1;
                Ok(token)
            }
            None => Err(ParseError::new(what, self.source.len())),
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(what))
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(self.error("expression nested too deeply"));
        }
        Ok(())
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.offset())
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|t| t.span.start)
            .unwrap_or(self.source.len())
    }
}

fn error_at(token: &Token, message: &str) -> ParseError {
    ParseError::new(message, token.span.start)
}

/// Strip the quotes from a raw string and process `\'` and `\\`; any other
/// escape is preserved verbatim.
fn unescape_raw(text: &str) -> String {
    let inner = &text[1..text.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('\'') => out.push('\''),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
