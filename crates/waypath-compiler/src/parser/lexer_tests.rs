use super::lexer::{TokenKind, lex, token_text};

fn kinds(source: &str) -> Vec<TokenKind> {
    lex(source).unwrap().iter().map(|t| t.kind).collect()
}

#[test]
fn lexes_a_path_expression() {
    assert_eq!(
        kinds("lists.structs[?string=='foo'].integer"),
        vec![
            TokenKind::Ident,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::BracketOpen,
            TokenKind::Question,
            TokenKind::Ident,
            TokenKind::EqEq,
            TokenKind::RawString,
            TokenKind::BracketClose,
            TokenKind::Dot,
            TokenKind::Ident,
        ]
    );
}

#[test]
fn two_character_operators_win_over_prefixes() {
    assert_eq!(
        kinds("a <= b != c && d"),
        vec![
            TokenKind::Ident,
            TokenKind::LtEq,
            TokenKind::Ident,
            TokenKind::BangEq,
            TokenKind::Ident,
            TokenKind::AndAnd,
            TokenKind::Ident,
        ]
    );
}

#[test]
fn lexes_literals_and_signed_numbers() {
    assert_eq!(
        kinds("`{\"a\": 1}` == `-2`"),
        vec![TokenKind::JsonLiteral, TokenKind::EqEq, TokenKind::JsonLiteral]
    );
    assert_eq!(
        kinds("[-1:2]"),
        vec![
            TokenKind::BracketOpen,
            TokenKind::Number,
            TokenKind::Colon,
            TokenKind::Number,
            TokenKind::BracketClose,
        ]
    );
}

#[test]
fn token_text_slices_the_source() {
    let source = "foo.\"bar baz\"";
    let tokens = lex(source).unwrap();
    assert_eq!(token_text(source, &tokens[0]), "foo");
    assert_eq!(token_text(source, &tokens[2]), "\"bar baz\"");
}

#[test]
fn raw_strings_carry_escapes_through() {
    let source = r"'it\'s'";
    let tokens = lex(source).unwrap();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenKind::RawString);
    assert_eq!(token_text(source, &tokens[0]), source);
}

#[test]
fn rejects_unknown_characters() {
    let err = lex("a # b").unwrap_err();
    assert_eq!(err.offset, 2);
}
