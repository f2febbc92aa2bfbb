//! Lexer tests.

use crate::lexer::Lexer;
use crate::token::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source)
        .tokenize()
        .tokens
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_class_def() {
    let toks = kinds("class A\nend\n");
    assert_eq!(
        toks,
        vec![
            TokenKind::Class,
            TokenKind::Constant("A".into()),
            TokenKind::Newline,
            TokenKind::End,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_method_def_with_args() {
    let toks = kinds("def f(x, y)\nend");
    assert_eq!(
        toks,
        vec![
            TokenKind::Def,
            TokenKind::Ident("f".into()),
            TokenKind::LParen,
            TokenKind::Ident("x".into()),
            TokenKind::Comma,
            TokenKind::Ident("y".into()),
            TokenKind::RParen,
            TokenKind::Newline,
            TokenKind::End,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_semicolon_bodies() {
    let toks = kinds("def f; 1; end");
    assert_eq!(
        toks,
        vec![
            TokenKind::Def,
            TokenKind::Ident("f".into()),
            TokenKind::Semi,
            TokenKind::IntLiteral(1),
            TokenKind::Semi,
            TokenKind::End,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_send_chain() {
    let toks = kinds("A.new.f");
    assert_eq!(
        toks,
        vec![
            TokenKind::Constant("A".into()),
            TokenKind::Dot,
            TokenKind::Ident("new".into()),
            TokenKind::Dot,
            TokenKind::Ident("f".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        kinds("42 -7 3.25"),
        vec![
            TokenKind::IntLiteral(42),
            TokenKind::IntLiteral(-7),
            TokenKind::FloatLiteral(3.25),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds(r#""a\nb""#),
        vec![TokenKind::StringLiteral("a\nb".into()), TokenKind::Eof]
    );
}

#[test]
fn test_unterminated_string_reports_error() {
    let result = Lexer::new("\"abc").tokenize();
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message.contains("unterminated"));
}

#[test]
fn test_symbols_and_ivars() {
    assert_eq!(
        kinds(":foo @bar"),
        vec![
            TokenKind::SymbolLiteral("foo".into()),
            TokenKind::InstanceVar("@bar".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_sig_tokens() {
    let toks = kinds("sig { params(x: Integer).returns(String) }");
    assert_eq!(
        toks,
        vec![
            TokenKind::Sig,
            TokenKind::LBrace,
            TokenKind::Ident("params".into()),
            TokenKind::LParen,
            TokenKind::Ident("x".into()),
            TokenKind::Colon,
            TokenKind::Constant("Integer".into()),
            TokenKind::RParen,
            TokenKind::Dot,
            TokenKind::Ident("returns".into()),
            TokenKind::LParen,
            TokenKind::Constant("String".into()),
            TokenKind::RParen,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_scope_resolution() {
    assert_eq!(
        kinds("A::B"),
        vec![
            TokenKind::Constant("A".into()),
            TokenKind::ColonColon,
            TokenKind::Constant("B".into()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_comments_are_skipped() {
    let toks = kinds("# leading\nclass A # trailing\nend\n");
    assert_eq!(
        toks,
        vec![
            TokenKind::Class,
            TokenKind::Constant("A".into()),
            TokenKind::Newline,
            TokenKind::End,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_insignificant_newlines_dropped() {
    // Newlines after `class` (non-terminating) and blank lines are dropped.
    let toks = kinds("\n\nclass A\n\n\nend\n");
    assert_eq!(
        toks,
        vec![
            TokenKind::Class,
            TokenKind::Constant("A".into()),
            TokenKind::Newline,
            TokenKind::End,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_unexpected_character_recovers() {
    let result = Lexer::new("class A % end").tokenize();
    assert_eq!(result.errors.len(), 1);
    let toks: Vec<_> = result.tokens.into_iter().map(|t| t.kind).collect();
    assert!(toks.contains(&TokenKind::End));
}
