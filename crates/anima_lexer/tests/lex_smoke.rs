use anima_lexer::Lexer;
use anima_syntax::TokenKind;

fn kinds(src: &str) -> Vec<TokenKind> {
    Lexer::new(src)
        .lex()
        .tokens
        .iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn scans_member_header_and_body() {
    let got = kinds("(who: String) { write(who) }");
    assert_eq!(
        got,
        vec![
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::Colon,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::LBrace,
            TokenKind::Ident,
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::RBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn newline_terminates_only_outside_expression_delimiters() {
    let got = kinds("a\nb");
    assert_eq!(
        got,
        vec![
            TokenKind::Ident,
            TokenKind::Newline,
            TokenKind::Ident,
            TokenKind::Eof
        ]
    );

    // Wrapped arguments continue the expression.
    let got = kinds("f(a,\nb)");
    assert!(!got.contains(&TokenKind::Newline));

    // Braces are blocks: newlines still separate the statements inside.
    let got = kinds("{ a\nb }");
    assert!(got.contains(&TokenKind::Newline));
}

#[test]
fn real_vs_int_vs_member_access() {
    assert_eq!(kinds("1.5"), vec![TokenKind::Real, TokenKind::Eof]);
    assert_eq!(kinds("15"), vec![TokenKind::Int, TokenKind::Eof]);
    assert_eq!(
        kinds("x.abs"),
        vec![
            TokenKind::Ident,
            TokenKind::Dot,
            TokenKind::Ident,
            TokenKind::Eof
        ]
    );
}

#[test]
fn object_id_and_symbol_literals() {
    assert_eq!(
        kinds("@player"),
        vec![TokenKind::At, TokenKind::Ident, TokenKind::Eof]
    );
    assert_eq!(
        kinds("@'the player'"),
        vec![TokenKind::At, TokenKind::Sym, TokenKind::Eof]
    );
}

#[test]
fn keywords_are_not_idents() {
    assert_eq!(
        kinds("if while coro branch"),
        vec![
            TokenKind::KwIf,
            TokenKind::KwWhile,
            TokenKind::KwCoro,
            TokenKind::KwBranch,
            TokenKind::Eof
        ]
    );
}

#[test]
fn unterminated_string_is_diagnosed() {
    let res = Lexer::new("\"oops").lex();
    assert!(res.diagnostics.iter().any(|d| d.is_error()));
}

#[test]
fn unmatched_delimiters_are_diagnosed() {
    let res = Lexer::new("(a]").lex();
    assert!(res.diagnostics.iter().any(|d| d.is_error()));
    let res = Lexer::new("(a").lex();
    assert!(res.diagnostics.iter().any(|d| d.is_error()));
}

#[test]
fn arrow_and_ellipsis() {
    assert_eq!(
        kinds("(Integer) -> Integer"),
        vec![
            TokenKind::LParen,
            TokenKind::Ident,
            TokenKind::RParen,
            TokenKind::Arrow,
            TokenKind::Ident,
            TokenKind::Eof
        ]
    );
    assert_eq!(
        kinds("rest..."),
        vec![TokenKind::Ident, TokenKind::Ellipsis, TokenKind::Eof]
    );
}
