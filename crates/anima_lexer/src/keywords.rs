//! Keyword table.
use anima_syntax::TokenKind;

pub static KEYWORDS: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "true" => TokenKind::True,
    "false" => TokenKind::False,
    "nil" => TokenKind::Nil,
    "this" => TokenKind::This,
    "var" => TokenKind::KwVar,
    "shared" => TokenKind::KwShared,
    "static" => TokenKind::KwStatic,
    "fn" => TokenKind::KwFn,
    "coro" => TokenKind::KwCoro,
    "branch" => TokenKind::KwBranch,
    "if" => TokenKind::KwIf,
    "elif" => TokenKind::KwElif,
    "else" => TokenKind::KwElse,
    "while" => TokenKind::KwWhile,
    "break" => TokenKind::KwBreak,
    "continue" => TokenKind::KwContinue,
    "return" => TokenKind::KwReturn,
    "and" => TokenKind::KwAnd,
    "or" => TokenKind::KwOr,
    "not" => TokenKind::KwNot,
};
