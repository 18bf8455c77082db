//! Token definitions.
//!
//! Defines all tokens of the Anima language: keywords, operators, literals,
//! delimiters and statement separators.
use crate::Span;

/// Token kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Newline (automatic statement termination outside delimiters).
    Newline,

    /// Identifier.
    Ident,
    /// Integer literal.
    Int,
    /// Real (floating point) literal.
    Real,
    /// String literal (`"..."`).
    Str,
    /// Symbol literal (`'...'`).
    Sym,

    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,
    /// `this`
    This,

    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,

    /// `>`
    Gt,
    /// `<`
    Lt,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `==`
    EqEq,
    /// `!=`
    Ne,
    /// `=`
    Eq,
    /// `!`
    Bang,

    /// `@` (object-id literal prefix).
    At,
    /// `.`
    Dot,
    /// `...` (variadic-group marker).
    Ellipsis,
    /// `->`
    Arrow,

    /// `var`
    KwVar,
    /// `shared` (durational local, captured by reference).
    KwShared,
    /// `static` (class-data declaration).
    KwStatic,
    /// `fn` (method-valued closure literal).
    KwFn,
    /// `coro` (coroutine-valued closure literal).
    KwCoro,
    /// `branch`
    KwBranch,
    /// `if`
    KwIf,
    /// `elif`
    KwElif,
    /// `else`
    KwElse,
    /// `while`
    KwWhile,
    /// `break`
    KwBreak,
    /// `continue`
    KwContinue,
    /// `return`
    KwReturn,
    /// `and`
    KwAnd,
    /// `or`
    KwOr,
    /// `not`
    KwNot,

    /// Statement terminator (`;`).
    StmtEnd,
    /// `,`
    Comma,
    /// `:`
    Colon,

    /// End of file.
    Eof,
}

/// Token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Token kind.
    pub kind: TokenKind,
    /// Span in source text.
    pub span: Span,
}
