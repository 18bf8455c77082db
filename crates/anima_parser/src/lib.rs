//!
//!
//!
//!
mod bind;
mod expr;
mod parser;
mod stmt;
mod types;

pub use bind::{ClassScope, NullScope, bind_frame_expr, bind_member, static_type_of};
pub use parser::{MemberParse, Parser};
pub use stmt::UNRESOLVED_SLOT;
pub use anima_ir::*;

use anima_lexer::Lexer;
use anima_syntax::{Diagnostic, Symbol};

/// Lex + parse + bind one member source file against a class scope.
///
/// Convenience wrapper used by the loader and the remote member-push path;
/// `partial` selects the error-tolerant tooling mode that always yields a
/// tree.
pub fn compile_member(
    source: &str,
    name: Symbol,
    kind: MemberKind,
    class: Symbol,
    ctx: &dyn ClassScope,
    partial: bool,
) -> (Option<MemberDef>, Vec<Diagnostic>) {
    let lex = Lexer::new(source).lex();
    let bump = bumpalo::Bump::new();
    let parser = Parser::new(source, &lex.tokens, &bump);
    let mut parse = if partial {
        parser.parse_member_partial(name, kind)
    } else {
        parser.parse_member(name, kind)
    };
    let mut diagnostics = lex.diagnostics;
    diagnostics.extend(parse.diagnostics.drain(..));
    if let Some(def) = &mut parse.def {
        diagnostics.extend(bind_member(def, class, ctx));
    }
    (parse.def, diagnostics)
}

/// Parse a type written in source form (`Integer`, `List[Real]`,
/// `(Integer) -> Integer`). Used for data-member declaration files.
pub fn parse_type_text(source: &str) -> (Option<TypeSpec>, Vec<Diagnostic>) {
    let lex = Lexer::new(source).lex();
    let bump = bumpalo::Bump::new();
    let mut parser = Parser::new(source, &lex.tokens, &bump);
    let ty = parser.parse_type_spec();
    let mut diagnostics = lex.diagnostics;
    diagnostics.extend(parser.diagnostics);
    (ty, diagnostics)
}

/// Lex + parse + bind a bare expression against a live frame's locals.
pub fn compile_frame_expr(
    source: &str,
    locals: &[(Symbol, u16, bool)],
    class: Symbol,
    ctx: &dyn ClassScope,
) -> (Option<Expr>, Vec<Diagnostic>) {
    let lex = Lexer::new(source).lex();
    let bump = bumpalo::Bump::new();
    let parser = Parser::new(source, &lex.tokens, &bump);
    let (expr, mut diagnostics) = parser.parse_expression();
    diagnostics.extend(lex.diagnostics);
    let mut expr = expr;
    if let Some(e) = &mut expr {
        diagnostics.extend(bind_frame_expr(e, locals, class, ctx));
    }
    (expr, diagnostics)
}
