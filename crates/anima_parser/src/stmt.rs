//! Statement parsing.
use anima_ir::{AssignStmt, ClosureLit, Expr, IfStmt, Parameters, Place, Stmt, VarDecl, WhileStmt};
use anima_syntax::{Symbol, TokenKind};

use crate::parser::Parser;

/// Sentinel for slots the binder has not assigned yet.
pub const UNRESOLVED_SLOT: u16 = u16::MAX;

impl<'a, 'b> Parser<'a, 'b> {
    pub fn parse_stmt(&mut self) -> Option<Stmt> {
        self.skip_trivia();
        match self.peek_kind() {
            TokenKind::KwVar => self.parse_var_decl(false),
            TokenKind::KwShared => self.parse_var_decl(true),
            TokenKind::KwIf => self.parse_if(),
            TokenKind::KwWhile => self.parse_while(),
            TokenKind::KwBranch => {
                self.bump_token();
                let body = self.parse_block()?;
                self.expect_stmt_terminator()?;
                Some(Stmt::Branch(Box::new(ClosureLit {
                    is_coroutine: true,
                    params: Parameters::empty(),
                    body,
                    captures: Box::new([]),
                    locals_count: 0,
                })))
            }
            TokenKind::KwReturn => {
                self.bump_token();
                let value = if self.at(TokenKind::Newline)
                    || self.at(TokenKind::StmtEnd)
                    || self.at(TokenKind::RBrace)
                    || self.at(TokenKind::Eof)
                {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                self.expect_stmt_terminator()?;
                Some(Stmt::Return(value))
            }
            TokenKind::KwBreak => {
                self.bump_token();
                self.expect_stmt_terminator()?;
                Some(Stmt::Break)
            }
            TokenKind::KwContinue => {
                self.bump_token();
                self.expect_stmt_terminator()?;
                Some(Stmt::Continue)
            }
            // `name = expr` is an assignment; anything else falls through to
            // an expression statement.
            TokenKind::Ident if self.peek_kind_n(1) == Some(TokenKind::Eq) => {
                let name = self.expect_ident()?;
                self.expect(TokenKind::Eq)?;
                let value = self.parse_expr()?;
                self.expect_stmt_terminator()?;
                Some(Stmt::Assign(Box::new(AssignStmt {
                    target: Place::Local {
                        name,
                        slot: UNRESOLVED_SLOT,
                        shared: false,
                    },
                    value,
                })))
            }
            _ => {
                let expr = self.parse_expr()?;
                self.expect_stmt_terminator()?;
                Some(Stmt::Expr(expr))
            }
        }
    }

    fn parse_var_decl(&mut self, shared: bool) -> Option<Stmt> {
        self.bump_token();
        let name = self.expect_ident()?;
        let mut ty = None;
        if self.at(TokenKind::Colon) {
            self.bump_token();
            ty = Some(self.parse_type_spec()?);
        }
        let value = if self.at(TokenKind::Eq) {
            self.bump_token();
            self.parse_expr()?
        } else {
            Expr::Nil
        };
        self.expect_stmt_terminator()?;
        Some(Stmt::VarDecl(Box::new(VarDecl {
            name,
            shared,
            ty,
            slot: UNRESOLVED_SLOT,
            value,
        })))
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        self.bump_token();
        let mut branches: Vec<(Expr, anima_ir::Code)> = Vec::with_capacity(2);
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        branches.push((cond, body));
        let mut else_code = None;
        loop {
            self.skip_trivia();
            if self.at(TokenKind::KwElif) {
                self.bump_token();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                branches.push((cond, body));
                continue;
            }
            if self.at(TokenKind::KwElse) {
                self.bump_token();
                else_code = Some(self.parse_block()?);
            }
            break;
        }
        Some(Stmt::If(Box::new(IfStmt {
            branches: branches.into_boxed_slice(),
            else_code,
        })))
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        self.bump_token();
        let cond = self.parse_expr()?;
        let body = self.parse_block()?;
        Some(Stmt::While(Box::new(WhileStmt { cond, body })))
    }
}

/// Unresolved identifier marker used between parse and bind: the parser emits
/// reads as `Expr::Local` with `UNRESOLVED_SLOT`; the binder rewrites them
/// against the scope chain or diagnoses them.
pub fn unresolved_ident(name: Symbol) -> Expr {
    Expr::Local {
        name,
        slot: UNRESOLVED_SLOT,
        shared: false,
    }
}
