//! Expression parsing (Pratt).
use anima_ir::{
    BinaryExpr, BinaryOp, CallExpr, ClosureLit, CoroCallExpr, Expr, UnaryExpr, UnaryOp,
};
use anima_syntax::{
    Diagnostic, DiagnosticKind, Symbol, TokenKind, is_coroutine_name, unescape,
};

use crate::parser::Parser;
use crate::stmt::unresolved_ident;

impl<'a, 'b> Parser<'a, 'b> {
    pub fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_bin_expr(0)
    }

    fn parse_bin_expr(&mut self, min_bp: u8) -> Option<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let Some((op, bp)) = self.peek_binop() else {
                break;
            };
            if bp < min_bp {
                break;
            }
            self.bump_token();
            let rhs = self.parse_bin_expr(bp + 1)?;
            lhs = Expr::Binary(Box::new(BinaryExpr {
                op,
                left: lhs,
                right: rhs,
            }));
        }
        Some(lhs)
    }

    // Fixed precedence table, lowest binds loosest. All binary operators are
    // left-associative.
    fn peek_binop(&self) -> Option<(BinaryOp, u8)> {
        Some(match self.peek_kind() {
            TokenKind::KwOr => (BinaryOp::Or, 1),
            TokenKind::KwAnd => (BinaryOp::And, 2),
            TokenKind::EqEq => (BinaryOp::Eq, 3),
            TokenKind::Ne => (BinaryOp::Ne, 3),
            TokenKind::Gt => (BinaryOp::Gt, 4),
            TokenKind::Lt => (BinaryOp::Lt, 4),
            TokenKind::Ge => (BinaryOp::Ge, 4),
            TokenKind::Le => (BinaryOp::Le, 4),
            TokenKind::Plus => (BinaryOp::Add, 5),
            TokenKind::Minus => (BinaryOp::Sub, 5),
            TokenKind::Star => (BinaryOp::Mul, 6),
            TokenKind::Slash => (BinaryOp::Div, 6),
            TokenKind::Percent => (BinaryOp::Mod, 6),
            _ => return None,
        })
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        match self.peek_kind() {
            TokenKind::Minus => {
                self.bump_token();
                let expr = self.parse_unary()?;
                Some(Expr::Unary(Box::new(UnaryExpr {
                    op: UnaryOp::Neg,
                    expr,
                })))
            }
            TokenKind::KwNot => {
                self.bump_token();
                let expr = self.parse_unary()?;
                Some(Expr::Unary(Box::new(UnaryExpr {
                    op: UnaryOp::Not,
                    expr,
                })))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Option<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            if !self.at(TokenKind::Dot) {
                break;
            }
            self.bump_token();
            let start = self.cur_span();
            let name = self.expect_ident()?;
            let args = if self.at(TokenKind::LParen) {
                self.parse_args()?
            } else {
                Box::new([])
            };
            let span = start.merge(self.cur_span());
            // `.name` with no parens is a zero-argument call; data members are
            // private to the receiver and never reachable through `.`.
            expr = if is_coroutine_name(&name.as_str()) {
                Expr::CoroCall(Box::new(CoroCallExpr {
                    receiver: Some(expr),
                    coroutine: name,
                    args,
                    span,
                }))
            } else {
                Expr::Call(Box::new(CallExpr {
                    receiver: Some(expr),
                    method: name,
                    args,
                    span,
                }))
            };
        }
        Some(expr)
    }

    fn parse_args(&mut self) -> Option<Box<[Expr]>> {
        self.expect(TokenKind::LParen)?;
        let mut args: Vec<Expr> = Vec::new();
        loop {
            self.skip_trivia();
            if self.at(TokenKind::RParen) {
                self.bump_token();
                break;
            }
            args.push(self.parse_expr()?);
            self.skip_trivia();
            if self.at(TokenKind::Comma) {
                self.bump_token();
                continue;
            }
            if self.at(TokenKind::RParen) {
                self.bump_token();
                break;
            }
            let span = self.cur_span();
            self.diagnostics.push(Diagnostic::error_kind(
                DiagnosticKind::ExpectedToken("',' or ')'".to_string()),
                Some(span),
            ));
            return None;
        }
        Some(args.into_boxed_slice())
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        match self.peek_kind() {
            TokenKind::Int => {
                let t = self.bump_token();
                let text = self.token_text(&t);
                let cleaned: String = text.chars().filter(|c| *c != '_').collect();
                match cleaned.parse::<i64>() {
                    Ok(v) => Some(Expr::Int(v)),
                    Err(_) => {
                        self.diagnostics.push(Diagnostic::error_kind(
                            DiagnosticKind::BadNumberLiteral(text.to_string()),
                            Some(t.span),
                        ));
                        Some(Expr::Int(0))
                    }
                }
            }
            TokenKind::Real => {
                let t = self.bump_token();
                let text = self.token_text(&t);
                let cleaned: String = text.chars().filter(|c| *c != '_').collect();
                match cleaned.parse::<f32>() {
                    Ok(v) => Some(Expr::Real(v)),
                    Err(_) => {
                        self.diagnostics.push(Diagnostic::error_kind(
                            DiagnosticKind::BadNumberLiteral(text.to_string()),
                            Some(t.span),
                        ));
                        Some(Expr::Real(0.0))
                    }
                }
            }
            TokenKind::Str => {
                let t = self.bump_token();
                let raw = self.token_text(&t);
                let body = raw
                    .strip_prefix('"')
                    .map(|s| s.strip_suffix('"').unwrap_or(s))
                    .unwrap_or(raw);
                match unescape(body) {
                    Ok(s) => Some(Expr::Str(s.into_boxed_str())),
                    Err(c) => {
                        self.diagnostics.push(Diagnostic::error_kind(
                            DiagnosticKind::BadEscape(c),
                            Some(t.span),
                        ));
                        Some(Expr::Str(body.into()))
                    }
                }
            }
            TokenKind::Sym => {
                let t = self.bump_token();
                let raw = self.token_text(&t);
                let body = raw
                    .strip_prefix('\'')
                    .map(|s| s.strip_suffix('\'').unwrap_or(s))
                    .unwrap_or(raw);
                Some(Expr::Sym(Symbol::intern(body)))
            }
            TokenKind::True => {
                self.bump_token();
                Some(Expr::Bool(true))
            }
            TokenKind::False => {
                self.bump_token();
                Some(Expr::Bool(false))
            }
            TokenKind::Nil => {
                self.bump_token();
                Some(Expr::Nil)
            }
            TokenKind::This => {
                self.bump_token();
                Some(Expr::This)
            }
            TokenKind::At => self.parse_object_id(),
            TokenKind::LBracket => {
                self.bump_token();
                let mut items: Vec<Expr> = Vec::new();
                loop {
                    self.skip_trivia();
                    if self.at(TokenKind::RBracket) {
                        self.bump_token();
                        break;
                    }
                    items.push(self.parse_expr()?);
                    self.skip_trivia();
                    if self.at(TokenKind::Comma) {
                        self.bump_token();
                        continue;
                    }
                    if self.at(TokenKind::RBracket) {
                        self.bump_token();
                        break;
                    }
                    let span = self.cur_span();
                    self.diagnostics.push(Diagnostic::error_kind(
                        DiagnosticKind::ExpectedToken("',' or ']'".to_string()),
                        Some(span),
                    ));
                    return None;
                }
                Some(Expr::List(items.into_boxed_slice()))
            }
            TokenKind::LParen => {
                self.bump_token();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Some(inner)
            }
            TokenKind::KwFn => self.parse_closure(false),
            TokenKind::KwCoro => self.parse_closure(true),
            TokenKind::Ident => self.parse_ident_expr(),
            _ => {
                let span = self.cur_span();
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::ExpectedExpression,
                    Some(span),
                ));
                None
            }
        }
    }

    // `name`, `name(args)`, `_name(args)` or `Name!(args)` (constructor).
    fn parse_ident_expr(&mut self) -> Option<Expr> {
        let t = self.bump_token();
        let text = self.token_text(&t);
        let name = Symbol::intern(text);
        if self.at(TokenKind::Bang) && self.peek_kind_n(1) == Some(TokenKind::LParen) {
            self.bump_token();
            let args = self.parse_args()?;
            let span = t.span.merge(self.cur_span());
            return Some(Expr::Call(Box::new(CallExpr {
                receiver: Some(unresolved_ident(name)),
                method: Symbol::intern("!"),
                args,
                span,
            })));
        }
        if self.at(TokenKind::LParen) {
            let args = self.parse_args()?;
            let span = t.span.merge(self.cur_span());
            if is_coroutine_name(text) {
                return Some(Expr::CoroCall(Box::new(CoroCallExpr {
                    receiver: None,
                    coroutine: name,
                    args,
                    span,
                })));
            }
            return Some(Expr::Call(Box::new(CallExpr {
                receiver: None,
                method: name,
                args,
                span,
            })));
        }
        Some(unresolved_ident(name))
    }

    fn parse_object_id(&mut self) -> Option<Expr> {
        let at = self.bump_token();
        match self.peek_kind() {
            TokenKind::Ident => {
                let t = self.bump_token();
                let name = Symbol::intern(self.token_text(&t));
                Some(Expr::ObjectId {
                    name,
                    span: at.span.merge(t.span),
                })
            }
            TokenKind::Sym => {
                let t = self.bump_token();
                let raw = self.token_text(&t);
                let body = raw
                    .strip_prefix('\'')
                    .map(|s| s.strip_suffix('\'').unwrap_or(s))
                    .unwrap_or(raw);
                Some(Expr::ObjectId {
                    name: Symbol::intern(body),
                    span: at.span.merge(t.span),
                })
            }
            _ => {
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::BadObjectIdLiteral,
                    Some(at.span),
                ));
                None
            }
        }
    }

    fn parse_closure(&mut self, is_coroutine: bool) -> Option<Expr> {
        self.bump_token();
        let params = self.parse_params()?;
        let body = self.parse_block()?;
        Some(Expr::Closure(Box::new(ClosureLit {
            is_coroutine,
            params,
            body,
            captures: Box::new([]),
            locals_count: 0,
        })))
    }
}
