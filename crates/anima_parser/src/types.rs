//! Type-spec parsing.
use anima_ir::{InvokableSig, TypeSpec, TypedSpec};
use anima_syntax::{Diagnostic, DiagnosticKind, TokenKind};

use crate::parser::Parser;

impl<'a, 'b> Parser<'a, 'b> {
    /// `Name`, `Name[T, ...]`, `(T, ...) -> R` or `coro (T, ...) -> R`.
    pub fn parse_type_spec(&mut self) -> Option<TypeSpec> {
        self.skip_trivia();
        match self.peek_kind() {
            TokenKind::Ident => {
                let name = self.expect_ident()?;
                if self.at(TokenKind::LBracket) {
                    self.bump_token();
                    let mut params: Vec<TypeSpec> = Vec::with_capacity(2);
                    loop {
                        params.push(self.parse_type_spec()?);
                        self.skip_trivia();
                        if self.at(TokenKind::Comma) {
                            self.bump_token();
                            continue;
                        }
                        self.expect(TokenKind::RBracket)?;
                        break;
                    }
                    return Some(TypeSpec::Typed(Box::new(TypedSpec {
                        name,
                        params: params.into_boxed_slice(),
                    })));
                }
                Some(TypeSpec::Named(name))
            }
            TokenKind::KwCoro => {
                self.bump_token();
                self.parse_invokable_sig(true)
            }
            TokenKind::LParen => self.parse_invokable_sig(false),
            _ => {
                let span = self.cur_span();
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::ExpectedTypeSpec,
                    Some(span),
                ));
                None
            }
        }
    }

    fn parse_invokable_sig(&mut self, is_coroutine: bool) -> Option<TypeSpec> {
        self.expect(TokenKind::LParen)?;
        let mut params: Vec<TypeSpec> = Vec::new();
        loop {
            self.skip_trivia();
            if self.at(TokenKind::RParen) {
                self.bump_token();
                break;
            }
            params.push(self.parse_type_spec()?);
            self.skip_trivia();
            if self.at(TokenKind::Comma) {
                self.bump_token();
                continue;
            }
            self.expect(TokenKind::RParen)?;
            break;
        }
        let return_ty = if self.at(TokenKind::Arrow) {
            self.bump_token();
            Some(self.parse_type_spec()?)
        } else {
            None
        };
        Some(TypeSpec::Invokable(Box::new(InvokableSig {
            is_coroutine,
            params: params.into_boxed_slice(),
            return_ty,
        })))
    }
}
