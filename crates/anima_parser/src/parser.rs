//! Parser.
//!
//! Converts lexer tokens into a member definition (parameter header + body
//! block) and collects diagnostics. Recursive-descent statements plus Pratt
//! parsing for expressions.
//!
//! Two entry modes: `parse_member` for loading (returns `None` when the
//! header is unusable) and `parse_member_partial` for interactive tooling,
//! which always yields a best-effort tree. Both recover at statement
//! boundaries so one bad statement costs one `Stmt::Error`, not the member.
use anima_ir::{Code, MemberDef, MemberKind, Param, ParamKind, Parameters, Stmt};
use anima_syntax::{
    Diagnostic, DiagnosticKind, Span, Symbol, Token, TokenKind, is_coroutine_name,
};

/// Parse result for one member file.
pub struct MemberParse {
    pub def: Option<MemberDef>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Anima parser.
pub struct Parser<'a, 'b> {
    pub input: &'a str,
    pub tokens: &'a [Token],
    pub i: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub bump: &'b bumpalo::Bump,
}

impl<'a, 'b> Parser<'a, 'b> {
    /// Create a new parser.
    pub fn new(input: &'a str, tokens: &'a [Token], bump: &'b bumpalo::Bump) -> Self {
        Self {
            input,
            tokens,
            i: 0,
            diagnostics: Vec::with_capacity(8),
            bump,
        }
    }

    /// Parse a full member file: `(params) { body }`.
    ///
    /// `name` comes from the file name; it decides method vs coroutine and is
    /// validated against the body (coroutine names start with `_`).
    pub fn parse_member(mut self, name: Symbol, kind: MemberKind) -> MemberParse {
        self.check_member_name(name, kind);
        let params = match self.parse_params() {
            Some(p) => p,
            None => {
                return MemberParse {
                    def: None,
                    diagnostics: self.diagnostics,
                };
            }
        };
        let body = self.parse_body_block();
        let def = body.map(|body| MemberDef {
            name,
            kind,
            params,
            body,
            locals_count: 0,
        });
        MemberParse {
            def,
            diagnostics: self.diagnostics,
        }
    }

    /// Error-tolerant mode for interactive tooling: always yields a tree.
    /// A broken header degrades to an empty parameter list; a broken body
    /// degrades to whatever statements could be salvaged.
    pub fn parse_member_partial(mut self, name: Symbol, kind: MemberKind) -> MemberParse {
        self.check_member_name(name, kind);
        let params = self.parse_params().unwrap_or_default();
        let body = match self.parse_body_block() {
            Some(body) => body,
            None => self.recover_statements(),
        };
        MemberParse {
            def: Some(MemberDef {
                name,
                kind,
                params,
                body,
                locals_count: 0,
            }),
            diagnostics: self.diagnostics,
        }
    }

    /// Parse a bare expression (debugger eval, default-value snippets).
    pub fn parse_expression(mut self) -> (Option<anima_ir::Expr>, Vec<Diagnostic>) {
        self.skip_trivia();
        let expr = self.parse_expr();
        if expr.is_some() {
            self.skip_trivia();
            if !self.at(TokenKind::Eof) {
                let span = self.cur_span();
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::ExpectedToken("end of expression".to_string()),
                    Some(span),
                ));
            }
        }
        (expr, self.diagnostics)
    }

    fn check_member_name(&mut self, name: Symbol, kind: MemberKind) {
        let text = name.as_str();
        // The constructor `!` and destructor `!!` are methods and exempt.
        if text.starts_with('!') {
            return;
        }
        match kind {
            MemberKind::Coroutine if !is_coroutine_name(&text) => {
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::CoroutineNameUnderscore(text),
                    None,
                ));
            }
            MemberKind::Method | MemberKind::ClassMethod if is_coroutine_name(&text) => {
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::MethodNameUnderscore(text),
                    None,
                ));
            }
            _ => {}
        }
    }

    /// Parse a `(a, b: Type, c = expr, rest...)` header.
    pub fn parse_params(&mut self) -> Option<Parameters> {
        self.skip_trivia();
        self.expect(TokenKind::LParen)?;
        // Scratch list lives in the bump arena; the final header is compacted
        // into a boxed slice.
        let mut params = bumpalo::collections::Vec::new_in(self.bump);
        let mut seen_variadic = false;
        loop {
            self.skip_trivia();
            if self.at(TokenKind::RParen) {
                self.bump_token();
                break;
            }
            let name = self.expect_ident()?;
            let mut ty = None;
            if self.at(TokenKind::Colon) {
                self.bump_token();
                ty = Some(self.parse_type_spec()?);
            }
            let kind = if self.at(TokenKind::Ellipsis) {
                self.bump_token();
                if seen_variadic {
                    self.diagnostics.push(Diagnostic::error_kind(
                        DiagnosticKind::VariadicNotLast,
                        Some(self.cur_span()),
                    ));
                }
                seen_variadic = true;
                ParamKind::Variadic
            } else if self.at(TokenKind::Eq) {
                self.bump_token();
                if seen_variadic {
                    self.diagnostics.push(Diagnostic::error_kind(
                        DiagnosticKind::DefaultAfterVariadic,
                        Some(self.cur_span()),
                    ));
                }
                ParamKind::Defaulted(self.parse_expr()?)
            } else {
                if seen_variadic {
                    self.diagnostics.push(Diagnostic::error_kind(
                        DiagnosticKind::VariadicNotLast,
                        Some(self.cur_span()),
                    ));
                }
                ParamKind::Required
            };
            if params.iter().any(|p: &Param| p.name == name) {
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::DuplicateParameter(name.as_str()),
                    Some(self.cur_span()),
                ));
            }
            params.push(Param { name, ty, kind });
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
        let mut return_ty = None;
        self.skip_trivia();
        if self.at(TokenKind::Arrow) {
            self.bump_token();
            return_ty = Some(self.parse_type_spec()?);
        }
        Some(Parameters {
            params: params.iter().cloned().collect(),
            return_ty,
        })
    }

    /// Parse `{ stmts }`.
    pub fn parse_body_block(&mut self) -> Option<Code> {
        self.skip_trivia();
        if !self.at(TokenKind::LBrace) {
            let span = self.cur_span();
            self.diagnostics.push(Diagnostic::error_kind(
                DiagnosticKind::ExpectedToken("{ ... } block".to_string()),
                Some(span),
            ));
            return None;
        }
        self.parse_block()
    }

    pub fn parse_block(&mut self) -> Option<Code> {
        self.skip_trivia();
        self.expect(TokenKind::LBrace)?;
        let mut stmts: Vec<Stmt> = Vec::with_capacity(8);
        loop {
            self.skip_trivia();
            if self.at(TokenKind::RBrace) {
                self.bump_token();
                break;
            }
            if self.at(TokenKind::Eof) {
                let span = self.cur_span();
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::UnclosedDelimiter('{'),
                    Some(span),
                ));
                break;
            }
            match self.parse_stmt() {
                Some(s) => stmts.push(s),
                None => stmts.push(self.recover_stmt()),
            }
        }
        Some(stmts.into_boxed_slice())
    }

    /// Salvage whatever statements remain; used by partial mode when the body
    /// block itself is malformed.
    fn recover_statements(&mut self) -> Code {
        let mut stmts: Vec<Stmt> = Vec::new();
        while !self.at(TokenKind::Eof) {
            self.skip_trivia();
            if self.at(TokenKind::Eof) {
                break;
            }
            if self.at(TokenKind::LBrace) || self.at(TokenKind::RBrace) {
                self.bump_token();
                continue;
            }
            match self.parse_stmt() {
                Some(s) => stmts.push(s),
                None => stmts.push(self.recover_stmt()),
            }
        }
        stmts.into_boxed_slice()
    }

    /// Skip to the next statement boundary and produce an error statement, so
    /// one syntax error yields one diagnostic and parsing continues.
    pub fn recover_stmt(&mut self) -> Stmt {
        let start_span = self.cur_span();
        let mut brace_depth = 0;
        while !self.at(TokenKind::Eof) {
            if self.at(TokenKind::LBrace) {
                brace_depth += 1;
                self.bump_token();
                continue;
            }
            if self.at(TokenKind::RBrace) {
                if brace_depth > 0 {
                    brace_depth -= 1;
                    self.bump_token();
                    continue;
                } else {
                    // Don't consume unmatched RBrace
                    break;
                }
            }
            if brace_depth == 0 && (self.at(TokenKind::StmtEnd) || self.at(TokenKind::Newline)) {
                break;
            }
            self.bump_token();
        }
        if self.at(TokenKind::StmtEnd) || self.at(TokenKind::Newline) {
            self.bump_token();
        }
        Stmt::Error(Span::new(start_span.start.0, self.cur_span().end.0))
    }

    // Token helpers

    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub fn peek_kind(&self) -> TokenKind {
        self.tokens
            .get(self.i)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub fn peek_kind_n(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.i + n).map(|t| t.kind)
    }

    pub fn cur_span(&self) -> Span {
        self.tokens
            .get(self.i)
            .map(|t| t.span)
            .unwrap_or_else(|| Span::point(self.input.len() as u32))
    }

    pub fn bump_token(&mut self) -> Token {
        let t = self
            .tokens
            .get(self.i)
            .cloned()
            .unwrap_or(Token {
                kind: TokenKind::Eof,
                span: Span::point(self.input.len() as u32),
            });
        if self.i < self.tokens.len() {
            self.i += 1;
        }
        t
    }

    pub fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        self.skip_trivia_for(kind);
        if self.at(kind) {
            return Some(self.bump_token());
        }
        let span = self.cur_span();
        self.diagnostics.push(Diagnostic::error_kind(
            DiagnosticKind::ExpectedToken(format!("{:?}", kind)),
            Some(span),
        ));
        None
    }

    pub fn expect_ident(&mut self) -> Option<Symbol> {
        self.skip_trivia();
        if !self.at(TokenKind::Ident) {
            let span = self.cur_span();
            if let Some(kw) = self.keyword_text() {
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::KeywordAsIdentifier(kw),
                    Some(span),
                ));
            } else {
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::ExpectedToken("identifier".to_string()),
                    Some(span),
                ));
            }
            return None;
        }
        let t = self.bump_token();
        Some(Symbol::intern(self.token_text(&t)))
    }

    fn keyword_text(&self) -> Option<String> {
        let kind = self.peek_kind();
        let is_kw = matches!(
            kind,
            TokenKind::KwVar
                | TokenKind::KwShared
                | TokenKind::KwStatic
                | TokenKind::KwFn
                | TokenKind::KwCoro
                | TokenKind::KwBranch
                | TokenKind::KwIf
                | TokenKind::KwElif
                | TokenKind::KwElse
                | TokenKind::KwWhile
                | TokenKind::KwBreak
                | TokenKind::KwContinue
                | TokenKind::KwReturn
                | TokenKind::KwAnd
                | TokenKind::KwOr
                | TokenKind::KwNot
        );
        if is_kw {
            let t = self.tokens.get(self.i)?;
            Some(self.token_text(t).to_string())
        } else {
            None
        }
    }

    pub fn token_text(&self, t: &Token) -> &'a str {
        &self.input[t.span.start.0 as usize..t.span.end.0 as usize]
    }

    pub fn skip_trivia(&mut self) {
        while matches!(self.peek_kind(), TokenKind::Newline | TokenKind::StmtEnd) {
            self.bump_token();
        }
    }

    // Skip trivia unless the caller is looking for a terminator itself.
    fn skip_trivia_for(&mut self, kind: TokenKind) {
        if !matches!(kind, TokenKind::Newline | TokenKind::StmtEnd) {
            self.skip_trivia();
        }
    }

    pub fn expect_stmt_terminator(&mut self) -> Option<()> {
        if self.at(TokenKind::StmtEnd) || self.at(TokenKind::Newline) {
            self.bump_token();
            return Some(());
        }
        if self.at(TokenKind::Eof) || self.at(TokenKind::RBrace) {
            return Some(());
        }
        let span = self.cur_span();
        self.diagnostics.push(Diagnostic::error_kind(
            DiagnosticKind::ExpectedToken("end of statement".to_string()),
            Some(span),
        ));
        None
    }
}
