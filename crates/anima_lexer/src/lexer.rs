//! Lexer implementation.
//!
//! Scans member source text into tokens (keywords/idents/literals/delimiters)
//! and collects diagnostics. Newlines terminate statements except inside
//! delimiters; a delimiter stack tracks nesting.
//!
//! Design: single linear pass, minimal allocations.
use crate::keywords::KEYWORDS;
use anima_syntax::{Diagnostic, DiagnosticKind, Span, Token, TokenKind, is_ident_continue, is_ident_start};

/// Lexing result.
pub struct LexResult {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Anima lexer.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    i: usize,
    diagnostics: Vec<Diagnostic>,
    tokens: Vec<Token>,
    delim_stack: Vec<char>,
    last_sig_kind: Option<TokenKind>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            i: 0,
            diagnostics: Vec::new(),
            tokens: Vec::new(),
            delim_stack: Vec::new(),
            last_sig_kind: None,
        }
    }

    /// Run the lexer and return tokens + diagnostics.
    pub fn lex(mut self) -> LexResult {
        let approx = self.bytes.len().saturating_div(4).max(32);
        self.tokens.reserve(approx);
        while self.i < self.bytes.len() {
            let start = self.i;
            let Some(c) = self.peek_char() else { break };

            match c {
                '\r' => {
                    self.i += 1;
                    if self.peek_char() == Some('\n') {
                        self.i += 1;
                    }
                    self.newline(start);
                }
                '\n' => {
                    self.i += 1;
                    self.newline(start);
                }
                ' ' | '\t' => {
                    self.i += 1;
                }
                '/' => {
                    if self.peek_str("//") {
                        self.i += 2;
                        while let Some(ch) = self.peek_char() {
                            if ch == '\n' {
                                break;
                            }
                            self.i += ch.len_utf8();
                        }
                    } else if self.peek_str("/*") {
                        self.block_comment(start);
                    } else {
                        self.i += 1;
                        self.push(TokenKind::Slash, start);
                    }
                }
                '(' => self.open_delim(TokenKind::LParen, '(', start),
                ')' => self.close_delim(TokenKind::RParen, '(', ')', start),
                '[' => self.open_delim(TokenKind::LBracket, '[', start),
                ']' => self.close_delim(TokenKind::RBracket, '[', ']', start),
                '{' => self.open_delim(TokenKind::LBrace, '{', start),
                '}' => self.close_delim(TokenKind::RBrace, '{', '}', start),
                '+' => {
                    self.i += 1;
                    self.push(TokenKind::Plus, start);
                }
                '-' => {
                    self.i += 1;
                    if self.peek_char() == Some('>') {
                        self.i += 1;
                        self.push(TokenKind::Arrow, start);
                    } else {
                        self.push(TokenKind::Minus, start);
                    }
                }
                '*' => {
                    self.i += 1;
                    self.push(TokenKind::Star, start);
                }
                '%' => {
                    self.i += 1;
                    self.push(TokenKind::Percent, start);
                }
                '=' => {
                    self.i += 1;
                    if self.peek_char() == Some('=') {
                        self.i += 1;
                        self.push(TokenKind::EqEq, start);
                    } else {
                        self.push(TokenKind::Eq, start);
                    }
                }
                '!' => {
                    self.i += 1;
                    if self.peek_char() == Some('=') {
                        self.i += 1;
                        self.push(TokenKind::Ne, start);
                    } else {
                        self.push(TokenKind::Bang, start);
                    }
                }
                '>' => {
                    self.i += 1;
                    if self.peek_char() == Some('=') {
                        self.i += 1;
                        self.push(TokenKind::Ge, start);
                    } else {
                        self.push(TokenKind::Gt, start);
                    }
                }
                '<' => {
                    self.i += 1;
                    if self.peek_char() == Some('=') {
                        self.i += 1;
                        self.push(TokenKind::Le, start);
                    } else {
                        self.push(TokenKind::Lt, start);
                    }
                }
                '@' => {
                    self.i += 1;
                    self.push(TokenKind::At, start);
                }
                '.' => {
                    if self.peek_str("...") {
                        self.i += 3;
                        self.push(TokenKind::Ellipsis, start);
                    } else {
                        self.i += 1;
                        self.push(TokenKind::Dot, start);
                    }
                }
                ';' => {
                    self.i += 1;
                    self.push(TokenKind::StmtEnd, start);
                }
                ',' => {
                    self.i += 1;
                    self.push(TokenKind::Comma, start);
                }
                ':' => {
                    self.i += 1;
                    self.push(TokenKind::Colon, start);
                }
                '"' => self.string_literal(start),
                '\'' => self.symbol_literal(start),
                c if c.is_ascii_digit() => self.number(start),
                c if is_ident_start(c) => self.ident(start),
                other => {
                    self.i += other.len_utf8();
                    self.diagnostics.push(Diagnostic::error_kind(
                        DiagnosticKind::UnexpectedChar(other),
                        Some(Span::new(start as u32, self.i as u32)),
                    ));
                }
            }
        }
        for c in std::mem::take(&mut self.delim_stack) {
            self.diagnostics.push(Diagnostic::error_kind(
                DiagnosticKind::UnclosedDelimiter(c),
                Some(Span::new(self.i as u32, self.i as u32)),
            ));
        }
        self.push(TokenKind::Eof, self.i);
        LexResult {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    fn newline(&mut self, start: usize) {
        // Newlines separate statements except inside parentheses/brackets
        // (where expressions may wrap), and only after something that can
        // end a statement. Braces delimit blocks, not expressions, so they
        // do not suppress termination.
        let in_expr_delim = self.delim_stack.iter().any(|&c| c == '(' || c == '[');
        if !in_expr_delim && self.ends_statement() {
            self.push(TokenKind::Newline, start);
        }
    }

    fn ends_statement(&self) -> bool {
        matches!(
            self.last_sig_kind,
            Some(
                TokenKind::Ident
                    | TokenKind::Int
                    | TokenKind::Real
                    | TokenKind::Str
                    | TokenKind::Sym
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Nil
                    | TokenKind::This
                    | TokenKind::RParen
                    | TokenKind::RBracket
                    | TokenKind::RBrace
                    | TokenKind::KwBreak
                    | TokenKind::KwContinue
                    | TokenKind::KwReturn
            )
        )
    }

    fn open_delim(&mut self, kind: TokenKind, open: char, start: usize) {
        self.i += 1;
        self.delim_stack.push(open);
        self.push(kind, start);
    }

    fn close_delim(&mut self, kind: TokenKind, open: char, close: char, start: usize) {
        self.i += 1;
        match self.delim_stack.pop() {
            Some(top) if top == open => {}
            _ => {
                self.diagnostics.push(Diagnostic::error_kind(
                    DiagnosticKind::UnmatchedDelimiter(close),
                    Some(Span::new(start as u32, self.i as u32)),
                ));
            }
        }
        self.push(kind, start);
    }

    fn block_comment(&mut self, start: usize) {
        self.i += 2;
        let mut depth = 1u32;
        while self.i < self.bytes.len() {
            if self.peek_str("*/") {
                self.i += 2;
                depth -= 1;
                if depth == 0 {
                    return;
                }
                continue;
            }
            if self.peek_str("/*") {
                self.i += 2;
                depth += 1;
                continue;
            }
            let ch = self.peek_char().unwrap();
            self.i += ch.len_utf8();
        }
        self.diagnostics.push(Diagnostic::error_kind(
            DiagnosticKind::UnterminatedBlockComment,
            Some(Span::new(start as u32, self.i as u32)),
        ));
    }

    fn string_literal(&mut self, start: usize) {
        self.i += 1;
        let mut terminated = false;
        while let Some(ch) = self.peek_char() {
            if ch == '"' {
                self.i += 1;
                terminated = true;
                break;
            }
            if ch == '\\' {
                self.i += 1;
                if let Some(esc) = self.peek_char() {
                    self.i += esc.len_utf8();
                }
                continue;
            }
            if ch == '\n' {
                break;
            }
            self.i += ch.len_utf8();
        }
        if !terminated {
            self.diagnostics.push(Diagnostic::error_kind(
                DiagnosticKind::UnterminatedString,
                Some(Span::new(start as u32, self.i as u32)),
            ));
        }
        self.push(TokenKind::Str, start);
    }

    fn symbol_literal(&mut self, start: usize) {
        self.i += 1;
        let mut terminated = false;
        while let Some(ch) = self.peek_char() {
            if ch == '\'' {
                self.i += 1;
                terminated = true;
                break;
            }
            if ch == '\n' {
                break;
            }
            self.i += ch.len_utf8();
        }
        if !terminated {
            self.diagnostics.push(Diagnostic::error_kind(
                DiagnosticKind::UnterminatedSymbol,
                Some(Span::new(start as u32, self.i as u32)),
            ));
        }
        self.push(TokenKind::Sym, start);
    }

    fn number(&mut self, start: usize) {
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '_' {
                self.i += 1;
            } else {
                break;
            }
        }
        let mut is_real = false;
        // A fractional part only if the dot is followed by a digit, so `1..2`
        // style ranges and `1.method` stay unambiguous.
        if self.peek_char() == Some('.')
            && self
                .bytes
                .get(self.i + 1)
                .is_some_and(|b| b.is_ascii_digit())
        {
            is_real = true;
            self.i += 1;
            while let Some(c) = self.peek_char() {
                if c.is_ascii_digit() || c == '_' {
                    self.i += 1;
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let save = self.i;
            self.i += 1;
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.i += 1;
            }
            if self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                is_real = true;
                while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                    self.i += 1;
                }
            } else {
                self.i = save;
            }
        }
        self.push(
            if is_real {
                TokenKind::Real
            } else {
                TokenKind::Int
            },
            start,
        );
    }

    fn ident(&mut self, start: usize) {
        while let Some(c) = self.peek_char() {
            if is_ident_continue(c) {
                self.i += c.len_utf8();
            } else {
                break;
            }
        }
        let text = &self.input[start..self.i];
        let kind = KEYWORDS.get(text).copied().unwrap_or(TokenKind::Ident);
        self.push(kind, start);
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        if kind != TokenKind::Newline {
            self.last_sig_kind = Some(kind);
        } else {
            self.last_sig_kind = None;
        }
        self.tokens.push(Token {
            kind,
            span: Span::new(start as u32, self.i as u32),
        });
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.i..].chars().next()
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.i..].starts_with(s)
    }
}
