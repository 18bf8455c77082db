//! Packed binary form of compiled members.
//!
//! Little-endian, tag-per-variant codec. Symbols travel as strings since
//! intern ids are not stable across processes. The same reader/writer pair is
//! used by the remote debug protocol for its payloads.
//!
//! Round-trip contract: decode(encode(x)) == x for every member produced by
//! the parser, and the decoded tree evaluates identically.
use anima_syntax::{Span, Symbol};

use crate::{
    AssignStmt, BinaryOp, Capture, CallExpr, ClosureLit, Code, CoroCallExpr, DataDef, Expr,
    IfStmt, InvokableSig, MemberDef, MemberKind, Param, ParamKind, Parameters, Place, Stmt,
    TypeSpec, TypedSpec, UnaryExpr, UnaryOp, VarDecl, WhileStmt, BinaryExpr,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BinError {
    UnexpectedEof,
    BadTag(u8),
    BadUtf8,
    TrailingBytes,
}

impl std::fmt::Display for BinError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinError::UnexpectedEof => write!(f, "unexpected end of input"),
            BinError::BadTag(t) => write!(f, "unknown tag {t:#04x}"),
            BinError::BadUtf8 => write!(f, "invalid utf-8 in string"),
            BinError::TrailingBytes => write!(f, "trailing bytes after value"),
        }
    }
}

impl std::error::Error for BinError {}

#[derive(Default)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn i64(&mut self, v: i64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f64(&mut self, v: f64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn bool(&mut self, v: bool) {
        self.u8(v as u8);
    }

    pub fn str(&mut self, s: &str) {
        self.u32(s.len() as u32);
        self.buf.extend_from_slice(s.as_bytes());
    }

    pub fn sym(&mut self, s: Symbol) {
        self.str(&s.as_str());
    }

    pub fn span(&mut self, s: Span) {
        self.u32(s.start.0);
        self.u32(s.end.0);
    }

    pub fn bytes(&mut self, b: &[u8]) {
        self.buf.extend_from_slice(b);
    }
}

pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos == self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BinError> {
        if self.remaining() < n {
            return Err(BinError::UnexpectedEof);
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, BinError> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16, BinError> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn u32(&mut self) -> Result<u32, BinError> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn u64(&mut self) -> Result<u64, BinError> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn i64(&mut self) -> Result<i64, BinError> {
        Ok(i64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn f32(&mut self) -> Result<f32, BinError> {
        Ok(f32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn f64(&mut self) -> Result<f64, BinError> {
        Ok(f64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn bool(&mut self) -> Result<bool, BinError> {
        Ok(self.u8()? != 0)
    }

    pub fn str(&mut self) -> Result<String, BinError> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        std::str::from_utf8(raw)
            .map(|s| s.to_string())
            .map_err(|_| BinError::BadUtf8)
    }

    pub fn sym(&mut self) -> Result<Symbol, BinError> {
        Ok(Symbol::intern(&self.str()?))
    }

    pub fn span(&mut self) -> Result<Span, BinError> {
        let start = self.u32()?;
        let end = self.u32()?;
        Ok(Span::new(start, end))
    }
}

// Stmt tags
const ST_EXPR: u8 = 0x01;
const ST_VAR: u8 = 0x02;
const ST_ASSIGN: u8 = 0x03;
const ST_IF: u8 = 0x04;
const ST_WHILE: u8 = 0x05;
const ST_BRANCH: u8 = 0x06;
const ST_RETURN: u8 = 0x07;
const ST_BREAK: u8 = 0x08;
const ST_CONTINUE: u8 = 0x09;
const ST_ERROR: u8 = 0x0a;

// Expr tags
const EX_NIL: u8 = 0x20;
const EX_BOOL: u8 = 0x21;
const EX_INT: u8 = 0x22;
const EX_REAL: u8 = 0x23;
const EX_STR: u8 = 0x24;
const EX_SYM: u8 = 0x25;
const EX_LIST: u8 = 0x26;
const EX_THIS: u8 = 0x27;
const EX_LOCAL: u8 = 0x28;
const EX_MEMBER: u8 = 0x29;
const EX_CLASSDATA: u8 = 0x2a;
const EX_GLOBAL: u8 = 0x2b;
const EX_OBJID: u8 = 0x2c;
const EX_CLOSURE: u8 = 0x2d;
const EX_CALL: u8 = 0x2e;
const EX_COROCALL: u8 = 0x2f;
const EX_UNARY: u8 = 0x30;
const EX_BINARY: u8 = 0x31;
const EX_ERROR: u8 = 0x32;

// Place tags
const PL_LOCAL: u8 = 0x40;
const PL_MEMBER: u8 = 0x41;
const PL_CLASSDATA: u8 = 0x42;

// TypeSpec tags
const TY_NAMED: u8 = 0x50;
const TY_TYPED: u8 = 0x51;
const TY_INVOKABLE: u8 = 0x52;

// ParamKind tags
const PK_REQUIRED: u8 = 0x60;
const PK_DEFAULTED: u8 = 0x61;
const PK_VARIADIC: u8 = 0x62;

pub fn encode_member(def: &MemberDef, w: &mut ByteWriter) {
    w.sym(def.name);
    w.u8(match def.kind {
        MemberKind::Method => 0,
        MemberKind::Coroutine => 1,
        MemberKind::ClassMethod => 2,
    });
    encode_params(&def.params, w);
    encode_code(&def.body, w);
    w.u16(def.locals_count);
}

pub fn decode_member(r: &mut ByteReader) -> Result<MemberDef, BinError> {
    let name = r.sym()?;
    let kind = match r.u8()? {
        0 => MemberKind::Method,
        1 => MemberKind::Coroutine,
        2 => MemberKind::ClassMethod,
        t => return Err(BinError::BadTag(t)),
    };
    let params = decode_params(r)?;
    let body = decode_code(r)?;
    let locals_count = r.u16()?;
    Ok(MemberDef {
        name,
        kind,
        params,
        body,
        locals_count,
    })
}

pub fn encode_data_def(def: &DataDef, w: &mut ByteWriter) {
    w.sym(def.name);
    encode_opt_type(&def.ty, w);
    w.bool(def.is_class_data);
}

pub fn decode_data_def(r: &mut ByteReader) -> Result<DataDef, BinError> {
    let name = r.sym()?;
    let ty = decode_opt_type(r)?;
    let is_class_data = r.bool()?;
    Ok(DataDef {
        name,
        ty,
        is_class_data,
    })
}

pub fn encode_params(p: &Parameters, w: &mut ByteWriter) {
    w.u16(p.params.len() as u16);
    for param in &p.params {
        w.sym(param.name);
        encode_opt_type(&param.ty, w);
        match &param.kind {
            ParamKind::Required => w.u8(PK_REQUIRED),
            ParamKind::Defaulted(e) => {
                w.u8(PK_DEFAULTED);
                encode_expr(e, w);
            }
            ParamKind::Variadic => w.u8(PK_VARIADIC),
        }
    }
    encode_opt_type(&p.return_ty, w);
}

pub fn decode_params(r: &mut ByteReader) -> Result<Parameters, BinError> {
    let n = r.u16()? as usize;
    let mut params = Vec::with_capacity(n);
    for _ in 0..n {
        let name = r.sym()?;
        let ty = decode_opt_type(r)?;
        let kind = match r.u8()? {
            PK_REQUIRED => ParamKind::Required,
            PK_DEFAULTED => ParamKind::Defaulted(decode_expr(r)?),
            PK_VARIADIC => ParamKind::Variadic,
            t => return Err(BinError::BadTag(t)),
        };
        params.push(Param { name, ty, kind });
    }
    let return_ty = decode_opt_type(r)?;
    Ok(Parameters {
        params: params.into_boxed_slice(),
        return_ty,
    })
}

fn encode_opt_type(ty: &Option<TypeSpec>, w: &mut ByteWriter) {
    match ty {
        Some(t) => {
            w.bool(true);
            encode_type(t, w);
        }
        None => w.bool(false),
    }
}

fn decode_opt_type(r: &mut ByteReader) -> Result<Option<TypeSpec>, BinError> {
    if r.bool()? {
        Ok(Some(decode_type(r)?))
    } else {
        Ok(None)
    }
}

pub fn encode_type(ty: &TypeSpec, w: &mut ByteWriter) {
    match ty {
        TypeSpec::Named(s) => {
            w.u8(TY_NAMED);
            w.sym(*s);
        }
        TypeSpec::Typed(t) => {
            w.u8(TY_TYPED);
            w.sym(t.name);
            w.u16(t.params.len() as u16);
            for p in &t.params {
                encode_type(p, w);
            }
        }
        TypeSpec::Invokable(sig) => {
            w.u8(TY_INVOKABLE);
            w.bool(sig.is_coroutine);
            w.u16(sig.params.len() as u16);
            for p in &sig.params {
                encode_type(p, w);
            }
            encode_opt_type(&sig.return_ty, w);
        }
    }
}

pub fn decode_type(r: &mut ByteReader) -> Result<TypeSpec, BinError> {
    match r.u8()? {
        TY_NAMED => Ok(TypeSpec::Named(r.sym()?)),
        TY_TYPED => {
            let name = r.sym()?;
            let n = r.u16()? as usize;
            let mut params = Vec::with_capacity(n);
            for _ in 0..n {
                params.push(decode_type(r)?);
            }
            Ok(TypeSpec::Typed(Box::new(TypedSpec {
                name,
                params: params.into_boxed_slice(),
            })))
        }
        TY_INVOKABLE => {
            let is_coroutine = r.bool()?;
            let n = r.u16()? as usize;
            let mut params = Vec::with_capacity(n);
            for _ in 0..n {
                params.push(decode_type(r)?);
            }
            let return_ty = decode_opt_type(r)?;
            Ok(TypeSpec::Invokable(Box::new(InvokableSig {
                is_coroutine,
                params: params.into_boxed_slice(),
                return_ty,
            })))
        }
        t => Err(BinError::BadTag(t)),
    }
}

pub fn encode_code(code: &Code, w: &mut ByteWriter) {
    w.u32(code.len() as u32);
    for stmt in code {
        encode_stmt(stmt, w);
    }
}

pub fn decode_code(r: &mut ByteReader) -> Result<Code, BinError> {
    let n = r.u32()? as usize;
    let mut stmts = Vec::with_capacity(n.min(1024));
    for _ in 0..n {
        stmts.push(decode_stmt(r)?);
    }
    Ok(stmts.into_boxed_slice())
}

fn encode_stmt(stmt: &Stmt, w: &mut ByteWriter) {
    match stmt {
        Stmt::Expr(e) => {
            w.u8(ST_EXPR);
            encode_expr(e, w);
        }
        Stmt::VarDecl(v) => {
            w.u8(ST_VAR);
            w.sym(v.name);
            w.bool(v.shared);
            encode_opt_type(&v.ty, w);
            w.u16(v.slot);
            encode_expr(&v.value, w);
        }
        Stmt::Assign(a) => {
            w.u8(ST_ASSIGN);
            encode_place(&a.target, w);
            encode_expr(&a.value, w);
        }
        Stmt::If(i) => {
            w.u8(ST_IF);
            w.u16(i.branches.len() as u16);
            for (cond, code) in &i.branches {
                encode_expr(cond, w);
                encode_code(code, w);
            }
            match &i.else_code {
                Some(code) => {
                    w.bool(true);
                    encode_code(code, w);
                }
                None => w.bool(false),
            }
        }
        Stmt::While(wh) => {
            w.u8(ST_WHILE);
            encode_expr(&wh.cond, w);
            encode_code(&wh.body, w);
        }
        Stmt::Branch(c) => {
            w.u8(ST_BRANCH);
            encode_closure(c, w);
        }
        Stmt::Return(e) => {
            w.u8(ST_RETURN);
            match e {
                Some(e) => {
                    w.bool(true);
                    encode_expr(e, w);
                }
                None => w.bool(false),
            }
        }
        Stmt::Break => w.u8(ST_BREAK),
        Stmt::Continue => w.u8(ST_CONTINUE),
        Stmt::Error(span) => {
            w.u8(ST_ERROR);
            w.span(*span);
        }
    }
}

fn decode_stmt(r: &mut ByteReader) -> Result<Stmt, BinError> {
    match r.u8()? {
        ST_EXPR => Ok(Stmt::Expr(decode_expr(r)?)),
        ST_VAR => {
            let name = r.sym()?;
            let shared = r.bool()?;
            let ty = decode_opt_type(r)?;
            let slot = r.u16()?;
            let value = decode_expr(r)?;
            Ok(Stmt::VarDecl(Box::new(VarDecl {
                name,
                shared,
                ty,
                slot,
                value,
            })))
        }
        ST_ASSIGN => {
            let target = decode_place(r)?;
            let value = decode_expr(r)?;
            Ok(Stmt::Assign(Box::new(AssignStmt { target, value })))
        }
        ST_IF => {
            let n = r.u16()? as usize;
            let mut branches = Vec::with_capacity(n);
            for _ in 0..n {
                let cond = decode_expr(r)?;
                let code = decode_code(r)?;
                branches.push((cond, code));
            }
            let else_code = if r.bool()? { Some(decode_code(r)?) } else { None };
            Ok(Stmt::If(Box::new(IfStmt {
                branches: branches.into_boxed_slice(),
                else_code,
            })))
        }
        ST_WHILE => {
            let cond = decode_expr(r)?;
            let body = decode_code(r)?;
            Ok(Stmt::While(Box::new(WhileStmt { cond, body })))
        }
        ST_BRANCH => Ok(Stmt::Branch(Box::new(decode_closure(r)?))),
        ST_RETURN => {
            if r.bool()? {
                Ok(Stmt::Return(Some(decode_expr(r)?)))
            } else {
                Ok(Stmt::Return(None))
            }
        }
        ST_BREAK => Ok(Stmt::Break),
        ST_CONTINUE => Ok(Stmt::Continue),
        ST_ERROR => Ok(Stmt::Error(r.span()?)),
        t => Err(BinError::BadTag(t)),
    }
}

fn encode_closure(c: &ClosureLit, w: &mut ByteWriter) {
    w.bool(c.is_coroutine);
    encode_params(&c.params, w);
    encode_code(&c.body, w);
    w.u16(c.captures.len() as u16);
    for cap in &c.captures {
        w.sym(cap.name);
        w.u16(cap.outer_slot);
        w.u16(cap.inner_slot);
        w.bool(cap.shared);
    }
    w.u16(c.locals_count);
}

fn decode_closure(r: &mut ByteReader) -> Result<ClosureLit, BinError> {
    let is_coroutine = r.bool()?;
    let params = decode_params(r)?;
    let body = decode_code(r)?;
    let n = r.u16()? as usize;
    let mut captures = Vec::with_capacity(n);
    for _ in 0..n {
        let name = r.sym()?;
        let outer_slot = r.u16()?;
        let inner_slot = r.u16()?;
        let shared = r.bool()?;
        captures.push(Capture {
            name,
            outer_slot,
            inner_slot,
            shared,
        });
    }
    let locals_count = r.u16()?;
    Ok(ClosureLit {
        is_coroutine,
        params,
        body,
        captures: captures.into_boxed_slice(),
        locals_count,
    })
}

fn encode_place(place: &Place, w: &mut ByteWriter) {
    match place {
        Place::Local { name, slot, shared } => {
            w.u8(PL_LOCAL);
            w.sym(*name);
            w.u16(*slot);
            w.bool(*shared);
        }
        Place::MemberData { name, index } => {
            w.u8(PL_MEMBER);
            w.sym(*name);
            w.u16(*index);
        }
        Place::ClassData { class, name } => {
            w.u8(PL_CLASSDATA);
            w.sym(*class);
            w.sym(*name);
        }
    }
}

fn decode_place(r: &mut ByteReader) -> Result<Place, BinError> {
    match r.u8()? {
        PL_LOCAL => {
            let name = r.sym()?;
            let slot = r.u16()?;
            let shared = r.bool()?;
            Ok(Place::Local { name, slot, shared })
        }
        PL_MEMBER => {
            let name = r.sym()?;
            let index = r.u16()?;
            Ok(Place::MemberData { name, index })
        }
        PL_CLASSDATA => {
            let class = r.sym()?;
            let name = r.sym()?;
            Ok(Place::ClassData { class, name })
        }
        t => Err(BinError::BadTag(t)),
    }
}

pub fn encode_expr(expr: &Expr, w: &mut ByteWriter) {
    match expr {
        Expr::Nil => w.u8(EX_NIL),
        Expr::Bool(b) => {
            w.u8(EX_BOOL);
            w.bool(*b);
        }
        Expr::Int(v) => {
            w.u8(EX_INT);
            w.i64(*v);
        }
        Expr::Real(v) => {
            w.u8(EX_REAL);
            w.f32(*v);
        }
        Expr::Str(s) => {
            w.u8(EX_STR);
            w.str(s);
        }
        Expr::Sym(s) => {
            w.u8(EX_SYM);
            w.sym(*s);
        }
        Expr::List(items) => {
            w.u8(EX_LIST);
            w.u32(items.len() as u32);
            for item in items {
                encode_expr(item, w);
            }
        }
        Expr::This => w.u8(EX_THIS),
        Expr::Local { name, slot, shared } => {
            w.u8(EX_LOCAL);
            w.sym(*name);
            w.u16(*slot);
            w.bool(*shared);
        }
        Expr::MemberData { name, index } => {
            w.u8(EX_MEMBER);
            w.sym(*name);
            w.u16(*index);
        }
        Expr::ClassData { class, name } => {
            w.u8(EX_CLASSDATA);
            w.sym(*class);
            w.sym(*name);
        }
        Expr::Global(s) => {
            w.u8(EX_GLOBAL);
            w.sym(*s);
        }
        Expr::ObjectId { name, span } => {
            w.u8(EX_OBJID);
            w.sym(*name);
            w.span(*span);
        }
        Expr::Closure(c) => {
            w.u8(EX_CLOSURE);
            encode_closure(c, w);
        }
        Expr::Call(c) => {
            w.u8(EX_CALL);
            encode_opt_expr(&c.receiver, w);
            w.sym(c.method);
            w.u32(c.args.len() as u32);
            for a in &c.args {
                encode_expr(a, w);
            }
            w.span(c.span);
        }
        Expr::CoroCall(c) => {
            w.u8(EX_COROCALL);
            encode_opt_expr(&c.receiver, w);
            w.sym(c.coroutine);
            w.u32(c.args.len() as u32);
            for a in &c.args {
                encode_expr(a, w);
            }
            w.span(c.span);
        }
        Expr::Unary(u) => {
            w.u8(EX_UNARY);
            w.u8(match u.op {
                UnaryOp::Neg => 0,
                UnaryOp::Not => 1,
            });
            encode_expr(&u.expr, w);
        }
        Expr::Binary(b) => {
            w.u8(EX_BINARY);
            w.u8(binary_op_tag(b.op));
            encode_expr(&b.left, w);
            encode_expr(&b.right, w);
        }
        Expr::Error(span) => {
            w.u8(EX_ERROR);
            w.span(*span);
        }
    }
}

fn encode_opt_expr(e: &Option<Expr>, w: &mut ByteWriter) {
    match e {
        Some(e) => {
            w.bool(true);
            encode_expr(e, w);
        }
        None => w.bool(false),
    }
}

fn decode_opt_expr(r: &mut ByteReader) -> Result<Option<Expr>, BinError> {
    if r.bool()? {
        Ok(Some(decode_expr(r)?))
    } else {
        Ok(None)
    }
}

fn binary_op_tag(op: BinaryOp) -> u8 {
    match op {
        BinaryOp::Add => 0,
        BinaryOp::Sub => 1,
        BinaryOp::Mul => 2,
        BinaryOp::Div => 3,
        BinaryOp::Mod => 4,
        BinaryOp::Gt => 5,
        BinaryOp::Lt => 6,
        BinaryOp::Ge => 7,
        BinaryOp::Le => 8,
        BinaryOp::Eq => 9,
        BinaryOp::Ne => 10,
        BinaryOp::And => 11,
        BinaryOp::Or => 12,
    }
}

fn binary_op_from_tag(tag: u8) -> Result<BinaryOp, BinError> {
    Ok(match tag {
        0 => BinaryOp::Add,
        1 => BinaryOp::Sub,
        2 => BinaryOp::Mul,
        3 => BinaryOp::Div,
        4 => BinaryOp::Mod,
        5 => BinaryOp::Gt,
        6 => BinaryOp::Lt,
        7 => BinaryOp::Ge,
        8 => BinaryOp::Le,
        9 => BinaryOp::Eq,
        10 => BinaryOp::Ne,
        11 => BinaryOp::And,
        12 => BinaryOp::Or,
        t => return Err(BinError::BadTag(t)),
    })
}

pub fn decode_expr(r: &mut ByteReader) -> Result<Expr, BinError> {
    match r.u8()? {
        EX_NIL => Ok(Expr::Nil),
        EX_BOOL => Ok(Expr::Bool(r.bool()?)),
        EX_INT => Ok(Expr::Int(r.i64()?)),
        EX_REAL => Ok(Expr::Real(r.f32()?)),
        EX_STR => Ok(Expr::Str(r.str()?.into_boxed_str())),
        EX_SYM => Ok(Expr::Sym(r.sym()?)),
        EX_LIST => {
            let n = r.u32()? as usize;
            let mut items = Vec::with_capacity(n.min(1024));
            for _ in 0..n {
                items.push(decode_expr(r)?);
            }
            Ok(Expr::List(items.into_boxed_slice()))
        }
        EX_THIS => Ok(Expr::This),
        EX_LOCAL => {
            let name = r.sym()?;
            let slot = r.u16()?;
            let shared = r.bool()?;
            Ok(Expr::Local { name, slot, shared })
        }
        EX_MEMBER => {
            let name = r.sym()?;
            let index = r.u16()?;
            Ok(Expr::MemberData { name, index })
        }
        EX_CLASSDATA => {
            let class = r.sym()?;
            let name = r.sym()?;
            Ok(Expr::ClassData { class, name })
        }
        EX_GLOBAL => Ok(Expr::Global(r.sym()?)),
        EX_OBJID => {
            let name = r.sym()?;
            let span = r.span()?;
            Ok(Expr::ObjectId { name, span })
        }
        EX_CLOSURE => Ok(Expr::Closure(Box::new(decode_closure(r)?))),
        EX_CALL => {
            let receiver = decode_opt_expr(r)?;
            let method = r.sym()?;
            let n = r.u32()? as usize;
            let mut args = Vec::with_capacity(n.min(256));
            for _ in 0..n {
                args.push(decode_expr(r)?);
            }
            let span = r.span()?;
            Ok(Expr::Call(Box::new(CallExpr {
                receiver,
                method,
                args: args.into_boxed_slice(),
                span,
            })))
        }
        EX_COROCALL => {
            let receiver = decode_opt_expr(r)?;
            let coroutine = r.sym()?;
            let n = r.u32()? as usize;
            let mut args = Vec::with_capacity(n.min(256));
            for _ in 0..n {
                args.push(decode_expr(r)?);
            }
            let span = r.span()?;
            Ok(Expr::CoroCall(Box::new(CoroCallExpr {
                receiver,
                coroutine,
                args: args.into_boxed_slice(),
                span,
            })))
        }
        EX_UNARY => {
            let op = match r.u8()? {
                0 => UnaryOp::Neg,
                1 => UnaryOp::Not,
                t => return Err(BinError::BadTag(t)),
            };
            let expr = decode_expr(r)?;
            Ok(Expr::Unary(Box::new(UnaryExpr { op, expr })))
        }
        EX_BINARY => {
            let op = binary_op_from_tag(r.u8()?)?;
            let left = decode_expr(r)?;
            let right = decode_expr(r)?;
            Ok(Expr::Binary(Box::new(BinaryExpr { op, left, right })))
        }
        EX_ERROR => Ok(Expr::Error(r.span()?)),
        t => Err(BinError::BadTag(t)),
    }
}
