//!
//!
use anima_syntax::{Span, Symbol};

use crate::{Parameters, TypeSpec};

/// A block of statements. Coroutine resume cursors index into these blocks,
/// so statement order is the resume granularity.
pub type Code = Box<[Stmt]>;

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    VarDecl(Box<VarDecl>),
    Assign(Box<AssignStmt>),
    If(Box<IfStmt>),
    While(Box<WhileStmt>),
    /// Spawn the block as a detached coroutine on the current updater mind.
    /// The block is closure-shaped: it captures like a `coro` literal.
    Branch(Box<ClosureLit>),
    Return(Option<Expr>),
    Break,
    Continue,
    Error(Span),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VarDecl {
    pub name: Symbol,
    /// Durational local: lives in a shared cell and closures capture it by
    /// reference instead of by value.
    pub shared: bool,
    pub ty: Option<TypeSpec>,
    /// Frame slot, assigned at bind time.
    pub slot: u16,
    pub value: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AssignStmt {
    pub target: Place,
    pub value: Expr,
}

/// A bindable storage location. All indices are resolved at bind time;
/// evaluation never looks a slot up by name.
#[derive(Clone, Debug, PartialEq)]
pub enum Place {
    Local {
        name: Symbol,
        slot: u16,
        shared: bool,
    },
    /// Instance-data slot of the receiver, by compiled index.
    MemberData {
        name: Symbol,
        index: u16,
    },
    /// Class-data slot, held by the registry.
    ClassData {
        class: Symbol,
        name: Symbol,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct IfStmt {
    pub branches: Box<[(Expr, Code)]>,
    pub else_code: Option<Code>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct WhileStmt {
    pub cond: Expr,
    pub body: Code,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Nil,
    Bool(bool),
    Int(i64),
    Real(f32),
    Str(Box<str>),
    Sym(Symbol),
    List(Box<[Expr]>),
    This,
    /// Local or parameter read by frame slot.
    Local {
        name: Symbol,
        slot: u16,
        shared: bool,
    },
    /// Instance-data read by compiled index.
    MemberData {
        name: Symbol,
        index: u16,
    },
    ClassData {
        class: Symbol,
        name: Symbol,
    },
    /// Registry-bound named global (class references, host-registered
    /// instances).
    Global(Symbol),
    /// Object-id literal; resolved to a named actor lazily at evaluation.
    ObjectId {
        name: Symbol,
        span: Span,
    },
    Closure(Box<ClosureLit>),
    Call(Box<CallExpr>),
    /// Awaited coroutine invocation. The binder restricts placement to
    /// expression statements and assignment sources.
    CoroCall(Box<CoroCallExpr>),
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Error(Span),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CallExpr {
    /// `None` dispatches on the current receiver.
    pub receiver: Option<Expr>,
    pub method: Symbol,
    pub args: Box<[Expr]>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CoroCallExpr {
    pub receiver: Option<Expr>,
    pub coroutine: Symbol,
    pub args: Box<[Expr]>,
    pub span: Span,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Expr,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub left: Expr,
    pub right: Expr,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
    And,
    Or,
}

/// Inline closure literal. Captures are copied out of the enclosing frame at
/// closure-creation time; `shared` captures reference the enclosing cell
/// instead.
#[derive(Clone, Debug, PartialEq)]
pub struct ClosureLit {
    pub is_coroutine: bool,
    pub params: Parameters,
    pub body: Code,
    pub captures: Box<[Capture]>,
    /// Frame size (params + captures + locals) of the closure body.
    pub locals_count: u16,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    pub name: Symbol,
    /// Slot in the enclosing frame the value is taken from.
    pub outer_slot: u16,
    /// Slot in the closure frame the value lands in.
    pub inner_slot: u16,
    pub shared: bool,
}

impl Expr {
    pub fn is_coroutine_call(&self) -> bool {
        matches!(self, Expr::CoroCall(_))
    }
}
