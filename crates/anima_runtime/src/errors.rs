//! Runtime error taxonomy and common message constants.
use anima_syntax::{Span, Symbol};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    NilReceiver,
    UnknownMember,
    UnknownClass,
    UnknownGlobal,
    UnknownActor,
    ArgumentCount,
    ArgumentType,
    DivisionByZero,
    IndexOutOfRange,
    NotABoolean,
    NotANumber,
    NotAClosure,
    CoroutineContext,
    FrameGone,
    Custom,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
    /// Member the error surfaced in, when known.
    pub member: Option<Symbol>,
    pub span: Option<Span>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            member: None,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_member(mut self, member: Symbol) -> Self {
        self.member = Some(member);
        self
    }

    pub fn nil_receiver(member: Symbol) -> Self {
        Self::new(
            RuntimeErrorKind::NilReceiver,
            format!("{}: {}", messages::NIL_RECEIVER, member),
        )
    }

    pub fn unknown_member(class: Symbol, member: Symbol) -> Self {
        Self::new(
            RuntimeErrorKind::UnknownMember,
            format!("{} has no member {}", class, member),
        )
    }

    pub fn argument_count(member: Symbol, got: usize) -> Self {
        Self::new(
            RuntimeErrorKind::ArgumentCount,
            format!("{}: {} ({} given)", messages::BAD_ARG_COUNT, member, got),
        )
    }
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.member {
            Some(m) => write!(f, "{} (in {})", self.message, m),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for RuntimeError {}

pub mod messages {
    pub const NIL_RECEIVER: &str = "Cannot invoke on nil";
    pub const BAD_ARG_COUNT: &str = "Wrong number of arguments";
    pub const DIVISION_BY_ZERO: &str = "Division by zero";
    pub const INDEX_OUT_OF_RANGE: &str = "Index out of range";
    pub const NOT_A_BOOLEAN: &str = "Condition is not a Boolean";
    pub const NOT_A_NUMBER: &str = "Not a number";
    pub const NOT_A_CLOSURE: &str = "Not a closure";
}

/// Class registry errors (registration/hot-reload time, not evaluation time).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassError {
    /// Registering/reparenting would create a superclass cycle.
    CyclicSuperclass(Symbol),
    /// Instance-data layout change attempted while instances are live.
    LayoutLocked(Symbol),
    UnknownClass(Symbol),
    UnknownSuperclass(Symbol),
    DuplicateClass(Symbol),
    DuplicateData(Symbol),
}

impl std::fmt::Display for ClassError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassError::CyclicSuperclass(c) => {
                write!(f, "cyclic superclass chain through {}", c)
            }
            ClassError::LayoutLocked(c) => write!(
                f,
                "cannot change instance-data layout of {} while instances exist",
                c
            ),
            ClassError::UnknownClass(c) => write!(f, "unknown class {}", c),
            ClassError::UnknownSuperclass(c) => write!(f, "unknown superclass {}", c),
            ClassError::DuplicateClass(c) => write!(f, "class {} already registered", c),
            ClassError::DuplicateData(n) => write!(f, "data member {} already declared", n),
        }
    }
}

impl std::error::Error for ClassError {}
