//! Compiled member definitions.
//!
//! One member = one source file in the class tree: a parameter header followed
//! by a body block. The runtime binds these into class tables.
use anima_syntax::Symbol;

use crate::{Code, Parameters, TypeSpec};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Method,
    Coroutine,
    ClassMethod,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemberDef {
    pub name: Symbol,
    pub kind: MemberKind,
    pub params: Parameters,
    pub body: Code,
    /// Frame size: parameters first, then locals, in slot order.
    pub locals_count: u16,
}

/// A data-member declaration from a `!data.an` file.
#[derive(Clone, Debug, PartialEq)]
pub struct DataDef {
    pub name: Symbol,
    pub ty: Option<TypeSpec>,
    /// Class-data (static) rather than per-instance.
    pub is_class_data: bool,
}
