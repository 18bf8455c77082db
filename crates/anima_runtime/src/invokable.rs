//! Invokable definitions: methods, coroutines, closures and native bindings.
use anima_ir::{MemberDef, MemberKind, Parameters};
use anima_syntax::Symbol;
use std::rc::Rc;

use crate::class::ClassId;
use crate::engine::Engine;
use crate::errors::RuntimeError;
use crate::frame::FrameId;
use crate::instance::InstanceId;

/// A native method runs to completion within the invocation step.
pub type NativeMethod = fn(&mut Engine, FrameId) -> Result<InstanceId, RuntimeError>;

/// Outcome of one native-coroutine step.
pub enum CoroNative {
    Complete(InstanceId),
    /// The native set the frame's wake condition before suspending.
    Suspend,
}

/// A native coroutine is re-entered on every wake; `update_count` on the
/// frame distinguishes the first run from resumptions.
pub type NativeCoroutine = fn(&mut Engine, FrameId) -> Result<CoroNative, RuntimeError>;

#[derive(Clone)]
pub enum InvokableBody {
    /// Compiled expression tree. Frames snapshot the Rc at invoke time, so a
    /// hot patch affects subsequent dispatches only.
    Code(Rc<MemberDef>),
    Native(NativeMethod),
    NativeCoroutine(NativeCoroutine),
}

pub enum MemberTable {
    Methods,
    Coroutines,
    ClassMethods,
}

#[derive(Clone)]
pub struct Invokable {
    pub name: Symbol,
    /// Owning class; `None` for standalone invokables (closure bodies).
    pub owner: Option<ClassId>,
    pub kind: MemberKind,
    pub params: Rc<Parameters>,
    pub body: InvokableBody,
    pub locals_count: u16,
}

impl Invokable {
    pub fn from_member(def: MemberDef, owner: Option<ClassId>) -> Self {
        let locals_count = def.locals_count;
        Self {
            name: def.name,
            owner,
            kind: def.kind,
            params: Rc::new(def.params.clone()),
            body: InvokableBody::Code(Rc::new(def)),
            locals_count,
        }
    }

    pub fn native_method(name: Symbol, owner: Option<ClassId>, params: Parameters, f: NativeMethod) -> Self {
        let locals_count = params.len() as u16;
        Self {
            name,
            owner,
            kind: MemberKind::Method,
            params: Rc::new(params),
            body: InvokableBody::Native(f),
            locals_count,
        }
    }

    pub fn native_class_method(
        name: Symbol,
        owner: Option<ClassId>,
        params: Parameters,
        f: NativeMethod,
    ) -> Self {
        let locals_count = params.len() as u16;
        Self {
            name,
            owner,
            kind: MemberKind::ClassMethod,
            params: Rc::new(params),
            body: InvokableBody::Native(f),
            locals_count,
        }
    }

    pub fn native_coroutine(
        name: Symbol,
        owner: Option<ClassId>,
        params: Parameters,
        f: NativeCoroutine,
    ) -> Self {
        let locals_count = params.len() as u16;
        Self {
            name,
            owner,
            kind: MemberKind::Coroutine,
            params: Rc::new(params),
            body: InvokableBody::NativeCoroutine(f),
            locals_count,
        }
    }

    pub fn is_coroutine(&self) -> bool {
        matches!(self.kind, MemberKind::Coroutine)
    }

    /// Which class table this invokable lives in.
    pub fn table(&self) -> MemberTable {
        match self.kind {
            MemberKind::Method => MemberTable::Methods,
            MemberKind::Coroutine => MemberTable::Coroutines,
            MemberKind::ClassMethod => MemberTable::ClassMethods,
        }
    }
}
