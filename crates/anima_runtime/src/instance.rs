//! Runtime instances.
//!
//! Every script value is an `InstanceId` into the engine's pool. An instance
//! carries its dynamic class, an explicit reference count and its payload.
//! Counts are maintained by the evaluator: one owning reference per live slot
//! (frame local, data slot, list element, capture, queue entry).
use anima_syntax::Symbol;
use std::rc::Rc;

use crate::class::ClassId;
use crate::mind::MindId;

/// Handle to a pooled instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct InstanceId(pub u32);

/// The shared nil instance; pinned, never collected.
pub const NIL: InstanceId = InstanceId(0);

#[derive(Debug)]
pub struct Instance {
    pub class: ClassId,
    pub refs: u32,
    pub data: InstanceData,
}

#[derive(Debug)]
pub enum InstanceData {
    None,
    Boolean(bool),
    Integer(i64),
    Real(f32),
    Str(Box<str>),
    Sym(Symbol),
    List(Vec<InstanceId>),
    /// Flat instance-data slots, addressed by compiled index.
    Slots(Box<[InstanceId]>),
    /// Actor: slots plus a stable identity and an owned mind.
    Actor {
        slots: Box<[InstanceId]>,
        name: Symbol,
        mind: MindId,
    },
    /// A class reference (`Dog` used as a value).
    ClassRef(ClassId),
    Closure(Box<ClosureData>),
    /// Cell for a `shared` (durational) local; closures reference the cell.
    Shared(InstanceId),
}

#[derive(Debug)]
pub struct ClosureData {
    pub lit: Rc<anima_ir::ClosureLit>,
    /// Receiver the closure was created on. Owning reference.
    pub receiver: InstanceId,
    /// Captured values (or shared cells), indexed like the literal's capture
    /// list. Owning references.
    pub captured: Box<[InstanceId]>,
}

impl InstanceData {
    /// Payload footprint in words; the pool's size-class key.
    pub fn footprint(&self) -> usize {
        match self {
            InstanceData::None
            | InstanceData::Boolean(_)
            | InstanceData::Integer(_)
            | InstanceData::Real(_)
            | InstanceData::Sym(_)
            | InstanceData::ClassRef(_)
            | InstanceData::Shared(_) => 1,
            InstanceData::Str(s) => 1 + s.len().div_ceil(8),
            InstanceData::List(v) => 1 + v.len(),
            InstanceData::Slots(s) => 1 + s.len(),
            InstanceData::Actor { slots, .. } => 3 + slots.len(),
            InstanceData::Closure(c) => 2 + c.captured.len(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            InstanceData::None => "None",
            InstanceData::Boolean(_) => "Boolean",
            InstanceData::Integer(_) => "Integer",
            InstanceData::Real(_) => "Real",
            InstanceData::Str(_) => "String",
            InstanceData::Sym(_) => "Symbol",
            InstanceData::List(_) => "List",
            InstanceData::Slots(_) => "DataInstance",
            InstanceData::Actor { .. } => "Actor",
            InstanceData::ClassRef(_) => "Class",
            InstanceData::Closure(_) => "Closure",
            InstanceData::Shared(_) => "Shared",
        }
    }
}
