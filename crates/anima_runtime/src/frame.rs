//! Invocation frames.
//!
//! A frame is a pooled record: local scope (owning references for parameters
//! and locals), a back-reference to the invoking frame and, for coroutines, a
//! resumable cursor into the body tree plus a wake condition. Cursors are
//! statement paths, never raw stack addresses, so suspended frames stay
//! relocation-safe and inspectable over the remote protocol.
use anima_ir::MemberDef;
use anima_syntax::Symbol;
use smallvec::SmallVec;
use std::rc::Rc;

use crate::class::ClassId;
use crate::instance::{InstanceId, NIL};
use crate::invokable::NativeCoroutine;
use crate::mind::MindId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameId(pub u32);

/// InvokedCoroutine lifecycle:
/// Created → Running → {Suspended ⇄ Running} → {Completed | Terminated}.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoroStatus {
    Created,
    Running,
    Suspended,
    Completed,
    Terminated,
}

/// Wake condition of a suspended coroutine.
#[derive(Clone, Debug, PartialEq)]
pub enum Wake {
    None,
    /// Due when the mind's elapsed time reaches the threshold (>=).
    Time(f64),
    /// Due when the named signal is raised on the mind.
    Signal(Symbol),
    /// Due when the awaited child coroutine completes.
    Child(FrameId),
}

/// Where an awaited child's result lands on resumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PendingDst {
    Local(u16),
    /// Instance-data slot of the frame's receiver.
    Member(u16),
    /// Class-data slot: owning class, member name.
    ClassData(Symbol, Symbol),
    Discard,
}

#[derive(Debug)]
pub struct CoroState {
    pub mind: MindId,
    pub status: CoroStatus,
    pub wake: Wake,
    /// Statement path into the body block tree; see the evaluator for the
    /// level protocol (`If` consumes two levels, `While` one).
    pub cursor: SmallVec<[u32; 8]>,
    /// Saved partial-evaluation state for an in-progress awaited call.
    pub pending_dst: Option<PendingDst>,
    pub update_count: u32,
    /// Mind-local enqueue sequence; FIFO tiebreak for equal due times.
    pub due_seq: u64,
    /// Due time snapshot used for deterministic resume ordering.
    pub due_time: f64,
    /// Set while re-entering the body to consume the saved cursor.
    pub resuming: bool,
}

impl CoroState {
    pub fn new(mind: MindId) -> Self {
        Self {
            mind,
            status: CoroStatus::Created,
            wake: Wake::None,
            cursor: SmallVec::new(),
            pending_dst: None,
            update_count: 0,
            due_seq: 0,
            due_time: 0.0,
            resuming: false,
        }
    }
}

pub enum FrameBody {
    Code(Rc<MemberDef>),
    /// Closure body (inline literal), including `branch` blocks.
    ClosureCode(Rc<anima_ir::ClosureLit>),
    NativeCoroutine(NativeCoroutine),
    /// Native methods execute without a body record.
    None,
}

pub enum FrameKind {
    Method,
    Coroutine(Box<CoroState>),
}

pub struct Frame {
    pub caller: Option<FrameId>,
    /// Owning reference.
    pub receiver: InstanceId,
    /// Owning references; parameters first, then locals, by compiled slot.
    pub locals: SmallVec<[InstanceId; 8]>,
    pub member: Symbol,
    pub owner_class: Option<ClassId>,
    pub body: FrameBody,
    pub kind: FrameKind,
}

impl Frame {
    pub fn coro(&self) -> Option<&CoroState> {
        match &self.kind {
            FrameKind::Coroutine(c) => Some(c),
            FrameKind::Method => None,
        }
    }

    pub fn coro_mut(&mut self) -> Option<&mut CoroState> {
        match &mut self.kind {
            FrameKind::Coroutine(c) => Some(c),
            FrameKind::Method => None,
        }
    }

    pub fn local(&self, slot: u16) -> InstanceId {
        self.locals.get(slot as usize).copied().unwrap_or(NIL)
    }
}

/// Pooled frame storage with an O(1) free list.
pub struct FramePool {
    slots: Vec<Option<Frame>>,
    free: Vec<u32>,
}

impl FramePool {
    pub fn new() -> Self {
        Self {
            slots: Vec::with_capacity(64),
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, frame: Frame) -> FrameId {
        if let Some(idx) = self.free.pop() {
            self.slots[idx as usize] = Some(frame);
            FrameId(idx)
        } else {
            let idx = self.slots.len() as u32;
            self.slots.push(Some(frame));
            FrameId(idx)
        }
    }

    pub fn get(&self, id: FrameId) -> Option<&Frame> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn is_live(&self, id: FrameId) -> bool {
        self.get(id).is_some()
    }

    /// Remove and return the frame; the engine releases its references.
    pub fn free(&mut self, id: FrameId) -> Option<Frame> {
        let frame = self.slots.get_mut(id.0 as usize).and_then(|s| s.take());
        if frame.is_some() {
            self.free.push(id.0);
        }
        frame
    }

    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn iter_live(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| FrameId(i as u32))
    }
}

impl Default for FramePool {
    fn default() -> Self {
        Self::new()
    }
}
