//! Minds: per-actor cooperative schedulers.
//!
//! A mind tracks the invoked coroutines it updates. Suspended frames sit in
//! the pending list; each `update` gathers the ones whose wake condition is
//! satisfied and resumes them in FIFO order of becoming due, which keeps
//! scripted timing reproducible for a fixed tick sequence. A child completing
//! mid-update appends its awaiting parent to the same pass's ready queue.
use anima_syntax::Symbol;
use std::collections::VecDeque;

use crate::frame::FrameId;
use crate::instance::InstanceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MindId(pub u32);

/// The engine's global mind.
pub const MASTER_MIND: MindId = MindId(0);

pub struct Mind {
    pub name: Symbol,
    /// Weak backref to the owning actor; the global mind has none. Never
    /// counted: the actor owns the mind, not the other way around.
    pub actor: Option<InstanceId>,
    /// Accumulated simulation time in seconds.
    pub elapsed: f64,
    /// Suspended coroutines tracked by this mind.
    pub pending: Vec<FrameId>,
    /// Frames to resume this pass, FIFO.
    pub ready: VecDeque<FrameId>,
    /// Monotonic enqueue counter; tiebreak for equal due times.
    pub seq: u64,
    /// Signals raised since the last update.
    pub raised: Vec<Symbol>,
}

impl Mind {
    pub fn new(name: Symbol, actor: Option<InstanceId>) -> Self {
        Self {
            name,
            actor,
            elapsed: 0.0,
            pending: Vec::new(),
            ready: VecDeque::new(),
            seq: 0,
            raised: Vec::new(),
        }
    }

    pub fn next_seq(&mut self) -> u64 {
        let s = self.seq;
        self.seq += 1;
        s
    }

    pub fn is_active(&self) -> bool {
        !self.pending.is_empty() || !self.ready.is_empty()
    }

    pub fn track_pending(&mut self, fid: FrameId) {
        if !self.pending.contains(&fid) {
            self.pending.push(fid);
        }
    }

    pub fn untrack(&mut self, fid: FrameId) {
        self.pending.retain(|f| *f != fid);
        self.ready.retain(|f| *f != fid);
    }
}

/// Mind storage. The global mind occupies id 0 and is never torn down before
/// the engine itself.
pub struct MindPool {
    slots: Vec<Option<Mind>>,
}

impl MindPool {
    pub fn new() -> Self {
        let mut pool = Self {
            slots: Vec::with_capacity(16),
        };
        pool.slots
            .push(Some(Mind::new(Symbol::intern("master_mind"), None)));
        pool
    }

    pub fn alloc(&mut self, mind: Mind) -> MindId {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(mind);
                return MindId(i as u32);
            }
        }
        let id = MindId(self.slots.len() as u32);
        self.slots.push(Some(mind));
        id
    }

    pub fn get(&self, id: MindId) -> Option<&Mind> {
        self.slots.get(id.0 as usize).and_then(|s| s.as_ref())
    }

    pub fn get_mut(&mut self, id: MindId) -> Option<&mut Mind> {
        self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut())
    }

    pub fn free(&mut self, id: MindId) -> Option<Mind> {
        if id == crate::mind::MASTER_MIND {
            return None;
        }
        self.slots.get_mut(id.0 as usize).and_then(|s| s.take())
    }

    pub fn ids(&self) -> Vec<MindId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| MindId(i as u32))
            .collect()
    }
}

impl Default for MindPool {
    fn default() -> Self {
        Self::new()
    }
}
