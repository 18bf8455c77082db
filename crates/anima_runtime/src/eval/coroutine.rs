//! Coroutine stepping, completion delivery and the per-mind update loop.
use std::cmp::Ordering;

use crate::engine::Engine;
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::eval::{Exec, StepOutcome};
use crate::frame::{CoroStatus, FrameBody, FrameId, PendingDst, Wake};
use crate::hooks::ErrorDecision;
use crate::instance::{InstanceId, NIL};
use crate::invokable::CoroNative;
use crate::mind::MindId;

impl Engine {
    /// Drive a coroutine frame one step: first run or resumption. The frame
    /// either suspends (tracked by its mind) or finishes, delivering its
    /// result to a live awaiting caller.
    pub(crate) fn coroutine_step(&mut self, fid: FrameId) -> Result<StepOutcome, RuntimeError> {
        enum Body {
            Code(std::rc::Rc<anima_ir::MemberDef>),
            Closure(std::rc::Rc<anima_ir::ClosureLit>),
            Native(crate::invokable::NativeCoroutine),
        }
        let (body, member) = {
            let Some(frame) = self.frames.get_mut(fid) else {
                return Err(RuntimeError::new(
                    RuntimeErrorKind::FrameGone,
                    "coroutine frame is gone",
                ));
            };
            let member = frame.member;
            let body = match &frame.body {
                FrameBody::Code(def) => Body::Code(def.clone()),
                FrameBody::ClosureCode(lit) => Body::Closure(lit.clone()),
                FrameBody::NativeCoroutine(f) => Body::Native(*f),
                FrameBody::None => {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::CoroutineContext,
                        "frame has no coroutine body",
                    ));
                }
            };
            let coro = frame.coro_mut().ok_or_else(|| {
                RuntimeError::new(RuntimeErrorKind::CoroutineContext, "not a coroutine frame")
            })?;
            coro.status = CoroStatus::Running;
            coro.resuming = !coro.cursor.is_empty();
            coro.wake = Wake::None;
            (body, member)
        };

        let flow = match body {
            Body::Native(f) => match f(self, fid) {
                Ok(CoroNative::Complete(v)) => Ok(Exec::Return(v)),
                Ok(CoroNative::Suspend) => Ok(Exec::Suspend),
                Err(e) => Err(e),
            },
            Body::Code(def) => self.exec_code(fid, &def.body, 0),
            Body::Closure(lit) => self.exec_code(fid, &lit.body, 0),
        };

        if let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) {
            coro.update_count += 1;
        }

        match flow {
            Ok(Exec::Done) => Ok(StepOutcome::Completed(self.finish_coroutine(fid, NIL))),
            Ok(Exec::Return(v)) => Ok(StepOutcome::Completed(self.finish_coroutine(fid, v))),
            Ok(Exec::Suspend) => {
                self.note_suspended(fid);
                Ok(StepOutcome::Suspended)
            }
            Ok(Exec::Break) | Ok(Exec::Continue) => Err(RuntimeError::new(
                RuntimeErrorKind::Custom,
                "break/continue outside loop",
            )
            .with_member(member)),
            Err(e) => Err(e.with_member(member)),
        }
    }

    /// Record the frame as suspended under its current wake condition and
    /// hand it to its mind, stamping the FIFO due key.
    fn note_suspended(&mut self, fid: FrameId) {
        let Some(frame) = self.frames.get_mut(fid) else {
            return;
        };
        let Some(coro) = frame.coro_mut() else {
            return;
        };
        coro.status = CoroStatus::Suspended;
        let mid = coro.mind;
        let wake_time = match coro.wake {
            Wake::Time(t) => Some(t),
            _ => None,
        };
        let Some(mind) = self.minds.get_mut(mid) else {
            return;
        };
        let seq = mind.next_seq();
        let due = wake_time.unwrap_or(mind.elapsed);
        mind.track_pending(fid);
        if let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) {
            coro.due_seq = seq;
            coro.due_time = due;
        }
    }

    /// Completion: free the frame and deliver the result. Returns the result
    /// when nobody consumed it (the caller of the step owns it then).
    #[must_use]
    pub(crate) fn finish_coroutine(
        &mut self,
        fid: FrameId,
        result: InstanceId,
    ) -> Option<InstanceId> {
        let Some(mut frame) = self.frames.free(fid) else {
            self.release(result);
            return None;
        };
        for local in std::mem::take(&mut frame.locals) {
            self.release(local);
        }
        self.release(frame.receiver);
        if let crate::frame::FrameKind::Coroutine(coro) = &mut frame.kind {
            // Completed is terminal: every held reference is gone.
            coro.status = CoroStatus::Completed;
            if let Some(mind) = self.minds.get_mut(coro.mind) {
                mind.untrack(fid);
            }
        }
        let Some(parent) = frame.caller else {
            return Some(result);
        };
        // Deliver to a live awaiting caller; wake it within this update pass.
        let awaiting = self
            .frames
            .get(parent)
            .and_then(|f| f.coro())
            .map(|c| c.wake == Wake::Child(fid))
            .unwrap_or(false);
        if !awaiting {
            return Some(result);
        }
        let (dst, parent_mind) = {
            let coro = self
                .frames
                .get_mut(parent)
                .and_then(|f| f.coro_mut())
                .expect("awaiting parent");
            coro.wake = Wake::None;
            (coro.pending_dst.take(), coro.mind)
        };
        match dst {
            Some(PendingDst::Discard) | None => self.release(result),
            Some(dst) => self.store_pending(parent, dst, result),
        }
        if let Some(mind) = self.minds.get_mut(parent_mind) {
            mind.untrack(parent);
            mind.ready.push_back(parent);
        }
        None
    }

    /// Terminate: sever the wake condition, release everything held, cascade
    /// into the awaited child, and wake a live awaiting caller with nil so
    /// nothing is left orphaned.
    pub(crate) fn abort_coroutine(&mut self, fid: FrameId) {
        let Some(mut frame) = self.frames.free(fid) else {
            return;
        };
        for local in std::mem::take(&mut frame.locals) {
            self.release(local);
        }
        self.release(frame.receiver);
        let mut awaited_child = None;
        if let crate::frame::FrameKind::Coroutine(coro) = &mut frame.kind {
            // Terminated is terminal: wake condition severed, references gone.
            coro.status = CoroStatus::Terminated;
            if let Wake::Child(c) = coro.wake {
                awaited_child = Some(c);
            }
            if let Some(mind) = self.minds.get_mut(coro.mind) {
                mind.untrack(fid);
            }
        }
        if let Some(child) = awaited_child {
            self.abort_coroutine(child);
        }
        if let Some(parent) = frame.caller {
            let awaiting = self
                .frames
                .get(parent)
                .and_then(|f| f.coro())
                .map(|c| c.wake == Wake::Child(fid))
                .unwrap_or(false);
            if awaiting {
                let (dst, parent_mind) = {
                    let coro = self
                        .frames
                        .get_mut(parent)
                        .and_then(|f| f.coro_mut())
                        .expect("awaiting parent");
                    coro.wake = Wake::None;
                    (coro.pending_dst.take(), coro.mind)
                };
                if let Some(dst) = dst {
                    self.store_pending(parent, dst, NIL);
                }
                if let Some(mind) = self.minds.get_mut(parent_mind) {
                    mind.untrack(parent);
                    mind.ready.push_back(parent);
                }
            }
        }
    }

    /// One scheduling pass for one mind: advance its clock, gather frames
    /// whose wake condition is satisfied, resume them in FIFO order of
    /// becoming due. Re-suspensions re-enqueue; completions deliver and may
    /// append awaiting parents to this same pass.
    pub(crate) fn mind_update(&mut self, mid: MindId, delta: f64) {
        let elapsed = {
            let Some(mind) = self.minds.get_mut(mid) else {
                return;
            };
            mind.elapsed += delta;
            mind.elapsed
        };
        let (raised, pending) = {
            let mind = self.minds.get_mut(mid).expect("mind");
            (
                std::mem::take(&mut mind.raised),
                std::mem::take(&mut mind.pending),
            )
        };
        let mut due: Vec<(f64, u64, FrameId)> = Vec::new();
        let mut keep: Vec<FrameId> = Vec::new();
        for fid in pending {
            let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) else {
                continue;
            };
            let wake_now = match &coro.wake {
                Wake::Time(t) => *t <= elapsed,
                Wake::Signal(s) => {
                    if raised.contains(s) {
                        coro.due_time = elapsed;
                        true
                    } else {
                        false
                    }
                }
                Wake::Child(_) | Wake::None => false,
            };
            if wake_now {
                due.push((coro.due_time, coro.due_seq, fid));
            } else {
                keep.push(fid);
            }
        }
        due.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        {
            let mind = self.minds.get_mut(mid).expect("mind");
            mind.pending = keep;
            for (_, _, fid) in due {
                mind.ready.push_back(fid);
            }
        }
        loop {
            if self.aborting {
                break;
            }
            // The mind can die mid-pass (a resumed coroutine may destroy the
            // owning actor).
            let Some(mind) = self.minds.get_mut(mid) else {
                break;
            };
            let Some(fid) = mind.ready.pop_front() else {
                break;
            };
            if !self.frames.is_live(fid) {
                continue;
            }
            match self.coroutine_step(fid) {
                Ok(StepOutcome::Completed(leftover)) => {
                    if let Some(v) = leftover {
                        self.release(v);
                    }
                }
                Ok(StepOutcome::Suspended) => {}
                // A frame that vanished mid-step destroyed its own actor;
                // that is a termination, not an error.
                Err(e) if e.kind == RuntimeErrorKind::FrameGone => {
                    self.abort_coroutine(fid);
                }
                Err(e) => {
                    let decision = self.report_error(e);
                    self.abort_coroutine(fid);
                    if decision == ErrorDecision::Abort {
                        break;
                    }
                }
            }
        }
    }
}
