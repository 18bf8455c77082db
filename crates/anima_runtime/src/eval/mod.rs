//! Tree-walking evaluator.
//!
//! Method evaluation is a depth-first synchronous walk. Coroutine bodies run
//! through the same walker but carry a resumable cursor: a statement path
//! into the nested block tree. The cursor protocol is one index per block
//! level, plus a branch ordinal level for `if`; the leaf entry is the wait
//! point itself, which is resumed *past* (its result was delivered when the
//! child completed or the wake condition fired).
mod coroutine;
mod expr;
mod invoke;
mod ops;

use anima_ir::{Expr, IfStmt, Stmt, WhileStmt};

use crate::engine::{DebugEvent, Engine};
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::frame::{FrameId, PendingDst};
use crate::instance::{InstanceData, InstanceId, NIL};

pub(crate) use invoke::AwaitOutcome;

/// Control signal from statement execution.
pub(crate) enum Exec {
    Done,
    Return(InstanceId),
    Suspend,
    Break,
    Continue,
}

/// Result of driving a coroutine frame one step.
pub(crate) enum StepOutcome {
    /// Finished; carries the result if it was not delivered to a live
    /// awaiting caller (the caller of the step owns the reference).
    Completed(Option<InstanceId>),
    Suspended,
}

enum ResumePoint {
    Fresh,
    /// Resume *past* this index: the wait point completed.
    Leaf(u32),
    /// Re-enter the (block-bearing) statement at this index.
    Into(u32),
}

impl Engine {
    pub(crate) fn exec_code(
        &mut self,
        fid: FrameId,
        code: &anima_ir::Code,
        cdepth: usize,
    ) -> Result<Exec, RuntimeError> {
        let mut i: usize;
        match self.resume_point(fid, cdepth) {
            ResumePoint::Fresh => i = 0,
            ResumePoint::Leaf(idx) => i = idx as usize + 1,
            ResumePoint::Into(idx) => {
                i = idx as usize;
                let Some(stmt) = code.get(i) else {
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::FrameGone,
                        "stale resume cursor",
                    ));
                };
                match self.exec_stmt(fid, stmt, cdepth, true)? {
                    Exec::Done => i += 1,
                    Exec::Suspend => {
                        self.cursor_push_front(fid, i as u32);
                        return Ok(Exec::Suspend);
                    }
                    other => return Ok(other),
                }
            }
        }
        while i < code.len() {
            if cdepth == 0 {
                self.check_breakpoint(fid, i as u32);
            }
            match self.exec_stmt(fid, &code[i], cdepth, false)? {
                Exec::Done => {}
                Exec::Suspend => {
                    self.cursor_push_front(fid, i as u32);
                    return Ok(Exec::Suspend);
                }
                other => return Ok(other),
            }
            i += 1;
        }
        Ok(Exec::Done)
    }

    fn exec_stmt(
        &mut self,
        fid: FrameId,
        stmt: &Stmt,
        cdepth: usize,
        resume: bool,
    ) -> Result<Exec, RuntimeError> {
        match stmt {
            Stmt::Expr(Expr::CoroCall(cc)) => {
                match self.eval_await(fid, cc, PendingDst::Discard)? {
                    AwaitOutcome::Done(v) => {
                        self.release(v);
                        Ok(Exec::Done)
                    }
                    AwaitOutcome::Suspended => {
                        self.begin_suspend(fid);
                        Ok(Exec::Suspend)
                    }
                }
            }
            Stmt::Expr(e) => {
                let v = self.eval_expr(fid, e)?;
                self.release(v);
                Ok(Exec::Done)
            }
            Stmt::VarDecl(v) => {
                if v.shared {
                    let cell = self.alloc(self.core.shared, InstanceData::Shared(NIL));
                    self.set_local_raw(fid, v.slot, cell);
                }
                match &v.value {
                    Expr::CoroCall(cc) => {
                        match self.eval_await(fid, cc, PendingDst::Local(v.slot))? {
                            AwaitOutcome::Done(val) => {
                                self.store_local(fid, v.slot, val);
                                Ok(Exec::Done)
                            }
                            AwaitOutcome::Suspended => {
                                self.begin_suspend(fid);
                                Ok(Exec::Suspend)
                            }
                        }
                    }
                    e => {
                        let val = self.eval_expr(fid, e)?;
                        self.store_local(fid, v.slot, val);
                        Ok(Exec::Done)
                    }
                }
            }
            Stmt::Assign(a) => {
                let dst = self.place_dst(&a.target);
                match &a.value {
                    Expr::CoroCall(cc) => match self.eval_await(fid, cc, dst)? {
                        AwaitOutcome::Done(val) => {
                            self.store_pending(fid, dst, val);
                            Ok(Exec::Done)
                        }
                        AwaitOutcome::Suspended => {
                            self.begin_suspend(fid);
                            Ok(Exec::Suspend)
                        }
                    },
                    e => {
                        let val = self.eval_expr(fid, e)?;
                        self.store_pending(fid, dst, val);
                        Ok(Exec::Done)
                    }
                }
            }
            Stmt::If(i) => self.exec_if(fid, i, cdepth, resume),
            Stmt::While(w) => self.exec_while(fid, w, cdepth, resume),
            Stmt::Branch(lit) => {
                self.spawn_branch(fid, lit)?;
                Ok(Exec::Done)
            }
            Stmt::Return(e) => {
                let v = match e {
                    Some(e) => self.eval_expr(fid, e)?,
                    None => NIL,
                };
                Ok(Exec::Return(v))
            }
            Stmt::Break => Ok(Exec::Break),
            Stmt::Continue => Ok(Exec::Continue),
            Stmt::Error(span) => Err(RuntimeError::new(
                RuntimeErrorKind::Custom,
                "statement failed to parse",
            )
            .with_span(*span)),
        }
    }

    fn exec_if(
        &mut self,
        fid: FrameId,
        stmt: &IfStmt,
        cdepth: usize,
        resume: bool,
    ) -> Result<Exec, RuntimeError> {
        if resume {
            let ord = self.cursor_value(fid, cdepth + 1) as usize;
            let code = if ord < stmt.branches.len() {
                &stmt.branches[ord].1
            } else {
                stmt.else_code.as_ref().ok_or_else(|| {
                    RuntimeError::new(RuntimeErrorKind::FrameGone, "stale resume cursor")
                })?
            };
            return match self.exec_code(fid, code, cdepth + 2)? {
                Exec::Suspend => {
                    self.cursor_push_front(fid, ord as u32);
                    Ok(Exec::Suspend)
                }
                other => Ok(other),
            };
        }
        for (ord, (cond, code)) in stmt.branches.iter().enumerate() {
            let c = self.eval_expr(fid, cond)?;
            if self.expect_boolean(c)? {
                return match self.exec_code(fid, code, cdepth + 2)? {
                    Exec::Suspend => {
                        self.cursor_push_front(fid, ord as u32);
                        Ok(Exec::Suspend)
                    }
                    other => Ok(other),
                };
            }
        }
        if let Some(code) = &stmt.else_code {
            let ord = stmt.branches.len() as u32;
            return match self.exec_code(fid, code, cdepth + 2)? {
                Exec::Suspend => {
                    self.cursor_push_front(fid, ord);
                    Ok(Exec::Suspend)
                }
                other => Ok(other),
            };
        }
        Ok(Exec::Done)
    }

    fn exec_while(
        &mut self,
        fid: FrameId,
        stmt: &WhileStmt,
        cdepth: usize,
        mut resume: bool,
    ) -> Result<Exec, RuntimeError> {
        loop {
            if !resume {
                let c = self.eval_expr(fid, &stmt.cond)?;
                if !self.expect_boolean(c)? {
                    return Ok(Exec::Done);
                }
            }
            let flow = self.exec_code(fid, &stmt.body, cdepth + 1)?;
            resume = false;
            match flow {
                Exec::Done | Exec::Continue => {}
                Exec::Break => return Ok(Exec::Done),
                Exec::Suspend => return Ok(Exec::Suspend),
                Exec::Return(v) => return Ok(Exec::Return(v)),
            }
        }
    }

    // Cursor plumbing

    fn resume_point(&mut self, fid: FrameId, cdepth: usize) -> ResumePoint {
        let Some(frame) = self.frames.get_mut(fid) else {
            return ResumePoint::Fresh;
        };
        let Some(coro) = frame.coro_mut() else {
            return ResumePoint::Fresh;
        };
        if !coro.resuming {
            return ResumePoint::Fresh;
        }
        match coro.cursor.get(cdepth).copied() {
            None => {
                coro.resuming = false;
                coro.cursor.clear();
                ResumePoint::Fresh
            }
            Some(i) if cdepth + 1 == coro.cursor.len() => {
                coro.resuming = false;
                coro.cursor.clear();
                ResumePoint::Leaf(i)
            }
            Some(i) => ResumePoint::Into(i),
        }
    }

    fn cursor_value(&self, fid: FrameId, pos: usize) -> u32 {
        self.frames
            .get(fid)
            .and_then(|f| f.coro())
            .and_then(|c| c.cursor.get(pos).copied())
            .unwrap_or(0)
    }

    fn cursor_push_front(&mut self, fid: FrameId, v: u32) {
        if let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) {
            coro.cursor.insert(0, v);
        }
    }

    /// A wait point fired: start a fresh cursor; the unwinding exec levels
    /// record the path.
    pub(crate) fn begin_suspend(&mut self, fid: FrameId) {
        if let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) {
            coro.cursor.clear();
            coro.resuming = false;
        }
    }

    fn check_breakpoint(&mut self, fid: FrameId, stmt: u32) {
        if self.breakpoints.is_empty() {
            return;
        }
        let Some(frame) = self.frames.get(fid) else {
            return;
        };
        let Some(class) = frame.owner_class.map(|c| self.brain.class(c).name) else {
            return;
        };
        let member = frame.member;
        if self.breakpoints.contains(&(class, member, stmt)) {
            self.debug_events.push(DebugEvent::BreakpointHit {
                class,
                member,
                stmt,
                frame: fid,
            });
        }
    }
}
