//! Frame construction and invocation.
//!
//! Methods run to completion within one invocation step. Coroutine
//! invocations run immediately until first suspension or completion and hand
//! control straight back to the invoker.
use anima_ir::{CallExpr, CoroCallExpr, ParamKind, Parameters};
use anima_syntax::Symbol;
use smallvec::SmallVec;
use std::rc::Rc;

use crate::class::ClassId;
use crate::engine::Engine;
use crate::errors::{RuntimeError, RuntimeErrorKind, messages};
use crate::eval::{Exec, StepOutcome};
use crate::frame::{CoroState, Frame, FrameBody, FrameId, FrameKind, PendingDst, Wake};
use crate::instance::{InstanceData, InstanceId, NIL};
use crate::invokable::{Invokable, InvokableBody};
use crate::mind::MindId;

pub(crate) enum AwaitOutcome {
    Done(InstanceId),
    Suspended,
}

impl Engine {
    // Method calls

    pub(crate) fn eval_call(
        &mut self,
        fid: FrameId,
        call: &CallExpr,
    ) -> Result<InstanceId, RuntimeError> {
        let receiver = match &call.receiver {
            Some(e) => self.eval_expr(fid, e)?,
            None => {
                let r = self.frame_receiver(fid)?;
                self.retain(r);
                r
            }
        };
        let mut args = Vec::with_capacity(call.args.len());
        for a in &call.args {
            match self.eval_expr(fid, a) {
                Ok(v) => args.push(v),
                Err(e) => {
                    self.release(receiver);
                    for v in args {
                        self.release(v);
                    }
                    return Err(e.with_span(call.span));
                }
            }
        }
        let result = self
            .invoke_method_on(receiver, call.method, args, Some(fid), None)
            .map_err(|e| e.with_span(call.span));
        self.release(receiver);
        result
    }

    /// Dispatch a method through the receiver's dynamic class. Consumes one
    /// reference per argument; the receiver reference stays with the caller.
    pub(crate) fn invoke_method_on(
        &mut self,
        receiver: InstanceId,
        method: Symbol,
        args: Vec<InstanceId>,
        caller: Option<FrameId>,
        mind_hint: Option<MindId>,
    ) -> Result<InstanceId, RuntimeError> {
        let _ = mind_hint;
        if self.call_depth >= self.config.max_call_depth {
            self.release_all(args);
            return Err(RuntimeError::new(
                RuntimeErrorKind::Custom,
                "call depth limit exceeded",
            ));
        }
        if receiver == NIL {
            self.release_all(args);
            return Err(RuntimeError::nil_receiver(method).with_member(method));
        }

        // Class references take constructor and class-method dispatch.
        if let InstanceData::ClassRef(target) = &self.objs.get(receiver).data {
            let target = *target;
            if method == Symbol::intern("!") {
                return self.construct(target, args, caller);
            }
            if let Some((owner, inv)) = self.brain.find_class_method(target, method) {
                let owner = owner;
                let inv = inv.clone();
                return self.run_method(receiver, owner, inv, args, caller);
            }
        }

        // `call` on a closure instance runs the closure body.
        let class = self.objs.class_of(receiver);
        if class == self.core.closure && method == Symbol::intern("call") {
            return self.invoke_closure_method(receiver, args, caller);
        }

        let Some((owner, inv)) = self.brain.find_method(class, method) else {
            let class_name = self.brain.class(class).name;
            self.release_all(args);
            return Err(RuntimeError::unknown_member(class_name, method).with_member(method));
        };
        let inv = inv.clone();
        self.run_method(receiver, owner, inv, args, caller)
    }

    fn run_method(
        &mut self,
        receiver: InstanceId,
        owner: ClassId,
        inv: Invokable,
        args: Vec<InstanceId>,
        caller: Option<FrameId>,
    ) -> Result<InstanceId, RuntimeError> {
        let body = match &inv.body {
            InvokableBody::Code(def) => FrameBody::Code(def.clone()),
            InvokableBody::Native(_) => FrameBody::None,
            InvokableBody::NativeCoroutine(_) => {
                self.release_all(args);
                return Err(RuntimeError::new(
                    RuntimeErrorKind::CoroutineContext,
                    format!("{} is a coroutine, not a method", inv.name),
                ));
            }
        };
        self.retain(receiver);
        let fid = self.frames.alloc(Frame {
            caller,
            receiver,
            locals: SmallVec::from_elem(NIL, inv.locals_count.max(inv.params.len() as u16) as usize),
            member: inv.name,
            owner_class: Some(owner),
            body,
            kind: FrameKind::Method,
        });
        if let Err(e) = self.fill_params(fid, &inv.params, args) {
            self.free_frame(fid);
            return Err(e);
        }

        self.call_depth += 1;
        let result = match &inv.body {
            InvokableBody::Native(f) => f(self, fid),
            InvokableBody::Code(def) => {
                let def = def.clone();
                match self.exec_code(fid, &def.body, 0) {
                    Ok(Exec::Done) => Ok(NIL),
                    Ok(Exec::Return(v)) => Ok(v),
                    Ok(Exec::Suspend) => Err(RuntimeError::new(
                        RuntimeErrorKind::CoroutineContext,
                        "method body tried to suspend",
                    )),
                    Ok(Exec::Break) | Ok(Exec::Continue) => Err(RuntimeError::new(
                        RuntimeErrorKind::Custom,
                        "break/continue outside loop",
                    )),
                    Err(e) => Err(e.with_member(inv.name)),
                }
            }
            InvokableBody::NativeCoroutine(_) => unreachable!(),
        };
        self.call_depth -= 1;
        self.free_frame(fid);
        result
    }

    fn invoke_closure_method(
        &mut self,
        closure: InstanceId,
        args: Vec<InstanceId>,
        caller: Option<FrameId>,
    ) -> Result<InstanceId, RuntimeError> {
        let (lit, receiver, captured) = match &self.objs.get(closure).data {
            InstanceData::Closure(c) => (c.lit.clone(), c.receiver, c.captured.to_vec()),
            _ => {
                self.release_all(args);
                return Err(RuntimeError::new(
                    RuntimeErrorKind::NotAClosure,
                    messages::NOT_A_CLOSURE,
                ));
            }
        };
        if lit.is_coroutine {
            self.release_all(args);
            return Err(RuntimeError::new(
                RuntimeErrorKind::CoroutineContext,
                "coroutine closure must be awaited with _invoke",
            ));
        }
        self.retain(receiver);
        let fid = self.frames.alloc(Frame {
            caller,
            receiver,
            locals: SmallVec::from_elem(
                NIL,
                lit.locals_count.max(lit.params.len() as u16) as usize,
            ),
            member: Symbol::intern("call"),
            owner_class: None,
            body: FrameBody::ClosureCode(lit.clone()),
            kind: FrameKind::Method,
        });
        self.seed_captures(fid, &lit, &captured);
        if let Err(e) = self.fill_params(fid, &lit.params, args) {
            self.free_frame(fid);
            return Err(e);
        }
        self.call_depth += 1;
        let result = match self.exec_code(fid, &lit.body, 0) {
            Ok(Exec::Done) => Ok(NIL),
            Ok(Exec::Return(v)) => Ok(v),
            Ok(Exec::Suspend) => Err(RuntimeError::new(
                RuntimeErrorKind::CoroutineContext,
                "method closure tried to suspend",
            )),
            Ok(Exec::Break) | Ok(Exec::Continue) => Err(RuntimeError::new(
                RuntimeErrorKind::Custom,
                "break/continue outside loop",
            )),
            Err(e) => Err(e),
        };
        self.call_depth -= 1;
        self.free_frame(fid);
        result
    }

    /// `ClassName!(args)`: allocate, then run the script/native constructor
    /// if one is defined anywhere on the chain. Actor classes consume a
    /// leading Symbol argument as the actor's stable identity.
    fn construct(
        &mut self,
        class: ClassId,
        mut args: Vec<InstanceId>,
        caller: Option<FrameId>,
    ) -> Result<InstanceId, RuntimeError> {
        let row = self.brain.class(class);
        let instance = if row.is_actor {
            let name = match args.first() {
                Some(&a) => match &self.objs.get(a).data {
                    InstanceData::Sym(s) => {
                        let s = *s;
                        let first = args.remove(0);
                        self.release(first);
                        Some(s)
                    }
                    _ => None,
                },
                None => None,
            };
            self.spawn_actor_by_id(class, name)
        } else {
            let slots = vec![NIL; row.slot_total() as usize];
            self.alloc(class, InstanceData::Slots(slots.into_boxed_slice()))
        };
        if self
            .brain
            .find_method(class, Symbol::intern("!"))
            .is_some()
        {
            let r = self.invoke_method_on(instance, Symbol::intern("!"), args, caller, None);
            match r {
                Ok(v) => self.release(v),
                Err(e) => {
                    self.release(instance);
                    return Err(e);
                }
            }
        } else {
            self.release_all(args);
        }
        Ok(instance)
    }

    // Coroutine invocation

    /// Awaited coroutine call from inside a coroutine body. Runs the child
    /// immediately; on child suspension the parent records its wake condition
    /// and pending destination.
    pub(crate) fn eval_await(
        &mut self,
        fid: FrameId,
        cc: &CoroCallExpr,
        dst: PendingDst,
    ) -> Result<AwaitOutcome, RuntimeError> {
        let receiver = match &cc.receiver {
            Some(e) => self.eval_expr(fid, e)?,
            None => {
                let r = self.frame_receiver(fid)?;
                self.retain(r);
                r
            }
        };
        let mut args = Vec::with_capacity(cc.args.len());
        for a in &cc.args {
            match self.eval_expr(fid, a) {
                Ok(v) => args.push(v),
                Err(e) => {
                    self.release(receiver);
                    self.release_all(args);
                    return Err(e.with_span(cc.span));
                }
            }
        }
        let mind = self.frame_mind(fid);
        let child = match self.spawn_coroutine_frame(receiver, cc.coroutine, args, Some(fid), mind)
        {
            Ok(c) => c,
            Err(e) => {
                self.release(receiver);
                return Err(e.with_span(cc.span));
            }
        };
        self.release(receiver);
        match self.coroutine_step(child) {
            Ok(StepOutcome::Completed(leftover)) => {
                Ok(AwaitOutcome::Done(leftover.unwrap_or(NIL)))
            }
            Ok(StepOutcome::Suspended) => {
                if let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) {
                    coro.wake = Wake::Child(child);
                    coro.pending_dst = Some(dst);
                }
                Ok(AwaitOutcome::Suspended)
            }
            Err(e) => {
                self.abort_coroutine(child);
                Err(e.with_span(cc.span))
            }
        }
    }

    /// Build (but do not run) a coroutine frame. Consumes argument
    /// references; the receiver reference stays with the caller.
    pub(crate) fn spawn_coroutine_frame(
        &mut self,
        receiver: InstanceId,
        name: Symbol,
        args: Vec<InstanceId>,
        caller: Option<FrameId>,
        mind_hint: Option<MindId>,
    ) -> Result<FrameId, RuntimeError> {
        if receiver == NIL {
            self.release_all(args);
            return Err(RuntimeError::nil_receiver(name));
        }
        // Coroutine closures are awaited through `_invoke`.
        if let InstanceData::Closure(c) = &self.objs.get(receiver).data {
            if name == Symbol::intern("_invoke") {
                let lit = c.lit.clone();
                let inner_receiver = c.receiver;
                let captured = c.captured.to_vec();
                if !lit.is_coroutine {
                    self.release_all(args);
                    return Err(RuntimeError::new(
                        RuntimeErrorKind::NotAClosure,
                        "method closure invoked as coroutine",
                    ));
                }
                let mind = mind_hint
                    .or_else(|| caller.and_then(|c| self.frame_mind(c)))
                    .unwrap_or_else(|| self.updater_mind_of(inner_receiver));
                let fid = self.build_closure_coro_frame(
                    &lit,
                    inner_receiver,
                    &captured,
                    caller,
                    mind,
                );
                if let Err(e) = self.fill_params(fid, &lit.params, args) {
                    self.free_frame(fid);
                    return Err(e);
                }
                return Ok(fid);
            }
        }

        let class = self.objs.class_of(receiver);
        let Some((owner, inv)) = self.brain.find_coroutine(class, name) else {
            let class_name = self.brain.class(class).name;
            self.release_all(args);
            return Err(RuntimeError::unknown_member(class_name, name).with_member(name));
        };
        let inv = inv.clone();
        let body = match &inv.body {
            InvokableBody::Code(def) => FrameBody::Code(def.clone()),
            InvokableBody::NativeCoroutine(f) => FrameBody::NativeCoroutine(*f),
            InvokableBody::Native(_) => {
                self.release_all(args);
                return Err(RuntimeError::new(
                    RuntimeErrorKind::CoroutineContext,
                    format!("{} is a method, not a coroutine", name),
                ));
            }
        };
        let mind = mind_hint
            .or_else(|| caller.and_then(|c| self.frame_mind(c)))
            .unwrap_or_else(|| self.updater_mind_of(receiver));
        self.retain(receiver);
        let fid = self.frames.alloc(Frame {
            caller,
            receiver,
            locals: SmallVec::from_elem(
                NIL,
                inv.locals_count.max(inv.params.len() as u16) as usize,
            ),
            member: inv.name,
            owner_class: Some(owner),
            body,
            kind: FrameKind::Coroutine(Box::new(CoroState::new(mind))),
        });
        if let Err(e) = self.fill_params(fid, &inv.params, args) {
            self.free_frame(fid);
            return Err(e);
        }
        Ok(fid)
    }

    /// Detached coroutine from a `branch` block: captures come straight from
    /// the spawning frame, there is no caller backref, and the first step
    /// runs immediately.
    pub(crate) fn spawn_branch(
        &mut self,
        fid: FrameId,
        lit: &anima_ir::ClosureLit,
    ) -> Result<FrameId, RuntimeError> {
        let receiver = self.frame_receiver(fid)?;
        let mind = self
            .frame_mind(fid)
            .unwrap_or_else(|| self.updater_mind_of(receiver));
        let mut captured = Vec::with_capacity(lit.captures.len());
        for cap in &lit.captures {
            let v = self
                .frames
                .get(fid)
                .map(|f| f.local(cap.outer_slot))
                .unwrap_or(NIL);
            self.retain(v);
            captured.push(v);
        }
        let lit = Rc::new(lit.clone());
        let child = self.build_closure_coro_frame(&lit, receiver, &captured, None, mind);
        self.release_all(captured);
        match self.coroutine_step(child) {
            Ok(StepOutcome::Completed(leftover)) => {
                if let Some(v) = leftover {
                    self.release(v);
                }
                Ok(child)
            }
            Ok(StepOutcome::Suspended) => Ok(child),
            Err(e) => {
                self.abort_coroutine(child);
                Err(e)
            }
        }
    }

    fn build_closure_coro_frame(
        &mut self,
        lit: &Rc<anima_ir::ClosureLit>,
        receiver: InstanceId,
        captured: &[InstanceId],
        caller: Option<FrameId>,
        mind: MindId,
    ) -> FrameId {
        self.retain(receiver);
        let fid = self.frames.alloc(Frame {
            caller,
            receiver,
            locals: SmallVec::from_elem(
                NIL,
                lit.locals_count.max(lit.params.len() as u16) as usize,
            ),
            member: Symbol::intern("_invoke"),
            owner_class: None,
            body: FrameBody::ClosureCode(lit.clone()),
            kind: FrameKind::Coroutine(Box::new(CoroState::new(mind))),
        });
        self.seed_captures(fid, lit, captured);
        fid
    }

    fn seed_captures(
        &mut self,
        fid: FrameId,
        lit: &anima_ir::ClosureLit,
        captured: &[InstanceId],
    ) {
        for (cap, &v) in lit.captures.iter().zip(captured.iter()) {
            self.retain(v);
            self.set_local_raw(fid, cap.inner_slot, v);
        }
    }

    /// Place arguments into the leading frame slots: positional, then lazy
    /// defaults (evaluated in the callee frame), with a trailing variadic
    /// group collected into a List.
    pub(crate) fn fill_params(
        &mut self,
        fid: FrameId,
        params: &Parameters,
        mut args: Vec<InstanceId>,
    ) -> Result<(), RuntimeError> {
        let member = self.frames.get(fid).map(|f| f.member).unwrap_or_default();
        if !params.accepts(args.len()) {
            let n = args.len();
            self.release_all(args);
            return Err(RuntimeError::argument_count(member, n));
        }
        let mut rest = if params.is_variadic() {
            args.split_off((params.len() - 1).min(args.len()))
        } else {
            Vec::new()
        };
        let mut it = args.into_iter();
        for (i, p) in params.params.iter().enumerate() {
            match &p.kind {
                ParamKind::Variadic => {
                    let list = self.new_list(std::mem::take(&mut rest));
                    self.set_local_raw(fid, i as u16, list);
                }
                _ => {
                    if let Some(v) = it.next() {
                        self.set_local_raw(fid, i as u16, v);
                    } else if let ParamKind::Defaulted(default) = &p.kind {
                        match self.eval_expr(fid, default) {
                            Ok(v) => self.set_local_raw(fid, i as u16, v),
                            Err(e) => {
                                self.release_all(rest);
                                return Err(e);
                            }
                        }
                    }
                    // Required-but-missing is unreachable: accepts() checked.
                }
            }
        }
        Ok(())
    }

    pub(crate) fn frame_mind(&self, fid: FrameId) -> Option<MindId> {
        self.frames.get(fid).and_then(|f| f.coro()).map(|c| c.mind)
    }

    pub(crate) fn free_frame(&mut self, fid: FrameId) {
        let Some(frame) = self.frames.free(fid) else {
            return;
        };
        for local in frame.locals {
            self.release(local);
        }
        self.release(frame.receiver);
        if let FrameKind::Coroutine(coro) = frame.kind {
            if let Some(mind) = self.minds.get_mut(coro.mind) {
                mind.untrack(fid);
            }
        }
    }

    pub(crate) fn release_all(&mut self, args: Vec<InstanceId>) {
        for a in args {
            self.release(a);
        }
    }
}
