//! Expression evaluation.
//!
//! Every result carries one reference owned by the caller. Slot reads retain
//! before returning; stores consume the incoming reference and release the
//! displaced value.
use anima_ir::{BinaryOp, Expr, Place};
use std::rc::Rc;

use crate::engine::Engine;
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::frame::{FrameId, PendingDst};
use crate::instance::{ClosureData, InstanceData, InstanceId, NIL};

impl Engine {
    pub(crate) fn eval_expr(&mut self, fid: FrameId, expr: &Expr) -> Result<InstanceId, RuntimeError> {
        match expr {
            Expr::Nil => Ok(NIL),
            Expr::Bool(b) => Ok(self.new_boolean(*b)),
            Expr::Int(v) => Ok(self.new_integer(*v)),
            Expr::Real(v) => Ok(self.new_real(*v)),
            Expr::Str(s) => Ok(self.new_string(s.clone())),
            Expr::Sym(s) => Ok(self.new_symbol(*s)),
            Expr::List(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    match self.eval_expr(fid, item) {
                        Ok(v) => list.push(v),
                        Err(e) => {
                            for v in list {
                                self.release(v);
                            }
                            return Err(e);
                        }
                    }
                }
                Ok(self.new_list(list))
            }
            Expr::This => {
                let recv = self.frame_receiver(fid)?;
                self.retain(recv);
                Ok(recv)
            }
            Expr::Local { slot, shared, .. } => self.read_local(fid, *slot, *shared),
            Expr::MemberData { name, index } => self.read_member_data(fid, *name, *index),
            Expr::ClassData { class, name } => {
                let cid = self.brain.find_class(*class).ok_or_else(|| {
                    RuntimeError::new(
                        RuntimeErrorKind::UnknownClass,
                        format!("unknown class {class}"),
                    )
                })?;
                let (owner, idx) = self.brain.find_class_data(cid, *name).ok_or_else(|| {
                    RuntimeError::unknown_member(*class, *name)
                })?;
                let v = self.brain.class(owner).class_data_values[idx as usize];
                self.retain(v);
                Ok(v)
            }
            Expr::Global(name) => {
                if let Some(v) = self.brain.global(*name) {
                    self.retain(v);
                    return Ok(v);
                }
                if let Some(cid) = self.brain.find_class(*name) {
                    let v = self.class_ref(cid);
                    self.retain(v);
                    return Ok(v);
                }
                Err(RuntimeError::new(
                    RuntimeErrorKind::UnknownGlobal,
                    format!("unknown global {name}"),
                ))
            }
            Expr::ObjectId { name, span } => {
                if let Some(actor) = self.brain.actor_by_name(*name) {
                    self.retain(actor);
                    return Ok(actor);
                }
                if let Some(actor) = self.hooks.resolve_actor(*name) {
                    self.retain(actor);
                    return Ok(actor);
                }
                Err(RuntimeError::new(
                    RuntimeErrorKind::UnknownActor,
                    format!("no actor named {name}"),
                )
                .with_span(*span))
            }
            Expr::Closure(lit) => self.make_closure(fid, lit),
            Expr::Call(call) => self.eval_call(fid, call),
            Expr::CoroCall(cc) => {
                // The binder restricts awaited calls to statement positions;
                // reaching one here means the tree bypassed binding.
                Err(RuntimeError::new(
                    RuntimeErrorKind::CoroutineContext,
                    "coroutine call outside statement position",
                )
                .with_span(cc.span))
            }
            Expr::Unary(u) => {
                let v = self.eval_expr(fid, &u.expr)?;
                self.eval_unary(u.op, v)
            }
            Expr::Binary(b) => {
                // Short-circuit forms never evaluate the right side eagerly.
                match b.op {
                    BinaryOp::And => {
                        let l = self.eval_expr(fid, &b.left)?;
                        if !self.expect_boolean(l)? {
                            return Ok(self.new_boolean(false));
                        }
                        let r = self.eval_expr(fid, &b.right)?;
                        let rv = self.expect_boolean(r)?;
                        Ok(self.new_boolean(rv))
                    }
                    BinaryOp::Or => {
                        let l = self.eval_expr(fid, &b.left)?;
                        if self.expect_boolean(l)? {
                            return Ok(self.new_boolean(true));
                        }
                        let r = self.eval_expr(fid, &b.right)?;
                        let rv = self.expect_boolean(r)?;
                        Ok(self.new_boolean(rv))
                    }
                    op => {
                        let l = self.eval_expr(fid, &b.left)?;
                        let r = match self.eval_expr(fid, &b.right) {
                            Ok(r) => r,
                            Err(e) => {
                                self.release(l);
                                return Err(e);
                            }
                        };
                        self.eval_binary(op, l, r)
                    }
                }
            }
            Expr::Error(span) => Err(RuntimeError::new(
                RuntimeErrorKind::Custom,
                "expression failed to parse",
            )
            .with_span(*span)),
        }
    }

    // Slot access

    pub(crate) fn frame_receiver(&self, fid: FrameId) -> Result<InstanceId, RuntimeError> {
        self.frames
            .get(fid)
            .map(|f| f.receiver)
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::FrameGone, "frame is gone"))
    }

    pub(crate) fn read_local(
        &mut self,
        fid: FrameId,
        slot: u16,
        shared: bool,
    ) -> Result<InstanceId, RuntimeError> {
        let v = self
            .frames
            .get(fid)
            .map(|f| f.local(slot))
            .ok_or_else(|| RuntimeError::new(RuntimeErrorKind::FrameGone, "frame is gone"))?;
        if shared {
            if let InstanceData::Shared(inner) = &self.objs.get(v).data {
                let inner = *inner;
                self.retain(inner);
                return Ok(inner);
            }
        }
        self.retain(v);
        Ok(v)
    }

    fn read_member_data(
        &mut self,
        fid: FrameId,
        name: anima_syntax::Symbol,
        index: u16,
    ) -> Result<InstanceId, RuntimeError> {
        let recv = self.frame_receiver(fid)?;
        let v = match &self.objs.get(recv).data {
            InstanceData::Slots(slots) => slots.get(index as usize).copied(),
            InstanceData::Actor { slots, .. } => slots.get(index as usize).copied(),
            _ => None,
        }
        .ok_or_else(|| {
            RuntimeError::new(
                RuntimeErrorKind::UnknownMember,
                format!("receiver has no data slot {name}"),
            )
        })?;
        self.retain(v);
        Ok(v)
    }

    /// Replace a local slot outright (no shared-cell indirection). Consumes
    /// the incoming reference, releases the displaced value.
    pub(crate) fn set_local_raw(&mut self, fid: FrameId, slot: u16, v: InstanceId) {
        let old = {
            let Some(frame) = self.frames.get_mut(fid) else {
                self.release(v);
                return;
            };
            let idx = slot as usize;
            if frame.locals.len() <= idx {
                frame.locals.resize(idx + 1, NIL);
            }
            std::mem::replace(&mut frame.locals[idx], v)
        };
        self.release(old);
    }

    /// Store into a local, writing through a `shared` cell when one sits in
    /// the slot.
    pub(crate) fn store_local(&mut self, fid: FrameId, slot: u16, v: InstanceId) {
        let cur = self.frames.get(fid).map(|f| f.local(slot)).unwrap_or(NIL);
        if cur != NIL && self.objs.is_live(cur) {
            if let InstanceData::Shared(_) = self.objs.get(cur).data {
                let old = {
                    let inst = self.objs.get_mut(cur);
                    match &mut inst.data {
                        InstanceData::Shared(inner) => std::mem::replace(inner, v),
                        _ => unreachable!(),
                    }
                };
                self.release(old);
                return;
            }
        }
        self.set_local_raw(fid, slot, v);
    }

    pub(crate) fn store_member_data(&mut self, fid: FrameId, index: u16, v: InstanceId) {
        let Ok(recv) = self.frame_receiver(fid) else {
            self.release(v);
            return;
        };
        let old = {
            let inst = self.objs.get_mut(recv);
            let slot = match &mut inst.data {
                InstanceData::Slots(slots) => slots.get_mut(index as usize),
                InstanceData::Actor { slots, .. } => slots.get_mut(index as usize),
                _ => None,
            };
            match slot {
                Some(slot) => Some(std::mem::replace(slot, v)),
                None => None,
            }
        };
        match old {
            Some(old) => self.release(old),
            None => self.release(v),
        }
    }

    pub(crate) fn place_dst(&self, place: &Place) -> PendingDst {
        match place {
            Place::Local { slot, .. } => PendingDst::Local(*slot),
            Place::MemberData { index, .. } => PendingDst::Member(*index),
            Place::ClassData { class, name } => PendingDst::ClassData(*class, *name),
        }
    }

    /// Store a value into a pending destination. Consumes the reference.
    pub(crate) fn store_pending(&mut self, fid: FrameId, dst: PendingDst, v: InstanceId) {
        match dst {
            PendingDst::Local(slot) => self.store_local(fid, slot, v),
            PendingDst::Member(index) => self.store_member_data(fid, index, v),
            PendingDst::ClassData(class, name) => {
                let Some(cid) = self.brain.find_class(class) else {
                    self.release(v);
                    return;
                };
                let Some((owner, idx)) = self.brain.find_class_data(cid, name) else {
                    self.release(v);
                    return;
                };
                let row = self.brain.class_mut(owner);
                let old = std::mem::replace(&mut row.class_data_values[idx as usize], v);
                self.release(old);
            }
            PendingDst::Discard => self.release(v),
        }
    }

    // Closure creation: captures are copied out of the creating frame now
    // (shared cells are referenced, not copied).
    fn make_closure(
        &mut self,
        fid: FrameId,
        lit: &anima_ir::ClosureLit,
    ) -> Result<InstanceId, RuntimeError> {
        let receiver = self.frame_receiver(fid)?;
        self.retain(receiver);
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
        Ok(self.new_closure(ClosureData {
            lit: Rc::new(lit.clone()),
            receiver,
            captured: captured.into_boxed_slice(),
        }))
    }
}
