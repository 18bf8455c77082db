//! The embeddable engine.
//!
//! Owns the Brain (class registry), the instance pool, invocation frames and
//! all minds. Single-threaded and cooperative: a host wanting minds on
//! several threads runs one engine per thread or synchronizes outside.
use anima_ir::{DataDef, MemberDef, MemberKind, Parameters};
use anima_syntax::{Diagnostic, Symbol};
use hashbrown::HashSet;

use crate::brain::Brain;
use crate::class::ClassId;
use crate::errors::{ClassError, RuntimeError, RuntimeErrorKind};
use crate::frame::{FrameBody, FrameId, FramePool};
use crate::hooks::{AppHooks, ErrorDecision, StdHooks};
use crate::instance::{ClosureData, Instance, InstanceData, InstanceId, NIL};
use crate::invokable::{Invokable, NativeCoroutine, NativeMethod};
use crate::mind::{MASTER_MIND, Mind, MindId, MindPool};
use crate::pool::{ObjPool, PoolStats};

#[derive(Clone, Copy, Debug)]
pub struct EngineConfig {
    /// Refuse to install members whose bind produced errors.
    pub strict_bind: bool,
    /// Synchronous call depth guard.
    pub max_call_depth: usize,
    /// Pool size-class rounding; part of the host allocator contract.
    pub size_round: fn(usize) -> usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_bind: true,
            max_call_depth: 256,
            size_round: crate::pool::round_pow2,
        }
    }
}

/// Cached core-class ids, resolved once at bootstrap.
#[derive(Clone, Copy, Debug)]
pub struct CoreClasses {
    pub object: ClassId,
    pub none: ClassId,
    pub boolean: ClassId,
    pub integer: ClassId,
    pub real: ClassId,
    pub string: ClassId,
    pub symbol: ClassId,
    pub list: ClassId,
    pub closure: ClassId,
    pub data_instance: ClassId,
    pub actor: ClassId,
    pub metaclass: ClassId,
    pub shared: ClassId,
}

/// Events a connected debugger cares about; drained by the remote session.
#[derive(Clone, Debug, PartialEq)]
pub enum DebugEvent {
    BreakpointHit {
        class: Symbol,
        member: Symbol,
        stmt: u32,
        frame: FrameId,
    },
    ErrorBreak {
        message: String,
    },
}

pub struct Engine {
    pub(crate) brain: Brain,
    pub(crate) objs: ObjPool,
    pub(crate) frames: FramePool,
    pub(crate) minds: MindPool,
    pub(crate) hooks: Box<dyn AppHooks>,
    pub(crate) config: EngineConfig,
    pub(crate) core: CoreClasses,
    output: String,
    errors: Vec<RuntimeError>,
    pub(crate) call_depth: usize,
    class_refs: hashbrown::HashMap<ClassId, InstanceId, ahash::RandomState>,
    pub(crate) breakpoints: HashSet<(Symbol, Symbol, u32)>,
    pub(crate) debug_events: Vec<DebugEvent>,
    /// Mirror prints for the remote protocol stream when a tool is attached.
    pub(crate) capture_prints: bool,
    pub(crate) print_events: Vec<String>,
    actor_counter: u32,
    pub(crate) aborting: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_hooks(Box::new(StdHooks))
    }

    pub fn with_hooks(hooks: Box<dyn AppHooks>) -> Self {
        Self::with_config(hooks, EngineConfig::default())
    }

    pub fn with_config(hooks: Box<dyn AppHooks>, config: EngineConfig) -> Self {
        let mut brain = Brain::new();
        let object = brain
            .register_class(Symbol::intern("Object"), None)
            .expect("bootstrap");
        let mut reg = |name: &str| {
            brain
                .register_class(Symbol::intern(name), Some(Symbol::intern("Object")))
                .expect("bootstrap")
        };
        let none = reg("None");
        let boolean = reg("Boolean");
        let integer = reg("Integer");
        let real = reg("Real");
        let string = reg("String");
        let symbol = reg("Symbol");
        let list = reg("List");
        let closure = reg("Closure");
        let data_instance = reg("DataInstance");
        let metaclass = reg("Class");
        let shared = reg("Shared");
        let actor = brain
            .register_class(Symbol::intern("Actor"), Some(Symbol::intern("DataInstance")))
            .expect("bootstrap");
        brain.class_mut(actor).is_actor = true;

        let core = CoreClasses {
            object,
            none,
            boolean,
            integer,
            real,
            string,
            symbol,
            list,
            closure,
            data_instance,
            actor,
            metaclass,
            shared,
        };

        let mut engine = Self {
            brain,
            objs: ObjPool::new(none, config.size_round),
            frames: FramePool::new(),
            minds: MindPool::new(),
            hooks,
            config,
            core,
            output: String::new(),
            errors: Vec::new(),
            call_depth: 0,
            class_refs: hashbrown::HashMap::with_hasher(ahash::RandomState::with_seeds(
                0, 0, 0, 0,
            )),
            breakpoints: HashSet::new(),
            debug_events: Vec::new(),
            capture_prints: false,
            print_events: Vec::new(),
            actor_counter: 0,
            aborting: false,
        };
        crate::builtins::register_all(&mut engine);
        engine
    }

    // Accessors

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    pub fn brain_mut(&mut self) -> &mut Brain {
        &mut self.brain
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.objs.stats()
    }

    pub fn live_frames(&self) -> usize {
        self.frames.live_count()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn take_errors(&mut self) -> Vec<RuntimeError> {
        std::mem::take(&mut self.errors)
    }

    pub(crate) fn write_print(&mut self, text: &str) {
        self.output.push_str(text);
        self.hooks.print(text);
        if self.capture_prints {
            self.print_events.push(text.to_string());
        }
    }

    // Instance plumbing

    pub fn alloc(&mut self, class: ClassId, data: InstanceData) -> InstanceId {
        let id = self.objs.alloc(class, data);
        self.brain.class_mut(class).live_instances += 1;
        id
    }

    pub fn retain(&mut self, id: InstanceId) {
        self.objs.inc_ref(id);
    }

    /// Drop one reference; at zero the destroy hook runs and nested
    /// references are released recursively.
    pub fn release(&mut self, id: InstanceId) {
        if let Some((class, data)) = self.objs.dec_ref(id) {
            let row = self.brain.class_mut(class);
            debug_assert!(row.live_instances > 0);
            row.live_instances -= 1;
            self.destroy_data(data);
        }
    }

    fn destroy_data(&mut self, data: InstanceData) {
        match data {
            InstanceData::None
            | InstanceData::Boolean(_)
            | InstanceData::Integer(_)
            | InstanceData::Real(_)
            | InstanceData::Str(_)
            | InstanceData::Sym(_)
            | InstanceData::ClassRef(_) => {}
            InstanceData::List(items) => {
                for item in items {
                    self.release(item);
                }
            }
            InstanceData::Slots(slots) => {
                for s in slots {
                    self.release(s);
                }
            }
            InstanceData::Actor { slots, name, mind } => {
                self.brain.unregister_actor(name);
                self.teardown_mind(mind);
                for s in slots {
                    self.release(s);
                }
            }
            InstanceData::Closure(c) => {
                self.release(c.receiver);
                for cap in c.captured {
                    self.release(cap);
                }
            }
            InstanceData::Shared(inner) => {
                self.release(inner);
            }
        }
    }

    // Common constructors

    pub fn new_boolean(&mut self, v: bool) -> InstanceId {
        self.alloc(self.core.boolean, InstanceData::Boolean(v))
    }

    pub fn new_integer(&mut self, v: i64) -> InstanceId {
        self.alloc(self.core.integer, InstanceData::Integer(v))
    }

    pub fn new_real(&mut self, v: f32) -> InstanceId {
        self.alloc(self.core.real, InstanceData::Real(v))
    }

    pub fn new_string(&mut self, v: impl Into<Box<str>>) -> InstanceId {
        self.alloc(self.core.string, InstanceData::Str(v.into()))
    }

    pub fn new_symbol(&mut self, v: Symbol) -> InstanceId {
        self.alloc(self.core.symbol, InstanceData::Sym(v))
    }

    pub fn new_list(&mut self, items: Vec<InstanceId>) -> InstanceId {
        self.alloc(self.core.list, InstanceData::List(items))
    }

    /// Pinned per-class reference instance (`Dog` as a value).
    pub fn class_ref(&mut self, class: ClassId) -> InstanceId {
        if let Some(&id) = self.class_refs.get(&class) {
            return id;
        }
        let id = self.alloc(self.core.metaclass, InstanceData::ClassRef(class));
        self.class_refs.insert(class, id);
        id
    }

    // Class management

    pub fn add_class(
        &mut self,
        name: Symbol,
        superclass: Option<Symbol>,
    ) -> Result<ClassId, ClassError> {
        self.brain
            .register_class(name, superclass.or(Some(Symbol::intern("Object"))))
    }

    pub fn add_instance_data(&mut self, class: Symbol, def: &DataDef) -> Result<u16, ClassError> {
        self.brain.add_instance_data(class, def)
    }

    pub fn add_class_data(&mut self, class: Symbol, def: &DataDef) -> Result<(), ClassError> {
        self.brain.add_class_data(class, def)
    }

    /// Compile one member source file and install it (hot patch): the new
    /// body is used by all subsequent dispatches without recreating existing
    /// instances.
    pub fn load_member(
        &mut self,
        class: Symbol,
        name: Symbol,
        kind: MemberKind,
        source: &str,
    ) -> Result<Vec<Diagnostic>, ClassError> {
        let cid = self
            .brain
            .find_class(class)
            .ok_or(ClassError::UnknownClass(class))?;
        let (def, diagnostics) =
            anima_parser::compile_member(source, name, kind, class, &self.brain, false);
        let has_errors = diagnostics.iter().any(|d| d.is_error());
        if let Some(def) = def {
            if !(self.config.strict_bind && has_errors) {
                self.install_member(cid, def);
            }
        }
        Ok(diagnostics)
    }

    pub fn install_member(&mut self, class: ClassId, def: MemberDef) {
        let inv = Invokable::from_member(def, Some(class));
        self.brain.hot_patch(class, inv);
    }

    // Native binding interface

    pub fn bind_method(
        &mut self,
        class: Symbol,
        name: &str,
        params: Parameters,
        f: NativeMethod,
    ) -> Result<(), ClassError> {
        let cid = self
            .brain
            .find_class(class)
            .ok_or(ClassError::UnknownClass(class))?;
        let inv = Invokable::native_method(Symbol::intern(name), Some(cid), params, f);
        self.brain.hot_patch(cid, inv);
        Ok(())
    }

    pub fn bind_class_method(
        &mut self,
        class: Symbol,
        name: &str,
        params: Parameters,
        f: NativeMethod,
    ) -> Result<(), ClassError> {
        let cid = self
            .brain
            .find_class(class)
            .ok_or(ClassError::UnknownClass(class))?;
        let inv = Invokable::native_class_method(Symbol::intern(name), Some(cid), params, f);
        self.brain.hot_patch(cid, inv);
        Ok(())
    }

    pub fn bind_coroutine(
        &mut self,
        class: Symbol,
        name: &str,
        params: Parameters,
        f: NativeCoroutine,
    ) -> Result<(), ClassError> {
        let cid = self
            .brain
            .find_class(class)
            .ok_or(ClassError::UnknownClass(class))?;
        let inv = Invokable::native_coroutine(Symbol::intern(name), Some(cid), params, f);
        self.brain.hot_patch(cid, inv);
        Ok(())
    }

    /// Bind a named global instance (takes over one reference).
    pub fn bind_global(&mut self, name: Symbol, value: InstanceId) {
        if let Some(old) = self.brain.bind_global(name, value) {
            self.release(old);
        }
    }

    // Actors

    pub fn spawn_actor(
        &mut self,
        class: Symbol,
        name: Option<Symbol>,
    ) -> Result<InstanceId, RuntimeError> {
        let cid = self.brain.find_class(class).ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::UnknownClass, format!("unknown class {class}"))
        })?;
        Ok(self.spawn_actor_by_id(cid, name))
    }

    pub(crate) fn spawn_actor_by_id(&mut self, cid: ClassId, name: Option<Symbol>) -> InstanceId {
        let name = name.unwrap_or_else(|| {
            self.actor_counter += 1;
            Symbol::intern(&format!(
                "{}_{}",
                self.brain.class(cid).name.as_str().to_lowercase(),
                self.actor_counter
            ))
        });
        let slot_count = self.brain.class(cid).slot_total() as usize;
        let mind = self.minds.alloc(Mind::new(name, None));
        let id = self.alloc(
            cid,
            InstanceData::Actor {
                slots: vec![NIL; slot_count].into_boxed_slice(),
                name,
                mind,
            },
        );
        if let Some(m) = self.minds.get_mut(mind) {
            m.actor = Some(id);
        }
        self.brain.register_actor(name, id);
        id
    }

    /// Explicitly destroy an actor: terminates every coroutine rooted in its
    /// mind (recursively, including awaited children) and unregisters its
    /// identity. The instance memory itself returns to the pool when the last
    /// reference drops.
    pub fn destroy_actor(&mut self, id: InstanceId) {
        let (name, mind) = match &self.objs.get(id).data {
            InstanceData::Actor { name, mind, .. } => (*name, *mind),
            _ => return,
        };
        self.brain.unregister_actor(name);
        self.teardown_mind(mind);
    }

    pub(crate) fn teardown_mind(&mut self, mid: MindId) {
        let Some(mind) = self.minds.get_mut(mid) else {
            return;
        };
        let mut doomed: Vec<FrameId> = mind.pending.drain(..).collect();
        doomed.extend(mind.ready.drain(..));
        for fid in doomed {
            self.abort_coroutine(fid);
        }
        self.minds.free(mid);
    }

    /// Raise an external signal on an instance's updater mind.
    pub fn raise_signal(&mut self, target: InstanceId, signal: Symbol) {
        let mid = self.updater_mind_of(target);
        if let Some(mind) = self.minds.get_mut(mid) {
            mind.raised.push(signal);
        }
    }

    pub(crate) fn updater_mind_of(&self, target: InstanceId) -> MindId {
        match &self.objs.get(target).data {
            InstanceData::Actor { mind, .. } => *mind,
            _ => MASTER_MIND,
        }
    }

    pub fn mind_elapsed(&self, mid: MindId) -> f64 {
        self.minds.get(mid).map(|m| m.elapsed).unwrap_or(0.0)
    }

    // Tick entry point

    /// Advance simulation time: updates the global mind, then every actor
    /// mind, resuming due coroutines in FIFO order of due time.
    pub fn update(&mut self, delta_seconds: f32) {
        let ids = self.minds.ids();
        for mid in ids {
            if self.aborting {
                break;
            }
            self.mind_update(mid, delta_seconds as f64);
        }
    }

    // Invocation entry points (host side)

    /// Invoke a method synchronously. `args` are owned by the call (one
    /// reference each is consumed).
    pub fn invoke(
        &mut self,
        receiver: InstanceId,
        method: Symbol,
        args: Vec<InstanceId>,
    ) -> Result<InstanceId, RuntimeError> {
        self.invoke_method_on(receiver, method, args, None, None)
    }

    /// `ClassName!(args)` from the host side.
    pub fn instantiate(
        &mut self,
        class: Symbol,
        args: Vec<InstanceId>,
    ) -> Result<InstanceId, RuntimeError> {
        let cid = self.brain.find_class(class).ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::UnknownClass, format!("unknown class {class}"))
        })?;
        let cref = self.class_ref(cid);
        self.invoke(cref, Symbol::intern("!"), args)
    }

    /// Outstanding reference count of an instance (tests, debugger).
    pub fn refs_of(&self, id: InstanceId) -> u32 {
        self.objs.refs(id)
    }

    pub fn is_live(&self, id: InstanceId) -> bool {
        self.objs.is_live(id)
    }

    /// Start a coroutine: runs immediately until first suspension or
    /// completion. Returns the live frame when it suspended, or `None` with
    /// the invocation already finished.
    pub fn start_coroutine(
        &mut self,
        receiver: InstanceId,
        name: Symbol,
        args: Vec<InstanceId>,
    ) -> Result<Option<FrameId>, RuntimeError> {
        let fid = self.spawn_coroutine_frame(receiver, name, args, None, None)?;
        match self.coroutine_step(fid) {
            Ok(crate::eval::StepOutcome::Suspended) => Ok(Some(fid)),
            Ok(crate::eval::StepOutcome::Completed(leftover)) => {
                if let Some(v) = leftover {
                    self.release(v);
                }
                Ok(None)
            }
            Err(e) => {
                self.abort_coroutine(fid);
                Err(e)
            }
        }
    }

    /// Evaluate an expression against a live frame (debugger support).
    /// Parses in the incremental mode, binds against the frame's locals and
    /// returns the printable result.
    pub fn eval_in_frame(&mut self, fid: FrameId, source: &str) -> Result<String, RuntimeError> {
        let locals = self.frame_locals(fid).ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::FrameGone, "no such frame")
        })?;
        let class = self.frame_class(fid).unwrap_or_else(|| Symbol::intern("Object"));
        let (expr, diagnostics) =
            anima_parser::compile_frame_expr(source, &locals, class, &self.brain);
        if diagnostics.iter().any(|d| d.is_error()) {
            let msg = diagnostics
                .iter()
                .filter(|d| d.is_error())
                .map(|d| d.message.clone())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(RuntimeError::new(RuntimeErrorKind::Custom, msg));
        }
        let expr = expr.ok_or_else(|| {
            RuntimeError::new(RuntimeErrorKind::Custom, "expression did not parse")
        })?;
        let v = self.eval_expr(fid, &expr)?;
        let rendered = self.value_to_string(v);
        self.release(v);
        Ok(rendered)
    }

    /// Terminate a suspended coroutine: severs its wake condition and
    /// releases everything it holds, recursively aborting awaited children.
    pub fn terminate_coroutine(&mut self, fid: FrameId) {
        self.abort_coroutine(fid);
    }

    // Error routing

    pub(crate) fn report_error(&mut self, err: RuntimeError) -> ErrorDecision {
        let decision = self.hooks.on_error(&err);
        if decision == ErrorDecision::Break {
            self.debug_events.push(DebugEvent::ErrorBreak {
                message: err.to_string(),
            });
        }
        if decision == ErrorDecision::Abort {
            self.hooks.on_fatal(&err.to_string());
            self.aborting = true;
        }
        self.errors.push(err);
        decision
    }

    // Breakpoints

    pub fn set_breakpoint(&mut self, class: Symbol, member: Symbol, stmt: u32) {
        self.breakpoints.insert((class, member, stmt));
    }

    pub fn clear_breakpoint(&mut self, class: Symbol, member: Symbol, stmt: u32) {
        self.breakpoints.remove(&(class, member, stmt));
    }

    pub fn take_debug_events(&mut self) -> Vec<DebugEvent> {
        std::mem::take(&mut self.debug_events)
    }

    // Native-coroutine authoring surface

    /// True on a native coroutine's first step, false on resumptions.
    pub fn coroutine_first_run(&self, fid: FrameId) -> bool {
        self.frames
            .get(fid)
            .and_then(|f| f.coro())
            .map(|c| c.update_count == 0)
            .unwrap_or(false)
    }

    /// Arm an elapsed-time wake on the frame's mind: due in `seconds` from
    /// the mind's current clock, woken when elapsed >= due.
    pub fn set_wake_time(&mut self, fid: FrameId, seconds: f32) {
        let Some(mind) = self.frame_mind(fid) else {
            return;
        };
        let due = self.mind_elapsed(mind) + seconds.max(0.0) as f64;
        if let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) {
            coro.wake = crate::frame::Wake::Time(due);
        }
    }

    /// Suspend until the named signal is raised on the frame's mind.
    pub fn set_wake_signal(&mut self, fid: FrameId, name: Symbol) {
        if let Some(coro) = self.frames.get_mut(fid).and_then(|f| f.coro_mut()) {
            coro.wake = crate::frame::Wake::Signal(name);
        }
    }

    // Frame inspection (debugger)

    pub fn frame_locals(&self, fid: FrameId) -> Option<Vec<(Symbol, u16, bool)>> {
        let frame = self.frames.get(fid)?;
        let FrameBody::Code(def) = &frame.body else {
            return Some(Vec::new());
        };
        let mut out = Vec::new();
        for (i, p) in def.params.params.iter().enumerate() {
            out.push((p.name, i as u16, false));
        }
        collect_var_decls(&def.body, &mut out);
        Some(out)
    }

    pub fn frame_class(&self, fid: FrameId) -> Option<Symbol> {
        let frame = self.frames.get(fid)?;
        frame.owner_class.map(|c| self.brain.class(c).name)
    }

    pub(crate) fn instance(&self, id: InstanceId) -> &Instance {
        self.objs.get(id)
    }

    pub(crate) fn new_closure(&mut self, data: ClosureData) -> InstanceId {
        self.alloc(self.core.closure, InstanceData::Closure(Box::new(data)))
    }
}

fn collect_var_decls(code: &anima_ir::Code, out: &mut Vec<(Symbol, u16, bool)>) {
    for stmt in code {
        match stmt {
            anima_ir::Stmt::VarDecl(v) => out.push((v.name, v.slot, v.shared)),
            anima_ir::Stmt::If(i) => {
                for (_, c) in &i.branches {
                    collect_var_decls(c, out);
                }
                if let Some(c) = &i.else_code {
                    collect_var_decls(c, out);
                }
            }
            anima_ir::Stmt::While(w) => collect_var_decls(&w.body, out),
            _ => {}
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
