//! Bind pass.
//!
//! Resolves every identifier the parser left unresolved against the lexical
//! scope chain (local → parameter → instance-data → class-data → global),
//! assigns frame slots, computes closure capture lists, restricts coroutine
//! call placement and emits bind-time type diagnostics. After a successful
//! bind the tree contains no `UNRESOLVED_SLOT` reads.
use anima_ir::{
    Capture, ClosureLit, Code, Expr, MemberDef, MemberKind, ParamKind, Parameters, Place, Stmt,
    TypeSpec,
};
use anima_syntax::{Diagnostic, DiagnosticKind, Symbol, codes};

use crate::stmt::UNRESOLVED_SLOT;

/// What the binder can see of the live class registry. The runtime's Brain
/// implements this; tooling that binds without a registry uses [`NullScope`].
pub trait ClassScope {
    /// Instance-data slot index of `name` on `class` (own + inherited).
    fn instance_data_index(&self, class: Symbol, name: Symbol) -> Option<u16>;
    /// Owning class of a class-data member visible from `class`.
    fn class_data_owner(&self, class: Symbol, name: Symbol) -> Option<Symbol>;
    /// Is `name` a registered class?
    fn class_exists(&self, name: Symbol) -> bool;
    /// Is `name` a host-registered named global?
    fn global_exists(&self, name: Symbol) -> bool;
    /// Known (min, max) arity for a member of `class`, when loaded.
    fn member_arity(&self, class: Symbol, name: Symbol) -> Option<(usize, usize)>;
    /// Is `from` assignable to `to`? Defaults to permissive: unknown types
    /// never block loading.
    fn assignable(&self, _from: &TypeSpec, _to: &TypeSpec) -> bool {
        true
    }
}

/// Scope that knows nothing; every non-local resolves as a global read and no
/// type checks fire.
pub struct NullScope;

impl ClassScope for NullScope {
    fn instance_data_index(&self, _class: Symbol, _name: Symbol) -> Option<u16> {
        None
    }
    fn class_data_owner(&self, _class: Symbol, _name: Symbol) -> Option<Symbol> {
        None
    }
    fn class_exists(&self, _name: Symbol) -> bool {
        false
    }
    fn global_exists(&self, _name: Symbol) -> bool {
        true
    }
    fn member_arity(&self, _class: Symbol, _name: Symbol) -> Option<(usize, usize)> {
        None
    }
}

struct LocalBind {
    name: Symbol,
    slot: u16,
    shared: bool,
}

struct FrameScope {
    locals: Vec<LocalBind>,
    next_slot: u16,
    max_slot: u16,
    captures: Vec<Capture>,
    /// Stack of lexical scope marks into `locals`.
    marks: Vec<usize>,
    is_coroutine: bool,
}

impl FrameScope {
    fn new(is_coroutine: bool) -> Self {
        Self {
            locals: Vec::with_capacity(8),
            next_slot: 0,
            max_slot: 0,
            captures: Vec::new(),
            marks: Vec::new(),
            is_coroutine,
        }
    }

    fn alloc_slot(&mut self) -> u16 {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.max_slot = self.max_slot.max(self.next_slot);
        slot
    }

    fn declare(&mut self, name: Symbol, shared: bool) -> u16 {
        let slot = self.alloc_slot();
        self.locals.push(LocalBind { name, slot, shared });
        slot
    }

    fn find(&self, name: Symbol) -> Option<(u16, bool)> {
        self.locals
            .iter()
            .rev()
            .find(|l| l.name == name)
            .map(|l| (l.slot, l.shared))
    }
}

pub struct Binder<'c> {
    ctx: &'c dyn ClassScope,
    class: Symbol,
    frames: Vec<FrameScope>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Bind a parsed member in place. Returns the collected diagnostics; the
/// member is usable iff none of them are errors.
pub fn bind_member(
    def: &mut MemberDef,
    class: Symbol,
    ctx: &dyn ClassScope,
) -> Vec<Diagnostic> {
    let mut binder = Binder {
        ctx,
        class,
        frames: Vec::with_capacity(2),
        diagnostics: Vec::new(),
    };
    let is_coroutine = matches!(def.kind, MemberKind::Coroutine);
    binder.frames.push(FrameScope::new(is_coroutine));
    binder.declare_params(&mut def.params);
    binder.bind_code(&mut def.body);
    let frame = binder.frames.pop().expect("member frame");
    def.locals_count = frame.max_slot;
    binder.diagnostics
}

/// Bind a standalone expression against the locals of a live frame (debugger
/// eval). Coroutine calls are rejected; the expression must complete within
/// one step.
pub fn bind_frame_expr(
    expr: &mut Expr,
    locals: &[(Symbol, u16, bool)],
    class: Symbol,
    ctx: &dyn ClassScope,
) -> Vec<Diagnostic> {
    let mut binder = Binder {
        ctx,
        class,
        frames: Vec::with_capacity(1),
        diagnostics: Vec::new(),
    };
    let mut frame = FrameScope::new(false);
    for &(name, slot, shared) in locals {
        frame.locals.push(LocalBind { name, slot, shared });
        frame.next_slot = frame.next_slot.max(slot + 1);
        frame.max_slot = frame.next_slot;
    }
    binder.frames.push(frame);
    binder.bind_expr(expr, false);
    binder.diagnostics
}

impl<'c> Binder<'c> {
    fn declare_params(&mut self, params: &mut Parameters) {
        // Parameters occupy the leading frame slots in declaration order.
        // Default expressions are bound in the callee scope: a default may
        // read parameters declared before it.
        for p in params.params.iter() {
            let frame = self.frames.last_mut().expect("frame");
            frame.declare(p.name, false);
        }
        for p in params.params.iter_mut() {
            if let ParamKind::Defaulted(e) = &mut p.kind {
                self.bind_expr(e, false);
            }
        }
    }

    fn in_coroutine(&self) -> bool {
        self.frames.last().map(|f| f.is_coroutine).unwrap_or(false)
    }

    fn bind_code(&mut self, code: &mut Code) {
        let mark = {
            let frame = self.frames.last_mut().expect("frame");
            frame.marks.push(frame.locals.len());
            frame.locals.len()
        };
        for stmt in code.iter_mut() {
            self.bind_stmt(stmt);
        }
        let frame = self.frames.last_mut().expect("frame");
        frame.marks.pop();
        // Names fall out of scope at block exit; their slots stay reserved so
        // a saved coroutine cursor can never alias two live locals.
        frame.locals.truncate(mark);
    }

    fn bind_stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Expr(e) => self.bind_expr(e, true),
            Stmt::VarDecl(v) => {
                self.bind_expr(&mut v.value, true);
                let frame = self.frames.last_mut().expect("frame");
                let scope_start = frame.marks.last().copied().unwrap_or(0);
                if frame.locals[scope_start..]
                    .iter()
                    .any(|l| l.name == v.name)
                {
                    self.diagnostics.push(
                        Diagnostic::error_kind(DiagnosticKind::DuplicateLocal(v.name.as_str()), None),
                    );
                }
                let frame = self.frames.last_mut().expect("frame");
                v.slot = frame.declare(v.name, v.shared);
                if let (Some(ty), Some(actual)) = (&v.ty, static_type_of(&v.value)) {
                    if !self.ctx.assignable(&actual, ty) {
                        self.diagnostics.push(
                            Diagnostic::error_kind(
                                DiagnosticKind::TypeMismatch {
                                    expected: ty.describe(),
                                    actual: actual.describe(),
                                },
                                None,
                            )
                            .with_code(codes::TYPE_MISMATCH),
                        );
                    }
                }
            }
            Stmt::Assign(a) => {
                self.bind_expr(&mut a.value, true);
                self.bind_place(&mut a.target);
            }
            Stmt::If(i) => {
                for (cond, code) in i.branches.iter_mut() {
                    self.bind_expr(cond, false);
                    self.bind_code(code);
                }
                if let Some(code) = &mut i.else_code {
                    self.bind_code(code);
                }
            }
            Stmt::While(w) => {
                self.bind_expr(&mut w.cond, false);
                self.bind_code(&mut w.body);
            }
            Stmt::Branch(c) => {
                if !self.in_coroutine() {
                    self.diagnostics.push(Diagnostic::error_kind(
                        DiagnosticKind::BranchOutsideCoroutine,
                        None,
                    ));
                }
                self.bind_closure(c);
            }
            Stmt::Return(e) => {
                if let Some(e) = e {
                    self.bind_expr(e, false);
                }
            }
            Stmt::Break | Stmt::Continue | Stmt::Error(_) => {}
        }
    }

    fn bind_place(&mut self, place: &mut Place) {
        let Place::Local { name, slot, .. } = place else {
            return;
        };
        if *slot != UNRESOLVED_SLOT {
            return;
        }
        let name = *name;
        if let Some((slot, shared)) = self.resolve_local(name) {
            *place = Place::Local { name, slot, shared };
            return;
        }
        if let Some(index) = self.ctx.instance_data_index(self.class, name) {
            *place = Place::MemberData { name, index };
            return;
        }
        if let Some(owner) = self.ctx.class_data_owner(self.class, name) {
            *place = Place::ClassData {
                class: owner,
                name,
            };
            return;
        }
        self.diagnostics.push(
            Diagnostic::error_kind(DiagnosticKind::UndefinedIdentifier(name.as_str()), None)
                .with_code(codes::UNDEFINED_IDENTIFIER),
        );
    }

    fn bind_expr(&mut self, expr: &mut Expr, top: bool) {
        match expr {
            Expr::Nil
            | Expr::Bool(_)
            | Expr::Int(_)
            | Expr::Real(_)
            | Expr::Str(_)
            | Expr::Sym(_)
            | Expr::This
            | Expr::MemberData { .. }
            | Expr::ClassData { .. }
            | Expr::Global(_)
            | Expr::ObjectId { .. }
            | Expr::Error(_) => {}
            Expr::Local { name, slot, .. } => {
                if *slot != UNRESOLVED_SLOT {
                    return;
                }
                let name = *name;
                if let Some((slot, shared)) = self.resolve_local(name) {
                    *expr = Expr::Local { name, slot, shared };
                    return;
                }
                if let Some(index) = self.ctx.instance_data_index(self.class, name) {
                    *expr = Expr::MemberData { name, index };
                    return;
                }
                if let Some(owner) = self.ctx.class_data_owner(self.class, name) {
                    *expr = Expr::ClassData {
                        class: owner,
                        name,
                    };
                    return;
                }
                if self.ctx.class_exists(name) || self.ctx.global_exists(name) {
                    *expr = Expr::Global(name);
                    return;
                }
                self.diagnostics.push(
                    Diagnostic::error_kind(
                        DiagnosticKind::UndefinedIdentifier(name.as_str()),
                        None,
                    )
                    .with_code(codes::UNDEFINED_IDENTIFIER),
                );
            }
            Expr::List(items) => {
                for item in items.iter_mut() {
                    self.bind_expr(item, false);
                }
            }
            Expr::Closure(c) => self.bind_closure(c),
            Expr::Call(c) => {
                // `f(1)` where `f` is a local closure reads as `f.call(1)`.
                if c.receiver.is_none() {
                    if let Some((slot, shared)) = self.resolve_local(c.method) {
                        c.receiver = Some(Expr::Local {
                            name: c.method,
                            slot,
                            shared,
                        });
                        c.method = Symbol::intern("call");
                    }
                }
                if let Some(recv) = &mut c.receiver {
                    self.bind_expr(recv, false);
                }
                for a in c.args.iter_mut() {
                    self.bind_expr(a, false);
                }
                self.check_arity(&c.receiver, c.method, c.args.len(), c.span);
            }
            Expr::CoroCall(c) => {
                if !top {
                    self.diagnostics.push(
                        Diagnostic::error_kind(
                            DiagnosticKind::CoroutineCallPlacement,
                            Some(c.span),
                        )
                        .with_code(codes::COROUTINE_PLACEMENT),
                    );
                }
                if !self.in_coroutine() {
                    self.diagnostics.push(
                        Diagnostic::error_kind(
                            DiagnosticKind::CoroutineCallInMethod,
                            Some(c.span),
                        )
                        .with_code(codes::COROUTINE_PLACEMENT),
                    );
                }
                if let Some(recv) = &mut c.receiver {
                    self.bind_expr(recv, false);
                }
                for a in c.args.iter_mut() {
                    self.bind_expr(a, false);
                }
                self.check_arity(&c.receiver, c.coroutine, c.args.len(), c.span);
            }
            Expr::Unary(u) => self.bind_expr(&mut u.expr, false),
            Expr::Binary(b) => {
                self.bind_expr(&mut b.left, false);
                self.bind_expr(&mut b.right, false);
            }
        }
    }

    fn bind_closure(&mut self, c: &mut ClosureLit) {
        self.frames.push(FrameScope::new(c.is_coroutine));
        self.declare_params(&mut c.params);
        self.bind_code(&mut c.body);
        let frame = self.frames.pop().expect("closure frame");
        c.captures = frame.captures.into_boxed_slice();
        c.locals_count = frame.max_slot;
    }

    /// Walk the frame stack innermost-out. A hit in an enclosing frame
    /// creates capture entries down the chain so nested closures each carry
    /// the value (or the shared cell) themselves.
    fn resolve_local(&mut self, name: Symbol) -> Option<(u16, bool)> {
        let depth = self.frames.len();
        if depth == 0 {
            return None;
        }
        if let Some(hit) = self.frames[depth - 1].find(name) {
            return Some(hit);
        }
        // Already captured into the innermost frame?
        if let Some(cap) = self.frames[depth - 1]
            .captures
            .iter()
            .find(|cap| cap.name == name)
        {
            return Some((cap.inner_slot, cap.shared));
        }
        let mut found: Option<(usize, u16, bool)> = None;
        for idx in (0..depth - 1).rev() {
            if let Some((slot, shared)) = self.frames[idx].find(name) {
                found = Some((idx, slot, shared));
                break;
            }
            if let Some(cap) = self.frames[idx].captures.iter().find(|cap| cap.name == name) {
                found = Some((idx, cap.inner_slot, cap.shared));
                break;
            }
        }
        let (mut frame_idx, mut outer_slot, shared) = found?;
        // Thread the capture through every intermediate closure frame.
        while frame_idx + 1 < depth {
            let inner = &mut self.frames[frame_idx + 1];
            let inner_slot = inner.alloc_slot();
            inner.captures.push(Capture {
                name,
                outer_slot,
                inner_slot,
                shared,
            });
            outer_slot = inner_slot;
            frame_idx += 1;
        }
        Some((outer_slot, shared))
    }

    fn check_arity(
        &mut self,
        receiver: &Option<Expr>,
        name: Symbol,
        argc: usize,
        span: anima_syntax::Span,
    ) {
        // Only checkable when the receiver's class is statically known: the
        // implicit receiver (current class) or a class reference.
        let class = match receiver {
            None => self.class,
            Some(Expr::Global(g)) if self.ctx.class_exists(*g) => *g,
            _ => return,
        };
        if class.is_none() {
            return;
        }
        if let Some((min, max)) = self.ctx.member_arity(class, name) {
            if argc < min || argc > max {
                self.diagnostics.push(
                    Diagnostic::error_kind(
                        DiagnosticKind::ArgumentCountMismatch {
                            name: name.as_str(),
                            expected_min: min,
                            expected_max: max,
                            actual: argc,
                        },
                        Some(span),
                    )
                    .with_code(codes::ARGUMENT_COUNT_MISMATCH),
                );
            }
        }
    }
}

/// Static type of an expression where it is knowable without evaluation.
/// Literals only; everything else is dynamic.
pub fn static_type_of(expr: &Expr) -> Option<TypeSpec> {
    let name = match expr {
        Expr::Bool(_) => "Boolean",
        Expr::Int(_) => "Integer",
        Expr::Real(_) => "Real",
        Expr::Str(_) => "String",
        Expr::Sym(_) => "Symbol",
        Expr::List(_) => "List",
        Expr::Closure(_) => "Closure",
        _ => return None,
    };
    Some(TypeSpec::Named(Symbol::intern(name)))
}
