//! The global class registry.
//!
//! Single source of truth for the hierarchy, keyed by Symbol and mutable at
//! runtime (hot reload). Created at engine startup, torn down with it;
//! classes live for the embedding's lifetime. There is no internal locking:
//! hosts that share a brain across threads synchronize outside the core.
use anima_ir::{DataDef, TypeSpec};
use anima_syntax::Symbol;
use hashbrown::HashMap;
use ahash::RandomState;

use crate::class::{Class, ClassId, ClassSpec, DataSlot, InvokableClassSpec, TypedClassSpec};
use crate::errors::ClassError;
use crate::instance::{InstanceId, NIL};
use crate::invokable::Invokable;

type FastHashMap<K, V> = HashMap<K, V, RandomState>;

fn fast_map_new<K: Eq + std::hash::Hash, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(RandomState::with_seeds(0, 0, 0, 0))
}

pub struct Brain {
    classes: Vec<Class>,
    by_name: FastHashMap<Symbol, ClassId>,
    /// Host-registered named globals (owning references).
    globals: FastHashMap<Symbol, InstanceId>,
    /// Named actors for object-id resolution. Weak: destruction removes the
    /// entry, it never keeps an actor alive.
    actors: FastHashMap<Symbol, InstanceId>,
}

impl Brain {
    pub fn new() -> Self {
        Self {
            classes: Vec::with_capacity(64),
            by_name: fast_map_new(),
            globals: fast_map_new(),
            actors: fast_map_new(),
        }
    }

    // Registration

    pub fn register_class(
        &mut self,
        name: Symbol,
        superclass: Option<Symbol>,
    ) -> Result<ClassId, ClassError> {
        if self.by_name.contains_key(&name) {
            return Err(ClassError::DuplicateClass(name));
        }
        let super_id = match superclass {
            Some(s) => Some(
                self.find_class(s)
                    .ok_or(ClassError::UnknownSuperclass(s))?,
            ),
            None => None,
        };
        let id = ClassId(self.classes.len() as u32);
        let mut class = Class::new(name, super_id);
        if let Some(sid) = super_id {
            let sup = self.class(sid);
            class.slot_base = sup.slot_total();
            class.is_actor = sup.is_actor;
        }
        self.classes.push(class);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Move a live class under a new superclass (hot reload). Rejected when
    /// it would create a cycle or disturb the layout under live instances.
    pub fn reparent(&mut self, class: Symbol, new_super: Symbol) -> Result<(), ClassError> {
        let cid = self.find_class(class).ok_or(ClassError::UnknownClass(class))?;
        let sid = self
            .find_class(new_super)
            .ok_or(ClassError::UnknownSuperclass(new_super))?;
        // Walk up from the new superclass; finding `cid` there means a cycle.
        let mut cur = Some(sid);
        while let Some(c) = cur {
            if c == cid {
                return Err(ClassError::CyclicSuperclass(class));
            }
            cur = self.class(c).superclass;
        }
        if self.subtree_live_instances(cid) > 0 {
            return Err(ClassError::LayoutLocked(class));
        }
        let new_base = self.class(sid).slot_total();
        {
            let row = &mut self.classes[cid.0 as usize];
            row.superclass = Some(sid);
            row.slot_base = new_base;
        }
        self.reindex_subtree(cid);
        Ok(())
    }

    /// Declare an instance-data member. Rejected while instances of the class
    /// or any subclass are live: layout migration is explicitly unsupported.
    pub fn add_instance_data(
        &mut self,
        class: Symbol,
        def: &DataDef,
    ) -> Result<u16, ClassError> {
        let cid = self.find_class(class).ok_or(ClassError::UnknownClass(class))?;
        if self.subtree_live_instances(cid) > 0 {
            return Err(ClassError::LayoutLocked(class));
        }
        let row = &mut self.classes[cid.0 as usize];
        if row.own_data.contains_key(&def.name) {
            return Err(ClassError::DuplicateData(def.name));
        }
        let index = row.slot_total();
        row.own_data.insert(
            def.name,
            DataSlot {
                name: def.name,
                ty: def.ty.clone(),
                index,
            },
        );
        self.reindex_subtree(cid);
        Ok(index)
    }

    pub fn add_class_data(&mut self, class: Symbol, def: &DataDef) -> Result<(), ClassError> {
        let cid = self.find_class(class).ok_or(ClassError::UnknownClass(class))?;
        let row = &mut self.classes[cid.0 as usize];
        if row.class_data.contains_key(&def.name) {
            return Err(ClassError::DuplicateData(def.name));
        }
        let index = row.class_data.len() as u16;
        row.class_data.insert(
            def.name,
            DataSlot {
                name: def.name,
                ty: def.ty.clone(),
                index,
            },
        );
        row.class_data_values.push(NIL);
        Ok(())
    }

    fn reindex_subtree(&mut self, root: ClassId) {
        // Slot bases of subclasses follow their superclass totals; walk the
        // whole table since the tree has no child links.
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.classes.len() {
                if let Some(sup) = self.classes[i].superclass {
                    if self.is_ancestor_of(root, ClassId(i as u32)) || ClassId(i as u32) == root {
                        let base = self.classes[sup.0 as usize].slot_total();
                        if self.classes[i].slot_base != base {
                            self.classes[i].slot_base = base;
                            changed = true;
                        }
                    }
                }
            }
        }
    }

    // Lookup

    pub fn find_class(&self, name: Symbol) -> Option<ClassId> {
        self.by_name.get(&name).copied()
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.classes[id.0 as usize]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.classes[id.0 as usize]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn class_ids(&self) -> impl Iterator<Item = ClassId> + '_ {
        (0..self.classes.len()).map(|i| ClassId(i as u32))
    }

    /// Is `ancestor` on `class`'s superclass chain (inclusive)?
    pub fn is_ancestor_of(&self, ancestor: ClassId, class: ClassId) -> bool {
        let mut cur = Some(class);
        while let Some(c) = cur {
            if c == ancestor {
                return true;
            }
            cur = self.class(c).superclass;
        }
        false
    }

    /// Member resolution order: receiver's dynamic class, then ancestors;
    /// first match wins (no ambiguity on a single chain).
    pub fn find_method(&self, class: ClassId, name: Symbol) -> Option<(ClassId, &Invokable)> {
        let mut cur = Some(class);
        while let Some(c) = cur {
            let row = self.class(c);
            if let Some(inv) = row.methods.get(&name) {
                return Some((c, inv));
            }
            cur = row.superclass;
        }
        None
    }

    pub fn find_coroutine(&self, class: ClassId, name: Symbol) -> Option<(ClassId, &Invokable)> {
        let mut cur = Some(class);
        while let Some(c) = cur {
            let row = self.class(c);
            if let Some(inv) = row.coroutines.get(&name) {
                return Some((c, inv));
            }
            cur = row.superclass;
        }
        None
    }

    pub fn find_class_method(&self, class: ClassId, name: Symbol) -> Option<(ClassId, &Invokable)> {
        let mut cur = Some(class);
        while let Some(c) = cur {
            let row = self.class(c);
            if let Some(inv) = row.class_methods.get(&name) {
                return Some((c, inv));
            }
            cur = row.superclass;
        }
        None
    }

    /// Instance-data slot of `name` visible from `class` (own or inherited).
    pub fn find_data_slot(&self, class: ClassId, name: Symbol) -> Option<&DataSlot> {
        let mut cur = Some(class);
        while let Some(c) = cur {
            let row = self.class(c);
            if let Some(slot) = row.own_data.get(&name) {
                return Some(slot);
            }
            cur = row.superclass;
        }
        None
    }

    pub fn find_class_data(&self, class: ClassId, name: Symbol) -> Option<(ClassId, u16)> {
        let mut cur = Some(class);
        while let Some(c) = cur {
            let row = self.class(c);
            if let Some(slot) = row.class_data.get(&name) {
                return Some((c, slot.index));
            }
            cur = row.superclass;
        }
        None
    }

    /// Install or replace a method/coroutine implementation on a live class.
    /// Takes effect for all subsequent dispatches; frames already running the
    /// old body keep their snapshot.
    pub fn hot_patch(&mut self, class: ClassId, inv: Invokable) {
        let row = self.class_mut(class);
        match inv.table() {
            crate::invokable::MemberTable::Methods => {
                row.methods.insert(inv.name, inv);
            }
            crate::invokable::MemberTable::Coroutines => {
                row.coroutines.insert(inv.name, inv);
            }
            crate::invokable::MemberTable::ClassMethods => {
                row.class_methods.insert(inv.name, inv);
            }
        }
    }

    pub fn live_instances(&self, class: ClassId) -> u32 {
        self.class(class).live_instances
    }

    pub fn subtree_live_instances(&self, class: ClassId) -> u32 {
        let mut total = 0;
        for i in 0..self.classes.len() {
            let cid = ClassId(i as u32);
            if self.is_ancestor_of(class, cid) {
                total += self.classes[i].live_instances;
            }
        }
        total
    }

    // Type descriptors

    /// Resolve a source-level type spec against the registry.
    pub fn resolve_spec(&self, ty: &TypeSpec) -> Option<ClassSpec> {
        match ty {
            TypeSpec::Named(name) => self.find_class(*name).map(ClassSpec::Class),
            TypeSpec::Typed(t) => {
                let class = self.find_class(t.name)?;
                let mut params = Vec::with_capacity(t.params.len());
                for p in &t.params {
                    params.push(self.resolve_spec(p)?);
                }
                Some(ClassSpec::Typed(TypedClassSpec {
                    class,
                    params: params.into_boxed_slice(),
                }))
            }
            TypeSpec::Invokable(sig) => {
                let mut params = Vec::with_capacity(sig.params.len());
                for p in &sig.params {
                    params.push(self.resolve_spec(p)?);
                }
                let return_spec = match &sig.return_ty {
                    Some(r) => Some(Box::new(self.resolve_spec(r)?)),
                    None => None,
                };
                Some(ClassSpec::Invokable(InvokableClassSpec {
                    is_coroutine: sig.is_coroutine,
                    params: params.into_boxed_slice(),
                    return_spec,
                }))
            }
        }
    }

    /// Subtype check over descriptors. Plain classes use the ancestor chain;
    /// typed classes compare covariantly parameter-by-parameter; invokable
    /// specs match on shape.
    pub fn is_a(&self, a: &ClassSpec, b: &ClassSpec) -> bool {
        match (a, b) {
            (ClassSpec::Class(ca), ClassSpec::Class(cb)) => self.is_ancestor_of(*cb, *ca),
            (ClassSpec::Typed(ta), ClassSpec::Class(cb)) => self.is_ancestor_of(*cb, ta.class),
            (ClassSpec::Typed(ta), ClassSpec::Typed(tb)) => {
                self.is_ancestor_of(tb.class, ta.class)
                    && ta.params.len() == tb.params.len()
                    && ta
                        .params
                        .iter()
                        .zip(tb.params.iter())
                        .all(|(pa, pb)| self.is_a(pa, pb))
            }
            (ClassSpec::Invokable(sa), ClassSpec::Invokable(sb)) => {
                sa.is_coroutine == sb.is_coroutine
                    && sa.params.len() == sb.params.len()
                    && sa
                        .params
                        .iter()
                        .zip(sb.params.iter())
                        // Parameters compare contravariantly.
                        .all(|(pa, pb)| self.is_a(pb, pa))
                    && match (&sa.return_spec, &sb.return_spec) {
                        (_, None) => true,
                        (Some(ra), Some(rb)) => self.is_a(ra, rb),
                        (None, Some(_)) => false,
                    }
            }
            _ => false,
        }
    }

    // Globals and actors

    pub fn bind_global(&mut self, name: Symbol, value: InstanceId) -> Option<InstanceId> {
        self.globals.insert(name, value)
    }

    pub fn global(&self, name: Symbol) -> Option<InstanceId> {
        self.globals.get(&name).copied()
    }

    pub fn globals(&self) -> impl Iterator<Item = (Symbol, InstanceId)> + '_ {
        self.globals.iter().map(|(k, v)| (*k, *v))
    }

    pub fn register_actor(&mut self, name: Symbol, id: InstanceId) {
        self.actors.insert(name, id);
    }

    pub fn unregister_actor(&mut self, name: Symbol) {
        self.actors.remove(&name);
    }

    pub fn actor_by_name(&self, name: Symbol) -> Option<InstanceId> {
        self.actors.get(&name).copied()
    }
}

impl Default for Brain {
    fn default() -> Self {
        Self::new()
    }
}

// The binder resolves identifiers against the live registry.
impl anima_parser::ClassScope for Brain {
    fn instance_data_index(&self, class: Symbol, name: Symbol) -> Option<u16> {
        let cid = self.find_class(class)?;
        self.find_data_slot(cid, name).map(|s| s.index)
    }

    fn class_data_owner(&self, class: Symbol, name: Symbol) -> Option<Symbol> {
        let cid = self.find_class(class)?;
        self.find_class_data(cid, name)
            .map(|(owner, _)| self.class(owner).name)
    }

    fn class_exists(&self, name: Symbol) -> bool {
        self.find_class(name).is_some()
    }

    fn global_exists(&self, name: Symbol) -> bool {
        self.globals.contains_key(&name)
    }

    fn member_arity(&self, class: Symbol, name: Symbol) -> Option<(usize, usize)> {
        let cid = self.find_class(class)?;
        let inv = self
            .find_method(cid, name)
            .or_else(|| self.find_coroutine(cid, name))
            .or_else(|| self.find_class_method(cid, name))
            .map(|(_, inv)| inv)?;
        Some((inv.params.arity_min(), inv.params.arity_max()))
    }

    fn assignable(&self, from: &TypeSpec, to: &TypeSpec) -> bool {
        // Unknown names never block loading; classes may not be registered yet.
        let (Some(a), Some(b)) = (self.resolve_spec(from), self.resolve_spec(to)) else {
            return true;
        };
        self.is_a(&a, &b)
    }
}
