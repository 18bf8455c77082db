//! Class descriptors.
//!
//! A class is a node in the single-inheritance tree with ordered instance-data
//! slots (own + inherited), method/coroutine tables and class-level (static)
//! data and methods, all keyed by Symbol. The variants a type descriptor can
//! take are an explicit tagged enum plus an explicit ancestor walk, which
//! keeps class data reloadable without touching dispatch.
use anima_ir::TypeSpec;
use anima_syntax::Symbol;
use indexmap::IndexMap;

use crate::instance::InstanceId;
use crate::invokable::Invokable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassId(pub u32);

/// A declared instance-data slot.
#[derive(Clone, Debug)]
pub struct DataSlot {
    pub name: Symbol,
    pub ty: Option<TypeSpec>,
    /// Absolute slot index (inherited slots first).
    pub index: u16,
}

pub struct Class {
    pub name: Symbol,
    pub superclass: Option<ClassId>,
    /// Own instance-data members in declaration order.
    pub own_data: IndexMap<Symbol, DataSlot>,
    /// Inherited slot count; own slots start here.
    pub slot_base: u16,
    pub methods: IndexMap<Symbol, Invokable>,
    pub coroutines: IndexMap<Symbol, Invokable>,
    pub class_methods: IndexMap<Symbol, Invokable>,
    /// Class-level (static) data; values owned by the class row.
    pub class_data: IndexMap<Symbol, DataSlot>,
    pub class_data_values: Vec<InstanceId>,
    /// Live instances of exactly this class; guards layout changes.
    pub live_instances: u32,
    /// Inherits from the Actor core class.
    pub is_actor: bool,
}

impl Class {
    pub fn new(name: Symbol, superclass: Option<ClassId>) -> Self {
        Self {
            name,
            superclass,
            own_data: IndexMap::new(),
            slot_base: 0,
            methods: IndexMap::new(),
            coroutines: IndexMap::new(),
            class_methods: IndexMap::new(),
            class_data: IndexMap::new(),
            class_data_values: Vec::new(),
            live_instances: 0,
            is_actor: false,
        }
    }

    /// Total instance-data slot count (inherited + own).
    pub fn slot_total(&self) -> u16 {
        self.slot_base + self.own_data.len() as u16
    }
}

/// Polymorphic type descriptor: a plain class, a structurally-parameterized
/// container class, or a closure signature.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassSpec {
    Class(ClassId),
    Typed(TypedClassSpec),
    Invokable(InvokableClassSpec),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TypedClassSpec {
    pub class: ClassId,
    pub params: Box<[ClassSpec]>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct InvokableClassSpec {
    pub is_coroutine: bool,
    pub params: Box<[ClassSpec]>,
    pub return_spec: Option<Box<ClassSpec>>,
}

impl ClassSpec {
    pub fn base_class(&self) -> Option<ClassId> {
        match self {
            ClassSpec::Class(c) => Some(*c),
            ClassSpec::Typed(t) => Some(t.class),
            ClassSpec::Invokable(_) => None,
        }
    }
}
