//! Type descriptors as written in source.
//!
//! These are the unresolved, name-based type forms the parser produces. The
//! runtime resolves them against the live class registry into class
//! descriptors; structural forms (typed containers, invokable signatures)
//! compare structurally there.
use anima_syntax::Symbol;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeSpec {
    /// A plain class by name, e.g. `Integer`.
    Named(Symbol),
    /// A container class with structural parameters, e.g. `List[Integer]`.
    Typed(Box<TypedSpec>),
    /// A closure signature, e.g. `(Integer, Real) -> Integer`.
    Invokable(Box<InvokableSig>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypedSpec {
    pub name: Symbol,
    pub params: Box<[TypeSpec]>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvokableSig {
    pub is_coroutine: bool,
    pub params: Box<[TypeSpec]>,
    pub return_ty: Option<TypeSpec>,
}

impl TypeSpec {
    pub fn name(&self) -> Symbol {
        match self {
            TypeSpec::Named(s) => *s,
            TypeSpec::Typed(t) => t.name,
            TypeSpec::Invokable(_) => Symbol::none(),
        }
    }

    /// Render the way it is written in source, for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TypeSpec::Named(s) => s.as_str(),
            TypeSpec::Typed(t) => {
                let inner: Vec<String> = t.params.iter().map(|p| p.describe()).collect();
                format!("{}[{}]", t.name, inner.join(", "))
            }
            TypeSpec::Invokable(sig) => {
                let inner: Vec<String> = sig.params.iter().map(|p| p.describe()).collect();
                let ret = sig
                    .return_ty
                    .as_ref()
                    .map(|r| format!(" -> {}", r.describe()))
                    .unwrap_or_default();
                let head = if sig.is_coroutine { "coro " } else { "" };
                format!("{}({}){}", head, inner.join(", "), ret)
            }
        }
    }
}
