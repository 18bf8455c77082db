//! Parameter lists.
use anima_syntax::Symbol;

use crate::{Expr, TypeSpec};

#[derive(Clone, Debug, PartialEq)]
pub enum ParamKind {
    Required,
    /// Default expression, evaluated lazily per call when the argument is
    /// omitted.
    Defaulted(Expr),
    /// Trailing variadic group; extra arguments are collected into a List.
    Variadic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: Option<TypeSpec>,
    pub kind: ParamKind,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    pub params: Box<[Param]>,
    pub return_ty: Option<TypeSpec>,
}

impl Parameters {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn is_variadic(&self) -> bool {
        matches!(
            self.params.last(),
            Some(Param {
                kind: ParamKind::Variadic,
                ..
            })
        )
    }

    /// Number of arguments that must be supplied.
    pub fn arity_min(&self) -> usize {
        self.params
            .iter()
            .filter(|p| matches!(p.kind, ParamKind::Required))
            .count()
    }

    /// Maximum positional arguments, or `usize::MAX` with a variadic group.
    pub fn arity_max(&self) -> usize {
        if self.is_variadic() {
            usize::MAX
        } else {
            self.params.len()
        }
    }

    pub fn accepts(&self, argc: usize) -> bool {
        argc >= self.arity_min() && argc <= self.arity_max()
    }
}
