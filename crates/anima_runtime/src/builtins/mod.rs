//! Core-class native members.
//!
//! Registered at engine bootstrap through the same binding interface a host
//! uses for its own classes.
mod actor;
mod common;
mod list;
mod number;
mod object;
mod string;

use anima_ir::{Expr, Param, ParamKind, Parameters};
use anima_syntax::Symbol;

use crate::engine::Engine;

pub(crate) fn register_all(engine: &mut Engine) {
    object::register(engine);
    number::register(engine);
    string::register(engine);
    list::register(engine);
    actor::register(engine);
}

pub(crate) fn req(name: &str) -> Param {
    Param {
        name: Symbol::intern(name),
        ty: None,
        kind: ParamKind::Required,
    }
}

pub(crate) fn defaulted(name: &str, value: Expr) -> Param {
    Param {
        name: Symbol::intern(name),
        ty: None,
        kind: ParamKind::Defaulted(value),
    }
}

pub(crate) fn variadic(name: &str) -> Param {
    Param {
        name: Symbol::intern(name),
        ty: None,
        kind: ParamKind::Variadic,
    }
}

pub(crate) fn params(list: Vec<Param>) -> Parameters {
    Parameters {
        params: list.into_boxed_slice(),
        return_ty: None,
    }
}

pub(crate) fn no_params() -> Parameters {
    Parameters::empty()
}
