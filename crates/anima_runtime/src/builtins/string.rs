//! String and Symbol members.
use anima_syntax::Symbol;

use super::{no_params, params, req};
use crate::engine::Engine;
use crate::errors::RuntimeError;
use crate::frame::FrameId;
use crate::instance::{InstanceData, InstanceId};

pub(crate) fn register(engine: &mut Engine) {
    let string = Symbol::intern("String");
    engine
        .bind_method(string, "length", no_params(), mthd_length)
        .expect("bind String.length");
    engine
        .bind_method(string, "uppercase", no_params(), mthd_uppercase)
        .expect("bind String.uppercase");
    engine
        .bind_method(string, "lowercase", no_params(), mthd_lowercase)
        .expect("bind String.lowercase");
    engine
        .bind_method(string, "contains", params(vec![req("part")]), mthd_contains)
        .expect("bind String.contains");
    engine
        .bind_method(string, "as_symbol", no_params(), mthd_as_symbol)
        .expect("bind String.as_symbol");
}

fn recv_str(engine: &Engine, fid: FrameId) -> String {
    match &engine.instance(engine.native_receiver(fid)).data {
        InstanceData::Str(s) => s.to_string(),
        _ => String::new(),
    }
}

fn mthd_length(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let s = recv_str(engine, fid);
    Ok(engine.new_integer(s.chars().count() as i64))
}

fn mthd_uppercase(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let s = recv_str(engine, fid);
    Ok(engine.new_string(s.to_uppercase()))
}

fn mthd_lowercase(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let s = recv_str(engine, fid);
    Ok(engine.new_string(s.to_lowercase()))
}

fn mthd_contains(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let s = recv_str(engine, fid);
    let part = engine.arg_str(fid, 0)?;
    Ok(engine.new_boolean(s.contains(&part)))
}

fn mthd_as_symbol(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let s = recv_str(engine, fid);
    let sym = Symbol::intern(&s);
    Ok(engine.new_symbol(sym))
}
