//! Object: members every instance inherits, including the wait points.
use anima_ir::Expr;
use anima_syntax::Symbol;

use super::{defaulted, no_params, params, req, variadic};
use crate::engine::Engine;
use crate::errors::{RuntimeError, RuntimeErrorKind};
use crate::frame::FrameId;
use crate::instance::{InstanceData, InstanceId, NIL};
use crate::invokable::CoroNative;

pub(crate) fn register(engine: &mut Engine) {
    let object = Symbol::intern("Object");
    engine
        .bind_method(object, "write", params(vec![variadic("parts")]), mthd_write)
        .expect("bind Object.write");
    engine
        .bind_method(
            object,
            "write_line",
            params(vec![variadic("parts")]),
            mthd_write_line,
        )
        .expect("bind Object.write_line");
    engine
        .bind_method(object, "string", no_params(), mthd_string)
        .expect("bind Object.string");
    engine
        .bind_method(object, "class_name", no_params(), mthd_class_name)
        .expect("bind Object.class_name");
    engine
        .bind_method(object, "is_a", params(vec![req("class")]), mthd_is_a)
        .expect("bind Object.is_a");
    engine
        .bind_method(object, "same", params(vec![req("other")]), mthd_same)
        .expect("bind Object.same");
    engine
        .bind_method(object, "signal", params(vec![req("name")]), mthd_signal)
        .expect("bind Object.signal");
    engine
        .bind_coroutine(
            object,
            "_wait",
            params(vec![defaulted("seconds", Expr::Real(0.0))]),
            coro_wait,
        )
        .expect("bind Object._wait");
    engine
        .bind_coroutine(
            object,
            "_wait_signal",
            params(vec![req("name")]),
            coro_wait_signal,
        )
        .expect("bind Object._wait_signal");
}

fn write_parts(engine: &mut Engine, fid: FrameId, newline: bool) -> Result<InstanceId, RuntimeError> {
    let parts = engine.arg(fid, 0);
    let mut out = String::new();
    match &engine.instance(parts).data {
        InstanceData::List(items) => {
            let items = items.clone();
            for item in items {
                out.push_str(&engine.value_to_string(item));
            }
        }
        _ => out.push_str(&engine.value_to_string(parts)),
    }
    if newline {
        out.push('\n');
    }
    engine.write_print(&out);
    Ok(NIL)
}

fn mthd_write(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    write_parts(engine, fid, false)
}

fn mthd_write_line(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    write_parts(engine, fid, true)
}

fn mthd_string(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let s = engine.value_to_string(recv);
    Ok(engine.new_string(s))
}

fn mthd_class_name(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let class = engine.brain().class(engine.instance(recv).class).name;
    Ok(engine.new_symbol(class))
}

fn mthd_is_a(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let target = match &engine.instance(engine.arg(fid, 0)).data {
        InstanceData::ClassRef(c) => *c,
        _ => {
            return Err(RuntimeError::new(
                RuntimeErrorKind::ArgumentType,
                "is_a expects a class",
            ));
        }
    };
    let class = engine.instance(recv).class;
    let result = engine.brain().is_ancestor_of(target, class);
    Ok(engine.new_boolean(result))
}

fn mthd_same(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let other = engine.arg(fid, 0);
    Ok(engine.new_boolean(recv == other))
}

fn mthd_signal(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let name = engine.arg_sym(fid, 0)?;
    engine.raise_signal(recv, name);
    Ok(NIL)
}

/// `_wait(seconds)`: first step arms an elapsed-time wake (>=) on the
/// frame's mind; the resumption completes.
fn coro_wait(engine: &mut Engine, fid: FrameId) -> Result<CoroNative, RuntimeError> {
    if !engine.coroutine_first_run(fid) {
        return Ok(CoroNative::Complete(NIL));
    }
    let seconds = engine.arg_f32(fid, 0)?;
    engine.set_wake_time(fid, seconds);
    Ok(CoroNative::Suspend)
}

/// `_wait_signal(name)`: suspend until the named signal is raised on the
/// frame's mind.
fn coro_wait_signal(engine: &mut Engine, fid: FrameId) -> Result<CoroNative, RuntimeError> {
    if !engine.coroutine_first_run(fid) {
        return Ok(CoroNative::Complete(NIL));
    }
    let name = engine.arg_sym(fid, 0)?;
    engine.set_wake_signal(fid, name);
    Ok(CoroNative::Suspend)
}
