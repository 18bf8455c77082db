//! List members. Lists are mutable; element slots hold owning references.
use anima_syntax::Symbol;

use super::{no_params, params, req};
use crate::engine::Engine;
use crate::errors::{RuntimeError, RuntimeErrorKind, messages};
use crate::frame::FrameId;
use crate::instance::{InstanceData, InstanceId, NIL};

pub(crate) fn register(engine: &mut Engine) {
    let list = Symbol::intern("List");
    engine
        .bind_method(list, "length", no_params(), mthd_length)
        .expect("bind List.length");
    engine
        .bind_method(list, "append", params(vec![req("item")]), mthd_append)
        .expect("bind List.append");
    engine
        .bind_method(list, "at", params(vec![req("index")]), mthd_at)
        .expect("bind List.at");
    engine
        .bind_method(
            list,
            "set_at",
            params(vec![req("index"), req("item")]),
            mthd_set_at,
        )
        .expect("bind List.set_at");
    engine
        .bind_method(list, "first", no_params(), mthd_first)
        .expect("bind List.first");
    engine
        .bind_method(list, "last", no_params(), mthd_last)
        .expect("bind List.last");
    engine
        .bind_method(list, "pop", no_params(), mthd_pop)
        .expect("bind List.pop");
}

fn index_error() -> RuntimeError {
    RuntimeError::new(
        RuntimeErrorKind::IndexOutOfRange,
        messages::INDEX_OUT_OF_RANGE,
    )
}

fn mthd_length(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let len = match &engine.instance(recv).data {
        InstanceData::List(items) => items.len() as i64,
        _ => 0,
    };
    Ok(engine.new_integer(len))
}

fn mthd_append(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let item = engine.arg(fid, 0);
    engine.retain(item);
    if let InstanceData::List(items) = &mut engine.objs.get_mut(recv).data {
        items.push(item);
    } else {
        engine.release(item);
    }
    Ok(NIL)
}

fn mthd_at(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let i = engine.arg_i64(fid, 0)?;
    let item = match &engine.instance(recv).data {
        InstanceData::List(items) => {
            if i < 0 || i as usize >= items.len() {
                return Err(index_error());
            }
            items[i as usize]
        }
        _ => return Err(index_error()),
    };
    engine.retain(item);
    Ok(item)
}

fn mthd_set_at(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let i = engine.arg_i64(fid, 0)?;
    let item = engine.arg(fid, 1);
    engine.retain(item);
    let old = {
        match &mut engine.objs.get_mut(recv).data {
            InstanceData::List(items) => {
                if i < 0 || i as usize >= items.len() {
                    None
                } else {
                    Some(std::mem::replace(&mut items[i as usize], item))
                }
            }
            _ => None,
        }
    };
    match old {
        Some(old) => {
            engine.release(old);
            Ok(NIL)
        }
        None => {
            engine.release(item);
            Err(index_error())
        }
    }
}

fn mthd_first(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let item = match &engine.instance(recv).data {
        InstanceData::List(items) => items.first().copied().unwrap_or(NIL),
        _ => NIL,
    };
    engine.retain(item);
    Ok(item)
}

fn mthd_last(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let item = match &engine.instance(recv).data {
        InstanceData::List(items) => items.last().copied().unwrap_or(NIL),
        _ => NIL,
    };
    engine.retain(item);
    Ok(item)
}

/// Removes and returns the last element; the element's reference transfers to
/// the caller.
fn mthd_pop(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let item = match &mut engine.objs.get_mut(recv).data {
        InstanceData::List(items) => items.pop(),
        _ => None,
    };
    Ok(item.unwrap_or(NIL))
}
