//! Integer and Real members.
use anima_syntax::Symbol;

use super::{no_params, params, req};
use crate::engine::Engine;
use crate::errors::RuntimeError;
use crate::frame::FrameId;
use crate::instance::{InstanceData, InstanceId};

pub(crate) fn register(engine: &mut Engine) {
    let integer = Symbol::intern("Integer");
    engine
        .bind_method(integer, "abs", no_params(), mthd_int_abs)
        .expect("bind Integer.abs");
    engine
        .bind_method(integer, "min", params(vec![req("other")]), mthd_int_min)
        .expect("bind Integer.min");
    engine
        .bind_method(integer, "max", params(vec![req("other")]), mthd_int_max)
        .expect("bind Integer.max");

    let real = Symbol::intern("Real");
    engine
        .bind_method(real, "abs", no_params(), mthd_real_abs)
        .expect("bind Real.abs");
    engine
        .bind_method(real, "floor", no_params(), mthd_real_floor)
        .expect("bind Real.floor");
    engine
        .bind_method(real, "ceiling", no_params(), mthd_real_ceiling)
        .expect("bind Real.ceiling");
    engine
        .bind_method(real, "round", no_params(), mthd_real_round)
        .expect("bind Real.round");
}

fn recv_i64(engine: &Engine, fid: FrameId) -> i64 {
    match &engine.instance(engine.native_receiver(fid)).data {
        InstanceData::Integer(v) => *v,
        _ => 0,
    }
}

fn recv_f32(engine: &Engine, fid: FrameId) -> f32 {
    match &engine.instance(engine.native_receiver(fid)).data {
        InstanceData::Real(v) => *v,
        _ => 0.0,
    }
}

fn mthd_int_abs(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = recv_i64(engine, fid);
    Ok(engine.new_integer(v.abs()))
}

fn mthd_int_min(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = recv_i64(engine, fid);
    let o = engine.arg_i64(fid, 0)?;
    Ok(engine.new_integer(v.min(o)))
}

fn mthd_int_max(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = recv_i64(engine, fid);
    let o = engine.arg_i64(fid, 0)?;
    Ok(engine.new_integer(v.max(o)))
}

fn mthd_real_abs(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = recv_f32(engine, fid);
    Ok(engine.new_real(v.abs()))
}

fn mthd_real_floor(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = recv_f32(engine, fid);
    Ok(engine.new_integer(v.floor() as i64))
}

fn mthd_real_ceiling(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = recv_f32(engine, fid);
    Ok(engine.new_integer(v.ceil() as i64))
}

fn mthd_real_round(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = recv_f32(engine, fid);
    Ok(engine.new_integer(v.round() as i64))
}
