//! Actor members: identity and explicit destruction.
use anima_syntax::Symbol;

use super::{no_params, params, req};
use crate::engine::Engine;
use crate::errors::RuntimeError;
use crate::frame::FrameId;
use crate::instance::{InstanceData, InstanceId, NIL};

pub(crate) fn register(engine: &mut Engine) {
    let actor = Symbol::intern("Actor");
    engine
        .bind_method(actor, "name", no_params(), mthd_name)
        .expect("bind Actor.name");
    engine
        .bind_method(actor, "destroy", no_params(), mthd_destroy)
        .expect("bind Actor.destroy");
    engine
        .bind_class_method(actor, "named", params(vec![req("name")]), mthdc_named)
        .expect("bind Actor.named");
}

fn mthd_name(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    let name = match &engine.instance(recv).data {
        InstanceData::Actor { name, .. } => *name,
        _ => Symbol::none(),
    };
    Ok(engine.new_symbol(name))
}

/// Terminates every coroutine rooted in the actor's mind and drops the
/// actor's identity. The instance itself is reclaimed when the last
/// reference goes away.
fn mthd_destroy(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let recv = engine.native_receiver(fid);
    engine.destroy_actor(recv);
    Ok(NIL)
}

/// Class method: look an actor up by its stable identity; nil when absent.
fn mthdc_named(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let name = engine.arg_sym(fid, 0)?;
    match engine.brain().actor_by_name(name) {
        Some(actor) => {
            engine.retain(actor);
            Ok(actor)
        }
        None => Ok(NIL),
    }
}
