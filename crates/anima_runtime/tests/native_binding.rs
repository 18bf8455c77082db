mod common;

use anima_ir::{Param, ParamKind, Parameters};
use anima_runtime::{CoroNative, Engine, FrameId, InstanceId, RuntimeError};
use common::*;

fn one_param(name: &str) -> Parameters {
    Parameters {
        params: vec![Param {
            name: sym(name),
            ty: None,
            kind: ParamKind::Required,
        }]
        .into_boxed_slice(),
        return_ty: None,
    }
}

fn native_double(engine: &mut Engine, fid: FrameId) -> Result<InstanceId, RuntimeError> {
    let v = engine.arg_i64(fid, 0)?;
    Ok(engine.new_integer(v * 2))
}

// A host-side coroutine: waits one simulated second, then yields 99.
fn native_fetch(engine: &mut Engine, fid: FrameId) -> Result<CoroNative, RuntimeError> {
    if engine.coroutine_first_run(fid) {
        engine.set_wake_time(fid, 1.0);
        return Ok(CoroNative::Suspend);
    }
    let v = engine.new_integer(99);
    Ok(CoroNative::Complete(v))
}

#[test]
fn host_methods_bind_into_the_class_system() {
    let mut engine = engine();
    add_class(&mut engine, "Mathy", None);
    engine
        .bind_method(sym("Mathy"), "double", one_param("n"), native_double)
        .unwrap();
    load_method(&mut engine, "Mathy", "show", "() { write(double(21)) }");

    let m = engine.instantiate(sym("Mathy"), vec![]).unwrap();
    let r = call(&mut engine, m, "show");
    engine.release(r);
    assert_eq!(engine.take_output(), "42");
    engine.release(m);
}

#[test]
fn host_coroutines_participate_in_scheduling() {
    let mut engine = engine();
    add_class(&mut engine, "Fetcher", Some("Actor"));
    engine
        .bind_coroutine(sym("Fetcher"), "_fetch", Parameters::empty(), native_fetch)
        .unwrap();
    load_coroutine(
        &mut engine,
        "Fetcher",
        "_go",
        "() { var v = _fetch()\n write(v) }",
    );
    let f = engine.spawn_actor(sym("Fetcher"), Some(sym("f"))).unwrap();
    engine.start_coroutine(f, sym("_go"), vec![]).unwrap();
    engine.update(0.5);
    assert_eq!(engine.output(), "");
    engine.update(0.5);
    assert_eq!(engine.output(), "99");
    engine.release(f);
}

#[test]
fn host_globals_resolve_by_name() {
    let mut engine = engine();
    add_class(&mut engine, "Reader", None);
    let setting = engine.new_integer(7);
    engine.bind_global(sym("max_guards"), setting);
    load_method(&mut engine, "Reader", "show", "() { write(max_guards) }");

    let r = engine.instantiate(sym("Reader"), vec![]).unwrap();
    let v = call(&mut engine, r, "show");
    engine.release(v);
    assert_eq!(engine.take_output(), "7");
    engine.release(r);
}

#[test]
fn is_a_walks_the_ancestor_chain() {
    let mut engine = engine();
    add_class(&mut engine, "Animal", None);
    add_class(&mut engine, "Dog", Some("Animal"));
    load_method(
        &mut engine,
        "Dog",
        "check",
        "() { write(is_a(Animal), \" \", is_a(List)) }",
    );
    let d = engine.instantiate(sym("Dog"), vec![]).unwrap();
    let r = call(&mut engine, d, "check");
    engine.release(r);
    assert_eq!(engine.take_output(), "true false");
    engine.release(d);
}
