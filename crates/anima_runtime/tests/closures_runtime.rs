mod common;

use common::*;

#[test]
fn closures_capture_locals_by_value_at_creation_time() {
    let mut engine = engine();
    add_class(&mut engine, "Maker", None);
    load_method(
        &mut engine,
        "Maker",
        "make",
        "() { var x = 1\n var f = fn () { return x }\n x = 2\n return f.call() }",
    );
    let m = engine.instantiate(sym("Maker"), vec![]).unwrap();
    let v = call(&mut engine, m, "make");
    // The capture copied x when the closure was created; the later x = 2
    // never reached it.
    assert_eq!(engine.value_to_string(v), "1");
    engine.release(v);
    engine.release(m);
}

#[test]
fn shared_locals_are_captured_by_reference() {
    let mut engine = engine();
    add_class(&mut engine, "Maker", None);
    load_method(
        &mut engine,
        "Maker",
        "make",
        "() { shared x = 1\n var f = fn () { return x }\n x = 2\n return f.call() }",
    );
    let m = engine.instantiate(sym("Maker"), vec![]).unwrap();
    let v = call(&mut engine, m, "make");
    assert_eq!(engine.value_to_string(v), "2");
    engine.release(v);
    engine.release(m);
}

#[test]
fn escaping_closure_keeps_its_shared_cell_alive() {
    let mut engine = engine();
    add_class(&mut engine, "Maker", None);
    load_method(
        &mut engine,
        "Maker",
        "counter",
        "() { shared count = 0\n return fn () { count = count + 1\n return count } }",
    );
    let m = engine.instantiate(sym("Maker"), vec![]).unwrap();
    let f = call(&mut engine, m, "counter");
    // The creating frame is long gone; the cell lives on in the closure.
    let a = engine.invoke(f, sym("call"), vec![]).unwrap();
    let b = engine.invoke(f, sym("call"), vec![]).unwrap();
    assert_eq!(engine.value_to_string(a), "1");
    assert_eq!(engine.value_to_string(b), "2");
    engine.release(a);
    engine.release(b);
    engine.release(f);
    engine.release(m);
}

#[test]
fn closure_parameters_and_local_call_sugar() {
    let mut engine = engine();
    add_class(&mut engine, "Maker", None);
    load_method(
        &mut engine,
        "Maker",
        "apply",
        "() { var twice = fn (n) { return n * 2 }\n return twice(21) }",
    );
    let m = engine.instantiate(sym("Maker"), vec![]).unwrap();
    let v = call(&mut engine, m, "apply");
    assert_eq!(engine.value_to_string(v), "42");
    engine.release(v);
    engine.release(m);
}

#[test]
fn coroutine_closures_suspend_when_invoked() {
    let mut engine = engine();
    add_class(&mut engine, "Host", Some("Actor"));
    load_coroutine(
        &mut engine,
        "Host",
        "_run",
        "() { var f = coro () { _wait(1.0)\n write(\"closure done\") }\n f._invoke() }",
    );
    let h = engine.spawn_actor(sym("Host"), Some(sym("h"))).unwrap();
    engine.start_coroutine(h, sym("_run"), vec![]).unwrap();
    engine.update(0.5);
    assert_eq!(engine.output(), "");
    engine.update(0.5);
    assert_eq!(engine.output(), "closure done");
    assert_eq!(engine.live_frames(), 0);
    engine.release(h);
}

#[test]
fn object_id_literals_resolve_lazily_to_named_actors() {
    let mut engine = engine();
    add_class(&mut engine, "Watcher", None);
    add_class(&mut engine, "Target", Some("Actor"));
    // Loads before the actor exists; the literal resolves at evaluation.
    load_method(&mut engine, "Watcher", "peek", "() { write(@rex.name()) }");
    let w = engine.instantiate(sym("Watcher"), vec![]).unwrap();
    assert!(engine.invoke(w, sym("peek"), vec![]).is_err());
    engine.take_errors();

    let rex = engine.spawn_actor(sym("Target"), Some(sym("rex"))).unwrap();
    let r = call(&mut engine, w, "peek");
    engine.release(r);
    assert_eq!(engine.take_output(), "'rex'");
    engine.release(rex);
    engine.release(w);
}

#[test]
fn script_constructed_actors_take_a_symbol_identity() {
    let mut engine = engine();
    add_class(&mut engine, "Pet", Some("Actor"));
    add_class(&mut engine, "Shelter", None);
    load_method(
        &mut engine,
        "Shelter",
        "adopt",
        "() { var p = Pet!('fido')\n write(p.name()) }",
    );
    let s = engine.instantiate(sym("Shelter"), vec![]).unwrap();
    let r = call(&mut engine, s, "adopt");
    engine.release(r);
    assert_eq!(engine.take_output(), "'fido'");
    engine.release(s);
}
