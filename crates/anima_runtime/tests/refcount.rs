mod common;

use common::*;

#[test]
fn count_matches_live_owning_slots() {
    let mut engine = engine();
    let n = engine.new_integer(7);
    assert_eq!(engine.refs_of(n), 1);

    // A list element is an owning slot.
    engine.retain(n);
    let list = engine.new_list(vec![n]);
    assert_eq!(engine.refs_of(n), 2);

    // Dropping the host reference leaves the list's.
    engine.release(n);
    assert_eq!(engine.refs_of(n), 1);

    // Destroying the list releases its elements; the instance is gone.
    engine.release(list);
    assert!(!engine.is_live(n));
}

#[test]
fn zero_count_returns_memory_to_the_pool() {
    let mut engine = engine();
    let before = engine.pool_stats();
    let a = engine.new_integer(1);
    engine.release(a);
    let b = engine.new_integer(2);
    let stats = engine.pool_stats();
    // Same-footprint destroy-then-allocate reuses the pooled slot.
    assert_eq!(stats.reuses, before.reuses + 1);
    assert_eq!(b.0, a.0, "slot is recycled");
    engine.release(b);
}

#[test]
fn argument_passing_hands_off_the_reference() {
    let mut engine = engine();
    add_class(&mut engine, "Taker", None);
    load_method(&mut engine, "Taker", "take", "(x) { write(x) }");
    let t = engine.instantiate(sym("Taker"), vec![]).unwrap();
    let arg = engine.new_integer(9);
    let live_before = engine.pool_stats().live;
    let r = engine.invoke(t, sym("take"), vec![arg]).unwrap();
    engine.release(r);
    // The argument's reference travelled into the frame and died with it.
    assert!(!engine.is_live(arg));
    assert_eq!(engine.pool_stats().live, live_before - 1);
    engine.release(t);
}

#[test]
fn frames_release_locals_on_return() {
    let mut engine = engine();
    add_class(&mut engine, "Scratch", None);
    load_method(
        &mut engine,
        "Scratch",
        "churn",
        "() { var a = [1, 2, 3]\n var b = \"text\"\n write(b) }",
    );
    let s = engine.instantiate(sym("Scratch"), vec![]).unwrap();
    let live_before = engine.pool_stats().live;
    let r = call(&mut engine, s, "churn");
    engine.release(r);
    assert_eq!(engine.pool_stats().live, live_before);
    assert_eq!(engine.live_frames(), 0);
    engine.release(s);
}

#[test]
fn instance_data_slots_own_their_values() {
    let mut engine = engine();
    add_class(&mut engine, "Box", None);
    engine
        .add_instance_data(
            sym("Box"),
            &anima_ir::DataDef {
                name: sym("held"),
                ty: None,
                is_class_data: false,
            },
        )
        .unwrap();
    load_method(&mut engine, "Box", "put", "(v) { held = v }");
    let b = engine.instantiate(sym("Box"), vec![]).unwrap();
    let v = engine.new_string("kept");
    engine.retain(v);
    let r = engine.invoke(b, sym("put"), vec![v]).unwrap();
    engine.release(r);
    // One host ref + one data-slot ref.
    assert_eq!(engine.refs_of(v), 2);
    engine.release(b);
    // Destroying the box released the slot.
    assert_eq!(engine.refs_of(v), 1);
    engine.release(v);
}

#[test]
fn actor_destroy_releases_coroutine_held_references() {
    let mut engine = engine();
    add_class(&mut engine, "Keeper", Some("Actor"));
    load_coroutine(&mut engine, "Keeper", "_hold", "(v) { _wait(100.0)\n write(v) }");
    let k = engine.spawn_actor(sym("Keeper"), Some(sym("k"))).unwrap();
    let v = engine.new_string("payload");
    engine.retain(v);
    engine.start_coroutine(k, sym("_hold"), vec![v]).unwrap();
    assert_eq!(engine.refs_of(v), 2, "frame local owns one reference");
    engine.destroy_actor(k);
    assert_eq!(engine.refs_of(v), 1, "termination released the frame's");
    engine.release(v);
    engine.release(k);
}
