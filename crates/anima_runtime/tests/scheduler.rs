mod common;

use common::*;

fn guard_engine() -> anima_runtime::Engine {
    let mut engine = engine();
    add_class(&mut engine, "Guard", Some("Actor"));
    engine
}

#[test]
fn wait_wakes_at_cumulative_elapsed_geq_threshold() {
    // Two coroutines with wait durations 1.0s and 2.0s, ticked with delta
    // 0.5s: the first resumes on tick 2, the second on tick 4.
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_short",
        "() { _wait(1.0)\n write(\"short\") }",
    );
    load_coroutine(
        &mut engine,
        "Guard",
        "_long",
        "() { _wait(2.0)\n write(\"long\") }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_short"), vec![]).unwrap();
    engine.start_coroutine(g, sym("_long"), vec![]).unwrap();

    engine.update(0.5);
    assert_eq!(engine.output(), "");
    engine.update(0.5);
    assert_eq!(engine.output(), "short");
    engine.update(0.5);
    assert_eq!(engine.output(), "short");
    engine.update(0.5);
    assert_eq!(engine.output(), "shortlong");
    engine.release(g);
}

#[test]
fn coroutine_started_mid_tick_measures_from_its_start() {
    // Started after the clock has already advanced half a second, a 1.0s
    // wait arms at 1.5s and therefore wakes on tick 3, not tick 2.
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_report",
        "() { _wait(1.0)\n write(\"done\") }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.update(0.5);
    engine.start_coroutine(g, sym("_report"), vec![]).unwrap();

    engine.update(0.5);
    assert_eq!(engine.output(), "");
    engine.update(0.5);
    assert_eq!(engine.output(), "done");
    // Exactly once: further ticks must not re-run the write.
    engine.update(0.5);
    engine.update(0.5);
    assert_eq!(engine.output(), "done");
    engine.release(g);
}

#[test]
fn equal_due_times_resume_in_invocation_order() {
    let mut engine = guard_engine();
    load_coroutine(&mut engine, "Guard", "_a", "() { _wait(1.0)\n write(\"a\") }");
    load_coroutine(&mut engine, "Guard", "_b", "() { _wait(1.0)\n write(\"b\") }");
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_a"), vec![]).unwrap();
    engine.start_coroutine(g, sym("_b"), vec![]).unwrap();
    engine.update(1.0);
    assert_eq!(engine.output(), "ab");
    engine.release(g);
}

#[test]
fn methods_complete_within_the_invoking_tick() {
    // A body with no wait points runs to completion synchronously.
    let mut engine = guard_engine();
    load_method(
        &mut engine,
        "Guard",
        "chatter",
        "() { var i = 0\n while i < 3 { write(i)\n i = i + 1 } }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    let r = call(&mut engine, g, "chatter");
    engine.release(r);
    assert_eq!(engine.take_output(), "012");
    assert_eq!(engine.live_frames(), 0);
    engine.release(g);
}

#[test]
fn waits_inside_loops_resume_in_place() {
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_beat",
        "() { var i = 0\n while i < 3 { _wait(1.0)\n write(i)\n i = i + 1 } }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_beat"), vec![]).unwrap();
    for _ in 0..6 {
        engine.update(0.5);
    }
    assert_eq!(engine.output(), "012");
    assert_eq!(engine.live_frames(), 0);
    engine.release(g);
}

#[test]
fn waits_inside_conditionals_resume_in_place() {
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_pick",
        "(fast) { if fast { _wait(0.5)\n write(\"f\") } else { _wait(1.5)\n write(\"s\") } }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    let t = engine.new_boolean(true);
    engine.start_coroutine(g, sym("_pick"), vec![t]).unwrap();
    let f = engine.new_boolean(false);
    engine.start_coroutine(g, sym("_pick"), vec![f]).unwrap();
    engine.update(0.5);
    assert_eq!(engine.output(), "f");
    engine.update(0.5);
    engine.update(0.5);
    assert_eq!(engine.output(), "fs");
    engine.release(g);
}

#[test]
fn sub_coroutine_completion_wakes_the_awaiting_parent() {
    let mut engine = guard_engine();
    load_coroutine(&mut engine, "Guard", "_inner", "() { _wait(1.0)\n return 42 }");
    load_coroutine(
        &mut engine,
        "Guard",
        "_outer",
        "() { var got = _inner()\n write(got) }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_outer"), vec![]).unwrap();
    engine.update(0.5);
    assert_eq!(engine.output(), "");
    // The child completes at 1.0s and its awaiting parent resumes within the
    // same update pass.
    engine.update(0.5);
    assert_eq!(engine.output(), "42");
    assert_eq!(engine.live_frames(), 0);
    engine.release(g);
}

#[test]
fn signals_wake_waiting_coroutines() {
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_listen",
        "() { _wait_signal('go')\n write(\"went\") }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_listen"), vec![]).unwrap();
    engine.update(0.5);
    engine.update(0.5);
    assert_eq!(engine.output(), "");
    engine.raise_signal(g, sym("go"));
    engine.update(0.5);
    assert_eq!(engine.output(), "went");
    engine.release(g);
}

#[test]
fn branch_spawns_detached_work_on_the_same_mind() {
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_split",
        "() { shared n = 0\n branch { _wait(1.0)\n n = n + 1 }\n _wait(2.0)\n write(n) }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_split"), vec![]).unwrap();
    for _ in 0..4 {
        engine.update(0.5);
    }
    // The branch bumped the shared cell at 1.0s; the parent read it at 2.0s.
    assert_eq!(engine.output(), "1");
    assert_eq!(engine.live_frames(), 0);
    engine.release(g);
}

#[test]
fn destroying_an_actor_terminates_every_coroutine_in_its_mind() {
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_forever",
        "() { branch { _wait(100.0)\n write(\"never\") }\n var x = _wait(50.0)\n write(\"also never\") }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_forever"), vec![]).unwrap();
    engine.update(0.5);
    assert!(engine.live_frames() > 0);

    engine.destroy_actor(g);
    assert_eq!(engine.live_frames(), 0, "no frames may survive the mind");
    // Ticking on produces nothing: nothing was orphaned.
    for _ in 0..300 {
        engine.update(0.5);
    }
    assert_eq!(engine.output(), "");
    engine.release(g);
}

#[test]
fn terminate_severs_a_suspended_coroutine() {
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_slow",
        "() { _wait(10.0)\n write(\"late\") }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    let fid = engine
        .start_coroutine(g, sym("_slow"), vec![])
        .unwrap()
        .expect("suspended");
    engine.terminate_coroutine(fid);
    assert_eq!(engine.live_frames(), 0);
    for _ in 0..30 {
        engine.update(1.0);
    }
    assert_eq!(engine.output(), "");
    engine.release(g);
}

#[test]
fn runtime_error_in_a_coroutine_terminates_it_and_ticking_continues() {
    let mut engine = guard_engine();
    load_coroutine(
        &mut engine,
        "Guard",
        "_bad",
        "() { _wait(1.0)\n write(1 / 0) }",
    );
    load_coroutine(
        &mut engine,
        "Guard",
        "_good",
        "() { _wait(2.0)\n write(\"ok\") }",
    );
    let g = engine.spawn_actor(sym("Guard"), Some(sym("g"))).unwrap();
    engine.start_coroutine(g, sym("_bad"), vec![]).unwrap();
    engine.start_coroutine(g, sym("_good"), vec![]).unwrap();
    for _ in 0..4 {
        engine.update(0.5);
    }
    assert_eq!(engine.output(), "ok");
    let errors = engine.take_errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].to_string().contains("Division by zero"));
    engine.release(g);
}
