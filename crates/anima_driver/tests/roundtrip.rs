use std::fs;
use std::path::Path;

use anima_driver::{Driver, load_pack, pack_program};
use anima_runtime::{BufferHooks, Engine};
use anima_syntax::Symbol;

fn sym(s: &str) -> Symbol {
    Symbol::intern(s)
}

fn write_tree(root: &Path) {
    let guard = root.join("Actor").join("Guard");
    fs::create_dir_all(&guard).unwrap();
    fs::write(
        guard.join("!data.an"),
        "alerts\nstatic fleet_size: Integer\n",
    )
    .unwrap();
    fs::write(guard.join("!().an"), "() { alerts = 0 }").unwrap();
    fs::write(
        guard.join("alert().an"),
        "() { alerts = alerts + 1\n write(\"alert \", alerts) }",
    )
    .unwrap();
    fs::write(
        guard.join("_rounds().an"),
        "(pause: Real) { _wait(pause)\n write(\"round done\") }",
    )
    .unwrap();
    fs::write(guard.join("rally()C.an"), "() { write(\"rally!\") }").unwrap();

    let animal = root.join("Animal");
    let dog = animal.join("Dog");
    fs::create_dir_all(&dog).unwrap();
    fs::write(animal.join("speak().an"), "() { write(\"...\") }").unwrap();
    fs::write(dog.join("speak().an"), "() { write(\"Woof\") }").unwrap();
}

fn drive(engine: &mut Engine) -> String {
    let dog = engine.instantiate(sym("Dog"), vec![]).unwrap();
    let r = engine.invoke(dog, sym("speak"), vec![]).unwrap();
    engine.release(r);
    engine.release(dog);

    let guard_class = engine.brain().find_class(sym("Guard")).unwrap();
    let cref = engine.class_ref(guard_class);
    let r = engine.invoke(cref, sym("rally"), vec![]).unwrap();
    engine.release(r);

    let g = engine.spawn_actor(sym("Guard"), Some(sym("g1"))).unwrap();
    let r = engine.invoke(g, sym("alert"), vec![]).unwrap();
    engine.release(r);
    let pause = engine.new_real(1.0);
    engine.start_coroutine(g, sym("_rounds"), vec![pause]).unwrap();
    engine.update(0.5);
    engine.update(0.5);
    engine.destroy_actor(g);
    engine.release(g);
    engine.take_output()
}

#[test]
fn text_tree_loads_and_runs() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let mut engine = Engine::with_hooks(Box::new(BufferHooks::default()));
    let report = Driver::load_tree(&mut engine, dir.path()).unwrap();
    assert!(!report.has_errors(), "{:?} {:?}", report.errors, report.diagnostics);
    assert_eq!(report.classes, 3); // Guard, Animal, Dog (Actor pre-exists)
    assert_eq!(report.members, 6);
    assert_eq!(drive(&mut engine), "Woofrally!alert 1round done");
}

#[test]
fn packed_binary_evaluates_identically_to_compiled_source() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());

    let mut source_engine = Engine::with_hooks(Box::new(BufferHooks::default()));
    let report = Driver::load_tree(&mut source_engine, dir.path()).unwrap();
    assert!(!report.has_errors());
    let blob = pack_program(&source_engine);
    let source_output = drive(&mut source_engine);

    let mut packed_engine = Engine::with_hooks(Box::new(BufferHooks::default()));
    load_pack(&mut packed_engine, &blob).unwrap();
    let packed_output = drive(&mut packed_engine);

    assert_eq!(source_output, packed_output);
}

#[test]
fn pack_rejects_corrupt_input() {
    let mut engine = Engine::with_hooks(Box::new(BufferHooks::default()));
    assert!(load_pack(&mut engine, b"nope").is_err());

    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path());
    let mut source_engine = Engine::with_hooks(Box::new(BufferHooks::default()));
    Driver::load_tree(&mut source_engine, dir.path()).unwrap();
    let blob = pack_program(&source_engine);
    let mut fresh = Engine::with_hooks(Box::new(BufferHooks::default()));
    assert!(load_pack(&mut fresh, &blob[..blob.len() / 2]).is_err());
}

#[test]
fn bad_member_file_does_not_block_class_siblings() {
    let dir = tempfile::tempdir().unwrap();
    let cat = dir.path().join("Cat");
    fs::create_dir_all(&cat).unwrap();
    fs::write(cat.join("broken().an"), "((((").unwrap();
    fs::write(cat.join("fine().an"), "() { write(\"ok\") }").unwrap();

    let mut engine = Engine::with_hooks(Box::new(BufferHooks::default()));
    let report = Driver::load_tree(&mut engine, dir.path()).unwrap();
    assert!(report.has_errors());

    let cat = engine.instantiate(sym("Cat"), vec![]).unwrap();
    let r = engine.invoke(cat, sym("fine"), vec![]).unwrap();
    engine.release(r);
    assert_eq!(engine.take_output(), "ok");
    engine.release(cat);
}
