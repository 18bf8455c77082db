mod common;

use anima_ir::DataDef;
use anima_runtime::ClassError;
use common::*;

#[test]
fn override_dispatches_through_dynamic_class() {
    let mut engine = engine();
    add_class(&mut engine, "Animal", None);
    add_class(&mut engine, "Dog", Some("Animal"));
    load_method(&mut engine, "Animal", "speak", r#"() { write("...") }"#);
    load_method(&mut engine, "Dog", "speak", r#"() { write("Woof") }"#);

    // A Dog held as "some Animal" still speaks as a Dog: dispatch always
    // resolves through the receiver's dynamic class.
    let dog = engine.instantiate(sym("Dog"), vec![]).unwrap();
    let r = call(&mut engine, dog, "speak");
    engine.release(r);
    assert_eq!(engine.take_output(), "Woof");

    let animal = engine.instantiate(sym("Animal"), vec![]).unwrap();
    let r = call(&mut engine, animal, "speak");
    engine.release(r);
    assert_eq!(engine.take_output(), "...");
}

#[test]
fn inherited_members_resolve_through_ancestors() {
    let mut engine = engine();
    add_class(&mut engine, "Animal", None);
    add_class(&mut engine, "Dog", Some("Animal"));
    load_method(&mut engine, "Animal", "greet", r#"() { write("hi") }"#);

    let dog = engine.instantiate(sym("Dog"), vec![]).unwrap();
    let r = call(&mut engine, dog, "greet");
    engine.release(r);
    assert_eq!(engine.take_output(), "hi");
}

#[test]
fn instance_data_slots_work_through_constructor() {
    let mut engine = engine();
    add_class(&mut engine, "Counter", None);
    engine
        .add_instance_data(
            sym("Counter"),
            &DataDef {
                name: sym("count"),
                ty: None,
                is_class_data: false,
            },
        )
        .unwrap();
    load_method(&mut engine, "Counter", "!", r#"(start) { count = start }"#);
    load_method(&mut engine, "Counter", "bump", r#"() { count = count + 1 }"#);
    load_method(&mut engine, "Counter", "value", r#"() { return count }"#);

    let five = engine.new_integer(5);
    let c = engine.instantiate(sym("Counter"), vec![five]).unwrap();
    let r = call(&mut engine, c, "bump");
    engine.release(r);
    let r = call(&mut engine, c, "bump");
    engine.release(r);
    let v = call(&mut engine, c, "value");
    assert_eq!(engine.value_to_string(v), "7");
    engine.release(v);
    engine.release(c);
}

#[test]
fn subclass_slots_extend_inherited_layout() {
    let mut engine = engine();
    add_class(&mut engine, "Base", None);
    add_class(&mut engine, "Derived", Some("Base"));
    engine
        .add_instance_data(
            sym("Base"),
            &DataDef {
                name: sym("a"),
                ty: None,
                is_class_data: false,
            },
        )
        .unwrap();
    engine
        .add_instance_data(
            sym("Derived"),
            &DataDef {
                name: sym("b"),
                ty: None,
                is_class_data: false,
            },
        )
        .unwrap();
    load_method(&mut engine, "Derived", "fill", r#"() { a = 1; b = 2 }"#);
    load_method(&mut engine, "Derived", "show", r#"() { write(a, " ", b) }"#);

    let d = engine.instantiate(sym("Derived"), vec![]).unwrap();
    let r = call(&mut engine, d, "fill");
    engine.release(r);
    let r = call(&mut engine, d, "show");
    engine.release(r);
    assert_eq!(engine.take_output(), "1 2");
    engine.release(d);
}

#[test]
fn hot_patch_takes_effect_for_subsequent_dispatches() {
    let mut engine = engine();
    add_class(&mut engine, "Speaker", None);
    load_method(&mut engine, "Speaker", "talk", r#"() { write("old") }"#);

    let s = engine.instantiate(sym("Speaker"), vec![]).unwrap();
    let r = call(&mut engine, s, "talk");
    engine.release(r);
    assert_eq!(engine.take_output(), "old");

    // Replace the body on the live class; the existing instance sees the new
    // behavior without being recreated.
    load_method(&mut engine, "Speaker", "talk", r#"() { write("new") }"#);
    let r = call(&mut engine, s, "talk");
    engine.release(r);
    assert_eq!(engine.take_output(), "new");
    engine.release(s);
}

#[test]
fn layout_change_rejected_while_instances_live() {
    let mut engine = engine();
    add_class(&mut engine, "Locked", None);
    let inst = engine.instantiate(sym("Locked"), vec![]).unwrap();
    let err = engine
        .add_instance_data(
            sym("Locked"),
            &DataDef {
                name: sym("late"),
                ty: None,
                is_class_data: false,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ClassError::LayoutLocked(_)));
    engine.release(inst);
    // Once the instance is gone the layout unlocks.
    engine
        .add_instance_data(
            sym("Locked"),
            &DataDef {
                name: sym("late"),
                ty: None,
                is_class_data: false,
            },
        )
        .unwrap();
}

#[test]
fn cyclic_superclass_rejected_at_registration() {
    let mut engine = engine();
    add_class(&mut engine, "A", None);
    add_class(&mut engine, "B", Some("A"));
    add_class(&mut engine, "C", Some("B"));
    let err = engine.brain_mut().reparent(sym("A"), sym("C")).unwrap_err();
    assert!(matches!(err, ClassError::CyclicSuperclass(_)));
}

#[test]
fn class_data_is_shared_across_instances() {
    let mut engine = engine();
    add_class(&mut engine, "Tally", None);
    engine
        .add_class_data(
            sym("Tally"),
            &DataDef {
                name: sym("total"),
                ty: None,
                is_class_data: true,
            },
        )
        .unwrap();
    load_method(&mut engine, "Tally", "init", r#"() { total = 0 }"#);
    load_method(&mut engine, "Tally", "bump", r#"() { total = total + 1 }"#);
    load_method(&mut engine, "Tally", "show", r#"() { write(total) }"#);

    let a = engine.instantiate(sym("Tally"), vec![]).unwrap();
    let b = engine.instantiate(sym("Tally"), vec![]).unwrap();
    for (inst, m) in [(a, "init"), (a, "bump"), (b, "bump"), (a, "show")] {
        let r = call(&mut engine, inst, m);
        engine.release(r);
    }
    assert_eq!(engine.take_output(), "2");
    engine.release(a);
    engine.release(b);
}

#[test]
fn defaults_and_variadic_groups() {
    let mut engine = engine();
    add_class(&mut engine, "Caller", None);
    load_method(
        &mut engine,
        "Caller",
        "sum",
        r#"(a, b = 10, rest...) { write(a + b, " ", rest.length()) }"#,
    );
    load_method(&mut engine, "Caller", "one", r#"() { sum(1) }"#);
    load_method(&mut engine, "Caller", "many", r#"() { sum(1, 2, 3, 4) }"#);

    let c = engine.instantiate(sym("Caller"), vec![]).unwrap();
    let r = call(&mut engine, c, "one");
    engine.release(r);
    assert_eq!(engine.take_output(), "11 0");
    let r = call(&mut engine, c, "many");
    engine.release(r);
    assert_eq!(engine.take_output(), "3 2");
    engine.release(c);
}

#[test]
fn nil_receiver_dispatch_is_a_runtime_error() {
    let mut engine = engine();
    add_class(&mut engine, "Holder", None);
    load_method(&mut engine, "Holder", "poke", r#"() { var x = nil; x.speak() }"#);
    let h = engine.instantiate(sym("Holder"), vec![]).unwrap();
    let err = engine.invoke(h, sym("poke"), vec![]).unwrap_err();
    assert!(err.to_string().contains("nil"));
    engine.release(h);
}

#[test]
fn typed_class_subtype_checks_are_covariant() {
    let mut engine = engine();
    add_class(&mut engine, "Animal", None);
    add_class(&mut engine, "Dog", Some("Animal"));
    let brain = engine.brain();
    let list = brain.find_class(sym("List")).unwrap();
    let animal = brain.find_class(sym("Animal")).unwrap();
    let dog = brain.find_class(sym("Dog")).unwrap();

    use anima_runtime::{ClassSpec, TypedClassSpec};
    let list_of = |c| {
        ClassSpec::Typed(TypedClassSpec {
            class: list,
            params: vec![ClassSpec::Class(c)].into_boxed_slice(),
        })
    };
    assert!(brain.is_a(&list_of(dog), &list_of(animal)));
    assert!(!brain.is_a(&list_of(animal), &list_of(dog)));
    assert!(brain.is_a(&list_of(dog), &ClassSpec::Class(list)));
}
