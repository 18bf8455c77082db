use anima_ir::MemberKind;
use anima_runtime::{BufferHooks, Engine, InstanceId};
use anima_syntax::Symbol;

pub fn engine() -> Engine {
    Engine::with_hooks(Box::new(BufferHooks::default()))
}

pub fn sym(s: &str) -> Symbol {
    Symbol::intern(s)
}

pub fn add_class(engine: &mut Engine, name: &str, superclass: Option<&str>) {
    engine
        .add_class(sym(name), superclass.map(sym))
        .expect("class registers");
}

pub fn load_method(engine: &mut Engine, class: &str, name: &str, source: &str) {
    let diags = engine
        .load_member(sym(class), sym(name), MemberKind::Method, source)
        .expect("member loads");
    assert!(
        diags.iter().all(|d| !d.is_error()),
        "method {class}.{name} diagnostics: {diags:?}"
    );
}

pub fn load_coroutine(engine: &mut Engine, class: &str, name: &str, source: &str) {
    let diags = engine
        .load_member(sym(class), sym(name), MemberKind::Coroutine, source)
        .expect("member loads");
    assert!(
        diags.iter().all(|d| !d.is_error()),
        "coroutine {class}.{name} diagnostics: {diags:?}"
    );
}

pub fn call(engine: &mut Engine, receiver: InstanceId, method: &str) -> InstanceId {
    engine
        .invoke(receiver, sym(method), vec![])
        .expect("invoke succeeds")
}
