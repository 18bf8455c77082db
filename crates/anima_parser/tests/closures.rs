use anima_parser::*;
use anima_syntax::Symbol;

fn coroutine(src: &str) -> (Option<MemberDef>, Vec<anima_syntax::Diagnostic>) {
    compile_member(
        src,
        Symbol::intern("_run"),
        MemberKind::Coroutine,
        Symbol::intern("Actor"),
        &NullScope,
        false,
    )
}

fn errors(diags: &[anima_syntax::Diagnostic]) -> usize {
    diags.iter().filter(|d| d.is_error()).count()
}

fn first_closure(def: &MemberDef) -> &ClosureLit {
    for stmt in &def.body {
        match stmt {
            Stmt::VarDecl(v) => {
                if let Expr::Closure(c) = &v.value {
                    return c;
                }
            }
            Stmt::Expr(Expr::Closure(c)) => return c,
            _ => {}
        }
    }
    panic!("no closure in member body");
}

#[test]
fn closure_captures_enclosing_local_by_value() {
    let (def, diags) = coroutine("() { var count = 3\n var f = fn () { write(count) } }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    let c = first_closure(&def);
    assert_eq!(c.captures.len(), 1);
    let cap = &c.captures[0];
    assert_eq!(cap.name, Symbol::intern("count"));
    assert_eq!(cap.outer_slot, 0);
    assert!(!cap.shared);
}

#[test]
fn shared_local_is_captured_by_reference() {
    let (def, diags) = coroutine("() { shared total = 0\n var f = fn () { total = total + 1 } }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    let c = first_closure(&def);
    assert_eq!(c.captures.len(), 1);
    assert!(c.captures[0].shared);
}

#[test]
fn nested_closures_thread_captures() {
    let (def, diags) =
        coroutine("() { var x = 1\n var f = fn () { var g = fn () { write(x) } } }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    let outer = first_closure(&def);
    // outer captured x to hand it to the inner closure
    assert_eq!(outer.captures.len(), 1);
    let inner = {
        let Stmt::VarDecl(v) = &outer.body[0] else {
            panic!()
        };
        let Expr::Closure(c) = &v.value else { panic!() };
        c
    };
    assert_eq!(inner.captures.len(), 1);
    assert_eq!(inner.captures[0].outer_slot, outer.captures[0].inner_slot);
}

#[test]
fn closure_params_shadow_enclosing_locals() {
    let (def, diags) = coroutine("() { var x = 1\n var f = fn (x) { write(x) } }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    let c = first_closure(&def);
    assert!(c.captures.is_empty());
}

#[test]
fn coroutine_closures_may_wait() {
    let (def, diags) = coroutine("() { var f = coro () { _wait(0.5) } }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    let c = first_closure(&def);
    assert!(c.is_coroutine);
}

#[test]
fn method_closures_may_not_wait() {
    let (_, diags) = coroutine("() { var f = fn () { _wait(0.5) } }");
    assert!(errors(&diags) > 0);
}

#[test]
fn branch_block_captures_like_a_closure() {
    let (def, diags) = coroutine("() { shared n = 0\n branch { n = 1 } }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    let Stmt::Branch(c) = &def.body[1] else { panic!() };
    assert_eq!(c.captures.len(), 1);
    assert!(c.captures[0].shared);
}
