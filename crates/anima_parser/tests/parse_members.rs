use anima_parser::*;
use anima_syntax::Symbol;

fn method(src: &str) -> (Option<MemberDef>, Vec<anima_syntax::Diagnostic>) {
    compile_member(
        src,
        Symbol::intern("greet"),
        MemberKind::Method,
        Symbol::intern("Actor"),
        &NullScope,
        false,
    )
}

fn coroutine(src: &str) -> (Option<MemberDef>, Vec<anima_syntax::Diagnostic>) {
    compile_member(
        src,
        Symbol::intern("_patrol"),
        MemberKind::Coroutine,
        Symbol::intern("Actor"),
        &NullScope,
        false,
    )
}

fn errors(diags: &[anima_syntax::Diagnostic]) -> usize {
    diags.iter().filter(|d| d.is_error()).count()
}

#[test]
fn parses_params_and_body() {
    let (def, diags) = method("(who: String, times: Integer = 1, rest...) { write(who) }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    assert_eq!(def.params.len(), 3);
    assert!(def.params.is_variadic());
    assert_eq!(def.params.arity_min(), 1);
    assert_eq!(def.body.len(), 1);
    // who, times, rest occupy the first three slots
    assert_eq!(def.locals_count, 3);
}

#[test]
fn defaulted_params_keep_their_expressions() {
    let (def, diags) = method("(n: Integer = 1 + 2) { write(n) }");
    assert_eq!(errors(&diags), 0);
    let def = def.unwrap();
    match &def.params.params[0].kind {
        ParamKind::Defaulted(Expr::Binary(_)) => {}
        other => panic!("expected defaulted binary expr, got {other:?}"),
    }
}

#[test]
fn variadic_must_be_last() {
    let (_, diags) = method("(rest..., tail) { }");
    assert!(errors(&diags) > 0);
}

#[test]
fn locals_get_distinct_slots_after_params() {
    let (def, diags) = method("(a) { var x = 1\n var y = 2\n write(x + y + a) }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    assert_eq!(def.locals_count, 3);
    let slots: Vec<u16> = def
        .body
        .iter()
        .filter_map(|s| match s {
            Stmt::VarDecl(v) => Some(v.slot),
            _ => None,
        })
        .collect();
    assert_eq!(slots, vec![1, 2]);
}

#[test]
fn one_bad_statement_does_not_eat_the_member() {
    let (def, diags) = method("() { var x = 1\n var 123 = 4\n write(x) }");
    assert!(errors(&diags) > 0);
    let def = def.unwrap();
    // bad statement degraded to Stmt::Error, following statement survived
    assert_eq!(def.body.len(), 3);
    assert!(matches!(def.body[1], Stmt::Error(_)));
    assert!(matches!(def.body[2], Stmt::Expr(Expr::Call(_))));
}

#[test]
fn diagnostics_carry_offsets() {
    let src = "() { var x = 1\n var 123 = 4\n write(x) }";
    let (_, diags) = method(src);
    let offending = diags.iter().find(|d| d.is_error()).unwrap();
    let off = offending.offset().expect("offset-tagged") as usize;
    assert!(src[off..].starts_with("123"));
}

#[test]
fn partial_mode_always_yields_a_tree() {
    let (def, diags) = compile_member(
        "this header is hopeless",
        Symbol::intern("broken"),
        MemberKind::Method,
        Symbol::intern("Actor"),
        &NullScope,
        true,
    );
    assert!(errors(&diags) > 0);
    assert!(def.is_some());
}

#[test]
fn full_mode_refuses_a_hopeless_header() {
    let (def, diags) = method("this header is hopeless");
    assert!(errors(&diags) > 0);
    assert!(def.is_none());
}

#[test]
fn coroutine_call_allowed_at_statement_level_in_coroutine() {
    let (def, diags) = coroutine("() { _wait(1.0)\n write(\"done\") }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    assert!(matches!(def.body[0], Stmt::Expr(Expr::CoroCall(_))));
}

#[test]
fn coroutine_call_rejected_in_method() {
    let (_, diags) = method("() { _wait(1.0) }");
    assert!(errors(&diags) > 0);
}

#[test]
fn coroutine_call_rejected_inside_expression() {
    let (_, diags) = coroutine("() { write(_fetch() + 1) }");
    assert!(errors(&diags) > 0);
}

#[test]
fn coroutine_result_assignment_is_allowed() {
    let (def, diags) = coroutine("() { var x = _fetch()\n write(x) }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    assert!(def.is_some());
}

#[test]
fn object_id_literals() {
    let (def, diags) = method("() { write(@player) }");
    assert_eq!(errors(&diags), 0);
    let def = def.unwrap();
    let Stmt::Expr(Expr::Call(call)) = &def.body[0] else {
        panic!()
    };
    assert!(matches!(call.args[0], Expr::ObjectId { .. }));
}

#[test]
fn constructor_call_shape() {
    let (def, diags) = method("() { var d = Dog!(3) }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    let def = def.unwrap();
    let Stmt::VarDecl(v) = &def.body[0] else { panic!() };
    let Expr::Call(call) = &v.value else { panic!() };
    assert_eq!(call.method, Symbol::intern("!"));
}

#[test]
fn branch_only_in_coroutines() {
    let (_, diags) = method("() { branch { write(\"x\") } }");
    assert!(errors(&diags) > 0);
    let (def, diags) = coroutine("() { branch { _wait(1.0) } }");
    assert_eq!(errors(&diags), 0, "{diags:?}");
    assert!(matches!(def.unwrap().body[0], Stmt::Branch(_)));
}

#[test]
fn precedence_and_grouping() {
    let (def, diags) = method("() { write(1 + 2 * 3 == 7 and not false) }");
    assert_eq!(errors(&diags), 0);
    let def = def.unwrap();
    let Stmt::Expr(Expr::Call(call)) = &def.body[0] else {
        panic!()
    };
    let Expr::Binary(and) = &call.args[0] else { panic!() };
    assert_eq!(and.op, BinaryOp::And);
}
