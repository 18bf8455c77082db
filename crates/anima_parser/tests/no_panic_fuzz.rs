use anima_parser::{MemberKind, NullScope, compile_member};
use anima_syntax::Symbol;
use proptest::prelude::*;

proptest! {
    // Arbitrary input may produce any number of diagnostics but never a
    // panic, and partial mode always yields a tree.
    #[test]
    fn member_parsing_never_panics(src in "\\PC{0,300}") {
        let _ = compile_member(
            &src,
            Symbol::intern("probe"),
            MemberKind::Method,
            Symbol::intern("Object"),
            &NullScope,
            false,
        );
        let (def, _) = compile_member(
            &src,
            Symbol::intern("probe"),
            MemberKind::Method,
            Symbol::intern("Object"),
            &NullScope,
            true,
        );
        prop_assert!(def.is_some());
    }

    #[test]
    fn token_soup_recovers_at_statement_boundaries(
        stmts in proptest::collection::vec("[a-z]{1,6}(\\([0-9]{0,3}\\))?", 1..8)
    ) {
        let body = stmts.join("\n ");
        let src = format!("() {{ {body} }}");
        let (def, diags) = compile_member(
            &src,
            Symbol::intern("probe"),
            MemberKind::Method,
            Symbol::intern("Object"),
            &NullScope,
            false,
        );
        // Well-formed call/ident statements bind against the permissive
        // scope without errors and keep their count.
        if diags.iter().all(|d| !d.is_error()) {
            prop_assert_eq!(def.unwrap().body.len(), stmts.len());
        }
    }
}
