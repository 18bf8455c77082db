use anima_lexer::Lexer;
use proptest::prelude::*;

proptest! {
    #[test]
    fn lexer_never_panics(src in "\\PC*") {
        let _ = Lexer::new(&src).lex();
    }

    #[test]
    fn tokens_cover_input_in_order(src in "[a-z0-9 ()\\[\\]{}+*/@.,;:'\"\\n-]{0,200}") {
        let res = Lexer::new(&src).lex();
        let mut last_end = 0u32;
        for t in &res.tokens {
            prop_assert!(t.span.start.0 >= last_end || t.span.start.0 == t.span.end.0);
            last_end = last_end.max(t.span.end.0);
        }
        prop_assert!(last_end as usize <= src.len());
    }
}
