//! Property-based tests for docblock parsing.

use proptest::prelude::*;
use quill_core::{Target, Value};
use quill_dsl::lexer::{tokenize, TokenKind};
use quill_dsl::{Parser, SchemaRegistry};
use quill_test_utils::generators::{
    arb_description, arb_plain_docblock, arb_plain_list, arb_tag_name, arb_target,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Text without tags parses to its trimmed description.
    #[test]
    fn prop_no_tags_round_trip(description in arb_description(), target in arb_target()) {
        let registry = SchemaRegistry::new();
        let source = format!("/**\n * {}\n */", description.replace('\n', "\n * "));
        let comment = Parser::new(&registry).parse(&source, target).unwrap();
        prop_assert_eq!(comment.description(), description.as_str());
        prop_assert_eq!(comment.tags().count(), 0);
        prop_assert_eq!(comment.annotations().count(), 0);
    }

    /// A tag followed only by whitespace is a flag.
    #[test]
    fn prop_bare_tag_is_flag(name in arb_tag_name(), padding in "[ \t]{0,4}") {
        let source = format!("/** @{}{} */", name, padding);
        let comment = quill_dsl::parse(&source, Target::CLASS).unwrap();
        prop_assert_eq!(comment.get(&name), Ok(&Value::Flag));
    }

    /// Plain tags come back in order, later duplicates overwriting earlier ones.
    #[test]
    fn prop_plain_docblocks((source, description, expected) in arb_plain_docblock()) {
        let comment = quill_dsl::parse(&source, Target::CLASS).unwrap();
        prop_assert_eq!(comment.description(), description.as_str());
        let found: Vec<(String, Value)> = comment
            .tags()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        prop_assert_eq!(found, expected);
    }

    /// Plain lists parse to the literals they were written from.
    #[test]
    fn prop_plain_lists((source, value) in arb_plain_list()) {
        let comment = quill_dsl::parse(&format!("@list{}", source), Target::CLASS).unwrap();
        prop_assert_eq!(comment.get("list"), Ok(&value));
    }

    /// The lexer never panics and always ends with Eof.
    #[test]
    fn prop_lexer_total(input in ".{0,200}") {
        let tokens = tokenize(&input);
        prop_assert_eq!(&tokens.last().map(|t| t.kind.clone()), &Some(TokenKind::Eof));
        for token in &tokens {
            prop_assert!(token.span.start <= token.span.end);
            prop_assert!(token.span.line >= 1);
        }
    }

    /// The parser returns a result for any input.
    #[test]
    fn prop_parser_total(input in "[ -~\n]{0,120}", target in arb_target()) {
        let registry = SchemaRegistry::new();
        let _ = Parser::new(&registry).parse(&input, target);
    }
}
