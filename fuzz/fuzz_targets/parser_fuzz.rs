//! Fuzz test for the quill docblock parser
//!
//! Run with: cargo +nightly fuzz run parser_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_core::{Error, Target};
use quill_dsl::{Parser, SchemaRegistry};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let registry = SchemaRegistry::new();
        for target in [Target::CLASS, Target::METHOD] {
            match Parser::new(&registry).parse(input, target) {
                Ok(comment) => {
                    for (name, _) in comment.tags() {
                        assert!(!name.is_empty(), "Tag names should not be empty");
                    }
                }
                Err(Error::Syntax(err)) => {
                    assert!(err.line >= 1, "Error line should be >= 1");
                    assert!(err.column >= 1, "Error column should be >= 1");
                    assert!(!err.message.is_empty(), "Error message should not be empty");
                }
                Err(_) => {}
            }
        }
    }
});
