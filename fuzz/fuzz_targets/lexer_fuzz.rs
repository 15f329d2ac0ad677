//! Fuzz test for the quill tag lexer
//!
//! Run with: cargo +nightly fuzz run lexer_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use quill_dsl::lexer::{Lexer, TokenKind};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let tokens = Lexer::new(input).tokenize();

        assert!(!tokens.is_empty(), "Tokenization should produce at least Eof");
        assert_eq!(
            tokens.last().map(|t| &t.kind),
            Some(&TokenKind::Eof),
            "Last token should always be Eof"
        );

        let mut previous_end = 0;
        for token in &tokens {
            assert!(token.span.start <= token.span.end, "Span start should be <= end");
            assert!(token.span.start >= previous_end, "Spans should not overlap");
            assert!(input.is_char_boundary(token.span.start));
            assert!(input.is_char_boundary(token.span.end));
            assert!(token.span.line >= 1, "Line numbers should be >= 1");
            assert!(token.span.column >= 1, "Column numbers should be >= 1");
            previous_end = token.span.end;
        }
    }
});
