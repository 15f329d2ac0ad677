//! Lexer module for quill tag sections

pub mod scanner;
pub mod token;

pub use scanner::*;
pub use token::*;
