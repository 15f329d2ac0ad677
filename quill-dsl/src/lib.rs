//! quill DSL - docblock annotation parser
//!
//! Parses `@Name(key: value, ...)` tags embedded in documentation text into
//! schema-checked annotation instances.
//!
//! Architecture:
//! ```text
//! Docblock text
//!     ↓
//! Decoration strip + description split (parser)
//!     ↓
//! Lexer (tag section → tokens)
//!     ↓
//! TagParser (plain tags, type-tags, lists)
//!     ↓            ↑ schemas
//! Builder ← Checker ← SchemaRegistry ← TypeDeclaration / ReaderConfig
//!     ↓
//! Comment
//! ```

mod builder;
pub mod checker;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod resolve;

pub use checker::check_type;
pub use config::{from_toml_str, ReaderConfig};
pub use parser::{split_description, strip_decoration, Parser, TagParser};
pub use reader::{AnnotationReader, DocSource, Element, StaticDocs, Visibility};
pub use registry::builtins::{Attribute, Enum, Targets};
pub use registry::{
    ImportResolver, NameResolver, ResolvedType, SchemaRegistry, Scope, TypeDeclaration,
    DEFAULT_MARKER_TAG,
};
pub use resolve::{resolve_word, ListMode};

/// Parse `raw` with a fresh default registry.
///
/// Only plain tags and the built-in annotation types are understood.
pub fn parse(raw: &str, context: quill_core::Target) -> quill_core::QuillResult<quill_core::Comment> {
    let registry = SchemaRegistry::new();
    Parser::new(&registry).parse(raw, context)
}
