//! quill Core - Data Types
//!
//! Values, schemas, placement targets, host bindings and the parse result of
//! the quill docblock annotation language. Parsing and schema resolution live
//! in `quill-dsl`; this crate holds no parser state.

pub mod binding;
pub mod comment;
pub mod error;
pub mod instance;
pub mod schema;
pub mod target;
pub mod value;

pub use binding::{Accessor, Constructor, Factory, ParamSpec, TypeBinding};
pub use comment::Comment;
pub use error::{
    AnnotationError, CommentError, ConfigError, Error, QuillResult, SyntaxError,
};
pub use instance::{AnnotationObject, Instance, Record};
pub use schema::{AnnotationSchema, AttributeSpec, TypeDescriptor};
pub use target::Target;
pub use value::{ListEntry, Scalar, Value, ValueList};

// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
