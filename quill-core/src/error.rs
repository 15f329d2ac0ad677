//! Error types for quill operations

use thiserror::Error;

/// Malformed tag syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// Source text around the offending token, when known.
    pub fragment: Option<String>,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
            fragment: None,
        }
    }

    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Syntax error at line {}, column {}: {}",
            self.line, self.column, self.message
        )?;
        if let Some(fragment) = &self.fragment {
            write!(f, " near `{}`", fragment)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {}

/// Schema, target and attribute contract violations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("{type_id} is not an annotation")]
    NotAnAnnotation { type_id: String },

    #[error("Unknown annotation type: {type_id}")]
    UnknownType { type_id: String },

    #[error("Annotation {type_id} can not be applied to {target}")]
    InvalidTarget { type_id: String, target: String },

    #[error("Unknown target name: {name}")]
    UnknownTargetName { name: String },

    #[error("Annotation {type_id} does not have an attribute called {name}")]
    UnknownAttribute { type_id: String, name: String },

    #[error("Annotation {type_id} does not have a default attribute")]
    NoDefaultAttribute { type_id: String },

    #[error("{}", missing_message(.names))]
    MissingAttributes { type_id: String, names: Vec<String> },

    #[error("Attribute {name} must be of type {expected}, {found} given")]
    TypeMismatch {
        name: String,
        expected: String,
        found: String,
    },

    #[error("Attribute {name} must have {expected} elements, {found} given")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Attribute {name} must be one of {}", .allowed.join(", "))]
    NotInEnum { name: String, allowed: Vec<String> },

    #[error("Unresolved identifier: {name}")]
    UnresolvedIdentifier { name: String },

    #[error("Tag @{name} inside a list must be an annotation with arguments")]
    NestedPlainTag { name: String },

    #[error("Annotation {type_id} has no setter or field for {name}")]
    NoAccessor { type_id: String, name: String },

    #[error("Invalid argument for {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("Annotation {type_id} references itself while its schema is resolved")]
    RecursiveSchema { type_id: String },

    #[error("{element} does not exist")]
    UnknownElement { element: String },
}

fn missing_message(names: &[String]) -> String {
    if names.len() == 1 {
        format!("Attribute {} is required", names[0])
    } else {
        format!("Attributes {} are required", names.join(", "))
    }
}

/// Lookup failures on a parsed [`Comment`](crate::Comment).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CommentError {
    #[error("Comment does not have @{tag} annotation.")]
    MissingTag { tag: String },

    #[error("Annotation not set with type {type_id}")]
    MissingAnnotationType { type_id: String },
}

/// Registry declaration and configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Inheritance cycle detected: {}", .chain.join(" -> "))]
    InheritanceCycle { chain: Vec<String> },

    #[error("Annotation type already declared: {type_id}")]
    DuplicateType { type_id: String },

    #[error("Constructor of {type_id} takes parameter {name} which is not an attribute")]
    UnknownConstructorParam { type_id: String, name: String },

    #[error("Invalid TOML: {reason}")]
    InvalidToml { reason: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all quill errors.
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("{0}")]
    Syntax(#[from] SyntaxError),

    #[error("Annotation error: {0}")]
    Annotation(#[from] AnnotationError),

    #[error("Comment error: {0}")]
    Comment(#[from] CommentError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for quill operations.
pub type QuillResult<T> = Result<T, Error>;

// =============================================================================
// TESTS
// =============================================================================
