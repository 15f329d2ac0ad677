//! Value resolver chain for bare list items

use crate::registry::{SchemaRegistry, Scope};
use once_cell::sync::Lazy;
use quill_core::{AnnotationError, Scalar, Value};
use regex::Regex;

static NUMERIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .expect("Invalid numeric regex")
});

static PLAIN_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid plain word regex")
});

/// Whether `text` is a numeric literal (sign, fraction and exponent allowed).
pub fn is_numeric(text: &str) -> bool {
    NUMERIC.is_match(text.trim())
}

/// Outcome of one resolver step: resolved, or pass the word on.
type Step = Option<Value>;

/// Keywords `true`, `false` and `null`.
pub fn keyword(word: &str) -> Step {
    match word {
        "true" => Some(Value::from(true)),
        "false" => Some(Value::from(false)),
        "null" => Some(Value::null()),
        _ => None,
    }
}

/// All digits and fits `i64` gives an integer; any other numeric form a float.
pub fn numeric(word: &str) -> Step {
    if !word.is_empty() && word.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = word.parse::<i64>() {
            return Some(Value::Scalar(Scalar::Integer(i)));
        }
    }
    if NUMERIC.is_match(word) {
        return word.parse::<f64>().ok().map(|x| Value::Scalar(Scalar::Float(x)));
    }
    None
}

/// How bare words of a list are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Arguments of a type-tag: constants and type names are looked up.
    Arguments,
    /// Lists of a plain tag: plain words stay strings.
    Plain,
}

/// Why a word did not resolve.
#[derive(Debug, Clone, PartialEq)]
pub enum Unresolved {
    /// Not valid syntax in this position.
    Syntax(String),
    Annotation(AnnotationError),
}

/// Resolve a bare word through the chain of `mode`.
pub fn resolve_word(
    word: &str,
    mode: ListMode,
    registry: &SchemaRegistry,
    scope: &Scope,
) -> Result<Value, Unresolved> {
    if let Some(value) = keyword(word).or_else(|| numeric(word)) {
        return Ok(value);
    }
    if word.contains(['\'', '"']) {
        return Err(Unresolved::Syntax("Unterminated string".to_string()));
    }

    match mode {
        ListMode::Plain => {
            if PLAIN_WORD.is_match(word) {
                Ok(Value::string(word))
            } else {
                Err(Unresolved::Syntax(format!("Unexpected {}", word)))
            }
        }
        ListMode::Arguments => {
            if let Some(value) = registry.lookup_constant(word, scope) {
                return Ok(value);
            }
            registry
                .resolve_name(word, scope)
                .map(Value::ident)
                .ok_or_else(|| {
                    Unresolved::Annotation(AnnotationError::UnresolvedIdentifier {
                        name: word.to_string(),
                    })
                })
        }
    }
}
