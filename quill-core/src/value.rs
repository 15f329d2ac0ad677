//! Parsed tag values

use crate::Instance;
use std::fmt;

/// A literal scalar produced by the value resolver chain.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Quoted string or raw plain-tag text.
    String(String),
    /// Bareword resolved to a fully qualified type id.
    Ident(String),
}

impl Scalar {
    /// Human readable kind, used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "boolean",
            Scalar::Integer(_) => "integer",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
            Scalar::Ident(_) => "identifier",
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => write!(f, "null"),
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Integer(i) => write!(f, "{}", i),
            Scalar::Float(x) => write!(f, "{}", x),
            Scalar::String(s) | Scalar::Ident(s) => write!(f, "{}", s),
        }
    }
}

/// A node of the parsed tag tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Tag present with no argument.
    Flag,
    Scalar(Scalar),
    List(ValueList),
    Instance(Instance),
}

impl Value {
    pub fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }

    pub fn ident(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Ident(s.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    pub fn is_flag(&self) -> bool {
        matches!(self, Value::Flag)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// String content of a string or identifier scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::String(s)) | Value::Scalar(Scalar::Ident(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or float scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Integer(i)) => Some(*i as f64),
            Value::Scalar(Scalar::Float(x)) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ValueList> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Human readable kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Flag => "flag",
            Value::Scalar(s) => s.kind(),
            Value::List(_) => "array",
            Value::Instance(_) => "instance",
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Integer(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Scalar(Scalar::Float(x))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<ValueList> for Value {
    fn from(list: ValueList) -> Self {
        Value::List(list)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

/// One entry of a [`ValueList`].
#[derive(Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub key: Option<String>,
    pub value: Value,
}

/// Ordered list whose entries may also carry a string key.
///
/// Positional and keyed entries coexist. Inserting an existing key replaces
/// the earlier entry in place, keeping its position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueList {
    entries: Vec<ListEntry>,
}

impl ValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional entry.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.entries.push(ListEntry {
            key: None,
            value: value.into(),
        });
    }

    /// Insert a keyed entry, overwriting an existing entry with the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|e| e.key.as_deref() == Some(key.as_str()))
        {
            Some(entry) => entry.value = value,
            None => self.entries.push(ListEntry {
                key: Some(key),
                value,
            }),
        }
    }

    /// Push with an optional key.
    pub fn append(&mut self, key: Option<String>, value: Value) {
        match key {
            Some(key) => self.insert(key, value),
            None => self.push(value),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|e| e.key.as_deref() == Some(key))
            .map(|e| &e.value)
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.entries.get(index).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ListEntry> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|e| &e.value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.values().any(|v| v == value)
    }

    pub fn into_entries(self) -> Vec<ListEntry> {
        self.entries
    }
}

impl FromIterator<Value> for ValueList {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut list = ValueList::new();
        for value in iter {
            list.push(value);
        }
        list
    }
}

impl IntoIterator for ValueList {
    type Item = ListEntry;
    type IntoIter = std::vec::IntoIter<ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
