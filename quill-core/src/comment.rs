//! Parse result of one documentation block

use crate::error::CommentError;
use crate::{Instance, Value};
use std::fmt;

/// Description text, plain tags, and constructed annotation instances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comment {
    description: String,
    tags: Vec<(String, Value)>,
    annotations: Vec<(String, Vec<Instance>)>,
}

impl Comment {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Set a plain tag. An existing tag keeps its position and takes the new value.
    pub fn add(&mut self, tag: impl Into<String>, value: Value) {
        let tag = tag.into();
        match self.tags.iter_mut().find(|(name, _)| *name == tag) {
            Some((_, slot)) => *slot = value,
            None => self.tags.push((tag, value)),
        }
    }

    pub fn remove(&mut self, tag: &str) -> Option<Value> {
        let index = self.tags.iter().position(|(name, _)| name == tag)?;
        Some(self.tags.remove(index).1)
    }

    pub fn has(&self, tag: &str) -> bool {
        self.tags.iter().any(|(name, _)| name == tag)
    }

    pub fn get(&self, tag: &str) -> Result<&Value, CommentError> {
        self.tags
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, value)| value)
            .ok_or_else(|| CommentError::MissingTag {
                tag: tag.to_string(),
            })
    }

    /// Whether the tag is present and holds exactly `value`.
    pub fn equals(&self, tag: &str, value: &Value) -> bool {
        self.get(tag).map(|v| v == value).unwrap_or(false)
    }

    /// Whether the tag holds a list containing `value`.
    pub fn contains(&self, tag: &str, value: &Value) -> bool {
        match self.get(tag) {
            Ok(Value::List(list)) => list.contains(value),
            _ => false,
        }
    }

    /// Whether the tag holds a list containing every one of `values`.
    pub fn contains_all(&self, tag: &str, values: &[Value]) -> bool {
        match self.get(tag) {
            Ok(Value::List(list)) => values.iter().all(|v| list.contains(v)),
            _ => false,
        }
    }

    /// Append a constructed instance under its type id.
    pub fn add_annotation(&mut self, instance: Instance) {
        let type_id = instance.type_id().to_string();
        match self.annotations.iter_mut().find(|(id, _)| *id == type_id) {
            Some((_, instances)) => instances.push(instance),
            None => self.annotations.push((type_id, vec![instance])),
        }
    }

    pub fn has_annotation_type(&self, type_id: &str) -> bool {
        self.annotations.iter().any(|(id, _)| id == type_id)
    }

    pub fn annotation_type(&self, type_id: &str) -> Result<&[Instance], CommentError> {
        self.annotations
            .iter()
            .find(|(id, _)| id == type_id)
            .map(|(_, instances)| instances.as_slice())
            .ok_or_else(|| CommentError::MissingAnnotationType {
                type_id: type_id.to_string(),
            })
    }

    /// Instances grouped by type id, in first-seen order.
    pub fn annotations(&self) -> impl Iterator<Item = (&str, &[Instance])> {
        self.annotations
            .iter()
            .map(|(id, instances)| (id.as_str(), instances.as_slice()))
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.tags.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}
