//! Constructed annotation objects

use crate::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Object produced by building a type-tag.
///
/// Implemented for every `'static` type that is `Debug + Send + Sync`, so host
/// structs need no explicit impl.
pub trait AnnotationObject: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + fmt::Debug + Send + Sync> AnnotationObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A constructed object of a registered annotation type.
///
/// Cloning shares the object. Two instances are equal only when they share
/// the same object.
#[derive(Clone)]
pub struct Instance {
    type_id: String,
    object: Arc<dyn AnnotationObject>,
}

impl Instance {
    pub fn new(type_id: impl Into<String>, object: Box<dyn AnnotationObject>) -> Self {
        Self {
            type_id: type_id.into(),
            object: Arc::from(object),
        }
    }

    /// Fully qualified id of the annotation type.
    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn object(&self) -> &dyn AnnotationObject {
        &*self.object
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let object: &dyn AnnotationObject = &*self.object;
        object.as_any().downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && Arc::ptr_eq(&self.object, &other.object)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_id", &self.type_id)
            .field("object", &self.object)
            .finish()
    }
}

/// Field bag for annotation types declared without a host struct.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Marker {
        hits: u32,
    }

    #[test]
    fn test_downcast_host_object() {
        let instance = Instance::new("app::Marker", Box::new(Marker { hits: 2 }));
        assert_eq!(instance.type_id(), "app::Marker");
        assert_eq!(instance.downcast_ref::<Marker>().map(|m| m.hits), Some(2));
        assert!(!instance.is::<Record>());
    }

    #[test]
    fn test_equality_is_identity() {
        let a = Instance::new("app::Marker", Box::new(Marker::default()));
        let b = Instance::new("app::Marker", Box::new(Marker::default()));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_record_set_overwrites() {
        let mut record = Record::new();
        record.set("path", Value::from("/a"));
        record.set("path", Value::from("/b"));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("path").and_then(Value::as_str), Some("/b"));
    }
}
