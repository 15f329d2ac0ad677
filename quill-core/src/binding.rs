//! Host type bindings
//!
//! A [`TypeBinding`] is the compiled accessor table of one annotation type:
//! how to construct it and how to write each attribute into it, either
//! through a named setter or by direct field assignment.

use crate::error::AnnotationError;
use crate::{AnnotationObject, Record, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Writes one attribute value into a constructed object.
pub type Accessor =
    Arc<dyn Fn(&mut dyn AnnotationObject, Value) -> Result<(), AnnotationError> + Send + Sync>;

/// Builds an object from positional constructor arguments.
pub type Factory =
    Arc<dyn Fn(Vec<Value>) -> Result<Box<dyn AnnotationObject>, AnnotationError> + Send + Sync>;

type FieldWriter = Arc<
    dyn Fn(&mut dyn AnnotationObject, &str, Value) -> Result<(), AnnotationError> + Send + Sync,
>;

/// A constructor parameter as seen by schema resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub default: Option<Value>,
    pub nullable: bool,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            nullable: false,
        }
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

#[derive(Clone)]
pub enum Constructor {
    /// No-argument construction; every attribute goes through accessors.
    Default(Arc<dyn Fn() -> Box<dyn AnnotationObject> + Send + Sync>),
    Params { params: Vec<ParamSpec>, factory: Factory },
}

/// Constructor plus setter and field accessors of an annotation type.
#[derive(Clone)]
pub struct TypeBinding {
    type_name: &'static str,
    constructor: Constructor,
    setters: HashMap<String, Accessor>,
    fields: HashMap<String, Accessor>,
    fallback: Option<FieldWriter>,
}

impl TypeBinding {
    /// Binding for a host type built with `Default::default()`.
    pub fn new<T: AnnotationObject + Default>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            constructor: Constructor::Default(Arc::new(|| {
                Box::new(T::default()) as Box<dyn AnnotationObject>
            })),
            setters: HashMap::new(),
            fields: HashMap::new(),
            fallback: None,
        }
    }

    /// Binding for a host type built from positional constructor arguments.
    pub fn with_constructor<T, F>(params: Vec<ParamSpec>, factory: F) -> Self
    where
        T: AnnotationObject,
        F: Fn(Vec<Value>) -> Result<T, AnnotationError> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |args| {
            factory(args).map(|object| Box::new(object) as Box<dyn AnnotationObject>)
        });
        Self {
            type_name: std::any::type_name::<T>(),
            constructor: Constructor::Params { params, factory },
            setters: HashMap::new(),
            fields: HashMap::new(),
            fallback: None,
        }
    }

    /// Binding for a schema-only type, materialized as a [`Record`].
    pub fn record() -> Self {
        let mut binding = Self::new::<Record>();
        binding.fallback = Some(record_writer());
        binding
    }

    /// Like [`TypeBinding::record`], with the given constructor parameters.
    pub fn record_constructor(params: Vec<ParamSpec>) -> Self {
        let names: Vec<String> = params.iter().map(|p| p.name.clone()).collect();
        let mut binding = Self::with_constructor(params, move |args| {
            let mut record = Record::new();
            for (name, value) in names.iter().zip(args) {
                record.set(name.clone(), value);
            }
            Ok(record)
        });
        binding.fallback = Some(record_writer());
        binding
    }

    /// Register a setter under its method name.
    pub fn setter<T, F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        T: AnnotationObject,
        F: Fn(&mut T, Value) -> Result<(), AnnotationError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.setters.insert(name.clone(), downcasting::<T, F>(name, setter));
        self
    }

    /// Register a direct field writer under the attribute name.
    pub fn field<T, F>(mut self, name: impl Into<String>, writer: F) -> Self
    where
        T: AnnotationObject,
        F: Fn(&mut T, Value) -> Result<(), AnnotationError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.fields.insert(name.clone(), downcasting::<T, F>(name, writer));
        self
    }

    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    /// Constructor parameters, when the type has a parameterized constructor.
    pub fn params(&self) -> Option<&[ParamSpec]> {
        match &self.constructor {
            Constructor::Default(_) => None,
            Constructor::Params { params, .. } => Some(params),
        }
    }

    pub fn construct(&self, args: Vec<Value>) -> Result<Box<dyn AnnotationObject>, AnnotationError> {
        match &self.constructor {
            Constructor::Default(build) => Ok(build()),
            Constructor::Params { factory, .. } => factory(args),
        }
    }

    /// Resolve the accessor writing `attribute`: the named setter when one is
    /// declared, else the field writer.
    pub fn accessor_for(&self, attribute: &str, setter: Option<&str>) -> Option<Accessor> {
        if let Some(setter) = setter {
            return self.setters.get(setter).cloned();
        }
        if let Some(field) = self.fields.get(attribute) {
            return Some(field.clone());
        }
        self.fallback.as_ref().map(|writer| {
            let writer = writer.clone();
            let name = attribute.to_string();
            Arc::new(move |object: &mut dyn AnnotationObject, value: Value| {
                writer(object, &name, value)
            }) as Accessor
        })
    }
}

impl fmt::Debug for TypeBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut setters: Vec<&String> = self.setters.keys().collect();
        setters.sort();
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();
        f.debug_struct("TypeBinding")
            .field("type_name", &self.type_name)
            .field("params", &self.params())
            .field("setters", &setters)
            .field("fields", &fields)
            .field("dynamic", &self.fallback.is_some())
            .finish()
    }
}

fn downcasting<T, F>(name: String, write: F) -> Accessor
where
    T: AnnotationObject,
    F: Fn(&mut T, Value) -> Result<(), AnnotationError> + Send + Sync + 'static,
{
    Arc::new(move |object: &mut dyn AnnotationObject, value: Value| {
        match object.as_any_mut().downcast_mut::<T>() {
            Some(target) => write(target, value),
            None => Err(AnnotationError::NoAccessor {
                type_id: std::any::type_name::<T>().to_string(),
                name: name.clone(),
            }),
        }
    })
}

fn record_writer() -> FieldWriter {
    Arc::new(|object: &mut dyn AnnotationObject, name: &str, value: Value| {
        match object.as_any_mut().downcast_mut::<Record>() {
            Some(record) => {
                record.set(name, value);
                Ok(())
            }
            None => Err(AnnotationError::NoAccessor {
                type_id: "Record".to_string(),
                name: name.to_string(),
            }),
        }
    })
}
