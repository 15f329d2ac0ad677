//! Annotation schemas

use crate::error::ConfigError;
use crate::{Scalar, Target, Value};
use std::fmt;

/// Declared type of an annotation attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Mixed,
    String,
    /// Integer, float, or a string that parses as numeric.
    Number,
    Integer,
    Float,
    Boolean,
    Enum(Vec<Scalar>),
    /// Instance of the type, or of one of its declared descendants.
    ClassRef(String),
    /// Exact-arity positional check. An empty tuple accepts any array.
    Tuple(Vec<TypeDescriptor>),
    /// Every element matches the same descriptor.
    Homogeneous(Box<TypeDescriptor>),
}

impl TypeDescriptor {
    /// Parse one of the scalar type names used in `@Attribute(type: ...)`.
    pub fn from_scalar_name(name: &str) -> Option<TypeDescriptor> {
        match name {
            "mixed" => Some(TypeDescriptor::Mixed),
            "string" => Some(TypeDescriptor::String),
            "number" => Some(TypeDescriptor::Number),
            "int" | "integer" => Some(TypeDescriptor::Integer),
            "float" => Some(TypeDescriptor::Float),
            "bool" | "boolean" => Some(TypeDescriptor::Boolean),
            _ => None,
        }
    }

    /// Build an array descriptor from its element descriptors: none means
    /// any array, one means homogeneous, more means a tuple.
    pub fn array(mut elements: Vec<TypeDescriptor>) -> TypeDescriptor {
        if elements.len() == 1 {
            TypeDescriptor::Homogeneous(Box::new(elements.remove(0)))
        } else {
            TypeDescriptor::Tuple(elements)
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Mixed => write!(f, "mixed"),
            TypeDescriptor::String => write!(f, "string"),
            TypeDescriptor::Number => write!(f, "number"),
            TypeDescriptor::Integer => write!(f, "integer"),
            TypeDescriptor::Float => write!(f, "float"),
            TypeDescriptor::Boolean => write!(f, "boolean"),
            TypeDescriptor::Enum(values) => {
                let values: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "enum({})", values.join(", "))
            }
            TypeDescriptor::ClassRef(id) => write!(f, "{}", id),
            TypeDescriptor::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|d| d.to_string()).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            TypeDescriptor::Homogeneous(item) => write!(f, "{{{}}}", item),
        }
    }
}

/// Contract of a single annotation attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    pub name: String,
    pub ty: TypeDescriptor,
    pub required: bool,
    pub nullable: bool,
    /// Name of the setter to call instead of assigning the field directly.
    pub setter: Option<String>,
    pub default: Option<Value>,
}

impl AttributeSpec {
    /// A permissive spec: `mixed`, optional, not nullable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: TypeDescriptor::Mixed,
            required: false,
            nullable: false,
            setter: None,
            default: None,
        }
    }

    pub fn ty(mut self, ty: TypeDescriptor) -> Self {
        self.ty = ty;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn setter(mut self, setter: impl Into<String>) -> Self {
        self.setter = Some(setter.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

/// Resolved shape of an annotation type.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationSchema {
    /// Attribute an unnamed argument binds to.
    pub default_attribute: Option<String>,
    pub targets: Target,
    /// Constructor parameter names, in call order.
    pub constructor_params: Option<Vec<String>>,
    /// Attribute specs in declaration order, unique by name.
    pub attributes: Vec<AttributeSpec>,
    /// Type this schema inherited from, if any.
    pub parent: Option<String>,
}

impl Default for AnnotationSchema {
    fn default() -> Self {
        Self {
            default_attribute: None,
            targets: Target::CLASS,
            constructor_params: None,
            attributes: Vec::new(),
            parent: None,
        }
    }
}

impl AnnotationSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema with no targets, the starting point of inheritance resolution.
    pub fn empty_base() -> Self {
        Self {
            targets: Target::empty(),
            ..Self::default()
        }
    }

    pub fn default_attribute(mut self, name: impl Into<String>) -> Self {
        self.default_attribute = Some(name.into());
        self
    }

    pub fn targets(mut self, targets: Target) -> Self {
        self.targets = targets;
        self
    }

    pub fn constructor<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.constructor_params = Some(params.into_iter().map(Into::into).collect());
        self
    }

    pub fn attribute(mut self, spec: AttributeSpec) -> Self {
        self.upsert_attribute(spec);
        self
    }

    pub fn get_attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn get_attribute_mut(&mut self, name: &str) -> Option<&mut AttributeSpec> {
        self.attributes.iter_mut().find(|a| a.name == name)
    }

    /// Insert a spec, replacing any spec with the same name in place.
    pub fn upsert_attribute(&mut self, spec: AttributeSpec) {
        match self.get_attribute_mut(&spec.name) {
            Some(existing) => *existing = spec,
            None => self.attributes.push(spec),
        }
    }

    /// Every constructor parameter must name a declared attribute.
    pub fn validate(&self, type_id: &str) -> Result<(), ConfigError> {
        if let Some(params) = &self.constructor_params {
            for param in params {
                if self.get_attribute(param).is_none() {
                    return Err(ConfigError::UnknownConstructorParam {
                        type_id: type_id.to_string(),
                        name: param.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
