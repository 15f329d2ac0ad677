//! Reader configuration (quill.toml)
//!
//! ```toml
//! default_namespace = "app"
//!
//! [imports]
//! Route = "web::Route"
//!
//! [constants]
//! LIMIT = 10
//!
//! [annotations."web::Route"]
//! default_attribute = "path"
//! targets = ["method", "function"]
//!
//! [[annotations."web::Route".attributes]]
//! name = "path"
//! type = "string"
//! required = true
//!
//! [[annotations."web::Route".attributes]]
//! name = "verbs"
//! type = ["string"]
//! default = ["GET"]
//! ```
//!
//! Types declared here have no host type behind them; their instances are
//! [`Record`](quill_core::Record)s.

use crate::registry::{ImportResolver, SchemaRegistry, DEFAULT_MARKER_TAG};
use quill_core::{
    AnnotationSchema, AttributeSpec, ConfigError, Scalar, Target, TypeBinding, TypeDescriptor,
    Value, ValueList,
};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaderConfig {
    pub default_namespace: Option<String>,
    pub marker_tag: Option<String>,
    #[serde(default)]
    pub imports: HashMap<String, String>,
    #[serde(default)]
    pub constants: BTreeMap<String, toml::Value>,
    #[serde(default)]
    pub annotations: BTreeMap<String, AnnotationDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnnotationDef {
    pub default_attribute: Option<String>,
    pub targets: Option<Vec<String>>,
    pub parent: Option<String>,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: Option<TypeDef>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    pub setter: Option<String>,
    pub default: Option<toml::Value>,
}

/// `"string"`, `["string", "int"]` or `{ one_of = ["a", "b"] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeDef {
    Name(String),
    Array(Vec<TypeDef>),
    Enum { one_of: Vec<toml::Value> },
}

/// Parse a configuration document.
pub fn from_toml_str(source: &str) -> Result<ReaderConfig, ConfigError> {
    toml::from_str(source).map_err(|e| ConfigError::InvalidToml {
        reason: e.to_string(),
    })
}

impl ReaderConfig {
    /// Build a registry holding everything this configuration declares.
    pub fn build_registry(&self) -> Result<SchemaRegistry, ConfigError> {
        let mut resolver = ImportResolver::new();
        if let Some(namespace) = &self.default_namespace {
            resolver = resolver.default_namespace(namespace.clone());
        }
        for (alias, target) in &self.imports {
            resolver = resolver.import(alias.clone(), target.clone());
        }

        let registry = SchemaRegistry::with_resolver(Box::new(resolver)).with_marker_tag(
            self.marker_tag
                .clone()
                .unwrap_or_else(|| DEFAULT_MARKER_TAG.to_string()),
        );

        for (name, value) in &self.constants {
            registry.register_constant(name.clone(), to_value(value));
        }

        self.check_parents()?;
        for type_id in self.registration_order() {
            let schema = self.annotations[type_id].to_schema(type_id)?;
            registry.register_annotation(type_id, schema, TypeBinding::record())?;
        }
        debug!(
            annotations = self.annotations.len(),
            constants = self.constants.len(),
            "registry built from configuration"
        );
        Ok(registry)
    }

    /// Annotation ids with every configured parent ahead of its children.
    fn registration_order(&self) -> Vec<&str> {
        let mut order = Vec::with_capacity(self.annotations.len());
        let mut placed = HashSet::new();
        for type_id in self.annotations.keys() {
            let mut lineage = Vec::new();
            let mut next = Some(type_id.as_str());
            while let Some(id) = next {
                if placed.contains(id) || !self.annotations.contains_key(id) {
                    break;
                }
                lineage.push(id);
                next = self.annotations[id].parent.as_deref();
            }
            for id in lineage.into_iter().rev() {
                if placed.insert(id) {
                    order.push(id);
                }
            }
        }
        order
    }

    fn check_parents(&self) -> Result<(), ConfigError> {
        for type_id in self.annotations.keys() {
            let mut chain = vec![type_id.clone()];
            let mut next = self.annotations[type_id].parent.clone();
            while let Some(parent) = next {
                chain.push(parent.clone());
                if parent == *type_id {
                    return Err(ConfigError::InheritanceCycle { chain });
                }
                if chain.len() > self.annotations.len() + 1 {
                    break;
                }
                next = self.annotations.get(&parent).and_then(|d| d.parent.clone());
            }
        }
        Ok(())
    }
}

impl AnnotationDef {
    pub fn to_schema(&self, type_id: &str) -> Result<AnnotationSchema, ConfigError> {
        let mut schema = AnnotationSchema::new();
        schema.default_attribute = self.default_attribute.clone();
        schema.parent = self.parent.clone();
        // Left empty, targets are inherited or default to class.
        schema.targets = Target::empty();
        if let Some(names) = &self.targets {
            schema.targets = names.iter().try_fold(Target::empty(), |acc, name| {
                let target: Target = name.parse().map_err(|_| ConfigError::InvalidValue {
                    field: format!("{}.targets", type_id),
                    value: name.clone(),
                    reason: "unknown target".to_string(),
                })?;
                Ok::<Target, ConfigError>(acc | target)
            })?;
        }

        for def in &self.attributes {
            let field = format!("{}.{}", type_id, def.name);
            let mut spec = AttributeSpec::new(def.name.clone());
            if let Some(ty) = &def.attribute_type {
                spec = spec.ty(ty.to_descriptor(&field)?);
            }
            if def.required {
                spec = spec.required();
            }
            if def.nullable {
                spec = spec.nullable();
            }
            if let Some(setter) = &def.setter {
                spec = spec.setter(setter.clone());
            }
            if let Some(default) = &def.default {
                spec = spec.default_value(to_value(default));
            }
            schema = schema.attribute(spec);
        }
        Ok(schema)
    }
}

impl TypeDef {
    pub fn to_descriptor(&self, field: &str) -> Result<TypeDescriptor, ConfigError> {
        match self {
            TypeDef::Name(name) if name == "array" => Ok(TypeDescriptor::array(Vec::new())),
            TypeDef::Name(name) => Ok(TypeDescriptor::from_scalar_name(name)
                .unwrap_or_else(|| TypeDescriptor::ClassRef(name.clone()))),
            TypeDef::Array(elements) => {
                let elements = elements
                    .iter()
                    .map(|e| e.to_descriptor(field))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(TypeDescriptor::array(elements))
            }
            TypeDef::Enum { one_of } => {
                let values = one_of
                    .iter()
                    .map(|v| match to_value(v) {
                        Value::Scalar(scalar) => Ok(scalar),
                        _ => Err(ConfigError::InvalidValue {
                            field: field.to_string(),
                            value: v.to_string(),
                            reason: "enum members must be scalars".to_string(),
                        }),
                    })
                    .collect::<Result<Vec<Scalar>, _>>()?;
                Ok(TypeDescriptor::Enum(values))
            }
        }
    }
}

/// Convert a TOML value; tables become keyed lists.
pub fn to_value(value: &toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::string(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(x) => Value::from(*x),
        toml::Value::Boolean(b) => Value::from(*b),
        toml::Value::Datetime(d) => Value::string(d.to_string()),
        toml::Value::Array(items) => Value::List(items.iter().map(to_value).collect()),
        toml::Value::Table(table) => {
            let mut list = ValueList::new();
            for (key, item) in table {
                list.insert(key.clone(), to_value(item));
            }
            Value::List(list)
        }
    }
}
