//! Built-in annotation types used to declare other annotation types

use super::{Scope, SchemaRegistry};
use quill_core::{
    AnnotationError, AnnotationSchema, AttributeSpec, Scalar, Target, TypeBinding, TypeDescriptor,
    Value,
};

pub const ATTRIBUTE: &str = "quill::Attribute";
pub const ENUM: &str = "quill::Enum";
pub const TARGET: &str = "quill::Target";

/// `@Attribute('name', type: ..., required: ..., nullable: ..., setter: ..., default: ...)`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub ty: Option<Value>,
    pub setter: Option<String>,
    pub nullable: bool,
    pub required: bool,
    pub default: Option<Value>,
}

impl Attribute {
    /// Resolve the declared type and build the attribute spec.
    pub fn to_spec(
        &self,
        registry: &SchemaRegistry,
        scope: &Scope,
    ) -> Result<AttributeSpec, AnnotationError> {
        let ty = match &self.ty {
            Some(value) => descriptor(value, registry, scope)?,
            None => TypeDescriptor::Mixed,
        };
        Ok(AttributeSpec {
            name: self.name.clone(),
            ty,
            required: self.required,
            nullable: self.nullable,
            setter: self.setter.clone(),
            default: self.default.clone(),
        })
    }
}

/// `@Enum({...})`: the closed set of values an attribute accepts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enum {
    pub values: Vec<Scalar>,
}

/// `@Target('method')` or `@Target({'class', 'method'})`.
#[derive(Debug, Clone, PartialEq)]
pub struct Targets {
    pub mask: Target,
}

impl Default for Targets {
    fn default() -> Self {
        Self {
            mask: Target::empty(),
        }
    }
}

/// Parse a target name or a list of target names into a mask.
pub fn targets_from_value(value: &Value) -> Result<Target, AnnotationError> {
    match value {
        Value::Scalar(Scalar::String(name)) => name.trim().parse(),
        Value::List(list) => list
            .values()
            .try_fold(Target::empty(), |mask, item| -> Result<Target, AnnotationError> {
                Ok(mask | targets_from_value(item)?)
            }),
        other => Err(AnnotationError::InvalidArgument {
            name: "target".to_string(),
            reason: format!("{} is not a target name", other.kind()),
        }),
    }
}

fn descriptor(
    value: &Value,
    registry: &SchemaRegistry,
    scope: &Scope,
) -> Result<TypeDescriptor, AnnotationError> {
    match value {
        Value::Scalar(Scalar::String(name)) => {
            if let Some(ty) = TypeDescriptor::from_scalar_name(name) {
                return Ok(ty);
            }
            registry
                .resolve_name(name, scope)
                .map(TypeDescriptor::ClassRef)
                .ok_or_else(|| AnnotationError::UnknownType {
                    type_id: name.clone(),
                })
        }
        Value::Scalar(Scalar::Ident(id)) => Ok(TypeDescriptor::ClassRef(id.clone())),
        Value::Instance(instance) => match instance.downcast_ref::<Enum>() {
            Some(allowed) => Ok(TypeDescriptor::Enum(allowed.values.clone())),
            None => Err(AnnotationError::InvalidArgument {
                name: "type".to_string(),
                reason: format!("{} is not a type", instance.type_id()),
            }),
        },
        Value::List(list) => {
            let elements = list
                .values()
                .map(|item| descriptor(item, registry, scope))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TypeDescriptor::array(elements))
        }
        other => Err(AnnotationError::InvalidArgument {
            name: "type".to_string(),
            reason: format!("{} is not a type", other.kind()),
        }),
    }
}

fn expect_string(name: &str, value: Value) -> Result<String, AnnotationError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| AnnotationError::TypeMismatch {
            name: name.to_string(),
            expected: "string".to_string(),
            found: value.kind().to_string(),
        })
}

fn expect_bool(name: &str, value: Value) -> Result<bool, AnnotationError> {
    value.as_bool().ok_or_else(|| AnnotationError::TypeMismatch {
        name: name.to_string(),
        expected: "boolean".to_string(),
        found: value.kind().to_string(),
    })
}

pub(crate) fn attribute_type() -> (AnnotationSchema, TypeBinding) {
    let schema = AnnotationSchema::new()
        .default_attribute("name")
        .targets(Target::CLASS)
        .attribute(AttributeSpec::new("name").ty(TypeDescriptor::String).required())
        .attribute(AttributeSpec::new("type"))
        .attribute(AttributeSpec::new("setter").ty(TypeDescriptor::String))
        .attribute(AttributeSpec::new("nullable").ty(TypeDescriptor::Boolean))
        .attribute(AttributeSpec::new("required").ty(TypeDescriptor::Boolean))
        .attribute(AttributeSpec::new("default").nullable());

    let binding = TypeBinding::new::<Attribute>()
        .field("name", |a: &mut Attribute, v: Value| {
            a.name = expect_string("name", v)?;
            Ok(())
        })
        .field("type", |a: &mut Attribute, v: Value| {
            a.ty = Some(v);
            Ok(())
        })
        .field("setter", |a: &mut Attribute, v: Value| {
            a.setter = Some(expect_string("setter", v)?);
            Ok(())
        })
        .field("nullable", |a: &mut Attribute, v: Value| {
            a.nullable = expect_bool("nullable", v)?;
            Ok(())
        })
        .field("required", |a: &mut Attribute, v: Value| {
            a.required = expect_bool("required", v)?;
            Ok(())
        })
        .field("default", |a: &mut Attribute, v: Value| {
            a.default = Some(v);
            Ok(())
        });

    (schema, binding)
}

pub(crate) fn enum_type() -> (AnnotationSchema, TypeBinding) {
    let schema = AnnotationSchema::new()
        .default_attribute("values")
        .targets(Target::ANNOTATION)
        .attribute(
            AttributeSpec::new("values")
                .ty(TypeDescriptor::Tuple(Vec::new()))
                .required(),
        );

    let binding = TypeBinding::new::<Enum>().field("values", |e: &mut Enum, v: Value| {
        let list = v.as_list().cloned().unwrap_or_default();
        e.values = list
            .into_iter()
            .map(|entry| match entry.value {
                Value::Scalar(scalar) => Ok(scalar),
                other => Err(AnnotationError::InvalidArgument {
                    name: "values".to_string(),
                    reason: format!("{} can not be an enum value", other.kind()),
                }),
            })
            .collect::<Result<_, _>>()?;
        Ok(())
    });

    (schema, binding)
}

pub(crate) fn target_type() -> (AnnotationSchema, TypeBinding) {
    let schema = AnnotationSchema::new()
        .default_attribute("target")
        .targets(Target::CLASS)
        .attribute(AttributeSpec::new("target").required());

    let binding = TypeBinding::new::<Targets>().field("target", |t: &mut Targets, v: Value| {
        t.mask = targets_from_value(&v)?;
        Ok(())
    });

    (schema, binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::ValueList;

    #[test]
    fn test_targets_from_value() {
        assert_eq!(targets_from_value(&Value::from("method")), Ok(Target::METHOD));

        let list: ValueList = vec![Value::from("class"), Value::from("function")]
            .into_iter()
            .collect();
        assert_eq!(
            targets_from_value(&Value::List(list)),
            Ok(Target::CLASS | Target::FUNCTION)
        );

        assert!(matches!(
            targets_from_value(&Value::from("everywhere")),
            Err(AnnotationError::UnknownTargetName { .. })
        ));
        assert!(targets_from_value(&Value::from(1i64)).is_err());
    }

    #[test]
    fn test_attribute_type_descriptors() {
        let registry = SchemaRegistry::new();
        let scope = Scope::new();
        let spec = |ty: Value| {
            Attribute {
                name: "a".to_string(),
                ty: Some(ty),
                ..Attribute::default()
            }
            .to_spec(&registry, &scope)
            .map(|s| s.ty)
        };

        assert_eq!(spec(Value::from("int")), Ok(TypeDescriptor::Integer));
        assert_eq!(spec(Value::from("boolean")), Ok(TypeDescriptor::Boolean));
        assert_eq!(
            spec(Value::List(ValueList::new())),
            Ok(TypeDescriptor::Tuple(Vec::new()))
        );
        let single: ValueList = vec![Value::from("string")].into_iter().collect();
        assert_eq!(
            spec(Value::List(single)),
            Ok(TypeDescriptor::Homogeneous(Box::new(TypeDescriptor::String)))
        );
        assert_eq!(
            spec(Value::from("Enum")),
            Ok(TypeDescriptor::ClassRef(ENUM.to_string()))
        );
        assert!(matches!(
            spec(Value::from("NoSuchType")),
            Err(AnnotationError::UnknownType { .. })
        ));
    }
}
