//! Attribute type checking

use crate::registry::SchemaRegistry;
use crate::resolve::is_numeric;
use quill_core::{AnnotationError, Scalar, TypeDescriptor, Value};

/// Check `value` against the declared type of attribute `name`.
///
/// Array elements are reported as `name[i]`, or `name[key]` for keyed
/// entries of a homogeneous array.
pub fn check_type(
    name: &str,
    value: &Value,
    ty: &TypeDescriptor,
    registry: &SchemaRegistry,
) -> Result<(), AnnotationError> {
    let matches = match ty {
        TypeDescriptor::Mixed => true,
        TypeDescriptor::String => matches!(
            value,
            Value::Scalar(Scalar::String(_)) | Value::Scalar(Scalar::Ident(_))
        ),
        TypeDescriptor::Integer => matches!(value, Value::Scalar(Scalar::Integer(_))),
        TypeDescriptor::Float => matches!(value, Value::Scalar(Scalar::Float(_))),
        TypeDescriptor::Boolean => matches!(value, Value::Scalar(Scalar::Bool(_))),
        TypeDescriptor::Number => match value {
            Value::Scalar(Scalar::Integer(_)) | Value::Scalar(Scalar::Float(_)) => true,
            Value::Scalar(Scalar::String(s)) => is_numeric(s),
            _ => false,
        },
        TypeDescriptor::Enum(allowed) => {
            let member = value.as_scalar().map(|s| allowed.contains(s)).unwrap_or(false);
            if !member {
                return Err(AnnotationError::NotInEnum {
                    name: name.to_string(),
                    allowed: allowed.iter().map(|s| s.to_string()).collect(),
                });
            }
            true
        }
        TypeDescriptor::ClassRef(expected) => match value {
            Value::Instance(instance) => registry.is_subtype(instance.type_id(), expected),
            _ => false,
        },
        TypeDescriptor::Tuple(items) => return check_tuple(name, value, items, registry),
        TypeDescriptor::Homogeneous(item) => return check_homogeneous(name, value, item, registry),
    };

    if matches {
        Ok(())
    } else {
        Err(mismatch(name, value, ty))
    }
}

fn check_tuple(
    name: &str,
    value: &Value,
    items: &[TypeDescriptor],
    registry: &SchemaRegistry,
) -> Result<(), AnnotationError> {
    let list = value
        .as_list()
        .ok_or_else(|| mismatch(name, value, &TypeDescriptor::Tuple(items.to_vec())))?;
    if items.is_empty() {
        return Ok(());
    }
    if list.len() != items.len() {
        return Err(AnnotationError::ArityMismatch {
            name: name.to_string(),
            expected: items.len(),
            found: list.len(),
        });
    }
    for (i, (element, ty)) in list.values().zip(items).enumerate() {
        check_type(&format!("{}[{}]", name, i), element, ty, registry)?;
    }
    Ok(())
}

fn check_homogeneous(
    name: &str,
    value: &Value,
    item: &TypeDescriptor,
    registry: &SchemaRegistry,
) -> Result<(), AnnotationError> {
    let list = value.as_list().ok_or_else(|| {
        mismatch(name, value, &TypeDescriptor::Homogeneous(Box::new(item.clone())))
    })?;
    for (i, entry) in list.iter().enumerate() {
        let label = match &entry.key {
            Some(key) => format!("{}[{}]", name, key),
            None => format!("{}[{}]", name, i),
        };
        check_type(&label, &entry.value, item, registry)?;
    }
    Ok(())
}

fn mismatch(name: &str, value: &Value, ty: &TypeDescriptor) -> AnnotationError {
    let expected = match ty {
        TypeDescriptor::Tuple(_) | TypeDescriptor::Homogeneous(_) => format!("array {}", ty),
        TypeDescriptor::ClassRef(id) => format!("instance of {}", id),
        other => other.to_string(),
    };
    AnnotationError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: value.kind().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{AnnotationSchema, Instance, Record, TypeBinding, ValueList};

    fn list(values: Vec<Value>) -> Value {
        Value::List(values.into_iter().collect::<ValueList>())
    }

    #[test]
    fn test_scalar_kinds() {
        let registry = SchemaRegistry::new();
        let check = |v: Value, ty: TypeDescriptor| check_type("a", &v, &ty, &registry);

        assert!(check(Value::from("x"), TypeDescriptor::String).is_ok());
        assert!(check(Value::from(1i64), TypeDescriptor::String).is_err());
        assert!(check(Value::from(1i64), TypeDescriptor::Integer).is_ok());
        assert!(check(Value::from(1.5), TypeDescriptor::Integer).is_err());
        assert!(check(Value::from(1.5), TypeDescriptor::Float).is_ok());
        assert!(check(Value::from(false), TypeDescriptor::Boolean).is_ok());
        assert!(check(Value::from("12.5"), TypeDescriptor::Number).is_ok());
        assert!(check(Value::from("twelve"), TypeDescriptor::Number).is_err());
        assert!(check(Value::null(), TypeDescriptor::Mixed).is_ok());
    }

    #[test]
    fn test_tuple_names_failing_index() {
        let registry = SchemaRegistry::new();
        let ty = TypeDescriptor::Tuple(vec![TypeDescriptor::String, TypeDescriptor::Integer]);

        let ok = list(vec![Value::from("s"), Value::from(2i64)]);
        assert!(check_type("array", &ok, &ty, &registry).is_ok());

        let bad = list(vec![Value::from("s"), Value::from("t")]);
        let err = check_type("array", &bad, &ty, &registry).unwrap_err();
        assert!(err.to_string().contains("array[1]"));

        let short = list(vec![Value::from("s")]);
        let err = check_type("array", &short, &ty, &registry).unwrap_err();
        assert_eq!(
            err,
            AnnotationError::ArityMismatch {
                name: "array".to_string(),
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_nested_homogeneous_tuples() {
        let registry = SchemaRegistry::new();
        let ty = TypeDescriptor::Homogeneous(Box::new(TypeDescriptor::Tuple(vec![
            TypeDescriptor::String,
            TypeDescriptor::Integer,
        ])));
        let good = list(vec![
            list(vec![Value::from("foo"), Value::from(1i64)]),
            list(vec![Value::from("bar"), Value::from(2i64)]),
        ]);
        assert!(check_type("complex", &good, &ty, &registry).is_ok());

        let bad = list(vec![
            list(vec![Value::from("foo"), Value::from("bar")]),
            list(vec![Value::from("bar"), Value::from(2i64)]),
        ]);
        let err = check_type("complex", &bad, &ty, &registry).unwrap_err();
        assert!(err.to_string().contains("complex[0][1]"));
    }

    #[test]
    fn test_enum_lists_allowed_values() {
        let registry = SchemaRegistry::new();
        let ty = TypeDescriptor::Enum(vec![
            Scalar::String("foo".to_string()),
            Scalar::String("bar".to_string()),
        ]);
        assert!(check_type("enum", &Value::from("bar"), &ty, &registry).is_ok());
        let err = check_type("enum", &Value::from("br"), &ty, &registry).unwrap_err();
        assert_eq!(err.to_string(), "Attribute enum must be one of foo, bar");
    }

    #[test]
    fn test_class_ref_accepts_subtypes() {
        let registry = SchemaRegistry::new();
        registry
            .register_annotation("app::Base", AnnotationSchema::new(), TypeBinding::record())
            .unwrap();
        let mut child = AnnotationSchema::new();
        child.parent = Some("app::Base".to_string());
        registry
            .register_annotation("app::Child", child, TypeBinding::record())
            .unwrap();

        let ty = TypeDescriptor::ClassRef("app::Base".to_string());
        let child = Value::Instance(Instance::new("app::Child", Box::new(Record::new())));
        let other = Value::Instance(Instance::new("app::Other", Box::new(Record::new())));
        assert!(check_type("ref", &child, &ty, &registry).is_ok());
        assert!(check_type("ref", &other, &ty, &registry).is_err());
        assert!(check_type("ref", &Value::from("app::Base"), &ty, &registry).is_err());
    }
}
