//! Instance construction from checked attribute values

use crate::checker::check_type;
use crate::registry::{ResolvedType, SchemaRegistry};
use quill_core::{AnnotationError, Instance, QuillResult, Target, Value, ValueList};
use tracing::trace;

/// Validate `supplied` against the resolved schema and construct the object.
///
/// The first unnamed entry binds to the default attribute; later unnamed
/// entries are ignored. Constructor parameters
/// are passed in declaration order (supplied value, else default, else
/// null); every other supplied value and every other default goes through
/// the compiled accessor.
pub(crate) fn build(
    registry: &SchemaRegistry,
    resolved: &ResolvedType,
    supplied: ValueList,
    context: Target,
) -> QuillResult<Instance> {
    let type_id = resolved.type_id.as_str();
    let schema = &resolved.schema;

    if !schema.targets.allows(context) {
        return Err(AnnotationError::InvalidTarget {
            type_id: type_id.to_string(),
            target: context.to_string(),
        }
        .into());
    }

    let mut values: Vec<(String, Value)> = Vec::with_capacity(supplied.len());
    let mut positional_seen = false;
    for entry in supplied {
        let name = match entry.key {
            Some(key) => key,
            None if positional_seen => {
                trace!(type_id = %type_id, "extra unnamed argument ignored");
                continue;
            }
            None => {
                positional_seen = true;
                schema
                    .default_attribute
                    .clone()
                    .ok_or_else(|| AnnotationError::NoDefaultAttribute {
                        type_id: type_id.to_string(),
                    })?
            }
        };
        match values.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = entry.value,
            None => values.push((name, entry.value)),
        }
    }

    for (name, value) in &values {
        let spec = schema
            .get_attribute(name)
            .ok_or_else(|| AnnotationError::UnknownAttribute {
                type_id: type_id.to_string(),
                name: name.clone(),
            })?;
        if value.is_null() && spec.nullable {
            continue;
        }
        check_type(name, value, &spec.ty, registry)?;
    }

    let missing: Vec<String> = schema
        .attributes
        .iter()
        .filter(|spec| spec.required && spec.default.is_none())
        .filter(|spec| !values.iter().any(|(n, _)| *n == spec.name))
        .map(|spec| spec.name.clone())
        .collect();
    if !missing.is_empty() {
        return Err(AnnotationError::MissingAttributes {
            type_id: type_id.to_string(),
            names: missing,
        }
        .into());
    }

    let params = schema.constructor_params.as_deref().unwrap_or(&[]);
    let args: Vec<Value> = params
        .iter()
        .map(|param| {
            match values.iter().position(|(n, _)| n == param) {
                Some(index) => values.remove(index).1,
                None => schema
                    .get_attribute(param)
                    .and_then(|spec| spec.default.clone())
                    .unwrap_or_else(Value::null),
            }
        })
        .collect();
    let mut object = resolved.binding.construct(args)?;

    let mut assignments: Vec<(String, Value)> = schema
        .attributes
        .iter()
        .filter(|spec| !params.contains(&spec.name))
        .filter(|spec| !values.iter().any(|(n, _)| *n == spec.name))
        .filter_map(|spec| spec.default.clone().map(|d| (spec.name.clone(), d)))
        .collect();
    assignments.extend(values);

    for (name, value) in assignments {
        let accessor = resolved
            .accessor(&name)
            .ok_or_else(|| AnnotationError::NoAccessor {
                type_id: type_id.to_string(),
                name: name.clone(),
            })?;
        accessor(&mut *object, value)?;
    }

    trace!(type_id = %type_id, context = %context, "built annotation instance");
    Ok(Instance::new(type_id, object))
}
