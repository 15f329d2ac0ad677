//! Reading fixture classes, members and functions end to end.

use quill_core::{AnnotationError, Error, Target, Value, ValueList};
use quill_dsl::{AnnotationReader, StaticDocs};
use quill_test_utils::assertions::{assert_annotation_error, only_instance};
use quill_test_utils::fixtures::{self, Array, Constructor, Foo, Inherited, Route};
use std::sync::Arc;

fn reader() -> AnnotationReader<StaticDocs> {
    AnnotationReader::new(Arc::new(fixtures::registry()), fixtures::docs())
}

fn list(values: Vec<Value>) -> Value {
    Value::List(values.into_iter().collect::<ValueList>())
}

#[test]
fn test_read_class() {
    let comment = reader().read_class("fixtures::TestClass").unwrap();
    assert_eq!(comment.description(), "Test class.");
    assert_eq!(comment.get("see"), Ok(&Value::from("foo")));
    assert!(comment.has_annotation_type(fixtures::FOO));

    let foos = comment.annotation_type(fixtures::FOO).unwrap();
    assert_eq!(foos.len(), 2);
    let first = foos[0].downcast_ref::<Foo>().unwrap();
    let second = foos[1].downcast_ref::<Foo>().unwrap();
    assert_eq!(first.value, Some(Value::from("foo")));
    assert_eq!(first.named(), Some(&Value::from("foobar")));
    assert_eq!(first.enum_value, Some(Value::from("bar")));
    assert_eq!(
        first.array,
        Some(list(vec![Value::from("string"), Value::from(2i64)]))
    );
    assert_eq!(second.value, Some(Value::from("foobar")));
    assert_eq!(second.named(), None);
}

#[test]
fn test_constructor_defaults() {
    let comment = reader().read_class("fixtures::TestClass").unwrap();
    let built = comment.annotation_type(fixtures::CONSTRUCTOR).unwrap();
    let first = built[0].downcast_ref::<Constructor>().unwrap();
    let second = built[1].downcast_ref::<Constructor>().unwrap();
    assert_eq!(first.one, Value::from(8i64));
    assert_eq!(first.two, Value::from("something"));
    assert_eq!(second.one, Value::from(8i64));
    assert_eq!(second.two, Value::from(6i64));
}

#[test]
fn test_arrays() {
    let reader = reader();

    let comment = reader.read_class("fixtures::SimpleArray").unwrap();
    let simple = only_instance::<Array>(&comment, fixtures::ARRAY);
    assert_eq!(
        simple.simple,
        Some(list(vec![
            Value::from("foo"),
            Value::from("bar"),
            Value::from("baz")
        ]))
    );

    let comment = reader.read_class("fixtures::ComplexArray").unwrap();
    let complex = only_instance::<Inherited>(&comment, fixtures::INHERITED);
    assert_eq!(complex.complex.as_ref().and_then(Value::as_list).map(|l| l.len()), Some(3));
}

#[test]
fn test_array_type_errors() {
    let reader = reader();
    assert_annotation_error(
        &reader.read_class("fixtures::InvalidSimpleArray"),
        "Attribute simple[3] must be of type string, integer given",
    );
    assert_annotation_error(
        &reader.read_class("fixtures::InvalidComplexArray"),
        "Attribute complex[0][1] must be of type integer, string given",
    );
}

#[test]
fn test_enum_and_required_errors() {
    let reader = reader();
    assert_annotation_error(
        &reader.read_class("fixtures::WrongEnumValueClass"),
        "Attribute enum must be one of foo, bar, foobar",
    );
    assert_annotation_error(
        &reader.read_class("fixtures::MissingAnnotationParameterClass"),
        "Attribute value is required",
    );
}

#[test]
fn test_read_members_and_functions() {
    let reader = reader();
    assert_eq!(
        reader.read_function("fixtures::foo_function").unwrap().description(),
        "Function docs."
    );
    assert_eq!(
        reader.read_method("fixtures::TestClass", "method").unwrap().get("foo"),
        Ok(&Value::Flag)
    );
    assert_eq!(
        reader
            .read_property("fixtures::TestClass", "property")
            .unwrap()
            .description(),
        "Property"
    );

    let comment = reader.read_method("fixtures::TestClass", "show").unwrap();
    let route = only_instance::<Route>(&comment, fixtures::ROUTE);
    assert_eq!(route.path, "/show");
    assert_eq!(route.methods, vec!["GET".to_string(), "HEAD".to_string()]);
}

#[test]
fn test_listings() {
    let reader = reader();
    let properties: Vec<String> = reader
        .read_properties("fixtures::TestClass")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(properties, vec!["property".to_string()]);

    let methods: Vec<String> = reader
        .read_methods("fixtures::TestClass")
        .unwrap()
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(methods, vec!["method".to_string(), "show".to_string()]);
}

#[test]
fn test_route_defaults_and_target() {
    let docs = StaticDocs::new()
        .method("fixtures::Api", "list", "/** @Route('/items') */")
        .class("fixtures::Api", "/** @Route('/api') */");
    let reader = AnnotationReader::new(Arc::new(fixtures::registry()), docs);

    let comment = reader.read_method("fixtures::Api", "list").unwrap();
    let route = only_instance::<Route>(&comment, fixtures::ROUTE);
    assert_eq!(route.methods, vec!["GET".to_string()]);

    let err = reader.read_class("fixtures::Api").unwrap_err();
    assert!(matches!(
        err,
        Error::Annotation(AnnotationError::InvalidTarget { ref target, .. }) if target == "class"
    ));
}

#[test]
fn test_schemas_from_docblocks() {
    let registry = fixtures::registry();

    let foo = registry.resolve_schema(fixtures::FOO).unwrap();
    assert_eq!(foo.default_attribute.as_deref(), Some("value"));
    assert_eq!(foo.targets, Target::CLASS);
    assert_eq!(
        foo.get_attribute("named").and_then(|a| a.setter.as_deref()),
        Some("set_named")
    );

    let route = registry.resolve_schema(fixtures::ROUTE).unwrap();
    assert_eq!(route.targets, Target::METHOD | Target::FUNCTION);

    let inherited = registry.resolve_schema(fixtures::INHERITED).unwrap();
    assert_eq!(inherited.parent.as_deref(), Some(fixtures::ARRAY));
    assert!(inherited.get_attribute("complex").is_some());
    assert_eq!(inherited.targets, Target::CLASS);
    assert!(registry.is_subtype(fixtures::INHERITED, fixtures::ARRAY));

    let constructor = registry.resolve_schema(fixtures::CONSTRUCTOR).unwrap();
    assert_eq!(
        constructor.constructor_params,
        Some(vec!["one".to_string(), "two".to_string()])
    );
    let two = constructor.get_attribute("two").unwrap();
    assert!(!two.required);
    assert_eq!(two.default, Some(Value::from(6i64)));
}
