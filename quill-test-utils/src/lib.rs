//! quill Test Utilities
//!
//! Centralized test infrastructure for the quill workspace:
//! - Proptest generators for tag sources and values
//! - Host annotation types declared from their docblocks
//! - Custom assertions for quill errors

// Re-export core types for convenience
pub use quill_core::{
    AnnotationError, Comment, Error, Instance, QuillResult, Scalar, SyntaxError, Target,
    TypeBinding, Value, ValueList,
};
pub use quill_dsl::{Parser, SchemaRegistry, Scope, StaticDocs, TypeDeclaration};

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for tag sources.

    use super::*;
    use proptest::prelude::*;

    /// Tag names: a letter, then letters, digits or underscores.
    pub fn arb_tag_name() -> impl Strategy<Value = String> {
        "[a-z][a-zA-Z0-9_]{0,11}"
    }

    /// Plain tag text: words without tag or list syntax.
    pub fn arb_plain_text() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z0-9.$_-]{1,8}", 1..5).prop_map(|words| words.join(" "))
    }

    /// Description text that never starts a line with `@`.
    pub fn arb_description() -> impl Strategy<Value = String> {
        prop::collection::vec("[a-zA-Z][a-zA-Z0-9 ,.]{0,30}", 0..4)
            .prop_map(|lines| lines.join("\n").trim().to_string())
    }

    /// A single placement context.
    pub fn arb_target() -> impl Strategy<Value = Target> {
        prop_oneof![
            Just(Target::CLASS),
            Just(Target::METHOD),
            Just(Target::PROPERTY),
            Just(Target::FUNCTION),
            Just(Target::ANNOTATION),
        ]
    }

    /// Any combination of placement contexts.
    pub fn arb_target_mask() -> impl Strategy<Value = Target> {
        (0u8..32).prop_map(Target::from_bits_truncate)
    }

    /// A list literal and the value it denotes.
    pub fn arb_literal() -> impl Strategy<Value = (String, Value)> {
        prop_oneof![
            any::<bool>().prop_map(|b| (b.to_string(), Value::from(b))),
            Just(("null".to_string(), Value::null())),
            (0i64..1_000_000).prop_map(|i| (i.to_string(), Value::from(i))),
            (0u32..10_000, 1u32..100).prop_map(|(whole, frac)| {
                let text = format!("{}.{}", whole, frac);
                let value = Value::from(text.parse::<f64>().unwrap_or_default());
                (text, value)
            }),
            "[a-zA-Z0-9 _./-]{0,12}".prop_map(|s| (format!("'{}'", s), Value::string(s))),
        ]
    }

    /// A plain `{...}` list source and its parsed value.
    pub fn arb_plain_list() -> impl Strategy<Value = (String, Value)> {
        prop::collection::vec(arb_literal(), 0..6).prop_map(|items| {
            let source = items
                .iter()
                .map(|(text, _)| text.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            let values: ValueList = items.into_iter().map(|(_, value)| value).collect();
            (format!("{{{}}}", source), Value::List(values))
        })
    }

    /// A docblock of plain tags with unique names, and the expected tags.
    pub fn arb_plain_docblock() -> impl Strategy<Value = (String, String, Vec<(String, Value)>)> {
        let tag = (
            arb_tag_name(),
            prop_oneof![
                Just((String::new(), Value::Flag)),
                arb_plain_text().prop_map(|t| (format!(" {}", t), Value::string(t))),
                arb_plain_list(),
            ],
        );
        (arb_description(), prop::collection::vec(tag, 0..6)).prop_map(|(description, tags)| {
            let mut expected: Vec<(String, Value)> = Vec::new();
            let mut lines = Vec::new();
            for (name, (source, value)) in tags {
                lines.push(format!(" * @{}{}", name, source));
                match expected.iter_mut().find(|(n, _)| *n == name) {
                    Some(slot) => slot.1 = value,
                    None => expected.push((name, value)),
                }
            }
            let body = description
                .lines()
                .map(|line| format!(" * {}", line))
                .chain(lines)
                .collect::<Vec<_>>()
                .join("\n");
            (format!("/**\n{}\n */", body), description, expected)
        })
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Host annotation types declared from their docblocks, in namespace
    //! `fixtures`.

    use super::*;

    pub const FOO: &str = "fixtures::Foo";
    pub const CONSTRUCTOR: &str = "fixtures::Constructor";
    pub const ARRAY: &str = "fixtures::Array";
    pub const INHERITED: &str = "fixtures::Inherited";
    pub const ROUTE: &str = "fixtures::Route";

    pub const FOO_DOC: &str = r#"/**
 * @Annotation
 * @DefaultAttribute value
 * @Attribute('value', required: true)
 * @Attribute('named', setter: 'set_named')
 * @Attribute('array', type: {'string', 'int'})
 * @Attribute('enum', type: @Enum({'foo', 'bar', 'foobar'}))
 * @Target('class')
 */"#;

    pub const CONSTRUCTOR_DOC: &str = r#"/**
 * @Annotation
 * @DefaultAttribute two
 * @Attribute('one', default: 8)
 * @Attribute('two')
 * @Target('class')
 */"#;

    pub const ARRAY_DOC: &str = r#"/**
 * @Annotation
 * @Attribute('simple', type: {'string'})
 * @Attribute('complex', type: {{'string', 'int'}})
 */"#;

    pub const INHERITED_DOC: &str = "/** @Annotation */";

    pub const ROUTE_DOC: &str = r#"/**
 * Maps a method to a path.
 *
 * @Annotation
 * @DefaultAttribute path
 * @Attribute('path', type: 'string', required: true)
 * @Attribute('methods', type: {'string'}, default: {'GET'})
 * @Target{method, function}
 */"#;

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Foo {
        pub value: Option<Value>,
        pub array: Option<Value>,
        pub enum_value: Option<Value>,
        named: Option<Value>,
    }

    impl Foo {
        pub fn set_named(&mut self, named: Value) {
            self.named = Some(named);
        }

        pub fn named(&self) -> Option<&Value> {
            self.named.as_ref()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct Constructor {
        pub one: Value,
        pub two: Value,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Array {
        pub simple: Option<Value>,
        pub complex: Option<Value>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Inherited {
        pub simple: Option<Value>,
        pub complex: Option<Value>,
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    pub struct Route {
        pub path: String,
        pub methods: Vec<String>,
    }

    fn strings(value: &Value) -> Vec<String> {
        value
            .as_list()
            .map(|list| list.values().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn foo_binding() -> TypeBinding {
        TypeBinding::new::<Foo>()
            .field("value", |f: &mut Foo, v: Value| {
                f.value = Some(v);
                Ok(())
            })
            .field("array", |f: &mut Foo, v: Value| {
                f.array = Some(v);
                Ok(())
            })
            .field("enum", |f: &mut Foo, v: Value| {
                f.enum_value = Some(v);
                Ok(())
            })
            .setter("set_named", |f: &mut Foo, v: Value| {
                f.set_named(v);
                Ok(())
            })
    }

    pub fn constructor_binding() -> TypeBinding {
        let params = vec![
            quill_core::ParamSpec::new("one").default_value(5i64),
            quill_core::ParamSpec::new("two").default_value(6i64),
        ];
        TypeBinding::with_constructor(params, |args: Vec<Value>| {
            let mut args = args.into_iter();
            Ok(Constructor {
                one: args.next().unwrap_or_else(Value::null),
                two: args.next().unwrap_or_else(Value::null),
            })
        })
    }

    pub fn array_binding() -> TypeBinding {
        TypeBinding::new::<Array>()
            .field("simple", |a: &mut Array, v: Value| {
                a.simple = Some(v);
                Ok(())
            })
            .field("complex", |a: &mut Array, v: Value| {
                a.complex = Some(v);
                Ok(())
            })
    }

    pub fn inherited_binding() -> TypeBinding {
        TypeBinding::new::<Inherited>()
            .field("simple", |a: &mut Inherited, v: Value| {
                a.simple = Some(v);
                Ok(())
            })
            .field("complex", |a: &mut Inherited, v: Value| {
                a.complex = Some(v);
                Ok(())
            })
    }

    pub fn route_binding() -> TypeBinding {
        TypeBinding::new::<Route>()
            .field("path", |r: &mut Route, v: Value| {
                r.path = v.as_str().unwrap_or_default().to_string();
                Ok(())
            })
            .field("methods", |r: &mut Route, v: Value| {
                r.methods = strings(&v);
                Ok(())
            })
    }

    /// Registry with every fixture type declared.
    pub fn registry() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        declare_all(&registry);
        registry
    }

    pub fn declare_all(registry: &SchemaRegistry) {
        let declarations = [
            TypeDeclaration::new(FOO, FOO_DOC, foo_binding()).constant("BAR", "foobar"),
            TypeDeclaration::new(CONSTRUCTOR, CONSTRUCTOR_DOC, constructor_binding()),
            TypeDeclaration::new(ARRAY, ARRAY_DOC, array_binding()),
            TypeDeclaration::new(INHERITED, INHERITED_DOC, inherited_binding()).parent(ARRAY),
            TypeDeclaration::new(ROUTE, ROUTE_DOC, route_binding()),
        ];
        for declaration in declarations {
            let type_id = declaration.type_id.clone();
            if let Err(e) = registry.declare(declaration) {
                panic!("fixture {} failed to declare: {}", type_id, e);
            }
        }
    }

    /// Scope of code living in the `fixtures` namespace.
    pub fn scope() -> Scope {
        Scope::new().namespace("fixtures")
    }

    /// Docblocks of the classes and members the reader tests use.
    pub fn docs() -> StaticDocs {
        StaticDocs::new()
            .class(
                "fixtures::TestClass",
                r#"/**
 * Test class.
 *
 * @see foo
 * @Foo('foo', named: 'foobar', enum: 'bar', array: {'string', 2})
 * @Foo(value: Foo::BAR)
 * @Constructor(two: 'something')
 * @Constructor()
 */"#,
            )
            .property("fixtures::TestClass", "property", "/**\n * Property\n */")
            .method("fixtures::TestClass", "method", "/**\n * @foo\n */")
            .method("fixtures::TestClass", "show", "/** @Route('/show', methods: {'GET', 'HEAD'}) */")
            .class("fixtures::SimpleArray", "/** @Array(simple: {'foo', 'bar', 'baz'}) */")
            .class(
                "fixtures::ComplexArray",
                "/** @Inherited(complex: {{'foo', 1}, {'bar', 2}, {'baz', 3}}) */",
            )
            .class(
                "fixtures::InvalidSimpleArray",
                "/** @Array(simple: {'foo', 'bar', 'baz', 2}) */",
            )
            .class(
                "fixtures::InvalidComplexArray",
                "/** @Inherited(complex: {{'foo', 'bar'}, {'bar', 2}, {'baz', 3}}) */",
            )
            .class("fixtures::WrongEnumValueClass", "/** @Foo('foo', enum: 'br') */")
            .class("fixtures::MissingAnnotationParameterClass", "/** @Foo(named: 'foo') */")
            .function("fixtures::foo_function", "/**\n * Function docs.\n */")
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Custom assertion functions for quill errors.

    use super::*;

    /// Assert that a QuillResult is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &QuillResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a QuillResult is a syntax error.
    #[track_caller]
    pub fn assert_syntax_error<T: std::fmt::Debug>(result: &QuillResult<T>) {
        match result {
            Err(Error::Syntax(_)) => {}
            other => panic!("Expected Syntax error, got: {:?}", other),
        }
    }

    /// Assert that a QuillResult is an annotation error with the given message.
    #[track_caller]
    pub fn assert_annotation_error<T: std::fmt::Debug>(result: &QuillResult<T>, message: &str) {
        match result {
            Err(Error::Annotation(e)) => assert_eq!(e.to_string(), message),
            other => panic!("Expected Annotation error '{}', got: {:?}", message, other),
        }
    }

    /// Fetch the single instance of `type_id` and downcast it.
    #[track_caller]
    pub fn only_instance<'c, T: 'static>(comment: &'c Comment, type_id: &str) -> &'c T {
        let instances = comment
            .annotation_type(type_id)
            .unwrap_or_else(|e| panic!("{}", e));
        assert_eq!(instances.len(), 1, "Expected one {} instance", type_id);
        instances[0]
            .downcast_ref::<T>()
            .unwrap_or_else(|| panic!("{} instance has another host type", type_id))
    }
}
