//! Parser module for quill docblocks
//!
//! A docblock is split into a free-text description and a tag section. The
//! tag section is tokenized once and walked by a single [`TagParser`]
//! cursor; nested type-tags are built on the way.

pub mod parser;

pub use parser::*;

use crate::lexer::tokenize;
use crate::registry::{SchemaRegistry, Scope};
use once_cell::sync::Lazy;
use quill_core::{Comment, QuillResult, Target};
use regex::Regex;

static LINE_DECORATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\*[ \t]?").expect("Invalid decoration regex"));

static TAG_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*(@)[A-Za-z]").expect("Invalid tag start regex"));

/// Remove comment delimiters and the leading `*` of each line.
pub fn strip_decoration(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c| c == '/' || c == '*');
    LINE_DECORATION.replace_all(trimmed, "").into_owned()
}

/// Split text into the description and the tag section.
///
/// The tag section starts at the `@` of the first line that begins with a
/// tag; the description is everything before it, trimmed.
pub fn split_description(text: &str) -> (&str, &str) {
    match TAG_START.captures(text).and_then(|c| c.get(1)) {
        Some(at) => (text[..at.start()].trim(), &text[at.start()..]),
        None => (text.trim(), ""),
    }
}

/// Parses docblocks against a schema registry.
#[derive(Debug, Clone)]
pub struct Parser<'r> {
    registry: &'r SchemaRegistry,
    scope: Scope,
}

impl<'r> Parser<'r> {
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            scope: Scope::new(),
        }
    }

    /// Namespace and imports used to resolve names in tags.
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Parse `raw` as found on an element of kind `context`.
    pub fn parse(&self, raw: &str, context: Target) -> QuillResult<Comment> {
        let text = strip_decoration(raw);
        let (description, tags) = split_description(&text);
        let mut comment = Comment::new(description);
        if tags.trim().is_empty() {
            return Ok(comment);
        }

        let tokens = tokenize(tags);
        TagParser::new(tags, tokens, self.registry, &self.scope).parse_into(&mut comment, context)?;
        Ok(comment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{
        AnnotationError, AnnotationSchema, AttributeSpec, Error, Record, TypeBinding,
        TypeDescriptor, Value, ValueList,
    };

    fn registry() -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        let foo = AnnotationSchema::new()
            .default_attribute("value")
            .targets(Target::CLASS | Target::METHOD)
            .attribute(AttributeSpec::new("value").ty(TypeDescriptor::String).required())
            .attribute(AttributeSpec::new("n").ty(TypeDescriptor::Integer))
            .attribute(AttributeSpec::new("inner"));
        registry
            .register_annotation("app::Foo", foo, TypeBinding::record())
            .unwrap();
        let leaf = AnnotationSchema::new()
            .default_attribute("name")
            .targets(Target::ANNOTATION)
            .attribute(AttributeSpec::new("name"));
        registry
            .register_annotation("app::Leaf", leaf, TypeBinding::record())
            .unwrap();
        registry.register_constant("LIMIT", 10i64);
        registry
    }

    fn parse(source: &str) -> QuillResult<Comment> {
        let registry = registry();
        Parser::new(&registry)
            .with_scope(Scope::new().namespace("app"))
            .parse(source, Target::CLASS)
    }

    fn record(comment: &Comment, type_id: &str) -> Record {
        comment.annotation_type(type_id).unwrap()[0]
            .downcast_ref::<Record>()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_strip_decoration() {
        let raw = "/**\n * Summary line\n *\n * @flag\n */";
        assert_eq!(strip_decoration(raw).trim(), "Summary line\n\n@flag");
    }

    #[test]
    fn test_split_requires_tag_at_line_start() {
        let (description, tags) = split_description("mail me at a@b.c\n@since 1.0");
        assert_eq!(description, "mail me at a@b.c");
        assert_eq!(tags, "@since 1.0");

        let (description, tags) = split_description("no tags here");
        assert_eq!(description, "no tags here");
        assert_eq!(tags, "");
    }

    #[test]
    fn test_description_only() {
        let comment = parse("/** Just words. */").unwrap();
        assert_eq!(comment.description(), "Just words.");
        assert_eq!(comment.tags().count(), 0);
        assert_eq!(comment.annotations().count(), 0);
    }

    #[test]
    fn test_plain_tags() {
        let comment = parse("/**\n * @deprecated\n * @since 1.2 beta\n * @list{1, two, 'x y'}\n */")
            .unwrap();
        assert_eq!(comment.get("deprecated"), Ok(&Value::Flag));
        assert_eq!(comment.get("since"), Ok(&Value::from("1.2 beta")));
        let list: ValueList = vec![Value::from(1i64), Value::from("two"), Value::from("x y")]
            .into_iter()
            .collect();
        assert_eq!(comment.get("list"), Ok(&Value::List(list)));
    }

    #[test]
    fn test_plain_tags_on_one_line() {
        let comment = parse("@a @b text").unwrap();
        assert_eq!(comment.get("a"), Ok(&Value::Flag));
        assert_eq!(comment.get("b"), Ok(&Value::from("text")));
    }

    #[test]
    fn test_later_plain_tag_overwrites() {
        let comment = parse("@since 1\n@since 2").unwrap();
        assert_eq!(comment.get("since"), Ok(&Value::from("2")));
    }

    #[test]
    fn test_plain_list_rejects_symbols() {
        let err = parse("@tags{a-b}").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
        let err = parse("@tags text {a, 'b}").unwrap_err();
        assert!(matches!(err, Error::Syntax(_)));
    }

    #[test]
    fn test_plain_list_replaces_surrounding_text() {
        let comment = parse("@param {string} name
@var array {a, b}
@since 2").unwrap();
        let param: ValueList = vec![Value::from("string")].into_iter().collect();
        assert_eq!(comment.get("param"), Ok(&Value::List(param)));
        let var: ValueList = vec![Value::from("a"), Value::from("b")].into_iter().collect();
        assert_eq!(comment.get("var"), Ok(&Value::List(var)));
        assert_eq!(comment.get("since"), Ok(&Value::from("2")));

        let comment = parse("@tags {a} trailing {b} @next").unwrap();
        let tags: ValueList = vec![Value::from("a")].into_iter().collect();
        assert_eq!(comment.get("tags"), Ok(&Value::List(tags)));
        assert_eq!(comment.get("next"), Ok(&Value::Flag));
    }

    #[test]
    fn test_type_tag_with_positional_and_named() {
        let comment = parse("@Foo('x', n: 3)").unwrap();
        let foo = record(&comment, "app::Foo");
        assert_eq!(foo.get("value"), Some(&Value::from("x")));
        assert_eq!(foo.get("n"), Some(&Value::from(3i64)));
    }

    #[test]
    fn test_constants_and_nested_instances() {
        let comment = parse("@Foo('x', n: LIMIT, inner: {@Leaf('a'), @Leaf(name: 'b')})").unwrap();
        let foo = record(&comment, "app::Foo");
        assert_eq!(foo.get("n"), Some(&Value::from(10i64)));
        let inner = foo.get("inner").and_then(Value::as_list).unwrap();
        assert_eq!(inner.len(), 2);
        let second = inner.get_index(1).and_then(Value::as_instance).unwrap();
        assert_eq!(second.type_id(), "app::Leaf");
    }

    #[test]
    fn test_nested_plain_tag_rejected() {
        let err = parse("@Foo('x', inner: @Leaf)").unwrap_err();
        assert!(matches!(
            err,
            Error::Annotation(AnnotationError::NestedPlainTag { .. })
        ));
    }

    #[test]
    fn test_positional_policy() {
        assert!(matches!(parse("@Foo('x', 'y')").unwrap_err(), Error::Syntax(_)));
        assert!(matches!(parse("@Foo(n: 1, 'x')").unwrap_err(), Error::Syntax(_)));
        assert!(parse("@Foo('x', inner: {1, 2, 3})").is_ok());
    }

    #[test]
    fn test_syntax_errors() {
        for source in [
            "@Foo('x'",
            "@Foo('x',, n: 1)",
            "@Foo(n1: 1)",
            "@Foo('x' 'y')",
            "@Foo(value = 'x')",
            "@Foo('x'}",
            "@Foo('unterminated)",
        ] {
            let err = parse(source).unwrap_err();
            assert!(matches!(err, Error::Syntax(_)), "{source}: {err}");
        }
    }

    #[test]
    fn test_unknown_type_and_target() {
        let err = parse("@Missing()").unwrap_err();
        assert!(matches!(
            err,
            Error::Annotation(AnnotationError::UnknownType { .. })
        ));

        let registry = registry();
        let err = Parser::new(&registry)
            .parse("@app::Foo('x')", Target::PROPERTY)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Annotation(AnnotationError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_instances_keep_order() {
        let comment = parse("@Foo('a')\n@Foo('b')").unwrap();
        let values: Vec<_> = comment
            .annotation_type("app::Foo")
            .unwrap()
            .iter()
            .map(|i| i.downcast_ref::<Record>().unwrap().get("value").cloned())
            .collect();
        assert_eq!(values, vec![Some(Value::from("a")), Some(Value::from("b"))]);
    }

    #[test]
    fn test_syntax_error_position() {
        let err = parse("@since 1\n@Foo('x' 'y')").unwrap_err();
        match err {
            Error::Syntax(e) => {
                assert_eq!(e.line, 2);
                assert!(e.fragment.is_some());
            }
            other => panic!("expected syntax error, got {other}"),
        }
    }
}
