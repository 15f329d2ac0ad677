//! Reading docblocks of program elements

use crate::parser::Parser;
use crate::registry::{SchemaRegistry, Scope};
use bitflags::bitflags;
use quill_core::{AnnotationError, Comment, QuillResult, Target};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

bitflags! {
    /// Member visibility, used to filter method and property listings.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Visibility: u8 {
        const PUBLIC = 1;
        const PROTECTED = 2;
        const PRIVATE = 4;
    }
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::PUBLIC
    }
}

/// A program element that carries a docblock.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Element {
    Class(String),
    Method { class: String, name: String },
    Property { class: String, name: String },
    Function(String),
}

impl Element {
    /// Placement context type-tags on this element are built in.
    pub fn target(&self) -> Target {
        match self {
            Element::Class(_) => Target::CLASS,
            Element::Method { .. } => Target::METHOD,
            Element::Property { .. } => Target::PROPERTY,
            Element::Function(_) => Target::FUNCTION,
        }
    }

    /// Class or function that owns the element's source.
    pub fn owner(&self) -> &str {
        match self {
            Element::Class(class) => class,
            Element::Method { class, .. } | Element::Property { class, .. } => class,
            Element::Function(name) => name,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Class(class) => write!(f, "{}", class),
            Element::Method { class, name } => write!(f, "{}::{}()", class, name),
            Element::Property { class, name } => write!(f, "{}::${}", class, name),
            Element::Function(name) => write!(f, "{}()", name),
        }
    }
}

/// Where docblocks come from.
pub trait DocSource: Send + Sync {
    /// Docblock of `element`: `None` when the element does not exist,
    /// `Some("")` when it exists without documentation.
    fn doc(&self, element: &Element) -> Option<&str>;

    /// Methods of `class` with one of the `filter` visibilities, in
    /// declaration order.
    fn methods(&self, class: &str, filter: Visibility) -> Vec<String>;

    fn properties(&self, class: &str, filter: Visibility) -> Vec<String>;

    /// Namespace and imports in effect where `element` is written.
    fn scope(&self, element: &Element) -> Scope {
        Scope::of_type(element.owner())
    }
}

#[derive(Debug, Clone, Default)]
struct ClassDocs {
    doc: String,
    methods: Vec<(String, Visibility, String)>,
    properties: Vec<(String, Visibility, String)>,
    imports: HashMap<String, String>,
}

/// In-memory [`DocSource`].
#[derive(Debug, Clone, Default)]
pub struct StaticDocs {
    classes: HashMap<String, ClassDocs>,
    functions: HashMap<String, String>,
}

impl StaticDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn class(mut self, class: impl Into<String>, doc: impl Into<String>) -> Self {
        self.classes.entry(class.into()).or_default().doc = doc.into();
        self
    }

    pub fn method(
        self,
        class: impl Into<String>,
        name: impl Into<String>,
        doc: impl Into<String>,
    ) -> Self {
        self.method_with(class, name, Visibility::PUBLIC, doc)
    }

    pub fn method_with(
        mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        doc: impl Into<String>,
    ) -> Self {
        let entry = self.classes.entry(class.into()).or_default();
        upsert(&mut entry.methods, name.into(), visibility, doc.into());
        self
    }

    pub fn property(
        self,
        class: impl Into<String>,
        name: impl Into<String>,
        doc: impl Into<String>,
    ) -> Self {
        self.property_with(class, name, Visibility::PUBLIC, doc)
    }

    pub fn property_with(
        mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        visibility: Visibility,
        doc: impl Into<String>,
    ) -> Self {
        let entry = self.classes.entry(class.into()).or_default();
        upsert(&mut entry.properties, name.into(), visibility, doc.into());
        self
    }

    pub fn function(mut self, name: impl Into<String>, doc: impl Into<String>) -> Self {
        self.functions.insert(name.into(), doc.into());
        self
    }

    /// Import alias visible in the docblocks of `class`.
    pub fn import(
        mut self,
        class: impl Into<String>,
        alias: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.classes
            .entry(class.into())
            .or_default()
            .imports
            .insert(alias.into(), target.into());
        self
    }
}

fn upsert(
    members: &mut Vec<(String, Visibility, String)>,
    name: String,
    visibility: Visibility,
    doc: String,
) {
    match members.iter_mut().find(|(n, _, _)| *n == name) {
        Some(member) => *member = (name, visibility, doc),
        None => members.push((name, visibility, doc)),
    }
}

fn member_doc<'a>(members: &'a [(String, Visibility, String)], name: &str) -> Option<&'a str> {
    members
        .iter()
        .find(|(n, _, _)| n == name)
        .map(|(_, _, doc)| doc.as_str())
}

fn filtered(members: &[(String, Visibility, String)], filter: Visibility) -> Vec<String> {
    members
        .iter()
        .filter(|(_, visibility, _)| visibility.intersects(filter))
        .map(|(name, _, _)| name.clone())
        .collect()
}

impl DocSource for StaticDocs {
    fn doc(&self, element: &Element) -> Option<&str> {
        match element {
            Element::Class(class) => self.classes.get(class).map(|c| c.doc.as_str()),
            Element::Method { class, name } => self
                .classes
                .get(class)
                .and_then(|c| member_doc(&c.methods, name)),
            Element::Property { class, name } => self
                .classes
                .get(class)
                .and_then(|c| member_doc(&c.properties, name)),
            Element::Function(name) => self.functions.get(name).map(String::as_str),
        }
    }

    fn methods(&self, class: &str, filter: Visibility) -> Vec<String> {
        self.classes
            .get(class)
            .map(|c| filtered(&c.methods, filter))
            .unwrap_or_default()
    }

    fn properties(&self, class: &str, filter: Visibility) -> Vec<String> {
        self.classes
            .get(class)
            .map(|c| filtered(&c.properties, filter))
            .unwrap_or_default()
    }

    fn scope(&self, element: &Element) -> Scope {
        let mut scope = Scope::of_type(element.owner());
        if let Some(class) = self.classes.get(element.owner()) {
            scope.imports.extend(class.imports.clone());
        }
        scope
    }
}

/// Parses the docblocks of program elements in their placement context.
pub struct AnnotationReader<S: DocSource> {
    registry: Arc<SchemaRegistry>,
    source: S,
}

impl<S: DocSource> AnnotationReader<S> {
    pub fn new(registry: Arc<SchemaRegistry>, source: S) -> Self {
        Self { registry, source }
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn read(&self, element: &Element) -> QuillResult<Comment> {
        let doc = self
            .source
            .doc(element)
            .ok_or_else(|| AnnotationError::UnknownElement {
                element: element.to_string(),
            })?;
        debug!(element = %element, "reading docblock");
        Parser::new(&self.registry)
            .with_scope(self.source.scope(element))
            .parse(doc, element.target())
    }

    pub fn read_class(&self, class: &str) -> QuillResult<Comment> {
        self.read(&Element::Class(class.to_string()))
    }

    pub fn read_method(&self, class: &str, method: &str) -> QuillResult<Comment> {
        self.read(&Element::Method {
            class: class.to_string(),
            name: method.to_string(),
        })
    }

    pub fn read_property(&self, class: &str, property: &str) -> QuillResult<Comment> {
        self.read(&Element::Property {
            class: class.to_string(),
            name: property.to_string(),
        })
    }

    pub fn read_function(&self, function: &str) -> QuillResult<Comment> {
        self.read(&Element::Function(function.to_string()))
    }

    /// Public methods of `class` with their parsed docblocks.
    pub fn read_methods(&self, class: &str) -> QuillResult<Vec<(String, Comment)>> {
        self.read_methods_with(class, Visibility::PUBLIC)
    }

    pub fn read_methods_with(
        &self,
        class: &str,
        filter: Visibility,
    ) -> QuillResult<Vec<(String, Comment)>> {
        self.source
            .methods(class, filter)
            .into_iter()
            .map(|name| {
                let comment = self.read_method(class, &name)?;
                Ok((name, comment))
            })
            .collect()
    }

    /// Public properties of `class` with their parsed docblocks.
    pub fn read_properties(&self, class: &str) -> QuillResult<Vec<(String, Comment)>> {
        self.read_properties_with(class, Visibility::PUBLIC)
    }

    pub fn read_properties_with(
        &self,
        class: &str,
        filter: Visibility,
    ) -> QuillResult<Vec<(String, Comment)>> {
        self.source
            .properties(class, filter)
            .into_iter()
            .map(|name| {
                let comment = self.read_property(class, &name)?;
                Ok((name, comment))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{AnnotationSchema, AttributeSpec, Error, TypeBinding, Value};

    fn reader() -> AnnotationReader<StaticDocs> {
        let registry = SchemaRegistry::new();
        let schema = AnnotationSchema::new()
            .default_attribute("path")
            .targets(Target::METHOD | Target::FUNCTION)
            .attribute(AttributeSpec::new("path").required());
        registry
            .register_annotation("web::Route", schema, TypeBinding::record())
            .unwrap();

        let docs = StaticDocs::new()
            .class("app::Controller", "/** Handles pages. */")
            .method("app::Controller", "index", "/** @Route('/') */")
            .method_with("app::Controller", "helper", Visibility::PRIVATE, "/** @internal */")
            .property("app::Controller", "name", "/** @var string */")
            .function("app::health", "/** @Route('/health') */")
            .import("app::Controller", "Route", "web::Route");
        AnnotationReader::new(Arc::new(registry), docs)
    }

    #[test]
    fn test_reads_each_element_kind() {
        let reader = reader();
        assert_eq!(
            reader.read_class("app::Controller").unwrap().description(),
            "Handles pages."
        );
        assert!(reader
            .read_method("app::Controller", "index")
            .unwrap()
            .has_annotation_type("web::Route"));
        assert_eq!(
            reader.read_property("app::Controller", "name").unwrap().get("var"),
            Ok(&Value::from("string"))
        );
    }

    #[test]
    fn test_placement_context_follows_element() {
        let docs = StaticDocs::new().property("app::Controller", "p", "/** @web::Route('/') */");
        let reader = AnnotationReader::new(reader().registry().clone(), docs);
        let err = reader.read_property("app::Controller", "p").unwrap_err();
        assert!(matches!(
            err,
            Error::Annotation(AnnotationError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_function_without_import_fails() {
        let reader = reader();
        let err = reader.read_function("app::health").unwrap_err();
        assert!(matches!(
            err,
            Error::Annotation(AnnotationError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_listings_filter_visibility() {
        let reader = reader();
        let methods = reader.read_methods("app::Controller").unwrap();
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].0, "index");

        let all = reader
            .read_methods_with("app::Controller", Visibility::all())
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[1].1.has("internal"));

        assert_eq!(reader.read_properties("app::Controller").unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_element() {
        let reader = reader();
        let err = reader.read_method("app::Controller", "missing").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Annotation error: app::Controller::missing() does not exist"
        );
    }
}
