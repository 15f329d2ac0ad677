//! Short name to type id resolution

use super::SchemaRegistry;
use std::collections::HashMap;

/// Namespace and import aliases in effect while a block is parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    pub namespace: Option<String>,
    /// Alias to fully qualified id or namespace.
    pub imports: HashMap<String, String>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn import(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.imports.insert(alias.into(), target.into());
        self
    }

    /// Scope of the namespace that owns `type_id`.
    pub fn of_type(type_id: &str) -> Self {
        Self {
            namespace: type_id.rsplit_once("::").map(|(ns, _)| ns.to_string()),
            imports: HashMap::new(),
        }
    }
}

/// Turns a name written in a tag into the id of a known annotation type.
pub trait NameResolver: Send + Sync {
    fn resolve(&self, name: &str, scope: &Scope, registry: &SchemaRegistry) -> Option<String>;
}

/// Lookup order: exact id, default namespace, scope namespace, import alias,
/// then an imported namespace prefix.
#[derive(Debug, Clone)]
pub struct ImportResolver {
    default_namespace: Option<String>,
    imports: HashMap<String, String>,
}

impl Default for ImportResolver {
    fn default() -> Self {
        let imports = [
            ("Attribute", super::builtins::ATTRIBUTE),
            ("Enum", super::builtins::ENUM),
            ("Target", super::builtins::TARGET),
        ]
        .into_iter()
        .map(|(alias, id)| (alias.to_string(), id.to_string()))
        .collect();
        Self {
            default_namespace: None,
            imports,
        }
    }
}

impl ImportResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    /// Add an import visible from every scope.
    pub fn import(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.imports.insert(alias.into(), target.into());
        self
    }

    fn alias<'s>(&'s self, scope: &'s Scope, name: &str) -> Option<&'s String> {
        scope.imports.get(name).or_else(|| self.imports.get(name))
    }
}

impl NameResolver for ImportResolver {
    fn resolve(&self, name: &str, scope: &Scope, registry: &SchemaRegistry) -> Option<String> {
        if registry.is_known(name) {
            return Some(name.to_string());
        }

        let namespaces = [self.default_namespace.as_deref(), scope.namespace.as_deref()];
        for namespace in namespaces.into_iter().flatten() {
            let candidate = format!("{}::{}", namespace, name);
            if registry.is_known(&candidate) {
                return Some(candidate);
            }
        }

        let candidate = match self.alias(scope, name) {
            Some(target) => target.clone(),
            None => {
                let (head, rest) = name.split_once("::")?;
                format!("{}::{}", self.alias(scope, head)?, rest)
            }
        };
        registry.is_known(&candidate).then_some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::{AnnotationSchema, Record, TypeBinding};

    fn registry_with(ids: &[&str]) -> SchemaRegistry {
        let registry = SchemaRegistry::new();
        for id in ids {
            registry
                .register_annotation(*id, AnnotationSchema::new(), TypeBinding::new::<Record>())
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_lookup_order() {
        let registry = registry_with(&["app::Route", "lib::Route", "vendor::http::Get"]);
        let resolver = ImportResolver::new().default_namespace("app");

        let scope = Scope::new().namespace("lib");
        assert_eq!(
            resolver.resolve("Route", &scope, &registry).as_deref(),
            Some("app::Route")
        );
        assert_eq!(
            resolver.resolve("lib::Route", &scope, &registry).as_deref(),
            Some("lib::Route")
        );

        let scope = Scope::new().import("http", "vendor::http");
        assert_eq!(
            resolver.resolve("http::Get", &scope, &registry).as_deref(),
            Some("vendor::http::Get")
        );
        assert!(resolver.resolve("Missing", &scope, &registry).is_none());
    }

    #[test]
    fn test_builtins_are_globally_imported() {
        let registry = SchemaRegistry::new();
        let resolver = ImportResolver::new();
        assert_eq!(
            resolver.resolve("Attribute", &Scope::new(), &registry).as_deref(),
            Some("quill::Attribute")
        );
    }

    #[test]
    fn test_scope_of_type() {
        assert_eq!(Scope::of_type("app::http::Route").namespace.as_deref(), Some("app::http"));
        assert_eq!(Scope::of_type("Route").namespace, None);
    }
}
