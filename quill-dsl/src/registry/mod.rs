//! Schema registry
//!
//! Annotation types are either registered with an explicit schema or
//! declared with their documentation text, in which case the schema is read
//! from the type's own `@Annotation`, `@Attribute`, `@Target` and
//! `@DefaultAttribute` tags the first time the type is used. Resolved types
//! are cached for the registry's lifetime.

pub mod builtins;
pub mod resolver;

pub use resolver::{ImportResolver, NameResolver, Scope};

use crate::builder;
use crate::parser::Parser;
use quill_core::{
    Accessor, AnnotationError, AnnotationSchema, AttributeSpec, Comment, ConfigError, Error,
    Instance, ParamSpec, QuillResult, Target, TypeBinding, Value, ValueList,
};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

/// Marker tag a declared type's documentation must carry.
pub const DEFAULT_MARKER_TAG: &str = "Annotation";

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static RESOLVING: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// A host type whose schema is read from its documentation text.
#[derive(Debug, Clone)]
pub struct TypeDeclaration {
    pub type_id: String,
    pub parent: Option<String>,
    pub doc: String,
    pub binding: TypeBinding,
    /// Scope the documentation text is parsed in.
    pub scope: Scope,
    pub constants: Vec<(String, Value)>,
}

impl TypeDeclaration {
    pub fn new(type_id: impl Into<String>, doc: impl Into<String>, binding: TypeBinding) -> Self {
        let type_id = type_id.into();
        Self {
            scope: Scope::of_type(&type_id),
            type_id,
            parent: None,
            doc: doc.into(),
            binding,
            constants: Vec::new(),
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn import(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.scope.imports.insert(alias.into(), target.into());
        self
    }

    pub fn constant(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constants.push((name.into(), value.into()));
        self
    }
}

/// A resolved schema with the accessor table compiled against it.
#[derive(Debug, Clone)]
pub struct ResolvedType {
    pub type_id: String,
    pub schema: Arc<AnnotationSchema>,
    pub binding: TypeBinding,
    accessors: HashMap<String, AccessorSlot>,
}

#[derive(Clone)]
struct AccessorSlot(Accessor);

impl std::fmt::Debug for AccessorSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Accessor")
    }
}

impl ResolvedType {
    fn compile(type_id: &str, schema: AnnotationSchema, binding: TypeBinding) -> Self {
        let params: HashSet<&str> = schema
            .constructor_params
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        let accessors = schema
            .attributes
            .iter()
            .filter(|spec| !params.contains(spec.name.as_str()))
            .filter_map(|spec| {
                binding
                    .accessor_for(&spec.name, spec.setter.as_deref())
                    .map(|accessor| (spec.name.clone(), AccessorSlot(accessor)))
            })
            .collect();
        Self {
            type_id: type_id.to_string(),
            schema: Arc::new(schema),
            binding,
            accessors,
        }
    }

    /// Accessor writing `attribute` after construction.
    pub fn accessor(&self, attribute: &str) -> Option<&Accessor> {
        self.accessors.get(attribute).map(|slot| &slot.0)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Explicit { parent: Option<String> },
    Declared(Arc<TypeDeclaration>),
}

/// Registry of annotation types, shared by every parse.
pub struct SchemaRegistry {
    id: u64,
    types: RwLock<HashMap<String, Entry>>,
    cache: RwLock<HashMap<String, Arc<ResolvedType>>>,
    constants: RwLock<HashMap<String, Value>>,
    resolver: Box<dyn NameResolver>,
    marker_tag: String,
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<String> = read(&self.types).keys().cloned().collect();
        ids.sort();
        f.debug_struct("SchemaRegistry")
            .field("id", &self.id)
            .field("types", &ids)
            .field("marker_tag", &self.marker_tag)
            .finish()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// Registry with the built-in types and the default import resolver.
    pub fn new() -> Self {
        Self::with_resolver(Box::new(ImportResolver::new()))
    }

    pub fn with_resolver(resolver: Box<dyn NameResolver>) -> Self {
        let registry = Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            types: RwLock::new(HashMap::new()),
            cache: RwLock::new(HashMap::new()),
            constants: RwLock::new(HashMap::new()),
            resolver,
            marker_tag: DEFAULT_MARKER_TAG.to_string(),
        };
        for (type_id, (schema, binding)) in [
            (builtins::ATTRIBUTE, builtins::attribute_type()),
            (builtins::ENUM, builtins::enum_type()),
            (builtins::TARGET, builtins::target_type()),
        ] {
            registry.insert_explicit(type_id, schema, binding);
        }
        registry
    }

    /// Use another marker tag than `@Annotation`.
    pub fn with_marker_tag(mut self, marker_tag: impl Into<String>) -> Self {
        self.marker_tag = marker_tag.into();
        self
    }

    pub fn marker_tag(&self) -> &str {
        &self.marker_tag
    }

    /// Register a type with an explicit schema.
    ///
    /// When the schema names a parent, it is laid over the parent's resolved
    /// schema; start from [`AnnotationSchema::empty_base`] to keep the
    /// parent's targets. The parent must already be known. When the schema
    /// names no constructor parameters, those of the binding's constructor
    /// are merged in.
    pub fn register_annotation(
        &self,
        type_id: impl Into<String>,
        mut schema: AnnotationSchema,
        binding: TypeBinding,
    ) -> Result<(), ConfigError> {
        let type_id = type_id.into();
        if self.is_known(&type_id) {
            return Err(ConfigError::DuplicateType { type_id });
        }
        if let Some(parent) = schema.parent.clone() {
            check_chain(&read(&self.types), &type_id, Some(parent.as_str()))?;
            let base = self
                .ancestor_schema(&parent)
                .map_err(|e| ConfigError::InvalidValue {
                    field: format!("{}.parent", type_id),
                    value: parent.clone(),
                    reason: e.to_string(),
                })?;
            schema = inherit(&base, schema);
        }
        if schema.targets.is_empty() {
            schema.targets = Target::CLASS;
        }
        if schema.constructor_params.is_none() {
            if let Some(params) = binding.params() {
                merge_constructor(&mut schema, params);
            }
        }
        schema.validate(&type_id)?;
        debug!(
            type_id = %type_id,
            parent = ?schema.parent,
            attributes = schema.attributes.len(),
            "registered annotation"
        );
        self.insert_explicit(&type_id, schema, binding);
        Ok(())
    }

    fn insert_explicit(&self, type_id: &str, schema: AnnotationSchema, binding: TypeBinding) {
        let entry = Entry::Explicit {
            parent: schema.parent.clone(),
        };
        let resolved = Arc::new(ResolvedType::compile(type_id, schema, binding));
        write(&self.types).insert(type_id.to_string(), entry);
        write(&self.cache).insert(type_id.to_string(), resolved);
    }

    /// Declare a type whose schema is read from its documentation.
    ///
    /// Fails when the id is taken or when the parent chain would loop back
    /// to this type.
    pub fn declare(&self, declaration: TypeDeclaration) -> Result<(), ConfigError> {
        let type_id = declaration.type_id.clone();
        let mut types = write(&self.types);
        if types.contains_key(&type_id) {
            return Err(ConfigError::DuplicateType { type_id });
        }

        check_chain(&types, &type_id, declaration.parent.as_deref())?;

        {
            let mut constants = write(&self.constants);
            for (name, value) in &declaration.constants {
                constants.insert(format!("{}::{}", type_id, name), value.clone());
            }
        }
        debug!(type_id = %type_id, parent = ?declaration.parent, "declared annotation");
        types.insert(type_id, Entry::Declared(Arc::new(declaration)));
        Ok(())
    }

    /// Register a constant visible as `NAME` from every tag.
    pub fn register_constant(&self, name: impl Into<String>, value: impl Into<Value>) {
        write(&self.constants).insert(name.into(), value.into());
    }

    /// Register a constant visible as `Type::NAME`.
    pub fn register_type_constant(
        &self,
        type_id: &str,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) {
        write(&self.constants).insert(format!("{}::{}", type_id, name.into()), value.into());
    }

    /// Look up `NAME` globally, then `Type::NAME` with `Type` resolved in `scope`.
    pub fn lookup_constant(&self, name: &str, scope: &Scope) -> Option<Value> {
        if let Some(value) = read(&self.constants).get(name) {
            return Some(value.clone());
        }
        let (ty, constant) = name.rsplit_once("::")?;
        let type_id = self.resolve_name(ty, scope)?;
        read(&self.constants)
            .get(&format!("{}::{}", type_id, constant))
            .cloned()
    }

    pub fn is_known(&self, type_id: &str) -> bool {
        read(&self.types).contains_key(type_id)
    }

    /// Resolve a name written in a tag to a known type id.
    pub fn resolve_name(&self, name: &str, scope: &Scope) -> Option<String> {
        self.resolver.resolve(name, scope, self)
    }

    /// Whether `type_id` is `ancestor` or declares it somewhere up its parent chain.
    pub fn is_subtype(&self, type_id: &str, ancestor: &str) -> bool {
        let types = read(&self.types);
        let mut current = Some(type_id.to_string());
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            debug_assert!(steps <= types.len() + 1, "parent chain of {type_id} loops");
            current = parent_of(&types, &id);
        }
        false
    }

    /// Resolved schema of a type.
    pub fn resolve_schema(&self, type_id: &str) -> QuillResult<Arc<AnnotationSchema>> {
        Ok(self.resolve(type_id)?.schema.clone())
    }

    /// Check `supplied` against the type's schema and construct an instance
    /// placed in `context`.
    pub fn build_instance(
        &self,
        type_id: &str,
        supplied: ValueList,
        context: Target,
    ) -> QuillResult<Instance> {
        let resolved = self.resolve(type_id)?;
        builder::build(self, &resolved, supplied, context)
    }

    /// Resolve a type, reading its documentation on first use.
    pub fn resolve(&self, type_id: &str) -> QuillResult<Arc<ResolvedType>> {
        if let Some(resolved) = read(&self.cache).get(type_id) {
            trace!(type_id = %type_id, "schema cache hit");
            return Ok(resolved.clone());
        }

        let declaration = self.declaration(type_id)?;
        let (schema, marked) = self.read_declaration(&declaration)?;
        if !marked {
            return Err(AnnotationError::NotAnAnnotation {
                type_id: type_id.to_string(),
            }
            .into());
        }
        Ok(self.cache_resolved(&declaration, schema))
    }

    fn declaration(&self, type_id: &str) -> QuillResult<Arc<TypeDeclaration>> {
        match read(&self.types).get(type_id) {
            Some(Entry::Declared(decl)) => Ok(decl.clone()),
            _ => Err(AnnotationError::UnknownType {
                type_id: type_id.to_string(),
            }
            .into()),
        }
    }

    fn cache_resolved(&self, declaration: &TypeDeclaration, schema: AnnotationSchema) -> Arc<ResolvedType> {
        let resolved = Arc::new(ResolvedType::compile(
            &declaration.type_id,
            schema,
            declaration.binding.clone(),
        ));
        let mut cache = write(&self.cache);
        cache
            .entry(declaration.type_id.clone())
            .or_insert(resolved)
            .clone()
    }

    /// Schema a child starts from: the parent's resolved schema, or for an
    /// unmarked parent whatever it inherited itself.
    fn ancestor_schema(&self, type_id: &str) -> QuillResult<AnnotationSchema> {
        if let Some(resolved) = read(&self.cache).get(type_id) {
            return Ok((*resolved.schema).clone());
        }
        let declaration = self.declaration(type_id)?;
        let (schema, marked) = self.read_declaration(&declaration)?;
        if marked {
            Ok((*self.cache_resolved(&declaration, schema).schema).clone())
        } else {
            Ok(schema)
        }
    }

    /// Build a declared type's schema. The flag tells whether its
    /// documentation carries the marker tag; when it does not, the returned
    /// schema is the inherited one.
    fn read_declaration(&self, declaration: &TypeDeclaration) -> QuillResult<(AnnotationSchema, bool)> {
        let _guard = ResolutionGuard::enter(self.id, &declaration.type_id)?;
        debug!(type_id = %declaration.type_id, "resolving schema");

        let mut schema = match &declaration.parent {
            Some(parent) => self.ancestor_schema(parent)?,
            None => AnnotationSchema::empty_base(),
        };
        // Constructor parameters belong to the binding.
        schema.constructor_params = None;

        let comment = Parser::new(self)
            .with_scope(declaration.scope.clone())
            .parse(&declaration.doc, Target::CLASS)?;
        if !comment.has(&self.marker_tag) {
            if schema.targets.is_empty() {
                schema.targets = Target::CLASS;
            }
            return Ok((schema, false));
        }

        schema.parent = declaration.parent.clone();
        self.merge_comment(&mut schema, &comment, &declaration.scope)?;
        if let Some(params) = declaration.binding.params() {
            merge_constructor(&mut schema, params);
        }
        schema.validate(&declaration.type_id)?;
        Ok((schema, true))
    }

    fn merge_comment(
        &self,
        schema: &mut AnnotationSchema,
        comment: &Comment,
        scope: &Scope,
    ) -> QuillResult<()> {
        if let Ok(attributes) = comment.annotation_type(builtins::ATTRIBUTE) {
            for instance in attributes {
                if let Some(attribute) = instance.downcast_ref::<builtins::Attribute>() {
                    schema.upsert_attribute(attribute.to_spec(self, scope)?);
                }
            }
        }

        let mut targets = Target::empty();
        if let Ok(value) = comment.get("Target") {
            targets |= builtins::targets_from_value(value)?;
        }
        if let Ok(declared) = comment.annotation_type(builtins::TARGET) {
            for instance in declared {
                if let Some(t) = instance.downcast_ref::<builtins::Targets>() {
                    targets |= t.mask;
                }
            }
        }
        if !targets.is_empty() {
            schema.targets = targets;
        } else if schema.targets.is_empty() {
            schema.targets = Target::CLASS;
        }

        if let Ok(value) = comment.get("DefaultAttribute") {
            match value.as_str() {
                Some(name) => schema.default_attribute = Some(name.to_string()),
                None => {
                    return Err(AnnotationError::InvalidArgument {
                        name: "DefaultAttribute".to_string(),
                        reason: format!("expected an attribute name, {} given", value.kind()),
                    }
                    .into())
                }
            }
        }
        Ok(())
    }
}

/// Lay a child's own schema over the schema it inherits.
///
/// Own attributes replace inherited ones by name; own targets replace the
/// inherited mask unless empty; an own default attribute wins. Constructor
/// parameters are never inherited.
fn inherit(base: &AnnotationSchema, own: AnnotationSchema) -> AnnotationSchema {
    let mut schema = base.clone();
    for spec in own.attributes {
        schema.upsert_attribute(spec);
    }
    if !own.targets.is_empty() {
        schema.targets = own.targets;
    }
    if own.default_attribute.is_some() {
        schema.default_attribute = own.default_attribute;
    }
    schema.constructor_params = own.constructor_params;
    schema.parent = own.parent;
    schema
}

fn parent_of(types: &HashMap<String, Entry>, type_id: &str) -> Option<String> {
    match types.get(type_id) {
        Some(Entry::Declared(decl)) => decl.parent.clone(),
        Some(Entry::Explicit { parent }) => parent.clone(),
        None => None,
    }
}

/// Walk the chain above `type_id`, starting at `parent`. Fails when it
/// comes back to `type_id` or to any type already on the chain.
fn check_chain(
    types: &HashMap<String, Entry>,
    type_id: &str,
    parent: Option<&str>,
) -> Result<(), ConfigError> {
    let mut chain = vec![type_id.to_string()];
    let mut seen = HashSet::from([type_id.to_string()]);
    let mut next = parent.map(str::to_string);
    while let Some(id) = next {
        chain.push(id.clone());
        if !seen.insert(id.clone()) {
            return Err(ConfigError::InheritanceCycle { chain });
        }
        next = parent_of(types, &id);
    }
    Ok(())
}

/// Fold constructor parameters into the attribute specs.
///
/// A parameter without a spec gets a `mixed` one. An attribute default wins
/// over the parameter default; with either the attribute is optional,
/// otherwise a non-nullable parameter makes it required.
fn merge_constructor(schema: &mut AnnotationSchema, params: &[ParamSpec]) {
    for param in params {
        if schema.get_attribute(&param.name).is_none() {
            schema.upsert_attribute(AttributeSpec::new(param.name.clone()));
        }
        if let Some(spec) = schema.get_attribute_mut(&param.name) {
            if spec.default.is_none() {
                spec.default = param.default.clone();
            }
            if spec.default.is_some() {
                spec.required = false;
            } else if !param.nullable {
                spec.required = true;
            }
        }
    }
    schema.constructor_params = Some(params.iter().map(|p| p.name.clone()).collect());
}

/// Marks a type as being resolved on this thread, so that a schema whose
/// own documentation uses the type fails instead of recursing.
struct ResolutionGuard {
    key: (u64, String),
}

impl ResolutionGuard {
    fn enter(registry: u64, type_id: &str) -> Result<Self, Error> {
        let key = (registry, type_id.to_string());
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&key) {
                return Err(AnnotationError::RecursiveSchema {
                    type_id: type_id.to_string(),
                }
                .into());
            }
            stack.push(key.clone());
            Ok(Self { key })
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(index) = stack.iter().rposition(|k| *k == self.key) {
                stack.remove(index);
            }
        });
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
