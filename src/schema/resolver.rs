//! Lazy, memoized schema resolution.
//!
//! [`SchemaResolver::resolve`] turns a [`TypeRef`] into a [`TypeNode`]: the
//! merged field table, transition table and flags a tree needs. Field types
//! are *not* resolved eagerly; a tree resolves a field's type the first time
//! it builds that child, through the same cache. Because the cache is keyed
//! by type identity and never recurses into fields, a type may refer to
//! itself, directly or through other types.

use crate::core::Value;
use crate::schema::validate::{into_result, validate_chain};
use crate::schema::{
    ComputedFn, FieldDecl, Initializer, Kind, Registry, SchemaError, TransitionFn, TypeDecl,
    TypeRef,
};
use crate::types;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A resolved type.
pub struct TypeNode {
    type_ref: TypeRef,
    name: String,
    lineage: Vec<Arc<str>>,
    kind: Kind,
    element: Option<TypeRef>,
    fields: IndexMap<String, FieldDecl>,
    operations: IndexMap<String, TransitionFn>,
    initializer: Option<Initializer>,
}

impl TypeNode {
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Leaves and containers; everything that is not a composed type.
    pub fn is_primitive(&self) -> bool {
        self.kind != Kind::Composed
    }

    pub fn is_composed(&self) -> bool {
        self.kind == Kind::Composed
    }

    pub fn is_list(&self) -> bool {
        self.kind == Kind::List
    }

    /// `Array<T>` or `Object<T>`.
    pub fn is_parameterized(&self) -> bool {
        self.element.is_some()
    }

    /// Element type of a parameterized container.
    pub fn element(&self) -> Option<&TypeRef> {
        self.element.as_ref()
    }

    /// Whether this type is `name` or extends it.
    pub fn is_a(&self, name: &str) -> bool {
        self.lineage.iter().any(|n| &**n == name)
    }

    /// Own name followed by every ancestor's name.
    pub fn lineage(&self) -> impl Iterator<Item = &str> {
        self.lineage.iter().map(|n| &**n)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.get(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldDecl)> {
        self.fields.iter().map(|(n, f)| (n.as_str(), f))
    }

    pub fn typed_fields(&self) -> impl Iterator<Item = (&str, &TypeRef)> {
        self.fields.iter().filter_map(|(n, f)| match f {
            FieldDecl::Typed(ty) => Some((n.as_str(), ty)),
            _ => None,
        })
    }

    pub fn constants(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().filter_map(|(n, f)| match f {
            FieldDecl::Constant(v) => Some((n.as_str(), v)),
            _ => None,
        })
    }

    pub fn computed(&self, name: &str) -> Option<&ComputedFn> {
        match self.fields.get(name) {
            Some(FieldDecl::Computed(f)) => Some(f),
            _ => None,
        }
    }

    pub fn has_computed(&self) -> bool {
        self.fields
            .values()
            .any(|f| matches!(f, FieldDecl::Computed(_)))
    }

    pub fn operation(&self, name: &str) -> Option<&TransitionFn> {
        self.operations.get(name)
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.contains_key(name)
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn initializer(&self) -> Option<&Initializer> {
        self.initializer.as_ref()
    }
}

impl fmt::Debug for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("fields", &self.fields)
            .field("operations", &self.operation_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Resolves and memoizes types for one registry.
pub struct SchemaResolver {
    registry: Registry,
    cache: Mutex<HashMap<TypeRef, Arc<TypeNode>>>,
}

impl SchemaResolver {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Resolve `ty`, validating its declaration the first time.
    ///
    /// Repeated calls with an equal `TypeRef` return the same `Arc`.
    pub fn resolve(&self, ty: &TypeRef) -> Result<Arc<TypeNode>, SchemaError> {
        if let Some(node) = self.lock().get(ty) {
            return Ok(node.clone());
        }

        let node = Arc::new(self.build(ty)?);
        tracing::trace!(type_name = %node.name, "resolved type");

        // The lock is not held while building, so a racing resolution may
        // have landed first; keep whichever was cached first.
        Ok(self.lock().entry(ty.clone()).or_insert(node).clone())
    }

    /// Resolve a declaration that is not in the registry, such as a subtype
    /// of a registered type declared by a transition with constants taken
    /// from its arguments. It may extend registered types and refer to them
    /// in fields. Each call builds a fresh node; nothing is memoized.
    pub fn resolve_decl(&self, decl: &TypeDecl) -> Result<Arc<TypeNode>, SchemaError> {
        let mut chain = match decl.extends.as_deref() {
            Some(parent) => self.ancestry(parent)?,
            None => Vec::new(),
        };
        chain.push(Arc::new(decl.clone()));

        let node = self.merge_chain(TypeRef::named(decl.name()), decl.name(), &chain)?;
        tracing::trace!(type_name = %node.name, "resolved inline type");
        Ok(Arc::new(node))
    }

    /// Number of types memoized so far.
    pub fn resolved_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeRef, Arc<TypeNode>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build(&self, ty: &TypeRef) -> Result<TypeNode, SchemaError> {
        match ty {
            TypeRef::Named(name) => self.build_named(ty, name),
            TypeRef::ArrayOf(element) => self.build_container(ty, "Array", element),
            TypeRef::ObjectOf(element) => self.build_container(ty, "Object", element),
        }
    }

    fn build_named(&self, ty: &TypeRef, name: &str) -> Result<TypeNode, SchemaError> {
        let chain = self.ancestry(name)?;
        self.merge_chain(ty.clone(), name, &chain)
    }

    /// Flatten an inheritance chain, root-most first, into one node.
    fn merge_chain(
        &self,
        ty: TypeRef,
        name: &str,
        chain: &[Arc<TypeDecl>],
    ) -> Result<TypeNode, SchemaError> {
        let decls: Vec<&TypeDecl> = chain.iter().map(|d| &**d).collect();
        into_result(name, validate_chain(&decls, &self.registry))?;

        let kind = chain[0].kind;
        let mut fields = IndexMap::new();
        let mut operations: IndexMap<String, TransitionFn> = IndexMap::new();
        if kind == Kind::Composed {
            operations.extend(types::composed_operations());
        }
        for decl in chain {
            for (field, entry) in &decl.fields {
                fields.insert(field.clone(), entry.clone());
            }
            for (op, f) in &decl.operations {
                operations.insert(op.clone(), f.clone());
            }
        }

        let own = &chain[chain.len() - 1];
        Ok(TypeNode {
            type_ref: ty,
            name: name.to_string(),
            lineage: chain.iter().rev().map(|d| d.name.clone()).collect(),
            kind,
            element: None,
            fields,
            operations,
            initializer: own.initializer.clone(),
        })
    }

    fn build_container(
        &self,
        ty: &TypeRef,
        base: &str,
        element: &TypeRef,
    ) -> Result<TypeNode, SchemaError> {
        if let Some(missing) = element.names().into_iter().find(|n| !self.registry.contains(n)) {
            return Err(SchemaError::UnknownType {
                name: missing.to_string(),
            });
        }
        let base = self.resolve(&TypeRef::named(base))?;

        Ok(TypeNode {
            type_ref: ty.clone(),
            name: ty.to_string(),
            lineage: std::iter::once(Arc::from(ty.to_string()))
                .chain(base.lineage.iter().cloned())
                .collect(),
            kind: base.kind,
            element: Some(element.clone()),
            fields: IndexMap::new(),
            operations: base.operations.clone(),
            initializer: None,
        })
    }

    /// Declarations from the root-most ancestor down to `name`.
    fn ancestry(&self, name: &str) -> Result<Vec<Arc<TypeDecl>>, SchemaError> {
        let mut chain: Vec<Arc<TypeDecl>> = Vec::new();
        let mut current: Option<Arc<str>> = Some(Arc::from(name));

        while let Some(next) = current {
            if chain.iter().any(|d| d.name == next) {
                let mut names: Vec<&str> = chain.iter().map(|d| &*d.name).collect();
                names.push(&*next);
                return Err(SchemaError::CyclicInheritance {
                    type_name: name.to_string(),
                    chain: names.join(" -> "),
                });
            }
            let decl = self
                .registry
                .get(&next)
                .ok_or_else(|| SchemaError::UnknownType {
                    name: next.to_string(),
                })?;
            current = decl.extends.clone();
            chain.push(decl.clone());
        }

        chain.reverse();
        Ok(chain)
    }
}

impl fmt::Debug for SchemaResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaResolver")
            .field("registry", &self.registry)
            .field("resolved", &self.resolved_count())
            .finish()
    }
}
