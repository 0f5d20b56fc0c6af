//! Name → declaration table consulted by the resolver.

use crate::schema::{SchemaError, TypeDecl, TypeRef};
use crate::types;
use std::collections::HashMap;
use std::sync::Arc;

/// The set of declared types an engine can resolve.
///
/// There is no process-wide registry: each engine owns one, so independent
/// engines can declare types with the same name.
#[derive(Clone, Default)]
pub struct Registry {
    decls: HashMap<Arc<str>, Arc<TypeDecl>>,
}

impl Registry {
    /// An empty registry. Even `Number` is unknown until registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `Any`, `Number`, `String`, `Boolean`, `Array` and
    /// `Object`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for decl in types::builtins() {
            registry.decls.insert(decl.name.clone(), Arc::new(decl));
        }
        registry
    }

    /// Add a declaration. Names are unique.
    pub fn insert(&mut self, decl: TypeDecl) -> Result<(), SchemaError> {
        if self.decls.contains_key(&decl.name) {
            return Err(SchemaError::DuplicateType {
                name: decl.name.to_string(),
            });
        }
        self.decls.insert(decl.name.clone(), Arc::new(decl));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<TypeDecl>> {
        self.decls.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    /// Whether every name `ty` depends on is registered.
    pub fn knows(&self, ty: &TypeRef) -> bool {
        ty.names().into_iter().all(|name| self.contains(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.decls.keys().map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("types", &names).finish()
    }
}
