//! Builder for engines.

use crate::engine::Engine;
use crate::schema::{Registry, SchemaError, TypeDecl};

/// Assembles the registry an [`Engine`] resolves types from.
///
/// Built-in types are included unless [`without_builtins`] is called.
///
/// [`without_builtins`]: EngineBuilder::without_builtins
pub struct EngineBuilder {
    decls: Vec<TypeDecl>,
    builtins: bool,
}

impl EngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            decls: Vec::new(),
            builtins: true,
        }
    }

    /// Register a declaration.
    pub fn register(mut self, decl: TypeDecl) -> Self {
        self.decls.push(decl);
        self
    }

    /// Register several declarations at once.
    pub fn register_all(mut self, decls: impl IntoIterator<Item = TypeDecl>) -> Self {
        self.decls.extend(decls);
        self
    }

    /// Start from an empty registry instead of the built-in types.
    pub fn without_builtins(mut self) -> Self {
        self.builtins = false;
        self
    }

    /// Build the engine.
    /// Returns an error if a name is registered twice.
    pub fn build(self) -> Result<Engine, SchemaError> {
        let mut registry = if self.builtins {
            Registry::with_builtins()
        } else {
            Registry::new()
        };
        for decl in self.decls {
            registry.insert(decl)?;
        }
        tracing::debug!(types = registry.len(), "engine registry assembled");
        Ok(Engine::new(registry))
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
