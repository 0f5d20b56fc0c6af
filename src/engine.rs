//! The engine: one registry, one resolver cache.

use crate::builder::EngineBuilder;
use crate::core::Value;
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{Registry, SchemaError, SchemaResolver, TypeNode, TypeRef};
use crate::transition::dispatcher;
use std::sync::Arc;

/// Creates microstates from the types of one registry.
///
/// Cloning an engine shares its resolver, so types resolved through one
/// clone are memoized for all of them.
#[derive(Clone, Debug)]
pub struct Engine {
    resolver: Arc<SchemaResolver>,
}

impl Engine {
    pub fn new(registry: Registry) -> Self {
        Self {
            resolver: Arc::new(SchemaResolver::new(registry)),
        }
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    /// Create a root microstate of type `ty` holding `value`.
    ///
    /// Fails if the type, or an ancestor it extends, does not validate.
    pub fn create(
        &self,
        ty: impl Into<TypeRef>,
        value: impl Into<Value>,
    ) -> Result<Microstate, Error> {
        dispatcher::create(&self.resolver, &ty.into(), value.into())
    }

    /// Resolve a type without creating anything.
    pub fn resolve(&self, ty: impl Into<TypeRef>) -> Result<Arc<TypeNode>, SchemaError> {
        self.resolver.resolve(&ty.into())
    }

    pub fn resolver(&self) -> &Arc<SchemaResolver> {
        &self.resolver
    }
}

/// An engine with only the built-in types.
impl Default for Engine {
    fn default() -> Self {
        Self::new(Registry::with_builtins())
    }
}
