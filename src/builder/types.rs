//! Builder for type declarations.

use crate::core::Value;
use crate::error::Error;
use crate::microstate::Microstate;
use crate::query::Derived;
use crate::schema::{FieldDecl, Kind, TypeDecl, TypeRef};
use crate::transition::{Arg, Outcome};
use std::sync::Arc;

/// Builder for declaring a composed type with a fluent API.
///
/// ```
/// use microstate::builder::TypeBuilder;
/// use microstate::Outcome;
///
/// let modal = TypeBuilder::new("Modal")
///     .field("name", "String")
///     .field("isOpen", "Boolean")
///     .constant("kind", "modal")
///     .transition("open", |ms, _args| {
///         Ok(Outcome::Value(ms.value_of().merge(&serde_json::json!({"isOpen": true}).into())))
///     })
///     .build();
///
/// assert_eq!(modal.name(), "Modal");
/// ```
pub struct TypeBuilder {
    decl: TypeDecl,
}

impl TypeBuilder {
    /// Start declaring the type `name`.
    pub fn new(name: &str) -> Self {
        Self {
            decl: TypeDecl::builtin(name, Kind::Composed),
        }
    }

    /// Inherit fields and transitions from `parent` (optional).
    pub fn extends(mut self, parent: &str) -> Self {
        self.decl.extends = Some(Arc::from(parent));
        self
    }

    /// Add a child microstate of type `ty`.
    pub fn field(mut self, name: &str, ty: impl Into<TypeRef>) -> Self {
        self.decl
            .fields
            .push((name.to_string(), FieldDecl::Typed(ty.into())));
        self
    }

    /// Add a literal present in state and never in the raw value.
    pub fn constant(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.decl
            .fields
            .push((name.to_string(), FieldDecl::Constant(value.into())));
        self
    }

    /// Add a field derived from the node on demand.
    pub fn computed<F>(mut self, name: &str, derive: F) -> Self
    where
        F: Fn(&Microstate) -> Result<Derived, Error> + Send + Sync + 'static,
    {
        self.decl
            .fields
            .push((name.to_string(), FieldDecl::Computed(Arc::new(derive))));
        self
    }

    /// Add a named transition.
    pub fn transition<F>(self, name: &str, op: F) -> Self
    where
        F: Fn(&Microstate, &[Arg]) -> Result<Outcome, Error> + Send + Sync + 'static,
    {
        Self {
            decl: self.decl.with_operation(name, Arc::new(op)),
        }
    }

    /// Run `init` whenever a node of this type is instantiated (optional).
    pub fn initializer<F>(mut self, init: F) -> Self
    where
        F: Fn(&Microstate) -> Result<Option<Outcome>, Error> + Send + Sync + 'static,
    {
        self.decl.initializer = Some(Arc::new(init));
        self
    }

    /// Finish the declaration. Problems with it are reported when the type
    /// is first resolved.
    pub fn build(self) -> TypeDecl {
        self.decl
    }
}
