//! Type declarations and their resolution.
//!
//! Applications describe their data with [`TypeDecl`]s (built through
//! [`TypeBuilder`](crate::builder::TypeBuilder)) collected in a [`Registry`].
//! The [`SchemaResolver`] turns a [`TypeRef`] into a [`TypeNode`] lazily and
//! memoizes it by type identity.

pub mod decl;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod validate;

pub use decl::{ComputedFn, FieldDecl, Initializer, Kind, Primitive, TransitionFn, TypeDecl, TypeRef};
pub use error::SchemaError;
pub use registry::Registry;
pub use resolver::{SchemaResolver, TypeNode};
