//! Microstate: a lazy, typed structural state engine
//!
//! A microstate pairs a declarative type schema with a plain nested value.
//! Reading it produces a strongly-typed *state* view, materialized lazily and
//! memoized per node. Invoking a named *transition* anywhere in the structure
//! produces a brand-new root that shares every untouched subtree with the
//! previous one, and may change the type in effect at that point
//! (*type-shifting*).
//!
//! # Core Concepts
//!
//! - **Schema**: Types declared with [`TypeBuilder`] and registered on an [`Engine`]
//! - **Tree**: Lazy nodes pairing a resolved type, a value and a path
//! - **Transitions**: Path-addressed, pure, structurally shared updates
//! - **Queries**: Computed fields whose results stay connected to their origin
//! - **Middleware**: Interceptors wrapping every external transition once
//!
//! # Example
//!
//! ```rust
//! use microstate::{args, Engine, TypeBuilder, Value};
//! use serde_json::json;
//!
//! let engine = Engine::builder()
//!     .register(
//!         TypeBuilder::new("Modal")
//!             .field("name", "String")
//!             .field("isOpen", "Boolean")
//!             .constant("kind", "modal")
//!             .build(),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let modal = engine.create("Modal", json!({"name": "Confirm"})).unwrap();
//! let opened = modal.field("isOpen").unwrap().transition("toggle", args![]).unwrap();
//!
//! assert_eq!(opened.state().unwrap().field("isOpen").unwrap().as_bool(), Some(true));
//! assert_eq!(opened.value_of(), Value::from(json!({"name": "Confirm", "isOpen": true})));
//! // The original is untouched.
//! assert_eq!(modal.value_of(), Value::from(json!({"name": "Confirm"})));
//! ```

pub mod builder;
pub mod core;
pub mod engine;
pub mod error;
pub mod microstate;
pub mod middleware;
pub mod query;
pub mod schema;
pub mod transition;
pub mod tree;

mod types;

// Re-export commonly used types
pub use builder::{EngineBuilder, TypeBuilder};
pub use core::{Path, Seg, Value};
pub use engine::Engine;
pub use error::Error;
pub use microstate::Microstate;
pub use middleware::{from_fn, use_middleware, Middleware, TransitionDescriptor};
pub use query::Derived;
pub use schema::{SchemaError, TypeRef};
pub use transition::{Arg, Outcome};
pub use tree::State;
