//! Builder API for declaring types and assembling engines.
//!
//! Types are declared with [`TypeBuilder`] and registered on an
//! [`EngineBuilder`]; the resulting [`Engine`](crate::Engine) owns the
//! registry and resolves declarations on first use.

pub mod engine;
pub mod macros;
pub mod types;

pub use engine::EngineBuilder;
pub use types::TypeBuilder;
