//! What a transition hands back to the dispatcher.

use crate::core::Value;
use crate::microstate::Microstate;
use crate::schema::{TypeDecl, TypeRef};
use crate::transition::Arg;
use std::sync::Arc;

/// Result of a transition or an initializer.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// New value; the node keeps its type.
    Value(Value),
    /// Replacement subtree, grafted with its own type and descendants.
    Microstate(Microstate),
    /// Type-shift: instantiate `target` at the node, seeded with `seed` or,
    /// when `None`, with the node's current value.
    Shift {
        target: TypeRef,
        seed: Option<Value>,
    },
    /// Type-shift into a type declared on the spot, usually one extending a
    /// registered type with constants taken from the transition's arguments.
    Declared {
        decl: Arc<TypeDecl>,
        seed: Option<Value>,
    },
}

impl Outcome {
    pub fn shift(target: impl Into<TypeRef>, seed: impl Into<Value>) -> Self {
        Outcome::Shift {
            target: target.into(),
            seed: Some(seed.into()),
        }
    }

    /// Reinterpret the current value as `target`.
    pub fn shift_in_place(target: impl Into<TypeRef>) -> Self {
        Outcome::Shift {
            target: target.into(),
            seed: None,
        }
    }

    pub fn declare(decl: TypeDecl, seed: impl Into<Value>) -> Self {
        Outcome::Declared {
            decl: Arc::new(decl),
            seed: Some(seed.into()),
        }
    }

    /// Reinterpret the current value as the type `decl` declares.
    ///
    /// ```
    /// use microstate::{args, Arg, Engine, Outcome, TypeBuilder};
    ///
    /// let engine = Engine::builder()
    ///     .register(TypeBuilder::new("Request").constant("status", "idle").build())
    ///     .register(
    ///         TypeBuilder::new("Pending")
    ///             .extends("Request")
    ///             .transition("fail", |_, args| {
    ///                 let reason = args.first().map(Arg::value).unwrap_or_default();
    ///                 Ok(Outcome::declare_in_place(
    ///                     TypeBuilder::new("Failed")
    ///                         .extends("Request")
    ///                         .constant("status", "failed")
    ///                         .constant("reason", reason)
    ///                         .build(),
    ///                 ))
    ///             })
    ///             .build(),
    ///     )
    ///     .build()
    ///     .unwrap();
    ///
    /// let pending = engine.create("Pending", serde_json::json!({})).unwrap();
    /// let failed = pending.transition("fail", args!["timeout"]).unwrap();
    /// let state = failed.state().unwrap();
    /// assert!(state.is_instance_of("Request"));
    /// assert_eq!(state.field("reason").unwrap().as_str(), Some("timeout"));
    /// ```
    pub fn declare_in_place(decl: TypeDecl) -> Self {
        Outcome::Declared {
            decl: Arc::new(decl),
            seed: None,
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Outcome::Value(value)
    }
}

impl From<Microstate> for Outcome {
    fn from(ms: Microstate) -> Self {
        Outcome::Microstate(ms)
    }
}

impl From<Arg> for Outcome {
    fn from(arg: Arg) -> Self {
        match arg {
            Arg::Microstate(ms) => Outcome::Microstate(ms),
            other => Outcome::Value(other.value()),
        }
    }
}
