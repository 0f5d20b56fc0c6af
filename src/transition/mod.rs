//! Transition arguments, outcomes and dispatch.

pub mod arg;
pub(crate) mod dispatcher;
pub mod outcome;

pub use arg::{Arg, CallbackFn};
pub use outcome::Outcome;
