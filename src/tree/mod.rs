//! The lazy typed tree a microstate is a view of.

pub mod node;
pub mod source;
pub mod state;

pub use node::{Children, Tree};
pub use source::ValueSource;
pub use state::{Instance, State};
