//! Plain data, paths and the lens that writes through them.

pub mod lens;
pub mod path;
pub mod value;

pub use path::{Path, Seg};
pub use value::{Map, Value};
