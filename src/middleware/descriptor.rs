//! Description of the transition an interceptor is wrapping.

use crate::core::Path;

/// Which transition is running, and where.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionDescriptor {
    name: String,
    path: Path,
    type_name: String,
}

impl TransitionDescriptor {
    pub fn new(name: impl Into<String>, path: Path, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path,
            type_name: type_name.into(),
        }
    }

    /// The transition's name, e.g. `increment`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the node in the root the transition is dispatched against.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Type of the node at [`path`](Self::path).
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}
