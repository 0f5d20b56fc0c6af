//! Errors raised by the engine.

use crate::core::Path;
use crate::schema::SchemaError;
use thiserror::Error;

/// Every failure the engine can report.
///
/// Errors are `Clone` so that write-once caches (tree children, materialized
/// state) can hand the same failure to every caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A path segment addressed a scalar, a missing child, or the wrong kind
    /// of container.
    #[error("invalid path [{path}]: {reason}")]
    InvalidPath { path: Path, reason: String },

    /// A transition was invoked on a query result whose path has no
    /// counterpart in the tree it was derived from.
    #[error(
        "Could not find a microstate at [{path}]. You might have tried to modify a microstate that does not exist in original microstate."
    )]
    DetachedQuery { path: Path },

    #[error("Setting state property will not do anything useful. Please don't do this.")]
    StateAssignment,

    /// An operation rejected its arguments or the current value.
    #[error("transition '{transition}' failed: {reason}")]
    TransitionFailed { transition: String, reason: String },
}

impl Error {
    #[inline]
    pub fn invalid_path(path: Path, reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            path,
            reason: reason.into(),
        }
    }

    #[inline]
    pub fn detached(path: Path) -> Self {
        Error::DetachedQuery { path }
    }

    #[inline]
    pub fn transition_failed(transition: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::TransitionFailed {
            transition: transition.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_query_names_the_path() {
        let err = Error::detached(Path::root().key("numbers").index(4));
        assert_eq!(
            err.to_string(),
            "Could not find a microstate at [numbers.4]. You might have tried to modify a microstate that does not exist in original microstate."
        );
    }

    #[test]
    fn schema_errors_display_transparently() {
        let err: Error = SchemaError::ReservedTransitionName {
            type_name: "Foo".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "You can not use 'state' as transition name because it'll conflict with state property on the microstate."
        );
    }
}
