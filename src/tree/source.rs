//! Write-once value sources.

use crate::core::{lens, Seg, Value};
use std::fmt;
use std::sync::{Arc, OnceLock};

type Thunk = Box<dyn Fn() -> Value + Send + Sync>;

/// A value that is either known or computed on first read.
///
/// Child sources defer to their parent's source, so building a subtree
/// does not read the parent value until a child's value is needed.
#[derive(Clone)]
pub struct ValueSource(Arc<Lazy>);

struct Lazy {
    cell: OnceLock<Value>,
    thunk: Option<Thunk>,
}

impl ValueSource {
    pub fn ready(value: Value) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(value);
        Self(Arc::new(Lazy { cell, thunk: None }))
    }

    pub fn deferred<F>(f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        Self(Arc::new(Lazy {
            cell: OnceLock::new(),
            thunk: Some(Box::new(f)),
        }))
    }

    /// Source for the entry `seg` of this source's value.
    pub fn child(&self, seg: Seg) -> Self {
        let parent = self.clone();
        Self::deferred(move || lens::get_seg(parent.get(), &seg))
    }

    pub fn get(&self) -> &Value {
        self.0.cell.get_or_init(|| match &self.0.thunk {
            Some(thunk) => thunk(),
            None => Value::Null,
        })
    }

    pub fn is_forced(&self) -> bool {
        self.0.cell.get().is_some()
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.cell.get() {
            Some(value) => f.debug_tuple("Ready").field(value).finish(),
            None => f.write_str("Deferred"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn deferred_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let source = ValueSource::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::from(7)
        });

        assert!(!source.is_forced());
        assert_eq!(source.get(), &Value::from(7));
        assert_eq!(source.get(), &Value::from(7));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn child_does_not_force_parent_until_read() {
        let parent = ValueSource::deferred(|| Value::from(json!({"a": 1})));
        let child = parent.child(Seg::key("a"));

        assert!(!parent.is_forced());
        assert_eq!(child.get(), &Value::from(1));
        assert!(parent.is_forced());
    }

    #[test]
    fn missing_child_reads_null() {
        let parent = ValueSource::ready(Value::Null);
        assert_eq!(parent.child(Seg::Index(3)).get(), &Value::Null);
    }
}
