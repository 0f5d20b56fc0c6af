//! Addresses inside a microstate.
//!
//! A [`Path`] is the sequence of map keys and list indices leading from a
//! root to one node. It is how transitions find their target and how query
//! results are mapped back onto the tree they were derived from.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step of a path: a map key or a list index.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Seg {
    Key(String),
    Index(usize),
}

impl Seg {
    #[inline]
    pub fn key(k: impl Into<String>) -> Self {
        Seg::Key(k.into())
    }

    #[inline]
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Seg::Key(k) => Some(k),
            Seg::Index(_) => None,
        }
    }

    #[inline]
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Seg::Index(i) => Some(*i),
            Seg::Key(_) => None,
        }
    }
}

impl fmt::Display for Seg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seg::Key(k) => f.write_str(k),
            Seg::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Seg {
    fn from(s: &str) -> Self {
        Seg::Key(s.to_owned())
    }
}

impl From<String> for Seg {
    fn from(s: String) -> Self {
        Seg::Key(s)
    }
}

impl From<usize> for Seg {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

/// An immutable sequence of segments. The empty path is the root.
///
/// Displays as dot-joined segments, e.g. `todos.0.completed`.
///
/// ```
/// use microstate::core::Path;
///
/// let path = Path::root().key("numbers").index(4);
/// assert_eq!(path.to_string(), "numbers.4");
/// assert_eq!(path.parent(), Some(Path::root().key("numbers")));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Seg>);

impl Path {
    #[inline]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    #[inline]
    pub fn from_segments(segments: Vec<Seg>) -> Self {
        Self(segments)
    }

    /// Append a key segment (builder style).
    #[inline]
    pub fn key(mut self, k: impl Into<String>) -> Self {
        self.0.push(Seg::Key(k.into()));
        self
    }

    /// Append an index segment (builder style).
    #[inline]
    pub fn index(mut self, i: usize) -> Self {
        self.0.push(Seg::Index(i));
        self
    }

    /// A new path with `seg` appended.
    pub fn child(&self, seg: Seg) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(seg);
        Self(segments)
    }

    /// A new path with every segment of `other` appended.
    pub fn join(&self, other: &Path) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        self.0
            .split_last()
            .map(|(_, init)| Self(init.to_vec()))
    }

    pub fn last(&self) -> Option<&Seg> {
        self.0.last()
    }

    pub fn segments(&self) -> &[Seg] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.0.starts_with(&prefix.0)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl From<Vec<Seg>> for Path {
    fn from(segments: Vec<Seg>) -> Self {
        Self(segments)
    }
}

impl From<Seg> for Path {
    fn from(seg: Seg) -> Self {
        Self(vec![seg])
    }
}

impl FromIterator<Seg> for Path {
    fn from_iter<I: IntoIterator<Item = Seg>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a Seg;
    type IntoIter = std::slice::Iter<'a, Seg>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_empty() {
        assert_eq!(Path::root().to_string(), "");
        assert!(Path::root().is_root());
    }

    #[test]
    fn display_joins_keys_and_indices() {
        let path = Path::root().key("todos").index(0).key("completed");
        assert_eq!(path.to_string(), "todos.0.completed");
    }

    #[test]
    fn child_and_join_do_not_mutate_receiver() {
        let base = Path::root().key("a");
        let child = base.child(Seg::Index(2));
        let joined = base.join(&Path::root().key("b").key("c"));

        assert_eq!(base.len(), 1);
        assert_eq!(child.to_string(), "a.2");
        assert_eq!(joined.to_string(), "a.b.c");
        assert!(joined.starts_with(&base));
    }

    #[test]
    fn parent_of_root_is_none() {
        assert_eq!(Path::root().parent(), None);
        assert_eq!(Path::root().key("x").parent(), Some(Path::root()));
    }
}
