//! Pure get/set at a path inside nested [`Value`]s.
//!
//! `set` never touches its input: every container on the path is shallow
//! copied with one entry replaced, and every branch off the path is carried
//! over by reference.

use crate::core::{Path, Seg, Value};
use crate::error::Error;
use std::sync::Arc;

/// Read the value at `path`. Absent entries read as [`Value::Null`].
pub fn get(root: &Value, path: &Path) -> Value {
    let mut current = root;
    for seg in path {
        match step(current, seg) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Read one segment below `value`.
pub fn get_seg(value: &Value, seg: &Seg) -> Value {
    step(value, seg).cloned().unwrap_or(Value::Null)
}

fn step<'a>(value: &'a Value, seg: &Seg) -> Option<&'a Value> {
    match (value, seg) {
        (Value::Map(map), Seg::Key(k)) => map.get(k),
        (Value::List(items), Seg::Index(i)) => items.get(*i),
        _ => None,
    }
}

/// Return a new root with `leaf` written at `path`.
///
/// Absent intermediates are created: a map for a key segment, a list for an
/// index segment (gaps in a list are padded with null). Writing through a
/// scalar, or using a key on a list or an index on a map, fails with
/// [`Error::InvalidPath`].
pub fn set(root: &Value, path: &Path, leaf: Value) -> Result<Value, Error> {
    write(root, path.segments(), leaf, path, 0)
}

fn write(node: &Value, segs: &[Seg], leaf: Value, path: &Path, depth: usize) -> Result<Value, Error> {
    let Some((seg, rest)) = segs.split_first() else {
        return Ok(leaf);
    };
    let here = || Path::from_segments(path.segments()[..=depth].to_vec());

    match (node, seg) {
        (Value::Map(map), Seg::Key(key)) => {
            let current = map.get(key).cloned().unwrap_or(Value::Null);
            let next = write(&current, rest, leaf, path, depth + 1)?;
            let mut copy = (**map).clone();
            copy.insert(key.clone(), next);
            Ok(Value::Map(Arc::new(copy)))
        }
        (Value::List(items), Seg::Index(index)) => {
            let current = items.get(*index).cloned().unwrap_or(Value::Null);
            let next = write(&current, rest, leaf, path, depth + 1)?;
            let mut copy = (**items).clone();
            if *index >= copy.len() {
                copy.resize(*index + 1, Value::Null);
            }
            copy[*index] = next;
            Ok(Value::List(Arc::new(copy)))
        }
        (Value::Null, Seg::Key(key)) => {
            let next = write(&Value::Null, rest, leaf, path, depth + 1)?;
            Ok(Value::map([(key.clone(), next)]))
        }
        (Value::Null, Seg::Index(index)) => {
            let next = write(&Value::Null, rest, leaf, path, depth + 1)?;
            let mut items = vec![Value::Null; *index];
            items.push(next);
            Ok(Value::from(items))
        }
        (Value::Map(_), Seg::Index(_)) => Err(Error::invalid_path(
            here(),
            "index segment used on a map",
        )),
        (Value::List(_), Seg::Key(_)) => Err(Error::invalid_path(
            here(),
            "key segment used on a list",
        )),
        (scalar, _) => Err(Error::invalid_path(
            here(),
            format!("cannot write through a {} value", scalar.kind()),
        )),
    }
}
