use super::{
    assembled, callback, children, op, produced, required, set, standalone, unexpected,
};
use crate::core::{Map, Seg, Value};
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{Kind, TypeDecl};
use crate::transition::{Arg, Outcome};
use crate::tree::node::Element;
use crate::tree::Tree;
use std::sync::Arc;

pub(super) fn decl() -> TypeDecl {
    TypeDecl::builtin("Object", Kind::Map)
        .with_operation("set", op(set))
        .with_operation("assign", op(assign))
        .with_operation("put", op(put))
        .with_operation("delete", op(delete))
        .with_operation("merge", op(super::merge))
        .with_operation("map", op(map))
        .with_operation("filter", op(filter))
}

/// Absent reads as empty.
fn entries(transition: &str, ms: &Microstate) -> Result<Map, Error> {
    match ms.value_of() {
        Value::Null => Ok(Map::new()),
        Value::Map(entries) => Ok(Arc::unwrap_or_clone(entries)),
        other => Err(unexpected(transition, "a map", &other)),
    }
}

fn key(transition: &str, args: &[Arg]) -> Result<String, Error> {
    let value = required(transition, args, 0)?.value();
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| unexpected(transition, "a string key", &value))
}

/// Shallow assignment of every entry of the argument.
fn assign(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let mut entries = entries("assign", ms)?;
    let attrs = required("assign", args, 0)?.value();
    let attrs = attrs
        .as_map()
        .ok_or_else(|| unexpected("assign", "a map argument", &attrs))?;
    for (name, value) in attrs.iter() {
        entries.insert(name.clone(), value.clone());
    }
    Ok(Outcome::Value(Value::from(entries)))
}

fn put(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let name = key("put", args)?;
    let value = required("put", args, 1)?.value();
    let mut entries = entries("put", ms)?;
    entries.insert(name, value);
    Ok(Outcome::Value(Value::from(entries)))
}

fn delete(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let name = key("delete", args)?;
    let mut entries = entries("delete", ms)?;
    entries.shift_remove(&name);
    Ok(Outcome::Value(Value::from(entries)))
}

/// Replace each entry with what the callback returns. Microstates keep
/// their type.
fn map(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let f = callback("map", args)?;
    let mut elements = Vec::new();
    for (seg, tree) in entries_of("map", ms)? {
        let result = f(&standalone(&tree))?;
        elements.push(Element {
            tree: produced(ms, seg.clone(), result)?,
            from: Some(seg.clone()),
            seg,
        });
    }
    assembled(ms, elements)
}

fn filter(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let keep = callback("filter", args)?;
    let mut elements = Vec::new();
    for (seg, tree) in entries_of("filter", ms)? {
        if keep(&standalone(&tree))?.value().is_truthy() {
            elements.push(Element {
                from: Some(seg.clone()),
                seg,
                tree,
            });
        }
    }
    assembled(ms, elements)
}

/// Entries of `ms` as typed subtrees, in order. Absent reads as empty.
fn entries_of(transition: &str, ms: &Microstate) -> Result<Vec<(Seg, Tree)>, Error> {
    match ms.value_of() {
        Value::Null | Value::Map(_) => children(ms),
        other => Err(unexpected(transition, "a map", &other)),
    }
}
