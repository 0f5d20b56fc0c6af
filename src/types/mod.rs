//! Built-in types.
//!
//! `Any`, the primitives `Number`, `String` and `Boolean`, and the
//! containers `Array` and `Object`. Every type gets `set`; composed types
//! additionally get `merge`.

mod array;
mod boolean;
mod number;
mod object;
mod string;

use crate::core::{Path, Seg, Value};
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{Kind, TransitionFn, TypeDecl};
use crate::transition::{Arg, CallbackFn, Outcome};
use crate::tree::node::Element;
use crate::tree::Tree;
use std::sync::Arc;

pub(crate) fn builtins() -> Vec<TypeDecl> {
    vec![
        TypeDecl::builtin("Any", Kind::Any).with_operation("set", op(set)),
        number::decl(),
        string::decl(),
        boolean::decl(),
        array::decl(),
        object::decl(),
    ]
}

/// Operations every composed type starts from. Declared operations with the
/// same name replace them.
pub(crate) fn composed_operations() -> Vec<(String, TransitionFn)> {
    vec![("set".to_string(), op(set)), ("merge".to_string(), op(merge))]
}

fn op<F>(f: F) -> TransitionFn
where
    F: Fn(&Microstate, &[Arg]) -> Result<Outcome, Error> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Replace the node. A microstate argument is grafted with its own type.
fn set(_ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    Ok(args
        .first()
        .cloned()
        .map(Outcome::from)
        .unwrap_or(Outcome::Value(Value::Null)))
}

fn merge(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let patch = required("merge", args, 0)?.value();
    Ok(Outcome::Value(ms.value_of().merge(&patch)))
}

fn required<'a>(transition: &str, args: &'a [Arg], index: usize) -> Result<&'a Arg, Error> {
    args.get(index).ok_or_else(|| {
        Error::transition_failed(transition, format!("missing argument {}", index + 1))
    })
}

fn callback<'a>(transition: &str, args: &'a [Arg]) -> Result<&'a CallbackFn, Error> {
    required(transition, args, 0)?
        .as_callback()
        .ok_or_else(|| Error::transition_failed(transition, "expected a callback"))
}

/// Children of the container `ms` with their segments.
fn children(ms: &Microstate) -> Result<Vec<(Seg, Tree)>, Error> {
    Ok(ms
        .tree()
        .children()?
        .iter()
        .map(|(seg, child)| (seg.clone(), child.clone()))
        .collect())
}

/// A child as a standalone microstate, typed as it is in place, for
/// callbacks to look at and transition.
fn standalone(child: &Tree) -> Microstate {
    Microstate::standalone(child.rebase(Path::root()))
}

/// Rebuild the container `ms` from `elements`.
fn assembled(ms: &Microstate, elements: Vec<Element>) -> Result<Outcome, Error> {
    Ok(Outcome::Microstate(Microstate::standalone(
        ms.tree().assemble(elements),
    )))
}

/// The element a callback produced: a microstate is grafted with its own
/// type, anything else becomes a new element of the container.
fn produced(ms: &Microstate, seg: Seg, result: Arg) -> Result<Tree, Error> {
    match result {
        Arg::Microstate(result) => Ok(result.tree().clone()),
        other => ms.tree().element(seg, other.value()),
    }
}

fn unexpected(transition: &str, expected: &str, found: &Value) -> Error {
    Error::transition_failed(
        transition,
        format!("expected {expected}, found {}", found.kind()),
    )
}
