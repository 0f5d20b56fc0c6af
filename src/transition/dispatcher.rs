//! Path-addressed transition dispatch.
//!
//! A dispatch resolves the node at a path, runs the named operation against
//! a microstate rooted at that node, turns the operation's [`Outcome`] into a
//! replacement subtree and splices it back in. Ancestors are rebuilt with the
//! lens; every sibling subtree is carried over by reference.

use crate::core::{lens, Path, Seg, Value};
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{SchemaError, SchemaResolver, TypeRef};
use crate::transition::{Arg, Outcome};
use crate::tree::{Tree, ValueSource};
use std::sync::Arc;

/// Create a root microstate of `ty` from `value`.
pub(crate) fn create(
    resolver: &Arc<SchemaResolver>,
    ty: &TypeRef,
    value: Value,
) -> Result<Microstate, Error> {
    let node = resolver.resolve(ty)?;
    let tree = Tree::instantiate(resolver, node, ValueSource::ready(value), Path::root())?;
    Ok(Microstate::standalone(tree))
}

/// Run `name` at `target`'s path within `target`'s root and return the new
/// root. Nothing is produced unless every step succeeds.
pub(crate) fn dispatch(target: &Microstate, name: &str, args: &[Arg]) -> Result<Microstate, Error> {
    let context = target.context();
    let root = context.root();
    let path = target.path();

    let current = root.descend(path)?;
    let node = current.type_node().clone();
    let operation = node
        .operation(name)
        .cloned()
        .ok_or_else(|| SchemaError::UnknownTransition {
            type_name: node.name().to_string(),
            transition: name.to_string(),
        })?;

    tracing::debug!(
        transition = name,
        path = %path,
        type_name = node.name(),
        "dispatching transition"
    );

    let local = Microstate::standalone(current.rebase(Path::root()));
    let outcome = operation(&local, args)?;
    let replacement = realize(&current, outcome)?;

    if replacement.type_node().type_ref() != node.type_ref() {
        tracing::debug!(
            path = %path,
            from = node.name(),
            to = replacement.type_node().name(),
            "type shift"
        );
    }

    let new_root = splice(root, path.segments(), replacement)?;
    Ok(context.derive(new_root))
}

/// Build the subtree an outcome describes, addressed at `current`'s path.
pub(crate) fn realize(current: &Tree, outcome: Outcome) -> Result<Tree, Error> {
    let path = current.path().clone();
    let resolver = current.resolver();
    match outcome {
        Outcome::Value(value) => Tree::instantiate(
            resolver,
            current.type_node().clone(),
            ValueSource::ready(value),
            path,
        ),
        Outcome::Microstate(ms) => Ok(ms.tree().rebase(path)),
        Outcome::Shift { target, seed } => {
            let node = resolver.resolve(&target)?;
            let value = seed.unwrap_or_else(|| current.value().clone());
            Tree::instantiate(resolver, node, ValueSource::ready(value), path)
        }
        Outcome::Declared { decl, seed } => {
            let node = resolver.resolve_decl(&decl)?;
            let value = seed.unwrap_or_else(|| current.value().clone());
            Tree::instantiate(resolver, node, ValueSource::ready(value), path)
        }
    }
}

fn splice(node: &Tree, segs: &[Seg], replacement: Tree) -> Result<Tree, Error> {
    let Some((seg, rest)) = segs.split_first() else {
        return Ok(replacement);
    };

    let child = node.child(seg)?.cloned().ok_or_else(|| {
        Error::invalid_path(node.path().child(seg.clone()), "no such child")
    })?;
    let next = splice(&child, rest, replacement)?;

    let value = lens::set(node.value(), &Path::from(seg.clone()), next.value().clone())
        .map_err(|_| {
            Error::invalid_path(
                node.path().child(seg.clone()),
                format!("cannot write into a {} value", node.value().kind()),
            )
        })?;
    let mut children = (**node.children()?).clone();
    children.insert(seg.clone(), next);

    Ok(node.rebuilt(ValueSource::ready(value), Arc::new(children)))
}
