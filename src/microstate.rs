//! The microstate handle.
//!
//! A [`Microstate`] is a node of a tree together with the context of the
//! root it belongs to: the middleware chain its transitions run through, and
//! how that root relates to other trees (a true root, a query result linked
//! to an owner, or detached). Handles are cheap to clone and never change;
//! every transition returns a handle to a new root.

use crate::core::{Path, Seg, Value};
use crate::error::Error;
use crate::middleware::{Chain, Middleware, TransitionDescriptor};
use crate::query;
use crate::schema::{SchemaError, TypeNode, TypeRef};
use crate::transition::{dispatcher, Arg};
use crate::tree::{State, Tree};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// How a root relates to the tree it was computed from.
#[derive(Clone)]
pub(crate) enum Link {
    /// A true root; transitions dispatch here.
    Root,
    /// A query result; paths map onto the owner's subtree.
    Query(Microstate),
    /// Not addressable from any root; transitions fail.
    Detached,
}

pub(crate) struct Context {
    root: Tree,
    middleware: Chain,
    link: Link,
    /// Identity of the standalone root this one descends from through
    /// transitions.
    space: Uuid,
}

impl Context {
    pub(crate) fn root(&self) -> &Tree {
        &self.root
    }

    pub(crate) fn middleware(&self) -> &Chain {
        &self.middleware
    }

    pub(crate) fn link(&self) -> &Link {
        &self.link
    }

    pub(crate) fn space(&self) -> Uuid {
        self.space
    }

    /// Root handle for the result of a transition on this root.
    pub(crate) fn derive(&self, root: Tree) -> Microstate {
        Microstate::from_context(Context {
            root,
            middleware: self.middleware.clone(),
            link: Link::Root,
            space: self.space,
        })
    }
}

/// A typed, immutable view of one node of a state tree.
#[derive(Clone)]
pub struct Microstate {
    context: Arc<Context>,
    tree: Tree,
}

impl Microstate {
    /// A fresh root with no middleware.
    pub(crate) fn standalone(tree: Tree) -> Self {
        Self::from_context(Context {
            root: tree,
            middleware: Chain::default(),
            link: Link::Root,
            space: Uuid::new_v4(),
        })
    }

    fn from_context(context: Context) -> Self {
        let tree = context.root.clone();
        Self {
            context: Arc::new(context),
            tree,
        }
    }

    fn with_tree(&self, tree: Tree) -> Self {
        Self {
            context: self.context.clone(),
            tree,
        }
    }

    /// The same node under a context with a different link.
    pub(crate) fn relink(&self, link: Link) -> Self {
        Self {
            context: Arc::new(Context {
                root: self.context.root.clone(),
                middleware: self.context.middleware.clone(),
                link,
                space: self.context.space,
            }),
            tree: self.tree.clone(),
        }
    }

    pub(crate) fn context(&self) -> &Context {
        &self.context
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn type_node(&self) -> &Arc<TypeNode> {
        self.tree.type_node()
    }

    pub fn type_name(&self) -> &str {
        self.tree.type_node().name()
    }

    /// Path of this node within its root.
    pub fn path(&self) -> &Path {
        self.tree.path()
    }

    pub fn is_root(&self) -> bool {
        self.tree.path().is_root()
    }

    pub fn root(&self) -> Microstate {
        self.with_tree(self.context.root.clone())
    }

    /// Raw value, without constants or computed fields.
    pub fn value_of(&self) -> Value {
        self.tree.value().clone()
    }

    /// Materialized state, cached per node.
    pub fn state(&self) -> Result<State, Error> {
        self.tree.state()
    }

    /// State is derived; it can not be assigned.
    pub fn assign_state(&self, _state: impl Into<Value>) -> Result<(), Error> {
        Err(Error::StateAssignment)
    }

    /// A typed child, a map entry, or a computed field.
    pub fn field(&self, name: &str) -> Result<Microstate, Error> {
        if self.type_node().computed(name).is_some() {
            return query::computed(self, name);
        }
        self.child(Seg::key(name))
    }

    /// An element of a list.
    pub fn at(&self, index: usize) -> Result<Microstate, Error> {
        self.child(Seg::Index(index))
    }

    pub fn child(&self, seg: impl Into<Seg>) -> Result<Microstate, Error> {
        let seg = seg.into();
        match self.tree.child(&seg)? {
            Some(child) => Ok(self.with_tree(child.clone())),
            None => Err(Error::invalid_path(
                self.path().child(seg.clone()),
                format!("{} has no child '{seg}'", self.type_name()),
            )),
        }
    }

    /// The descendant at `path`, relative to this node. Key segments may
    /// name computed fields.
    pub fn get(&self, path: &Path) -> Result<Microstate, Error> {
        path.into_iter().try_fold(self.clone(), |ms, seg| match seg {
            Seg::Key(name) => ms.field(name),
            Seg::Index(index) => ms.at(*index),
        })
    }

    /// Typed children in declaration or value order.
    pub fn children(&self) -> Result<Vec<Microstate>, Error> {
        Ok(self
            .tree
            .children()?
            .values()
            .map(|child| self.with_tree(child.clone()))
            .collect())
    }

    /// Names of the transitions available on this node.
    pub fn transitions(&self) -> impl Iterator<Item = &str> {
        self.type_node().operation_names()
    }

    /// Invoke a transition on this node and return the new root.
    ///
    /// The call passes once through the middleware of the root this node is
    /// anchored to. Query results are anchored to their origin first.
    pub fn transition(&self, name: &str, args: Vec<Arg>) -> Result<Microstate, Error> {
        let (target, chain) = query::anchor(self)?;
        if !target.type_node().has_operation(name) {
            return Err(SchemaError::UnknownTransition {
                type_name: target.type_name().to_string(),
                transition: name.to_string(),
            }
            .into());
        }

        let descriptor = TransitionDescriptor::new(name, target.path().clone(), target.type_name());
        chain.run(&target, &descriptor, &args, &|ms, transition, args| {
            dispatcher::dispatch(ms, transition.name(), args)
        })
    }

    /// Shorthand for the `set` transition.
    pub fn set(&self, value: impl Into<Arg>) -> Result<Microstate, Error> {
        self.transition("set", vec![value.into()])
    }

    /// Create a standalone microstate with the same schema.
    pub fn create(&self, ty: impl Into<TypeRef>, value: impl Into<Value>) -> Result<Microstate, Error> {
        dispatcher::create(self.tree.resolver(), &ty.into(), value.into())
    }

    /// This microstate with `interceptor` added to its middleware.
    pub fn use_middleware<M>(&self, interceptor: M) -> Microstate
    where
        M: Middleware + 'static,
    {
        Self {
            context: Arc::new(Context {
                root: self.context.root.clone(),
                middleware: self.context.middleware.with(Arc::new(interceptor)),
                link: self.context.link.clone(),
                space: self.context.space,
            }),
            tree: self.tree.clone(),
        }
    }

    pub fn middleware(&self) -> &Chain {
        &self.context.middleware
    }

    /// The microstate a query result was derived from.
    pub fn origin(&self) -> Option<&Microstate> {
        match &self.context.link {
            Link::Query(owner) => Some(owner),
            _ => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self.context.link, Link::Detached)
    }

    /// Whether both handles view the very same tree node.
    pub fn same_node(&self, other: &Microstate) -> bool {
        self.tree.ptr_eq(&other.tree)
    }
}

impl fmt::Debug for Microstate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Microstate")
            .field("type", &self.type_name())
            .field("path", self.path())
            .field("value", self.tree.value())
            .finish()
    }
}
