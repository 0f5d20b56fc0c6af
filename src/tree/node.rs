//! Lazy typed tree nodes.

use crate::core::{Path, Seg, Value};
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{FieldDecl, Kind, SchemaResolver, TypeNode, TypeRef};
use crate::transition::dispatcher;
use crate::tree::state::{Instance, Slot, State};
use crate::tree::ValueSource;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Children of a node keyed by segment, in declaration or value order.
pub type Children = Arc<IndexMap<Seg, Tree>>;

/// For a container rebuilt from another one's elements: each child's
/// segment mapped to the segment it had before. Children with no entry were
/// added by the rebuild.
type Sources = Arc<IndexMap<Seg, Seg>>;

/// One child of a container being rebuilt: where it goes, the subtree to put
/// there, and the segment it had in the container the rebuild started from.
pub(crate) struct Element {
    pub(crate) seg: Seg,
    pub(crate) tree: Tree,
    pub(crate) from: Option<Seg>,
}

/// An immutable node: a resolved type, a value source and a path.
///
/// Children and state are computed on first access and cached for the
/// lifetime of the node. Cloning a `Tree` clones a handle to the same node.
#[derive(Clone)]
pub struct Tree(Arc<Node>);

struct Node {
    resolver: Arc<SchemaResolver>,
    type_node: Arc<TypeNode>,
    source: ValueSource,
    path: Path,
    /// Node whose children this node re-paths instead of building its own.
    template: Option<Tree>,
    sources: Option<Sources>,
    children: OnceLock<Result<Children, Error>>,
    state: OnceLock<Result<State, Error>>,
}

impl Tree {
    fn from_parts(
        resolver: Arc<SchemaResolver>,
        type_node: Arc<TypeNode>,
        source: ValueSource,
        path: Path,
        template: Option<Tree>,
        sources: Option<Sources>,
        children: OnceLock<Result<Children, Error>>,
    ) -> Self {
        Tree(Arc::new(Node {
            resolver,
            type_node,
            source,
            path,
            template,
            sources,
            children,
            state: OnceLock::new(),
        }))
    }

    /// A node without running its type's initializer.
    pub(crate) fn new(
        resolver: Arc<SchemaResolver>,
        type_node: Arc<TypeNode>,
        source: ValueSource,
        path: Path,
    ) -> Self {
        Self::from_parts(resolver, type_node, source, path, None, None, OnceLock::new())
    }

    /// A node of `type_node`, passed through the type's initializer if it
    /// declares one. The initializer may keep the node or replace it,
    /// including with a node of another type.
    pub(crate) fn instantiate(
        resolver: &Arc<SchemaResolver>,
        type_node: Arc<TypeNode>,
        source: ValueSource,
        path: Path,
    ) -> Result<Self, Error> {
        let tree = Self::new(resolver.clone(), type_node, source, path);
        let Some(initializer) = tree.type_node().initializer().cloned() else {
            return Ok(tree);
        };

        let local = Microstate::standalone(tree.rebase(Path::root()));
        match initializer(&local)? {
            None => Ok(tree),
            Some(outcome) => {
                let replaced = dispatcher::realize(&tree, outcome)?;
                tracing::trace!(
                    path = %tree.path(),
                    from = tree.type_node().name(),
                    to = replaced.type_node().name(),
                    "initializer replaced node"
                );
                Ok(replaced)
            }
        }
    }

    /// Same type and path, new value, children supplied by the caller.
    pub(crate) fn rebuilt(&self, source: ValueSource, children: Children) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(children));
        Self::from_parts(
            self.0.resolver.clone(),
            self.0.type_node.clone(),
            source,
            self.0.path.clone(),
            None,
            self.0.sources.clone(),
            cell,
        )
    }

    /// The same subtree addressed from `path`. Types of every descendant,
    /// including ones set by earlier type-shifts, are kept.
    pub fn rebase(&self, path: Path) -> Self {
        if self.0.path == path {
            return self.clone();
        }
        let template = self.0.template.clone().unwrap_or_else(|| self.clone());
        Self::from_parts(
            self.0.resolver.clone(),
            self.0.type_node.clone(),
            self.0.source.clone(),
            path,
            Some(template),
            self.0.sources.clone(),
            OnceLock::new(),
        )
    }

    /// An equivalent node that shares no caches with this one.
    ///
    /// Used where a node must be referenced from its own cached state.
    pub(crate) fn detach(&self) -> Self {
        let children = OnceLock::new();
        let template = match self.0.children.get() {
            Some(Ok(built)) => {
                let _ = children.set(Ok(built.clone()));
                None
            }
            _ => self.0.template.clone(),
        };
        Self::from_parts(
            self.0.resolver.clone(),
            self.0.type_node.clone(),
            self.0.source.clone(),
            self.0.path.clone(),
            template,
            self.0.sources.clone(),
            children,
        )
    }

    pub fn type_node(&self) -> &Arc<TypeNode> {
        &self.0.type_node
    }

    pub fn resolver(&self) -> &Arc<SchemaResolver> {
        &self.0.resolver
    }

    pub fn path(&self) -> &Path {
        &self.0.path
    }

    pub fn source(&self) -> &ValueSource {
        &self.0.source
    }

    /// The raw value, forced on first access.
    pub fn value(&self) -> &Value {
        self.0.source.get()
    }

    pub fn ptr_eq(&self, other: &Tree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn children(&self) -> Result<&Children, Error> {
        match self.0.children.get_or_init(|| self.build_children()) {
            Ok(children) => Ok(children),
            Err(err) => Err(err.clone()),
        }
    }

    pub fn child(&self, seg: &Seg) -> Result<Option<&Tree>, Error> {
        Ok(self.children()?.get(seg))
    }

    /// The node at `path` relative to this one.
    pub fn descend(&self, path: &Path) -> Result<Tree, Error> {
        let mut current = self.clone();
        for seg in path {
            let next = current.child(seg)?.cloned().ok_or_else(|| {
                Error::invalid_path(
                    current.path().child(seg.clone()),
                    format!("{} has no child '{seg}'", current.type_node().name()),
                )
            })?;
            current = next;
        }
        Ok(current)
    }

    fn build_children(&self) -> Result<Children, Error> {
        if let Some(template) = &self.0.template {
            let rebased = template
                .children()?
                .iter()
                .map(|(seg, child)| (seg.clone(), child.rebase(self.0.path.child(seg.clone()))))
                .collect();
            return Ok(Arc::new(rebased));
        }

        let node = &self.0.type_node;
        let mut children = IndexMap::new();
        match node.kind() {
            Kind::Composed => {
                for (name, ty) in node.typed_fields() {
                    let seg = Seg::key(name);
                    let child = self.spawn(self.0.resolver.resolve(ty)?, seg.clone())?;
                    children.insert(seg, child);
                }
            }
            Kind::List => {
                if let Some(items) = self.value().as_list() {
                    for (index, item) in items.iter().enumerate() {
                        let seg = Seg::Index(index);
                        children.insert(seg.clone(), self.spawn(self.element_node(item)?, seg)?);
                    }
                }
            }
            Kind::Map => {
                if let Some(entries) = self.value().as_map() {
                    for (key, item) in entries.iter() {
                        let seg = Seg::key(key.as_str());
                        children.insert(seg.clone(), self.spawn(self.element_node(item)?, seg)?);
                    }
                }
            }
            Kind::Any | Kind::Primitive(_) => {}
        }
        Ok(Arc::new(children))
    }

    /// The segment the child at `seg` had in the container this one was
    /// rebuilt from, or `None` if the rebuild added it. Nodes that were not
    /// rebuilt from another container map every segment to itself.
    pub(crate) fn origin_of(&self, seg: &Seg) -> Option<Seg> {
        match &self.0.sources {
            Some(sources) => sources.get(seg).cloned(),
            None => Some(seg.clone()),
        }
    }

    /// A new element of this container holding `value`, typed by the
    /// element type or inferred from the value.
    pub(crate) fn element(&self, seg: Seg, value: Value) -> Result<Tree, Error> {
        let node = self.element_node(&value)?;
        Tree::instantiate(
            &self.0.resolver,
            node,
            ValueSource::ready(value),
            self.0.path.child(seg),
        )
    }

    /// This container rebuilt from `elements`. Each element keeps its own
    /// type and remembers, through this container's own sources, where it
    /// came from.
    pub(crate) fn assemble(&self, elements: Vec<Element>) -> Tree {
        let mut children = IndexMap::with_capacity(elements.len());
        let mut sources = IndexMap::new();
        let mut values = Vec::with_capacity(elements.len());

        for Element { seg, tree, from } in elements {
            if let Some(origin) = from.and_then(|from| self.origin_of(&from)) {
                sources.insert(seg.clone(), origin);
            }
            values.push((seg.to_string(), tree.value().clone()));
            children.insert(seg.clone(), tree.rebase(self.0.path.child(seg)));
        }

        let value = match self.0.type_node.kind() {
            Kind::Map => Value::map(values),
            _ => Value::list(values.into_iter().map(|(_, value)| value)),
        };
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::new(children)));
        Self::from_parts(
            self.0.resolver.clone(),
            self.0.type_node.clone(),
            ValueSource::ready(value),
            self.0.path.clone(),
            None,
            Some(Arc::new(sources)),
            cell,
        )
    }

    fn spawn(&self, type_node: Arc<TypeNode>, seg: Seg) -> Result<Tree, Error> {
        Tree::instantiate(
            &self.0.resolver,
            type_node,
            self.0.source.child(seg.clone()),
            self.0.path.child(seg),
        )
    }

    fn element_node(&self, item: &Value) -> Result<Arc<TypeNode>, Error> {
        let ty = match self.0.type_node.element() {
            Some(element) => element.clone(),
            None => TypeRef::infer(item),
        };
        Ok(self.0.resolver.resolve(&ty)?)
    }

    /// Materialized state, cached.
    pub fn state(&self) -> Result<State, Error> {
        self.0
            .state
            .get_or_init(|| self.materialize(&mut Vec::new()))
            .clone()
    }

    /// `ancestors` holds the types of the composed nodes being materialized
    /// above this one. A field of one of those types is where the schema
    /// recurses; values alone can not bound it, since an initializer may
    /// fill every level in, so that field is left to be materialized on read.
    fn materialize(&self, ancestors: &mut Vec<TypeRef>) -> Result<State, Error> {
        let node = &self.0.type_node;
        match node.kind() {
            Kind::Any => Ok(State::from(self.value())),
            Kind::Primitive(primitive) => Ok(if self.value().is_null() {
                State::from(&primitive.default_value())
            } else {
                State::from(self.value())
            }),
            Kind::List => {
                let items = self
                    .children()?
                    .values()
                    .map(|child| child.materialize(ancestors))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(State::List(Arc::new(items)))
            }
            Kind::Map => {
                let mut entries = IndexMap::new();
                for (seg, child) in self.children()?.iter() {
                    entries.insert(seg.to_string(), child.materialize(ancestors)?);
                }
                Ok(State::Map(Arc::new(entries)))
            }
            Kind::Composed => {
                ancestors.push(node.type_ref().clone());
                let instance = self.materialize_instance(ancestors);
                ancestors.pop();
                instance
            }
        }
    }

    fn materialize_instance(&self, ancestors: &mut Vec<TypeRef>) -> Result<State, Error> {
        let node = &self.0.type_node;
        let children = self.children()?;
        let mut slots = IndexMap::new();

        for (name, field) in node.fields() {
            let slot = match field {
                FieldDecl::Constant(value) => Slot::Ready(State::from(value)),
                FieldDecl::Computed(_) => Slot::computed(),
                FieldDecl::Typed(_) => {
                    let child = children.get(&Seg::key(name)).ok_or_else(|| {
                        Error::invalid_path(self.path().child(Seg::key(name)), "field was not built")
                    })?;
                    let child_type = child.type_node();
                    if recurses(child_type.type_ref(), ancestors) {
                        Slot::Deferred(child.clone())
                    } else {
                        Slot::Ready(child.materialize(ancestors)?)
                    }
                }
            };
            slots.insert(name.to_string(), slot);
        }

        let owner = node.has_computed().then(|| self.detach());
        Ok(State::Instance(Instance::new(node.clone(), slots, owner)))
    }
}

/// Whether materializing a node of `ty` may lead back into one of
/// `ancestors`, directly or through container elements.
fn recurses(ty: &TypeRef, ancestors: &[TypeRef]) -> bool {
    ancestors.contains(ty)
        || match ty {
            TypeRef::ArrayOf(element) | TypeRef::ObjectOf(element) => recurses(element, ancestors),
            TypeRef::Named(_) => false,
        }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("type", &self.0.type_node.name())
            .field("path", &self.0.path)
            .field("value", &self.0.source)
            .finish()
    }
}
