//! Type declarations as registered by the application.

use crate::core::Value;
use crate::error::Error;
use crate::microstate::Microstate;
use crate::query::Derived;
use crate::transition::{Arg, Outcome};
use std::fmt;
use std::sync::Arc;

/// Implementation of a named transition.
///
/// Receives a microstate rooted at the node the transition was invoked on
/// and the caller's arguments.
pub type TransitionFn =
    Arc<dyn Fn(&Microstate, &[Arg]) -> Result<Outcome, Error> + Send + Sync>;

/// Derivation backing a computed field.
pub type ComputedFn = Arc<dyn Fn(&Microstate) -> Result<Derived, Error> + Send + Sync>;

/// Hook run whenever a node of the declaring type is instantiated.
///
/// `Ok(None)` keeps the node as it is; `Ok(Some(outcome))` replaces it.
pub type Initializer =
    Arc<dyn Fn(&Microstate) -> Result<Option<Outcome>, Error> + Send + Sync>;

/// Identity of a declared type. This is the key types are memoized by.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Named(Arc<str>),
    /// `Array<T>`: a list whose elements are all of type `T`.
    ArrayOf(Box<TypeRef>),
    /// `Object<T>`: a map whose values are all of type `T`.
    ObjectOf(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl AsRef<str>) -> Self {
        TypeRef::Named(Arc::from(name.as_ref()))
    }

    pub fn array_of(element: impl Into<TypeRef>) -> Self {
        TypeRef::ArrayOf(Box::new(element.into()))
    }

    pub fn object_of(element: impl Into<TypeRef>) -> Self {
        TypeRef::ObjectOf(Box::new(element.into()))
    }

    /// The built-in type a bare value would be given.
    pub fn infer(value: &Value) -> Self {
        TypeRef::named(match value {
            Value::Null => "Any",
            Value::Bool(_) => "Boolean",
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::List(_) => "Array",
            Value::Map(_) => "Object",
        })
    }

    /// Registry names this reference depends on.
    pub fn names(&self) -> Vec<&str> {
        match self {
            TypeRef::Named(name) => vec![name],
            TypeRef::ArrayOf(inner) => {
                let mut names = vec!["Array"];
                names.extend(inner.names());
                names
            }
            TypeRef::ObjectOf(inner) => {
                let mut names = vec!["Object"];
                names.extend(inner.names());
                names
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::ArrayOf(inner) => write!(f, "Array<{inner}>"),
            TypeRef::ObjectOf(inner) => write!(f, "Object<{inner}>"),
        }
    }
}

impl From<&str> for TypeRef {
    fn from(name: &str) -> Self {
        TypeRef::named(name)
    }
}

impl From<String> for TypeRef {
    fn from(name: String) -> Self {
        TypeRef::Named(Arc::from(name))
    }
}

impl From<&TypeRef> for TypeRef {
    fn from(ty: &TypeRef) -> Self {
        ty.clone()
    }
}

/// Leaf kinds with a default state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Primitive {
    Number,
    String,
    Boolean,
}

impl Primitive {
    /// State of a node of this kind whose value is absent.
    pub fn default_value(self) -> Value {
        match self {
            Primitive::Number => Value::Number(0.0),
            Primitive::String => Value::from(""),
            Primitive::Boolean => Value::Bool(false),
        }
    }
}

/// How a type's children and state are derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// Opaque value, no children.
    Any,
    Primitive(Primitive),
    /// Children are the indices of the current value.
    List,
    /// Children are the keys of the current value.
    Map,
    /// Children are the declared typed fields.
    Composed,
}

/// One entry of a type's field table.
#[derive(Clone)]
pub enum FieldDecl {
    /// Literal default, present in state and never in the raw value.
    Constant(Value),
    /// Child microstate of the referenced type.
    Typed(TypeRef),
    /// Derivation evaluated on demand.
    Computed(ComputedFn),
}

impl fmt::Debug for FieldDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDecl::Constant(value) => f.debug_tuple("Constant").field(value).finish(),
            FieldDecl::Typed(ty) => f.debug_tuple("Typed").field(ty).finish(),
            FieldDecl::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// A registered type: fields, transitions and an optional initializer.
///
/// Application types are built with [`TypeBuilder`](crate::builder::TypeBuilder).
/// Entries are kept in declaration order, duplicates included; the resolver
/// rejects duplicates when the type is first resolved.
#[derive(Clone)]
pub struct TypeDecl {
    pub(crate) name: Arc<str>,
    pub(crate) kind: Kind,
    pub(crate) extends: Option<Arc<str>>,
    pub(crate) fields: Vec<(String, FieldDecl)>,
    pub(crate) operations: Vec<(String, TransitionFn)>,
    pub(crate) initializer: Option<Initializer>,
}

impl TypeDecl {
    pub(crate) fn builtin(name: &str, kind: Kind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
            extends: None,
            fields: Vec::new(),
            operations: Vec::new(),
            initializer: None,
        }
    }

    pub(crate) fn with_operation(mut self, name: &str, op: TransitionFn) -> Self {
        self.operations.push((name.to_string(), op));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn operation_names(&self) -> impl Iterator<Item = &str> {
        self.operations.iter().map(|(name, _)| name.as_str())
    }
}

impl fmt::Debug for TypeDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDecl")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("extends", &self.extends)
            .field("fields", &self.fields)
            .field("operations", &self.operation_names().collect::<Vec<_>>())
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}
