//! Materialized, typed state.

use crate::core::{Path, Value};
use crate::error::Error;
use crate::microstate::Microstate;
use crate::query;
use crate::schema::TypeNode;
use crate::tree::Tree;
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// The read-only view of a microstate.
///
/// Leaves become scalars, containers become lists and maps, and composed
/// types become [`Instance`]s that carry their type.
#[derive(Clone, Debug, PartialEq)]
pub enum State {
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    List(Arc<Vec<State>>),
    Map(Arc<IndexMap<String, State>>),
    Instance(Instance),
}

impl State {
    pub fn is_null(&self) -> bool {
        matches!(self, State::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            State::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            State::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            State::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[State]> {
        match self {
            State::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, State>> {
        match self {
            State::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            State::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Type name of an instance.
    pub fn type_name(&self) -> Option<&str> {
        self.as_instance().map(Instance::type_name)
    }

    pub fn is_instance_of(&self, name: &str) -> bool {
        self.as_instance().is_some_and(|i| i.is_instance_of(name))
    }

    /// A field of an instance, including computed fields, or an entry of a
    /// map.
    pub fn field(&self, name: &str) -> Result<State, Error> {
        match self {
            State::Instance(instance) => instance.field(name),
            State::Map(entries) => entries
                .get(name)
                .cloned()
                .ok_or_else(|| Error::invalid_path(Path::root().key(name), "no such entry")),
            _ => Err(Error::invalid_path(
                Path::root().key(name),
                "state has no fields",
            )),
        }
    }

    /// An element of a list.
    pub fn index(&self, index: usize) -> Result<State, Error> {
        self.as_list()
            .and_then(|items| items.get(index))
            .cloned()
            .ok_or_else(|| Error::invalid_path(Path::root().index(index), "no such element"))
    }

    /// Plain-data rendering. Instances render their constants and typed
    /// fields; computed fields are left out, and recursive fields not read
    /// yet render their raw value.
    pub fn to_value(&self) -> Value {
        match self {
            State::Null => Value::Null,
            State::Bool(b) => Value::Bool(*b),
            State::Number(n) => Value::Number(*n),
            State::String(s) => Value::String(s.clone()),
            State::List(items) => Value::list(items.iter().map(State::to_value)),
            State::Map(entries) => {
                Value::map(entries.iter().map(|(k, v)| (k.clone(), v.to_value())))
            }
            State::Instance(instance) => instance.to_value(),
        }
    }
}

impl From<&Value> for State {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => State::Null,
            Value::Bool(b) => State::Bool(*b),
            Value::Number(n) => State::Number(*n),
            Value::String(s) => State::String(s.clone()),
            Value::List(items) => State::List(Arc::new(items.iter().map(State::from).collect())),
            Value::Map(entries) => State::Map(Arc::new(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), State::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<Value> for State {
    fn from(value: Value) -> Self {
        State::from(&value)
    }
}

pub(crate) enum Slot {
    Ready(State),
    /// Field whose type recurses into an enclosing one; materialized when
    /// read.
    Deferred(Tree),
    Computed(OnceLock<Result<State, Error>>),
}

impl Slot {
    pub(crate) fn computed() -> Self {
        Slot::Computed(OnceLock::new())
    }
}

/// State of a composed type.
#[derive(Clone)]
pub struct Instance {
    type_node: Arc<TypeNode>,
    slots: Arc<IndexMap<String, Slot>>,
    owner: Option<Tree>,
}

impl Instance {
    pub(crate) fn new(
        type_node: Arc<TypeNode>,
        slots: IndexMap<String, Slot>,
        owner: Option<Tree>,
    ) -> Self {
        Self {
            type_node,
            slots: Arc::new(slots),
            owner,
        }
    }

    pub fn type_name(&self) -> &str {
        self.type_node.name()
    }

    /// Whether the instance's type is `name` or extends it.
    pub fn is_instance_of(&self, name: &str) -> bool {
        self.type_node.is_a(name)
    }

    /// Field names in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Read a field. Computed fields are evaluated on first read and cached
    /// in this instance.
    pub fn field(&self, name: &str) -> Result<State, Error> {
        let slot = self.slots.get(name).ok_or_else(|| {
            Error::invalid_path(
                Path::root().key(name),
                format!("type {} has no field '{name}'", self.type_name()),
            )
        })?;
        match slot {
            Slot::Ready(state) => Ok(state.clone()),
            Slot::Deferred(tree) => tree.state(),
            Slot::Computed(cell) => cell.get_or_init(|| self.evaluate(name)).clone(),
        }
    }

    fn evaluate(&self, name: &str) -> Result<State, Error> {
        let owner = self.owner.as_ref().ok_or_else(|| {
            Error::invalid_path(Path::root().key(name), "instance has no computed fields")
        })?;
        let local = Microstate::standalone(owner.rebase(Path::root()));
        query::computed(&local, name)?.state()
    }

    fn to_value(&self) -> Value {
        Value::map(self.slots.iter().filter_map(|(name, slot)| match slot {
            Slot::Ready(state) => Some((name.clone(), state.to_value())),
            Slot::Deferred(tree) => Some((name.clone(), tree.value().clone())),
            Slot::Computed(_) => None,
        }))
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        if self.type_node.type_ref() != other.type_node.type_ref()
            || self.slots.len() != other.slots.len()
        {
            return false;
        }
        self.slots.iter().all(|(name, slot)| match (slot, other.slots.get(name)) {
            (Slot::Ready(a), Some(Slot::Ready(b))) => a == b,
            (Slot::Deferred(a), Some(Slot::Deferred(b))) => {
                a.type_node().type_ref() == b.type_node().type_ref() && a.value() == b.value()
            }
            (Slot::Computed(_), Some(Slot::Computed(_))) => true,
            _ => false,
        })
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.type_name())?;
        let mut map = f.debug_map();
        for (name, slot) in self.slots.iter() {
            match slot {
                Slot::Ready(state) => map.entry(name, state),
                Slot::Deferred(_) => map.entry(name, &format_args!("<deferred>")),
                Slot::Computed(_) => map.entry(name, &format_args!("<computed>")),
            };
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_is_deep() {
        let state = State::from(&Value::from(json!({"a": [1, {"b": true}]})));
        let b = state.field("a").unwrap().index(1).unwrap().field("b").unwrap();
        assert_eq!(b, State::Bool(true));
    }

    #[test]
    fn to_value_round_trips_plain_state() {
        let value = Value::from(json!({"list": [1, 2], "name": "x"}));
        assert_eq!(State::from(&value).to_value(), value);
    }

    #[test]
    fn field_on_scalar_fails() {
        assert!(State::Number(1.0).field("x").is_err());
        assert!(State::Null.index(0).is_err());
    }
}
