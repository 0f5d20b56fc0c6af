//! Computed fields and query results.
//!
//! A computed field is evaluated against a standalone microstate rooted at
//! the owning node. What it returns decides how the result relates to the
//! owner's tree:
//!
//! * a node of that standalone tree is reachable from the owner by walking
//!   declared fields, so it is returned as the owner's own descendant;
//! * a node of a tree *derived* from it by transitions is not reachable, so
//!   it becomes a query result linked to the owner: its paths are read as
//!   paths below the owner;
//! * a plain value, or a node of an unrelated tree, is detached.
//!
//! Transitions on a query result are re-anchored through the link to the
//! owner's root, so they change the owner's tree and pass through the
//! owner's middleware. Elements of lists and maps rebuilt along the way
//! (filtered, mapped, shifted) are traced back to the element they came
//! from. A path that does not exist below the owner fails with
//! [`Error::DetachedQuery`].

use crate::core::{Path, Value};
use crate::error::Error;
use crate::microstate::{Link, Microstate};
use crate::middleware::Chain;
use crate::schema::TypeRef;

/// What a computed field produces.
#[derive(Clone, Debug)]
pub enum Derived {
    Value(Value),
    Microstate(Microstate),
}

impl From<Microstate> for Derived {
    fn from(ms: Microstate) -> Self {
        Derived::Microstate(ms)
    }
}

macro_rules! derived_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Derived {
                fn from(value: $t) -> Self {
                    Derived::Value(Value::from(value))
                }
            }
        )*
    };
}

derived_from_value!(Value, serde_json::Value, bool, f64, i32, i64, u32, usize, &str, String);

/// Evaluate the computed field `name` of `owner`.
pub(crate) fn computed(owner: &Microstate, name: &str) -> Result<Microstate, Error> {
    let derive = owner.type_node().computed(name).cloned().ok_or_else(|| {
        Error::invalid_path(
            owner.path().child(name.into()),
            format!("type {} has no computed field '{name}'", owner.type_name()),
        )
    })?;

    tracing::trace!(field = name, path = %owner.path(), "evaluating computed field");
    let local = Microstate::standalone(owner.tree().rebase(Path::root()));
    match derive(&local)? {
        Derived::Microstate(result) => reanchor(&result, &local, owner),
        Derived::Value(value) => {
            let detached = owner.create(TypeRef::infer(&value), value)?;
            Ok(detached.relink(Link::Detached))
        }
    }
}

/// Express `result`, produced while evaluating against `local`, in terms of
/// `owner`.
fn reanchor(result: &Microstate, local: &Microstate, owner: &Microstate) -> Result<Microstate, Error> {
    match result.context().link() {
        Link::Detached => Ok(result.clone()),
        Link::Query(origin) => {
            let origin = reanchor(origin, local, owner)?;
            Ok(result.relink(Link::Query(origin)))
        }
        Link::Root if result.context().space() == local.context().space() => {
            if result.context().root().ptr_eq(local.context().root()) {
                owner.get(result.path())
            } else {
                Ok(result.relink(Link::Query(owner.clone())))
            }
        }
        Link::Root => Ok(result.relink(Link::Detached)),
    }
}

/// Follow query links down to a microstate of a true root, collecting the
/// middleware of every handle on the way.
pub(crate) fn anchor(ms: &Microstate) -> Result<(Microstate, Chain), Error> {
    match ms.context().link() {
        Link::Root => Ok((ms.clone(), ms.context().middleware().clone())),
        Link::Query(origin) => {
            let target = origin_path(ms)
                .and_then(|path| origin.get(&path).ok())
                .ok_or_else(|| {
                    tracing::debug!(path = %ms.path(), "query path has no origin counterpart");
                    Error::detached(ms.path().clone())
                })?;
            let (anchored, inner) = anchor(&target)?;
            Ok((anchored, ms.context().middleware().then(&inner)))
        }
        Link::Detached => {
            tracing::debug!(path = %ms.path(), "transition on detached microstate");
            Err(Error::detached(ms.path().clone()))
        }
    }
}

/// `ms`'s path as it reads below its origin. Elements of containers that
/// were rebuilt while deriving the query are traced back to the element they
/// came from; `None` if one of them has no such element.
fn origin_path(ms: &Microstate) -> Option<Path> {
    let mut node = ms.context().root().clone();
    let mut mapped = Path::root();
    for seg in ms.path() {
        mapped = mapped.child(node.origin_of(seg)?);
        let next = node.child(seg).ok()??.clone();
        node = next;
    }
    Some(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TypeBuilder;
    use crate::{args, Engine};
    use serde_json::json;

    fn engine() -> Engine {
        Engine::builder()
            .register(
                TypeBuilder::new("Person")
                    .field("firstName", "String")
                    .field("lastName", "String")
                    .field("age", "Number")
                    .computed("fullName", |ms| {
                        let state = ms.state()?;
                        let first = state.field("firstName")?;
                        let last = state.field("lastName")?;
                        Ok(format!(
                            "{} {}",
                            first.as_str().unwrap_or_default(),
                            last.as_str().unwrap_or_default()
                        )
                        .into())
                    })
                    .computed("years", |ms| Ok(ms.field("age")?.into()))
                    .computed("older", |ms| {
                        Ok(ms.field("age")?.transition("increment", args![])?.field("age")?.into())
                    })
                    .build(),
            )
            .build()
            .unwrap()
    }

    fn homer(engine: &Engine) -> Microstate {
        engine
            .create(
                "Person",
                json!({"firstName": "Homer", "lastName": "Simpson", "age": 39}),
            )
            .unwrap()
    }

    #[test]
    fn reachable_results_are_the_owners_own_nodes() {
        let engine = engine();
        let homer = homer(&engine);
        let years = homer.field("years").unwrap();

        assert!(years.origin().is_none());
        assert!(years.same_node(&homer.field("age").unwrap()));
    }

    #[test]
    fn derived_results_link_to_the_owner() {
        let engine = engine();
        let homer = homer(&engine);
        let older = homer.field("older").unwrap();

        assert_eq!(older.state().unwrap().as_f64(), Some(40.0));
        assert!(older.origin().is_some());
        assert_eq!(homer.value_of().get("age"), Some(&Value::from(39)));
    }

    #[test]
    fn transitions_on_query_results_reach_the_origin() {
        let engine = engine();
        let homer = homer(&engine);
        let next = homer
            .field("older")
            .unwrap()
            .transition("increment", args![])
            .unwrap();

        assert!(next.is_root());
        assert_eq!(next.value_of().get("age"), Some(&Value::from(40)));
        assert_eq!(next.field("older").unwrap().state().unwrap().as_f64(), Some(41.0));
    }

    #[test]
    fn plain_values_are_detached() {
        let engine = engine();
        let homer = homer(&engine);
        let name = homer.field("fullName").unwrap();

        assert_eq!(name.state().unwrap().as_str(), Some("Homer Simpson"));
        assert!(name.is_detached());
        assert!(matches!(
            name.transition("concat", args!["!"]),
            Err(Error::DetachedQuery { .. })
        ));
    }

    #[test]
    fn repeated_access_is_stable() {
        let engine = engine();
        let homer = homer(&engine);
        let a = homer.field("older").unwrap().state().unwrap();
        let b = homer.field("older").unwrap().state().unwrap();
        assert_eq!(a, b);
    }
}
