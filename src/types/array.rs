use super::{assembled, callback, children, op, produced, set, standalone, unexpected};
use crate::core::{Seg, Value};
use crate::error::Error;
use crate::microstate::Microstate;
use crate::schema::{Kind, TypeDecl};
use crate::transition::{Arg, Outcome};
use crate::tree::node::Element;
use crate::tree::Tree;

pub(super) fn decl() -> TypeDecl {
    TypeDecl::builtin("Array", Kind::List)
        .with_operation("set", op(set))
        .with_operation("push", op(push))
        .with_operation("pop", op(pop))
        .with_operation("shift", op(shift))
        .with_operation("unshift", op(unshift))
        .with_operation("filter", op(filter))
        .with_operation("map", op(map))
        .with_operation("clear", op(|_, _| Ok(Outcome::Value(Value::list([])))))
}

/// Elements of `ms`, in order. Absent reads as empty.
fn items(transition: &str, ms: &Microstate) -> Result<Vec<Tree>, Error> {
    match ms.value_of() {
        Value::Null | Value::List(_) => {
            Ok(children(ms)?.into_iter().map(|(_, tree)| tree).collect())
        }
        other => Err(unexpected(transition, "a list", &other)),
    }
}

/// Lay `parts` out as the new list: kept elements remember their old index,
/// added ones have none.
fn relist(
    ms: &Microstate,
    parts: impl IntoIterator<Item = (Tree, Option<usize>)>,
) -> Result<Outcome, Error> {
    let elements = parts
        .into_iter()
        .enumerate()
        .map(|(index, (tree, from))| Element {
            seg: Seg::Index(index),
            tree,
            from: from.map(Seg::Index),
        })
        .collect();
    assembled(ms, elements)
}

fn kept(items: Vec<Tree>) -> impl Iterator<Item = (Tree, Option<usize>)> {
    items.into_iter().enumerate().map(|(index, tree)| (tree, Some(index)))
}

/// Arguments as new elements, numbered from `start`.
fn added(
    ms: &Microstate,
    args: &[Arg],
    start: usize,
) -> Result<Vec<(Tree, Option<usize>)>, Error> {
    args.iter()
        .enumerate()
        .map(|(offset, arg)| -> Result<_, Error> {
            let tree = produced(ms, Seg::Index(start + offset), arg.clone())?;
            Ok((tree, None))
        })
        .collect()
}

fn push(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let items = items("push", ms)?;
    let tail = added(ms, args, items.len())?;
    relist(ms, kept(items).chain(tail))
}

fn pop(ms: &Microstate, _args: &[Arg]) -> Result<Outcome, Error> {
    let mut items = items("pop", ms)?;
    items.pop();
    relist(ms, kept(items))
}

fn shift(ms: &Microstate, _args: &[Arg]) -> Result<Outcome, Error> {
    let items = items("shift", ms)?;
    relist(ms, kept(items).skip(1))
}

fn unshift(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let items = items("unshift", ms)?;
    let front = added(ms, args, 0)?;
    relist(ms, front.into_iter().chain(kept(items)))
}

/// Keep the elements for which the callback returns something truthy.
fn filter(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let keep = callback("filter", args)?;
    let mut parts = Vec::new();
    for (tree, from) in kept(items("filter", ms)?) {
        if keep(&standalone(&tree))?.value().is_truthy() {
            parts.push((tree, from));
        }
    }
    relist(ms, parts)
}

/// Replace each element with what the callback returns. Microstates keep
/// their type.
fn map(ms: &Microstate, args: &[Arg]) -> Result<Outcome, Error> {
    let f = callback("map", args)?;
    let parts = kept(items("map", ms)?)
        .enumerate()
        .map(|(index, (tree, from))| -> Result<_, Error> {
            let result = f(&standalone(&tree))?;
            Ok((produced(ms, Seg::Index(index), result)?, from))
        })
        .collect::<Result<Vec<_>, _>>()?;
    relist(ms, parts)
}

#[cfg(test)]
mod tests {
    use crate::core::Value;
    use crate::error::Error;
    use crate::schema::TypeRef;
    use crate::transition::Arg;
    use crate::{args, Engine};
    use serde_json::json;

    fn letters() -> crate::Microstate {
        Engine::default().create("Array", json!(["a", "b", "c"])).unwrap()
    }

    #[test]
    fn push_then_pop_restores_by_value() {
        let ms = letters();
        let pushed = ms.transition("push", args!["d"]).unwrap();
        assert_eq!(pushed.value_of(), Value::from(json!(["a", "b", "c", "d"])));

        let popped = pushed.transition("pop", args![]).unwrap();
        assert_eq!(popped.value_of(), ms.value_of());
        assert!(!popped.value_of().ptr_eq(&ms.value_of()));
    }

    #[test]
    fn shift_and_unshift_work_at_the_front() {
        let ms = letters();
        assert_eq!(
            ms.transition("shift", args![]).unwrap().value_of(),
            Value::from(json!(["b", "c"]))
        );
        assert_eq!(
            ms.transition("unshift", args!["z"]).unwrap().value_of(),
            Value::from(json!(["z", "a", "b", "c"]))
        );
    }

    #[test]
    fn filter_and_map_see_element_microstates() {
        let ms = letters();
        let filtered = ms
            .transition(
                "filter",
                vec![Arg::callback(|el| Ok(Arg::from(el.state()?.as_str() != Some("a"))))],
            )
            .unwrap();
        assert_eq!(filtered.value_of(), Value::from(json!(["b", "c"])));

        let mapped = ms
            .transition(
                "map",
                vec![Arg::callback(|el| {
                    Ok(Arg::from(el.state()?.as_str().unwrap_or_default().to_uppercase()))
                })],
            )
            .unwrap();
        assert_eq!(mapped.value_of(), Value::from(json!(["A", "B", "C"])));
    }

    #[test]
    fn map_may_return_transition_results() {
        let ms = letters();
        let mapped = ms
            .transition(
                "map",
                vec![Arg::callback(|el| Ok(Arg::from(el.transition("concat", args!["!"])?)))],
            )
            .unwrap();
        assert_eq!(mapped.value_of(), Value::from(json!(["a!", "b!", "c!"])));
    }

    #[test]
    fn map_keeps_the_type_of_returned_microstates() {
        let ms = Engine::default()
            .create(TypeRef::array_of("Number"), json!([1, 2]))
            .unwrap();
        let mapped = ms
            .transition(
                "map",
                vec![Arg::callback(|el| {
                    let n = el.state()?.as_f64().unwrap_or_default();
                    Ok(Arg::from(el.create("String", format!("#{n}"))?))
                })],
            )
            .unwrap();

        let first = mapped.at(0).unwrap();
        assert_eq!(first.type_name(), "String");
        assert_eq!(mapped.value_of(), Value::from(json!(["#1", "#2"])));
        assert_eq!(
            first.transition("concat", args!["!"]).unwrap().value_of(),
            Value::from(json!(["#1!", "#2"]))
        );
    }

    #[test]
    fn rebuilt_lists_keep_element_types() {
        let ms = Engine::default()
            .create(TypeRef::array_of("Number"), json!([1, 2, 3]))
            .unwrap();
        let text = ms.create("String", "x").unwrap();
        let mixed = ms.transition("push", vec![Arg::from(&text)]).unwrap();
        assert_eq!(mixed.at(3).unwrap().type_name(), "String");

        let shifted = mixed.transition("shift", args![]).unwrap();
        let names: Vec<String> = shifted
            .children()
            .unwrap()
            .iter()
            .map(|el| el.type_name().to_string())
            .collect();
        assert_eq!(names, vec!["Number", "Number", "String"]);
        assert_eq!(shifted.value_of(), Value::from(json!([2, 3, "x"])));
    }

    #[test]
    fn filter_requires_a_callback() {
        assert!(matches!(
            letters().transition("filter", args![true]),
            Err(Error::TransitionFailed { .. })
        ));
    }

    #[test]
    fn clear_empties() {
        assert_eq!(
            letters().transition("clear", args![]).unwrap().value_of(),
            Value::from(json!([]))
        );
    }
}
