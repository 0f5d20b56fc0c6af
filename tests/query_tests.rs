//! Computed fields, query results and how transitions on them find their
//! way back to the tree they came from.

use microstate::{
    args, from_fn, path, use_middleware, Arg, Engine, Error, Microstate, Outcome, TypeBuilder,
    TypeRef, Value,
};
use serde_json::json;
use std::sync::{Arc, Mutex};

type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, ms: &Microstate) -> Microstate {
    let calls = calls.clone();
    use_middleware(
        from_fn(move |ms, transition, args, next| {
            calls.lock().unwrap().push(transition.name().to_string());
            next.run(ms, transition, args)
        }),
        ms,
    )
}

fn completed(todo: &Microstate) -> Result<bool, Error> {
    Ok(todo
        .state()?
        .field("completed")?
        .as_bool()
        .unwrap_or_default())
}

fn todomvc() -> Engine {
    Engine::builder()
        .register(
            TypeBuilder::new("Todo")
                .field("title", "String")
                .field("completed", "Boolean")
                .build(),
        )
        .register(
            TypeBuilder::new("TodoMVC")
                .field("todos", TypeRef::array_of("Todo"))
                .field("filter", "String")
                .computed("active", |ms| {
                    let keep = Arg::callback(|todo| Ok(Arg::from(!completed(todo)?)));
                    Ok(ms
                        .field("todos")?
                        .transition("filter", vec![keep])?
                        .field("todos")?
                        .into())
                })
                .computed("completed", |ms| {
                    let keep = Arg::callback(|todo| Ok(Arg::from(completed(todo)?)));
                    Ok(ms
                        .field("todos")?
                        .transition("filter", vec![keep])?
                        .field("todos")?
                        .into())
                })
                .computed("filtered", |ms| {
                    let filter = ms.state()?.field("filter")?;
                    let picked = match filter.as_str() {
                        Some("show_completed") => ms.field("completed")?,
                        Some("show_active") => ms.field("active")?,
                        _ => ms.field("todos")?,
                    };
                    Ok(picked.into())
                })
                .build(),
        )
        .build()
        .unwrap()
}

fn todos() -> Microstate {
    todomvc()
        .create(
            "TodoMVC",
            json!({
                "todos": [
                    {"title": "Hello World", "completed": false},
                    {"title": "Greetings", "completed": true},
                    {"title": "Ola", "completed": false}
                ]
            }),
        )
        .unwrap()
}

fn titles(list: &Microstate) -> Vec<String> {
    list.children()
        .unwrap()
        .iter()
        .map(|todo| {
            todo.state()
                .unwrap()
                .field("title")
                .unwrap()
                .as_str()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[test]
fn unfiltered_query_is_the_todo_list_itself() {
    let app = todos();
    let filtered = app.field("filtered").unwrap();

    assert_eq!(filtered.children().unwrap().len(), 3);
    assert!(filtered.same_node(&app.field("todos").unwrap()));
    assert!(filtered.origin().is_none());
}

#[test]
fn filtered_queries_select_and_stay_stable() {
    let show_completed = todos().field("filter").unwrap().set("show_completed").unwrap();
    let first = show_completed.field("filtered").unwrap();
    let second = show_completed.field("filtered").unwrap();

    assert_eq!(titles(&first), vec!["Greetings"]);
    assert_eq!(first.state().unwrap(), second.state().unwrap());
}

#[test]
fn query_results_appear_in_state() {
    let show_active = todos().field("filter").unwrap().set("show_active").unwrap();
    let state = show_active.state().unwrap();
    let filtered = state.field("filtered").unwrap();
    let items = filtered.as_list().unwrap();

    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|todo| todo.is_instance_of("Todo")));
    assert_eq!(
        show_active.value_of(),
        Value::from(json!({
            "todos": [
                {"title": "Hello World", "completed": false},
                {"title": "Greetings", "completed": true},
                {"title": "Ola", "completed": false}
            ],
            "filter": "show_active"
        }))
    );
}

#[test]
fn toggling_through_a_query_updates_the_original_tree() {
    let show_active = todos().field("filter").unwrap().set("show_active").unwrap();
    let filtered = show_active.field("filtered").unwrap();
    assert_eq!(titles(&filtered), vec!["Hello World", "Ola"]);

    let one_completed = filtered
        .get(&path!(0, "completed"))
        .unwrap()
        .transition("toggle", args![])
        .unwrap();

    assert!(one_completed.is_root());
    let flags: Vec<bool> = one_completed
        .field("todos")
        .unwrap()
        .children()
        .unwrap()
        .iter()
        .map(|todo| completed(todo).unwrap())
        .collect();
    assert_eq!(flags, vec![true, true, false]);
    assert_eq!(titles(&one_completed.field("filtered").unwrap()), vec!["Ola"]);
}

fn flags(app: &Microstate) -> Vec<bool> {
    app.field("todos")
        .unwrap()
        .children()
        .unwrap()
        .iter()
        .map(|todo| completed(todo).unwrap())
        .collect()
}

#[test]
fn filtered_elements_map_back_to_their_own_records() {
    let app = todos();
    let ola = app.field("active").unwrap().at(1).unwrap();
    assert_eq!(ola.state().unwrap().field("title").unwrap().as_str(), Some("Ola"));

    let toggled = ola.field("completed").unwrap().transition("toggle", args![]).unwrap();

    assert_eq!(flags(&toggled), vec![false, true, true]);
    assert_eq!(titles(&toggled.field("active").unwrap()), vec!["Hello World"]);
}

#[test]
fn nested_queries_trace_elements_through_every_filter() {
    let show_active = todos().field("filter").unwrap().set("show_active").unwrap();
    let toggled = show_active
        .field("filtered")
        .unwrap()
        .get(&path!(1, "completed"))
        .unwrap()
        .transition("toggle", args![])
        .unwrap();

    assert_eq!(flags(&toggled), vec![false, true, true]);
    assert_eq!(titles(&toggled.field("filtered").unwrap()), vec!["Hello World"]);
}

#[test]
fn middleware_fires_once_through_a_query() {
    let calls = Calls::default();
    let show_active = todos().field("filter").unwrap().set("show_active").unwrap();
    let watched = record(&calls, &show_active);

    let one_completed = watched
        .field("filtered")
        .unwrap()
        .at(0)
        .unwrap()
        .field("completed")
        .unwrap()
        .transition("toggle", args![])
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec!["toggle".to_string()]);
    assert_eq!(
        one_completed
            .get(&path!("todos", 0, "completed"))
            .unwrap()
            .state()
            .unwrap()
            .as_bool(),
        Some(true)
    );
    // The chain carries over to the new root.
    assert_eq!(one_completed.middleware().len(), 1);
}

fn collections() -> Engine {
    Engine::builder()
        .register(
            TypeBuilder::new("CollectionOfNumbers")
                .field("numbers", TypeRef::array_of("Number"))
                .computed("timesThree", |ms| {
                    let triple = Arg::callback(|n| {
                        let value = n.state()?.as_f64().unwrap_or_default();
                        Ok(Arg::from(n.set(value * 3.0)?))
                    });
                    Ok(ms
                        .field("numbers")?
                        .transition("map", vec![triple])?
                        .field("numbers")?
                        .into())
                })
                .transition("removeOdd", |ms, _| {
                    let even = Arg::callback(|n| {
                        Ok(Arg::from(n.state()?.as_f64().unwrap_or_default() % 2.0 == 0.0))
                    });
                    Ok(Outcome::Microstate(
                        ms.field("timesThree")?.transition("filter", vec![even])?,
                    ))
                })
                .computed("moreNumbers", |ms| {
                    Ok(ms
                        .field("numbers")?
                        .transition("push", args![5])?
                        .field("numbers")?
                        .into())
                })
                .build(),
        )
        .build()
        .unwrap()
}

fn numbers(ms: &Microstate) -> Value {
    ms.field("numbers").unwrap().value_of()
}

#[test]
fn queries_compute_from_derived_trees() {
    let collection = collections()
        .create("CollectionOfNumbers", json!({"numbers": [1, 2, 3, 4]}))
        .unwrap();
    let tripled = collection.field("timesThree").unwrap();

    assert_eq!(tripled.value_of(), Value::from(json!([3, 6, 9, 12])));
    assert!(tripled.origin().is_some());
    assert_eq!(numbers(&collection), Value::from(json!([1, 2, 3, 4])));
}

#[test]
fn transitions_inside_transitions_reanchor_to_the_origin() {
    let calls = Calls::default();
    let collection = collections()
        .create("CollectionOfNumbers", json!({"numbers": [1, 2, 3, 4]}))
        .unwrap();
    let watched = record(&calls, &collection);

    let without_odd = watched.transition("removeOdd", args![]).unwrap();

    assert_eq!(numbers(&without_odd), Value::from(json!([2, 4])));
    assert_eq!(*calls.lock().unwrap(), vec!["removeOdd".to_string()]);
}

#[test]
fn elements_missing_from_the_origin_are_detached() {
    let collection = collections()
        .create("CollectionOfNumbers", json!({"numbers": [1, 2, 3, 4]}))
        .unwrap();
    let more = collection.field("moreNumbers").unwrap();
    assert_eq!(more.children().unwrap().len(), 5);

    let err = more
        .at(4)
        .unwrap()
        .transition("increment", args![])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Could not find a microstate at [numbers.4]. You might have tried to modify a microstate that does not exist in original microstate."
    );
    // Elements the origin does have can still be changed.
    let changed = more.at(0).unwrap().transition("increment", args![]).unwrap();
    assert_eq!(numbers(&changed), Value::from(json!([2, 2, 3, 4])));
}

#[test]
fn shifted_and_unshifted_elements_map_back_by_origin() {
    let engine = Engine::builder()
        .register(
            TypeBuilder::new("Queue")
                .field("numbers", TypeRef::array_of("Number"))
                .computed("rest", |ms| {
                    Ok(ms
                        .field("numbers")?
                        .transition("shift", args![])?
                        .field("numbers")?
                        .into())
                })
                .computed("padded", |ms| {
                    Ok(ms
                        .field("numbers")?
                        .transition("unshift", args![0])?
                        .field("numbers")?
                        .into())
                })
                .build(),
        )
        .build()
        .unwrap();
    let queue = engine.create("Queue", json!({"numbers": [1, 2, 3]})).unwrap();

    let rest = queue.field("rest").unwrap();
    assert_eq!(rest.value_of(), Value::from(json!([2, 3])));
    let bumped = rest.at(0).unwrap().transition("increment", args![]).unwrap();
    assert_eq!(numbers(&bumped), Value::from(json!([1, 3, 3])));

    let padded = queue.field("padded").unwrap();
    let bumped = padded.at(3).unwrap().transition("increment", args![]).unwrap();
    assert_eq!(numbers(&bumped), Value::from(json!([1, 2, 4])));
    assert!(matches!(
        padded.at(0).unwrap().transition("increment", args![]),
        Err(Error::DetachedQuery { .. })
    ));
}

fn birthdays() -> Engine {
    Engine::builder()
        .register(
            TypeBuilder::new("Person")
                .field("age", "Number")
                .computed("currentAge", |ms| Ok(ms.field("age")?.into()))
                .computed("older", |ms| {
                    Ok(ms
                        .field("age")?
                        .transition("increment", args![])?
                        .field("age")?
                        .into())
                })
                .build(),
        )
        .register(TypeBuilder::new("Group").field("birthdayGirl", "Person").build())
        .build()
        .unwrap()
}

#[test]
fn queries_on_nested_nodes_reanchor_below_the_owner() {
    let group = birthdays()
        .create("Group", json!({"birthdayGirl": {"age": 15}}))
        .unwrap();
    let older = group.get(&path!("birthdayGirl", "older")).unwrap();
    assert_eq!(older.state().unwrap().as_f64(), Some(16.0));

    let result = older.transition("increment", args![]).unwrap();
    assert_eq!(result.value_of(), Value::from(json!({"birthdayGirl": {"age": 16}})));
    assert_eq!(
        result
            .get(&path!("birthdayGirl", "older"))
            .unwrap()
            .state()
            .unwrap()
            .as_f64(),
        Some(17.0)
    );
}

#[test]
fn origin_round_trip_matches_a_direct_transition() {
    let calls = Calls::default();
    let homer = birthdays().create("Person", json!({"age": 42})).unwrap();
    let watched = record(&calls, &homer);

    let through_query = watched
        .field("currentAge")
        .unwrap()
        .transition("increment", args![])
        .unwrap();
    let direct = watched
        .field("age")
        .unwrap()
        .transition("increment", args![])
        .unwrap();

    assert_eq!(through_query.value_of(), Value::from(json!({"age": 43})));
    assert_eq!(through_query.value_of(), direct.value_of());
    assert_eq!(calls.lock().unwrap().len(), 2);
}

#[test]
fn plain_computed_values_are_readable_but_detached() {
    let engine = Engine::builder()
        .register(
            TypeBuilder::new("Calculation")
                .field("numbers", "Array")
                .computed("sum", |ms| {
                    let total: f64 = ms
                        .field("numbers")?
                        .children()?
                        .iter()
                        .map(|n| n.state().map(|s| s.as_f64().unwrap_or_default()))
                        .sum::<Result<f64, _>>()?;
                    Ok(total.into())
                })
                .computed("summary", |ms| {
                    let sum = ms.field("sum")?.state()?.as_f64().unwrap_or_default();
                    Ok(format!("Sum of numbers is {sum}.").into())
                })
                .build(),
        )
        .build()
        .unwrap();
    let calculation = engine
        .create("Calculation", json!({"numbers": [1, 2, 3, 4]}))
        .unwrap();

    assert_eq!(calculation.field("sum").unwrap().state().unwrap().as_f64(), Some(10.0));
    assert_eq!(
        calculation.field("summary").unwrap().state().unwrap().as_str(),
        Some("Sum of numbers is 10.")
    );
    assert!(calculation.field("sum").unwrap().is_detached());
    assert!(matches!(
        calculation.field("sum").unwrap().transition("increment", args![]),
        Err(Error::DetachedQuery { .. })
    ));
}
