//! Integration Tests for the Reactive System
//!
//! These tests verify that observed state, watchers and the scheduler work
//! together correctly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use vireo_core::component::Component;
use vireo_core::config;
use vireo_core::reactive::{
    del, observe, set, watch, Object, Value, WatchOptions, WatchSource, Watcher,
};
use vireo_core::scheduler::{flush_ticks, is_flushing, pending_count, queue_watcher};

fn observed(json: serde_json::Value) -> Value {
    let value = Value::from(json);
    observe(&value);
    value
}

fn object(value: &Value) -> Object {
    value.as_object().cloned().expect("object value")
}

fn counting_watcher(runs: &Rc<Cell<usize>>, read: impl Fn() -> Value + 'static) -> Watcher {
    let runs = runs.clone();
    Watcher::builder(move || {
        runs.set(runs.get() + 1);
        Ok(read())
    })
    .build()
}

fn capture_warnings() -> Rc<RefCell<Vec<String>>> {
    let warnings = Rc::new(RefCell::new(Vec::new()));
    let sink = warnings.clone();
    config::update(|c| {
        c.warn_handler = Some(Rc::new(move |msg: &str, _: Option<&Component>, _: &str| {
            sink.borrow_mut().push(msg.to_string());
        }));
    });
    warnings
}

/// Test that several writes in one burst schedule a dependent once.
#[test]
fn writes_schedule_a_reader_once_per_batch() {
    let state = observed(json!({ "a": 1 }));
    let obj = object(&state);
    let runs = Rc::new(Cell::new(0));

    let reader = obj.clone();
    let watcher = counting_watcher(&runs, move || reader.get("a"));
    assert_eq!(runs.get(), 1);

    obj.set("a", 2);
    obj.set("a", 3);
    obj.set("a", 4);
    assert_eq!(pending_count(), 1);
    assert_eq!(runs.get(), 1);

    flush_ticks();
    assert_eq!(runs.get(), 2);
    assert_eq!(watcher.value(), Value::from(4));
}

/// Test that writing an identical value does not notify.
#[test]
fn same_value_writes_do_not_notify() {
    let state = observed(json!({ "n": 1, "nested": { "x": 1 } }));
    set(&state, "nan", f64::NAN);
    let obj = object(&state);
    let runs = Rc::new(Cell::new(0));

    let reader = obj.clone();
    let _watcher = counting_watcher(&runs, move || {
        reader.get("n");
        reader.get("nested");
        reader.get("nan")
    });

    obj.set("n", 1);
    obj.set("nan", f64::NAN);
    obj.set("nested", obj.get_untracked("nested"));
    assert_eq!(pending_count(), 0);

    flush_ticks();
    assert_eq!(runs.get(), 1);
}

/// Test that dependencies not read by the latest evaluation are dropped.
#[test]
fn stale_dependencies_are_pruned() {
    let state = observed(json!({ "flag": true, "a": 1, "b": 2 }));
    let obj = object(&state);
    let runs = Rc::new(Cell::new(0));

    let reader = obj.clone();
    let _watcher = counting_watcher(&runs, move || {
        if reader.get("flag").is_truthy() {
            reader.get("a")
        } else {
            reader.get("b")
        }
    });

    obj.set("flag", false);
    flush_ticks();
    assert_eq!(runs.get(), 2);

    obj.set("a", 10);
    assert_eq!(pending_count(), 0);
    flush_ticks();
    assert_eq!(runs.get(), 2);

    obj.set("b", 20);
    flush_ticks();
    assert_eq!(runs.get(), 3);
}

/// Test that deep watchers see nested writes and shallow ones do not.
#[test]
fn deep_watch_sees_nested_leaf_writes() {
    let state = observed(json!({ "root": { "x": { "y": 1 } } }));
    let deep_hits = Rc::new(Cell::new(0));
    let shallow_hits = Rc::new(Cell::new(0));

    let hits = deep_hits.clone();
    let _deep = watch(
        WatchSource::path(state.clone(), "root"),
        move |_, _| {
            hits.set(hits.get() + 1);
            Ok(())
        },
        WatchOptions {
            deep: true,
            ..WatchOptions::default()
        },
    );
    let hits = shallow_hits.clone();
    let _shallow = watch(
        WatchSource::path(state.clone(), "root"),
        move |_, _| {
            hits.set(hits.get() + 1);
            Ok(())
        },
        WatchOptions::default(),
    );

    let leaf = object(&state.get("root").get("x"));
    leaf.set("y", 2);
    flush_ticks();

    assert_eq!(deep_hits.get(), 1);
    assert_eq!(shallow_hits.get(), 0);
}

/// Test that each intercepted array method notifies and that inserted
/// elements become reactive.
#[test]
fn array_mutators_notify_readers() {
    let state = observed(json!({ "list": [3, 1, 2] }));
    let list = state.get("list").as_array().cloned().expect("array");
    let runs = Rc::new(Cell::new(0));

    let reader = state.clone();
    let _watcher = counting_watcher(&runs, move || reader.get("list"));

    let mutations: Vec<Box<dyn Fn()>> = vec![
        Box::new({
            let list = list.clone();
            move || {
                list.push(json!({ "v": 1 }));
            }
        }),
        Box::new({
            let list = list.clone();
            move || {
                list.pop();
            }
        }),
        Box::new({
            let list = list.clone();
            move || {
                list.shift();
            }
        }),
        Box::new({
            let list = list.clone();
            move || {
                list.unshift([Value::from(9)]);
            }
        }),
        Box::new({
            let list = list.clone();
            move || {
                list.splice(1, 1, [Value::from(7)]);
            }
        }),
        Box::new({
            let list = list.clone();
            move || list.sort()
        }),
        Box::new({
            let list = list.clone();
            move || list.reverse()
        }),
    ];

    for (i, mutate) in mutations.iter().enumerate() {
        mutate();
        flush_ticks();
        assert_eq!(runs.get(), i + 2, "mutation {i} did not notify");
    }

    list.push(json!({ "v": 1 }));
    flush_ticks();
    let inserted = list.get(list.len() - 1).expect("pushed");
    assert!(inserted.observer().is_some());
}

/// Test that `set` on an absent key makes it reactive and notifies.
#[test]
fn set_adds_reactive_keys() {
    let state = observed(json!({ "user": {} }));
    let runs = Rc::new(Cell::new(0));
    let reader = state.clone();
    let _watcher = counting_watcher(&runs, move || reader.get("user").get("name"));

    let user = state.get("user");
    set(&user, "name", "ann");
    flush_ticks();
    assert_eq!(runs.get(), 2);

    object(&user).set("name", "bob");
    flush_ticks();
    assert_eq!(runs.get(), 3);

    object(&user).set("name", "bob");
    flush_ticks();
    assert_eq!(runs.get(), 3);

    del(&user, "name");
    flush_ticks();
    assert_eq!(runs.get(), 4);
    assert_eq!(state.get("user").get("name"), Value::Undefined);
}

/// Test that `set` on a primitive warns instead of failing.
#[test]
fn set_on_primitive_warns() {
    let warnings = capture_warnings();
    set(&Value::from(1), "a", 2);
    assert!(warnings.borrow()[0].starts_with("Cannot set reactive property"));
}

/// Test that flushing runs units in creation order regardless of queue
/// order.
#[test]
fn flush_runs_parents_before_children() {
    let order = Rc::new(RefCell::new(Vec::new()));
    let make = |name: &'static str| {
        let order = order.clone();
        let primed = Rc::new(Cell::new(false));
        Watcher::builder(move || {
            if primed.replace(true) {
                order.borrow_mut().push(name);
            }
            Ok(Value::Undefined)
        })
        .build()
    };
    let parent = make("parent");
    let child = make("child");
    assert!(parent.id() < child.id());

    queue_watcher(child.clone());
    queue_watcher(parent.clone());
    flush_ticks();

    assert_eq!(*order.borrow(), vec!["parent", "child"]);
    assert!(!is_flushing());
}

/// Test that a self-retriggering watcher is stopped by the cycle guard.
#[test]
fn runaway_watcher_is_aborted() {
    let warnings = capture_warnings();
    config::update(|c| c.max_update_count = 10);

    let state = observed(json!({ "n": 0, "other": 0 }));
    let obj = object(&state);
    let calls = Rc::new(Cell::new(0));

    let (writer, counter) = (obj.clone(), calls.clone());
    let _runaway = watch(
        WatchSource::path(state.clone(), "n"),
        move |new, _| {
            counter.set(counter.get() + 1);
            writer.set("n", new.as_number().unwrap_or_default() + 1.0);
            Ok(())
        },
        WatchOptions::default(),
    );
    let other_calls = Rc::new(Cell::new(0));
    let counter = other_calls.clone();
    let _other = watch(
        WatchSource::path(state.clone(), "other"),
        move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        },
        WatchOptions::default(),
    );

    obj.set("n", 1);
    obj.set("other", 1);
    flush_ticks();

    assert_eq!(calls.get(), 11);
    assert_eq!(other_calls.get(), 1);
    assert!(warnings
        .borrow()
        .iter()
        .any(|w| w == "You may have an infinite update loop in watcher with expression \"n\""));
    assert!(!is_flushing());
}

/// Test that units enqueued while flushing run in the same flush.
#[test]
fn units_queued_mid_flush_run_in_the_same_flush() {
    let state = observed(json!({ "a": 0, "b": 0 }));
    let obj = object(&state);

    let writer = obj.clone();
    let _first = watch(
        WatchSource::path(state.clone(), "a"),
        move |new, _| {
            writer.set("b", new.clone());
            Ok(())
        },
        WatchOptions::default(),
    );
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let _second = watch(
        WatchSource::path(state.clone(), "b"),
        move |new, _| {
            sink.borrow_mut().push(new.clone());
            Ok(())
        },
        WatchOptions::default(),
    );

    obj.set("a", 5);
    flush_ticks();
    assert_eq!(*seen.borrow(), vec![Value::from(5)]);
    assert!(!vireo_core::scheduler::has_pending_ticks());
}

/// Test that synchronous mode runs dependents on the writing stack.
#[test]
fn sync_mode_skips_batching() {
    config::update(|c| c.async_mode = false);
    let state = observed(json!({ "n": 0 }));
    let obj = object(&state);
    let runs = Rc::new(Cell::new(0));
    let reader = obj.clone();
    let _watcher = counting_watcher(&runs, move || reader.get("n"));

    obj.set("n", 1);
    obj.set("n", 2);
    assert_eq!(runs.get(), 3);
}

/// Test that an unwatched handle stops receiving updates.
#[test]
fn unwatch_stops_callbacks() {
    let state = observed(json!({ "n": 0 }));
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let handle = watch(
        WatchSource::path(state.clone(), "n"),
        move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        },
        WatchOptions::default(),
    );

    object(&state).set("n", 1);
    flush_ticks();
    handle.unwatch();
    object(&state).set("n", 2);
    flush_ticks();

    assert_eq!(calls.get(), 1);
}
