//! Deep Observation
//!
//! [`observe`] walks an object/array graph and makes it reactive: every
//! enumerable property of every reachable object gets a dependency, and every
//! reachable container gets an [`Observer`] carrying the container-level
//! dependency. Container dependencies are what appends, new keys and
//! deletions notify, since no per-property interception exists for them.
//!
//! Observation is idempotent: the observer is stored on the container itself
//! and returned on subsequent calls, which is also what stops the walk on
//! cyclic graphs.
//!
//! # Late additions
//!
//! Keys added after observation are only reactive when introduced through
//! [`set`]; removals are only observable through [`del`].

use std::cell::Cell;
use std::rc::Rc;

use super::dep::Dep;
use super::value::{Array, CustomSetter, Object, PropKey, Value};
use crate::debug::warn;

thread_local! {
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Enable or disable observation of new values globally.
///
/// Used while passing props down so that values owned by a parent are not
/// deep-observed a second time by the child.
pub fn toggle_observing(value: bool) {
    SHOULD_OBSERVE.with(|flag| flag.set(value));
}

/// Whether new values are currently being observed.
pub fn is_observing() -> bool {
    SHOULD_OBSERVE.with(Cell::get)
}

/// Per-container observation state.
#[derive(Debug)]
pub struct Observer {
    dep: Dep,
    vm_count: Cell<usize>,
}

impl Observer {
    fn new() -> Self {
        Self {
            dep: Dep::new(),
            vm_count: Cell::new(0),
        }
    }

    /// The container-level dependency.
    pub fn dep(&self) -> &Dep {
        &self.dep
    }

    /// Number of component instances using this container as root data.
    pub fn vm_count(&self) -> usize {
        self.vm_count.get()
    }

    /// An instance using this container as root data was destroyed.
    pub(crate) fn release_root(&self) {
        self.vm_count.set(self.vm_count.get().saturating_sub(1));
    }
}

/// Options for [`define_reactive`].
#[derive(Clone, Default)]
pub struct ReactiveOptions {
    /// Do not observe the property's value.
    pub shallow: bool,
    /// Called with the incoming value before every effective write.
    pub custom_setter: Option<CustomSetter>,
}

/// Attach an observer to `value` if it is an observable container, walking
/// its contents. Returns the container's observer, or `None` for primitives,
/// frozen or raw containers, and while observation is toggled off.
pub fn observe(value: &Value) -> Option<Rc<Observer>> {
    observe_with(value, false)
}

/// Like [`observe`], additionally counting `value` as an instance's root
/// data.
pub(crate) fn observe_root(value: &Value) -> Option<Rc<Observer>> {
    observe_with(value, true)
}

fn observe_with(value: &Value, as_root: bool) -> Option<Rc<Observer>> {
    let ob = match value {
        Value::Object(object) => match object.observer() {
            Some(ob) => Some(ob),
            None if is_observing() && object.is_extensible() && !object.is_raw() => {
                let ob = Rc::new(Observer::new());
                object.attach_observer(ob.clone());
                walk(object);
                Some(ob)
            }
            None => None,
        },
        Value::Array(array) => match array.observer() {
            Some(ob) => Some(ob),
            None if is_observing() && array.is_extensible() && !array.is_raw() => {
                let ob = Rc::new(Observer::new());
                array.attach_observer(ob.clone());
                observe_array(array);
                Some(ob)
            }
            None => None,
        },
        _ => None,
    };

    if as_root {
        if let Some(ob) = &ob {
            ob.vm_count.set(ob.vm_count.get() + 1);
        }
    }
    ob
}

/// Make every enumerable property of `object` reactive.
pub fn walk(object: &Object) {
    for key in object.keys() {
        define_reactive(object, &key, None, ReactiveOptions::default());
    }
}

/// Observe every element of `array`.
pub fn observe_array(array: &Array) {
    for item in array.to_vec() {
        observe(&item);
    }
}

/// Install reactive interception for `key` on `object`, optionally setting
/// its initial value. Non-configurable properties are left untouched. Returns
/// whether the key is now reactive.
pub fn define_reactive(
    object: &Object,
    key: &str,
    value: Option<Value>,
    options: ReactiveOptions,
) -> bool {
    let Some(child) = object.make_reactive(key, value, options.shallow, options.custom_setter)
    else {
        return false;
    };
    if !options.shallow {
        observe(&child);
    }
    true
}

/// Set a property on an object, or an element on an array, adding a new
/// reactive key and notifying the container if the key did not exist yet.
///
/// Returns the value that was set.
pub fn set(target: &Value, key: impl Into<PropKey>, value: impl Into<Value>) -> Value {
    let key = key.into();
    let value = value.into();

    match (target, &key) {
        (Value::Array(array), PropKey::Index(index)) => {
            array.grow_to(*index);
            array.splice(*index, 1, [value.clone()]);
            value
        }
        (Value::Array(_), PropKey::Name(name)) => {
            warn(format!("Cannot set non-index key \"{name}\" on an array"), None);
            value
        }
        (Value::Object(object), key) => {
            let key = key.to_name();
            if object.has(&key) {
                object.set(&key, value.clone());
                return value;
            }
            let ob = object.observer();
            match ob {
                Some(ob) if ob.vm_count() > 0 => {
                    warn(
                        "Avoid adding reactive properties to a component instance or its root \
                         data at runtime; declare them upfront in the data option.",
                        None,
                    );
                }
                Some(ob) => {
                    if define_reactive(object, &key, Some(value.clone()), ReactiveOptions::default()) {
                        ob.dep().notify();
                    }
                }
                None => object.set(&key, value.clone()),
            }
            value
        }
        (other, key) => {
            warn(
                format!(
                    "Cannot set reactive property on undefined, null, or primitive value: {other} (key \"{key}\")"
                ),
                None,
            );
            value
        }
    }
}

/// Delete a property (or array element) and notify the container.
pub fn del(target: &Value, key: impl Into<PropKey>) {
    let key = key.into();
    match (target, &key) {
        (Value::Array(array), PropKey::Index(index)) => {
            if *index < array.len() {
                array.splice(*index, 1, []);
            }
        }
        (Value::Array(_), PropKey::Name(_)) => {}
        (Value::Object(object), key) => {
            let key = key.to_name();
            let ob = object.observer();
            if ob.as_ref().is_some_and(|ob| ob.vm_count() > 0) {
                warn(
                    "Avoid deleting properties on a component instance or its root data; \
                     just set it to null.",
                    None,
                );
                return;
            }
            if object.remove(&key).is_none() {
                return;
            }
            if let Some(ob) = ob {
                ob.dep().notify();
            }
        }
        (other, key) => warn(
            format!(
                "Cannot delete reactive property on undefined, null, or primitive value: {other} (key \"{key}\")"
            ),
            None,
        ),
    }
}

/// Register the active unit on the container dependency of every observed
/// element, recursing into nested arrays. Element reads cannot be
/// intercepted, so this stands in for them.
pub(crate) fn depend_array(array: &Array) {
    for item in array.to_vec() {
        if let Some(ob) = item.observer() {
            ob.dep().depend();
        }
        if let Value::Array(inner) = &item {
            depend_array(inner);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn observe_is_idempotent() {
        let value = Value::from(json!({ "a": { "b": 1 } }));
        let first = observe(&value).unwrap();
        let second = observe(&value).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn observe_walks_nested_containers() {
        let value = Value::from(json!({ "a": { "b": [ { "c": 1 } ] } }));
        observe(&value);

        let root = value.as_object().unwrap();
        assert!(root.is_reactive("a"));
        let a = root.get("a");
        assert!(a.observer().is_some());
        assert!(a.as_object().unwrap().is_reactive("b"));
        let element = a.get("b").get("0");
        assert!(element.as_object().unwrap().is_reactive("c"));
    }

    #[test]
    fn primitives_frozen_and_raw_values_are_skipped() {
        assert!(observe(&Value::from(1)).is_none());

        let frozen = Object::new();
        frozen.freeze();
        assert!(observe(&Value::Object(frozen)).is_none());

        let raw = Object::new();
        raw.mark_raw();
        assert!(observe(&Value::Object(raw)).is_none());
    }

    #[test]
    fn toggled_off_observation_skips_new_values() {
        toggle_observing(false);
        let skipped = observe(&Value::object());
        toggle_observing(true);
        assert!(skipped.is_none());
        assert!(is_observing());
    }

    #[test]
    fn cyclic_graphs_terminate() {
        let object = Object::new();
        object.set("me", Value::Object(object.clone()));
        let ob = observe(&Value::Object(object.clone()));
        assert!(ob.is_some());
        assert!(object.is_reactive("me"));
    }

    #[test]
    fn set_on_absent_key_defines_reactive_property() {
        let value = Value::from(json!({}));
        observe(&value);
        set(&value, "fresh", 1);
        assert!(value.as_object().unwrap().is_reactive("fresh"));
    }

    #[test]
    fn set_on_unobserved_object_is_plain() {
        let value = Value::object();
        set(&value, "x", 2);
        let object = value.as_object().unwrap();
        assert_eq!(object.get("x"), Value::from(2));
        assert!(!object.is_reactive("x"));
    }

    #[test]
    fn set_grows_arrays() {
        let value = Value::from(vec![Value::from(1)]);
        set(&value, 3usize, "x");
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 4);
        assert!(array.get(1).unwrap().is_undefined());
        assert_eq!(array.get(3), Some(Value::from("x")));
    }

    #[test]
    fn set_on_primitive_warns() {
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::<String>::new()));
        let sink = seen.clone();
        crate::config::update(|c| {
            c.warn_handler = Some(Rc::new(move |msg: &str, _vm: Option<&crate::component::Component>, _trace: &str| {
                sink.borrow_mut().push(msg.to_string());
            }));
        });

        set(&Value::Undefined, "a", 1);
        del(&Value::from(3), "a");

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].starts_with("Cannot set reactive property"));
        assert!(seen[1].starts_with("Cannot delete reactive property"));
    }

    #[test]
    fn set_notifies_only_when_the_key_is_added() {
        use crate::reactive::Watcher;
        use crate::scheduler::{flush_ticks, pending_count};

        let value = Value::from(json!({ "inner": {} }));
        observe(&value);
        let reader = value.clone();
        let _watcher = Watcher::builder(move || Ok(reader.get("inner"))).build();

        let inner = value.get("inner");
        inner.as_object().unwrap().prevent_extensions();
        set(&inner, "b", 1);
        assert!(!inner.as_object().unwrap().has("b"));
        assert_eq!(pending_count(), 0);

        let open = Value::from(json!({ "inner": {} }));
        observe(&open);
        let reader = open.clone();
        let _watcher = Watcher::builder(move || Ok(reader.get("inner"))).build();
        set(&open.get("inner"), "b", 1);
        assert_eq!(pending_count(), 1);
        flush_ticks();
    }

    #[test]
    fn root_data_refuses_new_keys() {
        let value = Value::from(json!({ "a": 1 }));
        let ob = observe_root(&value).unwrap();
        assert_eq!(ob.vm_count(), 1);

        crate::config::update(|c| c.silent = true);
        set(&value, "b", 2);
        assert!(!value.as_object().unwrap().has("b"));
    }
}
