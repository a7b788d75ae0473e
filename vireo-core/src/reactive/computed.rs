//! Computed Values
//!
//! A [`Computed`] is a lazy unit: it caches its result, becomes dirty when a
//! dependency changes, and recomputes on the next read. Reading it from
//! inside another evaluation forwards the computed's dependencies to the
//! reader, so a render unit that reads a computed re-renders when anything
//! the computed read changes.

use super::context::ReactiveContext;
use super::value::Value;
use super::watcher::Watcher;
use crate::component::Component;
use crate::error::Result;

/// A memoized derived value.
#[derive(Clone, Debug)]
pub struct Computed {
    watcher: Watcher,
}

impl Computed {
    /// Create a free-standing computed value.
    pub fn new(getter: impl Fn() -> Result<Value> + 'static) -> Self {
        Self {
            watcher: Watcher::builder(getter)
                .lazy(true)
                .expression("computed")
                .build(),
        }
    }

    /// Create a computed value owned by `vm`.
    pub(crate) fn owned(
        vm: &Component,
        name: &str,
        getter: impl Fn() -> Result<Value> + 'static,
    ) -> Self {
        Self {
            watcher: Watcher::builder(getter)
                .lazy(true)
                .owner(vm)
                .expression(name)
                .build(),
        }
    }

    /// Current value, recomputing if dirty.
    pub fn get(&self) -> Value {
        if self.watcher.is_dirty() {
            self.watcher.evaluate();
        }
        if ReactiveContext::is_active() {
            self.watcher.depend();
        }
        self.watcher.value()
    }

    pub fn is_dirty(&self) -> bool {
        self.watcher.is_dirty()
    }

    /// The underlying lazy unit.
    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{observe, Object};
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn computed_caches_until_a_dependency_changes() {
        let object: Object = [("n", Value::from(2))].into_iter().collect();
        observe(&Value::Object(object.clone()));
        let runs = Rc::new(Cell::new(0));
        let (reader, counter) = (object.clone(), runs.clone());

        let doubled = Computed::new(move || {
            counter.set(counter.get() + 1);
            let n = reader.get("n").as_number().unwrap_or_default();
            Ok(Value::from(n * 2.0))
        });

        assert_eq!(doubled.get(), Value::from(4));
        assert_eq!(doubled.get(), Value::from(4));
        assert_eq!(runs.get(), 1);

        object.set("n", 5);
        assert!(doubled.is_dirty());
        assert_eq!(doubled.get(), Value::from(10));
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn readers_inherit_computed_dependencies() {
        let object: Object = [("n", Value::from(1))].into_iter().collect();
        observe(&Value::Object(object.clone()));
        let reader = object.clone();
        let computed = Computed::new(move || Ok(reader.get("n")));
        let inner = computed.clone();

        let outer = Watcher::builder(move || Ok(inner.get())).build();
        assert!(outer.depends_on(&object.dep_of("n").unwrap()));
    }
}
