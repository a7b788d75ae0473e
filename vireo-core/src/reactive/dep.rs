//! Dependency Implementation
//!
//! A [`Dep`] is the publisher half of the reactive system. One exists per
//! reactive property and one per observed object or array (for changes that
//! cannot be intercepted per property: appends, new keys, deletions).
//!
//! Deps only hold weak references to their subscribers. The subscriber side
//! does the bookkeeping that keeps each subscriber listed at most once.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::context::ReactiveContext;
use super::subscriber::{Subscriber, SubscriberId};
use crate::config;

/// Unique identifier for a dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepId(u64);

impl DepId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct DepInner {
    id: DepId,
    subs: RefCell<Vec<Weak<dyn Subscriber>>>,
}

/// A publisher tracking which units care about one piece of state.
///
/// Cloning a `Dep` yields another handle to the same publisher.
#[derive(Clone)]
pub struct Dep {
    inner: Rc<DepInner>,
}

impl Dep {
    /// Create a dependency with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(DepInner {
                id: DepId::new(),
                subs: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Get the dependency's unique ID.
    pub fn id(&self) -> DepId {
        self.inner.id
    }

    /// Add a subscriber. Dead entries are pruned on the way.
    pub fn add_sub(&self, sub: Weak<dyn Subscriber>) {
        let mut subs = self.inner.subs.borrow_mut();
        subs.retain(|s| s.strong_count() > 0);
        subs.push(sub);
    }

    /// Remove a subscriber by ID.
    pub fn remove_sub(&self, id: SubscriberId) {
        let mut subs = self.inner.subs.borrow_mut();
        if let Some(pos) = subs
            .iter()
            .position(|s| s.upgrade().is_some_and(|s| s.id() == id))
        {
            subs.remove(pos);
        }
    }

    /// Register the currently evaluating unit, if any, as a dependent.
    pub fn depend(&self) {
        if let Some(target) = ReactiveContext::current() {
            target.add_dep(self);
        }
    }

    /// Notify every subscriber that the state changed.
    pub fn notify(&self) {
        // Snapshot first: subscribers may re-register while we iterate.
        let mut subs: Vec<Rc<dyn Subscriber>> = self
            .inner
            .subs
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        if !config::with(|c| c.async_mode) {
            // Without batching the scheduler never sorts, so keep creation
            // order here.
            subs.sort_by_key(|s| s.id());
        }

        for sub in subs {
            sub.update();
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subs
            .borrow()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    /// Whether `id` is currently subscribed.
    pub fn has_subscriber(&self, id: SubscriberId) -> bool {
        self.inner
            .subs
            .borrow()
            .iter()
            .any(|s| s.upgrade().is_some_and(|s| s.id() == id))
    }

    /// Whether both handles point at the same dependency.
    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.inner.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct MockSubscriber {
        id: SubscriberId,
        deps: RefCell<Vec<Dep>>,
        updates: Cell<usize>,
        log: Rc<RefCell<Vec<SubscriberId>>>,
    }

    impl MockSubscriber {
        fn new(log: Rc<RefCell<Vec<SubscriberId>>>) -> Rc<Self> {
            Rc::new(Self {
                id: SubscriberId::new(),
                deps: RefCell::new(Vec::new()),
                updates: Cell::new(0),
                log,
            })
        }
    }

    impl Subscriber for MockSubscriber {
        fn id(&self) -> SubscriberId {
            self.id
        }

        fn add_dep(&self, dep: &Dep) {
            self.deps.borrow_mut().push(dep.clone());
        }

        fn update(&self) {
            self.updates.set(self.updates.get() + 1);
            self.log.borrow_mut().push(self.id);
        }
    }

    fn weak(sub: &Rc<MockSubscriber>) -> Weak<dyn Subscriber> {
        let sub: Rc<dyn Subscriber> = sub.clone();
        Rc::downgrade(&sub)
    }

    #[test]
    fn dep_ids_are_unique() {
        assert_ne!(Dep::new().id(), Dep::new().id());
    }

    #[test]
    fn notify_reaches_every_subscriber() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dep = Dep::new();
        let a = MockSubscriber::new(log.clone());
        let b = MockSubscriber::new(log.clone());

        dep.add_sub(weak(&a));
        dep.add_sub(weak(&b));
        dep.notify();

        assert_eq!(a.updates.get(), 1);
        assert_eq!(b.updates.get(), 1);
        assert_eq!(dep.subscriber_count(), 2);
    }

    #[test]
    fn remove_sub_stops_notifications() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dep = Dep::new();
        let a = MockSubscriber::new(log);

        dep.add_sub(weak(&a));
        dep.remove_sub(a.id);
        dep.notify();

        assert_eq!(a.updates.get(), 0);
        assert!(!dep.has_subscriber(a.id));
    }

    #[test]
    fn depend_registers_current_target() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dep = Dep::new();
        let a = MockSubscriber::new(log);

        dep.depend();
        assert!(a.deps.borrow().is_empty());

        {
            let _ctx = ReactiveContext::enter(a.clone());
            dep.depend();
        }
        assert_eq!(a.deps.borrow().len(), 1);
        assert!(a.deps.borrow()[0].ptr_eq(&dep));
    }

    #[test]
    fn dropped_subscribers_are_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let dep = Dep::new();
        {
            let a = MockSubscriber::new(log.clone());
            dep.add_sub(weak(&a));
        }
        dep.notify();
        assert!(log.borrow().is_empty());
        assert_eq!(dep.subscriber_count(), 0);
    }

    #[test]
    fn sync_mode_notifies_in_creation_order() {
        config::update(|c| c.async_mode = false);
        let log = Rc::new(RefCell::new(Vec::new()));
        let dep = Dep::new();
        let first = MockSubscriber::new(log.clone());
        let second = MockSubscriber::new(log.clone());

        dep.add_sub(weak(&second));
        dep.add_sub(weak(&first));
        dep.notify();

        assert_eq!(*log.borrow(), vec![first.id, second.id]);
        config::set(config::Config::default());
    }
}
