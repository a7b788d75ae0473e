//! Reactive Context
//!
//! The reactive context tracks which unit is currently evaluating. When a
//! reactive property is read, its [`Dep`](super::Dep) asks the context for the
//! active subscriber and registers it.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering a context pushes an entry and
//! returns a guard; dropping the guard pops it, so the stack stays balanced
//! even when the evaluation returns early or panics.
//!
//! Entries may be empty: [`ReactiveContext::untracked`] pushes a "no target"
//! entry so that lifecycle hooks and data factories can read state without
//! subscribing whatever unit happens to be running further down the stack.
//!
//! Nesting is the normal case: a computed unit evaluated from inside a render
//! unit sits on top of it until it finishes.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<Rc<dyn Subscriber>>>> = RefCell::new(Vec::new());
}

/// Guard that pops the context when dropped.
pub struct ReactiveContext {
    depth: usize,
    // Tied to the thread-local stack it was pushed onto.
    _not_send: PhantomData<Rc<()>>,
}

impl ReactiveContext {
    /// Enter a tracking context for `subscriber`.
    ///
    /// While the guard is alive, reactive reads register `subscriber` as a
    /// dependent.
    pub fn enter(subscriber: Rc<dyn Subscriber>) -> Self {
        Self::push(Some(subscriber))
    }

    /// Enter a context in which reads are not tracked at all.
    pub fn untracked() -> Self {
        Self::push(None)
    }

    fn push(entry: Option<Rc<dyn Subscriber>>) -> Self {
        let depth = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(entry);
            stack.len()
        });
        Self {
            depth,
            _not_send: PhantomData,
        }
    }

    /// The subscriber that reads should currently register, if any.
    pub fn current() -> Option<Rc<dyn Subscriber>> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// Check if reads are currently being tracked.
    pub fn is_active() -> bool {
        CONTEXT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// Get the current subscriber ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        Self::current().map(|subscriber| subscriber.id())
    }

    /// Current nesting depth of evaluations.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "ReactiveContext dropped out of order"
            );
            stack.pop();
        });
    }
}

/// Run `f` with dependency tracking suspended.
pub fn untracked<T>(f: impl FnOnce() -> T) -> T {
    let _ctx = ReactiveContext::untracked();
    f()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Dep;

    struct Probe(SubscriberId);

    impl Subscriber for Probe {
        fn id(&self) -> SubscriberId {
            self.0
        }
        fn add_dep(&self, _dep: &Dep) {}
        fn update(&self) {}
    }

    fn test_subscriber() -> Rc<dyn Subscriber> {
        Rc::new(Probe(SubscriberId::new()))
    }

    #[test]
    fn context_tracks_subscriber() {
        let sub = test_subscriber();
        let id = sub.id();

        assert!(!ReactiveContext::is_active());
        assert!(ReactiveContext::current_subscriber().is_none());

        {
            let _ctx = ReactiveContext::enter(sub);
            assert!(ReactiveContext::is_active());
            assert_eq!(ReactiveContext::current_subscriber(), Some(id));
        }

        // Context should be cleaned up after drop
        assert!(!ReactiveContext::is_active());
        assert_eq!(ReactiveContext::depth(), 0);
    }

    #[test]
    fn nested_contexts() {
        let outer = test_subscriber();
        let inner = test_subscriber();
        let (outer_id, inner_id) = (outer.id(), inner.id());

        {
            let _ctx1 = ReactiveContext::enter(outer);
            assert_eq!(ReactiveContext::current_subscriber(), Some(outer_id));

            {
                let _ctx2 = ReactiveContext::enter(inner);
                assert_eq!(ReactiveContext::current_subscriber(), Some(inner_id));
                assert_eq!(ReactiveContext::depth(), 2);
            }

            // After inner context drops, outer should be current
            assert_eq!(ReactiveContext::current_subscriber(), Some(outer_id));
        }

        assert!(ReactiveContext::current_subscriber().is_none());
    }

    #[test]
    fn untracked_masks_outer_subscriber() {
        let _ctx = ReactiveContext::enter(test_subscriber());
        assert!(ReactiveContext::is_active());

        let inside = untracked(ReactiveContext::is_active);
        assert!(!inside);
        assert!(ReactiveContext::is_active());
    }
}
