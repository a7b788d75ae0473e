//! Update Queue
//!
//! The queue batches units notified during one synchronous burst of writes
//! and runs each of them once on the next tick.
//!
//! # Algorithm
//!
//! 1. [`queue_watcher`] ignores units already pending in the batch. Outside
//!    a flush, units are appended; the first enqueue schedules exactly one
//!    flush through [`next_tick`].
//! 2. The flush sorts the queue ascending by unit id. Parents are created
//!    before their children and a component's user watchers before its
//!    render unit, so this runs parents first and user callbacks before the
//!    re-render they might feed.
//! 3. A unit enqueued while the flush is running is inserted after the
//!    cursor, at its id position among the units not yet processed. If its
//!    id has already been passed it runs next.
//! 4. Every time a unit re-queues itself during one flush a counter is
//!    bumped. Past `max_update_count` the unit is dropped from the rest of
//!    the flush with a diagnostic; other units keep running.
//! 5. After draining, the batching state is reset, queued activations run,
//!    then each unit's `after` hook runs in queue order.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::mem;

use super::tick::next_tick;
use crate::component::{activate_child_component, Component};
use crate::config;
use crate::debug::warn;
use crate::reactive::{SubscriberId, Watcher};

#[derive(Default)]
struct SchedulerState {
    queue: Vec<Watcher>,
    activated: Vec<Component>,
    has: HashSet<SubscriberId>,
    circular: HashMap<SubscriberId, usize>,
    aborted: HashSet<SubscriberId>,
    waiting: bool,
    flushing: bool,
    index: usize,
}

thread_local! {
    static STATE: RefCell<SchedulerState> = RefCell::new(SchedulerState::default());
}

/// Add a unit to the pending batch.
pub fn queue_watcher(watcher: Watcher) {
    let id = watcher.id();
    let schedule = STATE.with(|state| {
        let mut state = state.borrow_mut();
        if state.has.contains(&id) || state.aborted.contains(&id) {
            return false;
        }
        state.has.insert(id);

        if !state.flushing {
            state.queue.push(watcher);
        } else {
            // Splice in by id among the units not yet run.
            let mut position = state.queue.len();
            while position > state.index + 1 && state.queue[position - 1].id() > id {
                position -= 1;
            }
            state.queue.insert(position, watcher);
        }

        if state.waiting {
            false
        } else {
            state.waiting = true;
            true
        }
    });

    if schedule {
        if config::with(|c| c.async_mode) {
            next_tick(|| {
                flush_scheduler_queue();
                Ok(())
            });
        } else {
            flush_scheduler_queue();
        }
    }
}

/// Queue a kept-alive component for activation at the end of the flush.
pub(crate) fn queue_activated_component(vm: Component) {
    vm.set_inactive(false);
    STATE.with(|state| state.borrow_mut().activated.push(vm));
}

/// Whether a flush is in progress.
pub fn is_flushing() -> bool {
    STATE.with(|state| state.borrow().flushing)
}

/// Number of units waiting in the current batch.
pub fn pending_count() -> usize {
    STATE.with(|state| {
        let state = state.borrow();
        state.queue.len().saturating_sub(if state.flushing { state.index + 1 } else { 0 })
    })
}

/// Drain the queue now.
pub fn flush_scheduler_queue() {
    let _span = tracing::trace_span!("flush").entered();
    let max_update_count = config::with(|c| c.max_update_count);

    STATE.with(|state| {
        let mut state = state.borrow_mut();
        state.flushing = true;
        state.queue.sort_by_key(Watcher::id);
    });

    let mut index = 0;
    loop {
        // The queue may grow while units run, so re-check the length each
        // time round.
        let next = STATE.with(|state| {
            let mut state = state.borrow_mut();
            state.index = index;
            state.queue.get(index).cloned()
        });
        let Some(watcher) = next else { break };
        let id = watcher.id();

        watcher.run_before();
        STATE.with(|state| state.borrow_mut().has.remove(&id));
        watcher.run();

        let runaway = STATE.with(|state| {
            let mut state = state.borrow_mut();
            if !state.has.contains(&id) {
                return false;
            }
            let count = state.circular.entry(id).or_insert(0);
            *count += 1;
            if *count <= max_update_count {
                return false;
            }
            // Drop the pending copies of this unit for the rest of the flush.
            state.has.remove(&id);
            state.aborted.insert(id);
            let tail: Vec<Watcher> = state
                .queue
                .drain(index + 1..)
                .filter(|w| w.id() != id)
                .collect();
            state.queue.extend(tail);
            true
        });
        if runaway {
            let vm = watcher.owner();
            let detail = if watcher.is_user() {
                format!("in watcher with expression \"{}\"", watcher.expression())
            } else {
                "in a component render function.".to_string()
            };
            tracing::warn!(target: "vireo", unit = %id, "update loop aborted");
            warn(format!("You may have an infinite update loop {detail}"), vm.as_ref());
        }

        index += 1;
    }

    let (queue, activated) = STATE.with(|state| {
        let mut state = state.borrow_mut();
        let queue = mem::take(&mut state.queue);
        let activated = mem::take(&mut state.activated);
        reset_state(&mut state);
        (queue, activated)
    });
    tracing::trace!(target: "vireo", units = queue.len(), "flushed");

    call_activated_hooks(&activated);
    call_after_hooks(&queue);
}

fn reset_state(state: &mut SchedulerState) {
    state.index = 0;
    state.has.clear();
    state.circular.clear();
    state.aborted.clear();
    state.waiting = false;
    state.flushing = false;
}

fn call_activated_hooks(activated: &[Component]) {
    for vm in activated {
        vm.set_inactive(true);
        activate_child_component(vm, true);
    }
}

fn call_after_hooks(queue: &[Watcher]) {
    let mut seen = HashSet::new();
    for watcher in queue {
        if seen.insert(watcher.id()) {
            watcher.run_after();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::flush_ticks;
    use std::cell::Cell;
    use std::rc::Rc;

    fn unit(log: &Rc<RefCell<Vec<u64>>>) -> Watcher {
        let log = log.clone();
        let slot: Rc<RefCell<Option<SubscriberId>>> = Rc::new(RefCell::new(None));
        let id_slot = slot.clone();
        let first = Rc::new(Cell::new(true));
        let watcher = Watcher::builder(move || {
            if !first.replace(false) {
                if let Some(id) = *id_slot.borrow() {
                    log.borrow_mut().push(id.raw());
                }
            }
            Ok(crate::reactive::Value::Undefined)
        })
        .build();
        *slot.borrow_mut() = Some(watcher.id());
        watcher
    }

    #[test]
    fn flush_runs_units_in_id_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let parent = unit(&log);
        let child = unit(&log);

        queue_watcher(child.clone());
        queue_watcher(parent.clone());
        queue_watcher(child.clone());
        assert_eq!(pending_count(), 2);

        flush_ticks();
        assert_eq!(*log.borrow(), vec![parent.id().raw(), child.id().raw()]);
        assert!(!is_flushing());
    }

    #[test]
    fn nothing_runs_before_the_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let a = unit(&log);
        queue_watcher(a);
        assert!(log.borrow().is_empty());
        flush_ticks();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn after_hooks_run_once_in_queue_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let (first_log, second_log) = (order.clone(), order.clone());
        let first = Watcher::builder(|| Ok(crate::reactive::Value::Undefined))
            .after(move || first_log.borrow_mut().push("first"))
            .build();
        let second = Watcher::builder(|| Ok(crate::reactive::Value::Undefined))
            .after(move || second_log.borrow_mut().push("second"))
            .build();

        queue_watcher(second);
        queue_watcher(first);
        flush_scheduler_queue();

        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }
}
