//! Deferred Callbacks
//!
//! [`next_tick`] queues a callback to run after the current synchronous
//! work. Every callback queued before a flush runs in that flush; callbacks
//! queued while the flush is running go to the next one.
//!
//! When the flush happens is up to the installed [`TickDriver`]:
//!
//! - [`ManualDriver`] (the default) does nothing on its own; the host calls
//!   [`flush_ticks`] when its current task is done. Tests use this for
//!   deterministic "await one microtask" steps.
//! - [`TokioDriver`] spawns the flush as a local task, so it runs as soon as
//!   the current task yields. It needs a `tokio::task::LocalSet`.

use std::cell::RefCell;
use std::future::Future;
use std::mem;
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::component::{Component, WeakComponent};
use crate::error::{handle_error, Result};

type TickCallback = Box<dyn FnOnce() -> Result<()>>;

/// Decides when pending callbacks get flushed.
pub trait TickDriver {
    /// Called once when the first callback of a batch is queued. The driver
    /// must arrange for [`flush_ticks`] to be called later.
    fn schedule(&self);
}

/// Leaves flushing to the host.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualDriver;

impl TickDriver for ManualDriver {
    fn schedule(&self) {}
}

/// Flushes on a `tokio` local task.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioDriver;

impl TickDriver for TokioDriver {
    fn schedule(&self) {
        tokio::task::spawn_local(async {
            flush_ticks();
        });
    }
}

struct TickState {
    callbacks: Vec<(Option<WeakComponent>, TickCallback)>,
    pending: bool,
    driver: Rc<dyn TickDriver>,
}

thread_local! {
    static TICKS: RefCell<TickState> = RefCell::new(TickState {
        callbacks: Vec::new(),
        pending: false,
        driver: Rc::new(ManualDriver),
    });
}

/// Install the driver for this thread.
pub fn set_tick_driver(driver: impl TickDriver + 'static) {
    TICKS.with(|ticks| ticks.borrow_mut().driver = Rc::new(driver));
}

/// Run `callback` after the current synchronous work. Errors are routed to
/// the error handler.
pub fn next_tick(callback: impl FnOnce() -> Result<()> + 'static) {
    enqueue(None, Box::new(callback));
}

/// Like [`next_tick`], attributing errors to `vm`.
pub fn next_tick_for(vm: &Component, callback: impl FnOnce() -> Result<()> + 'static) {
    enqueue(Some(vm.downgrade()), Box::new(callback));
}

fn enqueue(vm: Option<WeakComponent>, callback: TickCallback) {
    let driver = TICKS.with(|ticks| {
        let mut ticks = ticks.borrow_mut();
        ticks.callbacks.push((vm, callback));
        if ticks.pending {
            None
        } else {
            ticks.pending = true;
            Some(ticks.driver.clone())
        }
    });
    if let Some(driver) = driver {
        driver.schedule();
    }
}

/// Run every callback queued so far. Returns how many ran.
pub fn flush_ticks() -> usize {
    let callbacks = TICKS.with(|ticks| {
        let mut ticks = ticks.borrow_mut();
        ticks.pending = false;
        mem::take(&mut ticks.callbacks)
    });
    let count = callbacks.len();
    for (vm, callback) in callbacks {
        if let Err(err) = callback() {
            let vm = vm.and_then(|weak| weak.upgrade());
            handle_error(err, vm.as_ref(), "nextTick");
        }
    }
    count
}

/// Whether callbacks are waiting for a flush.
pub fn has_pending_ticks() -> bool {
    TICKS.with(|ticks| !ticks.borrow().callbacks.is_empty())
}

/// Resolves after the next flush, i.e. once updates queued so far have been
/// applied.
pub fn tick() -> impl Future<Output = ()> {
    let (tx, rx) = oneshot::channel();
    next_tick(move || {
        let _ = tx.send(());
        Ok(())
    });
    async move {
        let _ = rx.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::error::Error;
    use std::cell::Cell;

    #[test]
    fn callbacks_wait_for_flush() {
        let ran = Rc::new(Cell::new(0));
        let counter = ran.clone();
        next_tick(move || {
            counter.set(counter.get() + 1);
            Ok(())
        });

        assert_eq!(ran.get(), 0);
        assert!(has_pending_ticks());
        assert_eq!(flush_ticks(), 1);
        assert_eq!(ran.get(), 1);
        assert!(!has_pending_ticks());
    }

    #[test]
    fn callbacks_queued_during_flush_run_next_time() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let outer = order.clone();
        next_tick(move || {
            outer.borrow_mut().push("first");
            let inner = outer.clone();
            next_tick(move || {
                inner.borrow_mut().push("second");
                Ok(())
            });
            Ok(())
        });

        flush_ticks();
        assert_eq!(*order.borrow(), vec!["first"]);
        flush_ticks();
        assert_eq!(*order.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn failing_callbacks_are_reported() {
        let infos = Rc::new(RefCell::new(Vec::new()));
        let sink = infos.clone();
        config::update(|c| {
            c.error_handler = Some(Rc::new(move |_: &Error, _: Option<&Component>, info: &str| {
                sink.borrow_mut().push(info.to_string());
                Ok(())
            }));
        });

        next_tick(|| Err(Error::msg("tick failed")));
        flush_ticks();
        assert_eq!(*infos.borrow(), vec!["nextTick"]);
    }

    #[tokio::test]
    async fn tokio_driver_flushes_after_yield() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                set_tick_driver(TokioDriver);
                let ran = Rc::new(Cell::new(false));
                let flag = ran.clone();
                next_tick(move || {
                    flag.set(true);
                    Ok(())
                });
                assert!(!ran.get());
                tick().await;
                assert!(ran.get());
                set_tick_driver(ManualDriver);

                let later = Rc::new(Cell::new(false));
                let flag = later.clone();
                next_tick(move || {
                    flag.set(true);
                    Ok(())
                });
                tokio::task::yield_now().await;
                assert!(!later.get());
                flush_ticks();
                assert!(later.get());
            })
            .await;
    }
}
