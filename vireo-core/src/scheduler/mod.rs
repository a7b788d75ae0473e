//! Update Scheduling
//!
//! Reactive writes notify synchronously, but the units they notify run
//! later: the [`queue`](queue_watcher) collects them and a deferred flush
//! runs each once, in creation order. Deferral goes through the tick
//! mechanism, which is also exposed to hosts as [`next_tick`].

mod queue;
mod tick;

pub use queue::{flush_scheduler_queue, is_flushing, pending_count, queue_watcher};
pub(crate) use queue::queue_activated_component;
pub use tick::{
    flush_ticks, has_pending_ticks, next_tick, next_tick_for, set_tick_driver, tick,
    ManualDriver, TickDriver, TokioDriver,
};
