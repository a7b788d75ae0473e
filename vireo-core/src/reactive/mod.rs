//! Reactive Primitives
//!
//! This module implements the dependency-tracking engine: dynamic values
//! whose reads and writes are intercepted, dependencies that record who read
//! what, and evaluation units that re-run when their inputs change.
//!
//! # Concepts
//!
//! ## Dependencies
//!
//! A [`Dep`] is a publisher for one piece of observable state. There is one
//! per reactive property and one per observed object or array.
//!
//! ## Observation
//!
//! [`observe`] walks a [`Value`] graph and installs interception on every
//! property it finds. Afterwards, [`Object::get`] registers the evaluating
//! unit and [`Object::set`] notifies. Keys added later must go through
//! [`set`] to become reactive; array changes must go through the array
//! mutators.
//!
//! ## Watchers
//!
//! A [`Watcher`] evaluates a getter inside a [`ReactiveContext`], collecting
//! exactly the dependencies it read. Lazy watchers back [`Computed`] values;
//! eager ones are handed to the scheduler, which batches them until the next
//! tick.
//!
//! # Implementation Notes
//!
//! Everything here is single-threaded. Shared state uses `Rc`/`RefCell`, and
//! the active-unit stack is thread-local. Dependencies hold their subscribers
//! weakly, so dropping the owner of a unit is enough to stop it.

mod array;
mod computed;
mod context;
mod dep;
mod observer;
mod subscriber;
mod traverse;
mod value;
mod watcher;

pub use computed::Computed;
pub use context::{untracked, ReactiveContext};
pub use dep::{Dep, DepId};
pub use observer::{
    define_reactive, del, is_observing, observe, observe_array, set, toggle_observing, walk,
    Observer, ReactiveOptions,
};
pub(crate) use observer::observe_root;
pub use subscriber::{Subscriber, SubscriberId};
pub use traverse::traverse;
pub use value::{
    Array, CustomSetter, Getter, Object, PropKey, PropertyDescriptor, Setter, Value,
};
pub use watcher::{
    watch, Path, WatchCallback, WatchGetter, WatchHandle, WatchOptions, WatchSource, Watcher,
    WatcherBuilder, WatcherHook, WatcherOptions,
};
pub(crate) use watcher::{create_user_watcher, path_getter};
