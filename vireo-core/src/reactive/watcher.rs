//! Observer Units (Watchers)
//!
//! A [`Watcher`] wraps a getter, evaluates it inside a tracking context, and
//! re-evaluates when any dependency it read changes. The same type backs
//! render units, computed values and user watches; only the mode flags
//! differ.
//!
//! # Dependency bookkeeping
//!
//! Each evaluation collects the dependencies it reads into a fresh set. When
//! the evaluation finishes, dependencies from the previous set that were not
//! read again are unsubscribed and the fresh set becomes canonical. After any
//! evaluation a unit is subscribed to exactly what it read.
//!
//! # Dispatch modes
//!
//! - lazy: [`update`](Watcher::update) only marks the unit dirty; the value is
//!   recomputed on the next [`evaluate`](Watcher::evaluate).
//! - sync: the unit runs immediately on the notifying stack.
//! - default: the unit is handed to the scheduler and runs on the next flush.
//!
//! # Ownership
//!
//! Dependencies only hold weak references to units. A unit owned by a
//! component is kept alive by the component; a free-standing unit is kept
//! alive by the handle returned from [`watch`] (or by the [`Watcher`] value
//! itself).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;
use smallvec::SmallVec;

use super::context::{untracked, ReactiveContext};
use super::dep::{Dep, DepId};
use super::subscriber::{Subscriber, SubscriberId};
use super::traverse::traverse;
use super::value::Value;
use crate::component::{Component, WeakComponent};
use crate::debug::warn;
use crate::error::{handle_error, invoke_with_error_handling, Error, Result};
use crate::scheduler::queue_watcher;

/// Function evaluated by a unit.
pub type WatchGetter = Rc<dyn Fn() -> Result<Value>>;

/// Callback receiving `(new, old)` after a unit's value changed.
pub type WatchCallback = Rc<dyn Fn(&Value, &Value) -> Result<()>>;

/// Hook run by the scheduler around a unit's run.
pub type WatcherHook = Rc<dyn Fn()>;

/// Mode flags for a [`Watcher`].
#[derive(Clone, Default)]
pub struct WatcherOptions {
    /// Traverse the result so that every nested property is a dependency.
    pub deep: bool,
    /// User-defined unit: errors are attributed to the watch expression.
    pub user: bool,
    /// Pull-based: recompute only when read while dirty.
    pub lazy: bool,
    /// Run immediately on notification instead of batching.
    pub sync: bool,
    /// Run by the scheduler right before the unit runs.
    pub before: Option<WatcherHook>,
    /// Run by the scheduler after the whole flush, in queue order.
    pub after: Option<WatcherHook>,
}

struct WatcherInner {
    id: SubscriberId,
    me: Weak<WatcherInner>,
    owner: Option<WeakComponent>,
    expression: String,
    getter: WatchGetter,
    callback: Option<WatchCallback>,
    deep: bool,
    user: bool,
    lazy: bool,
    sync: bool,
    before: Option<WatcherHook>,
    after: Option<WatcherHook>,
    active: Cell<bool>,
    dirty: Cell<bool>,
    value: RefCell<Value>,
    deps: RefCell<SmallVec<[Dep; 4]>>,
    new_deps: RefCell<SmallVec<[Dep; 4]>>,
    dep_ids: RefCell<IndexSet<DepId>>,
    new_dep_ids: RefCell<IndexSet<DepId>>,
}

impl Subscriber for WatcherInner {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dep(&self, dep: &Dep) {
        let id = dep.id();
        if self.new_dep_ids.borrow_mut().insert(id) {
            self.new_deps.borrow_mut().push(dep.clone());
            if !self.dep_ids.borrow().contains(&id) {
                let me: Weak<dyn Subscriber> = self.me.clone();
                dep.add_sub(me);
            }
        }
    }

    fn update(&self) {
        if self.lazy {
            self.dirty.set(true);
        } else if let Some(inner) = self.me.upgrade() {
            let watcher = Watcher { inner };
            if self.sync {
                watcher.run();
            } else {
                queue_watcher(watcher);
            }
        }
    }
}

/// A reactive evaluation unit.
#[derive(Clone)]
pub struct Watcher {
    inner: Rc<WatcherInner>,
}

impl Watcher {
    /// Start building a unit around `getter`.
    pub fn builder(getter: impl Fn() -> Result<Value> + 'static) -> WatcherBuilder {
        WatcherBuilder {
            getter: Rc::new(getter),
            callback: None,
            options: WatcherOptions::default(),
            owner: None,
            expression: String::from("<function>"),
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Source text or path of the watched expression, for diagnostics.
    pub fn expression(&self) -> &str {
        &self.inner.expression
    }

    pub fn is_user(&self) -> bool {
        self.inner.user
    }

    pub fn is_lazy(&self) -> bool {
        self.inner.lazy
    }

    /// False once torn down.
    pub fn is_active(&self) -> bool {
        self.inner.active.get()
    }

    /// Whether a lazy unit needs re-evaluation.
    pub fn is_dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// The cached value from the last evaluation.
    pub fn value(&self) -> Value {
        self.inner.value.borrow().clone()
    }

    /// The owning component, if it is still alive.
    pub fn owner(&self) -> Option<Component> {
        self.inner.owner.as_ref().and_then(WeakComponent::upgrade)
    }

    /// Number of dependencies the unit is currently subscribed to.
    pub fn dep_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    /// Whether the unit is subscribed to `dep`.
    pub fn depends_on(&self, dep: &Dep) -> bool {
        self.inner.dep_ids.borrow().contains(&dep.id())
    }

    /// Evaluate the getter and recollect dependencies.
    pub fn get(&self) -> Value {
        let inner = &self.inner;
        let value = {
            let subscriber: Rc<dyn Subscriber> = inner.clone();
            let _ctx = ReactiveContext::enter(subscriber);
            let value = match (inner.getter)() {
                Ok(value) => value,
                Err(err) => {
                    let owner = self.owner();
                    handle_error(
                        err,
                        owner.as_ref(),
                        &format!("getter for watcher \"{}\"", inner.expression),
                    );
                    Value::Undefined
                }
            };
            if inner.deep {
                traverse(&value);
            }
            value
        };
        self.cleanup_deps();
        value
    }

    fn cleanup_deps(&self) {
        let inner = &self.inner;
        {
            let new_ids = inner.new_dep_ids.borrow();
            for dep in inner.deps.borrow().iter() {
                if !new_ids.contains(&dep.id()) {
                    dep.remove_sub(inner.id);
                }
            }
        }
        inner.dep_ids.swap(&inner.new_dep_ids);
        inner.new_dep_ids.borrow_mut().clear();
        inner.deps.swap(&inner.new_deps);
        inner.new_deps.borrow_mut().clear();
    }

    /// Dispatch a change notification according to the unit's mode.
    pub fn update(&self) {
        Subscriber::update(&*self.inner);
    }

    /// Re-evaluate and fire the callback if the value changed. Containers
    /// and deep units always fire, since their contents may have mutated in
    /// place. Inert (torn down) units do nothing.
    pub fn run(&self) {
        let inner = &self.inner;
        if !inner.active.get() {
            return;
        }
        let value = self.get();
        let old = inner.value.borrow().clone();
        if value != old || value.is_container() || inner.deep {
            *inner.value.borrow_mut() = value.clone();
            if let Some(callback) = &inner.callback {
                let owner = self.owner();
                let info = format!("callback for watcher \"{}\"", inner.expression);
                untracked(|| {
                    invoke_with_error_handling(|| callback(&value, &old), owner.as_ref(), &info)
                });
            }
        }
    }

    /// Recompute a lazy unit's value and clear its dirty flag.
    pub fn evaluate(&self) {
        let value = self.get();
        *self.inner.value.borrow_mut() = value;
        self.inner.dirty.set(false);
    }

    /// Register the active unit on every dependency of this unit. Lets a
    /// render unit reading a computed value depend on what the computed read.
    pub fn depend(&self) {
        let deps: SmallVec<[Dep; 4]> = self.inner.deps.borrow().clone();
        for dep in &deps {
            dep.depend();
        }
    }

    /// Unsubscribe from every dependency and become inert.
    pub fn teardown(&self) {
        let inner = &self.inner;
        if !inner.active.get() {
            return;
        }
        if let Some(owner) = self.owner() {
            if !owner.is_being_destroyed() {
                owner.remove_watcher(inner.id);
            }
        }
        let deps = std::mem::take(&mut *inner.deps.borrow_mut());
        for dep in &deps {
            dep.remove_sub(inner.id);
        }
        inner.dep_ids.borrow_mut().clear();
        inner.active.set(false);
    }

    pub(crate) fn run_before(&self) {
        if let Some(before) = &self.inner.before {
            before();
        }
    }

    pub(crate) fn run_after(&self) {
        if let Some(after) = &self.inner.after {
            after();
        }
    }

    pub fn ptr_eq(&self, other: &Watcher) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watcher")
            .field("id", &self.inner.id)
            .field("expression", &self.inner.expression)
            .field("active", &self.inner.active.get())
            .field("dep_count", &self.dep_count())
            .finish()
    }
}

/// Builder for [`Watcher`].
pub struct WatcherBuilder {
    getter: WatchGetter,
    callback: Option<WatchCallback>,
    options: WatcherOptions,
    owner: Option<WeakComponent>,
    expression: String,
}

impl WatcherBuilder {
    pub fn callback(mut self, callback: impl Fn(&Value, &Value) -> Result<()> + 'static) -> Self {
        self.callback = Some(Rc::new(callback));
        self
    }

    pub(crate) fn callback_rc(mut self, callback: WatchCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn options(mut self, options: WatcherOptions) -> Self {
        self.options = options;
        self
    }

    pub fn deep(mut self, deep: bool) -> Self {
        self.options.deep = deep;
        self
    }

    pub fn user(mut self, user: bool) -> Self {
        self.options.user = user;
        self
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.options.lazy = lazy;
        self
    }

    pub fn sync(mut self, sync: bool) -> Self {
        self.options.sync = sync;
        self
    }

    pub fn before(mut self, hook: impl Fn() + 'static) -> Self {
        self.options.before = Some(Rc::new(hook));
        self
    }

    pub fn after(mut self, hook: impl Fn() + 'static) -> Self {
        self.options.after = Some(Rc::new(hook));
        self
    }

    /// Attach the unit to a component: it is torn down with the component
    /// and errors are attributed to it.
    pub fn owner(mut self, owner: &Component) -> Self {
        self.owner = Some(owner.downgrade());
        self
    }

    pub fn expression(mut self, expression: impl Into<String>) -> Self {
        self.expression = expression.into();
        self
    }

    /// Create the unit and, unless it is lazy, evaluate it once.
    pub fn build(self) -> Watcher {
        let watcher = self.build_deferred();
        if watcher.inner.lazy {
            watcher.inner.dirty.set(true);
        } else {
            watcher.prime();
        }
        watcher
    }

    /// Create the unit without evaluating it. The caller must
    /// [`prime`](Watcher::prime) it.
    pub(crate) fn build_deferred(self) -> Watcher {
        let options = self.options;
        let inner = Rc::new_cyclic(|me| WatcherInner {
            id: SubscriberId::new(),
            me: me.clone(),
            owner: self.owner,
            expression: self.expression,
            getter: self.getter,
            callback: self.callback,
            deep: options.deep,
            user: options.user,
            lazy: options.lazy,
            sync: options.sync,
            before: options.before,
            after: options.after,
            active: Cell::new(true),
            dirty: Cell::new(options.lazy),
            value: RefCell::new(Value::Undefined),
            deps: RefCell::new(SmallVec::new()),
            new_deps: RefCell::new(SmallVec::new()),
            dep_ids: RefCell::new(IndexSet::new()),
            new_dep_ids: RefCell::new(IndexSet::new()),
        });
        let watcher = Watcher { inner };
        if let Some(owner) = watcher.owner() {
            owner.add_watcher(watcher.clone());
        }
        watcher
    }
}

impl Watcher {
    /// First evaluation of a unit built with `build_deferred`.
    pub(crate) fn prime(&self) {
        let value = self.get();
        *self.inner.value.borrow_mut() = value;
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// A parsed dot-delimited property path such as `a.b.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Rc<str>>,
}

impl Path {
    /// Parse a path. Only identifier characters, `$` and `.` are accepted.
    pub fn parse(expression: &str) -> Result<Self> {
        let valid = expression
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '$' || c == '.');
        if !valid {
            return Err(Error::InvalidPath(expression.to_string()));
        }
        Ok(Self {
            segments: expression.split('.').map(Rc::from).collect(),
        })
    }

    pub fn segments(&self) -> &[Rc<str>] {
        &self.segments
    }

    /// Resolve against `root`. Reads are tracked; a missing intermediate
    /// value yields `undefined`.
    pub fn resolve(&self, root: &Value) -> Value {
        self.resolve_with(|first| root.get(first))
    }

    /// Resolve using `first` to look up the leading segment.
    pub fn resolve_with(&self, first: impl FnOnce(&str) -> Value) -> Value {
        let mut segments = self.segments.iter();
        let Some(head) = segments.next() else {
            return Value::Undefined;
        };
        let mut current = first(head);
        for segment in segments {
            if current.is_nullish() {
                return Value::Undefined;
            }
            current = current.get(segment);
        }
        current
    }
}

// ---------------------------------------------------------------------------
// watch()
// ---------------------------------------------------------------------------

/// What a user watch observes.
pub enum WatchSource {
    /// A dotted path resolved against a root value.
    Path { root: Value, path: String },
    /// An arbitrary getter.
    Getter(WatchGetter),
}

impl WatchSource {
    pub fn path(root: impl Into<Value>, path: impl Into<String>) -> Self {
        WatchSource::Path {
            root: root.into(),
            path: path.into(),
        }
    }

    pub fn getter(getter: impl Fn() -> Result<Value> + 'static) -> Self {
        WatchSource::Getter(Rc::new(getter))
    }
}

/// Options for [`watch`].
#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    pub deep: bool,
    /// Invoke the callback once right away with the current value.
    pub immediate: bool,
    pub sync: bool,
}

/// Handle returned by [`watch`].
///
/// The handle keeps a free-standing unit alive; dropping it stops the watch
/// unless a component owns the unit.
#[derive(Debug, Clone)]
pub struct WatchHandle {
    watcher: Watcher,
}

impl WatchHandle {
    /// Stop watching.
    pub fn unwatch(&self) {
        self.watcher.teardown();
    }

    pub fn watcher(&self) -> &Watcher {
        &self.watcher
    }
}

/// Build a getter for a path expression. Malformed paths warn and evaluate
/// to `undefined`.
pub(crate) fn path_getter(
    expression: &str,
    vm: Option<&Component>,
    lookup: impl Fn(&Path) -> Value + 'static,
) -> WatchGetter {
    match Path::parse(expression) {
        Ok(path) => Rc::new(move || Ok(lookup(&path))),
        Err(_) => {
            warn(
                format!(
                    "Failed watching path: \"{expression}\" Watcher only accepts simple \
                     dot-delimited paths. For full control, use a function instead."
                ),
                vm,
            );
            Rc::new(|| Ok(Value::Undefined))
        }
    }
}

pub(crate) fn create_user_watcher(
    owner: Option<&Component>,
    expression: String,
    getter: WatchGetter,
    callback: WatchCallback,
    options: WatchOptions,
) -> WatchHandle {
    let mut builder = WatcherBuilder {
        getter,
        callback: None,
        options: WatcherOptions {
            deep: options.deep,
            sync: options.sync,
            user: true,
            ..WatcherOptions::default()
        },
        owner: None,
        expression,
    }
    .callback_rc(callback.clone());
    if let Some(owner) = owner {
        builder = builder.owner(owner);
    }
    let watcher = builder.build();

    if options.immediate {
        let value = watcher.value();
        let info = format!("callback for immediate watcher \"{}\"", watcher.expression());
        untracked(|| {
            invoke_with_error_handling(|| callback(&value, &Value::Undefined), owner, &info)
        });
    }
    WatchHandle { watcher }
}

/// Watch `source` and call `callback(new, old)` whenever its value changes.
pub fn watch(
    source: WatchSource,
    callback: impl Fn(&Value, &Value) -> Result<()> + 'static,
    options: WatchOptions,
) -> WatchHandle {
    let (expression, getter) = match source {
        WatchSource::Path { root, path } => {
            let getter = path_getter(&path, None, move |p| p.resolve(&root));
            (path, getter)
        }
        WatchSource::Getter(getter) => (String::from("<function>"), getter),
    };
    create_user_watcher(None, expression, getter, Rc::new(callback), options)
}
