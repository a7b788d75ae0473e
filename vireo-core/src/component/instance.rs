//! Component Instances
//!
//! A [`Component`] is one live instance of a [`ComponentDef`]: reactive
//! props and data, computed properties, watches, a render unit, and its
//! place in the instance tree.
//!
//! # Lifecycle
//!
//! 1. Creation links the instance to its parent, resolves slots, runs
//!    `beforeCreate`, initializes props, data, computed and watches, then
//!    runs `created`.
//! 2. [`Component::mount`] creates the render unit. Each evaluation renders
//!    a new tree and patches it over the previous one. Root instances run
//!    `mounted` right away; child instances when their placeholder is
//!    inserted.
//! 3. When state read by the last render changes, the render unit is
//!    queued and re-renders on the next flush, bracketed by `beforeUpdate`
//!    and `updated`.
//! 4. [`Component::destroy`] tears down every unit, detaches from the
//!    parent and tears down the rendered tree, destroying child instances.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;

use super::def::{ComponentDef, Hook, PropDef, PropDefault};
use super::hooks::resolve_slots;
use crate::debug::{format_component_name, warn};
use crate::error::{handle_error, invoke_with_error_handling, Result};
use crate::reactive::{
    create_user_watcher, define_reactive, is_observing, observe, observe_root, path_getter,
    toggle_observing, Computed, CustomSetter, Object, Path, ReactiveContext, ReactiveOptions,
    SubscriberId, Value, WatchCallback, WatchHandle, WatchOptions, Watcher,
};
use crate::scheduler::next_tick_for;
use crate::vdom::{
    HostNode, Listener, PatchTarget, Patcher, RefEntry, Refs, VNode, WeakVNode,
};

thread_local! {
    static RENDERING: RefCell<Option<Component>> = const { RefCell::new(None) };
    static ACTIVE: RefCell<Option<Component>> = const { RefCell::new(None) };
    static UPDATING_CHILD: Cell<bool> = const { Cell::new(false) };
}

/// The instance whose render function is running, if any.
pub fn current_rendering_instance() -> Option<Component> {
    RENDERING.with(|r| r.borrow().clone())
}

/// The instance whose tree is being patched. Components created during the
/// patch become its children.
pub(crate) fn active_instance() -> Option<Component> {
    ACTIVE.with(|a| a.borrow().clone())
}

pub(crate) fn is_updating_child_component() -> bool {
    UPDATING_CHILD.with(Cell::get)
}

/// Restores the previous value of a per-thread instance slot on drop.
struct InstanceScope {
    slot: &'static std::thread::LocalKey<RefCell<Option<Component>>>,
    previous: Option<Component>,
}

impl InstanceScope {
    fn enter(
        slot: &'static std::thread::LocalKey<RefCell<Option<Component>>>,
        vm: &Component,
    ) -> Self {
        let previous = slot.with(|s| s.replace(Some(vm.clone())));
        Self { slot, previous }
    }
}

impl Drop for InstanceScope {
    fn drop(&mut self) {
        let previous = self.previous.take();
        self.slot.with(|s| *s.borrow_mut() = previous);
    }
}

struct UpdatingChildScope {
    previous: bool,
}

impl UpdatingChildScope {
    fn enter() -> Self {
        Self {
            previous: UPDATING_CHILD.with(|u| u.replace(true)),
        }
    }
}

impl Drop for UpdatingChildScope {
    fn drop(&mut self) {
        UPDATING_CHILD.with(|u| u.set(self.previous));
    }
}

static NEXT_UID: AtomicU64 = AtomicU64::new(0);

struct ComponentInner {
    uid: u64,
    def: Rc<ComponentDef>,
    parent: Option<WeakComponent>,
    children: RefCell<Vec<Component>>,
    refs: RefCell<Refs>,
    props: Object,
    /// Prop values as last passed by the parent.
    props_data: RefCell<IndexMap<Rc<str>, Value>>,
    data: RefCell<Value>,
    computed: RefCell<IndexMap<Rc<str>, Computed>>,
    watchers: RefCell<Vec<Watcher>>,
    render_watcher: RefCell<Option<Watcher>>,
    /// The tree produced by the last render.
    vnode: RefCell<Option<VNode>>,
    placeholder: RefCell<Option<WeakVNode>>,
    render_children: RefCell<Vec<VNode>>,
    slots: RefCell<IndexMap<Rc<str>, Vec<VNode>>>,
    el: Cell<Option<HostNode>>,
    patcher: RefCell<Option<Patcher>>,
    events: RefCell<IndexMap<Rc<str>, Vec<Listener>>>,
    parent_listeners: RefCell<IndexMap<Rc<str>, Listener>>,
    is_mounted: Cell<bool>,
    is_destroyed: Cell<bool>,
    is_being_destroyed: Cell<bool>,
    inactive: Cell<Option<bool>>,
    direct_inactive: Cell<bool>,
}

/// A live component instance. Cloning yields another handle to the same
/// instance.
#[derive(Clone)]
pub struct Component {
    inner: Rc<ComponentInner>,
}

/// Non-owning handle to a [`Component`].
#[derive(Clone)]
pub struct WeakComponent {
    inner: Weak<ComponentInner>,
}

impl WeakComponent {
    pub fn upgrade(&self) -> Option<Component> {
        self.inner.upgrade().map(|inner| Component { inner })
    }
}

impl fmt::Debug for WeakComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(vm) => write!(f, "WeakComponent({vm:?})"),
            None => f.write_str("WeakComponent(<dropped>)"),
        }
    }
}

impl Component {
    /// Create a root instance without props.
    pub fn new(def: &Rc<ComponentDef>) -> Component {
        Self::init(def.clone(), None, None, &IndexMap::new())
    }

    /// Create a root instance with prop values.
    pub fn with_props<K, V>(def: &Rc<ComponentDef>, props: impl IntoIterator<Item = (K, V)>) -> Component
    where
        K: Into<Rc<str>>,
        V: Into<Value>,
    {
        let props: IndexMap<Rc<str>, Value> =
            props.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::init(def.clone(), None, None, &props)
    }

    /// Create the instance behind a component placeholder.
    pub(crate) fn create_for_vnode(
        def: Rc<ComponentDef>,
        parent: Option<&Component>,
        placeholder: &VNode,
    ) -> Component {
        let props = placeholder
            .data()
            .map(|d| d.props.clone())
            .unwrap_or_default();
        Self::init(def, parent, Some(placeholder), &props)
    }

    fn init(
        def: Rc<ComponentDef>,
        parent: Option<&Component>,
        placeholder: Option<&VNode>,
        props_data: &IndexMap<Rc<str>, Value>,
    ) -> Component {
        // Abstract instances are skipped when locating the parent.
        let mut parent = parent.cloned();
        if !def.is_abstract() {
            while let Some(candidate) = parent.clone() {
                match candidate.parent() {
                    Some(grand) if candidate.def().is_abstract() => parent = Some(grand),
                    _ => break,
                }
            }
        }

        let vm = Component {
            inner: Rc::new(ComponentInner {
                uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
                def,
                parent: parent.as_ref().map(Component::downgrade),
                children: RefCell::new(Vec::new()),
                refs: RefCell::new(IndexMap::new()),
                props: Object::new(),
                props_data: RefCell::new(IndexMap::new()),
                data: RefCell::new(Value::Undefined),
                computed: RefCell::new(IndexMap::new()),
                watchers: RefCell::new(Vec::new()),
                render_watcher: RefCell::new(None),
                vnode: RefCell::new(None),
                placeholder: RefCell::new(None),
                render_children: RefCell::new(Vec::new()),
                slots: RefCell::new(IndexMap::new()),
                el: Cell::new(None),
                patcher: RefCell::new(None),
                events: RefCell::new(IndexMap::new()),
                parent_listeners: RefCell::new(IndexMap::new()),
                is_mounted: Cell::new(false),
                is_destroyed: Cell::new(false),
                is_being_destroyed: Cell::new(false),
                inactive: Cell::new(None),
                direct_inactive: Cell::new(false),
            }),
        };
        tracing::trace!(target: "vireo", uid = vm.uid(), name = vm.def().name(), "create instance");

        if let Some(parent) = &parent {
            if !vm.def().is_abstract() {
                parent.inner.children.borrow_mut().push(vm.clone());
            }
        }

        if let Some(placeholder) = placeholder {
            vm.set_placeholder(Some(placeholder));
            if let Some(data) = placeholder.data() {
                *vm.inner.parent_listeners.borrow_mut() = data.on.clone();
            }
            if let Some(options) = placeholder.component_options() {
                *vm.inner.render_children.borrow_mut() = options.children.clone();
            }
        }
        let slots = resolve_slots(&vm.inner.render_children.borrow());
        *vm.inner.slots.borrow_mut() = slots;

        vm.call_hook(Hook::BeforeCreate);
        vm.init_props(props_data);
        vm.init_data();
        vm.init_computed();
        vm.init_watch();
        vm.call_hook(Hook::Created);
        vm
    }

    fn init_props(&self, props_data: &IndexMap<Rc<str>, Value>) {
        let is_root = self.parent().is_none();
        // Values handed down by the parent are already observed, or were
        // deliberately left plain.
        if !is_root {
            toggle_observing(false);
        }
        for (key, prop) in self.def().props() {
            let value = self.resolve_prop(key, prop, props_data);
            let vm = self.downgrade();
            let name = key.clone();
            let custom_setter: CustomSetter = Rc::new(move |_: &Value| {
                if !is_root && !is_updating_child_component() {
                    warn(
                        format!(
                            "Avoid mutating a prop directly since the value will be overwritten \
                             whenever the parent component re-renders. Instead, use a data or \
                             computed property based on the prop's value. Prop being mutated: \
                             \"{name}\""
                        ),
                        vm.upgrade().as_ref(),
                    );
                }
            });
            define_reactive(
                &self.inner.props,
                key,
                Some(value),
                ReactiveOptions {
                    shallow: false,
                    custom_setter: Some(custom_setter),
                },
            );
        }
        toggle_observing(true);
        *self.inner.props_data.borrow_mut() = props_data.clone();
    }

    fn resolve_prop(&self, key: &str, prop: &PropDef, props_data: &IndexMap<Rc<str>, Value>) -> Value {
        if let Some(value) = props_data.get(key) {
            if !value.is_undefined() {
                return value.clone();
            }
        }
        if prop.required && !props_data.contains_key(key) {
            warn(format!("Missing required prop: \"{key}\""), Some(self));
        }
        let Some(default) = &prop.default else {
            return Value::Undefined;
        };

        // Keep a default produced by an earlier render so it does not
        // retrigger dependents. A value the parent used to pass is not one.
        let was_defaulted = self
            .inner
            .props_data
            .borrow()
            .get(key)
            .map_or(true, Value::is_undefined);
        let previous = self.inner.props.get_untracked(key);
        if was_defaulted && !previous.is_undefined() {
            return previous;
        }

        let value = match default {
            PropDefault::Value(value) => {
                if value.is_container() {
                    warn(
                        format!(
                            "Invalid default value for prop \"{key}\": Props with type \
                             Object/Array must use a factory function to return the default value."
                        ),
                        Some(self),
                    );
                }
                value.clone()
            }
            PropDefault::Factory(factory) => factory(),
        };
        let observing = is_observing();
        toggle_observing(true);
        observe(&value);
        toggle_observing(observing);
        value
    }

    fn init_data(&self) {
        let data = match self.def().data() {
            Some(factory) => {
                let _ctx = ReactiveContext::untracked();
                match factory(self) {
                    Ok(value) => value,
                    Err(err) => {
                        handle_error(err, Some(self), "data()");
                        Value::object()
                    }
                }
            }
            None => Value::object(),
        };
        let data = if data.as_object().is_some() {
            data
        } else {
            warn("data functions should return an object", Some(self));
            Value::object()
        };

        if let Some(object) = data.as_object() {
            for key in object.keys() {
                if self.inner.props.has(&key) {
                    warn(
                        format!(
                            "The data property \"{key}\" is already declared as a prop. Use prop \
                             default value instead."
                        ),
                        Some(self),
                    );
                }
            }
        }
        observe_root(&data);
        *self.inner.data.borrow_mut() = data;
    }

    fn init_computed(&self) {
        let data = self.data();
        for (name, computed) in self.def().computed() {
            if self.inner.props.has(name) {
                warn(
                    format!("The computed property \"{name}\" is already defined as a prop."),
                    Some(self),
                );
                continue;
            }
            if data.as_object().is_some_and(|o| o.has(name)) {
                warn(
                    format!("The computed property \"{name}\" is already defined in data."),
                    Some(self),
                );
                continue;
            }
            let vm = self.downgrade();
            let getter = computed.get.clone();
            let unit = Computed::owned(self, name, move || match vm.upgrade() {
                Some(vm) => getter(&vm),
                None => Ok(Value::Undefined),
            });
            self.inner.computed.borrow_mut().insert(name.clone(), unit);
        }
    }

    fn init_watch(&self) {
        for watch in self.def().watches() {
            let handler = watch.handler.clone();
            self.watch(&watch.path, move |vm, new, old| handler(vm, new, old), watch.options);
        }
    }

    pub fn uid(&self) -> u64 {
        self.inner.uid
    }

    pub fn def(&self) -> &Rc<ComponentDef> {
        &self.inner.def
    }

    pub fn parent(&self) -> Option<Component> {
        self.inner.parent.as_ref().and_then(WeakComponent::upgrade)
    }

    pub fn root(&self) -> Component {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    pub fn children(&self) -> Vec<Component> {
        self.inner.children.borrow().clone()
    }

    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Read a prop, data property or computed property, in that order.
    /// Reads are tracked.
    pub fn get(&self, key: &str) -> Value {
        if self.inner.props.has(key) {
            return self.inner.props.get(key);
        }
        let data = self.data();
        if let Some(object) = data.as_object() {
            if object.has(key) {
                return object.get(key);
            }
        }
        let computed = self.inner.computed.borrow().get(key).cloned();
        match computed {
            Some(computed) => computed.get(),
            None => Value::Undefined,
        }
    }

    /// Write a prop, data property or computed property with a setter.
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if self.inner.props.has(key) {
            self.inner.props.set(key, value);
            return;
        }
        let data = self.data();
        if let Some(object) = data.as_object() {
            if object.has(key) {
                object.set(key, value);
                return;
            }
        }
        match self.def().computed().get(key).map(|c| c.set.clone()) {
            Some(Some(setter)) => {
                let info = format!("setter for computed \"{key}\"");
                invoke_with_error_handling(|| setter(self, value), Some(self), &info);
            }
            Some(None) => warn(
                format!("Computed property \"{key}\" was assigned to but it has no setter."),
                Some(self),
            ),
            None => warn(
                format!(
                    "Property \"{key}\" is not defined on the instance. Declare it in data or \
                     props."
                ),
                Some(self),
            ),
        }
    }

    /// The root data object.
    pub fn data(&self) -> Value {
        self.inner.data.borrow().clone()
    }

    /// The reactive props object.
    pub fn props(&self) -> &Object {
        &self.inner.props
    }

    /// Watch a dotted path resolved against the instance, e.g. `user.name`.
    pub fn watch(
        &self,
        path: &str,
        callback: impl Fn(&Component, &Value, &Value) -> Result<()> + 'static,
        options: WatchOptions,
    ) -> WatchHandle {
        let vm = self.downgrade();
        let getter = path_getter(path, Some(self), move |p: &Path| match vm.upgrade() {
            Some(vm) => p.resolve_with(|first| vm.get(first)),
            None => Value::Undefined,
        });
        create_user_watcher(
            Some(self),
            path.to_string(),
            getter,
            self.bind_callback(callback),
            options,
        )
    }

    /// Watch the result of `getter`.
    pub fn watch_fn(
        &self,
        getter: impl Fn(&Component) -> Result<Value> + 'static,
        callback: impl Fn(&Component, &Value, &Value) -> Result<()> + 'static,
        options: WatchOptions,
    ) -> WatchHandle {
        let vm = self.downgrade();
        let getter = Rc::new(move || match vm.upgrade() {
            Some(vm) => getter(&vm),
            None => Ok(Value::Undefined),
        });
        create_user_watcher(
            Some(self),
            String::from("<function>"),
            getter,
            self.bind_callback(callback),
            options,
        )
    }

    fn bind_callback(
        &self,
        callback: impl Fn(&Component, &Value, &Value) -> Result<()> + 'static,
    ) -> WatchCallback {
        let vm = self.downgrade();
        Rc::new(move |new: &Value, old: &Value| match vm.upgrade() {
            Some(vm) => callback(&vm, new, old),
            None => Ok(()),
        })
    }

    /// Mount the instance: create its render unit and patch the first
    /// render over `el` (replacing it), or create it detached.
    pub fn mount(&self, patcher: Patcher, el: Option<HostNode>) {
        *self.inner.patcher.borrow_mut() = Some(patcher);
        self.inner.el.set(el);
        if self.def().render().is_none() {
            warn(
                "Failed to mount component: template or render function not defined.",
                Some(self),
            );
        }
        self.call_hook(Hook::BeforeMount);

        let vm = self.downgrade();
        let (before, after) = (self.downgrade(), self.downgrade());
        let watcher = Watcher::builder(move || {
            if let Some(vm) = vm.upgrade() {
                let vnode = vm.render();
                vm.update(vnode);
            }
            Ok(Value::Undefined)
        })
        .owner(self)
        .expression(format!("render {}", format_component_name(self)))
        .before(move || {
            if let Some(vm) = before.upgrade() {
                if vm.is_mounted() && !vm.is_destroyed() {
                    vm.call_hook(Hook::BeforeUpdate);
                }
            }
        })
        .after(move || {
            if let Some(vm) = after.upgrade() {
                if vm.is_mounted() && !vm.is_destroyed() {
                    vm.call_hook(Hook::Updated);
                }
            }
        })
        .build_deferred();
        *self.inner.render_watcher.borrow_mut() = Some(watcher.clone());
        watcher.prime();

        // Child instances are mounted by their placeholder's insert hook.
        if self.placeholder().is_none() {
            self.inner.is_mounted.set(true);
            self.call_hook(Hook::Mounted);
        }
    }

    fn render(&self) -> VNode {
        let placeholder = self.placeholder();
        let result = {
            let _scope = InstanceScope::enter(&RENDERING, self);
            match self.def().render() {
                Some(render) => render(self),
                None => Ok(VNode::empty()),
            }
        };
        let vnode = match result {
            Ok(vnode) => vnode,
            Err(err) => {
                handle_error(err, Some(self), "render");
                self.vnode().unwrap_or_else(VNode::empty)
            }
        };
        vnode.set_parent(placeholder.as_ref());
        vnode
    }

    fn update(&self, vnode: VNode) {
        let previous = self.inner.vnode.replace(Some(vnode.clone()));
        let Some(patcher) = self.patcher() else { return };
        let el = {
            let _scope = InstanceScope::enter(&ACTIVE, self);
            match previous {
                None => patcher.patch(self.inner.el.get().map(PatchTarget::Node), Some(&vnode)),
                Some(previous) => patcher.patch(Some(PatchTarget::VNode(previous)), Some(&vnode)),
            }
        };
        self.inner.el.set(el);

        // A parent rendering this instance as its root shares the element.
        if let (Some(placeholder), Some(parent)) = (self.placeholder(), self.parent()) {
            if parent.vnode().is_some_and(|root| root.ptr_eq(&placeholder)) {
                parent.inner.el.set(el);
            }
        }
    }

    /// Queue a re-render.
    pub fn force_update(&self) {
        let watcher = self.inner.render_watcher.borrow().clone();
        if let Some(watcher) = watcher {
            watcher.update();
        }
    }

    /// Tear the instance down.
    pub fn destroy(&self) {
        if self.inner.is_being_destroyed.get() {
            return;
        }
        self.call_hook(Hook::BeforeDestroy);
        self.inner.is_being_destroyed.set(true);

        if let Some(parent) = self.parent() {
            if !parent.is_being_destroyed() && !self.def().is_abstract() {
                parent.inner.children.borrow_mut().retain(|c| c != self);
            }
        }

        let render_watcher = self.inner.render_watcher.borrow().clone();
        if let Some(watcher) = render_watcher {
            watcher.teardown();
        }
        let watchers = std::mem::take(&mut *self.inner.watchers.borrow_mut());
        for watcher in watchers.iter().rev() {
            watcher.teardown();
        }
        if let Some(ob) = self.data().observer() {
            ob.release_root();
        }

        self.inner.is_destroyed.set(true);
        if let (Some(vnode), Some(patcher)) = (self.vnode(), self.patcher()) {
            patcher.patch(Some(PatchTarget::VNode(vnode)), None);
        }
        self.call_hook(Hook::Destroyed);

        self.inner.events.borrow_mut().clear();
        self.inner.parent_listeners.borrow_mut().clear();
        tracing::trace!(target: "vireo", uid = self.uid(), "destroyed instance");
    }

    /// Run `callback` after the next flush, attributing errors to this
    /// instance.
    pub fn next_tick(&self, callback: impl FnOnce() -> Result<()> + 'static) {
        next_tick_for(self, callback);
    }

    /// Listen to events emitted by this instance.
    pub fn on(&self, event: impl Into<Rc<str>>, listener: impl Fn(&[Value]) -> Result<()> + 'static) {
        self.inner
            .events
            .borrow_mut()
            .entry(event.into())
            .or_default()
            .push(Rc::new(listener));
    }

    /// Remove listeners for `event`, or every listener with `None`.
    pub fn off(&self, event: Option<&str>) {
        let mut events = self.inner.events.borrow_mut();
        match event {
            Some(event) => {
                events.shift_remove(event);
            }
            None => events.clear(),
        }
    }

    /// Invoke the placeholder's listener and every `on` listener for
    /// `event`.
    pub fn emit(&self, event: &str, args: &[Value]) {
        let mut handlers: Vec<Listener> = Vec::new();
        if let Some(listener) = self.inner.parent_listeners.borrow().get(event) {
            handlers.push(listener.clone());
        }
        if let Some(listeners) = self.inner.events.borrow().get(event) {
            handlers.extend(listeners.iter().cloned());
        }
        if handlers.is_empty() {
            return;
        }
        let info = format!("event handler for \"{event}\"");
        for handler in handlers {
            invoke_with_error_handling(|| handler(args), Some(self), &info);
        }
    }

    pub fn refs(&self) -> Refs {
        self.inner.refs.borrow().clone()
    }

    pub fn ref_entry(&self, name: &str) -> Option<RefEntry> {
        self.inner.refs.borrow().get(name).cloned()
    }

    pub(crate) fn with_refs<R>(&self, f: impl FnOnce(&mut Refs) -> R) -> R {
        f(&mut self.inner.refs.borrow_mut())
    }

    /// Slot content passed by the parent, by slot name.
    pub fn slots(&self) -> IndexMap<Rc<str>, Vec<VNode>> {
        self.inner.slots.borrow().clone()
    }

    pub fn slot(&self, name: &str) -> Vec<VNode> {
        self.inner
            .slots
            .borrow()
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    /// The root host node of the rendered tree.
    pub fn el(&self) -> Option<HostNode> {
        self.inner.el.get()
    }

    /// The tree produced by the last render.
    pub fn vnode(&self) -> Option<VNode> {
        self.inner.vnode.borrow().clone()
    }

    /// The node standing for this instance in its parent's tree.
    pub fn placeholder(&self) -> Option<VNode> {
        self.inner
            .placeholder
            .borrow()
            .as_ref()
            .and_then(WeakVNode::upgrade)
    }

    fn set_placeholder(&self, placeholder: Option<&VNode>) {
        *self.inner.placeholder.borrow_mut() = placeholder.map(VNode::downgrade);
    }

    pub(crate) fn patcher(&self) -> Option<Patcher> {
        self.inner.patcher.borrow().clone()
    }

    pub fn render_watcher(&self) -> Option<Watcher> {
        self.inner.render_watcher.borrow().clone()
    }

    pub(crate) fn add_watcher(&self, watcher: Watcher) {
        self.inner.watchers.borrow_mut().push(watcher);
    }

    pub(crate) fn remove_watcher(&self, id: SubscriberId) {
        self.inner.watchers.borrow_mut().retain(|w| w.id() != id);
    }

    /// Number of units owned by the instance, render unit included.
    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.borrow().len()
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.is_mounted.get()
    }

    pub(crate) fn set_mounted(&self, mounted: bool) {
        self.inner.is_mounted.set(mounted);
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed.get()
    }

    pub fn is_being_destroyed(&self) -> bool {
        self.inner.is_being_destroyed.get()
    }

    /// Whether the instance is kept alive but currently deactivated.
    pub fn is_inactive(&self) -> bool {
        self.inner.inactive.get() == Some(true)
    }

    pub(crate) fn inactive_state(&self) -> Option<bool> {
        self.inner.inactive.get()
    }

    pub(crate) fn set_inactive(&self, inactive: bool) {
        self.inner.inactive.set(Some(inactive));
    }

    pub(crate) fn is_direct_inactive(&self) -> bool {
        self.inner.direct_inactive.get()
    }

    pub(crate) fn set_direct_inactive(&self, value: bool) {
        self.inner.direct_inactive.set(value);
    }

    /// Take new props, listeners and slot content from a re-rendered
    /// placeholder. Re-renders the instance if it has slot content.
    pub(crate) fn update_from_placeholder(&self, vnode: &VNode) {
        let _scope = UpdatingChildScope::enter();
        let new_children = vnode
            .component_options()
            .map(|o| o.children.clone())
            .unwrap_or_default();
        let had_children = !self.inner.render_children.borrow().is_empty();
        let needs_force_update = had_children || !new_children.is_empty();

        self.set_placeholder(Some(vnode));
        if let Some(root) = self.vnode() {
            root.set_parent(Some(vnode));
        }
        *self.inner.render_children.borrow_mut() = new_children;

        if let Some(data) = vnode.data() {
            *self.inner.parent_listeners.borrow_mut() = data.on.clone();
            if !self.def().props().is_empty() {
                toggle_observing(false);
                for (key, prop) in self.def().props() {
                    let value = self.resolve_prop(key, prop, &data.props);
                    self.inner.props.set(key, value);
                }
                toggle_observing(true);
            }
            *self.inner.props_data.borrow_mut() = data.props.clone();
        }

        if needs_force_update {
            let slots = resolve_slots(&self.inner.render_children.borrow());
            *self.inner.slots.borrow_mut() = slots;
            self.force_update();
        }
    }

    /// Run the handlers for `hook`, then emit `hook:<name>`.
    pub(crate) fn call_hook(&self, hook: Hook) {
        let _ctx = ReactiveContext::untracked();
        let info = format!("{hook} hook");
        for handler in self.def().hooks(hook) {
            invoke_with_error_handling(|| handler(self), Some(self), &info);
        }
        self.emit(&format!("hook:{hook}"), &[]);
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("uid", &self.inner.uid)
            .field("name", &self.def().name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::error::Error;
    use crate::scheduler::flush_ticks;
    use crate::vdom::{MemoryHost, NodeOps};

    fn counter_def() -> Rc<ComponentDef> {
        ComponentDef::builder("Counter")
            .prop("label", PropDef::new().default_value("count"))
            .data(|_| Ok(serde_json::json!({ "count": 0 }).into()))
            .computed("double", |vm| {
                let n = vm.get("count").as_number().unwrap_or_default();
                Ok(Value::from(n * 2.0))
            })
            .render(|vm| {
                let text = format!("{}: {}", vm.get("label"), vm.get("count"));
                Ok(VNode::element("span").child(VNode::text(text)).build())
            })
            .build()
    }

    fn mount(vm: &Component) -> Rc<MemoryHost> {
        let host = Rc::new(MemoryHost::new());
        let container = host.create_element("div");
        let body = host.create_element("body");
        host.append_child(body, container);
        vm.mount(Patcher::new(host.clone()), Some(container));
        host
    }

    #[test]
    fn get_resolves_props_data_and_computed() {
        let vm = Component::new(&counter_def());
        assert_eq!(vm.get("label"), Value::from("count"));
        assert_eq!(vm.get("count"), Value::from(0));
        vm.set("count", 21);
        assert_eq!(vm.get("double"), Value::from(42));
        assert_eq!(vm.get("missing"), Value::Undefined);
    }

    #[test]
    fn root_props_come_from_with_props() {
        let vm = Component::with_props(&counter_def(), [("label", "clicks")]);
        assert_eq!(vm.get("label"), Value::from("clicks"));
    }

    #[test]
    fn mount_renders_and_updates_after_flush() {
        let vm = Component::new(&counter_def());
        let host = mount(&vm);
        let el = vm.el().expect("mounted");
        assert_eq!(host.to_html(el), "<span>count: 0</span>");
        assert!(vm.is_mounted());

        vm.set("count", 1);
        assert_eq!(host.text_content(el), "count: 0");
        flush_ticks();
        assert_eq!(host.text_content(el), "count: 1");
    }

    #[test]
    fn lifecycle_hooks_run_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut builder = ComponentDef::builder("Hooks")
            .data(|_| Ok(serde_json::json!({ "n": 0 }).into()))
            .render(|vm| Ok(VNode::text(vm.get("n").to_text())));
        for hook in [
            Hook::BeforeCreate,
            Hook::Created,
            Hook::BeforeMount,
            Hook::Mounted,
            Hook::BeforeUpdate,
            Hook::Updated,
            Hook::BeforeDestroy,
            Hook::Destroyed,
        ] {
            let log = log.clone();
            builder = builder.hook(hook, move |_| {
                log.borrow_mut().push(hook.name());
                Ok(())
            });
        }
        let vm = Component::new(&builder.build());
        mount(&vm);
        vm.set("n", 1);
        flush_ticks();
        vm.destroy();

        assert_eq!(
            *log.borrow(),
            vec![
                "beforeCreate",
                "created",
                "beforeMount",
                "mounted",
                "beforeUpdate",
                "updated",
                "beforeDestroy",
                "destroyed"
            ]
        );
    }

    #[test]
    fn destroy_tears_down_every_unit() {
        let vm = Component::new(&counter_def());
        mount(&vm);
        let render = vm.render_watcher().expect("render unit");
        vm.destroy();

        assert!(vm.is_destroyed());
        assert!(!render.is_active());
        assert_eq!(vm.watcher_count(), 0);
        vm.set("count", 5);
        assert_eq!(crate::scheduler::pending_count(), 0);
    }

    #[test]
    fn failing_render_keeps_previous_tree() {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        config::update(|c| {
            c.error_handler = Some(Rc::new(move |_: &Error, _: Option<&Component>, info: &str| {
                sink.borrow_mut().push(info.to_string());
                Ok(())
            }));
        });
        let def = ComponentDef::builder("Flaky")
            .data(|_| Ok(serde_json::json!({ "fail": false }).into()))
            .render(|vm| {
                if vm.get("fail").is_truthy() {
                    return Err(Error::msg("boom"));
                }
                Ok(VNode::element("p").text("ok").build())
            })
            .build();
        let vm = Component::new(&def);
        let host = mount(&vm);
        vm.set("fail", true);
        flush_ticks();

        assert_eq!(*errors.borrow(), vec!["render"]);
        assert_eq!(host.to_html(vm.el().expect("el")), "<p>ok</p>");
    }

    #[test]
    fn events_reach_listeners() {
        let vm = Component::new(&counter_def());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        vm.on("change", move |args| {
            sink.borrow_mut().push(args[0].clone());
            Ok(())
        });
        vm.emit("change", &[Value::from(3)]);
        vm.off(Some("change"));
        vm.emit("change", &[Value::from(4)]);

        assert_eq!(*seen.borrow(), vec![Value::from(3)]);
    }

    #[test]
    fn declared_watch_sees_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let def = ComponentDef::builder("Watching")
            .data(|_| Ok(serde_json::json!({ "user": { "name": "ann" } }).into()))
            .watch(
                "user.name",
                move |_, new, old| {
                    sink.borrow_mut().push(format!("{old} -> {new}"));
                    Ok(())
                },
                WatchOptions::default(),
            )
            .build();
        let vm = Component::new(&def);
        let user = vm.get("user");
        user.as_object().expect("object").set("name", "bob");
        flush_ticks();

        assert_eq!(*seen.borrow(), vec!["ann -> bob"]);
    }

    #[test]
    fn computed_without_setter_warns() {
        let warnings = Rc::new(RefCell::new(Vec::new()));
        let sink = warnings.clone();
        config::update(|c| {
            c.warn_handler = Some(Rc::new(move |msg: &str, _: Option<&Component>, _: &str| {
                sink.borrow_mut().push(msg.to_string());
            }));
        });
        let vm = Component::new(&counter_def());
        vm.set("double", 4);

        assert_eq!(
            *warnings.borrow(),
            vec!["Computed property \"double\" was assigned to but it has no setter."]
        );
    }
}
