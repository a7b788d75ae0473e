//! Component Definitions
//!
//! A [`ComponentDef`] is the immutable description every instance of a
//! component is created from: props, data factory, computed properties,
//! watches, render function and lifecycle hooks. Build one with
//! [`ComponentDef::builder`].

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::instance::Component;
use crate::error::{Error, ErrorFlow, Result};
use crate::reactive::{Value, WatchOptions};
use crate::vdom::VNode;

pub type RenderFn = Rc<dyn Fn(&Component) -> Result<VNode>>;
pub type DataFn = Rc<dyn Fn(&Component) -> Result<Value>>;
pub type ComputedGetter = Rc<dyn Fn(&Component) -> Result<Value>>;
pub type ComputedSetter = Rc<dyn Fn(&Component, Value) -> Result<()>>;
pub type HookFn = Rc<dyn Fn(&Component) -> Result<()>>;
pub type WatchHandler = Rc<dyn Fn(&Component, &Value, &Value) -> Result<()>>;
pub type ErrorCapturedFn = Rc<dyn Fn(&Error, &Component, &str) -> Result<ErrorFlow>>;
pub type PropFactory = Rc<dyn Fn() -> Value>;

/// Whether instances take part in the host parent chain.
///
/// Abstract components (caching wrappers and the like) are part of the
/// instance tree for lifecycle purposes but are skipped when children look
/// for their parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentKind {
    #[default]
    Normal,
    Abstract,
}

/// Lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    BeforeCreate,
    Created,
    BeforeMount,
    Mounted,
    BeforeUpdate,
    Updated,
    BeforeDestroy,
    Destroyed,
    Activated,
    Deactivated,
}

impl Hook {
    /// Name used in diagnostics and `hook:` events.
    pub fn name(self) -> &'static str {
        match self {
            Hook::BeforeCreate => "beforeCreate",
            Hook::Created => "created",
            Hook::BeforeMount => "beforeMount",
            Hook::Mounted => "mounted",
            Hook::BeforeUpdate => "beforeUpdate",
            Hook::Updated => "updated",
            Hook::BeforeDestroy => "beforeDestroy",
            Hook::Destroyed => "destroyed",
            Hook::Activated => "activated",
            Hook::Deactivated => "deactivated",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default for an absent prop.
#[derive(Clone)]
pub enum PropDefault {
    /// Shared as-is by every instance.
    Value(Value),
    /// Called once per instance.
    Factory(PropFactory),
}

/// A declared prop.
#[derive(Clone, Default)]
pub struct PropDef {
    pub default: Option<PropDefault>,
    pub required: bool,
}

impl PropDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(PropDefault::Value(value.into()));
        self
    }

    /// Produce a fresh default per instance. Use this for object and array
    /// defaults.
    pub fn default_factory(mut self, factory: impl Fn() -> Value + 'static) -> Self {
        self.default = Some(PropDefault::Factory(Rc::new(factory)));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A computed property.
#[derive(Clone)]
pub struct ComputedDef {
    pub get: ComputedGetter,
    pub set: Option<ComputedSetter>,
}

/// A declared watch on a dotted path of the instance.
#[derive(Clone)]
pub struct WatchDef {
    pub path: String,
    pub handler: WatchHandler,
    pub options: WatchOptions,
}

static NEXT_DEF_ID: AtomicU64 = AtomicU64::new(1);

/// Description of a component.
pub struct ComponentDef {
    id: u64,
    name: String,
    kind: ComponentKind,
    props: IndexMap<Rc<str>, PropDef>,
    data: Option<DataFn>,
    computed: IndexMap<Rc<str>, ComputedDef>,
    watch: Vec<WatchDef>,
    render: Option<RenderFn>,
    hooks: HashMap<Hook, SmallVec<[HookFn; 2]>>,
    error_captured: SmallVec<[ErrorCapturedFn; 1]>,
}

impl ComponentDef {
    pub fn builder(name: impl Into<String>) -> ComponentDefBuilder {
        ComponentDefBuilder {
            def: ComponentDef {
                id: NEXT_DEF_ID.fetch_add(1, Ordering::Relaxed),
                name: name.into(),
                kind: ComponentKind::Normal,
                props: IndexMap::new(),
                data: None,
                computed: IndexMap::new(),
                watch: Vec::new(),
                render: None,
                hooks: HashMap::new(),
                error_captured: SmallVec::new(),
            },
        }
    }

    /// Unique per definition.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == ComponentKind::Abstract
    }

    pub fn props(&self) -> &IndexMap<Rc<str>, PropDef> {
        &self.props
    }

    pub fn data(&self) -> Option<&DataFn> {
        self.data.as_ref()
    }

    pub fn computed(&self) -> &IndexMap<Rc<str>, ComputedDef> {
        &self.computed
    }

    pub fn watches(&self) -> &[WatchDef] {
        &self.watch
    }

    pub fn render(&self) -> Option<&RenderFn> {
        self.render.as_ref()
    }

    /// Handlers registered for `hook`, in registration order.
    pub fn hooks(&self, hook: Hook) -> &[HookFn] {
        self.hooks.get(&hook).map(|h| h.as_slice()).unwrap_or(&[])
    }

    pub fn error_captured_hooks(&self) -> &[ErrorCapturedFn] {
        &self.error_captured
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("props", &self.props.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ComponentDef`].
pub struct ComponentDefBuilder {
    def: ComponentDef,
}

impl ComponentDefBuilder {
    pub fn kind(mut self, kind: ComponentKind) -> Self {
        self.def.kind = kind;
        self
    }

    pub fn prop(mut self, name: impl Into<Rc<str>>, prop: PropDef) -> Self {
        self.def.props.insert(name.into(), prop);
        self
    }

    /// Factory for the instance's root data. Must return an object.
    pub fn data(mut self, data: impl Fn(&Component) -> Result<Value> + 'static) -> Self {
        self.def.data = Some(Rc::new(data));
        self
    }

    pub fn computed(
        mut self,
        name: impl Into<Rc<str>>,
        get: impl Fn(&Component) -> Result<Value> + 'static,
    ) -> Self {
        self.def.computed.insert(
            name.into(),
            ComputedDef {
                get: Rc::new(get),
                set: None,
            },
        );
        self
    }

    pub fn computed_with_setter(
        mut self,
        name: impl Into<Rc<str>>,
        get: impl Fn(&Component) -> Result<Value> + 'static,
        set: impl Fn(&Component, Value) -> Result<()> + 'static,
    ) -> Self {
        self.def.computed.insert(
            name.into(),
            ComputedDef {
                get: Rc::new(get),
                set: Some(Rc::new(set)),
            },
        );
        self
    }

    pub fn watch(
        mut self,
        path: impl Into<String>,
        handler: impl Fn(&Component, &Value, &Value) -> Result<()> + 'static,
        options: WatchOptions,
    ) -> Self {
        self.def.watch.push(WatchDef {
            path: path.into(),
            handler: Rc::new(handler),
            options,
        });
        self
    }

    pub fn render(mut self, render: impl Fn(&Component) -> Result<VNode> + 'static) -> Self {
        self.def.render = Some(Rc::new(render));
        self
    }

    pub fn hook(mut self, hook: Hook, handler: impl Fn(&Component) -> Result<()> + 'static) -> Self {
        self.def.hooks.entry(hook).or_default().push(Rc::new(handler));
        self
    }

    /// Called with errors from descendants. Return [`ErrorFlow::Stop`] to
    /// keep the error from propagating further.
    pub fn error_captured(
        mut self,
        handler: impl Fn(&Error, &Component, &str) -> Result<ErrorFlow> + 'static,
    ) -> Self {
        self.def.error_captured.push(Rc::new(handler));
        self
    }

    pub fn build(self) -> Rc<ComponentDef> {
        Rc::new(self.def)
    }
}
