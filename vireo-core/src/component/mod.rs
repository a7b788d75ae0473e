//! Components
//!
//! A component pairs reactive state with a render function. Its render unit
//! re-renders whenever state it read changes, and the resulting tree is
//! patched over the previous one. Child components appear in a render as
//! placeholder nodes built with [`VNode::component`](crate::vdom::VNode::component);
//! the reconciler instantiates, updates and destroys them through the
//! placeholder hooks.

mod def;
pub(crate) mod hooks;
mod instance;

pub use def::{
    ComponentDef, ComponentDefBuilder, ComponentKind, ComputedDef, ComputedGetter, ComputedSetter,
    DataFn, ErrorCapturedFn, Hook, HookFn, PropDef, PropDefault, PropFactory, RenderFn, WatchDef,
    WatchHandler,
};
pub(crate) use hooks::activate_child_component;
pub use instance::{current_rendering_instance, Component, WeakComponent};
