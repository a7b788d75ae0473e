//! Virtual DOM
//!
//! Render functions describe output as [`VNode`] trees; the [`Patcher`]
//! reconciles successive trees against a host through [`NodeOps`].
//!
//! # Modules
//!
//! - `vnode`: node descriptions, builders and the [`same_vnode`] identity
//!   rule
//! - `patch`: the reconciler
//! - `ops`: the host operation table and payload module hooks
//! - `refs`: ref registration on the rendering instance
//! - `memory`: an in-memory host for tests and tooling

mod memory;
mod ops;
mod patch;
mod refs;
mod vnode;

pub use memory::{AttrsModule, HostOp, HostStats, MemoryHost};
pub use ops::{HostNode, NodeOps, PatchModule, RemoveCallback};
pub use patch::{PatchTarget, Patcher};
pub use refs::{RefEntry, RefTarget, Refs};
pub use vnode::{
    same_vnode, ComponentOptions, Key, Listener, RemoveHook, VNode, VNodeBuilder, VNodeData,
    VNodeHook, VNodeHooks, VNodePairHook, WeakVNode,
};
