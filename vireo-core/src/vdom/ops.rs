//! Host Operations
//!
//! The reconciler never touches a host API directly. It is parameterized
//! over a [`NodeOps`] table for structural operations and a list of
//! [`PatchModule`]s that sync node payloads (attributes, listeners, refs...).
//!
//! Host nodes are opaque [`HostNode`] handles; what they refer to is up to
//! the host.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::vnode::VNode;

/// Opaque handle to a node owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostNode(u64);

impl HostNode {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HostNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Structural operations on the host tree.
pub trait NodeOps {
    fn create_element(&self, tag: &str) -> HostNode;
    fn create_text_node(&self, text: &str) -> HostNode;
    fn create_comment(&self, text: &str) -> HostNode;
    /// Insert `node` into `parent` before `reference`, or at the end when
    /// `reference` is `None`. Moves the node if it is already attached.
    fn insert_before(&self, parent: HostNode, node: HostNode, reference: Option<HostNode>);
    fn remove_child(&self, parent: HostNode, child: HostNode);
    fn append_child(&self, parent: HostNode, child: HostNode);
    fn parent_node(&self, node: HostNode) -> Option<HostNode>;
    fn next_sibling(&self, node: HostNode) -> Option<HostNode>;
    fn tag_name(&self, node: HostNode) -> String;
    /// Replace the node's content with text.
    fn set_text_content(&self, node: HostNode, text: &str);
}

/// Per-concern payload sync, run at fixed points of the patch.
///
/// Every method defaults to doing nothing; `remove` must eventually call
/// [`RemoveCallback::done`] exactly once.
pub trait PatchModule {
    /// A node was created. `empty` is the shared empty node.
    fn create(&self, _empty: &VNode, _vnode: &VNode) {}

    /// A node is being patched in place.
    fn update(&self, _old: &VNode, _vnode: &VNode) {}

    /// A node is being torn down.
    fn destroy(&self, _vnode: &VNode) {}

    /// A node is about to be detached. Call `done.done()` once it may go.
    fn remove(&self, _vnode: &VNode, done: &Rc<RemoveCallback>) {
        done.done();
    }

    /// A cached component node was re-inserted.
    fn activate(&self, _empty: &VNode, _vnode: &VNode) {}
}

/// Counts outstanding removal listeners and detaches the node once all of
/// them have reported.
pub struct RemoveCallback {
    ops: Rc<dyn NodeOps>,
    node: Option<HostNode>,
    listeners: Cell<usize>,
}

impl RemoveCallback {
    pub(crate) fn new(ops: Rc<dyn NodeOps>, node: Option<HostNode>, listeners: usize) -> Rc<Self> {
        Rc::new(Self {
            ops,
            node,
            listeners: Cell::new(listeners),
        })
    }

    pub(crate) fn add_listeners(&self, count: usize) {
        self.listeners.set(self.listeners.get() + count);
    }

    /// Report that one listener is finished with the node.
    pub fn done(&self) {
        let remaining = self.listeners.get().saturating_sub(1);
        self.listeners.set(remaining);
        if remaining == 0 {
            if let Some(node) = self.node {
                if let Some(parent) = self.ops.parent_node(node) {
                    self.ops.remove_child(parent, node);
                }
            }
        }
    }

    pub fn remaining(&self) -> usize {
        self.listeners.get()
    }
}
