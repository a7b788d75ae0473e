//! Template Refs
//!
//! A node rendered with a ref name is registered on the instance that
//! rendered it, under that name. Refs marked `in_for` collect into a list.

use std::rc::Rc;

use indexmap::IndexMap;

use super::ops::{HostNode, PatchModule};
use super::vnode::VNode;
use crate::component::Component;

/// What a ref points at.
#[derive(Debug, Clone, PartialEq)]
pub enum RefTarget {
    Node(HostNode),
    Component(Component),
}

impl RefTarget {
    pub fn as_node(&self) -> Option<HostNode> {
        match self {
            RefTarget::Node(node) => Some(*node),
            RefTarget::Component(_) => None,
        }
    }

    pub fn as_component(&self) -> Option<&Component> {
        match self {
            RefTarget::Component(vm) => Some(vm),
            RefTarget::Node(_) => None,
        }
    }
}

/// A registered ref.
#[derive(Debug, Clone, PartialEq)]
pub enum RefEntry {
    Single(RefTarget),
    Many(Vec<RefTarget>),
}

pub type Refs = IndexMap<Rc<str>, RefEntry>;

/// Keeps refs in sync with the tree.
pub(crate) struct RefModule;

impl PatchModule for RefModule {
    fn create(&self, _empty: &VNode, vnode: &VNode) {
        register_ref(vnode, false);
    }

    fn update(&self, old: &VNode, vnode: &VNode) {
        let name = |v: &VNode| v.data().and_then(|d| d.ref_name.clone());
        if name(old) != name(vnode) {
            register_ref(old, true);
            register_ref(vnode, false);
        }
    }

    fn destroy(&self, vnode: &VNode) {
        register_ref(vnode, true);
    }
}

/// Add (or with `removal`, remove) the ref for `vnode`.
pub(crate) fn register_ref(vnode: &VNode, removal: bool) {
    let Some(data) = vnode.data() else { return };
    let Some(name) = data.ref_name.clone() else { return };
    let Some(vm) = vnode.context() else { return };
    let target = match (vnode.component_instance(), vnode.elm()) {
        (Some(instance), _) => RefTarget::Component(instance),
        (None, Some(elm)) => RefTarget::Node(elm),
        (None, None) => return,
    };

    vm.with_refs(|refs| {
        if removal {
            let clear = match refs.get_mut(&name) {
                Some(RefEntry::Many(list)) => {
                    list.retain(|t| *t != target);
                    false
                }
                Some(RefEntry::Single(current)) => *current == target,
                None => false,
            };
            if clear {
                refs.shift_remove(&name);
            }
        } else if data.ref_in_for {
            match refs.get_mut(&name) {
                Some(RefEntry::Many(list)) => {
                    if !list.contains(&target) {
                        list.push(target);
                    }
                }
                _ => {
                    refs.insert(name, RefEntry::Many(vec![target]));
                }
            }
        } else {
            refs.insert(name, RefEntry::Single(target));
        }
    });
}
