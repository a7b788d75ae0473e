//! Placeholder Hooks
//!
//! The reconciler calls these for component placeholder nodes at fixed
//! points of a patch:
//!
//! - `init` when the placeholder is created: instantiate and mount the
//!   child, or reactivate a kept-alive one.
//! - `prepatch` when the placeholder is patched in place: hand new props,
//!   listeners and slot content to the existing child.
//! - `insert` once the patch attached everything: run `mounted`, or
//!   activate a kept-alive child.
//! - `destroy` when the placeholder is torn down: destroy the child, or
//!   deactivate it if it is kept alive.

use std::rc::Rc;

use indexmap::IndexMap;

use super::def::Hook;
use super::instance::{active_instance, Component};
use crate::scheduler::queue_activated_component;
use crate::vdom::{Patcher, VNode};

pub(crate) fn init(vnode: &VNode, patcher: &Patcher) {
    if let Some(instance) = vnode.component_instance() {
        if !instance.is_destroyed() && vnode.is_keep_alive() {
            // Kept-alive: treat as a patch of itself.
            prepatch(vnode, vnode);
            return;
        }
    }
    let Some(options) = vnode.component_options() else { return };
    let parent = active_instance();
    let child = Component::create_for_vnode(options.def.clone(), parent.as_ref(), vnode);
    vnode.set_component_instance(Some(child.clone()));
    child.mount(patcher.clone(), None);
}

pub(crate) fn prepatch(old: &VNode, vnode: &VNode) {
    let Some(instance) = old.component_instance() else { return };
    vnode.set_component_instance(Some(instance.clone()));
    instance.update_from_placeholder(vnode);
}

pub(crate) fn insert(vnode: &VNode) {
    let Some(instance) = vnode.component_instance() else { return };
    if !instance.is_mounted() {
        instance.set_mounted(true);
        instance.call_hook(Hook::Mounted);
    }
    if vnode.is_keep_alive() {
        if vnode.context().is_some_and(|context| context.is_mounted()) {
            // During an update the instance's children may change again
            // before the flush ends; activate once it does.
            queue_activated_component(instance);
        } else {
            activate_child_component(&instance, true);
        }
    }
}

pub(crate) fn destroy(vnode: &VNode) {
    let Some(instance) = vnode.component_instance() else { return };
    if instance.is_destroyed() {
        return;
    }
    if vnode.is_keep_alive() {
        deactivate_child_component(&instance, true);
    } else {
        instance.destroy();
    }
}

/// Group slot content by slot name. Unnamed content goes to `default`;
/// slots holding only whitespace text and comments are dropped.
pub(crate) fn resolve_slots(children: &[VNode]) -> IndexMap<Rc<str>, Vec<VNode>> {
    let mut slots: IndexMap<Rc<str>, Vec<VNode>> = IndexMap::new();
    for child in children {
        let name = child
            .data()
            .and_then(|d| d.slot.clone())
            .unwrap_or_else(|| Rc::from("default"));
        slots.entry(name).or_default().push(child.clone());
    }
    slots.retain(|_, nodes| !nodes.iter().all(is_whitespace));
    slots
}

fn is_whitespace(vnode: &VNode) -> bool {
    (vnode.is_comment() && !vnode.is_async_placeholder())
        || (vnode.is_text() && vnode.text_content().unwrap_or_default().trim().is_empty())
}

fn is_in_inactive_tree(vm: &Component) -> bool {
    let mut current = vm.parent();
    while let Some(parent) = current {
        if parent.is_inactive() {
            return true;
        }
        current = parent.parent();
    }
    false
}

/// Activate a kept-alive instance and its subtree. `direct` marks the
/// instance that was itself re-inserted.
pub(crate) fn activate_child_component(vm: &Component, direct: bool) {
    if direct {
        vm.set_direct_inactive(false);
        if is_in_inactive_tree(vm) {
            return;
        }
    } else if vm.is_direct_inactive() {
        return;
    }
    if vm.inactive_state() != Some(false) {
        vm.set_inactive(false);
        for child in vm.children() {
            activate_child_component(&child, false);
        }
        vm.call_hook(Hook::Activated);
    }
}

/// Deactivate a kept-alive instance and its subtree.
pub(crate) fn deactivate_child_component(vm: &Component, direct: bool) {
    if direct {
        vm.set_direct_inactive(true);
        if is_in_inactive_tree(vm) {
            return;
        }
    }
    if !vm.is_inactive() {
        vm.set_inactive(true);
        for child in vm.children() {
            deactivate_child_component(&child, false);
        }
        vm.call_hook(Hook::Deactivated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_group_by_name_and_drop_blank_content() {
        let header = VNode::element("h1").slot("header").build();
        let body = VNode::element("p").build();
        let blank = VNode::text("  ");
        let note = VNode::comment("note");
        let footer_blank = VNode::text(" ");
        let footer = VNode::element("span").slot("footer").build();

        let slots = resolve_slots(&[header.clone(), body.clone(), blank]);
        assert_eq!(slots.keys().map(|k| &**k).collect::<Vec<_>>(), vec!["header", "default"]);
        assert_eq!(slots["default"].len(), 2);

        let slots = resolve_slots(&[note, footer_blank]);
        assert!(slots.is_empty());

        let slots = resolve_slots(&[footer]);
        assert!(slots.contains_key("footer"));
    }
}
