//! Reconciliation
//!
//! [`Patcher::patch`] turns the difference between two virtual trees into a
//! minimal sequence of host operations.
//!
//! # Algorithm
//!
//! - Nodes that are [`same_vnode`] are patched in place: payload modules
//!   run, then children are reconciled.
//! - Children lists are reconciled from both ends at once. Each step tries
//!   four pairings (start/start, end/end, old start/new end, old end/new
//!   start) before falling back to a key lookup. Old nodes that were moved
//!   out of the middle are tombstoned and skipped.
//! - Nodes that are not the same are replaced: the new subtree is created
//!   next to the old one, then the old one is removed.
//!
//! Insert hooks are deferred until the whole patch is done, so they observe
//! a fully attached tree. A component's own first patch hands its queue to
//! the placeholder, which replays it as part of the parent's patch.

use std::collections::HashMap;
use std::rc::Rc;

use super::ops::{HostNode, NodeOps, PatchModule, RemoveCallback};
use super::refs::{register_ref, RefModule};
use super::vnode::{same_vnode, Key, VNode};
use crate::component::hooks;
use crate::config;
use crate::debug::warn;

/// What to patch over.
#[derive(Debug, Clone)]
pub enum PatchTarget {
    /// An existing host node that is not backed by a virtual tree.
    Node(HostNode),
    /// The previously rendered tree.
    VNode(VNode),
}

/// A reconciler bound to a host.
#[derive(Clone)]
pub struct Patcher {
    ops: Rc<dyn NodeOps>,
    modules: Rc<Vec<Rc<dyn PatchModule>>>,
    empty: VNode,
}

impl Patcher {
    /// A patcher with ref bookkeeping as its only payload module.
    pub fn new(ops: Rc<dyn NodeOps>) -> Self {
        Self {
            ops,
            modules: Rc::new(vec![Rc::new(RefModule)]),
            empty: VNode::empty(),
        }
    }

    /// Add a payload module. Modules run in registration order.
    pub fn with_module(self, module: impl PatchModule + 'static) -> Self {
        let mut modules = (*self.modules).clone();
        modules.push(Rc::new(module));
        Self {
            modules: Rc::new(modules),
            ..self
        }
    }

    pub fn ops(&self) -> &Rc<dyn NodeOps> {
        &self.ops
    }

    /// Reconcile `vnode` against `old`.
    ///
    /// - no `vnode`: tear down `old`.
    /// - no `old`: create `vnode` detached (a component's first render).
    /// - otherwise patch in place or replace.
    ///
    /// Returns the root host node of the result.
    pub fn patch(&self, old: Option<PatchTarget>, vnode: Option<&VNode>) -> Option<HostNode> {
        let _span = tracing::trace_span!("patch").entered();
        let Some(vnode) = vnode else {
            if let Some(PatchTarget::VNode(old)) = old {
                self.invoke_destroy_hook(&old);
            }
            return None;
        };

        let mut queue = Vec::new();
        let mut initial = false;
        match old {
            None => {
                initial = true;
                self.create_elm(vnode, &mut queue, None, None, false, false);
            }
            Some(PatchTarget::VNode(old)) if same_vnode(&old, vnode) => {
                self.patch_vnode(&old, vnode, &mut queue, false);
            }
            Some(target) => self.replace(target, vnode, &mut queue),
        }

        self.invoke_insert_hook(vnode, queue, initial);
        vnode.elm()
    }

    fn replace(&self, target: PatchTarget, vnode: &VNode, queue: &mut Vec<VNode>) {
        let old = match target {
            PatchTarget::Node(node) => VNode::empty_at(&self.ops.tag_name(node), node),
            PatchTarget::VNode(old) => old,
        };
        let old_elm = old.elm();
        let parent_elm = old_elm.and_then(|elm| self.ops.parent_node(elm));
        let reference = old_elm.and_then(|elm| self.ops.next_sibling(elm));

        self.create_elm(vnode, queue, parent_elm, reference, false, false);

        // The root element changed: placeholders up the chain of
        // components rendering each other as root must follow.
        if let Some(mut ancestor) = vnode.parent() {
            let patchable = is_patchable(vnode);
            loop {
                for module in self.modules.iter() {
                    module.destroy(&ancestor);
                }
                ancestor.set_elm(vnode.elm());
                if patchable {
                    for module in self.modules.iter() {
                        module.create(&self.empty, &ancestor);
                    }
                } else {
                    register_ref(&ancestor, false);
                }
                match ancestor.parent() {
                    Some(next) => ancestor = next,
                    None => break,
                }
            }
        }

        if parent_elm.is_some() {
            self.remove_vnodes(std::slice::from_ref(&old));
        } else if old.tag().is_some() {
            self.invoke_destroy_hook(&old);
        }
    }

    /// Create the host subtree for `vnode` and insert it. `owned` marks
    /// nodes living in a children list; an already realized node there is
    /// cloned first. Returns the node that now owns the subtree.
    fn create_elm(
        &self,
        vnode: &VNode,
        queue: &mut Vec<VNode>,
        parent: Option<HostNode>,
        reference: Option<HostNode>,
        nested: bool,
        owned: bool,
    ) -> VNode {
        let vnode = if owned && vnode.elm().is_some() {
            vnode.clone_node()
        } else {
            vnode.clone()
        };
        vnode.set_root_insert(!nested);

        if self.create_component(&vnode, queue, parent, reference) {
            return vnode;
        }

        match vnode.tag() {
            Some(tag) => {
                let elm = self.ops.create_element(tag);
                tracing::trace!(target: "vireo", %elm, tag, "create element");
                vnode.set_elm(Some(elm));
                self.create_children(&vnode, elm, queue);
                if vnode.data().is_some() {
                    self.invoke_create_hooks(&vnode, queue);
                }
                self.insert(parent, elm, reference);
            }
            None if vnode.is_comment() => {
                let elm = self.ops.create_comment(vnode.text_content().unwrap_or_default());
                vnode.set_elm(Some(elm));
                self.insert(parent, elm, reference);
            }
            None => {
                let elm = self.ops.create_text_node(vnode.text_content().unwrap_or_default());
                vnode.set_elm(Some(elm));
                self.insert(parent, elm, reference);
            }
        }
        vnode
    }

    fn create_component(
        &self,
        vnode: &VNode,
        queue: &mut Vec<VNode>,
        parent: Option<HostNode>,
        reference: Option<HostNode>,
    ) -> bool {
        if !vnode.is_component() {
            return false;
        }
        let reactivated = vnode.component_instance().is_some() && vnode.is_keep_alive();
        hooks::init(vnode, self);

        if vnode.component_instance().is_none() {
            return false;
        }
        self.init_component(vnode, queue);
        if let Some(elm) = vnode.elm() {
            self.insert(parent, elm, reference);
        }
        if reactivated {
            for module in self.modules.iter() {
                module.activate(&self.empty, vnode);
            }
        }
        true
    }

    fn init_component(&self, vnode: &VNode, queue: &mut Vec<VNode>) {
        if let Some(pending) = vnode.take_pending_insert() {
            queue.extend(pending);
        }
        vnode.set_elm(vnode.component_instance().and_then(|vm| vm.el()));
        if is_patchable(vnode) {
            self.invoke_create_hooks(vnode, queue);
        } else {
            // Empty component root: only the ref needs registering.
            register_ref(vnode, false);
            queue.push(vnode.clone());
        }
    }

    fn create_children(&self, vnode: &VNode, elm: HostNode, queue: &mut Vec<VNode>) {
        let children = vnode.children_vec();
        if !children.is_empty() {
            self.check_duplicate_keys(&children, vnode);
            let created: Vec<VNode> = children
                .iter()
                .map(|child| self.create_elm(child, queue, Some(elm), None, true, true))
                .collect();
            if created.iter().zip(&children).any(|(a, b)| !a.ptr_eq(b)) {
                vnode.set_children(created);
            }
        } else if let Some(text) = vnode.text_content() {
            let text = self.ops.create_text_node(text);
            self.ops.append_child(elm, text);
        }
    }

    fn invoke_create_hooks(&self, vnode: &VNode, queue: &mut Vec<VNode>) {
        for module in self.modules.iter() {
            module.create(&self.empty, vnode);
        }
        if let Some(data) = vnode.data() {
            if let Some(create) = &data.hooks.create {
                create(&self.empty, vnode);
            }
            if vnode.is_component() || data.hooks.insert.is_some() {
                queue.push(vnode.clone());
            }
        }
    }

    fn insert(&self, parent: Option<HostNode>, elm: HostNode, reference: Option<HostNode>) {
        let Some(parent) = parent else { return };
        match reference {
            Some(reference) => {
                if self.ops.parent_node(reference) == Some(parent) {
                    self.ops.insert_before(parent, elm, Some(reference));
                }
            }
            None => self.ops.append_child(parent, elm),
        }
    }

    fn add_vnodes(
        &self,
        parent: HostNode,
        reference: Option<HostNode>,
        vnodes: &[VNode],
        queue: &mut Vec<VNode>,
    ) -> Vec<VNode> {
        vnodes
            .iter()
            .map(|vnode| self.create_elm(vnode, queue, Some(parent), reference, false, true))
            .collect()
    }

    fn remove_vnodes(&self, vnodes: &[VNode]) {
        for vnode in vnodes {
            if vnode.tag().is_some() {
                self.remove_and_invoke_remove_hook(vnode, None);
                self.invoke_destroy_hook(vnode);
            } else {
                self.remove_node(vnode.elm());
            }
        }
    }

    fn remove_node(&self, elm: Option<HostNode>) {
        let Some(elm) = elm else { return };
        if let Some(parent) = self.ops.parent_node(elm) {
            tracing::trace!(target: "vireo", %elm, "remove");
            self.ops.remove_child(parent, elm);
        }
    }

    fn remove_and_invoke_remove_hook(&self, vnode: &VNode, callback: Option<Rc<RemoveCallback>>) {
        if callback.is_none() && vnode.data().is_none() {
            self.remove_node(vnode.elm());
            return;
        }

        let listeners = self.modules.len() + 1;
        let callback = match callback {
            Some(callback) => {
                callback.add_listeners(listeners);
                callback
            }
            None => {
                tracing::trace!(target: "vireo", elm = ?vnode.elm(), "remove");
                RemoveCallback::new(self.ops.clone(), vnode.elm(), listeners)
            }
        };

        // A component's root shares the host node; its hooks get a say too.
        if let Some(root) = vnode.component_instance().and_then(|vm| vm.vnode()) {
            if root.data().is_some() {
                self.remove_and_invoke_remove_hook(&root, Some(callback.clone()));
            }
        }
        for module in self.modules.iter() {
            module.remove(vnode, &callback);
        }
        match vnode.data().and_then(|data| data.hooks.remove.clone()) {
            Some(remove) => remove(vnode, callback),
            None => callback.done(),
        }
    }

    fn invoke_destroy_hook(&self, vnode: &VNode) {
        if let Some(data) = vnode.data() {
            if vnode.is_component() {
                hooks::destroy(vnode);
            }
            if let Some(destroy) = &data.hooks.destroy {
                destroy(vnode);
            }
            for module in self.modules.iter() {
                module.destroy(vnode);
            }
        }
        for child in vnode.children_vec() {
            self.invoke_destroy_hook(&child);
        }
    }

    fn invoke_insert_hook(&self, vnode: &VNode, queue: Vec<VNode>, initial: bool) {
        // A component's first patch: hand the queue to the placeholder so
        // the hooks fire once the parent's patch attaches everything.
        if initial {
            if let Some(placeholder) = vnode.parent() {
                placeholder.set_pending_insert(queue);
                return;
            }
        }
        for vnode in &queue {
            if vnode.is_component() {
                hooks::insert(vnode);
            }
            if let Some(insert) = vnode.data().and_then(|data| data.hooks.insert.clone()) {
                insert(vnode);
            }
        }
    }

    /// Patch `vnode` over `old`, which is known to be the same node.
    /// Returns the node that now owns the host subtree.
    fn patch_vnode(&self, old: &VNode, vnode: &VNode, queue: &mut Vec<VNode>, owned: bool) -> VNode {
        if old.ptr_eq(vnode) {
            return vnode.clone();
        }
        let vnode = if owned && vnode.elm().is_some() {
            vnode.clone_node()
        } else {
            vnode.clone()
        };
        vnode.set_elm(old.elm());

        if old.is_async_placeholder() {
            vnode.set_async_placeholder(true);
            return vnode;
        }

        // Static subtrees are reused as they are.
        if vnode.is_static()
            && old.is_static()
            && vnode.key() == old.key()
            && (vnode.is_cloned() || vnode.is_once())
        {
            vnode.set_component_instance(old.component_instance());
            return vnode;
        }

        if vnode.is_component() {
            hooks::prepatch(old, &vnode);
        }

        let data = vnode.data();
        if data.is_some() && is_patchable(&vnode) {
            for module in self.modules.iter() {
                module.update(old, &vnode);
            }
            if let Some(update) = data.and_then(|d| d.hooks.update.as_ref()) {
                update(old, &vnode);
            }
        }

        if let Some(elm) = vnode.elm() {
            let old_ch = old.children_vec();
            let ch = vnode.children_vec();
            match vnode.text_content() {
                None => {
                    if !old_ch.is_empty() && !ch.is_empty() {
                        let unchanged = old_ch.len() == ch.len()
                            && old_ch.iter().zip(&ch).all(|(a, b)| a.ptr_eq(b));
                        if !unchanged {
                            let updated = self.update_children(elm, &old_ch, &ch, queue);
                            vnode.set_children(updated);
                        }
                    } else if !ch.is_empty() {
                        self.check_duplicate_keys(&ch, &vnode);
                        if old.text_content().is_some() {
                            self.ops.set_text_content(elm, "");
                        }
                        let created = self.add_vnodes(elm, None, &ch, queue);
                        vnode.set_children(created);
                    } else if !old_ch.is_empty() {
                        self.remove_vnodes(&old_ch);
                    } else if old.text_content().is_some() {
                        self.ops.set_text_content(elm, "");
                    }
                }
                Some(text) => {
                    if old.text_content() != Some(text) {
                        self.ops.set_text_content(elm, text);
                    }
                }
            }
        }

        if let Some(postpatch) = vnode.data().and_then(|d| d.hooks.postpatch.as_ref()) {
            postpatch(old, &vnode);
        }
        vnode
    }

    /// Two-ended keyed reconciliation of a children list. Returns the new
    /// list with realized nodes substituted where clones were needed.
    fn update_children(
        &self,
        parent: HostNode,
        old_ch: &[VNode],
        new_ch: &[VNode],
        queue: &mut Vec<VNode>,
    ) -> Vec<VNode> {
        let mut old: Vec<Option<VNode>> = old_ch.iter().cloned().map(Some).collect();
        let mut new: Vec<VNode> = new_ch.to_vec();
        let (mut old_start, mut old_end) = (0, old.len());
        let (mut new_start, mut new_end) = (0, new.len());
        let mut key_map: Option<HashMap<Key, usize>> = None;

        if let Some(first) = new_ch.first() {
            self.check_duplicate_keys(new_ch, first);
        }

        while old_start < old_end && new_start < new_end {
            let Some(old_start_vnode) = old[old_start].clone() else {
                old_start += 1;
                continue;
            };
            let Some(old_end_vnode) = old[old_end - 1].clone() else {
                old_end -= 1;
                continue;
            };
            let new_start_vnode = new[new_start].clone();
            let new_end_vnode = new[new_end - 1].clone();

            if same_vnode(&old_start_vnode, &new_start_vnode) {
                new[new_start] = self.patch_vnode(&old_start_vnode, &new_start_vnode, queue, true);
                old_start += 1;
                new_start += 1;
            } else if same_vnode(&old_end_vnode, &new_end_vnode) {
                new[new_end - 1] = self.patch_vnode(&old_end_vnode, &new_end_vnode, queue, true);
                old_end -= 1;
                new_end -= 1;
            } else if same_vnode(&old_start_vnode, &new_end_vnode) {
                // Moved right.
                let patched = self.patch_vnode(&old_start_vnode, &new_end_vnode, queue, true);
                if let Some(elm) = patched.elm() {
                    let reference = old_end_vnode.elm().and_then(|e| self.ops.next_sibling(e));
                    tracing::trace!(target: "vireo", %elm, "move");
                    self.ops.insert_before(parent, elm, reference);
                }
                new[new_end - 1] = patched;
                old_start += 1;
                new_end -= 1;
            } else if same_vnode(&old_end_vnode, &new_start_vnode) {
                // Moved left.
                let patched = self.patch_vnode(&old_end_vnode, &new_start_vnode, queue, true);
                if let Some(elm) = patched.elm() {
                    tracing::trace!(target: "vireo", %elm, "move");
                    self.ops.insert_before(parent, elm, old_start_vnode.elm());
                }
                new[new_start] = patched;
                old_end -= 1;
                new_start += 1;
            } else {
                let map = key_map.get_or_insert_with(|| key_to_index(&old, old_start, old_end));
                let found = match new_start_vnode.key() {
                    Some(key) => map.get(key).copied(),
                    None => find_index_in_old(&new_start_vnode, &old, old_start, old_end),
                };
                let to_move = found.and_then(|i| old[i].clone().map(|v| (i, v)));
                new[new_start] = match to_move {
                    Some((index, to_move)) if same_vnode(&to_move, &new_start_vnode) => {
                        let patched = self.patch_vnode(&to_move, &new_start_vnode, queue, true);
                        old[index] = None;
                        if let Some(elm) = patched.elm() {
                            tracing::trace!(target: "vireo", %elm, "move");
                            self.ops.insert_before(parent, elm, old_start_vnode.elm());
                        }
                        patched
                    }
                    // New node, or same key on a different element.
                    _ => self.create_elm(
                        &new_start_vnode,
                        queue,
                        Some(parent),
                        old_start_vnode.elm(),
                        false,
                        true,
                    ),
                };
                new_start += 1;
            }
        }

        if old_start >= old_end {
            let reference = new.get(new_end).and_then(VNode::elm);
            for i in new_start..new_end {
                let vnode = new[i].clone();
                new[i] = self.create_elm(&vnode, queue, Some(parent), reference, false, true);
            }
        } else if new_start >= new_end {
            let leftover: Vec<VNode> = old[old_start..old_end].iter().flatten().cloned().collect();
            self.remove_vnodes(&leftover);
        }
        new
    }

    fn check_duplicate_keys(&self, children: &[VNode], owner: &VNode) {
        if !config::with(|c| c.dev_mode) {
            return;
        }
        let mut seen = std::collections::HashSet::new();
        for child in children {
            if let Some(key) = child.key() {
                if !seen.insert(key) {
                    warn(
                        format!("Duplicate keys detected: '{key}'. This may cause an update error."),
                        owner.context().as_ref(),
                    );
                }
            }
        }
    }
}

fn key_to_index(old: &[Option<VNode>], start: usize, end: usize) -> HashMap<Key, usize> {
    let mut map = HashMap::new();
    for (i, vnode) in old.iter().enumerate().take(end).skip(start) {
        if let Some(key) = vnode.as_ref().and_then(VNode::key) {
            map.insert(key.clone(), i);
        }
    }
    map
}

fn find_index_in_old(vnode: &VNode, old: &[Option<VNode>], start: usize, end: usize) -> Option<usize> {
    (start..end).find(|&i| old[i].as_ref().is_some_and(|o| same_vnode(vnode, o)))
}

/// Whether the node (or, for a component, its innermost root) is a real
/// element rather than an empty comment.
pub(crate) fn is_patchable(vnode: &VNode) -> bool {
    let mut current = vnode.clone();
    while let Some(root) = current.component_instance().and_then(|vm| vm.vnode()) {
        current = root;
    }
    current.tag().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vdom::{HostOp, MemoryHost};

    fn keyed(keys: &[i64]) -> VNode {
        VNode::element("ul")
            .children(keys.iter().map(|&k| {
                VNode::element("li")
                    .key(k)
                    .child(VNode::text(k.to_string()))
                    .build()
            }))
            .build()
    }

    fn mount(host: &Rc<MemoryHost>, vnode: &VNode) -> Patcher {
        let patcher = Patcher::new(host.clone());
        let root = host.create_element("div");
        let container = host.create_element("main");
        host.append_child(root, container);
        patcher.patch(Some(PatchTarget::Node(container)), Some(vnode));
        patcher
    }

    #[test]
    fn initial_patch_replaces_the_mount_point() {
        let host = Rc::new(MemoryHost::new());
        let tree = VNode::element("p").child(VNode::text("hi")).build();
        mount(&host, &tree);

        let elm = tree.elm().expect("realized");
        let parent = host.parent_node(elm).expect("attached");
        assert_eq!(host.to_html(parent), "<div><p>hi</p></div>");
    }

    #[test]
    fn text_changes_are_applied_in_place() {
        let host = Rc::new(MemoryHost::new());
        let old = VNode::element("p").child(VNode::text("a")).build();
        let patcher = mount(&host, &old);
        host.clear_log();

        let new = VNode::element("p").child(VNode::text("b")).build();
        patcher.patch(Some(PatchTarget::VNode(old.clone())), Some(&new));

        assert_eq!(new.elm(), old.elm());
        assert_eq!(host.log(), vec![HostOp::SetText {
            node: new.children()[0].elm().expect("text node"),
            text: "b".into(),
        }]);
    }

    #[test]
    fn reversing_keyed_children_only_moves() {
        let host = Rc::new(MemoryHost::new());
        let old = keyed(&[1, 2, 3, 4]);
        let patcher = mount(&host, &old);
        host.clear_log();

        let new = keyed(&[4, 3, 2, 1]);
        patcher.patch(Some(PatchTarget::VNode(old)), Some(&new));

        let stats = host.stats();
        assert_eq!(stats.created, 0);
        assert_eq!(stats.removed, 0);
        assert_eq!(host.text_content(new.elm().expect("ul")), "4321");
    }

    #[test]
    fn keyed_insert_and_remove() {
        let host = Rc::new(MemoryHost::new());
        let old = keyed(&[1, 2, 3]);
        let patcher = mount(&host, &old);
        host.clear_log();

        let new = keyed(&[1, 4, 3]);
        patcher.patch(Some(PatchTarget::VNode(old)), Some(&new));

        assert_eq!(host.text_content(new.elm().expect("ul")), "143");
        let stats = host.stats();
        // One li plus its text.
        assert_eq!(stats.created, 2);
        assert_eq!(stats.removed, 1);
    }

    #[test]
    fn different_root_tag_replaces_the_subtree() {
        let host = Rc::new(MemoryHost::new());
        let old = VNode::element("p").child(VNode::text("x")).build();
        let patcher = mount(&host, &old);
        let parent = host.parent_node(old.elm().expect("p")).expect("attached");

        let new = VNode::element("span").child(VNode::text("x")).build();
        patcher.patch(Some(PatchTarget::VNode(old.clone())), Some(&new));

        assert_eq!(host.to_html(parent), "<div><span>x</span></div>");
        assert_eq!(host.parent_node(old.elm().expect("p")), None);
    }

    #[test]
    fn duplicate_keys_warn() {
        let warnings = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = warnings.clone();
        config::update(|c| {
            c.warn_handler = Some(Rc::new(move |msg: &str, _: Option<&crate::component::Component>, _: &str| {
                sink.borrow_mut().push(msg.to_string());
            }));
        });

        let host = Rc::new(MemoryHost::new());
        mount(&host, &keyed(&[1, 1]));

        assert!(warnings.borrow()[0].starts_with("Duplicate keys detected: '1'"));
    }

    #[test]
    fn insert_hooks_fire_after_attachment() {
        let host = Rc::new(MemoryHost::new());
        let attached = Rc::new(std::cell::Cell::new(false));
        let (flag, ops) = (attached.clone(), host.clone());
        let tree = VNode::element("div")
            .child(
                VNode::element("input")
                    .hooks(crate::vdom::VNodeHooks {
                        insert: Some(Rc::new(move |v: &VNode| {
                            let elm = v.elm().expect("realized");
                            flag.set(ops.parent_node(elm).is_some());
                        })),
                        ..Default::default()
                    })
                    .build(),
            )
            .build();
        mount(&host, &tree);
        assert!(attached.get());
    }

    #[test]
    fn removing_the_tree_runs_destroy_hooks() {
        let host = Rc::new(MemoryHost::new());
        let destroyed = Rc::new(std::cell::Cell::new(0));
        let counter = destroyed.clone();
        let tree = VNode::element("div")
            .child(
                VNode::element("span")
                    .hooks(crate::vdom::VNodeHooks {
                        destroy: Some(Rc::new(move |_: &VNode| counter.set(counter.get() + 1))),
                        ..Default::default()
                    })
                    .build(),
            )
            .build();
        let patcher = mount(&host, &tree);

        patcher.patch(Some(PatchTarget::VNode(tree)), None);
        assert_eq!(destroyed.get(), 1);
    }
}
