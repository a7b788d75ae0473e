//! In-Memory Host
//!
//! [`MemoryHost`] implements [`NodeOps`] over a plain node table and records
//! every structural operation. It is what tests and benchmarks patch
//! against, and a reference for writing real hosts.
//!
//! [`AttrsModule`] syncs `attrs` from node data onto memory elements.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Write;
use std::rc::Rc;

use indexmap::IndexMap;

use super::ops::{HostNode, NodeOps, PatchModule};
use super::vnode::VNode;
use crate::reactive::Value;

/// One recorded host operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostOp {
    CreateElement { node: HostNode, tag: String },
    CreateText { node: HostNode, text: String },
    CreateComment { node: HostNode, text: String },
    /// `moved` is set when the node was attached somewhere already.
    Insert {
        parent: HostNode,
        node: HostNode,
        moved: bool,
    },
    Remove { parent: HostNode, node: HostNode },
    SetText { node: HostNode, text: String },
    SetAttr { node: HostNode, name: String, value: String },
    RemoveAttr { node: HostNode, name: String },
}

/// Operation counts derived from the log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    /// Nodes of any kind created.
    pub created: usize,
    /// Fresh attachments.
    pub inserted: usize,
    /// Re-attachments of already attached nodes.
    pub moved: usize,
    pub removed: usize,
    pub text_updates: usize,
    pub attr_updates: usize,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct MemoryNode {
    kind: NodeKind,
    parent: Option<HostNode>,
    children: Vec<HostNode>,
}

#[derive(Default)]
struct HostState {
    nodes: HashMap<HostNode, MemoryNode>,
    next_id: u64,
    log: Vec<HostOp>,
}

impl HostState {
    fn alloc(&mut self, kind: NodeKind) -> HostNode {
        self.next_id += 1;
        let node = HostNode::from_raw(self.next_id);
        self.nodes.insert(
            node,
            MemoryNode {
                kind,
                parent: None,
                children: Vec::new(),
            },
        );
        node
    }

    fn detach(&mut self, node: HostNode) -> bool {
        let Some(parent) = self.nodes.get_mut(&node).and_then(|n| n.parent.take()) else {
            return false;
        };
        if let Some(parent) = self.nodes.get_mut(&parent) {
            parent.children.retain(|c| *c != node);
        }
        true
    }
}

/// A host tree held in memory.
#[derive(Default)]
pub struct MemoryHost {
    state: RefCell<HostState>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded operations, oldest first.
    pub fn log(&self) -> Vec<HostOp> {
        self.state.borrow().log.clone()
    }

    pub fn clear_log(&self) {
        self.state.borrow_mut().log.clear();
    }

    pub fn stats(&self) -> HostStats {
        let mut stats = HostStats::default();
        for op in &self.state.borrow().log {
            match op {
                HostOp::CreateElement { .. }
                | HostOp::CreateText { .. }
                | HostOp::CreateComment { .. } => stats.created += 1,
                HostOp::Insert { moved: true, .. } => stats.moved += 1,
                HostOp::Insert { moved: false, .. } => stats.inserted += 1,
                HostOp::Remove { .. } => stats.removed += 1,
                HostOp::SetText { .. } => stats.text_updates += 1,
                HostOp::SetAttr { .. } | HostOp::RemoveAttr { .. } => stats.attr_updates += 1,
            }
        }
        stats
    }

    pub fn children(&self, node: HostNode) -> Vec<HostNode> {
        self.state
            .borrow()
            .nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn contains(&self, node: HostNode) -> bool {
        self.state.borrow().nodes.contains_key(&node)
    }

    /// Concatenated text of the subtree.
    pub fn text_content(&self, node: HostNode) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        collect_text(&state, node, &mut out);
        out
    }

    pub fn attr(&self, node: HostNode, name: &str) -> Option<String> {
        match &self.state.borrow().nodes.get(&node)?.kind {
            NodeKind::Element { attrs, .. } => attrs.get(name).cloned(),
            _ => None,
        }
    }

    pub fn set_attr(&self, node: HostNode, name: &str, value: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(MemoryNode {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = state.nodes.get_mut(&node)
        {
            attrs.insert(name.to_string(), value.to_string());
            state.log.push(HostOp::SetAttr {
                node,
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    pub fn remove_attr(&self, node: HostNode, name: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(MemoryNode {
            kind: NodeKind::Element { attrs, .. },
            ..
        }) = state.nodes.get_mut(&node)
        {
            if attrs.shift_remove(name).is_some() {
                state.log.push(HostOp::RemoveAttr {
                    node,
                    name: name.to_string(),
                });
            }
        }
    }

    /// Serialize the subtree as markup.
    pub fn to_html(&self, node: HostNode) -> String {
        let state = self.state.borrow();
        let mut out = String::new();
        write_html(&state, node, &mut out);
        out
    }
}

fn collect_text(state: &HostState, node: HostNode, out: &mut String) {
    let Some(n) = state.nodes.get(&node) else { return };
    match &n.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Comment(_) => {}
        NodeKind::Element { .. } => {
            for child in &n.children {
                collect_text(state, *child, out);
            }
        }
    }
}

fn write_html(state: &HostState, node: HostNode, out: &mut String) {
    let Some(n) = state.nodes.get(&node) else { return };
    match &n.kind {
        NodeKind::Text(text) => out.push_str(&escape(text)),
        NodeKind::Comment(text) => {
            let _ = write!(out, "<!--{text}-->");
        }
        NodeKind::Element { tag, attrs } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attrs {
                let _ = write!(out, " {name}=\"{}\"", escape(value));
            }
            out.push('>');
            for child in &n.children {
                write_html(state, *child, out);
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl NodeOps for MemoryHost {
    fn create_element(&self, tag: &str) -> HostNode {
        let mut state = self.state.borrow_mut();
        let node = state.alloc(NodeKind::Element {
            tag: tag.to_string(),
            attrs: IndexMap::new(),
        });
        state.log.push(HostOp::CreateElement {
            node,
            tag: tag.to_string(),
        });
        node
    }

    fn create_text_node(&self, text: &str) -> HostNode {
        let mut state = self.state.borrow_mut();
        let node = state.alloc(NodeKind::Text(text.to_string()));
        state.log.push(HostOp::CreateText {
            node,
            text: text.to_string(),
        });
        node
    }

    fn create_comment(&self, text: &str) -> HostNode {
        let mut state = self.state.borrow_mut();
        let node = state.alloc(NodeKind::Comment(text.to_string()));
        state.log.push(HostOp::CreateComment {
            node,
            text: text.to_string(),
        });
        node
    }

    fn insert_before(&self, parent: HostNode, node: HostNode, reference: Option<HostNode>) {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(&parent) || !state.nodes.contains_key(&node) {
            return;
        }
        let moved = state.detach(node);
        let Some(p) = state.nodes.get_mut(&parent) else { return };
        let position = reference
            .and_then(|r| p.children.iter().position(|c| *c == r))
            .unwrap_or(p.children.len());
        p.children.insert(position, node);
        if let Some(n) = state.nodes.get_mut(&node) {
            n.parent = Some(parent);
        }
        state.log.push(HostOp::Insert {
            parent,
            node,
            moved,
        });
    }

    fn remove_child(&self, parent: HostNode, child: HostNode) {
        let mut state = self.state.borrow_mut();
        if state.nodes.get(&child).and_then(|n| n.parent) != Some(parent) {
            return;
        }
        state.detach(child);
        state.log.push(HostOp::Remove {
            parent,
            node: child,
        });
    }

    fn append_child(&self, parent: HostNode, child: HostNode) {
        self.insert_before(parent, child, None);
    }

    fn parent_node(&self, node: HostNode) -> Option<HostNode> {
        self.state.borrow().nodes.get(&node)?.parent
    }

    fn next_sibling(&self, node: HostNode) -> Option<HostNode> {
        let state = self.state.borrow();
        let parent = state.nodes.get(&node)?.parent?;
        let siblings = &state.nodes.get(&parent)?.children;
        let index = siblings.iter().position(|c| *c == node)?;
        siblings.get(index + 1).copied()
    }

    fn tag_name(&self, node: HostNode) -> String {
        match self.state.borrow().nodes.get(&node).map(|n| &n.kind) {
            Some(NodeKind::Element { tag, .. }) => tag.clone(),
            _ => String::new(),
        }
    }

    fn set_text_content(&self, node: HostNode, text: &str) {
        let mut state = self.state.borrow_mut();
        let Some(n) = state.nodes.get(&node) else { return };
        let children = match &n.kind {
            NodeKind::Element { .. } => n.children.clone(),
            _ => Vec::new(),
        };
        for child in children {
            state.detach(child);
        }
        let text_child = match state.nodes.get_mut(&node).map(|n| &mut n.kind) {
            Some(NodeKind::Text(current)) | Some(NodeKind::Comment(current)) => {
                *current = text.to_string();
                false
            }
            Some(NodeKind::Element { .. }) => !text.is_empty(),
            None => false,
        };
        if text_child {
            let child = state.alloc(NodeKind::Text(text.to_string()));
            if let Some(n) = state.nodes.get_mut(&child) {
                n.parent = Some(node);
            }
            if let Some(n) = state.nodes.get_mut(&node) {
                n.children.push(child);
            }
        }
        state.log.push(HostOp::SetText {
            node,
            text: text.to_string(),
        });
    }
}

/// Writes `attrs` onto memory elements. Falsy booleans and nullish values
/// remove the attribute.
pub struct AttrsModule {
    host: Rc<MemoryHost>,
}

impl AttrsModule {
    pub fn new(host: Rc<MemoryHost>) -> Self {
        Self { host }
    }

    fn sync(&self, old: Option<&VNode>, vnode: &VNode) {
        let Some(elm) = vnode.elm() else { return };
        let empty = IndexMap::new();
        let attrs = vnode.data().map(|d| &d.attrs).unwrap_or(&empty);
        let old_attrs = old.and_then(VNode::data).map(|d| &d.attrs).unwrap_or(&empty);

        for (name, value) in attrs {
            if old_attrs.get(name) == Some(value) {
                continue;
            }
            match value {
                Value::Bool(false) | Value::Null | Value::Undefined => {
                    self.host.remove_attr(elm, name)
                }
                Value::Bool(true) => self.host.set_attr(elm, name, name),
                other => self.host.set_attr(elm, name, &other.to_text()),
            }
        }
        for name in old_attrs.keys() {
            if !attrs.contains_key(name) {
                self.host.remove_attr(elm, name);
            }
        }
    }
}

impl PatchModule for AttrsModule {
    fn create(&self, _empty: &VNode, vnode: &VNode) {
        self.sync(None, vnode);
    }

    fn update(&self, old: &VNode, vnode: &VNode) {
        self.sync(Some(old), vnode);
    }
}
