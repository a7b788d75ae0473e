//! Virtual Nodes
//!
//! A [`VNode`] describes one node of the desired output tree: an element, a
//! text node, a comment, or a component placeholder. Render functions build
//! a fresh tree on every evaluation; the reconciler then compares it with the
//! previous one.
//!
//! VNodes are cheap `Rc` handles. The description itself is immutable once
//! built; the reconciler records bookkeeping (the realized host node, the
//! backing component instance) in interior cells.
//!
//! # Identity
//!
//! [`same_vnode`] decides whether two nodes can be patched in place: same
//! key (including both absent), same tag, same comment-ness, both or
//! neither carrying data, and for `input` elements compatible `type`
//! attributes.

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::ops::{HostNode, RemoveCallback};
use crate::component::{current_rendering_instance, Component, ComponentDef, WeakComponent};
use crate::error::Result;
use crate::reactive::Value;

/// Author-supplied identity hint for list diffing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Int(n as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.into())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s.into())
    }
}

/// Hook receiving one node.
pub type VNodeHook = Rc<dyn Fn(&VNode)>;

/// Hook receiving `(old, new)`.
pub type VNodePairHook = Rc<dyn Fn(&VNode, &VNode)>;

/// Hook that controls when a removed node is detached.
pub type RemoveHook = Rc<dyn Fn(&VNode, Rc<RemoveCallback>)>;

/// Event listener. Receives the emitted arguments.
pub type Listener = Rc<dyn Fn(&[Value]) -> Result<()>>;

/// Per-node lifecycle hooks.
#[derive(Clone, Default)]
pub struct VNodeHooks {
    /// After the node and its children were created.
    pub create: Option<VNodePairHook>,
    /// After the top-level patch attached the node.
    pub insert: Option<VNodeHook>,
    /// Before children are reconciled during an in-place patch.
    pub update: Option<VNodePairHook>,
    /// After an in-place patch finished.
    pub postpatch: Option<VNodePairHook>,
    /// When the node is torn down.
    pub destroy: Option<VNodeHook>,
    /// When the node is about to be detached.
    pub remove: Option<RemoveHook>,
}

/// Payload of a node.
///
/// For component placeholders, `props` carries the prop values passed down
/// and `on` the listeners the child instance can `emit` to.
#[derive(Clone, Default)]
pub struct VNodeData {
    pub attrs: IndexMap<Rc<str>, Value>,
    pub props: IndexMap<Rc<str>, Value>,
    pub on: IndexMap<Rc<str>, Listener>,
    pub hooks: VNodeHooks,
    pub ref_name: Option<Rc<str>>,
    pub ref_in_for: bool,
    pub slot: Option<Rc<str>>,
    pub keep_alive: bool,
}

/// Component placeholder payload.
#[derive(Clone)]
pub struct ComponentOptions {
    pub def: Rc<ComponentDef>,
    /// Content passed into the component's slots.
    pub children: Vec<VNode>,
}

struct VNodeInner {
    tag: Option<Rc<str>>,
    key: Option<Key>,
    data: Option<VNodeData>,
    children: RefCell<Vec<VNode>>,
    text: Option<Rc<str>>,
    is_comment: bool,
    is_static: bool,
    is_once: bool,
    is_cloned: bool,
    async_factory: Option<u64>,
    is_async_placeholder: Cell<bool>,
    component: Option<ComponentOptions>,
    context: Option<WeakComponent>,
    elm: Cell<Option<HostNode>>,
    component_instance: RefCell<Option<Component>>,
    parent: RefCell<Option<Weak<VNodeInner>>>,
    is_root_insert: Cell<bool>,
    pending_insert: RefCell<Option<Vec<VNode>>>,
}

impl VNodeInner {
    fn blank() -> Self {
        Self {
            tag: None,
            key: None,
            data: None,
            children: RefCell::new(Vec::new()),
            text: None,
            is_comment: false,
            is_static: false,
            is_once: false,
            is_cloned: false,
            async_factory: None,
            is_async_placeholder: Cell::new(false),
            component: None,
            context: current_rendering_instance().map(|vm| vm.downgrade()),
            elm: Cell::new(None),
            component_instance: RefCell::new(None),
            parent: RefCell::new(None),
            is_root_insert: Cell::new(true),
            pending_insert: RefCell::new(None),
        }
    }
}

/// A node of the virtual tree.
#[derive(Clone)]
pub struct VNode {
    inner: Rc<VNodeInner>,
}

/// Weak handle to a [`VNode`].
#[derive(Clone)]
pub struct WeakVNode {
    inner: Weak<VNodeInner>,
}

impl WeakVNode {
    pub fn upgrade(&self) -> Option<VNode> {
        self.inner.upgrade().map(|inner| VNode { inner })
    }
}

impl VNode {
    fn from_inner(inner: VNodeInner) -> Self {
        Self {
            inner: Rc::new(inner),
        }
    }

    /// Start building an element node.
    pub fn element(tag: impl Into<Rc<str>>) -> VNodeBuilder {
        VNodeBuilder::new(tag.into(), None)
    }

    /// Start building a component placeholder node. Children become the
    /// component's slot content.
    pub fn component(def: &Rc<ComponentDef>) -> VNodeBuilder {
        let tag = if def.name().is_empty() {
            format!("vireo-component-{}", def.id())
        } else {
            format!("vireo-component-{}-{}", def.id(), def.name())
        };
        VNodeBuilder::new(tag.into(), Some(def.clone()))
    }

    /// A text node.
    pub fn text(text: impl Into<Rc<str>>) -> VNode {
        VNode::from_inner(VNodeInner {
            text: Some(text.into()),
            ..VNodeInner::blank()
        })
    }

    /// A comment node.
    pub fn comment(text: impl Into<Rc<str>>) -> VNode {
        VNode::from_inner(VNodeInner {
            text: Some(text.into()),
            is_comment: true,
            ..VNodeInner::blank()
        })
    }

    /// The empty node: a comment with no text. Rendered when there is
    /// nothing to show.
    pub fn empty() -> VNode {
        VNode::comment("")
    }

    /// Placeholder for a component that has not resolved yet. Placeholders
    /// with the same `factory` patch into each other.
    pub fn async_placeholder(factory: u64) -> VNode {
        VNode::from_inner(VNodeInner {
            text: Some("".into()),
            is_comment: true,
            async_factory: Some(factory),
            is_async_placeholder: Cell::new(true),
            ..VNodeInner::blank()
        })
    }

    /// Stand-in for an existing host element, so it can be patched over.
    pub(crate) fn empty_at(tag: &str, elm: HostNode) -> VNode {
        let vnode = VNode::from_inner(VNodeInner {
            tag: Some(tag.to_lowercase().into()),
            context: None,
            ..VNodeInner::blank()
        });
        vnode.set_elm(Some(elm));
        vnode
    }

    /// A shallow copy for re-use of an already realized node: shares the
    /// description and children, marked as cloned.
    pub fn clone_node(&self) -> VNode {
        let inner = &self.inner;
        VNode::from_inner(VNodeInner {
            tag: inner.tag.clone(),
            key: inner.key.clone(),
            data: inner.data.clone(),
            children: RefCell::new(inner.children.borrow().clone()),
            text: inner.text.clone(),
            is_comment: inner.is_comment,
            is_static: inner.is_static,
            is_once: inner.is_once,
            is_cloned: true,
            async_factory: inner.async_factory,
            is_async_placeholder: Cell::new(inner.is_async_placeholder.get()),
            component: inner.component.clone(),
            context: inner.context.clone(),
            elm: Cell::new(inner.elm.get()),
            component_instance: RefCell::new(None),
            parent: RefCell::new(None),
            is_root_insert: Cell::new(true),
            pending_insert: RefCell::new(None),
        })
    }

    pub fn tag(&self) -> Option<&str> {
        self.inner.tag.as_deref()
    }

    pub fn key(&self) -> Option<&Key> {
        self.inner.key.as_ref()
    }

    pub fn data(&self) -> Option<&VNodeData> {
        self.inner.data.as_ref()
    }

    pub fn children(&self) -> Ref<'_, Vec<VNode>> {
        self.inner.children.borrow()
    }

    pub(crate) fn children_vec(&self) -> Vec<VNode> {
        self.inner.children.borrow().clone()
    }

    pub(crate) fn set_children(&self, children: Vec<VNode>) {
        *self.inner.children.borrow_mut() = children;
    }

    pub fn text_content(&self) -> Option<&str> {
        self.inner.text.as_deref()
    }

    pub fn is_comment(&self) -> bool {
        self.inner.is_comment
    }

    /// Plain text node.
    pub fn is_text(&self) -> bool {
        self.inner.tag.is_none() && !self.inner.is_comment
    }

    pub fn is_static(&self) -> bool {
        self.inner.is_static
    }

    pub fn is_once(&self) -> bool {
        self.inner.is_once
    }

    pub fn is_cloned(&self) -> bool {
        self.inner.is_cloned
    }

    pub fn is_async_placeholder(&self) -> bool {
        self.inner.is_async_placeholder.get()
    }

    pub(crate) fn set_async_placeholder(&self, value: bool) {
        self.inner.is_async_placeholder.set(value);
    }

    pub fn async_factory(&self) -> Option<u64> {
        self.inner.async_factory
    }

    pub fn is_component(&self) -> bool {
        self.inner.component.is_some()
    }

    pub fn component_options(&self) -> Option<&ComponentOptions> {
        self.inner.component.as_ref()
    }

    pub fn is_keep_alive(&self) -> bool {
        self.inner.data.as_ref().is_some_and(|d| d.keep_alive)
    }

    /// The instance whose render produced this node.
    pub fn context(&self) -> Option<Component> {
        self.inner.context.as_ref().and_then(WeakComponent::upgrade)
    }

    /// The realized host node, once created.
    pub fn elm(&self) -> Option<HostNode> {
        self.inner.elm.get()
    }

    pub(crate) fn set_elm(&self, elm: Option<HostNode>) {
        self.inner.elm.set(elm);
    }

    /// The instance backing a component placeholder.
    pub fn component_instance(&self) -> Option<Component> {
        self.inner.component_instance.borrow().clone()
    }

    pub(crate) fn set_component_instance(&self, instance: Option<Component>) {
        *self.inner.component_instance.borrow_mut() = instance;
    }

    /// For a component's root node: the placeholder standing for the
    /// component in its parent's tree.
    pub fn parent(&self) -> Option<VNode> {
        self.inner
            .parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| VNode { inner })
    }

    pub(crate) fn set_parent(&self, parent: Option<&VNode>) {
        *self.inner.parent.borrow_mut() = parent.map(|p| Rc::downgrade(&p.inner));
    }

    pub(crate) fn set_root_insert(&self, value: bool) {
        self.inner.is_root_insert.set(value);
    }

    pub fn is_root_insert(&self) -> bool {
        self.inner.is_root_insert.get()
    }

    pub(crate) fn set_pending_insert(&self, queue: Vec<VNode>) {
        *self.inner.pending_insert.borrow_mut() = Some(queue);
    }

    pub(crate) fn take_pending_insert(&self) -> Option<Vec<VNode>> {
        self.inner.pending_insert.borrow_mut().take()
    }

    pub fn downgrade(&self) -> WeakVNode {
        WeakVNode {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn ptr_eq(&self, other: &VNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for VNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_comment() {
            return write!(f, "<!--{}-->", self.text_content().unwrap_or_default());
        }
        match self.tag() {
            None => write!(f, "{:?}", self.text_content().unwrap_or_default()),
            Some(tag) => {
                let mut s = f.debug_struct(tag);
                if let Some(key) = self.key() {
                    s.field("key", key);
                }
                s.field("children", &*self.children()).finish()
            }
        }
    }
}

/// Builder for element and component nodes.
pub struct VNodeBuilder {
    tag: Rc<str>,
    def: Option<Rc<ComponentDef>>,
    key: Option<Key>,
    data: Option<VNodeData>,
    children: Vec<VNode>,
    text: Option<Rc<str>>,
    is_static: bool,
    is_once: bool,
    instance: Option<Component>,
}

impl VNodeBuilder {
    fn new(tag: Rc<str>, def: Option<Rc<ComponentDef>>) -> Self {
        // Component placeholders always carry data.
        let data = def.as_ref().map(|_| VNodeData::default());
        Self {
            tag,
            def,
            key: None,
            data,
            children: Vec::new(),
            text: None,
            is_static: false,
            is_once: false,
            instance: None,
        }
    }

    fn data_mut(&mut self) -> &mut VNodeData {
        self.data.get_or_insert_with(VNodeData::default)
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn attr(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.data_mut().attrs.insert(name.into(), value.into());
        self
    }

    /// Pass a prop to a component placeholder.
    pub fn prop(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.data_mut().props.insert(name.into(), value.into());
        self
    }

    pub fn on(
        mut self,
        event: impl Into<Rc<str>>,
        listener: impl Fn(&[Value]) -> Result<()> + 'static,
    ) -> Self {
        self.data_mut().on.insert(event.into(), Rc::new(listener));
        self
    }

    pub fn hooks(mut self, hooks: VNodeHooks) -> Self {
        self.data_mut().hooks = hooks;
        self
    }

    /// Register the realized node (or component instance) under `name` in
    /// the rendering instance's refs.
    pub fn ref_name(mut self, name: impl Into<Rc<str>>) -> Self {
        self.data_mut().ref_name = Some(name.into());
        self
    }

    /// Collect refs with this name into a list.
    pub fn ref_in_for(mut self, in_for: bool) -> Self {
        self.data_mut().ref_in_for = in_for;
        self
    }

    /// Target a named slot of the enclosing component.
    pub fn slot(mut self, name: impl Into<Rc<str>>) -> Self {
        self.data_mut().slot = Some(name.into());
        self
    }

    /// Keep the component instance alive when the placeholder is removed.
    pub fn keep_alive(mut self, keep_alive: bool) -> Self {
        self.data_mut().keep_alive = keep_alive;
        self
    }

    /// Re-use a cached instance for a kept-alive component.
    pub fn cached_instance(mut self, instance: &Component) -> Self {
        self.instance = Some(instance.clone());
        self
    }

    /// Append a child. Adjacent text children are merged.
    pub fn child(mut self, child: VNode) -> Self {
        if child.is_text() && child.elm().is_none() {
            if let Some(last) = self.children.last() {
                if last.is_text() && last.elm().is_none() {
                    let merged = format!(
                        "{}{}",
                        last.text_content().unwrap_or_default(),
                        child.text_content().unwrap_or_default()
                    );
                    if let Some(slot) = self.children.last_mut() {
                        *slot = VNode::text(merged);
                    }
                    return self;
                }
            }
        }
        self.children.push(child);
        self
    }

    pub fn children(self, children: impl IntoIterator<Item = VNode>) -> Self {
        children.into_iter().fold(self, VNodeBuilder::child)
    }

    /// Element text content, as a single text child.
    pub fn text(mut self, text: impl Into<Rc<str>>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Mark as a hoisted static subtree.
    pub fn static_node(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark as rendered once.
    pub fn once(mut self) -> Self {
        self.is_static = true;
        self.is_once = true;
        self
    }

    pub fn build(self) -> VNode {
        let (children, component) = match self.def {
            Some(def) => (
                Vec::new(),
                Some(ComponentOptions {
                    def,
                    children: self.children,
                }),
            ),
            None => (self.children, None),
        };
        let vnode = VNode::from_inner(VNodeInner {
            tag: Some(self.tag),
            key: self.key,
            data: self.data,
            children: RefCell::new(children),
            text: self.text,
            is_static: self.is_static,
            is_once: self.is_once,
            component,
            ..VNodeInner::blank()
        });
        if let Some(instance) = self.instance {
            vnode.set_component_instance(Some(instance));
        }
        vnode
    }
}

const TEXT_INPUT_TYPES: &[&str] = &["text", "number", "password", "search", "email", "tel", "url"];

fn same_input_type(a: &VNode, b: &VNode) -> bool {
    if a.tag() != Some("input") {
        return true;
    }
    let input_type = |v: &VNode| {
        v.data()
            .and_then(|d| d.attrs.get("type"))
            .map(Value::to_text)
    };
    let (type_a, type_b) = (input_type(a), input_type(b));
    let is_text_input =
        |t: &Option<String>| t.as_deref().is_some_and(|t| TEXT_INPUT_TYPES.contains(&t));
    type_a == type_b || (is_text_input(&type_a) && is_text_input(&type_b))
}

/// Whether `a` can be patched into `b` in place.
pub fn same_vnode(a: &VNode, b: &VNode) -> bool {
    a.key() == b.key()
        && a.async_factory() == b.async_factory()
        && ((a.tag() == b.tag()
            && a.is_comment() == b.is_comment()
            && a.data().is_some() == b.data().is_some()
            && same_input_type(a, b))
            || a.is_async_placeholder())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_text_children_are_merged() {
        let vnode = VNode::element("p")
            .child(VNode::text("a"))
            .child(VNode::text("b"))
            .child(VNode::element("br").build())
            .child(VNode::text("c"))
            .build();

        let children = vnode.children();
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].text_content(), Some("ab"));
        assert_eq!(children[2].text_content(), Some("c"));
    }

    #[test]
    fn same_vnode_requires_matching_keys_and_tags() {
        let a = VNode::element("li").key(1).build();
        let b = VNode::element("li").key(1).build();
        let c = VNode::element("li").key(2).build();
        let d = VNode::element("div").key(1).build();

        assert!(same_vnode(&a, &b));
        assert!(!same_vnode(&a, &c));
        assert!(!same_vnode(&a, &d));
        assert!(same_vnode(&VNode::text("x"), &VNode::text("y")));
        assert!(!same_vnode(&VNode::text("x"), &VNode::comment("x")));
    }

    #[test]
    fn data_presence_must_match() {
        let plain = VNode::element("div").build();
        let with_attr = VNode::element("div").attr("id", "x").build();
        assert!(!same_vnode(&plain, &with_attr));
    }

    #[test]
    fn text_like_inputs_are_interchangeable() {
        let text = VNode::element("input").attr("type", "text").build();
        let email = VNode::element("input").attr("type", "email").build();
        let checkbox = VNode::element("input").attr("type", "checkbox").build();

        assert!(same_vnode(&text, &email));
        assert!(!same_vnode(&text, &checkbox));
    }

    #[test]
    fn async_placeholders_match_by_factory() {
        assert!(same_vnode(&VNode::async_placeholder(1), &VNode::async_placeholder(1)));
        assert!(!same_vnode(&VNode::async_placeholder(1), &VNode::async_placeholder(2)));
        assert!(!same_vnode(&VNode::async_placeholder(1), &VNode::comment("")));
        assert!(!same_vnode(&VNode::comment(""), &VNode::async_placeholder(1)));
    }

    #[test]
    fn clone_node_shares_description() {
        let original = VNode::element("ul")
            .key("list")
            .child(VNode::element("li").build())
            .static_node()
            .build();
        let copy = original.clone_node();

        assert!(!copy.ptr_eq(&original));
        assert!(copy.is_cloned());
        assert_eq!(copy.key(), original.key());
        assert!(copy.children()[0].ptr_eq(&original.children()[0]));
    }
}
