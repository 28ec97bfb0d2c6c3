//! DOM nodes.
//!
//! A [`Node`] is a cheap, thread-safe handle. Clones refer to the same node
//! and equality is identity. Children are held strongly and parents weakly,
//! so dropping the last handle to a detached subtree frees it.
//!
//! No method holds two node locks at once. Tree edits lock the parent and
//! the child one after the other, and event handlers run with no lock held.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use smallvec::SmallVec;

use super::event::{Event, EventHandler};
use crate::error::{DomError, Result};

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element { tag: String },
    Text,
    Comment,
}

struct Listener {
    event: String,
    handler: EventHandler,
}

#[derive(Default)]
struct NodeState {
    parent: Weak<NodeInner>,
    children: SmallVec<[Node; 4]>,
    attributes: IndexMap<String, String>,
    /// Character data of text and comment nodes.
    data: String,
    listeners: SmallVec<[Listener; 2]>,
}

struct NodeInner {
    id: NodeId,
    kind: NodeKind,
    state: RwLock<NodeState>,
}

#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeInner>,
}

impl Node {
    fn with_kind(kind: NodeKind, data: String) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: NodeId::next(),
                kind,
                state: RwLock::new(NodeState {
                    data,
                    ..NodeState::default()
                }),
            }),
        }
    }

    /// A detached element. Tag names are stored lowercase.
    pub fn element(tag: &str) -> Self {
        Self::with_kind(
            NodeKind::Element {
                tag: tag.to_ascii_lowercase(),
            },
            String::new(),
        )
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Text, data.into())
    }

    pub fn comment(data: impl Into<String>) -> Self {
        Self::with_kind(NodeKind::Comment, data.into())
    }

    pub(crate) fn document() -> Self {
        Self::with_kind(NodeKind::Document, String::new())
    }

    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.inner.kind
    }

    /// Lowercase tag name for elements.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.inner.kind {
            NodeKind::Element { tag } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.inner.kind, NodeKind::Element { .. })
    }

    pub fn is_text(&self) -> bool {
        self.inner.kind == NodeKind::Text
    }

    pub fn is_comment(&self) -> bool {
        self.inner.kind == NodeKind::Comment
    }

    pub fn is_document(&self) -> bool {
        self.inner.kind == NodeKind::Document
    }

    fn can_have_children(&self) -> bool {
        matches!(
            self.inner.kind,
            NodeKind::Document | NodeKind::Element { .. }
        )
    }

    // ------------------------------------------------------------------
    // Tree navigation
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<Node> {
        self.inner
            .state
            .read()
            .parent
            .upgrade()
            .map(|inner| Node { inner })
    }

    pub fn children(&self) -> Vec<Node> {
        self.inner.state.read().children.to_vec()
    }

    pub fn child_count(&self) -> usize {
        self.inner.state.read().children.len()
    }

    pub fn first_child(&self) -> Option<Node> {
        self.inner.state.read().children.first().cloned()
    }

    pub fn last_child(&self) -> Option<Node> {
        self.inner.state.read().children.last().cloned()
    }

    pub fn next_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let state = parent.inner.state.read();
        let index = state.children.iter().position(|c| c == self)?;
        let next = state.children.get(index + 1).cloned();
        next
    }

    pub fn previous_sibling(&self) -> Option<Node> {
        let parent = self.parent()?;
        let state = parent.inner.state.read();
        let index = state.children.iter().position(|c| c == self)?;
        let previous = index.checked_sub(1).and_then(|i| state.children.get(i).cloned());
        previous
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> Vec<Node> {
        let mut out = Vec::new();
        let mut cursor = self.parent();
        while let Some(node) = cursor {
            cursor = node.parent();
            out.push(node);
        }
        out
    }

    /// The topmost ancestor, or the node itself when detached.
    pub fn root(&self) -> Node {
        self.ancestors().pop().unwrap_or_else(|| self.clone())
    }

    /// Whether the node is attached to a document.
    pub fn is_connected(&self) -> bool {
        self.root().is_document()
    }

    /// Whether `other` is this node or one of its descendants.
    pub fn contains(&self, other: &Node) -> bool {
        other == self || other.ancestors().iter().any(|a| a == self)
    }

    /// All descendants in document order, excluding the node itself.
    pub fn descendants(&self) -> Vec<Node> {
        let mut out = Vec::new();
        let mut stack: Vec<Node> = self.children().into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            stack.extend(node.children().into_iter().rev());
            out.push(node);
        }
        out
    }

    /// First descendant element whose `id` attribute matches.
    pub fn find_by_id(&self, id: &str) -> Option<Node> {
        self.descendants()
            .into_iter()
            .find(|n| n.attribute("id").as_deref() == Some(id))
    }

    // ------------------------------------------------------------------
    // Tree mutation
    // ------------------------------------------------------------------

    /// Adopt detached `children` into a node that has none yet.
    pub(crate) fn with_children(self, children: impl IntoIterator<Item = Node>) -> Self {
        for child in children {
            debug_assert!(child.parent().is_none());
            child.inner.state.write().parent = Arc::downgrade(&self.inner);
            self.inner.state.write().children.push(child);
        }
        self
    }

    pub fn append_child(&self, child: &Node) -> Result<()> {
        self.insert_before(child, None)
    }

    /// Insert `child` before `reference`, or at the end when it is `None`.
    ///
    /// The child is detached from its current parent first.
    pub fn insert_before(&self, child: &Node, reference: Option<&Node>) -> Result<()> {
        if !self.can_have_children() {
            return Err(DomError::LeafNode(self.id()));
        }
        if child.contains(self) {
            return Err(DomError::HierarchyRequest {
                parent: self.id(),
                child: child.id(),
            });
        }
        if let Some(reference) = reference {
            if reference.parent().as_ref() != Some(self) {
                return Err(DomError::NotAChild {
                    parent: self.id(),
                    child: reference.id(),
                });
            }
        }

        let reference = match reference {
            Some(r) if r == child => child.next_sibling(),
            other => other.cloned(),
        };

        child.remove();
        {
            let mut state = self.inner.state.write();
            let index = reference
                .as_ref()
                .and_then(|r| state.children.iter().position(|c| c == r))
                .unwrap_or(state.children.len());
            state.children.insert(index, child.clone());
        }
        child.inner.state.write().parent = Arc::downgrade(&self.inner);
        Ok(())
    }

    pub fn remove_child(&self, child: &Node) -> Result<()> {
        if child.parent().as_ref() != Some(self) {
            return Err(DomError::NotAChild {
                parent: self.id(),
                child: child.id(),
            });
        }
        child.remove();
        Ok(())
    }

    /// Detach the node from its parent. A detached node is left as is.
    pub fn remove(&self) {
        if let Some(parent) = self.parent() {
            parent.inner.state.write().children.retain(|c| *c != *self);
        }
        self.inner.state.write().parent = Weak::new();
    }

    /// Detach every child.
    pub fn clear_children(&self) {
        let children = std::mem::take(&mut self.inner.state.write().children);
        for child in children {
            child.inner.state.write().parent = Weak::new();
        }
    }

    // ------------------------------------------------------------------
    // Attributes and text
    // ------------------------------------------------------------------

    pub fn attribute(&self, name: &str) -> Option<String> {
        self.inner.state.read().attributes.get(name).cloned()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.inner.state.read().attributes.contains_key(name)
    }

    pub fn set_attribute(&self, name: &str, value: impl Into<String>) {
        self.inner
            .state
            .write()
            .attributes
            .insert(name.to_string(), value.into());
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        self.inner.state.write().attributes.shift_remove(name)
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.inner
            .state
            .read()
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Character data of a text or comment node.
    pub fn data(&self) -> Option<String> {
        match self.inner.kind {
            NodeKind::Text | NodeKind::Comment => Some(self.inner.state.read().data.clone()),
            _ => None,
        }
    }

    /// Text of the node: its data for text nodes, otherwise the
    /// concatenated data of every descendant text node.
    pub fn text_content(&self) -> String {
        match self.inner.kind {
            NodeKind::Text | NodeKind::Comment => self.inner.state.read().data.clone(),
            _ => self
                .descendants()
                .iter()
                .filter(|n| n.is_text())
                .map(|n| n.inner.state.read().data.clone())
                .collect(),
        }
    }

    /// Replace the node's text. Elements lose their children and gain a
    /// single text node unless `text` is empty.
    pub fn set_text_content(&self, text: &str) {
        match self.inner.kind {
            NodeKind::Text | NodeKind::Comment => {
                self.inner.state.write().data = text.to_string();
            }
            _ => {
                self.clear_children();
                if !text.is_empty() {
                    let node = Node::text(text);
                    node.inner.state.write().parent = Arc::downgrade(&self.inner);
                    self.inner.state.write().children.push(node);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn add_event_listener(&self, event: impl Into<String>, handler: EventHandler) {
        self.inner.state.write().listeners.push(Listener {
            event: event.into(),
            handler,
        });
    }

    /// Remove every listener for `event`. Returns how many were removed.
    pub fn remove_event_listeners(&self, event: &str) -> usize {
        let mut state = self.inner.state.write();
        let before = state.listeners.len();
        state.listeners.retain(|l| l.event != event);
        before - state.listeners.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.inner
            .state
            .read()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .count()
    }

    fn handlers_for(&self, event: &str) -> Vec<EventHandler> {
        self.inner
            .state
            .read()
            .listeners
            .iter()
            .filter(|l| l.event == event)
            .map(|l| l.handler.clone())
            .collect()
    }

    /// Deliver `event` to this node, then to its ancestors if it bubbles.
    ///
    /// Returns `false` when a handler called `prevent_default`.
    pub fn dispatch_event(&self, mut event: Event) -> bool {
        event.set_target(self.clone());

        let mut path = vec![self.clone()];
        if event.bubbles() {
            path.extend(self.ancestors());
        }

        for node in path {
            let handlers = node.handlers_for(event.kind());
            if handlers.is_empty() {
                continue;
            }
            event.set_current_target(node);
            for handler in handlers {
                handler(&event);
            }
            if event.propagation_stopped() {
                break;
            }
        }

        !event.default_prevented()
    }

    /// Dispatch a bubbling `click` event.
    pub fn click(&self) -> bool {
        self.dispatch_event(Event::new("click"))
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Node {}

impl std::hash::Hash for Node {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.kind {
            NodeKind::Element { tag } => write!(f, "<{tag}> {}", self.id()),
            NodeKind::Text => write!(f, "#text {:?} {}", self.inner.state.read().data, self.id()),
            NodeKind::Comment => write!(f, "#comment {}", self.id()),
            NodeKind::Document => write!(f, "#document {}", self.id()),
        }
    }
}
