//! Views
//!
//! A [`View`] describes UI to attach to the DOM. Components are plain
//! functions returning a `View`; they run while the view is being produced,
//! inside the root created by [`mount`] or [`hydrate`], so effects and
//! cleanups they register belong to that root.
//!
//! ```rust,ignore
//! fn counter() -> View {
//!     let count = Signal::new(0);
//!     let label = count.clone();
//!     el("button")
//!         .on("click", move |_| count.update(|n| n + 1))
//!         .child(dynamic(move || label.get().to_string().into()))
//!         .into()
//! }
//!
//! let dispose = mount(counter, document().body())?;
//! ```

mod mount;

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::dom::{Event, EventHandler, Node};

pub use mount::{hydrate, insert, mount, render_to_string};

/// Producer of a reactive region.
pub type ViewFn = Arc<dyn Fn() -> View + Send + Sync>;

/// A description of UI to materialize.
#[derive(Default)]
pub enum View {
    #[default]
    Empty,
    Text(String),
    Element(ElementView),
    Fragment(Vec<View>),
    /// A region kept in sync by an effect re-running the producer.
    Dynamic(ViewFn),
    /// An existing node, inserted as is.
    Node(Node),
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Empty => f.write_str("Empty"),
            View::Text(text) => f.debug_tuple("Text").field(text).finish(),
            View::Element(element) => element.fmt(f),
            View::Fragment(views) => f.debug_tuple("Fragment").field(views).finish(),
            View::Dynamic(_) => f.write_str("Dynamic"),
            View::Node(node) => f.debug_tuple("Node").field(node).finish(),
        }
    }
}

impl From<ElementView> for View {
    fn from(element: ElementView) -> Self {
        View::Element(element)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        View::Text(text.to_string())
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        View::Text(text)
    }
}

impl From<Node> for View {
    fn from(node: Node) -> Self {
        View::Node(node)
    }
}

impl From<Vec<View>> for View {
    fn from(views: Vec<View>) -> Self {
        View::Fragment(views)
    }
}

impl From<()> for View {
    fn from(_: ()) -> Self {
        View::Empty
    }
}

impl<T: Into<View>> From<Option<T>> for View {
    fn from(view: Option<T>) -> Self {
        view.map(Into::into).unwrap_or_default()
    }
}

/// Receives the node created (or claimed) for an element.
#[derive(Clone, Default)]
pub struct NodeRef {
    node: Arc<RwLock<Option<Node>>>,
}

impl NodeRef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Node> {
        self.node.read().clone()
    }

    pub(crate) fn set(&self, node: &Node) {
        *self.node.write() = Some(node.clone());
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NodeRef").field(&self.get()).finish()
    }
}

/// Builder for an element view.
pub struct ElementView {
    tag: String,
    attributes: Vec<(String, String)>,
    listeners: Vec<(String, EventHandler)>,
    children: Vec<View>,
    node_ref: Option<NodeRef>,
}

impl ElementView {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    pub fn class(self, class: impl Into<String>) -> Self {
        self.attr("class", class)
    }

    pub fn on<F>(mut self, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.push((event.into(), Arc::new(handler)));
        self
    }

    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Append a static text child.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(View::Text(text.into()))
    }

    pub fn node_ref(mut self, node_ref: &NodeRef) -> Self {
        self.node_ref = Some(node_ref.clone());
        self
    }
}

impl fmt::Debug for ElementView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attributes", &self.attributes)
            .field("listeners", &self.listeners.len())
            .field("children", &self.children)
            .finish()
    }
}

/// Start building an element.
pub fn el(tag: &str) -> ElementView {
    ElementView {
        tag: tag.to_ascii_lowercase(),
        attributes: Vec::new(),
        listeners: Vec::new(),
        children: Vec::new(),
        node_ref: None,
    }
}

pub fn text(text: impl Into<String>) -> View {
    View::Text(text.into())
}

pub fn fragment<I>(views: I) -> View
where
    I: IntoIterator,
    I::Item: Into<View>,
{
    View::Fragment(views.into_iter().map(Into::into).collect())
}

/// A region that re-renders whenever a signal read by `f` changes.
pub fn dynamic<F>(f: F) -> View
where
    F: Fn() -> View + Send + Sync + 'static,
{
    View::Dynamic(Arc::new(f))
}
