//! DOM events.
//!
//! Dispatch walks from the target up through its ancestors. Non-bubbling
//! events stop at the target, and a handler can cut the walk short with
//! [`Event::stop_propagation`].

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use super::node::Node;

/// Callback attached to a node with [`Node::add_event_listener`].
pub type EventHandler = Arc<dyn Fn(&Event) + Send + Sync>;

pub struct Event {
    kind: String,
    bubbles: bool,
    detail: Option<String>,
    target: Option<Node>,
    current_target: Option<Node>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    /// A bubbling event of the given type.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            bubbles: true,
            detail: None,
            target: None,
            current_target: None,
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// An event that is delivered to its target only.
    pub fn non_bubbling(kind: impl Into<String>) -> Self {
        Self {
            bubbles: false,
            ..Self::new(kind)
        }
    }

    /// Attach a payload, such as the key of a keyboard event.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// The node the event was dispatched on.
    pub fn target(&self) -> Option<&Node> {
        self.target.as_ref()
    }

    /// The node whose handlers are currently running.
    pub fn current_target(&self) -> Option<&Node> {
        self.current_target.as_ref()
    }

    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn set_target(&mut self, target: Node) {
        self.target = Some(target);
    }

    pub(crate) fn set_current_target(&mut self, node: Node) {
        self.current_target = Some(node);
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("kind", &self.kind)
            .field("bubbles", &self.bubbles)
            .field("detail", &self.detail)
            .field("target", &self.target.as_ref().map(Node::id))
            .finish()
    }
}
