//! Simulated user interaction.
//!
//! Every function dispatches synchronously and returns `false` when a
//! handler called `prevent_default`. Effects triggered by the handlers have
//! re-run by the time the call returns.

use lattice_core::dom::{Event, Node};

pub fn dispatch(node: &Node, event: Event) -> bool {
    tracing::trace!(node = %node.id(), event = event.kind(), "firing event");
    node.dispatch_event(event)
}

pub fn click(node: &Node) -> bool {
    dispatch(node, Event::new("click"))
}

pub fn dbl_click(node: &Node) -> bool {
    dispatch(node, Event::new("dblclick"))
}

/// Set the control's `value` and fire `input`.
pub fn input(node: &Node, value: &str) -> bool {
    node.set_attribute("value", value);
    dispatch(node, Event::new("input").with_detail(value))
}

/// Set the control's `value` and fire `change`.
pub fn change(node: &Node, value: &str) -> bool {
    node.set_attribute("value", value);
    dispatch(node, Event::new("change").with_detail(value))
}

pub fn focus(node: &Node) -> bool {
    dispatch(node, Event::non_bubbling("focus"))
}

pub fn blur(node: &Node) -> bool {
    dispatch(node, Event::non_bubbling("blur"))
}

pub fn submit(node: &Node) -> bool {
    dispatch(node, Event::new("submit"))
}

/// Fire `keydown` with the key name as detail.
pub fn key_down(node: &Node, key: &str) -> bool {
    dispatch(node, Event::new("keydown").with_detail(key))
}
