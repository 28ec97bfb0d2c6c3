//! Materializing views into the DOM.
//!
//! Two strategies share one walk over the view tree:
//!
//! - **build** creates fresh nodes and inserts them before an anchor (or at
//!   the end of the parent);
//! - **claim** walks existing server-rendered nodes with a cursor and adopts
//!   the ones that match, attaching listeners, refs and effects. A mismatch
//!   is logged and falls back to building at the cursor.
//!
//! A [`View::Dynamic`] becomes a region driven by an effect. Its first run
//! builds or claims; later runs patch the region in place. A region always
//! occupies at least one node (an empty text node when the producer returns
//! nothing) so that later runs know where to insert.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{ElementView, NodeRef, View, ViewFn};
use crate::dom::{EventHandler, Node};
use crate::error::Result;
use crate::reactive::{create_root, Disposer, Effect};

/// Materialize `view` at the end of `parent`.
///
/// Dynamic regions created here are owned by the current owner; call this
/// inside a root so they can be disposed.
pub fn insert(parent: &Node, view: View) -> Result<Vec<Node>> {
    build(parent, view, None)
}

/// Run `producer` in a new root and append its output to `container`.
///
/// Existing children of `container` are kept. Every effect created while
/// producing the view has run once when this returns.
pub fn mount<F>(producer: F, container: &Node) -> Result<Disposer>
where
    F: FnOnce() -> View,
{
    create_root(|dispose| match insert(container, producer()) {
        Ok(nodes) => {
            tracing::debug!(container = %container.id(), nodes = nodes.len(), "mounted view");
            Ok(dispose)
        }
        Err(err) => {
            dispose.dispose();
            Err(err)
        }
    })
}

/// Run `producer` in a new root and adopt the markup already in `container`.
pub fn hydrate<F>(producer: F, container: &Node) -> Result<Disposer>
where
    F: FnOnce() -> View,
{
    create_root(|dispose| {
        let mut cursor = container.first_child();
        match claim(container, producer(), &mut cursor) {
            Ok(nodes) => {
                tracing::debug!(container = %container.id(), nodes = nodes.len(), "hydrated view");
                Ok(dispose)
            }
            Err(err) => {
                dispose.dispose();
                Err(err)
            }
        }
    })
}

/// Render `producer` to markup in a scratch container.
///
/// The root is disposed before returning, so effects do not outlive the call.
pub fn render_to_string<F>(producer: F) -> Result<String>
where
    F: FnOnce() -> View,
{
    let scratch = Node::element("div");
    let dispose = mount(producer, &scratch)?;
    let html = scratch.inner_html();
    dispose.dispose();
    Ok(html)
}

fn place(parent: &Node, node: &Node, anchor: Option<&Node>) -> Result<()> {
    parent.insert_before(node, anchor)
}

fn configure(
    node: &Node,
    attributes: Vec<(String, String)>,
    listeners: Vec<(String, EventHandler)>,
    node_ref: Option<NodeRef>,
) {
    for (name, value) in attributes {
        if node.attribute(&name).as_deref() != Some(value.as_str()) {
            node.set_attribute(&name, value);
        }
    }
    for (event, handler) in listeners {
        node.add_event_listener(event, handler);
    }
    if let Some(node_ref) = node_ref {
        node_ref.set(node);
    }
}

fn build(parent: &Node, view: View, anchor: Option<&Node>) -> Result<Vec<Node>> {
    match view {
        View::Empty => Ok(Vec::new()),
        View::Text(text) => {
            let node = Node::text(text);
            place(parent, &node, anchor)?;
            Ok(vec![node])
        }
        View::Node(node) => {
            place(parent, &node, anchor)?;
            Ok(vec![node])
        }
        View::Element(element) => {
            let ElementView {
                tag,
                attributes,
                listeners,
                children,
                node_ref,
            } = element;
            let node = Node::element(&tag);
            configure(&node, attributes, listeners, node_ref);
            for child in children {
                build(&node, child, None)?;
            }
            place(parent, &node, anchor)?;
            Ok(vec![node])
        }
        View::Fragment(views) => {
            let mut nodes = Vec::new();
            for view in views {
                nodes.extend(build(parent, view, anchor)?);
            }
            Ok(nodes)
        }
        View::Dynamic(f) => region(parent, f, Initial::Build(anchor.cloned())).map(|(n, _)| n),
    }
}

fn claim(parent: &Node, view: View, cursor: &mut Option<Node>) -> Result<Vec<Node>> {
    match view {
        View::Empty => Ok(Vec::new()),
        View::Text(text) => match cursor.clone() {
            Some(existing) if existing.is_text() => {
                if existing.data().as_deref() != Some(text.as_str()) {
                    existing.set_text_content(&text);
                }
                *cursor = existing.next_sibling();
                Ok(vec![existing])
            }
            other => {
                mismatch(parent, "text", other.as_ref());
                build(parent, View::Text(text), other.as_ref())
            }
        },
        View::Node(node) => build(parent, View::Node(node), cursor.as_ref()),
        View::Element(element) => match cursor.clone() {
            Some(existing) if existing.tag_name() == Some(element.tag()) => {
                *cursor = existing.next_sibling();
                let ElementView {
                    attributes,
                    listeners,
                    children,
                    node_ref,
                    ..
                } = element;
                configure(&existing, attributes, listeners, node_ref);
                let mut inner = existing.first_child();
                for child in children {
                    claim(&existing, child, &mut inner)?;
                }
                Ok(vec![existing])
            }
            other => {
                mismatch(parent, element.tag(), other.as_ref());
                build(parent, View::Element(element), other.as_ref())
            }
        },
        View::Fragment(views) => {
            let mut nodes = Vec::new();
            for view in views {
                nodes.extend(claim(parent, view, cursor)?);
            }
            Ok(nodes)
        }
        View::Dynamic(f) => {
            let (nodes, resume) = region(parent, f, Initial::Claim(cursor.take()))?;
            *cursor = resume;
            Ok(nodes)
        }
    }
}

fn mismatch(parent: &Node, expected: &str, found: Option<&Node>) {
    tracing::warn!(
        parent = %parent.id(),
        expected,
        found = ?found,
        "hydration mismatch, inserting fresh nodes"
    );
}

enum Initial {
    Build(Option<Node>),
    Claim(Option<Node>),
}

#[derive(Default)]
struct RegionState {
    nodes: Vec<Node>,
    initial: Option<Initial>,
    /// Cursor after the nodes claimed by the first run.
    resume: Option<Node>,
    first_error: Option<crate::error::DomError>,
}

fn region(parent: &Node, f: ViewFn, initial: Initial) -> Result<(Vec<Node>, Option<Node>)> {
    let state = Arc::new(Mutex::new(RegionState {
        initial: Some(initial),
        ..RegionState::default()
    }));

    let effect_parent = parent.clone();
    let effect_state = state.clone();
    let _effect = Effect::new(move || {
        let view = f();
        let initial = effect_state.lock().initial.take();
        let outcome = match initial {
            Some(Initial::Build(anchor)) => build(&effect_parent, view, anchor.as_ref())
                .and_then(|nodes| ensure_placeholder(&effect_parent, nodes, anchor.as_ref()))
                .map(|nodes| (nodes, None)),
            Some(Initial::Claim(mut cursor)) => claim(&effect_parent, view, &mut cursor)
                .and_then(|nodes| ensure_placeholder(&effect_parent, nodes, cursor.as_ref()))
                .map(|nodes| (nodes, cursor)),
            None => {
                let previous = std::mem::take(&mut effect_state.lock().nodes);
                patch(&effect_parent, previous, view).map(|nodes| (nodes, None))
            }
        };

        let mut state = effect_state.lock();
        match outcome {
            Ok((nodes, resume)) => {
                state.nodes = nodes;
                state.resume = resume;
            }
            Err(err) => {
                tracing::error!(
                    parent = %effect_parent.id(),
                    error = %err,
                    "failed to render region"
                );
                state.first_error.get_or_insert(err);
            }
        }
    });

    let mut state = state.lock();
    match state.first_error.take() {
        Some(err) => Err(err),
        None => Ok((state.nodes.clone(), state.resume.take())),
    }
}

fn ensure_placeholder(parent: &Node, nodes: Vec<Node>, anchor: Option<&Node>) -> Result<Vec<Node>> {
    if !nodes.is_empty() {
        return Ok(nodes);
    }
    let placeholder = Node::text("");
    place(parent, &placeholder, anchor)?;
    Ok(vec![placeholder])
}

/// Replace the nodes of a region with the output of its latest run.
fn patch(parent: &Node, previous: Vec<Node>, view: View) -> Result<Vec<Node>> {
    if let (View::Text(text), [single]) = (&view, previous.as_slice()) {
        if single.is_text() {
            single.set_text_content(text);
            return Ok(previous);
        }
    }

    let anchor = previous.last().and_then(Node::next_sibling);
    for node in &previous {
        node.remove();
    }
    let nodes = build(parent, view, anchor.as_ref())?;
    ensure_placeholder(parent, nodes, anchor.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{create_effect, on_cleanup, Signal};
    use crate::view::{dynamic, el, fragment, text};
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn mount_appends_markup() {
        let container = Node::element("div");
        container.append_child(&Node::element("hr")).unwrap();

        let _dispose = mount(
            || el("p").attr("data-x", "1").text("hello").into(),
            &container,
        )
        .unwrap();

        assert_eq!(container.inner_html(), "<hr><p data-x=\"1\">hello</p>");
    }

    #[test]
    fn mount_runs_effects_before_returning() {
        let runs = Arc::new(AtomicUsize::new(0));
        let container = Node::element("div");
        let counter = runs.clone();

        let _dispose = mount(
            move || {
                create_effect(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                View::Empty
            },
            &container,
        )
        .unwrap();

        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dynamic_text_updates_in_place() {
        let count = Signal::new(0);
        let container = Node::element("div");
        let label = count.clone();

        let dispose = mount(
            move || {
                let label = label.clone();
                el("button")
                    .child(dynamic(move || label.get().to_string().into()))
                    .into()
            },
            &container,
        )
        .unwrap();

        let button = container.first_child().unwrap();
        let text_node = button.first_child().unwrap();
        assert_eq!(container.inner_html(), "<button>0</button>");

        count.set(1);
        assert_eq!(container.inner_html(), "<button>1</button>");
        assert_eq!(button.first_child(), Some(text_node));

        dispose.dispose();
        count.set(2);
        assert_eq!(container.inner_html(), "<button>1</button>");
    }

    #[test]
    fn dynamic_region_swaps_between_shapes() {
        let show = Signal::new(true);
        let container = Node::element("div");
        let flag = show.clone();

        let _dispose = mount(
            move || {
                let flag = flag.clone();
                fragment([
                    text("["),
                    dynamic(move || {
                        if flag.get() {
                            el("b").text("on").into()
                        } else {
                            View::Empty
                        }
                    }),
                    text("]"),
                ])
            },
            &container,
        )
        .unwrap();

        assert_eq!(container.inner_html(), "[<b>on</b>]");
        show.set(false);
        assert_eq!(container.inner_html(), "[]");
        show.set(true);
        assert_eq!(container.inner_html(), "[<b>on</b>]");
    }

    #[test]
    fn region_rerun_disposes_previous_children() {
        let version = Signal::new(0);
        let cleanups = Arc::new(AtomicUsize::new(0));
        let container = Node::element("div");
        let (seen, counter) = (version.clone(), cleanups.clone());

        let _dispose = mount(
            move || {
                dynamic(move || {
                    let n = seen.get();
                    let counter = counter.clone();
                    on_cleanup(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    });
                    text(n.to_string())
                })
            },
            &container,
        )
        .unwrap();

        version.set(1);
        version.set(2);
        assert_eq!(cleanups.load(Ordering::SeqCst), 2);
        assert_eq!(container.inner_html(), "2");
    }

    #[test]
    fn cyclic_node_insert_fails_and_disposes_root() {
        let container = Node::element("div");
        let runs = Arc::new(AtomicUsize::new(0));
        let (inner, counter) = (container.clone(), runs.clone());

        let result = mount(
            move || {
                on_cleanup(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                View::Node(inner)
            },
            &container,
        );

        assert!(result.is_err());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hydrate_claims_existing_nodes() {
        let count = Signal::new(0);
        let app = {
            let count = count.clone();
            move || -> View {
                let (label, setter) = (count.clone(), count.clone());
                el("div")
                    .text("Count: ")
                    .child(
                        el("button")
                            .on("click", move |_| setter.update(|n| n + 1))
                            .child(dynamic(move || label.get().to_string().into())),
                    )
                    .into()
            }
        };

        let server = render_to_string(app.clone()).unwrap();
        assert_eq!(server, "<div>Count: <button>0</button></div>");

        let container = Node::element("div");
        let div = Node::element("div");
        let button = Node::element("button");
        button.append_child(&Node::text("0")).unwrap();
        div.append_child(&Node::text("Count: ")).unwrap();
        div.append_child(&button).unwrap();
        container.append_child(&div).unwrap();
        let before = container.descendants();

        let _dispose = hydrate(app, &container).unwrap();

        assert_eq!(container.descendants(), before);
        button.click();
        assert_eq!(count.get_untracked(), 1);
        assert_eq!(container.inner_html(), "<div>Count: <button>1</button></div>");
    }

    #[test]
    fn hydrate_mismatch_inserts_fresh_nodes() {
        let container = Node::element("div");
        container.append_child(&Node::element("span")).unwrap();

        let _dispose = hydrate(|| el("p").text("x").into(), &container).unwrap();

        assert_eq!(container.inner_html(), "<p>x</p><span></span>");
    }
}
