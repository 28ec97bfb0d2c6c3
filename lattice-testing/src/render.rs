//! Rendering components into the session document.

use std::fmt;
use std::ops::Deref;

use lattice_core::dom::Node;
use lattice_core::error::DomError;
use lattice_core::reactive::{get_owner, Disposer, Owner};
use lattice_core::view::{self, View};

use crate::queries::{get_queries_for_element, pretty_dom, BoundQueries, PrettyOptions, QuerySet};
use crate::session::{DisposerContext, MountHandle, MountId, TestSession};

/// What a wrapper receives: the already produced component.
pub struct WrapperProps {
    pub children: View,
}

type Wrapper = Box<dyn FnOnce(WrapperProps) -> View>;

/// Options for [`TestSession::render`].
#[derive(Default)]
pub struct RenderOptions {
    container: Option<Node>,
    base_element: Option<Node>,
    queries: Option<QuerySet>,
    hydrate: bool,
    wrapper: Option<Wrapper>,
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render into an existing element instead of a fresh `<div>`.
    pub fn container(mut self, container: Node) -> Self {
        self.container = Some(container);
        self
    }

    /// Where a fresh container is appended, and what `debug` prints.
    ///
    /// Defaults to the container when one is given, else to the body.
    pub fn base_element(mut self, base_element: Node) -> Self {
        self.base_element = Some(base_element);
        self
    }

    /// Replace the query configuration and add custom queries.
    pub fn queries(mut self, queries: QuerySet) -> Self {
        self.queries = Some(queries);
        self
    }

    /// Adopt the markup already inside the container.
    pub fn hydrate(mut self, hydrate: bool) -> Self {
        self.hydrate = hydrate;
        self
    }

    /// Mount `wrapper` with the component as its children.
    pub fn wrapper<F>(mut self, wrapper: F) -> Self
    where
        F: FnOnce(WrapperProps) -> View + 'static,
    {
        self.wrapper = Some(Box::new(wrapper));
        self
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("container", &self.container)
            .field("base_element", &self.base_element)
            .field("queries", &self.queries)
            .field("hydrate", &self.hydrate)
            .field("wrapper", &self.wrapper.is_some())
            .finish()
    }
}

/// A rendered component.
///
/// Dereferences to the [`BoundQueries`] of its container, so
/// `result.get_by_text("..")` searches only what this render produced.
pub struct RenderResult {
    id: MountId,
    container: Node,
    base_element: Node,
    queries: BoundQueries,
    unmount: Disposer,
    owner: Option<Owner>,
    debug_print_limit: usize,
}

impl RenderResult {
    pub fn id(&self) -> MountId {
        self.id
    }

    pub fn container(&self) -> &Node {
        &self.container
    }

    pub fn base_element(&self) -> &Node {
        &self.base_element
    }

    /// Markup currently inside the container.
    pub fn as_fragment(&self) -> String {
        self.container.inner_html()
    }

    /// The base element, pretty-printed.
    pub fn pretty(&self) -> String {
        self.pretty_with(&self.base_element, self.debug_print_limit, &PrettyOptions::default())
    }

    pub fn pretty_with(&self, node: &Node, max_length: usize, options: &PrettyOptions) -> String {
        pretty_dom(node, max_length, options)
    }

    /// Print the base element to stdout.
    pub fn debug(&self) {
        println!("{}", self.pretty());
    }

    pub fn debug_node(&self, node: &Node) {
        self.debug_with(node, self.debug_print_limit, &PrettyOptions::default());
    }

    pub fn debug_nodes(&self, nodes: &[Node]) {
        for node in nodes {
            self.debug_node(node);
        }
    }

    /// Print `node` truncated to `max_length` characters, laid out per `options`.
    pub fn debug_with(&self, node: &Node, max_length: usize, options: &PrettyOptions) {
        println!("{}", self.pretty_with(node, max_length, options));
    }

    /// Dispose the component's root. The container stays until cleanup.
    pub fn unmount(&self) {
        self.unmount.dispose();
    }

    /// The owner captured while the component was produced.
    pub fn owner(&self) -> Option<&Owner> {
        self.owner.as_ref()
    }

    pub fn queries(&self) -> &BoundQueries {
        &self.queries
    }
}

impl Deref for RenderResult {
    type Target = BoundQueries;

    fn deref(&self) -> &BoundQueries {
        &self.queries
    }
}

impl fmt::Debug for RenderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderResult")
            .field("id", &self.id)
            .field("container", &self.container)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

impl TestSession {
    /// Mount `producer` and register it for cleanup.
    ///
    /// Effects created while producing the view have run once when this
    /// returns. A panic in `producer` propagates. If the view cannot be
    /// inserted the root is disposed, a container created here is removed
    /// again, and the error is returned.
    pub fn render<F, V>(
        &self,
        producer: F,
        options: RenderOptions,
    ) -> Result<RenderResult, DomError>
    where
        F: FnOnce() -> V,
        V: Into<View>,
    {
        let RenderOptions {
            container,
            base_element,
            queries,
            hydrate,
            wrapper,
        } = options;

        let base_element = base_element
            .or_else(|| container.clone())
            .unwrap_or_else(|| self.body().clone());
        let (container, created) = match container {
            Some(container) => (container, false),
            None => {
                let div = Node::element("div");
                base_element.append_child(&div)?;
                (div, true)
            }
        };

        let mut owner = None;
        let effective = || {
            owner = get_owner();
            let children: View = producer().into();
            match wrapper {
                Some(wrapper) => wrapper(WrapperProps { children }),
                None => children,
            }
        };
        let mounted = if hydrate {
            view::hydrate(effective, &container)
        } else {
            view::mount(effective, &container)
        };

        let unmount = match mounted {
            Ok(unmount) => unmount,
            Err(err) => {
                if created {
                    container.remove();
                }
                tracing::debug!(error = %err, "render failed");
                return Err(err);
            }
        };

        let id = self.register(MountHandle::new(
            Some(container.clone()),
            Some(DisposerContext::new(unmount.clone(), owner.clone())),
        ));

        let config = self.config();
        let queries = queries.unwrap_or_else(|| QuerySet::from_config(&config));
        Ok(RenderResult {
            id,
            queries: get_queries_for_element(&container, queries),
            container,
            base_element,
            unmount,
            owner,
            debug_print_limit: config.debug_print_limit,
        })
    }
}

/// Render into the current thread's session.
pub fn render<F, V>(producer: F, options: RenderOptions) -> Result<RenderResult, DomError>
where
    F: FnOnce() -> V,
    V: Into<View>,
{
    TestSession::current().render(producer, options)
}
