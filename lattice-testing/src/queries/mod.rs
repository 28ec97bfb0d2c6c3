//! DOM Queries
//!
//! Queries find elements the way a user would: by text, role, label,
//! placeholder and so on. Every query is scoped to a container and only
//! ever looks at its descendants.
//!
//! # Query variants
//!
//! | Method      | 0 matches  | 1 match | 2+ matches | Async |
//! |-------------|------------|---------|------------|-------|
//! | `get`       | error      | node    | error      | no    |
//! | `get_all`   | error      | nodes   | nodes      | no    |
//! | `query`     | `None`     | node    | error      | no    |
//! | `query_all` | empty      | nodes   | nodes      | no    |
//! | `find`      | error      | node    | error      | yes   |
//! | `find_all`  | error      | nodes   | nodes      | yes   |
//!
//! Errors carry the pretty-printed container, so a failing assertion shows
//! what was actually rendered.
//!
//! ```rust,ignore
//! let view = render(app, RenderOptions::default())?;
//! let button = view.get_by_role(RoleFilter::new("button").name("Save"))?;
//! fire_event::click(&button);
//! view.find_by_text("Saved").await?;
//! ```

mod by;
pub mod fire_event;
mod matcher;
mod pretty;
mod wait;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use lattice_core::dom::Node;

use crate::config::Config;
use crate::error::QueryError;
use crate::session::TestSession;

pub use by::{accessible_name, role_of, By, RoleFilter};
pub use matcher::{normalize, Matcher};
pub use pretty::{pretty_dom, PrettyOptions};
pub use wait::{wait_for, WaitOptions};

/// A way of selecting elements below a container.
pub trait Query: Send + Sync {
    /// Every matching descendant of `container`, in document order.
    fn query_all(&self, container: &Node, config: &QueryConfig) -> Vec<Node>;

    /// Human readable description used in error messages.
    fn describe(&self) -> String;
}

impl<Q: Query + ?Sized> Query for Arc<Q> {
    fn query_all(&self, container: &Node, config: &QueryConfig) -> Vec<Node> {
        (**self).query_all(container, config)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Settings shared by all queries of a [`BoundQueries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    pub test_id_attribute: String,
    /// Elements whose text is never matched.
    pub ignore: Vec<String>,
    pub async_timeout: Duration,
    pub poll_interval: Duration,
    pub debug_print_limit: usize,
}

impl QueryConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            test_id_attribute: config.test_id_attribute.clone(),
            ignore: vec!["script".to_string(), "style".to_string()],
            async_timeout: config.async_timeout(),
            poll_interval: config.poll_interval(),
            debug_print_limit: config.debug_print_limit,
        }
    }

    pub fn ignores(&self, tag: &str) -> bool {
        self.ignore.iter().any(|ignored| ignored == tag)
    }

    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout: self.async_timeout,
            interval: self.poll_interval,
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self::from_config(&Config::defaults())
    }
}

/// Query configuration plus named custom queries.
#[derive(Clone, Default)]
pub struct QuerySet {
    config: QueryConfig,
    custom: IndexMap<String, Arc<dyn Query>>,
}

impl QuerySet {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            config,
            custom: IndexMap::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(QueryConfig::from_config(config))
    }

    /// Register a custom query under `name`, replacing any previous one.
    pub fn with_query(mut self, name: impl Into<String>, query: impl Query + 'static) -> Self {
        self.custom.insert(name.into(), Arc::new(query));
        self
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut QueryConfig {
        &mut self.config
    }

    pub fn custom(&self, name: &str) -> Option<Arc<dyn Query>> {
        self.custom.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.custom.keys().map(String::as_str)
    }
}

impl fmt::Debug for QuerySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySet")
            .field("config", &self.config)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Queries bound to a container.
#[derive(Clone, Debug)]
pub struct BoundQueries {
    container: Node,
    queries: QuerySet,
}

/// Bind `queries` to `element`.
pub fn get_queries_for_element(element: &Node, queries: QuerySet) -> BoundQueries {
    BoundQueries {
        container: element.clone(),
        queries,
    }
}

/// Queries scoped to `element`, using the current session's config.
pub fn within(element: &Node) -> BoundQueries {
    get_queries_for_element(element, QuerySet::from_config(&TestSession::current().config()))
}

/// Queries bound to the body of the current session's document.
pub fn screen() -> BoundQueries {
    TestSession::current().screen()
}

impl BoundQueries {
    pub fn container(&self) -> &Node {
        &self.container
    }

    pub fn query_set(&self) -> &QuerySet {
        &self.queries
    }

    /// The container, pretty-printed up to the configured limit.
    pub fn pretty(&self) -> String {
        pretty_dom(
            &self.container,
            self.queries.config.debug_print_limit,
            &PrettyOptions::default(),
        )
    }

    pub fn query_all<Q: Query + ?Sized>(&self, query: &Q) -> Vec<Node> {
        query.query_all(&self.container, &self.queries.config)
    }

    pub fn query<Q: Query + ?Sized>(&self, query: &Q) -> Result<Option<Node>, QueryError> {
        let mut found = self.query_all(query);
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.pop()),
            count => Err(self.multiple(query, count)),
        }
    }

    pub fn get_all<Q: Query + ?Sized>(&self, query: &Q) -> Result<Vec<Node>, QueryError> {
        let found = self.query_all(query);
        if found.is_empty() {
            return Err(self.not_found(query));
        }
        Ok(found)
    }

    pub fn get<Q: Query + ?Sized>(&self, query: &Q) -> Result<Node, QueryError> {
        self.query(query)?.ok_or_else(|| self.not_found(query))
    }

    /// Poll [`get`](Self::get) until it succeeds or the timeout elapses.
    pub async fn find<Q: Query + ?Sized>(&self, query: &Q) -> Result<Node, QueryError> {
        wait_for(|| self.get(query), self.queries.config.wait_options()).await
    }

    /// Poll [`get_all`](Self::get_all) until it succeeds or the timeout elapses.
    pub async fn find_all<Q: Query + ?Sized>(&self, query: &Q) -> Result<Vec<Node>, QueryError> {
        wait_for(|| self.get_all(query), self.queries.config.wait_options()).await
    }

    /// A custom query registered in the bound [`QuerySet`].
    pub fn named(&self, name: &str) -> Result<Arc<dyn Query>, QueryError> {
        self.queries
            .custom(name)
            .ok_or_else(|| QueryError::UnknownQuery(name.to_string()))
    }

    fn not_found<Q: Query + ?Sized>(&self, query: &Q) -> QueryError {
        QueryError::NotFound {
            query: query.describe(),
            dom: self.pretty(),
        }
    }

    fn multiple<Q: Query + ?Sized>(&self, query: &Q, count: usize) -> QueryError {
        QueryError::Multiple {
            query: query.describe(),
            count,
            dom: self.pretty(),
        }
    }
}

macro_rules! by_queries {
    ($(
        $arg:ident: $ty:ty => $by:expr;
        [
            $get:ident,
            $get_all:ident,
            $query:ident,
            $query_all:ident,
            $find:ident,
            $find_all:ident $(,)?
        ]
    )*) => {
        impl BoundQueries {
            $(
                pub fn $get(&self, $arg: $ty) -> Result<Node, QueryError> {
                    self.get(&$by)
                }

                pub fn $get_all(&self, $arg: $ty) -> Result<Vec<Node>, QueryError> {
                    self.get_all(&$by)
                }

                pub fn $query(&self, $arg: $ty) -> Result<Option<Node>, QueryError> {
                    self.query(&$by)
                }

                pub fn $query_all(&self, $arg: $ty) -> Vec<Node> {
                    self.query_all(&$by)
                }

                pub async fn $find(&self, $arg: $ty) -> Result<Node, QueryError> {
                    let query = $by;
                    self.find(&query).await
                }

                pub async fn $find_all(&self, $arg: $ty) -> Result<Vec<Node>, QueryError> {
                    let query = $by;
                    self.find_all(&query).await
                }
            )*
        }
    };
}

by_queries! {
    text: impl Into<Matcher> => By::Text(text.into());
    [
        get_by_text,
        get_all_by_text,
        query_by_text,
        query_all_by_text,
        find_by_text,
        find_all_by_text,
    ]

    id: impl Into<Matcher> => By::TestId(id.into());
    [
        get_by_test_id,
        get_all_by_test_id,
        query_by_test_id,
        query_all_by_test_id,
        find_by_test_id,
        find_all_by_test_id,
    ]

    role: impl Into<RoleFilter> => By::Role(role.into());
    [
        get_by_role,
        get_all_by_role,
        query_by_role,
        query_all_by_role,
        find_by_role,
        find_all_by_role,
    ]

    label: impl Into<Matcher> => By::LabelText(label.into());
    [
        get_by_label_text,
        get_all_by_label_text,
        query_by_label_text,
        query_all_by_label_text,
        find_by_label_text,
        find_all_by_label_text,
    ]

    placeholder: impl Into<Matcher> => By::PlaceholderText(placeholder.into());
    [
        get_by_placeholder_text,
        get_all_by_placeholder_text,
        query_by_placeholder_text,
        query_all_by_placeholder_text,
        find_by_placeholder_text,
        find_all_by_placeholder_text,
    ]

    alt: impl Into<Matcher> => By::AltText(alt.into());
    [
        get_by_alt_text,
        get_all_by_alt_text,
        query_by_alt_text,
        query_all_by_alt_text,
        find_by_alt_text,
        find_all_by_alt_text,
    ]

    title: impl Into<Matcher> => By::Title(title.into());
    [
        get_by_title,
        get_all_by_title,
        query_by_title,
        query_all_by_title,
        find_by_title,
        find_all_by_title,
    ]

    value: impl Into<Matcher> => By::DisplayValue(value.into());
    [
        get_by_display_value,
        get_all_by_display_value,
        query_by_display_value,
        query_all_by_display_value,
        find_by_display_value,
        find_all_by_display_value,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_core::dom::Document;

    struct ByTag(&'static str);

    impl Query for ByTag {
        fn query_all(&self, container: &Node, _: &QueryConfig) -> Vec<Node> {
            container
                .descendants()
                .into_iter()
                .filter(|n| n.tag_name() == Some(self.0))
                .collect()
        }

        fn describe(&self) -> String {
            format!("with the tag <{}>", self.0)
        }
    }

    fn list(items: &[&str]) -> Node {
        let ul = Node::element("ul");
        for item in items {
            let li = Node::element("li");
            li.append_child(&Node::text(*item)).unwrap();
            ul.append_child(&li).unwrap();
        }
        ul
    }

    #[test]
    fn get_variants_follow_cardinality_rules() {
        let queries = get_queries_for_element(&list(&["a", "b", "b"]), QuerySet::default());

        assert!(queries.get_by_text("a").is_ok());
        assert!(matches!(queries.get_by_text("b"), Err(QueryError::Multiple { count: 2, .. })));
        assert!(matches!(queries.get_by_text("c"), Err(QueryError::NotFound { .. })));
        assert_eq!(queries.get_all_by_text("b").unwrap().len(), 2);
        assert_eq!(queries.query_by_text("c"), Ok(None));
        assert!(queries.query_by_text("b").is_err());
        assert!(queries.query_all_by_text("c").is_empty());
    }

    #[test]
    fn not_found_error_includes_markup() {
        let queries = get_queries_for_element(&list(&["a"]), QuerySet::default());
        let err = queries.get_by_text("zzz").unwrap_err().to_string();
        assert!(err.starts_with("Unable to find an element with the text: zzz"));
        assert!(err.contains("<li>\n    a\n  </li>"));
    }

    #[test]
    fn queries_never_match_the_container_itself() {
        let div = Node::element("div");
        div.set_attribute("data-testid", "root");
        let queries = get_queries_for_element(&div, QuerySet::default());
        assert_eq!(queries.query_by_test_id("root"), Ok(None));
    }

    #[test]
    fn test_id_attribute_is_configurable() {
        let div = Node::element("div");
        let child = Node::element("span");
        child.set_attribute("data-qa", "x");
        div.append_child(&child).unwrap();

        let mut set = QuerySet::default();
        set.config_mut().test_id_attribute = "data-qa".to_string();
        let queries = get_queries_for_element(&div, set);
        assert_eq!(queries.get_by_test_id("x"), Ok(child));
    }

    #[test]
    fn custom_queries_are_looked_up_by_name() {
        let set = QuerySet::default().with_query("items", ByTag("li"));
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["items"]);
        let queries = get_queries_for_element(&list(&["a", "b"]), set);

        let items = queries.named("items").unwrap();
        assert_eq!(queries.get_all(&items).unwrap().len(), 2);
        assert!(matches!(queries.named("missing"), Err(QueryError::UnknownQuery(_))));
    }

    #[test]
    fn within_scopes_to_subtree() {
        let doc = Document::new();
        let inside = list(&["same"]);
        let outside = list(&["same"]);
        doc.body().append_child(&outside).unwrap();
        doc.body().append_child(&inside).unwrap();

        let found = within(&inside).get_by_text("same").unwrap();
        assert!(inside.contains(&found));
    }

    #[tokio::test]
    async fn find_waits_for_late_insert() {
        let root = Node::element("div");
        let mut set = QuerySet::default();
        set.config_mut().poll_interval = Duration::from_millis(5);
        let queries = get_queries_for_element(&root, set);

        let target = root.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let p = Node::element("p");
            p.append_child(&Node::text("late")).unwrap();
            target.append_child(&p).unwrap();
        });

        let found = queries.find_by_text("late").await.unwrap();
        assert_eq!(found.tag_name(), Some("p"));
    }

    #[tokio::test]
    async fn find_times_out_with_last_error() {
        let mut set = QuerySet::default();
        set.config_mut().async_timeout = Duration::from_millis(20);
        set.config_mut().poll_interval = Duration::from_millis(5);
        let queries = get_queries_for_element(&Node::element("div"), set);

        let err = queries.find_by_role("button").await.unwrap_err();
        assert!(matches!(err, QueryError::NotFound { .. }));
    }
}
