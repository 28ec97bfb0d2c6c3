//! Text matching for queries.

use std::fmt;
use std::sync::Arc;

use lattice_core::dom::Node;

type Predicate = Arc<dyn Fn(&str, &Node) -> bool + Send + Sync>;

/// How a query compares the text it extracted from a node.
///
/// Node text is always normalized first: leading and trailing whitespace is
/// trimmed and inner runs of whitespace collapse to a single space.
#[derive(Clone)]
pub enum Matcher {
    /// The normalized text equals the string.
    Exact(String),
    /// The normalized text contains the string, ignoring case.
    Fuzzy(String),
    /// A custom test over the normalized text and the node it came from.
    Predicate(Predicate),
}

impl Matcher {
    pub fn exact(text: impl Into<String>) -> Self {
        Matcher::Exact(text.into())
    }

    pub fn fuzzy(text: impl Into<String>) -> Self {
        Matcher::Fuzzy(text.into())
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str, &Node) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(f))
    }

    pub fn matches(&self, text: &str, node: &Node) -> bool {
        let text = normalize(text);
        match self {
            Matcher::Exact(expected) => text == *expected,
            Matcher::Fuzzy(expected) => text.to_lowercase().contains(&expected.to_lowercase()),
            Matcher::Predicate(f) => f(&text, node),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(text) => write!(f, "{text}"),
            Matcher::Fuzzy(text) => write!(f, "/{text}/i"),
            Matcher::Predicate(_) => f.write_str("[predicate]"),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Exact(text) => f.debug_tuple("Exact").field(text).finish(),
            Matcher::Fuzzy(text) => f.debug_tuple("Fuzzy").field(text).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate"),
        }
    }
}

impl From<&str> for Matcher {
    fn from(text: &str) -> Self {
        Matcher::Exact(text.to_string())
    }
}

impl From<String> for Matcher {
    fn from(text: String) -> Self {
        Matcher::Exact(text)
    }
}

impl From<&String> for Matcher {
    fn from(text: &String) -> Self {
        Matcher::Exact(text.clone())
    }
}

/// Trim and collapse whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_ignores_surrounding_whitespace() {
        let node = Node::text("");
        let matcher = Matcher::from("Hello world");
        assert!(matcher.matches("  Hello \n  world ", &node));
        assert!(!matcher.matches("Hello world!", &node));
        assert!(!matcher.matches("hello world", &node));
    }

    #[test]
    fn fuzzy_is_case_insensitive_substring() {
        let node = Node::text("");
        let matcher = Matcher::fuzzy("WORLD");
        assert!(matcher.matches("Hello world!", &node));
        assert!(!matcher.matches("Hello", &node));
    }

    #[test]
    fn predicate_sees_node() {
        let node = Node::element("span");
        let matcher = Matcher::predicate(|text, node| {
            text.starts_with('4') && node.tag_name() == Some("span")
        });
        assert!(matcher.matches(" 42 ", &node));
        assert!(!matcher.matches("42", &Node::element("div")));
    }
}
