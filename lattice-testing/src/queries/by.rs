//! The built-in queries.
//!
//! Role and accessible-name computation is a simplified subset of the ARIA
//! rules: explicit `role` attributes win, a table of implicit roles covers
//! common elements, and names come from `aria-labelledby`, `aria-label`,
//! associated `<label>`s, `alt`, text content and `title`, in that order.

use lattice_core::dom::Node;

use super::matcher::{normalize, Matcher};
use super::{Query, QueryConfig};

/// Elements that a `<label>` can point at.
const LABELABLE: &[&str] = &[
    "button", "input", "meter", "output", "progress", "select", "textarea",
];

/// Which elements a query selects.
#[derive(Debug, Clone)]
pub enum By {
    /// Elements whose own text matches.
    Text(Matcher),
    /// Elements whose test id attribute matches.
    TestId(Matcher),
    Role(RoleFilter),
    /// Form controls whose label matches.
    LabelText(Matcher),
    PlaceholderText(Matcher),
    /// `img`, `input` and `area` elements whose `alt` matches.
    AltText(Matcher),
    Title(Matcher),
    /// Form controls whose current value matches.
    DisplayValue(Matcher),
}

/// Role query with optional name and heading level filters.
#[derive(Debug, Clone)]
pub struct RoleFilter {
    pub role: String,
    pub name: Option<Matcher>,
    pub level: Option<u8>,
}

impl RoleFilter {
    pub fn new(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: None,
            level: None,
        }
    }

    pub fn name(mut self, name: impl Into<Matcher>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn level(mut self, level: u8) -> Self {
        self.level = Some(level);
        self
    }
}

impl From<&str> for RoleFilter {
    fn from(role: &str) -> Self {
        Self::new(role)
    }
}

impl From<String> for RoleFilter {
    fn from(role: String) -> Self {
        Self::new(role)
    }
}

impl Query for By {
    fn query_all(&self, container: &Node, config: &QueryConfig) -> Vec<Node> {
        let elements = elements(container);
        match self {
            By::Text(matcher) => elements
                .into_iter()
                .filter(|node| !node.tag_name().is_some_and(|tag| config.ignores(tag)))
                .filter(|node| {
                    let text = own_text(node);
                    !text.is_empty() && matcher.matches(&text, node)
                })
                .collect(),
            By::TestId(matcher) => by_attribute(elements, &config.test_id_attribute, matcher),
            By::Role(filter) => elements
                .into_iter()
                .filter(|node| matches_role(node, filter))
                .collect(),
            By::LabelText(matcher) => labelled(container, &elements, matcher),
            By::PlaceholderText(matcher) => by_attribute(elements, "placeholder", matcher),
            By::AltText(matcher) => by_attribute(elements, "alt", matcher)
                .into_iter()
                .filter(|node| matches!(node.tag_name(), Some("img" | "input" | "area")))
                .collect(),
            By::Title(matcher) => elements
                .into_iter()
                .filter(|node| match node.attribute("title") {
                    Some(title) => matcher.matches(&title, node),
                    None => is_svg_title(node) && matcher.matches(&node.text_content(), node),
                })
                .collect(),
            By::DisplayValue(matcher) => elements
                .into_iter()
                .filter(|node| {
                    display_value(node).is_some_and(|value| matcher.matches(&value, node))
                })
                .collect(),
        }
    }

    fn describe(&self) -> String {
        match self {
            By::Text(m) => format!("with the text: {m}"),
            By::TestId(m) => format!("with the test id: {m}"),
            By::Role(filter) => {
                let mut out = format!("with the role \"{}\"", filter.role);
                if let Some(name) = &filter.name {
                    out.push_str(&format!(" and name \"{name}\""));
                }
                if let Some(level) = filter.level {
                    out.push_str(&format!(" and level {level}"));
                }
                out
            }
            By::LabelText(m) => format!("with the label text: {m}"),
            By::PlaceholderText(m) => format!("with the placeholder text: {m}"),
            By::AltText(m) => format!("with the alt text: {m}"),
            By::Title(m) => format!("with the title: {m}"),
            By::DisplayValue(m) => format!("with the display value: {m}"),
        }
    }
}

/// Element descendants of `container`, in document order.
fn elements(container: &Node) -> Vec<Node> {
    container
        .descendants()
        .into_iter()
        .filter(Node::is_element)
        .collect()
}

fn by_attribute(elements: Vec<Node>, attribute: &str, matcher: &Matcher) -> Vec<Node> {
    elements
        .into_iter()
        .filter(|node| {
            node.attribute(attribute)
                .is_some_and(|value| matcher.matches(&value, node))
        })
        .collect()
}

/// Text of the node's direct text children.
fn own_text(node: &Node) -> String {
    node.children()
        .iter()
        .filter(|child| child.is_text())
        .filter_map(Node::data)
        .collect()
}

fn is_svg_title(node: &Node) -> bool {
    node.tag_name() == Some("title")
        && node
            .parent()
            .is_some_and(|parent| parent.tag_name() == Some("svg"))
}

// ----------------------------------------------------------------------------
// Roles
// ----------------------------------------------------------------------------

fn matches_role(node: &Node, filter: &RoleFilter) -> bool {
    if role_of(node).as_deref() != Some(filter.role.as_str()) {
        return false;
    }
    if let Some(level) = filter.level {
        if heading_level(node) != Some(level) {
            return false;
        }
    }
    match &filter.name {
        Some(name) => name.matches(&accessible_name(node), node),
        None => true,
    }
}

/// Explicit role if present, otherwise the implicit role of the element.
pub fn role_of(node: &Node) -> Option<String> {
    if let Some(explicit) = node.attribute("role") {
        if let Some(first) = explicit.split_whitespace().next() {
            return Some(first.to_string());
        }
    }
    implicit_role(node).map(str::to_string)
}

fn implicit_role(node: &Node) -> Option<&'static str> {
    let role = match node.tag_name()? {
        "a" | "area" if node.has_attribute("href") => "link",
        "article" => "article",
        "aside" => "complementary",
        "button" => "button",
        "dialog" => "dialog",
        "footer" => "contentinfo",
        "form" => "form",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "heading",
        "header" => "banner",
        "hr" => "separator",
        "img" => match node.attribute("alt").as_deref() {
            Some("") => "presentation",
            _ => "img",
        },
        "input" => return input_role(node),
        "li" => "listitem",
        "main" => "main",
        "nav" => "navigation",
        "ol" | "ul" => "list",
        "option" => "option",
        "p" => "paragraph",
        "progress" => "progressbar",
        "section" => "region",
        "select" => {
            let size = node
                .attribute("size")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0);
            if node.has_attribute("multiple") || size > 1 {
                "listbox"
            } else {
                "combobox"
            }
        }
        "table" => "table",
        "tbody" | "thead" | "tfoot" => "rowgroup",
        "td" => "cell",
        "textarea" => "textbox",
        "th" => "columnheader",
        "tr" => "row",
        _ => return None,
    };
    Some(role)
}

fn input_role(node: &Node) -> Option<&'static str> {
    let kind = node
        .attribute("type")
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string());
    let role = match kind.as_str() {
        "button" | "image" | "reset" | "submit" => "button",
        "checkbox" => "checkbox",
        "radio" => "radio",
        "range" => "slider",
        "number" => "spinbutton",
        "search" => "searchbox",
        "email" | "tel" | "text" | "url" => "textbox",
        _ => return None,
    };
    Some(role)
}

fn heading_level(node: &Node) -> Option<u8> {
    if let Some(level) = node.attribute("aria-level").and_then(|l| l.parse().ok()) {
        return Some(level);
    }
    match node.tag_name()? {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Accessible name of an element.
pub fn accessible_name(node: &Node) -> String {
    if let Some(ids) = node.attribute("aria-labelledby") {
        let root = node.root();
        let text: Vec<String> = ids
            .split_whitespace()
            .filter_map(|id| root.find_by_id(id))
            .map(|label| label.text_content())
            .collect();
        if !text.is_empty() {
            return normalize(&text.join(" "));
        }
    }
    if let Some(label) = node.attribute("aria-label").filter(|l| !l.trim().is_empty()) {
        return normalize(&label);
    }
    if is_labelable(node) {
        let labels = labels_of(node);
        if !labels.is_empty() {
            let text: Vec<String> = labels.iter().map(Node::text_content).collect();
            return normalize(&text.join(" "));
        }
    }
    if let Some(alt) = node.attribute("alt").filter(|_| node.tag_name() == Some("img")) {
        return normalize(&alt);
    }
    let content = normalize(&node.text_content());
    if !content.is_empty() && !matches!(node.tag_name(), Some("input" | "select" | "textarea")) {
        return content;
    }
    node.attribute("title").map(|t| normalize(&t)).unwrap_or_default()
}

// ----------------------------------------------------------------------------
// Labels
// ----------------------------------------------------------------------------

fn is_labelable(node: &Node) -> bool {
    node.tag_name().is_some_and(|tag| LABELABLE.contains(&tag))
}

/// `<label>` elements associated with a form control.
fn labels_of(node: &Node) -> Vec<Node> {
    let mut labels = Vec::new();
    if let Some(id) = node.attribute("id") {
        labels.extend(
            node.root()
                .descendants()
                .into_iter()
                .filter(|n| {
                    n.tag_name() == Some("label")
                        && n.attribute("for").as_deref() == Some(id.as_str())
                }),
        );
    }
    labels.extend(
        node.ancestors()
            .into_iter()
            .filter(|a| a.tag_name() == Some("label") && !a.has_attribute("for")),
    );
    labels
}

/// The control a `<label>` points at.
fn control_of(label: &Node) -> Option<Node> {
    match label.attribute("for") {
        Some(id) => label.root().find_by_id(&id).filter(is_labelable),
        None => label.descendants().into_iter().find(is_labelable),
    }
}

fn labelled(container: &Node, elements: &[Node], matcher: &Matcher) -> Vec<Node> {
    let mut found: Vec<Node> = Vec::new();
    let mut push = |node: Node| {
        if container.contains(&node) && node != *container && !found.contains(&node) {
            found.push(node);
        }
    };

    for label in elements.iter().filter(|n| n.tag_name() == Some("label")) {
        if matcher.matches(&label.text_content(), label) {
            if let Some(control) = control_of(label) {
                push(control);
            }
        }
    }
    for node in elements {
        if node
            .attribute("aria-label")
            .is_some_and(|label| matcher.matches(&label, node))
        {
            push(node.clone());
        }
        if node.has_attribute("aria-labelledby") && matcher.matches(&accessible_name(node), node) {
            push(node.clone());
        }
    }
    found
}

// ----------------------------------------------------------------------------
// Values
// ----------------------------------------------------------------------------

fn display_value(node: &Node) -> Option<String> {
    match node.tag_name()? {
        "input" => {
            let kind = node.attribute("type").unwrap_or_default();
            if matches!(
                kind.as_str(),
                "checkbox" | "radio" | "button" | "submit" | "reset" | "image"
            ) {
                return None;
            }
            Some(node.attribute("value").unwrap_or_default())
        }
        "textarea" => Some(
            node.attribute("value")
                .unwrap_or_else(|| node.text_content()),
        ),
        "select" => {
            let options: Vec<Node> = node
                .descendants()
                .into_iter()
                .filter(|n| n.tag_name() == Some("option"))
                .collect();
            options
                .iter()
                .find(|o| o.has_attribute("selected"))
                .or_else(|| options.first())
                .map(Node::text_content)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Node {
        let root = Node::element("div");
        let html = [
            ("h2", vec![("id", "title")], Some("Settings")),
            ("button", vec![], Some("Save")),
            ("button", vec![("aria-label", "Close dialog")], Some("x")),
            (
                "input",
                vec![
                    ("id", "email"),
                    ("placeholder", "you@example.com"),
                    ("value", "a@b.c"),
                ],
                None,
            ),
            ("a", vec![("href", "/home"), ("title", "Go home")], Some("Home")),
            ("img", vec![("alt", "Logo")], None),
        ];
        for (tag, attributes, text) in html {
            let node = Node::element(tag);
            for (name, value) in attributes {
                node.set_attribute(name, value);
            }
            if let Some(text) = text {
                node.append_child(&Node::text(text)).unwrap();
            }
            root.append_child(&node).unwrap();
        }
        let label = Node::element("label");
        label.set_attribute("for", "email");
        label.append_child(&Node::text("Email address")).unwrap();
        root.append_child(&label).unwrap();
        root
    }

    fn run(by: By, root: &Node) -> Vec<Option<String>> {
        by.query_all(root, &QueryConfig::default())
            .iter()
            .map(|n| n.tag_name().map(str::to_string))
            .collect()
    }

    #[test]
    fn role_with_name_and_level() {
        let root = tree();
        assert_eq!(run(By::Role("button".into()), &root).len(), 2);
        assert_eq!(run(By::Role(RoleFilter::new("button").name("Save")), &root).len(), 1);
        assert_eq!(run(By::Role(RoleFilter::new("button").name("Close dialog")), &root).len(), 1);
        assert_eq!(run(By::Role(RoleFilter::new("heading").level(2)), &root).len(), 1);
        assert_eq!(run(By::Role(RoleFilter::new("heading").level(1)), &root).len(), 0);
        assert_eq!(run(By::Role("link".into()), &root), vec![Some("a".to_string())]);
        assert_eq!(run(By::Role(RoleFilter::new("textbox").name("Email address")), &root).len(), 1);
    }

    #[test]
    fn attribute_queries() {
        let root = tree();
        assert_eq!(run(By::PlaceholderText("you@example.com".into()), &root).len(), 1);
        assert_eq!(run(By::AltText("Logo".into()), &root), vec![Some("img".to_string())]);
        assert_eq!(run(By::Title("Go home".into()), &root), vec![Some("a".to_string())]);
        assert_eq!(run(By::DisplayValue("a@b.c".into()), &root), vec![Some("input".to_string())]);
    }

    #[test]
    fn label_text_resolves_controls() {
        let root = tree();
        assert_eq!(
            run(By::LabelText("Email address".into()), &root),
            vec![Some("input".to_string())]
        );
        assert_eq!(
            run(By::LabelText("Close dialog".into()), &root),
            vec![Some("button".to_string())]
        );

        let wrapping = Node::element("label");
        wrapping.append_child(&Node::text("Remember me ")).unwrap();
        let checkbox = Node::element("input");
        checkbox.set_attribute("type", "checkbox");
        wrapping.append_child(&checkbox).unwrap();
        root.append_child(&wrapping).unwrap();

        let found =
            By::LabelText(Matcher::exact("Remember me")).query_all(&root, &QueryConfig::default());
        assert_eq!(found, vec![checkbox]);
    }

    #[test]
    fn text_skips_ignored_elements() {
        let root = Node::element("div");
        let style = Node::element("style");
        style.append_child(&Node::text("hidden")).unwrap();
        let span = Node::element("span");
        span.append_child(&Node::text("hidden")).unwrap();
        root.append_child(&style).unwrap();
        root.append_child(&span).unwrap();

        let found = By::Text("hidden".into()).query_all(&root, &QueryConfig::default());
        assert_eq!(found, vec![span]);
    }
}
