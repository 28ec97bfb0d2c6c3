//! HTML serialization.

use super::node::{Node, NodeKind};

/// Elements that never have a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// Elements whose text children are written verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

impl Node {
    /// Markup of the node's children.
    pub fn inner_html(&self) -> String {
        let raw = self
            .tag_name()
            .is_some_and(|tag| RAW_TEXT_ELEMENTS.contains(&tag));
        let mut out = String::new();
        for child in self.children() {
            write_node(&child, raw, &mut out);
        }
        out
    }

    /// Markup of the node including itself.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_node(self, false, &mut out);
        out
    }
}

fn write_node(node: &Node, raw_text: bool, out: &mut String) {
    match node.kind() {
        NodeKind::Document => out.push_str(&node.inner_html()),
        NodeKind::Text => {
            let data = node.data().unwrap_or_default();
            if raw_text {
                out.push_str(&data);
            } else {
                out.push_str(&escape_text(&data));
            }
        }
        NodeKind::Comment => {
            out.push_str("<!--");
            out.push_str(&node.data().unwrap_or_default());
            out.push_str("-->");
        }
        NodeKind::Element { tag } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in node.attributes() {
                out.push(' ');
                out.push_str(&name);
                out.push_str("=\"");
                out.push_str(&escape_attribute(&value));
                out.push('"');
            }
            out.push('>');
            if is_void_element(tag) {
                return;
            }
            out.push_str(&node.inner_html());
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn serializes_nested_elements_and_attributes() {
        let div = Node::element("div");
        div.set_attribute("id", "a\"b");
        div.set_attribute("class", "x");
        let span = Node::element("span");
        span.append_child(&Node::text("1 < 2 & 3")).unwrap();
        div.append_child(&span).unwrap();
        div.append_child(&Node::element("br")).unwrap();
        div.append_child(&Node::comment("note")).unwrap();

        assert_eq!(
            div.outer_html(),
            "<div id=\"a&quot;b\" class=\"x\"><span>1 &lt; 2 &amp; 3</span><br><!--note--></div>"
        );
        assert_eq!(
            div.inner_html(),
            "<span>1 &lt; 2 &amp; 3</span><br><!--note-->"
        );
    }

    #[test]
    fn script_text_is_not_escaped() {
        let script = Node::element("script");
        script.append_child(&Node::text("a < b && c")).unwrap();
        assert_eq!(script.outer_html(), "<script>a < b && c</script>");
    }

    #[test]
    fn empty_text_serializes_to_nothing() {
        let div = Node::element("div");
        div.append_child(&Node::text("")).unwrap();
        assert_eq!(div.outer_html(), "<div></div>");
    }
}
