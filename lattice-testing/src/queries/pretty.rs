//! Readable markup for debug output and query errors.
//!
//! The layout follows the usual testing-library printout: one node per line,
//! attributes sorted and on their own lines, childless elements
//! self-closing.
//!
//! ```text
//! <div>
//!   <button
//!     class="primary"
//!     type="submit"
//!   >
//!     Save
//!   </button>
//!   <br />
//! </div>
//! ```

use lattice_core::dom::{Node, NodeKind};

#[derive(Debug, Clone)]
pub struct PrettyOptions {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Leave comment nodes out of the output.
    pub filter_comments: bool,
}

impl Default for PrettyOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            filter_comments: true,
        }
    }
}

/// Pretty-print `node`, truncated to `max_length` characters.
///
/// Truncated output ends with `...`.
pub fn pretty_dom(node: &Node, max_length: usize, options: &PrettyOptions) -> String {
    let mut out = String::new();
    write_node(node, 0, options, &mut out);
    let out = out.trim_end_matches('\n').to_string();

    match out.char_indices().nth(max_length) {
        Some((cut, _)) => format!("{}...", &out[..cut]),
        None => out,
    }
}

fn visible(node: &Node, options: &PrettyOptions) -> bool {
    match node.kind() {
        NodeKind::Comment => !options.filter_comments,
        NodeKind::Text => !node.data().unwrap_or_default().trim().is_empty(),
        NodeKind::Element { tag } => tag != "script" && tag != "style",
        NodeKind::Document => true,
    }
}

fn push_line(depth: usize, options: &PrettyOptions, line: &str, out: &mut String) {
    out.push_str(&" ".repeat(depth * options.indent));
    out.push_str(line);
    out.push('\n');
}

fn write_node(node: &Node, depth: usize, options: &PrettyOptions, out: &mut String) {
    match node.kind() {
        NodeKind::Document => {
            for child in node.children() {
                if visible(&child, options) {
                    write_node(&child, depth, options, out);
                }
            }
        }
        NodeKind::Text => {
            for line in node.data().unwrap_or_default().lines() {
                if !line.trim().is_empty() {
                    push_line(depth, options, line.trim(), out);
                }
            }
        }
        NodeKind::Comment => {
            push_line(depth, options, &format!("<!--{}-->", node.data().unwrap_or_default()), out);
        }
        NodeKind::Element { tag } => {
            let mut attributes = node.attributes();
            attributes.sort_by(|a, b| a.0.cmp(&b.0));
            let children: Vec<Node> = node
                .children()
                .into_iter()
                .filter(|child| visible(child, options))
                .collect();

            if attributes.is_empty() {
                if children.is_empty() {
                    push_line(depth, options, &format!("<{tag} />"), out);
                    return;
                }
                push_line(depth, options, &format!("<{tag}>"), out);
            } else {
                push_line(depth, options, &format!("<{tag}"), out);
                for (name, value) in &attributes {
                    push_line(depth + 1, options, &format!("{name}=\"{value}\""), out);
                }
                if children.is_empty() {
                    push_line(depth, options, "/>", out);
                    return;
                }
                push_line(depth, options, ">", out);
            }

            for child in &children {
                write_node(child, depth + 1, options, out);
            }
            push_line(depth, options, &format!("</{tag}>"), out);
        }
    }
}
