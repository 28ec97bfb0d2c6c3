//! Documents.

use super::node::Node;

/// A document with the usual `<html><head></head><body></body></html>` shell.
#[derive(Clone, Debug)]
pub struct Document {
    root: Node,
    html: Node,
    head: Node,
    body: Node,
}

thread_local! {
    static DOCUMENT: Document = Document::new();
}

/// The default document of the current thread.
///
/// Every thread gets its own document, so tests running in parallel never
/// see each other's markup.
pub fn document() -> Document {
    DOCUMENT.with(Clone::clone)
}

impl Document {
    pub fn new() -> Self {
        let head = Node::element("head");
        let body = Node::element("body");
        let html = Node::element("html").with_children([head.clone(), body.clone()]);
        let root = Node::document().with_children([html.clone()]);

        Self {
            root,
            html,
            head,
            body,
        }
    }

    /// The document node itself.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The `<html>` element.
    pub fn document_element(&self) -> &Node {
        &self.html
    }

    pub fn head(&self) -> &Node {
        &self.head
    }

    pub fn body(&self) -> &Node {
        &self.body
    }

    pub fn create_element(&self, tag: &str) -> Node {
        Node::element(tag)
    }

    pub fn create_text_node(&self, data: impl Into<String>) -> Node {
        Node::text(data)
    }

    pub fn create_comment(&self, data: impl Into<String>) -> Node {
        Node::comment(data)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Node> {
        self.root.find_by_id(id)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_has_empty_body() {
        let doc = Document::new();
        assert_eq!(doc.body().parent().as_ref(), Some(doc.document_element()));
        assert!(doc.body().is_connected());
        assert_eq!(doc.body().child_count(), 0);
    }

    #[test]
    fn shell_is_linked_in_order() {
        let doc = Document::new();
        let html = doc.document_element();
        assert_eq!(html.children(), vec![doc.head().clone(), doc.body().clone()]);
        assert_eq!(html.parent().as_ref(), Some(doc.root()));
        assert_eq!(doc.root().child_count(), 1);
        assert_eq!(doc.head().parent().as_ref(), Some(html));
    }

    #[test]
    fn thread_default_is_shared_within_thread() {
        let a = document();
        let b = document();
        assert_eq!(a.body(), b.body());

        let other = std::thread::spawn(|| document().body().id())
            .join()
            .unwrap();
        assert_ne!(other, a.body().id());
    }

    #[test]
    fn get_element_by_id_searches_connected_nodes() {
        let doc = Document::new();
        let div = doc.create_element("div");
        div.set_attribute("id", "target");
        assert!(doc.get_element_by_id("target").is_none());

        doc.body().append_child(&div).unwrap();
        assert_eq!(doc.get_element_by_id("target"), Some(div));
    }
}
