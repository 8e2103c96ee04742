//! Minimal document surface for mounting and patching.

use crate::escape::{escape_attr, escape_html};
use crate::view::{is_void_element, Listener};

/// Handle to a node inside a [`Document`].
pub type NodeId = usize;

/// The operations the runtime needs from a DOM.
///
/// A browser binding implements this against the real DOM; [`MemoryDocument`]
/// implements it in memory for server-side tests.
pub trait Document {
    /// Root node that mounts attach under.
    fn root(&self) -> NodeId;

    /// Create a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Create a detached text node.
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Create a detached node holding trusted HTML.
    fn create_raw(&mut self, html: &str) -> NodeId;

    /// Set an attribute on an element.
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    /// Read an attribute of an element.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Append `child` to `parent`, detaching it from any previous parent.
    fn append_child(&mut self, parent: NodeId, child: NodeId);

    /// Replace `old` (a child of its parent) with `new`.
    fn replace_node(&mut self, old: NodeId, new: NodeId);

    /// Attach an event listener.
    fn add_listener(&mut self, node: NodeId, event: &str, listener: Listener);

    /// Replace a node's children with trusted HTML.
    fn set_inner_html(&mut self, node: NodeId, html: &str);

    /// Replace a node's children with a text node.
    fn set_text_content(&mut self, node: NodeId, text: &str);

    /// Attached nodes carrying `name="value"`, in document order.
    fn query_by_attribute(&self, name: &str, value: &str) -> Vec<NodeId>;

    /// Serialized children of a node.
    fn inner_html(&self, node: NodeId) -> String;
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element { tag: String, attrs: Vec<(String, String)> },
    Text(String),
    Raw(String),
}

struct Node {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    listeners: Vec<(String, Listener)>,
}

/// In-memory [`Document`].
pub struct MemoryDocument {
    nodes: Vec<Node>,
}

impl MemoryDocument {
    /// Create a document with an empty `<body>` root.
    pub fn new() -> Self {
        let mut doc = Self { nodes: Vec::new() };
        doc.push(NodeKind::Element {
            tag: "body".to_string(),
            attrs: Vec::new(),
        });
        doc
    }

    /// Invoke every listener registered for `event` on `node`.
    ///
    /// Returns the number of listeners called.
    pub fn dispatch(&self, node: NodeId, event: &str) -> usize {
        let listeners: Vec<Listener> = self.nodes[node]
            .listeners
            .iter()
            .filter(|(name, _)| name == event)
            .map(|(_, l)| l.clone())
            .collect();
        for listener in &listeners {
            listener();
        }
        listeners.len()
    }

    /// Serialize a node including its own tag.
    pub fn outer_html(&self, node: NodeId) -> String {
        match &self.nodes[node].kind {
            NodeKind::Text(text) => escape_html(text),
            NodeKind::Raw(html) => html.clone(),
            NodeKind::Element { tag, attrs } => {
                let mut open = tag.clone();
                for (name, value) in attrs {
                    open.push_str(&format!(" {}=\"{}\"", name, escape_attr(value)));
                }
                if is_void_element(tag) {
                    format!("<{}/>", open)
                } else {
                    format!("<{}>{}</{}>", open, self.inner_html(node), tag)
                }
            }
        }
    }

    /// Children of a node.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            parent: None,
            children: Vec::new(),
            listeners: Vec::new(),
        });
        self.nodes.len() - 1
    }

    fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node].parent.take() {
            self.nodes[parent].children.retain(|c| *c != node);
        }
    }

    fn clear_children(&mut self, node: NodeId) {
        let children = std::mem::take(&mut self.nodes[node].children);
        for child in children {
            self.nodes[child].parent = None;
        }
    }

    fn collect_matching(&self, node: NodeId, name: &str, value: &str, out: &mut Vec<NodeId>) {
        if let NodeKind::Element { attrs, .. } = &self.nodes[node].kind {
            if attrs.iter().any(|(n, v)| n == name && v == value) {
                out.push(node);
            }
        }
        for child in &self.nodes[node].children {
            self.collect_matching(*child, name, value, out);
        }
    }
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl Document for MemoryDocument {
    fn root(&self) -> NodeId {
        0
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
        })
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeKind::Text(text.to_string()))
    }

    fn create_raw(&mut self, html: &str) -> NodeId {
        self.push(NodeKind::Raw(html.to_string()))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node].kind {
            match attrs.iter_mut().find(|(n, _)| n == name) {
                Some(existing) => existing.1 = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes[node].kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
    }

    fn replace_node(&mut self, old: NodeId, new: NodeId) {
        let Some(parent) = self.nodes[old].parent else {
            return;
        };
        self.detach(new);
        if let Some(slot) = self.nodes[parent].children.iter_mut().find(|c| **c == old) {
            *slot = new;
        }
        self.nodes[old].parent = None;
        self.nodes[new].parent = Some(parent);
    }

    fn add_listener(&mut self, node: NodeId, event: &str, listener: Listener) {
        self.nodes[node].listeners.push((event.to_string(), listener));
    }

    fn set_inner_html(&mut self, node: NodeId, html: &str) {
        self.clear_children(node);
        if !html.is_empty() {
            let raw = self.create_raw(html);
            self.append_child(node, raw);
        }
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.clear_children(node);
        let text = self.create_text(text);
        self.append_child(node, text);
    }

    fn query_by_attribute(&self, name: &str, value: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_matching(self.root(), name, value, &mut out);
        out
    }

    fn inner_html(&self, node: NodeId) -> String {
        self.nodes[node]
            .children
            .iter()
            .map(|c| self.outer_html(*c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_build_and_serialize() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element("div");
        doc.set_attribute(div, "class", "card");
        let text = doc.create_text("a < b");
        doc.append_child(div, text);
        doc.append_child(doc.root(), div);

        assert_eq!(doc.inner_html(doc.root()), r#"<div class="card">a &lt; b</div>"#);
    }

    #[test]
    fn test_query_skips_detached_nodes() {
        let mut doc = MemoryDocument::new();
        let attached = doc.create_element("span");
        doc.set_attribute(attached, "data-sid", "s1");
        doc.append_child(doc.root(), attached);
        let detached = doc.create_element("span");
        doc.set_attribute(detached, "data-sid", "s1");

        assert_eq!(doc.query_by_attribute("data-sid", "s1"), vec![attached]);
    }

    #[test]
    fn test_replace_node_keeps_position() {
        let mut doc = MemoryDocument::new();
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        let c = doc.create_element("i");
        doc.append_child(doc.root(), a);
        doc.append_child(doc.root(), b);
        doc.replace_node(a, c);

        assert_eq!(doc.children(doc.root()), &[c, b]);
    }

    #[test]
    fn test_inner_html_replacement() {
        let mut doc = MemoryDocument::new();
        let div = doc.create_element("div");
        doc.append_child(doc.root(), div);
        doc.set_text_content(div, "old");
        doc.set_inner_html(div, "<b>new</b>");
        assert_eq!(doc.inner_html(div), "<b>new</b>");

        doc.set_inner_html(div, "");
        assert_eq!(doc.inner_html(div), "");
    }

    #[test]
    fn test_dispatch_calls_listeners() {
        let mut doc = MemoryDocument::new();
        let button = doc.create_element("button");
        let clicks = Rc::new(Cell::new(0));
        let counter = clicks.clone();
        doc.add_listener(button, "click", Rc::new(move || counter.set(counter.get() + 1)));

        assert_eq!(doc.dispatch(button, "click"), 1);
        assert_eq!(doc.dispatch(button, "input"), 0);
        assert_eq!(clicks.get(), 1);
    }
}
