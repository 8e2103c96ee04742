//! Server and client rendering.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::dom::{Document, NodeId};
use crate::error::RenderError;
use crate::escape::{escape_attr, escape_html};
use crate::view::{is_void_element, AttrValue, Binding, Element, View};

/// Message shown in place of a component that failed to render.
pub const FALLBACK_MESSAGE: &str = "An error occurred. Please try refreshing the page.";

/// Markup shown in place of a component that failed to render.
pub fn fallback_html() -> String {
    format!("<p>{}</p>", FALLBACK_MESSAGE)
}

/// Where a view is rendered.
pub enum RenderTarget<'a> {
    /// Serialize to an HTML string.
    Server,
    /// Build live nodes under `parent`.
    Client {
        /// Document to build in.
        document: &'a mut dyn Document,
        /// Parent the new nodes are appended to.
        parent: NodeId,
    },
}

/// Output of [`render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// Serialized HTML.
    Html(String),
    /// Top-level nodes created in the document.
    Nodes(Vec<NodeId>),
}

/// Render a view for the given target.
pub fn render(view: &View, target: RenderTarget<'_>) -> Result<Rendered, RenderError> {
    match target {
        RenderTarget::Server => render_to_string(view).map(Rendered::Html),
        RenderTarget::Client { document, parent } => {
            mount(view, document, parent).map(Rendered::Nodes)
        }
    }
}

/// Serialize a dynamic value as text.
///
/// JSON arrays and objects have no text form and are rejected.
pub fn serialize_value(value: &AttrValue) -> Result<String, RenderError> {
    match value {
        AttrValue::Null => Ok(String::new()),
        AttrValue::Bool(b) => Ok(b.to_string()),
        AttrValue::Number(n) => Ok(n.to_string()),
        AttrValue::Text(s) => Ok(s.clone()),
        AttrValue::Json(json) => match json {
            serde_json::Value::Null => Ok(String::new()),
            serde_json::Value::Bool(b) => Ok(b.to_string()),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            serde_json::Value::String(s) => Ok(s.clone()),
            serde_json::Value::Array(_) => Err(RenderError::Serialization("array".to_string())),
            serde_json::Value::Object(_) => Err(RenderError::Serialization("object".to_string())),
        },
    }
}

/// Serialize a view to HTML.
pub fn render_to_string(view: &View) -> Result<String, RenderError> {
    let mut out = String::new();
    write_view(view, &mut out)?;
    Ok(out)
}

fn write_view(view: &View, out: &mut String) -> Result<(), RenderError> {
    match view {
        View::Empty => {}
        View::Text(text) => out.push_str(&escape_html(text)),
        View::Raw(html) => out.push_str(html),
        View::Value(value) => out.push_str(&escape_html(&serialize_value(value)?)),
        View::Fragment(children) => {
            for child in children {
                write_view(child, out)?;
            }
        }
        View::Element(element) => write_element(element, out)?,
        View::Bound(binding) => write_binding(binding, out)?,
    }
    Ok(())
}

fn write_element(element: &Element, out: &mut String) -> Result<(), RenderError> {
    let mut open = element.tag.clone();
    for (name, value) in &element.attrs {
        open.push_str(&format!(" {}=\"{}\"", name, escape_attr(&serialize_value(value)?)));
    }

    if is_void_element(&element.tag) {
        out.push_str(&format!("<{}/>", open));
        return Ok(());
    }

    out.push_str(&format!("<{}>", open));
    for child in &element.children {
        write_view(child, out)?;
    }
    out.push_str(&format!("</{}>", element.tag));
    Ok(())
}

fn write_binding(binding: &Binding, out: &mut String) -> Result<(), RenderError> {
    let tag = binding.kind.tag();
    out.push_str(&format!(
        "<{} {}=\"{}\">",
        tag,
        binding.kind.attr(),
        escape_attr(&binding.signal_id)
    ));
    write_view(&binding.content, out)?;
    out.push_str(&format!("</{}>", tag));
    Ok(())
}

/// Build live nodes for a view under `parent`. Returns the top-level nodes.
pub fn mount(
    view: &View,
    document: &mut dyn Document,
    parent: NodeId,
) -> Result<Vec<NodeId>, RenderError> {
    let mut created = Vec::new();
    mount_into(view, document, parent, &mut created)?;
    Ok(created)
}

fn mount_into(
    view: &View,
    document: &mut dyn Document,
    parent: NodeId,
    created: &mut Vec<NodeId>,
) -> Result<(), RenderError> {
    let node = match view {
        View::Empty => return Ok(()),
        View::Text(text) => document.create_text(text.trim()),
        View::Raw(html) => document.create_raw(html),
        View::Value(value) => document.create_text(&serialize_value(value)?),
        View::Fragment(children) => {
            for child in children {
                mount_into(child, document, parent, created)?;
            }
            return Ok(());
        }
        View::Element(element) => {
            let node = document.create_element(&element.tag);
            for (name, value) in &element.attrs {
                document.set_attribute(node, name, &serialize_value(value)?);
            }
            for (event, listener) in &element.listeners {
                document.add_listener(node, event, listener.clone());
            }
            for child in &element.children {
                mount_into(child, document, node, &mut Vec::new())?;
            }
            node
        }
        View::Bound(binding) => {
            let node = document.create_element(binding.kind.tag());
            document.set_attribute(node, binding.kind.attr(), &binding.signal_id);
            mount_into(&binding.content, document, node, &mut Vec::new())?;
            node
        }
    };

    document.append_child(parent, node);
    created.push(node);
    Ok(())
}

/// Render a component, substituting the fallback message if it fails.
///
/// Component errors and panics are contained here. A serialization error is
/// a misuse of the runtime and is returned to the caller instead.
pub fn render_boundary<F>(component: F) -> Result<String, RenderError>
where
    F: FnOnce() -> Result<View, RenderError>,
{
    let view = match catch_unwind(AssertUnwindSafe(component)) {
        Ok(Ok(view)) => view,
        Ok(Err(RenderError::Serialization(what))) => {
            return Err(RenderError::Serialization(what));
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "component failed to render");
            return Ok(fallback_html());
        }
        Err(_) => {
            tracing::error!("component panicked while rendering");
            return Ok(fallback_html());
        }
    };

    render_to_string(&view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::view::{h, suspense};
    use serde_json::json;

    // === String Rendering Tests ===

    #[test]
    fn test_element_with_attrs_and_children() {
        let view = h(
            "a",
            vec![("href", "/users?id=1&x=2".into()), ("data-n", 3.into())],
            vec!["Profile".into()],
        );
        assert_eq!(
            render_to_string(&view).unwrap(),
            r#"<a href="/users?id=1&amp;x=2" data-n="3">Profile</a>"#
        );
    }

    #[test]
    fn test_empty_and_void_elements() {
        assert_eq!(render_to_string(&h("div", vec![], vec![])).unwrap(), "<div></div>");
        assert_eq!(
            render_to_string(&h("img", vec![("alt", "x".into())], vec![])).unwrap(),
            r#"<img alt="x"/>"#
        );
    }

    #[test]
    fn test_fragment_concatenates_children() {
        let view = View::fragment(vec![h("li", vec![], vec!["a".into()]), h("li", vec![], vec!["b".into()])]);
        assert_eq!(render_to_string(&view).unwrap(), "<li>a</li><li>b</li>");
    }

    #[test]
    fn test_scalar_values() {
        let view = View::fragment(vec![
            View::from(2.5),
            View::from(" "),
            View::from(true),
            View::from(AttrValue::Null),
            View::from(json!("<x>")),
        ]);
        assert_eq!(render_to_string(&view).unwrap(), "2.5true&lt;x&gt;");
    }

    #[test]
    fn test_text_is_escaped_and_raw_is_not() {
        let view = View::fragment(vec![View::from("<b>"), View::raw("<b>ok</b>")]);
        assert_eq!(render_to_string(&view).unwrap(), "&lt;b&gt;<b>ok</b>");
    }

    #[test]
    fn test_object_values_fail_serialization() {
        let view = h("div", vec![], vec![View::from(json!({"a": 1}))]);
        assert_eq!(
            render_to_string(&view),
            Err(RenderError::Serialization("object".to_string()))
        );

        let attr = h("div", vec![("data-x", json!([1, 2]).into())], vec![]);
        assert!(render_to_string(&attr).is_err());
    }

    #[test]
    fn test_suspense_placeholder() {
        let view = suspense("feed", "Loading...");
        assert_eq!(render_to_string(&view).unwrap(), r#"<div id="feed">Loading...</div>"#);
    }

    // === Client Mount Tests ===

    #[test]
    fn test_mount_builds_nodes() {
        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let view = View::fragment(vec![
            h("p", vec![("class", "a".into())], vec!["one".into()]),
            h("p", vec![], vec![]),
        ]);

        let nodes = mount(&view, &mut doc, root).unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(doc.inner_html(root), r#"<p class="a">one</p><p></p>"#);
    }

    #[test]
    fn test_mount_attaches_listeners() {
        use std::cell::Cell;
        use std::rc::Rc;

        let clicked = Rc::new(Cell::new(false));
        let flag = clicked.clone();
        let view = Element::new("button")
            .child("Go")
            .on("click", move || flag.set(true))
            .into_view();

        let mut doc = MemoryDocument::new();
        let root = doc.root();
        let nodes = mount(&view, &mut doc, root).unwrap();
        doc.dispatch(nodes[0], "click");
        assert!(clicked.get());
    }

    #[test]
    fn test_render_targets_agree() {
        let view = h("ul", vec![], vec![h("li", vec![], vec!["x".into()])]);
        let mut doc = MemoryDocument::new();
        let root = doc.root();

        let Rendered::Html(html) = render(&view, RenderTarget::Server).unwrap() else {
            panic!("expected html");
        };
        render(&view, RenderTarget::Client { document: &mut doc, parent: root }).unwrap();
        assert_eq!(html, doc.inner_html(root));
    }

    // === Error Boundary Tests ===

    #[test]
    fn test_boundary_replaces_failed_component() {
        let html = render_boundary(|| Err(RenderError::Component("db down".to_string()))).unwrap();
        assert_eq!(html, fallback_html());
    }

    #[test]
    fn test_boundary_contains_panics() {
        let html = render_boundary(|| -> Result<View, RenderError> { panic!("bad props") }).unwrap();
        assert!(html.contains(FALLBACK_MESSAGE));
    }

    #[test]
    fn test_boundary_propagates_serialization_errors() {
        let result = render_boundary(|| Ok(View::from(json!({}))));
        assert!(matches!(result, Err(RenderError::Serialization(_))));
    }
}
