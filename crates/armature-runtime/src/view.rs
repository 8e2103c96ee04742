//! Declarative element descriptions.

use std::fmt;
use std::rc::Rc;

/// Event handler attached to an element.
pub type Listener = Rc<dyn Fn()>;

/// Attribute marking a scalar signal binding.
pub const SCALAR_ATTR: &str = "data-sid";
/// Attribute marking an array-mapped signal binding.
pub const MAP_ATTR: &str = "data-smid";
/// Attribute marking a conditional signal binding.
pub const CONDITION_ATTR: &str = "data-scid";
/// Attribute marking the hydration-replaceable root of a route component.
pub const COMPONENT_ATTR: &str = "data-c-arm-id";
/// Attribute holding serialized route parameters on the mount container.
pub const PARAMS_ATTR: &str = "data-params";

/// Elements that never have children and render as `<tag/>`.
const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Whether `tag` is a void element.
pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// A dynamic value passed as an attribute or child.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Renders as an empty string.
    Null,
    /// Renders as `true` / `false`.
    Bool(bool),
    /// Renders with `f64` display (`2`, `2.5`).
    Number(f64),
    /// Renders escaped.
    Text(String),
    /// Arbitrary JSON; only scalars are renderable.
    Json(serde_json::Value),
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

macro_rules! attr_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for AttrValue {
            fn from(value: $t) -> Self {
                Self::Number(value as f64)
            }
        })*
    };
}

attr_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

/// Which kind of signal a bound region tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    /// Scalar text binding.
    Scalar,
    /// Array-mapped list binding.
    Map,
    /// Conditional branch binding.
    Condition,
}

impl BindingKind {
    /// Marker attribute for this binding kind.
    pub fn attr(&self) -> &'static str {
        match self {
            Self::Scalar => SCALAR_ATTR,
            Self::Map => MAP_ATTR,
            Self::Condition => CONDITION_ATTR,
        }
    }

    /// Wrapper tag for this binding kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Scalar => "span",
            Self::Map | Self::Condition => "div",
        }
    }
}

/// A region re-rendered when its signal changes.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Binding kind.
    pub kind: BindingKind,
    /// Owning signal's id.
    pub signal_id: String,
    /// Current content.
    pub content: Box<View>,
}

/// An element: tag, attributes, children and event listeners.
#[derive(Clone, Default)]
pub struct Element {
    /// Tag name.
    pub tag: String,
    /// Attributes in declaration order.
    pub attrs: Vec<(String, AttrValue)>,
    /// Child views.
    pub children: Vec<View>,
    /// Event listeners (client only).
    pub listeners: Vec<(String, Listener)>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let events: Vec<&str> = self.listeners.iter().map(|(e, _)| e.as_str()).collect();
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .field("listeners", &events)
            .finish()
    }
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Add an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Append a child.
    pub fn child(mut self, child: impl Into<View>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<I, V>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Attach an event listener, e.g. `on("click", ...)`.
    pub fn on(mut self, event: impl Into<String>, handler: impl Fn() + 'static) -> Self {
        self.listeners.push((event.into(), Rc::new(handler)));
        self
    }

    /// Wrap as a view.
    pub fn into_view(self) -> View {
        View::Element(self)
    }
}

/// A renderable tree.
#[derive(Debug, Clone, Default)]
pub enum View {
    /// Renders nothing.
    #[default]
    Empty,
    /// Escaped text.
    Text(String),
    /// Trusted HTML, emitted verbatim.
    Raw(String),
    /// A dynamic value, serialized at render time.
    Value(AttrValue),
    /// An element.
    Element(Element),
    /// Children without a wrapping element.
    Fragment(Vec<View>),
    /// A signal-bound region.
    Bound(Binding),
}

impl View {
    /// Trusted HTML.
    pub fn raw(html: impl Into<String>) -> Self {
        Self::Raw(html.into())
    }

    /// A fragment of views.
    pub fn fragment<I, V>(children: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<View>,
    {
        Self::Fragment(children.into_iter().map(Into::into).collect())
    }
}

impl From<Element> for View {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for View {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for View {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<AttrValue> for View {
    fn from(value: AttrValue) -> Self {
        Self::Value(value)
    }
}

impl From<serde_json::Value> for View {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(AttrValue::Json(value))
    }
}

impl From<bool> for View {
    fn from(value: bool) -> Self {
        Self::Value(AttrValue::Bool(value))
    }
}

impl<V: Into<View>> From<Option<V>> for View {
    fn from(value: Option<V>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

impl<V: Into<View>> From<Vec<V>> for View {
    fn from(children: Vec<V>) -> Self {
        Self::fragment(children)
    }
}

macro_rules! view_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for View {
            fn from(value: $t) -> Self {
                Self::Value(AttrValue::Number(value as f64))
            }
        })*
    };
}

view_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

/// Build an element view from a tag, attributes and children.
pub fn h(tag: &str, attrs: Vec<(&str, AttrValue)>, children: Vec<View>) -> View {
    let mut element = Element::new(tag);
    element.attrs = attrs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();
    element.children = children;
    View::Element(element)
}

/// Placeholder region that is later filled by the client.
pub fn suspense(id: &str, fallback: impl Into<View>) -> View {
    Element::new("div").attr("id", id).child(fallback).into_view()
}
