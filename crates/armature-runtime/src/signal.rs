//! Reactive value cells.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexSet;

use crate::dom::Document;
use crate::effect::Dependency;
use crate::error::{ReactiveError, RenderError};
use crate::state::{Runtime, SubscriberId};
use crate::storage::KeyValueStorage;
use crate::view::{Binding, BindingKind, View, CONDITION_ATTR, MAP_ATTR, SCALAR_ATTR};

/// Text written into a scalar binding when its signal changes.
pub trait BindingText {
    /// Render as plain text.
    fn binding_text(&self) -> String;
}

macro_rules! binding_text_display {
    ($($t:ty),*) => {
        $(impl BindingText for $t {
            fn binding_text(&self) -> String {
                self.to_string()
            }
        })*
    };
}

binding_text_display!(
    i8, i16, i32, i64, i128, u8, u16, u32, u64, u128, usize, isize, f32, f64, bool, char, String
);

impl BindingText for &'static str {
    fn binding_text(&self) -> String {
        (*self).to_string()
    }
}

impl<T: BindingText> BindingText for Option<T> {
    fn binding_text(&self) -> String {
        self.as_ref().map(BindingText::binding_text).unwrap_or_default()
    }
}

impl<T: BindingText> BindingText for Vec<T> {
    fn binding_text(&self) -> String {
        self.iter()
            .map(BindingText::binding_text)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl BindingText for serde_json::Value {
    fn binding_text(&self) -> String {
        match self {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Values a [`Signal`] can hold.
pub trait SignalValue: Clone + PartialEq + BindingText + 'static {}

impl<T: Clone + PartialEq + BindingText + 'static> SignalValue for T {}

pub(crate) type Patcher<T> = Rc<dyn Fn(&T) -> Result<String, RenderError>>;

pub(crate) struct Persistence<T> {
    pub(crate) key: String,
    pub(crate) storage: Rc<dyn KeyValueStorage>,
    pub(crate) encode: fn(&T) -> serde_json::Result<String>,
}

struct SignalInner<T> {
    id: String,
    value: RefCell<T>,
    subscribers: RefCell<IndexSet<SubscriberId>>,
    runtime: Weak<Runtime>,
    persistence: Option<Persistence<T>>,
    map_patcher: RefCell<Option<Patcher<T>>>,
    condition_patcher: RefCell<Option<Patcher<T>>>,
}

/// A reactive cell.
///
/// Reads inside an effect subscribe that effect. A write that changes the
/// value mirrors it to storage (for persistent signals), runs subscribers in
/// the order they subscribed, then patches every bound element carrying the
/// signal's id.
pub struct Signal<T: SignalValue> {
    inner: Rc<SignalInner<T>>,
}

impl<T: SignalValue> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: SignalValue + fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.inner.id)
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .finish()
    }
}

impl<T: SignalValue> Signal<T> {
    pub(crate) fn new(
        id: String,
        value: T,
        runtime: Weak<Runtime>,
        persistence: Option<Persistence<T>>,
    ) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id,
                value: RefCell::new(value),
                subscribers: RefCell::new(IndexSet::new()),
                runtime,
                persistence,
                map_patcher: RefCell::new(None),
                condition_patcher: RefCell::new(None),
            }),
        }
    }

    /// Identifier used in `data-sid` / `data-smid` / `data-scid` markers.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Current value, subscribing the active effect.
    pub fn read(&self) -> T {
        self.track();
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value, subscribing the active effect.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&*self.inner.value.borrow())
    }

    /// Current value without subscribing anything.
    pub fn read_untracked(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub(crate) fn with_untracked<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.inner.value.borrow())
    }

    /// Replace the value. Returns `false` when the value was already equal.
    pub fn write(&self, value: T) -> Result<bool, ReactiveError> {
        if *self.inner.value.borrow() == value {
            return Ok(false);
        }

        if let Some(persistence) = &self.inner.persistence {
            let json = (persistence.encode)(&value).map_err(|source| ReactiveError::Encode {
                key: persistence.key.clone(),
                source,
            })?;
            persistence.storage.set(&persistence.key, &json)?;
        }

        *self.inner.value.borrow_mut() = value;
        self.notify();
        self.patch()?;
        Ok(true)
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> Result<bool, ReactiveError> {
        let next = f(&*self.inner.value.borrow());
        self.write(next)
    }

    /// Run `callback` after every change. A detached signal never runs it.
    pub fn subscribe(&self, callback: impl FnMut() + 'static) -> SubscriberId {
        let Some(rt) = self.inner.runtime.upgrade() else {
            return 0;
        };
        let id = rt.register(Rc::new(RefCell::new(callback)));
        self.inner.subscribers.borrow_mut().insert(id);
        id
    }

    /// Remove a subscriber added with [`Signal::subscribe`].
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.inner.subscribers.borrow_mut().shift_remove(&id);
        if let Some(rt) = self.inner.runtime.upgrade() {
            rt.unregister(id);
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        match self.inner.runtime.upgrade() {
            Some(rt) => self
                .inner
                .subscribers
                .borrow()
                .iter()
                .filter(|id| rt.is_registered(**id))
                .count(),
            None => 0,
        }
    }

    /// Bind the value as text: `<span data-sid="id">value</span>`.
    pub fn bind(&self) -> View {
        View::Bound(Binding {
            kind: BindingKind::Scalar,
            signal_id: self.inner.id.clone(),
            content: Box::new(View::Text(self.inner.value.borrow().binding_text())),
        })
    }

    pub(crate) fn set_map_patcher(&self, patcher: Patcher<T>) {
        *self.inner.map_patcher.borrow_mut() = Some(patcher);
    }

    pub(crate) fn set_condition_patcher(&self, patcher: Patcher<T>) {
        *self.inner.condition_patcher.borrow_mut() = Some(patcher);
    }

    fn track(&self) {
        if let Some(rt) = self.inner.runtime.upgrade() {
            if let Some(tracker) = rt.current_tracker() {
                self.inner.subscribers.borrow_mut().insert(tracker);
            }
        }
    }

    fn notify(&self) {
        let Some(rt) = self.inner.runtime.upgrade() else {
            return;
        };
        let ids: Vec<SubscriberId> = {
            let mut subscribers = self.inner.subscribers.borrow_mut();
            subscribers.retain(|id| rt.is_registered(*id));
            subscribers.iter().copied().collect()
        };
        rt.run(&ids);
    }

    fn patch(&self) -> Result<(), RenderError> {
        let Some(shared) = self.inner.runtime.upgrade().and_then(|rt| rt.document()) else {
            return Ok(());
        };
        let Ok(mut document) = shared.try_borrow_mut() else {
            tracing::warn!(signal = %self.inner.id, "document busy, skipping patch");
            return Ok(());
        };

        let value = self.inner.value.borrow();
        let id = self.inner.id.as_str();

        let text = value.binding_text();
        for node in document.query_by_attribute(SCALAR_ATTR, id) {
            document.set_text_content(node, &text);
        }

        let patchers = [
            (MAP_ATTR, self.inner.map_patcher.borrow().clone()),
            (CONDITION_ATTR, self.inner.condition_patcher.borrow().clone()),
        ];
        for (attr, patcher) in patchers {
            let Some(patcher) = patcher else { continue };
            let nodes = document.query_by_attribute(attr, id);
            if nodes.is_empty() {
                continue;
            }
            let html = patcher(&*value)?;
            for node in nodes {
                document.set_inner_html(node, &html);
            }
        }
        Ok(())
    }
}

impl<T: SignalValue> Dependency for Signal<T> {
    fn add_subscriber(&self, id: SubscriberId) {
        self.inner.subscribers.borrow_mut().insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;
    use crate::render::render_to_string;
    use crate::state::StateContainer;
    use crate::view::Element;

    #[test]
    fn test_binding_text() {
        assert_eq!(3i32.binding_text(), "3");
        assert_eq!(Some("a").binding_text(), "a");
        assert_eq!(None::<i32>.binding_text(), "");
        assert_eq!(vec![1u8, 2].binding_text(), "1,2");
        assert_eq!(serde_json::json!("x").binding_text(), "x");
    }

    #[test]
    fn test_ids_are_sequential() {
        let state = StateContainer::new();
        assert_eq!(state.create_signal(0).id(), "s1");
        assert_eq!(state.create_signal("x").id(), "s2");
    }

    #[test]
    fn test_update() {
        let state = StateContainer::new();
        let count = state.create_signal(1);
        assert!(count.update(|n| n + 1).unwrap());
        assert_eq!(count.read(), 2);
    }

    #[test]
    fn test_scalar_binding_renders_marker() {
        let state = StateContainer::new();
        let count = state.create_signal(0);
        let view = Element::new("button").child(count.bind()).into_view();
        assert_eq!(
            render_to_string(&view).unwrap(),
            r#"<button><span data-sid="s1">0</span></button>"#
        );
    }

    #[test]
    fn test_write_patches_every_bound_node() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let state = StateContainer::new().with_document(doc.clone());
        let count = state.create_signal(1);
        let view = View::fragment(vec![
            Element::new("p").child(count.bind()).into_view(),
            Element::new("p").child(count.bind()).into_view(),
        ]);
        state.mount(&view, 0).unwrap();

        count.write(2).unwrap();

        assert_eq!(
            doc.borrow().inner_html(0),
            r#"<p><span data-sid="s1">2</span></p><p><span data-sid="s1">2</span></p>"#
        );
    }

    #[test]
    fn test_equal_write_leaves_document_alone() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let state = StateContainer::new().with_document(doc.clone());
        let name = state.create_signal(String::from("ada"));
        state.mount(&name.bind(), 0).unwrap();
        let node = doc.borrow().query_by_attribute(SCALAR_ATTR, "s1")[0];
        let before = doc.borrow().children(node).to_vec();

        assert!(!name.write("ada".to_string()).unwrap());
        assert_eq!(doc.borrow().children(node), before.as_slice());
    }

    #[test]
    fn test_write_without_document_still_notifies() {
        let state = StateContainer::new();
        let flag = state.create_signal(false);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (f, s) = (flag.clone(), seen.clone());
        flag.subscribe(move || s.borrow_mut().push(f.read_untracked()));

        flag.write(true).unwrap();
        assert_eq!(*seen.borrow(), vec![true]);
    }

    #[test]
    fn test_detached_signal() {
        let count = {
            let state = StateContainer::new();
            state.create_signal(1)
        };
        assert_eq!(count.subscribe(|| {}), 0);
        assert!(count.write(2).unwrap());
        assert_eq!(count.read(), 2);
        assert_eq!(count.subscriber_count(), 0);
    }
}
