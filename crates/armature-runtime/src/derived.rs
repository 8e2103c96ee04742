//! Views derived from a signal: array mapping and conditional branches.

use std::rc::Rc;

use crate::effect::Dependency;
use crate::render::render_to_string;
use crate::signal::{Signal, SignalValue};
use crate::state::SubscriberId;
use crate::view::{Binding, BindingKind, View};

/// A list signal projected item by item.
///
/// Nothing is memoized: every [`MapView::get`] re-runs the projection.
pub struct MapView<T: SignalValue, U> {
    signal: Signal<Vec<T>>,
    project: Rc<dyn Fn(usize, &T) -> U>,
}

impl<T: SignalValue> Signal<Vec<T>> {
    /// Project each item of the list through `f`.
    pub fn map_view<U>(&self, f: impl Fn(&T) -> U + 'static) -> MapView<T, U> {
        self.map_view_indexed(move |_, item| f(item))
    }

    /// Project each item of the list through `f`, which also gets the item's index.
    pub fn map_view_indexed<U>(&self, f: impl Fn(usize, &T) -> U + 'static) -> MapView<T, U> {
        MapView {
            signal: self.clone(),
            project: Rc::new(f),
        }
    }
}

fn project_all<T, U>(items: &[T], project: &dyn Fn(usize, &T) -> U) -> Vec<U> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| project(index, item))
        .collect()
}

impl<T: SignalValue, U> MapView<T, U> {
    /// Source signal.
    pub fn signal(&self) -> &Signal<Vec<T>> {
        &self.signal
    }

    /// Projected items, subscribing the active effect to the source.
    pub fn get(&self) -> Vec<U> {
        self.signal.with(|items| project_all(items, &*self.project))
    }
}

impl<T: SignalValue, U: Into<View> + 'static> MapView<T, U> {
    /// Bind the projected list: `<div data-smid="id">...</div>`.
    ///
    /// Writes to the source re-render the whole list into every bound region.
    pub fn bind(&self) -> View {
        let project = self.project.clone();
        self.signal.set_map_patcher(Rc::new(move |items: &Vec<T>| {
            render_to_string(&View::fragment(project_all(items, &*project)))
        }));

        let content = self
            .signal
            .with_untracked(|items| View::fragment(project_all(items, &*self.project)));
        View::Bound(Binding {
            kind: BindingKind::Map,
            signal_id: self.signal.id().to_string(),
            content: Box::new(content),
        })
    }
}

impl<T: SignalValue, U> Dependency for MapView<T, U> {
    fn add_subscriber(&self, id: SubscriberId) {
        self.signal.add_subscriber(id);
    }
}

/// Branch selector of a [`ConditionalView`].
#[derive(Clone)]
pub enum Case<T> {
    /// Matches a value equal to this one.
    Equals(T),
    /// Matches when the predicate holds.
    When(Rc<dyn Fn(&T) -> bool>),
}

impl<T: PartialEq> Case<T> {
    /// Whether `value` selects this case.
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Self::Equals(expected) => expected == value,
            Self::When(predicate) => predicate(value),
        }
    }
}

/// Renders the view of the first case matching the signal's value.
pub struct ConditionalView<T: SignalValue> {
    signal: Signal<T>,
    cases: Vec<(Case<T>, View)>,
}

impl<T: SignalValue> Signal<T> {
    /// Start a conditional view over this signal.
    pub fn conditional_view(&self) -> ConditionalView<T> {
        ConditionalView {
            signal: self.clone(),
            cases: Vec::new(),
        }
    }
}

impl<T: SignalValue> ConditionalView<T> {
    /// Show `view` when the value equals `value`.
    pub fn case(mut self, value: T, view: impl Into<View>) -> Self {
        self.cases.push((Case::Equals(value), view.into()));
        self
    }

    /// Show `view` when `predicate` holds.
    pub fn when(mut self, predicate: impl Fn(&T) -> bool + 'static, view: impl Into<View>) -> Self {
        self.cases.push((Case::When(Rc::new(predicate)), view.into()));
        self
    }

    /// Show `view` when no earlier case matched.
    pub fn otherwise(self, view: impl Into<View>) -> Self {
        self.when(|_| true, view)
    }

    /// View of the first matching case, subscribing the active effect.
    pub fn get(&self) -> Option<View> {
        self.signal.with(|value| select(&self.cases, value))
    }

    /// Bind the branch: `<div data-scid="id">...</div>`.
    pub fn bind(&self) -> View {
        let cases = self.cases.clone();
        self.signal.set_condition_patcher(Rc::new(move |value: &T| {
            select(&cases, value).map_or_else(|| Ok(String::new()), |view| render_to_string(&view))
        }));

        let content = self
            .signal
            .with_untracked(|value| select(&self.cases, value))
            .unwrap_or_default();
        View::Bound(Binding {
            kind: BindingKind::Condition,
            signal_id: self.signal.id().to_string(),
            content: Box::new(content),
        })
    }
}

impl<T: SignalValue> Dependency for ConditionalView<T> {
    fn add_subscriber(&self, id: SubscriberId) {
        self.signal.add_subscriber(id);
    }
}

fn select<T: PartialEq>(cases: &[(Case<T>, View)], value: &T) -> Option<View> {
    cases
        .iter()
        .find(|(case, _)| case.matches(value))
        .map(|(_, view)| view.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Document, MemoryDocument};
    use crate::state::StateContainer;
    use crate::view::Element;
    use std::cell::{Cell, RefCell};

    // === Map View Tests ===

    #[test]
    fn test_map_view_projects_items() {
        let state = StateContainer::new();
        let items = state.create_signal(vec![1, 2, 3]);
        let doubled = items.map_view(|x| x * 2);
        assert_eq!(doubled.get(), vec![2, 4, 6]);

        items.write(vec![5]).unwrap();
        assert_eq!(doubled.get(), vec![10]);
    }

    #[test]
    fn test_map_view_recomputes_on_every_get() {
        let state = StateContainer::new();
        let items = state.create_signal(vec![1, 2, 3]);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let view = items.map_view(move |x| {
            counter.set(counter.get() + 1);
            *x
        });

        view.get();
        view.get();
        assert_eq!(calls.get(), 6);
    }

    #[test]
    fn test_indexed_map_view_sees_positions() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let state = StateContainer::new().with_document(doc.clone());
        let names = state.create_signal(vec![String::from("a"), String::from("b")]);
        let list = names.map_view_indexed(|i, name| format!("{}:{}", i, name));

        assert_eq!(list.get(), vec!["0:a", "1:b"]);

        state.mount(&list.bind(), 0).unwrap();
        names.write(vec![String::from("c"), String::from("d"), String::from("e")]).unwrap();
        assert_eq!(doc.borrow().inner_html(0), r#"<div data-smid="s1">0:c1:d2:e</div>"#);
    }

    #[test]
    fn test_map_binding_renders_and_patches() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let state = StateContainer::new().with_document(doc.clone());
        let names = state.create_signal(vec![String::from("a"), String::from("b")]);
        let list = names.map_view(|name| Element::new("li").child(name.clone()));
        let view = list.bind();

        assert_eq!(
            render_to_string(&view).unwrap(),
            r#"<div data-smid="s1"><li>a</li><li>b</li></div>"#
        );

        state.mount(&view, 0).unwrap();
        names.write(vec![String::from("c")]).unwrap();
        assert_eq!(
            doc.borrow().inner_html(0),
            r#"<div data-smid="s1"><li>c</li></div>"#
        );
    }

    #[test]
    fn test_effect_on_map_view() {
        let state = StateContainer::new();
        let items = state.create_signal(vec![1u32]);
        let labels = items.map_view(|x| x.to_string());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let s = seen.clone();
        let source = labels.signal().clone();
        state.create_effect_with(&[&labels], move || {
            s.borrow_mut().push(source.read_untracked().len());
            None
        });
        items.write(vec![1, 2]).unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    // === Conditional View Tests ===

    #[test]
    fn test_first_matching_case_wins() {
        let state = StateContainer::new();
        let count = state.create_signal(5);
        let view = count
            .conditional_view()
            .when(|n| *n > 3, "big")
            .case(5, "five")
            .otherwise("small");

        assert!(matches!(view.get(), Some(View::Text(t)) if t == "big"));
        count.write(1).unwrap();
        assert!(matches!(view.get(), Some(View::Text(t)) if t == "small"));
    }

    #[test]
    fn test_no_match_renders_empty() {
        let state = StateContainer::new();
        let status = state.create_signal("idle");
        let view = status.conditional_view().case("loading", "Loading...");
        assert!(view.get().is_none());
        assert_eq!(render_to_string(&view.bind()).unwrap(), r#"<div data-scid="s1"></div>"#);
    }

    #[test]
    fn test_condition_binding_patches() {
        let doc = Rc::new(RefCell::new(MemoryDocument::new()));
        let state = StateContainer::new().with_document(doc.clone());
        let status = state.create_signal("loading");
        let view = status
            .conditional_view()
            .case("loading", "Loading...")
            .case("ready", Element::new("b").child("Ready"))
            .bind();
        state.mount(&view, 0).unwrap();
        assert_eq!(doc.borrow().inner_html(0), r#"<div data-scid="s1">Loading...</div>"#);

        status.write("ready").unwrap();
        assert_eq!(doc.borrow().inner_html(0), r#"<div data-scid="s1"><b>Ready</b></div>"#);

        status.write("failed").unwrap();
        assert_eq!(doc.borrow().inner_html(0), r#"<div data-scid="s1"></div>"#);
    }
}
