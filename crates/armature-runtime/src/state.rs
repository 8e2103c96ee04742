//! Signal registry, tracking stack and effect scheduling.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dom::{Document, NodeId};
use crate::effect::{Cleanup, Dependency, Effect};
use crate::error::{ReactiveError, RenderError};
use crate::render::mount;
use crate::signal::{Persistence, Signal, SignalValue};
use crate::storage::KeyValueStorage;
use crate::view::View;

/// Identifier of a registered subscriber callback.
pub type SubscriberId = u64;

/// Document shared between the container and mounted views.
pub type SharedDocument = Rc<RefCell<dyn Document>>;

pub(crate) type Callback = Rc<RefCell<dyn FnMut()>>;

/// Shared state behind a [`StateContainer`]. Signals hold a weak reference.
pub(crate) struct Runtime {
    next_signal: Cell<u64>,
    next_subscriber: Cell<u64>,
    tracking: RefCell<Vec<Option<SubscriberId>>>,
    callbacks: RefCell<HashMap<SubscriberId, Callback>>,
    document: RefCell<Option<SharedDocument>>,
    storage: RefCell<Option<Rc<dyn KeyValueStorage>>>,
    mount_queue: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl Runtime {
    fn new() -> Self {
        Self {
            next_signal: Cell::new(0),
            next_subscriber: Cell::new(0),
            tracking: RefCell::new(Vec::new()),
            callbacks: RefCell::new(HashMap::new()),
            document: RefCell::new(None),
            storage: RefCell::new(None),
            mount_queue: RefCell::new(Vec::new()),
        }
    }

    fn next_signal_id(&self) -> String {
        let n = self.next_signal.get() + 1;
        self.next_signal.set(n);
        format!("s{}", n)
    }

    pub(crate) fn register(&self, callback: Callback) -> SubscriberId {
        let id = self.next_subscriber.get() + 1;
        self.next_subscriber.set(id);
        self.callbacks.borrow_mut().insert(id, callback);
        id
    }

    pub(crate) fn unregister(&self, id: SubscriberId) {
        self.callbacks.borrow_mut().remove(&id);
    }

    pub(crate) fn is_registered(&self, id: SubscriberId) -> bool {
        self.callbacks.borrow().contains_key(&id)
    }

    /// Subscriber that reads should register, if any.
    pub(crate) fn current_tracker(&self) -> Option<SubscriberId> {
        self.tracking.borrow().last().copied().flatten()
    }

    pub(crate) fn with_tracker<R>(&self, tracker: Option<SubscriberId>, f: impl FnOnce() -> R) -> R {
        self.tracking.borrow_mut().push(tracker);
        let result = f();
        self.tracking.borrow_mut().pop();
        result
    }

    /// Invoke subscribers in order, outside any tracking scope.
    pub(crate) fn run(&self, ids: &[SubscriberId]) {
        let callbacks: Vec<Callback> = {
            let map = self.callbacks.borrow();
            ids.iter().filter_map(|id| map.get(id).cloned()).collect()
        };
        for callback in callbacks {
            self.with_tracker(None, || invoke(&callback));
        }
    }

    /// Invoke one subscriber with itself as the tracker.
    pub(crate) fn run_tracked(&self, id: SubscriberId) {
        let callback = self.callbacks.borrow().get(&id).cloned();
        if let Some(callback) = callback {
            self.with_tracker(Some(id), || invoke(&callback));
        }
    }

    pub(crate) fn document(&self) -> Option<SharedDocument> {
        self.document.borrow().clone()
    }
}

fn invoke(callback: &Callback) {
    match callback.try_borrow_mut() {
        Ok(mut f) => (&mut *f)(),
        // A subscriber that writes a signal it depends on would recurse forever.
        Err(_) => tracing::warn!("skipping re-entrant subscriber"),
    }
}

/// Owns the signal registry, the tracking stack and queued mount callbacks.
///
/// Cloning yields another handle to the same registry. Independent containers
/// share nothing.
#[derive(Clone)]
pub struct StateContainer {
    rt: Rc<Runtime>,
}

impl StateContainer {
    /// Create an empty container with no document or storage attached.
    pub fn new() -> Self {
        Self {
            rt: Rc::new(Runtime::new()),
        }
    }

    /// Attach the document that signal writes patch.
    pub fn with_document(self, document: SharedDocument) -> Self {
        *self.rt.document.borrow_mut() = Some(document);
        self
    }

    /// Attach storage for persistent signals.
    pub fn with_storage(self, storage: Rc<dyn KeyValueStorage>) -> Self {
        *self.rt.storage.borrow_mut() = Some(storage);
        self
    }

    /// Attached document, if any.
    pub fn document(&self) -> Option<SharedDocument> {
        self.rt.document()
    }

    /// Create a signal.
    pub fn create_signal<T: SignalValue>(&self, initial: T) -> Signal<T> {
        Signal::new(self.rt.next_signal_id(), initial, Rc::downgrade(&self.rt), None)
    }

    /// Create a signal mirrored to storage under `key` as JSON.
    ///
    /// A stored value that fails to decode is ignored in favour of `initial`.
    pub fn create_persistent_signal<T>(
        &self,
        key: &str,
        initial: T,
    ) -> Result<Signal<T>, ReactiveError>
    where
        T: SignalValue + Serialize + DeserializeOwned,
    {
        let storage = self
            .rt
            .storage
            .borrow()
            .clone()
            .ok_or_else(|| ReactiveError::NoStorage(key.to_string()))?;

        let value = match storage.get(key) {
            Some(json) => match serde_json::from_str(&json) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "ignoring undecodable persisted value");
                    initial
                }
            },
            None => initial,
        };

        let persistence = Persistence {
            key: key.to_string(),
            storage,
            encode: serde_json::to_string::<T>,
        };
        Ok(Signal::new(
            self.rt.next_signal_id(),
            value,
            Rc::downgrade(&self.rt),
            Some(persistence),
        ))
    }

    /// Run `effect` now and re-run it whenever a signal it read changes.
    ///
    /// Dependencies are the signals read during this first run.
    pub fn create_effect<F>(&self, effect: F) -> Effect
    where
        F: FnMut() -> Option<Cleanup> + 'static,
    {
        let effect = Effect::register(&self.rt, effect);
        self.rt.run_tracked(effect.id());
        effect
    }

    /// Run `effect` now and re-run it whenever one of `deps` changes.
    ///
    /// Reads inside the effect are not tracked.
    pub fn create_effect_with<F>(&self, deps: &[&dyn Dependency], effect: F) -> Effect
    where
        F: FnMut() -> Option<Cleanup> + 'static,
    {
        let effect = Effect::register(&self.rt, effect);
        for dep in deps {
            dep.add_subscriber(effect.id());
        }
        self.rt.run(&[effect.id()]);
        effect
    }

    /// Run `f` without registering any reads.
    pub fn untrack<R>(&self, f: impl FnOnce() -> R) -> R {
        self.rt.with_tracker(None, f)
    }

    /// Queue a callback for when the page has mounted.
    pub fn on_mount(&self, callback: impl FnOnce() + 'static) {
        self.rt.mount_queue.borrow_mut().push(Box::new(callback));
    }

    /// Run queued mount callbacks. Returns how many ran.
    pub fn flush_mount(&self) -> usize {
        let queued = std::mem::take(&mut *self.rt.mount_queue.borrow_mut());
        let count = queued.len();
        for callback in queued {
            callback();
        }
        count
    }

    /// Mount a view into the attached document under `parent`.
    pub fn mount(&self, view: &View, parent: NodeId) -> Result<Vec<NodeId>, RenderError> {
        let document = self.rt.document().ok_or(RenderError::NoDocument)?;
        let mut document = document.borrow_mut();
        mount(view, &mut *document, parent)
    }

    /// Number of live subscriber callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.rt.callbacks.borrow().len()
    }
}

impl Default for StateContainer {
    fn default() -> Self {
        Self::new()
    }
}
