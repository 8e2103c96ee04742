//! Side effects driven by signals.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::state::{Callback, Runtime, SubscriberId};

/// Returned by an effect to undo its work before the next run.
pub type Cleanup = Box<dyn FnOnce()>;

/// Something an effect can depend on explicitly.
pub trait Dependency {
    /// Re-run subscriber `id` whenever this dependency changes.
    fn add_subscriber(&self, id: SubscriberId);
}

/// Handle to a registered effect.
///
/// Dropping the handle keeps the effect alive for the life of its container;
/// call [`Effect::dispose`] to stop it.
pub struct Effect {
    id: SubscriberId,
    cleanup: Rc<RefCell<Option<Cleanup>>>,
    runtime: Weak<Runtime>,
}

impl Effect {
    pub(crate) fn register<F>(rt: &Rc<Runtime>, mut effect: F) -> Self
    where
        F: FnMut() -> Option<Cleanup> + 'static,
    {
        let cleanup: Rc<RefCell<Option<Cleanup>>> = Rc::new(RefCell::new(None));
        let slot = cleanup.clone();
        let callback: Callback = Rc::new(RefCell::new(move || {
            let previous = slot.borrow_mut().take();
            if let Some(previous) = previous {
                previous();
            }
            let next = effect();
            *slot.borrow_mut() = next;
        }));

        Self {
            id: rt.register(callback),
            cleanup,
            runtime: Rc::downgrade(rt),
        }
    }

    /// Subscriber id of this effect.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Stop re-running and run the pending cleanup.
    pub fn dispose(self) {
        if let Some(rt) = self.runtime.upgrade() {
            rt.unregister(self.id);
        }
        let pending = self.cleanup.borrow_mut().take();
        if let Some(pending) = pending {
            pending();
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect").field("id", &self.id).finish()
    }
}
