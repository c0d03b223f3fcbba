//! Change notifications from the session to the rendering layer.
//!
//! The host subscribes once and re-renders on each [`Change`]. A
//! [`Subscription`] is a guard: dropping it unregisters the listener, so
//! listeners never outlive whatever owns the guard.
//!
//! Single-threaded by construction (`Rc`), matching the event-loop model.
//! Listeners may subscribe or drop other subscriptions while being notified;
//! a listener that is already running when a nested notification fires is
//! skipped for that nested notification.

#[cfg(test)]
#[path = "observe_test.rs"]
mod observe_test;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::Serialize;

/// What changed in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Change {
    SurveyLoaded,
    LengthsLoaded,
    SelectionChanged,
    ConnectorsChanged,
    /// The box-selection overlay appeared, moved, or went away.
    PreviewChanged,
    CameraChanged,
}

type Listener = Rc<RefCell<dyn FnMut(Change)>>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Listener registry owned by a session.
#[derive(Default)]
pub struct Observers {
    registry: Rc<RefCell<Registry>>,
}

impl Observers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener`; it stays registered until the returned guard drops.
    #[must_use = "dropping the Subscription unregisters the listener immediately"]
    pub fn subscribe(&self, listener: impl FnMut(Change) + 'static) -> Subscription {
        let listener: Listener = Rc::new(RefCell::new(listener));
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, listener));
        Subscription { id, registry: Rc::downgrade(&self.registry) }
    }

    /// Deliver `change` to every listener registered at the time of the call.
    pub fn notify(&self, change: Change) {
        let listeners: Vec<Listener> = self.registry.borrow().listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in listeners {
            if let Ok(mut f) = listener.try_borrow_mut() {
                (&mut *f)(change);
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registration guard returned by [`Observers::subscribe`].
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
