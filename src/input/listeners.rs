//! Scoped input listeners
//!
//! A window owns one [`InputEvents`] registry and dispatches translated events
//! into it. Consumers register closures and hold the returned
//! [`ListenerGuard`]; dropping or releasing the guard unregisters the closure.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use super::events::{EventKind, InputEvent};

type Handler = Rc<dyn Fn(&InputEvent)>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(u64, EventKind, Handler)>,
}

/// Per-window listener registry. Cloning yields another handle to the same
/// registry.
#[derive(Clone, Default)]
pub struct InputEvents {
    inner: Rc<RefCell<Registry>>,
}

impl InputEvents {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "the listener is removed as soon as the guard is dropped"]
    pub fn listen<F>(&self, kind: EventKind, handler: F) -> ListenerGuard
    where
        F: Fn(&InputEvent) + 'static,
    {
        let mut registry = self.inner.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push((id, kind, Rc::new(handler)));

        ListenerGuard {
            registry: Rc::downgrade(&self.inner),
            id: Some(id),
        }
    }

    /// Delivers `event` to every listener of its kind and returns how many ran.
    ///
    /// The matching handlers are collected before any runs, so a handler may
    /// register or release listeners without invalidating this dispatch.
    pub fn dispatch(&self, event: &InputEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<Handler> = self
            .inner
            .borrow()
            .entries
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, h)| Rc::clone(h))
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// Keeps one listener registered for as long as it lives.
pub struct ListenerGuard {
    registry: Weak<RefCell<Registry>>,
    id: Option<u64>,
}

impl ListenerGuard {
    /// Unregisters the listener. Calling this more than once is harmless.
    pub fn release(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().entries.retain(|(i, _, _)| *i != id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.registry.strong_count() > 0
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.release();
    }
}
