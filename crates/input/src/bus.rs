use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::event::InputEvent;

type Listener = Box<dyn FnMut(&InputEvent)>;

#[derive(Default)]
struct BusInner {
    listeners: RefCell<Vec<(u64, Listener)>>,
    // Changes requested while `listeners` is borrowed by a dispatch.
    pending_add: RefCell<Vec<(u64, Listener)>>,
    pending_remove: RefCell<Vec<u64>>,
    next_id: Cell<u64>,
}

impl BusInner {
    fn remove(&self, id: u64) {
        match self.listeners.try_borrow_mut() {
            Ok(mut listeners) => {
                listeners.retain(|(lid, _)| *lid != id);
                self.pending_add.borrow_mut().retain(|(lid, _)| *lid != id);
            }
            Err(_) => self.pending_remove.borrow_mut().push(id),
        }
    }

    fn flush_pending(&self, listeners: &mut Vec<(u64, Listener)>) {
        let removed: Vec<u64> = self.pending_remove.borrow_mut().drain(..).collect();
        listeners.extend(self.pending_add.borrow_mut().drain(..));
        if !removed.is_empty() {
            listeners.retain(|(id, _)| !removed.contains(id));
        }
    }
}

/// Single-threaded fan-out of input events to registered listeners.
///
/// Listeners may subscribe or drop their subscription from inside a callback;
/// those changes take effect once the current dispatch returns.
#[derive(Clone, Default)]
pub struct InputBus {
    inner: Rc<BusInner>,
}

impl InputBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. It stays registered until the returned guard is
    /// dropped.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(&self, listener: impl FnMut(&InputEvent) + 'static) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let entry: (u64, Listener) = (id, Box::new(listener));
        match self.inner.listeners.try_borrow_mut() {
            Ok(mut listeners) => listeners.push(entry),
            Err(_) => self.inner.pending_add.borrow_mut().push(entry),
        }
        Subscription {
            id,
            bus: Rc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every listener in registration order. Returns the
    /// number of listeners called.
    pub fn dispatch(&self, event: &InputEvent) -> usize {
        let Ok(mut listeners) = self.inner.listeners.try_borrow_mut() else {
            tracing::warn!("nested input dispatch ignored");
            return 0;
        };
        let mut called = 0;
        for (id, listener) in listeners.iter_mut() {
            if self.inner.pending_remove.borrow().contains(id) {
                continue;
            }
            listener(event);
            called += 1;
        }
        self.inner.flush_pending(&mut listeners);
        called
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len() + self.inner.pending_add.borrow().len()
    }
}

/// Registration guard returned by [`InputBus::subscribe`].
pub struct Subscription {
    id: u64,
    bus: Weak<BusInner>,
}

impl Subscription {
    /// Unregister now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {}

    /// False once the bus itself has been dropped.
    pub fn is_connected(&self) -> bool {
        self.bus.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
