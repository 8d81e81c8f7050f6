//! Property-changed notification contract.
//!
//! A bindable object owns a [`PropertyChangedEvent`] and raises it with the
//! name of every property whose value changed.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by `subscribe`, used to unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// Callback receiving the changed property's name.
pub type PropertyListener = Rc<dyn Fn(&str)>;

/// A multicast "property changed" signal.
#[derive(Default)]
pub struct PropertyChangedEvent {
    listeners: RefCell<Vec<(ListenerId, PropertyListener)>>,
    next_id: Cell<u64>,
}

impl fmt::Debug for PropertyChangedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyChangedEvent")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

impl PropertyChangedEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: PropertyListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Notify every listener subscribed at the time of the call.
    pub fn raise(&self, property: &str) {
        let snapshot: Vec<PropertyListener> =
            self.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in snapshot {
            listener(property);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}
