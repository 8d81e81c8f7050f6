//! ObservableList<T>: an ordered sequence that reports structural changes.
//!
//! Every mutation emits exactly one [`ListChange`] describing what happened.
//! Listeners are snapshotted before dispatch, so a listener may subscribe,
//! unsubscribe or mutate the list again from inside its callback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::notify::ListenerId;

// ---------------------------------------------------------------------------
// Change events
// ---------------------------------------------------------------------------

/// Process-unique identity of an [`ObservableList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(usize);

static NEXT_LIST_ID: AtomicUsize = AtomicUsize::new(1);

impl ListId {
    fn next() -> Self {
        ListId(NEXT_LIST_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// What kind of structural change happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListChangeKind {
    /// `count` items were inserted starting at `index`.
    Inserted,
    /// `count` items were removed starting at `index`.
    Removed,
    /// `count` items starting at `index` were overwritten.
    Replaced,
}

/// A single structural change.
///
/// `items` holds the inserted or replacement values; `removed` holds the
/// values that left the list (removed or overwritten).
#[derive(Debug, Clone, PartialEq)]
pub struct ListChange<T> {
    /// The list that raised the event.
    pub origin: ListId,
    pub kind: ListChangeKind,
    pub index: usize,
    pub count: usize,
    pub items: Vec<T>,
    pub removed: Vec<T>,
}

/// Callback invoked for every change on a list.
pub type ListListener<T> = Rc<dyn Fn(&ListChange<T>)>;

// ---------------------------------------------------------------------------
// ObservableList
// ---------------------------------------------------------------------------

struct Inner<T> {
    id: ListId,
    items: RefCell<Vec<T>>,
    listeners: RefCell<Vec<(ListenerId, ListListener<T>)>>,
    next_listener: Cell<u64>,
}

/// Shared, observable list handle. Cloning the handle shares the list.
pub struct ObservableList<T> {
    inner: Rc<Inner<T>>,
}

impl<T> Clone for ObservableList<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableList")
            .field("id", &self.inner.id)
            .field("items", &self.inner.items.borrow())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for ObservableList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> ObservableList<T> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::from_vec(Vec::new())
    }

    /// Wrap an existing vector.
    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            inner: Rc::new(Inner {
                id: ListId::next(),
                items: RefCell::new(items),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    pub fn id(&self) -> ListId {
        self.inner.id
    }

    /// Whether both handles refer to the same list object.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Snapshot of the current contents.
    pub fn to_vec(&self) -> Vec<T> {
        self.inner.items.borrow().clone()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.inner.items.borrow().contains(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.inner.items.borrow().iter().position(|x| x == item)
    }

    // -- mutation --------------------------------------------------------------

    /// Append one item.
    pub fn push(&self, item: T) {
        let index = {
            let mut items = self.inner.items.borrow_mut();
            items.push(item.clone());
            items.len() - 1
        };
        self.emit(ListChangeKind::Inserted, index, vec![item], Vec::new());
    }

    /// Insert one item at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&self, index: usize, item: T) {
        self.inner.items.borrow_mut().insert(index, item.clone());
        self.emit(ListChangeKind::Inserted, index, vec![item], Vec::new());
    }

    /// Append a run of items with a single event. Does nothing for an empty run.
    pub fn extend(&self, new_items: impl IntoIterator<Item = T>) {
        let new_items: Vec<T> = new_items.into_iter().collect();
        if new_items.is_empty() {
            return;
        }
        let index = {
            let mut items = self.inner.items.borrow_mut();
            let index = items.len();
            items.extend(new_items.iter().cloned());
            index
        };
        self.emit(ListChangeKind::Inserted, index, new_items, Vec::new());
    }

    /// Remove the item at `index`, returning it. Out-of-range is `None`.
    pub fn remove_at(&self, index: usize) -> Option<T> {
        let removed = {
            let mut items = self.inner.items.borrow_mut();
            if index >= items.len() {
                return None;
            }
            items.remove(index)
        };
        self.emit(ListChangeKind::Removed, index, Vec::new(), vec![removed.clone()]);
        Some(removed)
    }

    /// Remove the first occurrence of `item`. Returns whether it was found.
    pub fn remove(&self, item: &T) -> bool {
        match self.index_of(item) {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }

    /// Overwrite the item at `index`, returning the previous value.
    pub fn set(&self, index: usize, item: T) -> Option<T> {
        let previous = {
            let mut items = self.inner.items.borrow_mut();
            let slot = items.get_mut(index)?;
            std::mem::replace(slot, item.clone())
        };
        self.emit(ListChangeKind::Replaced, index, vec![item], vec![previous.clone()]);
        Some(previous)
    }

    /// Remove everything. Always raises one `Removed(0, n)` event, even when
    /// the list was already empty.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.inner.items.borrow_mut());
        self.emit(ListChangeKind::Removed, 0, Vec::new(), removed);
    }

    // -- listeners -------------------------------------------------------------

    pub fn subscribe(&self, listener: ListListener<T>) -> ListenerId {
        let id = ListenerId::new(self.inner.next_listener.get());
        self.inner.next_listener.set(self.inner.next_listener.get() + 1);
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Returns whether a listener was removed.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn emit(&self, kind: ListChangeKind, index: usize, items: Vec<T>, removed: Vec<T>) {
        let count = match kind {
            ListChangeKind::Removed => removed.len(),
            ListChangeKind::Inserted | ListChangeKind::Replaced => items.len(),
        };
        let change = ListChange { origin: self.inner.id, kind, index, count, items, removed };
        let snapshot: Vec<ListListener<T>> =
            self.inner.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in snapshot {
            listener(&change);
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn record(list: &ObservableList<i32>) -> Rc<RefCell<Vec<ListChange<i32>>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        list.subscribe(Rc::new(move |c: &ListChange<i32>| sink.borrow_mut().push(c.clone())));
        log
    }

    #[test]
    fn push_and_insert_emit_inserted() {
        let list = ObservableList::from_vec(vec![1, 2]);
        let log = record(&list);
        list.push(3);
        list.insert(0, 0);
        assert_eq!(list.to_vec(), vec![0, 1, 2, 3]);
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!((log[0].kind, log[0].index, log[0].count), (ListChangeKind::Inserted, 2, 1));
        assert_eq!(log[1].items, vec![0]);
        assert_eq!(log[1].origin, list.id());
    }

    #[test]
    fn extend_is_one_event() {
        let list = ObservableList::new();
        let log = record(&list);
        list.extend([1, 2, 3]);
        list.extend(Vec::<i32>::new());
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0].count, 3);
    }

    #[test]
    fn remove_and_set() {
        let list = ObservableList::from_vec(vec![5, 6, 7]);
        let log = record(&list);
        assert!(list.remove(&6));
        assert!(!list.remove(&42));
        assert_eq!(list.set(0, 9), Some(5));
        assert_eq!(list.set(10, 1), None);
        assert_eq!(list.remove_at(10), None);
        assert_eq!(list.to_vec(), vec![9, 7]);
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, ListChangeKind::Removed);
        assert_eq!(log[0].removed, vec![6]);
        assert_eq!(log[1].kind, ListChangeKind::Replaced);
        assert_eq!(log[1].removed, vec![5]);
    }

    #[test]
    fn clear_is_a_single_removed_run() {
        let list = ObservableList::from_vec(vec![1, 2, 3, 4]);
        let log = record(&list);
        list.clear();
        list.clear();
        let log = log.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!((log[0].index, log[0].count), (0, 4));
        assert_eq!(log[1].count, 0);
    }

    #[test]
    fn listener_can_unsubscribe_during_dispatch() {
        let list = ObservableList::<i32>::new();
        let hits = Rc::new(Cell::new(0));
        let id_slot: Rc<Cell<Option<ListenerId>>> = Rc::new(Cell::new(None));
        let (h, slot, handle) = (Rc::clone(&hits), Rc::clone(&id_slot), list.clone());
        let id = list.subscribe(Rc::new(move |_: &ListChange<i32>| {
            h.set(h.get() + 1);
            if let Some(id) = slot.get() {
                handle.unsubscribe(id);
            }
        }));
        id_slot.set(Some(id));
        list.push(1);
        list.push(2);
        assert_eq!(hits.get(), 1);
        assert_eq!(list.listener_count(), 0);
    }

    #[test]
    fn ids_are_unique_and_clones_share() {
        let a = ObservableList::<i32>::new();
        let b = ObservableList::<i32>::new();
        assert_ne!(a.id(), b.id());
        let a2 = a.clone();
        a2.push(1);
        assert!(a.ptr_eq(&a2));
        assert_eq!(a.len(), 1);
    }
}
