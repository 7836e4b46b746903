use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use crate::source::ObserverFn;

/// A resource that can be released. Disposal must be idempotent.
pub trait Dispose {
    fn dispose(&self);
}

/// Handle to an active observer registration.
///
/// Disposing detaches the observer immediately and irrevocably; further
/// deliveries stop before `dispose` returns. Dropping the handle without
/// calling [Subscription::dispose] leaves the observer attached for the
/// lifetime of its source.
pub struct Subscription {
    cancel: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Subscription {
    /// Wrap a cancellation action. Public so external
    /// [Observable](crate::Observable) implementations can hand out their own
    /// subscriptions.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Subscription {
            cancel: RefCell::new(Some(Box::new(cancel))),
        }
    }

    /// A subscription with nothing to cancel (e.g. a one-shot replay).
    pub fn none() -> Self {
        Subscription {
            cancel: RefCell::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.borrow().is_some()
    }

    pub fn dispose(&self) {
        let cancel = self.cancel.borrow_mut().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }
}

impl Default for Subscription {
    fn default() -> Self {
        Subscription::none()
    }
}

impl Dispose for Subscription {
    fn dispose(&self) {
        Subscription::dispose(self)
    }
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("is_active", &self.is_active())
            .finish()
    }
}

/// Keyed observer registry shared by the push sources in this crate.
///
/// Delivery iterates over a snapshot of the registered observers, so a
/// handler may subscribe, unsubscribe or write re-entrantly; an observer
/// added mid-delivery does not see the in-flight value.
pub(crate) struct ObserverList<T> {
    entries: RefCell<Vec<(u64, ObserverFn<T>)>>,
    next_key: Cell<u64>,
}

impl<T> ObserverList<T> {
    pub(crate) fn new() -> Self {
        ObserverList {
            entries: RefCell::new(Vec::new()),
            next_key: Cell::new(0),
        }
    }

    pub(crate) fn insert(&self, observer: ObserverFn<T>) -> u64 {
        let key = self.next_key.get();
        self.next_key.set(key + 1);
        self.entries.borrow_mut().push((key, observer));
        key
    }

    pub(crate) fn remove(&self, key: u64) {
        self.entries.borrow_mut().retain(|(k, _)| *k != key);
    }

    pub(crate) fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub(crate) fn emit(&self, value: &T) {
        let snapshot: Vec<ObserverFn<T>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, observer)| observer.clone())
            .collect();
        for observer in snapshot {
            observer(value);
        }
    }
}
