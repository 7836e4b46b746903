use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use log::trace;
use crate::disposal::DisposeTracker;
use crate::subscribe::Subscription;

/// Property-notification events, fired synchronously in fixed order:
/// `Changing` before the facade's last-seen value updates, `Changed` after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyEvent<'a> {
    Changing(&'a str),
    Changed(&'a str),
}

impl PropertyEvent<'_> {
    pub fn property(&self) -> &str {
        match self {
            PropertyEvent::Changing(name) | PropertyEvent::Changed(name) => name,
        }
    }
}

type ListenerFn = Rc<dyn Fn(PropertyEvent<'_>)>;

/// The owner of a set of property facades: receives their change
/// notifications and tracks their disposal.
///
/// Listeners stand in for a UI binding host; they are invoked synchronously,
/// in registration order, with the property's string identifier. Cloning
/// yields another handle to the same view-model.
#[derive(Clone)]
pub struct ViewModel {
    inner: Rc<ViewModelInner>,
}

pub(crate) struct ViewModelInner {
    listeners: RefCell<Vec<(u64, ListenerFn)>>,
    next_key: Cell<u64>,
    disposables: DisposeTracker,
}

impl ViewModel {
    pub fn new() -> Self {
        ViewModel {
            inner: Rc::new(ViewModelInner {
                listeners: RefCell::new(Vec::new()),
                next_key: Cell::new(0),
                disposables: DisposeTracker::new(),
            }),
        }
    }

    /// Register a listener for both notification events.
    pub fn on_property_event(
        &self,
        listener: impl Fn(PropertyEvent<'_>) + 'static,
    ) -> Subscription {
        let key = self.inner.next_key.get();
        self.inner.next_key.set(key + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((key, Rc::new(listener)));
        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(k, _)| *k != key);
            }
        })
    }

    pub fn raise_property_changing(&self, property: &str) {
        self.inner.raise(PropertyEvent::Changing(property));
    }

    pub fn raise_property_changed(&self, property: &str) {
        self.inner.raise(PropertyEvent::Changed(property));
    }

    /// The view-model's disposal registry. Call
    /// [dispose_all](DisposeTracker::dispose_all) when the view-model closes.
    pub fn disposables(&self) -> &DisposeTracker {
        &self.inner.disposables
    }

    pub(crate) fn inner(&self) -> &Rc<ViewModelInner> {
        &self.inner
    }
}

impl Default for ViewModel {
    fn default() -> Self {
        ViewModel::new()
    }
}

impl ViewModelInner {
    pub(crate) fn raise(&self, event: PropertyEvent<'_>) {
        trace!("view model raising {event:?}");
        let snapshot: Vec<ListenerFn> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in snapshot {
            listener(event);
        }
    }
}

impl Debug for ViewModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewModel")
            .field("listeners", &self.inner.listeners.borrow().len())
            .field("disposables", &self.inner.disposables)
            .finish()
    }
}
