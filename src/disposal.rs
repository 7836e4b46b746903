use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use log::trace;
use crate::subscribe::Dispose;

/// Accumulates disposable resources for one owner and releases them all, in
/// registration order, on a single teardown call.
///
/// Teardown may run any number of times, and new resources may be registered
/// after a previous teardown; each teardown releases only the resources
/// registered since the last one.
#[derive(Default)]
pub struct DisposeTracker {
    items: RefCell<Vec<Box<dyn Dispose>>>,
}

impl DisposeTracker {
    pub fn new() -> Self {
        DisposeTracker::default()
    }

    pub fn add(&self, item: impl Dispose + 'static) {
        self.items.borrow_mut().push(Box::new(item));
    }

    /// Dispose every tracked item and forget it.
    pub fn dispose_all(&self) {
        // Take the list first: a teardown handler may register new items,
        // which are kept for the next teardown.
        let items = self.items.take();
        trace!("dispose tracker: releasing {} item(s)", items.len());
        for item in &items {
            item.dispose();
        }
    }
}

impl Dispose for DisposeTracker {
    fn dispose(&self) {
        self.dispose_all()
    }
}

impl Debug for DisposeTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisposeTracker")
            .field("items", &self.items.borrow().len())
            .finish()
    }
}
