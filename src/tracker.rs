use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use log::trace;
use crate::cell::{ReadOnlyCell, ValueCell};
use crate::error::BindError;

/// Anything exposing a dirty flag plus the baseline operations — property
/// facades, and [ChangeTracker] itself so trackers nest.
pub trait HasChanges {
    fn has_changes(&self) -> ReadOnlyCell<bool>;
    fn reset_value(&self) -> Result<(), BindError>;
    fn update_original_value(&self);
}

/// Aggregates the dirty flags of its children into a single flag by keeping
/// a count of currently-dirty children: true iff at least one child reports
/// changes.
#[derive(Clone)]
pub struct ChangeTracker {
    inner: Rc<TrackerInner>,
}

struct TrackerInner {
    children: RefCell<Vec<Box<dyn HasChanges>>>,
    dirty_count: Cell<i32>,
    has_changes: ValueCell<bool>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        ChangeTracker {
            inner: Rc::new(TrackerInner {
                children: RefCell::new(Vec::new()),
                dirty_count: Cell::new(0),
                has_changes: ValueCell::new(false),
            }),
        }
    }

    /// Track `child`'s dirty flag.
    ///
    /// The flag cell replays its current value synchronously inside
    /// subscribe; a clean child must not be counted at registration time,
    /// but a child that is already dirty counts immediately.
    pub fn add(&self, child: impl HasChanges + 'static) {
        let flag = child.has_changes();
        self.inner.children.borrow_mut().push(Box::new(child));

        let init = Rc::new(Cell::new(true));
        let guard = init.clone();
        let weak = Rc::downgrade(&self.inner);
        // The handle is dropped on purpose: the subscription lives as long
        // as the child's flag cell.
        let _subscription = flag.subscribe(Rc::new(move |&dirty: &bool| {
            if guard.get() && !dirty {
                return;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.apply(dirty);
        }));
        init.set(false);
    }

    /// True iff at least one tracked child currently reports changes.
    pub fn has_changes(&self) -> ReadOnlyCell<bool> {
        self.inner.has_changes.read_only()
    }

    /// Reset every tracked child to its baseline, in registration order.
    pub fn reset_value(&self) -> Result<(), BindError> {
        for child in self.inner.children.borrow().iter() {
            child.reset_value()?;
        }
        Ok(())
    }

    /// Re-baseline every tracked child, in registration order.
    pub fn update_original_value(&self) {
        for child in self.inner.children.borrow().iter() {
            child.update_original_value();
        }
    }
}

impl TrackerInner {
    fn apply(&self, dirty: bool) {
        let count = self.dirty_count.get() + if dirty { 1 } else { -1 };
        assert!(
            count >= 0,
            "change tracker dirty count must not be negative ({count})"
        );
        trace!(
            "change tracker count: {} -> {}",
            self.dirty_count.get(),
            count
        );
        self.dirty_count.set(count);
        // The flag is only pushed on the 0-count and 0->1 boundaries; its
        // boolean value does not change in between.
        if count == 0 {
            self.has_changes.set(false);
        } else if count == 1 && dirty {
            self.has_changes.set(true);
        }
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        ChangeTracker::new()
    }
}

impl HasChanges for ChangeTracker {
    fn has_changes(&self) -> ReadOnlyCell<bool> {
        ChangeTracker::has_changes(self)
    }

    fn reset_value(&self) -> Result<(), BindError> {
        ChangeTracker::reset_value(self)
    }

    fn update_original_value(&self) {
        ChangeTracker::update_original_value(self)
    }
}

impl Debug for ChangeTracker {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeTracker")
            .field("children", &self.inner.children.borrow().len())
            .field("dirty_count", &self.inner.dirty_count.get())
            .finish()
    }
}
