use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::rc::{Rc, Weak};
use derivative::Derivative;
use log::{debug, trace};
use crate::cache::{BindSource, ValueCache};
use crate::cell::{ReadOnlyCell, ValueCell};
use crate::equality::Equality;
use crate::error::BindError;
use crate::subscribe::{Dispose, Subscription};
use crate::tracker::HasChanges;
use crate::vm::{PropertyEvent, ViewModel, ViewModelInner};

/// Per-property wrapper binding one view-model property to a reactive
/// source, with baseline-comparison dirty tracking.
///
/// A facade starts unattached: reads return the type default and there is no
/// dirtiness. [observe](ReadOnlyPropertyFacade::observe) attaches a source,
/// captures its current value as the baseline, and from then on every
/// materially new emission updates `has_changes` and raises a
/// changing/changed pair on the owning [ViewModel]. Observing again detaches
/// the previous source first, so the backing domain model can be swapped at
/// any time; disposing detaches and the facade stays reusable.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct ReadOnlyPropertyFacade<T> {
    inner: Rc<FacadeInner<T>>,
}

struct FacadeInner<T> {
    view_model: Weak<ViewModelInner>,
    property: String,
    cache: ValueCache<T>,
    subscription: RefCell<Subscription>,
    original: RefCell<T>,
    last_seen: RefCell<T>,
    has_changes: ValueCell<bool>,
    disposed: Cell<bool>,
}

impl<T: Clone + Default + 'static> ReadOnlyPropertyFacade<T> {
    pub fn new(view_model: &ViewModel, property: impl Into<String>) -> Self {
        ReadOnlyPropertyFacade {
            inner: Rc::new(FacadeInner {
                view_model: Rc::downgrade(view_model.inner()),
                property: property.into(),
                cache: ValueCache::new(),
                subscription: RefCell::new(Subscription::none()),
                original: RefCell::new(T::default()),
                last_seen: RefCell::new(T::default()),
                has_changes: ValueCell::new(false),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Attach the facade to `source` using strict equality.
    pub fn observe(&self, source: impl Into<BindSource<T>>)
    where
        T: PartialEq,
    {
        self.observe_with(source, Equality::strict());
    }

    /// Attach the facade to `source`. Any previous attachment is disposed
    /// first.
    ///
    /// The source's current value becomes the new baseline and dirtiness
    /// resets. Attaching raises one changing/changed pair when the current
    /// value differs from whatever the facade last reported, which is what
    /// lets a hot-swapped model repaint the UI.
    pub fn observe_with(&self, source: impl Into<BindSource<T>>, equality: Equality<T>) {
        self.dispose();

        let inner = &self.inner;
        inner.cache.attach(source);
        let original = inner
            .cache
            .get()
            .expect("broken facade: cache has no value right after attach");
        *inner.original.borrow_mut() = original;
        debug!("facade mounted: property='{}'", inner.property);

        // A re-attach may find stale dirtiness left by the previous source;
        // no emission will arrive to clear it.
        if inner.has_changes.get() {
            inner.has_changes.set(false);
        }
        inner.disposed.set(false);

        let weak = Rc::downgrade(inner);
        let subscription = inner
            .cache
            .subscribe(Rc::new(move |new_value: &T| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                trace!("facade received value: property='{}'", inner.property);

                if equality.eq(&inner.last_seen.borrow(), new_value) {
                    return;
                }
                let changed = !equality.eq(&inner.original.borrow(), new_value);
                // Only pump the flag cell when its boolean value actually
                // flips; the change tracker counts every delivery.
                if inner.has_changes.get() != changed {
                    inner.has_changes.set(changed);
                }
                inner.raise(PropertyEvent::Changing(&inner.property));
                *inner.last_seen.borrow_mut() = new_value.clone();
                inner.raise(PropertyEvent::Changed(&inner.property));
            }))
            .expect("broken facade: cache lost its attachment during observe");
        *inner.subscription.borrow_mut() = subscription;
    }

    /// The current value, or the type default when unattached.
    pub fn value(&self) -> T {
        self.inner.cache.get().unwrap_or_default()
    }

    /// The baseline captured at attach time (or at the last
    /// [update_original_value](Self::update_original_value)).
    pub fn original_value(&self) -> T {
        self.inner.original.borrow().clone()
    }

    /// Boolean cell that is true iff the current value differs from the
    /// baseline under the facade's equality policy.
    pub fn has_changes(&self) -> ReadOnlyCell<bool> {
        self.inner.has_changes.read_only()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    pub fn property_name(&self) -> &str {
        &self.inner.property
    }

    /// Make the current value the new baseline and clear dirtiness
    /// immediately.
    pub fn update_original_value(&self) {
        *self.inner.original.borrow_mut() = self.value();
        if self.inner.has_changes.get() {
            self.inner.has_changes.set(false);
        }
    }

    /// Detach the live subscription and the cache. Idempotent; the facade
    /// can be re-attached with [observe](Self::observe).
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.subscription.borrow().dispose();
        self.inner.cache.dispose();
    }
}

impl<T> FacadeInner<T> {
    fn raise(&self, event: PropertyEvent<'_>) {
        if let Some(view_model) = self.view_model.upgrade() {
            view_model.raise(event);
        }
    }
}

impl<T: Clone + Default + 'static> Dispose for ReadOnlyPropertyFacade<T> {
    fn dispose(&self) {
        ReadOnlyPropertyFacade::dispose(self)
    }
}

impl<T> Debug for ReadOnlyPropertyFacade<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlyPropertyFacade")
            .field("property", &self.inner.property)
            .field("disposed", &self.inner.disposed.get())
            .finish_non_exhaustive()
    }
}

/// A [ReadOnlyPropertyFacade] whose attachment can also be written, plus the
/// baseline operations that only make sense with a writable source.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct PropertyFacade<T> {
    facade: ReadOnlyPropertyFacade<T>,
}

impl<T: Clone + Default + 'static> PropertyFacade<T> {
    pub fn new(view_model: &ViewModel, property: impl Into<String>) -> Self {
        PropertyFacade {
            facade: ReadOnlyPropertyFacade::new(view_model, property),
        }
    }

    /// Write through to the attached source. The resulting emission drives
    /// dirty tracking and notification like any other.
    pub fn set_value(&self, value: T) -> Result<(), BindError> {
        if self.facade.inner.disposed.get() {
            return Err(BindError::Disposed);
        }
        self.facade.inner.cache.set(value)
    }

    /// Write the baseline back into the source; dirtiness clears once the
    /// change propagates.
    pub fn reset_value(&self) -> Result<(), BindError> {
        let original = self.facade.original_value();
        self.set_value(original)
    }
}

impl<T> Deref for PropertyFacade<T> {
    type Target = ReadOnlyPropertyFacade<T>;

    fn deref(&self) -> &Self::Target {
        &self.facade
    }
}

impl<T: Clone + Default + 'static> HasChanges for PropertyFacade<T> {
    fn has_changes(&self) -> ReadOnlyCell<bool> {
        self.facade.has_changes()
    }

    fn reset_value(&self) -> Result<(), BindError> {
        PropertyFacade::reset_value(self)
    }

    fn update_original_value(&self) {
        self.facade.update_original_value()
    }
}

impl<T: Clone + Default + 'static> Dispose for PropertyFacade<T> {
    fn dispose(&self) {
        self.facade.dispose()
    }
}

impl<T> Debug for PropertyFacade<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyFacade")
            .field("property", &self.facade.inner.property)
            .field("disposed", &self.facade.inner.disposed.get())
            .finish_non_exhaustive()
    }
}
