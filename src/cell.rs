use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use derivative::Derivative;
use log::trace;
use crate::source::{Observable, ObserverFn, ValueSink, ValueSource};
use crate::subscribe::{Dispose, ObserverList, Subscription};

/// Coercion rule applied on every write: `(old, proposed) -> stored`.
pub type CoerceFn<T> = Rc<dyn Fn(&T, T) -> T>;

/// A mutable reactive cell holding exactly one current value.
///
/// Writes run through the cell's coercion rule, store the result, and then
/// deliver it synchronously to every subscriber in subscription order before
/// the write returns. Subscribing replays the current value synchronously,
/// then delivers every subsequent write ("behavior subject" semantics).
///
/// Cloning a cell clones the handle, not the value: all clones share the same
/// state and observers.
///
/// Nested writes from inside a subscriber's own handler are legal and deliver
/// recursively, in call-stack order; no batching or coalescing is performed.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct ValueCell<T> {
    inner: Rc<CellInner<T>>,
}

struct CellInner<T> {
    value: RefCell<T>,
    coerce: CoerceFn<T>,
    observers: ObserverList<T>,
    disposed: Cell<bool>,
}

impl<T: Clone + 'static> ValueCell<T> {
    /// Create a cell with an identity coercion.
    pub fn new(initial: T) -> Self {
        Self::build(initial, Rc::new(|_: &T, proposed: T| proposed), false)
    }

    /// Create a cell whose writes run through `coerce`. The coercion is also
    /// applied to `initial` immediately (the initial value is passed as both
    /// the previous and the proposed value).
    pub fn with_coerce(initial: T, coerce: impl Fn(&T, T) -> T + 'static) -> Self {
        Self::build(initial, Rc::new(coerce), true)
    }

    /// Like [ValueCell::with_coerce], but `initial` is stored raw and the
    /// coercion is deferred until the returned token is released (or
    /// dropped).
    ///
    /// This supports bootstrap of interdependent cells: when a coercion reads
    /// sibling cells, all of them must exist before it may safely run.
    pub fn with_deferred_coerce(
        initial: T,
        coerce: impl Fn(&T, T) -> T + 'static,
    ) -> (Self, CoerceToken) {
        let cell = Self::build(initial, Rc::new(coerce), false);
        let token = CoerceToken::new({
            let cell = cell.clone();
            move || cell.coerce_current()
        });
        (cell, token)
    }

    fn build(initial: T, coerce: CoerceFn<T>, coerce_now: bool) -> Self {
        let initial = if coerce_now {
            let proposed = initial.clone();
            coerce(&initial, proposed)
        } else {
            initial
        };
        ValueCell {
            inner: Rc::new(CellInner {
                value: RefCell::new(initial),
                coerce,
                observers: ObserverList::new(),
                disposed: Cell::new(false),
            }),
        }
    }

    /// Read the current value instantly.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Coerce `value` against the current value, store the result, and
    /// deliver it to every subscriber before returning. Total over `T`.
    pub fn set(&self, value: T) {
        let coerced = {
            let current = self.inner.value.borrow();
            (self.inner.coerce)(&current, value)
        };
        *self.inner.value.borrow_mut() = coerced.clone();
        self.inner.observers.emit(&coerced);
    }

    /// Re-run the coercion on the current value through the normal write
    /// path, so subscribers observe the re-coerced value.
    pub fn coerce_current(&self) {
        let current = self.get();
        self.set(current);
    }

    /// Attach `observer`: it is invoked synchronously once with the current
    /// value, then with every subsequent write until the subscription is
    /// disposed.
    pub fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        if self.inner.disposed.get() {
            trace!("value cell: subscribe after dispose, returning inert handle");
            return Subscription::none();
        }
        let key = self.inner.observers.insert(observer.clone());
        let weak = Rc::downgrade(&self.inner);
        let subscription = Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.observers.remove(key);
            }
        });
        let current = self.get();
        observer(&current);
        subscription
    }

    /// Detach every observer and mark the cell terminal. Idempotent.
    ///
    /// The stored value stays readable and writable; only delivery stops, and
    /// later subscribers get an inert handle with no replay.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.inner.observers.clear();
    }

    /// A read/subscribe view of this cell that hides the write surface.
    pub fn read_only(&self) -> ReadOnlyCell<T> {
        ReadOnlyCell { cell: self.clone() }
    }
}

impl<T: Clone + Default + 'static> Default for ValueCell<T> {
    fn default() -> Self {
        ValueCell::new(T::default())
    }
}

impl<T: Clone + 'static> Observable<T> for ValueCell<T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        ValueCell::subscribe(self, observer)
    }
}

impl<T: Clone + 'static> ValueSource<T> for ValueCell<T> {
    fn get(&self) -> T {
        ValueCell::get(self)
    }
}

impl<T: Clone + 'static> ValueSink<T> for ValueCell<T> {
    fn set(&self, value: T) {
        ValueCell::set(self, value)
    }
}

impl<T: Clone + 'static> Dispose for ValueCell<T> {
    fn dispose(&self) {
        ValueCell::dispose(self)
    }
}

impl<T> Debug for ValueCell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCell")
            .field("observers", &self.inner.observers.len())
            .field("disposed", &self.inner.disposed.get())
            .finish_non_exhaustive()
    }
}

/// One-shot token for a deferred coercion; releasing (or dropping) it
/// re-applies the cell's coercion to the then-current value.
pub struct CoerceToken {
    apply: Option<Box<dyn FnOnce()>>,
}

impl CoerceToken {
    pub(crate) fn new(apply: impl FnOnce() + 'static) -> Self {
        CoerceToken {
            apply: Some(Box::new(apply)),
        }
    }

    /// Apply the deferred coercion now. Dropping the token does the same.
    pub fn release(self) {}
}

impl Drop for CoerceToken {
    fn drop(&mut self) {
        if let Some(apply) = self.apply.take() {
            apply();
        }
    }
}

impl Debug for CoerceToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoerceToken")
            .field("pending", &self.apply.is_some())
            .finish()
    }
}

/// Read/subscribe view over a [ValueCell], without the write surface.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct ReadOnlyCell<T> {
    cell: ValueCell<T>,
}

impl<T: Clone + 'static> ReadOnlyCell<T> {
    pub fn get(&self) -> T {
        self.cell.get()
    }

    pub fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        self.cell.subscribe(observer)
    }
}

impl<T: Clone + 'static> Observable<T> for ReadOnlyCell<T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        ReadOnlyCell::subscribe(self, observer)
    }
}

impl<T: Clone + 'static> ValueSource<T> for ReadOnlyCell<T> {
    fn get(&self) -> T {
        ReadOnlyCell::get(self)
    }
}

impl<T> Debug for ReadOnlyCell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadOnlyCell").finish_non_exhaustive()
    }
}

/// A source that always holds the same value; subscribing replays it once
/// and returns an inert subscription.
#[derive(Debug, Derivative)]
#[derivative(Clone(bound = ""))]
pub struct ConstantCell<T> {
    value: Rc<T>,
}

impl<T: Clone + 'static> ConstantCell<T> {
    pub fn new(value: T) -> Self {
        ConstantCell {
            value: Rc::new(value),
        }
    }

    pub fn get(&self) -> T {
        (*self.value).clone()
    }
}

impl<T: Clone + 'static> Observable<T> for ConstantCell<T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        observer(&self.value);
        Subscription::none()
    }
}

impl<T: Clone + 'static> ValueSource<T> for ConstantCell<T> {
    fn get(&self) -> T {
        ConstantCell::get(self)
    }
}
