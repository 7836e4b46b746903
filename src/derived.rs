use std::cell::{Cell, RefCell};
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use derivative::Derivative;
use crate::cell::ValueCell;
use crate::source::{Observable, ObserverFn, ValueSource};
use crate::subscribe::{Dispose, Subscription};

/// Read-only cell computed from a set of input cells.
///
/// Created by [combine_latest]; exposes the latest computed value with the
/// same replay-on-subscribe semantics as a [ValueCell]. Owns its input
/// registrations; disposing cancels them and freezes the output at its last
/// value.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct DerivedCell<T> {
    inner: Rc<DerivedInner<T>>,
}

struct DerivedInner<T> {
    output: ValueCell<T>,
    inputs: RefCell<Vec<Subscription>>,
}

impl<T: Clone + 'static> DerivedCell<T> {
    pub fn get(&self) -> T {
        self.inner.output.get()
    }

    pub fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        self.inner.output.subscribe(observer)
    }

    pub fn dispose(&self) {
        for registration in self.inner.inputs.borrow().iter() {
            registration.dispose();
        }
    }
}

impl<T: Clone + 'static> Observable<T> for DerivedCell<T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        DerivedCell::subscribe(self, observer)
    }
}

impl<T: Clone + 'static> ValueSource<T> for DerivedCell<T> {
    fn get(&self) -> T {
        DerivedCell::get(self)
    }
}

impl<T: Clone + 'static> Dispose for DerivedCell<T> {
    fn dispose(&self) {
        DerivedCell::dispose(self)
    }
}

impl<T> Debug for DerivedCell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedCell")
            .field("inputs", &self.inner.inputs.borrow().len())
            .finish_non_exhaustive()
    }
}

/// Combine the latest values of `inputs` through `map`.
///
/// The mapped value is computed eagerly from the inputs' current values and
/// recomputed on every input emission — exactly one output emission per input
/// change.
pub fn combine_latest<T, U>(
    inputs: &[ValueCell<T>],
    map: impl Fn(&[T]) -> U + 'static,
) -> DerivedCell<U>
where
    T: Clone + 'static,
    U: Clone + 'static,
{
    let map = Rc::new(map);
    let cells: Rc<[ValueCell<T>]> = inputs.into();
    let current: Vec<T> = cells.iter().map(|cell| cell.get()).collect();
    let output = ValueCell::new(map(&current));

    let mut registrations = Vec::with_capacity(cells.len());
    for cell in cells.iter() {
        let cells = cells.clone();
        let map = map.clone();
        let output = output.clone();
        // The subscribe-time replay is already folded into the initial
        // compute above; only live emissions recompute.
        let init = Rc::new(Cell::new(true));
        let guard = init.clone();
        let registration = cell.subscribe(Rc::new(move |_new: &T| {
            if guard.get() {
                return;
            }
            let current: Vec<T> = cells.iter().map(|cell| cell.get()).collect();
            output.set(map(&current));
        }));
        init.set(false);
        registrations.push(registration);
    }

    DerivedCell {
        inner: Rc::new(DerivedInner {
            output,
            inputs: RefCell::new(registrations),
        }),
    }
}
