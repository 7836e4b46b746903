use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use derivative::Derivative;
use crate::cell::ValueCell;
use crate::source::{Observable, ObserverFn, ValueSink};
use crate::subscribe::Subscription;

/// Push adapter that maps every emission of an `S` source into a `T`.
///
/// Useful when a facade's value type must differ from the domain property's
/// type (e.g. to suit a picky UI control). Replays pass through the map like
/// any other emission.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct OneWaySource<S, T> {
    source: Rc<dyn Observable<S>>,
    map: Rc<dyn Fn(&S) -> T>,
}

impl<S: 'static, T: 'static> OneWaySource<S, T> {
    pub fn new(source: Rc<dyn Observable<S>>, map: impl Fn(&S) -> T + 'static) -> Self {
        OneWaySource {
            source,
            map: Rc::new(map),
        }
    }
}

impl<S: 'static, T: 'static> Observable<T> for OneWaySource<S, T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        let map = self.map.clone();
        self.source
            .subscribe(Rc::new(move |value: &S| observer(&map(value))))
    }
}

impl<S, T> Debug for OneWaySource<S, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneWaySource").finish_non_exhaustive()
    }
}

/// A [OneWaySource] that also accepts writes, mapping them back to the
/// source type.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct TwoWaySource<S, T> {
    forward: OneWaySource<S, T>,
    sink: Rc<dyn ValueSink<S>>,
    map_back: Rc<dyn Fn(T) -> S>,
}

impl<S: 'static, T: 'static> TwoWaySource<S, T> {
    pub fn new(
        source: Rc<dyn Observable<S>>,
        sink: Rc<dyn ValueSink<S>>,
        map: impl Fn(&S) -> T + 'static,
        map_back: impl Fn(T) -> S + 'static,
    ) -> Self {
        TwoWaySource {
            forward: OneWaySource::new(source, map),
            sink,
            map_back: Rc::new(map_back),
        }
    }

    /// Convenience for the common case of converting over a [ValueCell].
    pub fn from_cell(
        cell: &ValueCell<S>,
        map: impl Fn(&S) -> T + 'static,
        map_back: impl Fn(T) -> S + 'static,
    ) -> Self
    where
        S: Clone,
    {
        Self::new(Rc::new(cell.clone()), Rc::new(cell.clone()), map, map_back)
    }
}

impl<S: 'static, T: 'static> Observable<T> for TwoWaySource<S, T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        self.forward.subscribe(observer)
    }
}

impl<S: 'static, T: 'static> ValueSink<T> for TwoWaySource<S, T> {
    fn set(&self, value: T) {
        self.sink.set((self.map_back)(value));
    }
}

impl<S, T> Debug for TwoWaySource<S, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwoWaySource").finish_non_exhaustive()
    }
}
