use std::rc::Rc;
use crate::subscribe::Subscription;

/// Observer callback invoked with each pushed value.
pub type ObserverFn<T> = Rc<dyn Fn(&T)>;

/// A push-based source of values.
///
/// Subscribing attaches an observer until the returned [Subscription] is
/// disposed. Whether the current value is replayed to a new observer depends
/// on the source ([ValueCell](crate::ValueCell) and
/// [CachedView](crate::CachedView) replay, a plain event stream does not).
pub trait Observable<T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription;
}

/// An [Observable] whose latest value can also be read instantly, without
/// waiting for a push.
pub trait ValueSource<T>: Observable<T> {
    fn get(&self) -> T;
}

/// A sink that accepts written values.
pub trait ValueSink<T> {
    fn set(&self, value: T);
}
