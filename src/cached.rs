use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use derivative::Derivative;
use crate::source::{Observable, ObserverFn};
use crate::subscribe::{Dispose, Subscription};

/// Captures the latest value emitted by one upstream source and replays it
/// to late subscribers.
///
/// The view subscribes to its upstream at construction and is bound to it for
/// life. A new subscriber is forwarded to the upstream first and then, if a
/// value has been cached, receives that value synchronously — replay-then-live
/// with no dedup of the forwarded stream, so an upstream that itself replays
/// delivers twice.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct CachedView<T> {
    inner: Rc<CachedInner<T>>,
}

struct CachedInner<T> {
    source: Rc<dyn Observable<T>>,
    latest: RefCell<Option<T>>,
    registration: RefCell<Subscription>,
}

impl<T: Clone + 'static> CachedView<T> {
    pub fn new(source: Rc<dyn Observable<T>>) -> Self {
        let inner = Rc::new(CachedInner {
            source,
            latest: RefCell::new(None),
            registration: RefCell::new(Subscription::none()),
        });
        let weak = Rc::downgrade(&inner);
        let registration = inner.source.subscribe(Rc::new(move |value: &T| {
            if let Some(inner) = weak.upgrade() {
                *inner.latest.borrow_mut() = Some(value.clone());
            }
        }));
        *inner.registration.borrow_mut() = registration;
        CachedView { inner }
    }

    /// False until the upstream has emitted at least once; never reverts.
    pub fn has_value(&self) -> bool {
        self.inner.latest.borrow().is_some()
    }

    /// The latest cached value, if any has arrived.
    pub fn value(&self) -> Option<T> {
        self.inner.latest.borrow().clone()
    }

    pub fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        let subscription = self.inner.source.subscribe(observer.clone());
        let cached = self.value();
        if let Some(value) = cached {
            observer(&value);
        }
        subscription
    }

    /// Tear down the internal upstream registration. Idempotent.
    ///
    /// Subscriptions handed out earlier keep running; they are direct on the
    /// upstream.
    pub fn dispose(&self) {
        self.inner.registration.borrow().dispose();
    }
}

impl<T: Clone + 'static> Observable<T> for CachedView<T> {
    fn subscribe(&self, observer: ObserverFn<T>) -> Subscription {
        CachedView::subscribe(self, observer)
    }
}

impl<T: Clone + 'static> Dispose for CachedView<T> {
    fn dispose(&self) {
        CachedView::dispose(self)
    }
}

impl<T> Debug for CachedView<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedView")
            .field("has_value", &self.inner.latest.borrow().is_some())
            .finish_non_exhaustive()
    }
}
