use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use derivative::Derivative;
use log::debug;
use crate::cached::CachedView;
use crate::cell::{ConstantCell, ReadOnlyCell, ValueCell};
use crate::convert::{OneWaySource, TwoWaySource};
use crate::derived::DerivedCell;
use crate::error::BindError;
use crate::source::{Observable, ObserverFn, ValueSink, ValueSource};
use crate::subscribe::Subscription;

/// The kinds of source a [ValueCache] can bind to, classified once at attach
/// time.
pub enum BindSource<T> {
    /// A cell: instantaneous read, push updates, and writes.
    Cell(ValueCell<T>),
    /// Instantaneous read and push updates, no writes.
    ReadCell(Rc<dyn ValueSource<T>>),
    /// Push-only; the cache wraps it to capture the latest value.
    Push(Rc<dyn Observable<T>>),
    /// Push stream that additionally accepts writes.
    PushWrite(Rc<dyn Observable<T>>, Rc<dyn ValueSink<T>>),
}

impl<T> Debug for BindSource<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BindSource::Cell(_) => "BindSource::Cell",
            BindSource::ReadCell(_) => "BindSource::ReadCell",
            BindSource::Push(_) => "BindSource::Push",
            BindSource::PushWrite(..) => "BindSource::PushWrite",
        })
    }
}

// region BindSource conversions

impl<T: Clone + 'static> From<ValueCell<T>> for BindSource<T> {
    fn from(cell: ValueCell<T>) -> Self {
        BindSource::Cell(cell)
    }
}

impl<T: Clone + 'static> From<&ValueCell<T>> for BindSource<T> {
    fn from(cell: &ValueCell<T>) -> Self {
        BindSource::Cell(cell.clone())
    }
}

impl<T: Clone + 'static> From<ReadOnlyCell<T>> for BindSource<T> {
    fn from(cell: ReadOnlyCell<T>) -> Self {
        BindSource::ReadCell(Rc::new(cell))
    }
}

impl<T: Clone + 'static> From<&ReadOnlyCell<T>> for BindSource<T> {
    fn from(cell: &ReadOnlyCell<T>) -> Self {
        BindSource::ReadCell(Rc::new(cell.clone()))
    }
}

impl<T: Clone + 'static> From<DerivedCell<T>> for BindSource<T> {
    fn from(cell: DerivedCell<T>) -> Self {
        BindSource::ReadCell(Rc::new(cell))
    }
}

impl<T: Clone + 'static> From<&DerivedCell<T>> for BindSource<T> {
    fn from(cell: &DerivedCell<T>) -> Self {
        BindSource::ReadCell(Rc::new(cell.clone()))
    }
}

impl<T: Clone + 'static> From<ConstantCell<T>> for BindSource<T> {
    fn from(cell: ConstantCell<T>) -> Self {
        BindSource::ReadCell(Rc::new(cell))
    }
}

impl<S: 'static, T: 'static> From<OneWaySource<S, T>> for BindSource<T> {
    fn from(source: OneWaySource<S, T>) -> Self {
        BindSource::Push(Rc::new(source))
    }
}

impl<S: 'static, T: 'static> From<TwoWaySource<S, T>> for BindSource<T> {
    fn from(source: TwoWaySource<S, T>) -> Self {
        let source = Rc::new(source);
        BindSource::PushWrite(source.clone(), source)
    }
}

// endregion

#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
enum Attached<T> {
    /// The source reads instantly; used directly, nothing owned.
    Direct {
        source: Rc<dyn ValueSource<T>>,
        sink: Option<Rc<dyn ValueSink<T>>>,
    },
    /// Push-only source behind an owned [CachedView].
    Wrapped {
        view: CachedView<T>,
        sink: Option<Rc<dyn ValueSink<T>>>,
    },
}

/// Rebindable adapter exposing get/set/subscribe over whichever source is
/// currently attached.
///
/// Attaching classifies the source once: read-capable sources are used
/// directly, push-only sources get an internal [CachedView] the cache owns
/// and disposes on rebind. Write capability is kept when the source offers
/// it. The cache never disposes a caller-supplied source.
pub struct ValueCache<T> {
    attachment: RefCell<Option<Attached<T>>>,
}

impl<T: Clone + Default + 'static> ValueCache<T> {
    pub fn new() -> Self {
        ValueCache {
            attachment: RefCell::new(None),
        }
    }

    /// Bind to `source`, tearing down the previous attachment's owned
    /// wrapper first.
    pub fn attach(&self, source: impl Into<BindSource<T>>) {
        self.dispose();
        let attached = match source.into() {
            BindSource::Cell(cell) => Attached::Direct {
                sink: Some(Rc::new(cell.clone())),
                source: Rc::new(cell),
            },
            BindSource::ReadCell(source) => Attached::Direct { source, sink: None },
            BindSource::Push(source) => Attached::Wrapped {
                view: CachedView::new(source),
                sink: None,
            },
            BindSource::PushWrite(source, sink) => Attached::Wrapped {
                view: CachedView::new(source),
                sink: Some(sink),
            },
        };
        debug!("value cache attached: mode={}", mode_name(&attached));
        *self.attachment.borrow_mut() = Some(attached);
    }

    pub fn has_attachment(&self) -> bool {
        self.attachment.borrow().is_some()
    }

    pub fn can_set(&self) -> bool {
        match &*self.attachment.borrow() {
            Some(Attached::Direct { sink, .. }) | Some(Attached::Wrapped { sink, .. }) => {
                sink.is_some()
            }
            None => false,
        }
    }

    /// Read the current value. For a wrapped push source that has not
    /// emitted yet, this is the type default.
    pub fn get(&self) -> Result<T, BindError> {
        let attached = self.attachment.borrow().clone();
        match attached {
            None => Err(BindError::NotAttached),
            Some(Attached::Direct { source, .. }) => Ok(source.get()),
            Some(Attached::Wrapped { view, .. }) => Ok(view.value().unwrap_or_default()),
        }
    }

    pub fn set(&self, value: T) -> Result<(), BindError> {
        let attached = self.attachment.borrow().clone();
        match attached {
            None => Err(BindError::NotAttached),
            Some(Attached::Direct { sink: Some(sink), .. })
            | Some(Attached::Wrapped { sink: Some(sink), .. }) => {
                sink.set(value);
                Ok(())
            }
            Some(_) => Err(BindError::NotWritable),
        }
    }

    pub fn subscribe(&self, observer: ObserverFn<T>) -> Result<Subscription, BindError> {
        let attached = self.attachment.borrow().clone();
        match attached {
            None => Err(BindError::NotAttached),
            Some(Attached::Direct { source, .. }) => Ok(source.subscribe(observer)),
            Some(Attached::Wrapped { view, .. }) => Ok(view.subscribe(observer)),
        }
    }

    /// Tear down the owned wrapper (if the current mode has one) and reset to
    /// the unattached state. Caller-supplied sources are left untouched.
    pub fn dispose(&self) {
        let attached = self.attachment.borrow_mut().take();
        if let Some(Attached::Wrapped { view, .. }) = attached {
            view.dispose();
        }
    }
}

impl<T: Clone + Default + 'static> Default for ValueCache<T> {
    fn default() -> Self {
        ValueCache::new()
    }
}

fn mode_name<T>(attached: &Attached<T>) -> &'static str {
    match attached {
        Attached::Direct { sink: Some(_), .. } => "cell",
        Attached::Direct { .. } => "read",
        Attached::Wrapped { sink: Some(_), .. } => "push+write",
        Attached::Wrapped { .. } => "push",
    }
}

impl<T> Debug for ValueCache<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mode = match &*self.attachment.borrow() {
            None => "unattached",
            Some(attached) => mode_name(attached),
        };
        f.debug_struct("ValueCache").field("mode", &mode).finish()
    }
}
