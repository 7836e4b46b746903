use thiserror::Error;

/// Invalid-state conditions surfaced by caches and facades.
///
/// All of these are returned synchronously to the caller of the operation
/// that triggered them; nothing is swallowed or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BindError {
    /// An operation that needs a live attachment ran before any source was
    /// attached.
    #[error("no source has been attached")]
    NotAttached,
    /// A write was attempted on an attachment that only supports reading.
    #[error("the attached source does not accept writes")]
    NotWritable,
    /// A write was attempted on a disposed facade.
    #[error("the facade has been disposed; attach a new source by calling observe")]
    Disposed,
}
