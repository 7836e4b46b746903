use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use derivative::Derivative;

/// Equality policy used by facades to decide whether an emission is a
/// material change.
#[derive(Derivative)]
#[derivative(Clone(bound = ""))]
pub struct Equality<T> {
    eq: Rc<dyn Fn(&T, &T) -> bool>,
}

impl<T> Equality<T> {
    pub fn new(eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Equality { eq: Rc::new(eq) }
    }

    pub fn eq(&self, a: &T, b: &T) -> bool {
        (self.eq)(a, b)
    }
}

impl<T: PartialEq> Equality<T> {
    /// Plain structural equality.
    pub fn strict() -> Self {
        Equality::new(|a: &T, b: &T| a == b)
    }
}

impl Equality<Option<String>> {
    /// `None` and `Some("")` compare equal to each other (and only to each
    /// other); anything else is exact comparison.
    ///
    /// The usual policy for optional text properties, where an emptied input
    /// field must not read as a change from an absent value.
    pub fn none_or_empty() -> Self {
        Equality::new(|a: &Option<String>, b: &Option<String>| {
            let blank = |value: &Option<String>| value.as_deref().map_or(true, str::is_empty);
            if blank(a) && blank(b) {
                true
            } else {
                a == b
            }
        })
    }
}

impl<T> Debug for Equality<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Equality").finish_non_exhaustive()
    }
}
