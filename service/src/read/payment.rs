//! [`Payment`] read model definition.

#[cfg(doc)]
use crate::domain::Payment;

/// Wrapper around [`Payment`] indicating that it [`is_paid()`].
///
/// [`is_paid()`]: Payment::is_paid
#[derive(Clone, Copy, Debug)]
pub struct Paid<T>(pub T);
