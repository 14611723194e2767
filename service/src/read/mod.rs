//! Read entities definitions.

pub mod payment;
pub mod rental;

pub use self::{payment::Paid, rental::Settlement};
