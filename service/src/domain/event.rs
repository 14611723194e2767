//! [`Event`]s emitted by state-changing operations.

use common::Money;

use crate::domain::rental;
#[cfg(doc)]
use crate::domain::Rental;

/// Notable state change produced by an operation.
///
/// Returned alongside the operation's result, so callers may log, audit or
/// relay them.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// [`Rental`] moved from one [`Status`] to another.
    ///
    /// [`Status`]: rental::Status
    StatusChanged {
        /// ID of the affected [`Rental`].
        rental_id: rental::Id,

        /// [`Status`] the [`Rental`] was in.
        ///
        /// [`Status`]: rental::Status
        from: rental::Status,

        /// [`Status`] the [`Rental`] is in now.
        ///
        /// [`Status`]: rental::Status
        to: rental::Status,
    },

    /// Every collectible item of a [`Rental`] has been collected.
    ChecklistCompleted {
        /// ID of the affected [`Rental`].
        rental_id: rental::Id,
    },

    /// [`Rental`] received its definitive billing.
    Finalized {
        /// ID of the affected [`Rental`].
        rental_id: rental::Id,

        /// Definitive total value of the [`Rental`].
        total_value: Money,
    },
}
