//! [`Rental`] lifecycle [`Status`] definitions.

use common::define_kind;

#[cfg(doc)]
use crate::domain::Rental;

define_kind! {
    #[doc = "Lifecycle status of a [`Rental`]."]
    enum Status {
        #[doc = "Created, payment not attempted yet."]
        Pending = 1,

        #[doc = "Payment explicitly deferred, still not confirmed."]
        AwaitingPayment = 2,

        #[doc = "Payment confirmed."]
        Confirmed = 3,

        #[doc = "Items are out with the customer."]
        Ongoing = 4,

        #[doc = "Items are being collected back."]
        Collecting = 5,

        #[doc = "Closed out and settled. Terminal."]
        Finished = 6,

        #[doc = "Cancelled before close-out. Terminal."]
        Cancelled = 7,
    }
}

/// Canonical forward flow of a [`Rental`] lifecycle.
///
/// [`Status::Cancelled`] is not part of the flow: it's a side transition
/// reachable from any non-terminal [`Status`].
const FLOW: [Status; 6] = [
    Status::Pending,
    Status::AwaitingPayment,
    Status::Confirmed,
    Status::Ongoing,
    Status::Collecting,
    Status::Finished,
];

impl Status {
    /// Returns the [`Status`] immediately following this one in the canonical
    /// forward flow.
    ///
    /// [`None`] is returned for terminal [`Status`]es.
    ///
    /// This is a pure lookup: it doesn't consult any transition precondition
    /// (confirmed payment, complete checklist). Callers gate the actual
    /// transition.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        FLOW.iter()
            .position(|s| *s == self)
            .and_then(|i| FLOW.get(i + 1))
            .copied()
    }

    /// Indicates whether this [`Status`] is terminal.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled)
    }

    /// Indicates whether a transition from this [`Status`] into the `target`
    /// one is legal.
    ///
    /// Legal transitions are the single forward step of the canonical flow,
    /// plus [`Status::Cancelled`] from any non-terminal [`Status`].
    #[must_use]
    pub fn allows(self, target: Self) -> bool {
        if target == Self::Cancelled {
            return !self.is_terminal();
        }
        self.next() == Some(target)
    }
}

#[cfg(test)]
mod spec {
    use super::Status;

    #[test]
    fn follows_canonical_order() {
        let mut visited = Vec::new();
        let mut current = Status::Pending;
        while let Some(next) = current.next() {
            visited.push(next);
            current = next;
        }

        assert_eq!(
            visited,
            [
                Status::AwaitingPayment,
                Status::Confirmed,
                Status::Ongoing,
                Status::Collecting,
                Status::Finished,
            ],
        );
    }

    #[test]
    fn terminal_statuses_have_no_next() {
        assert_eq!(Status::Finished.next(), None);
        assert_eq!(Status::Cancelled.next(), None);
    }

    #[test]
    fn cancellation_is_legal_from_any_non_terminal_status() {
        for status in [
            Status::Pending,
            Status::AwaitingPayment,
            Status::Confirmed,
            Status::Ongoing,
            Status::Collecting,
        ] {
            assert!(status.allows(Status::Cancelled), "{status}");
        }

        assert!(!Status::Finished.allows(Status::Cancelled));
        assert!(!Status::Cancelled.allows(Status::Cancelled));
    }

    #[test]
    fn disallows_skipping_and_going_backward() {
        assert!(Status::Pending.allows(Status::AwaitingPayment));
        assert!(!Status::Pending.allows(Status::Confirmed));
        assert!(!Status::Ongoing.allows(Status::Confirmed));
        assert!(!Status::Collecting.allows(Status::Ongoing));
        assert!(Status::Collecting.allows(Status::Finished));
        assert!(!Status::Finished.allows(Status::Pending));
        assert!(!Status::Cancelled.allows(Status::Pending));
    }
}
