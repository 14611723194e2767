//! [`Role`]-based permissions.

use common::define_kind;

#[cfg(doc)]
use crate::domain::{ChecklistItem, Payment, Rental};

define_kind! {
    #[doc = "Role of a user acting upon the system."]
    enum Role {
        #[doc = "Unrestricted access."]
        Admin = 1,

        #[doc = "Sales staff, managing [`Rental`]s commercially."]
        Comercial = 2,

        #[doc = "Field staff, handling installation and collection."]
        Operacional = 3,
    }
}

impl Role {
    /// Indicates whether this [`Role`] is permitted to perform the provided
    /// [`Action`].
    #[must_use]
    pub fn permits(self, action: Action) -> bool {
        use Action as A;

        match self {
            Self::Admin => true,
            Self::Comercial => matches!(
                action,
                A::CreateRental
                    | A::EditLineItems
                    | A::AdvanceRental
                    | A::CancelRental
                    | A::ConfirmPayment
            ),
            Self::Operacional => matches!(
                action,
                A::AdvanceRental | A::EditChecklist | A::FinalizeRental
            ),
        }
    }
}

/// Action a [`Role`] may or may not be permitted to perform.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    /// Creating a new [`Rental`].
    CreateRental,

    /// Adding or removing [`Rental`] line items.
    EditLineItems,

    /// Advancing a [`Rental`] along its lifecycle.
    AdvanceRental,

    /// Cancelling a [`Rental`].
    CancelRental,

    /// Registering a [`Payment`] as settled.
    ConfirmPayment,

    /// Generating or reconciling [`ChecklistItem`]s.
    EditChecklist,

    /// Finalizing a [`Rental`] with its definitive billing.
    FinalizeRental,
}

#[cfg(test)]
mod spec {
    use super::{Action, Role};

    #[test]
    fn admin_is_permitted_everything() {
        for action in [
            Action::CreateRental,
            Action::EditLineItems,
            Action::AdvanceRental,
            Action::CancelRental,
            Action::ConfirmPayment,
            Action::EditChecklist,
            Action::FinalizeRental,
        ] {
            assert!(Role::Admin.permits(action), "{action:?}");
        }
    }

    #[test]
    fn comercial_cannot_touch_collection() {
        assert!(Role::Comercial.permits(Action::CreateRental));
        assert!(Role::Comercial.permits(Action::ConfirmPayment));
        assert!(!Role::Comercial.permits(Action::EditChecklist));
        assert!(!Role::Comercial.permits(Action::FinalizeRental));
    }

    #[test]
    fn operacional_cannot_sell() {
        assert!(Role::Operacional.permits(Action::EditChecklist));
        assert!(Role::Operacional.permits(Action::FinalizeRental));
        assert!(!Role::Operacional.permits(Action::CreateRental));
        assert!(!Role::Operacional.permits(Action::CancelRental));
        assert!(!Role::Operacional.permits(Action::ConfirmPayment));
    }
}
