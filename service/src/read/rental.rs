//! [`Rental`] read model definitions.

use crate::domain::{
    rental::{billing::FinalValues, LineItem},
    ChecklistItem, Rental,
};

/// [`Rental`] together with everything its finalization resolved.
#[derive(Clone, Debug)]
pub struct Settlement {
    /// Finalized [`Rental`] itself.
    pub rental: Rental,

    /// [`LineItem`]s of the [`Rental`].
    pub items: Vec<LineItem>,

    /// [`ChecklistItem`]s reconciled during collection.
    pub checklist: Vec<ChecklistItem>,

    /// Definitive billing values.
    pub values: FinalValues,
}

pub mod list {
    //! [`Rental`]s list definitions.

    use std::ops;

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{customer, rental};
    #[cfg(doc)]
    use crate::domain::Rental;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = (rental::Id, rental::Status);

    /// Cursor pointing to a specific [`Rental`] in a list.
    pub type Cursor = rental::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`rental::Status`] to filter by.
        pub status: Option<rental::Status>,

        /// [`customer::Id`] to filter by.
        pub customer_id: Option<customer::Id>,
    }

    /// Total count of [`Rental`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);

    impl ops::Div for TotalCount {
        type Output = f64;

        fn div(self, rhs: Self) -> Self::Output {
            f64::from(self.0) / f64::from(rhs.0)
        }
    }
}
