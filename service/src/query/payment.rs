//! [`Query`] collection related to [`Payment`]s.

use common::operations::By;

use crate::{
    domain::{payment, rental, Payment},
    read::Paid,
};
#[cfg(doc)]
use crate::{domain::Rental, Query};

use super::DatabaseQuery;

/// Queries all [`Payment`]s of a [`Rental`], ordered by creation.
pub type ByRental = DatabaseQuery<By<Vec<Payment>, rental::Id>>;

/// Queries a settled [`Payment`] of a [`Rental`], if any.
pub type PaidByRental = DatabaseQuery<By<Option<Paid<Payment>>, rental::Id>>;

/// Queries all pending [`Payment`]s due strictly before the provided date,
/// ordered by due date.
pub type OverdueAsOf = DatabaseQuery<By<Vec<Payment>, payment::DueDate>>;
