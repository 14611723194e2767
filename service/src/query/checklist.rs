//! [`Query`] collection related to [`ChecklistItem`]s.

use common::operations::By;

use crate::domain::{rental, ChecklistItem};
#[cfg(doc)]
use crate::{domain::Rental, Query};

use super::DatabaseQuery;

/// Queries all [`ChecklistItem`]s of a [`Rental`], ordered by creation.
pub type ByRental = DatabaseQuery<By<Vec<ChecklistItem>, rental::Id>>;
