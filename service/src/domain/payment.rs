//! [`Payment`] definitions.

use common::{define_kind, unit, Date, DateOf, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::rental;
#[cfg(doc)]
use crate::domain::Rental;

/// Financial settlement record of a [`Rental`].
///
/// Tracked separately from the [`Rental`] lifecycle: a [`Rental`] may only
/// advance into [`Confirmed`] once a [`Paid`] [`Payment`] exists for it.
///
/// [`Confirmed`]: rental::Status::Confirmed
/// [`Paid`]: Status::Paid
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Rental`] this [`Payment`] settles.
    pub rental_id: rental::Id,

    /// Amount of this [`Payment`].
    pub amount: Money,

    /// Current [`Status`] of this [`Payment`].
    pub status: Status,

    /// [`Date`] this [`Payment`] is due by, if any.
    ///
    /// [`Date`]: common::Date
    pub due_on: Option<DueDate>,

    /// [`DateTime`] when this [`Payment`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Payment`] was marked as paid, if it was.
    ///
    /// [`DateTime`]: common::DateTime
    pub paid_at: Option<SettlementDateTime>,
}

impl Payment {
    /// Indicates whether this [`Payment`] is settled.
    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == Status::Paid
    }

    /// Indicates whether this [`Payment`] is overdue as of `today`.
    #[must_use]
    pub fn is_overdue(&self, today: Date) -> bool {
        self.status == Status::Pending
            && self
                .due_on
                .is_some_and(|due| due.days_until(today) > 0)
    }
}

/// ID of a [`Payment`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of a [`Payment`]."]
    enum Status {
        #[doc = "Awaiting settlement."]
        Pending = 1,

        #[doc = "Settled."]
        Paid = 2,

        #[doc = "Cancelled, never settled."]
        Cancelled = 3,
    }
}

/// Marker type indicating a [`Payment`] due date.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// [`Date`] a [`Payment`] is due by.
///
/// [`Date`]: common::Date
pub type DueDate = DateOf<(Payment, Due)>;

/// [`DateTime`] when a [`Payment`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

/// [`DateTime`] when a [`Payment`] was settled.
///
/// [`DateTime`]: common::DateTime
pub type SettlementDateTime = DateTimeOf<(Payment, unit::Settlement)>;
