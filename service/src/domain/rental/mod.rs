//! [`Rental`] definitions.

pub mod billing;
pub mod item;
pub mod status;

use common::{money::Currency, unit, DateOf, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::customer;
#[cfg(doc)]
use crate::domain::Customer;

pub use self::{item::LineItem, status::Status};

/// Contract to lease catalog items to a [`Customer`] over a date range.
#[derive(Clone, Debug)]
pub struct Rental {
    /// ID of this [`Rental`].
    pub id: Id,

    /// ID of the [`Customer`] this [`Rental`] is leased to.
    ///
    /// Immutable after creation.
    pub customer_id: customer::Id,

    /// [`Period`] this [`Rental`] is planned for.
    pub period: Period,

    /// [`Date`] when the rented items are installed, if scheduled.
    ///
    /// [`Date`]: common::Date
    pub installation_on: Option<InstallationDate>,

    /// Free-form time note for the installation (e.g. `14:30`).
    pub installation_time: Option<InstallationTime>,

    /// Current [`Status`] of this [`Rental`].
    pub status: Status,

    /// [`Date`] when the rented items were actually returned, once finalized.
    ///
    /// [`Date`]: common::Date
    pub returned_on: Option<ReturnDate>,

    /// Sum of per-day charges across this [`Rental`]'s [`LineItem`]s.
    pub daily_rate: Money,

    /// Discount applied to the total of this [`Rental`].
    pub discount: Money,

    /// Delivery fee charged on top of the total of this [`Rental`].
    ///
    /// Not part of the running estimate, only of the final settlement.
    pub delivery_fee: Money,

    /// Quoted total of this [`Rental`], locked at creation or at the last
    /// recompute.
    pub total_value: Money,

    /// [`DateTime`] when this [`Rental`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`Revision`] of this [`Rental`] for optimistic concurrency.
    pub revision: Revision,
}

impl Rental {
    /// Returns the [`Currency`] all monetary values of this [`Rental`] are
    /// expressed in.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.daily_rate.currency
    }
}

/// ID of a [`Rental`].
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

/// Inclusive date range a [`Rental`] is planned for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    /// First day of the range.
    start: StartDate,

    /// Last day of the range, charged as well.
    end: EndDate,
}

impl Period {
    /// Creates a new [`Period`] if the given `end` doesn't precede the given
    /// `start`.
    #[must_use]
    pub fn new(start: StartDate, end: EndDate) -> Option<Self> {
        (start.days_until(end) >= 0).then_some(Self { start, end })
    }

    /// Returns the first day of this [`Period`].
    #[must_use]
    pub fn start(&self) -> StartDate {
        self.start
    }

    /// Returns the last day of this [`Period`].
    #[must_use]
    pub fn end(&self) -> EndDate {
        self.end
    }
}

/// Version counter of an entity for optimistic concurrency.
///
/// Every conditional update checks the [`Revision`] it has read and bumps it,
/// rejecting stale writes.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Revision(i32);

impl Revision {
    /// Initial [`Revision`] of a freshly created entity.
    pub const INITIAL: Self = Self(1);

    /// Returns the next [`Revision`] after this one.
    #[must_use]
    pub fn bumped(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Free-form time note of a [`Rental`] installation.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct InstallationTime(String);

impl InstallationTime {
    /// Creates a new [`InstallationTime`] if the given `note` is valid.
    #[must_use]
    pub fn new(note: impl Into<String>) -> Option<Self> {
        let note = note.into();
        let valid =
            note.trim() == note && !note.is_empty() && note.len() <= 64;
        valid.then_some(Self(note))
    }
}

impl FromStr for InstallationTime {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `InstallationTime`")
    }
}

/// Marker type indicating the start of a [`Rental`] [`Period`].
#[derive(Clone, Copy, Debug)]
pub struct Start;

/// Marker type indicating the end of a [`Rental`] [`Period`].
#[derive(Clone, Copy, Debug)]
pub struct End;

/// Marker type indicating the actual return of rented items.
#[derive(Clone, Copy, Debug)]
pub struct Return;

/// Marker type indicating a [`Rental`] installation.
#[derive(Clone, Copy, Debug)]
pub struct Installation;

/// First day of a [`Rental`] [`Period`].
pub type StartDate = DateOf<(Rental, Start)>;

/// Last day of a [`Rental`] [`Period`].
pub type EndDate = DateOf<(Rental, End)>;

/// [`Date`] when the rented items were actually returned.
///
/// [`Date`]: common::Date
pub type ReturnDate = DateOf<(Rental, Return)>;

/// [`Date`] when the rented items are installed.
///
/// [`Date`]: common::Date
pub type InstallationDate = DateOf<(Rental, Installation)>;

/// [`DateTime`] when a [`Rental`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Rental, unit::Creation)>;
