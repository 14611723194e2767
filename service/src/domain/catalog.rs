//! Rentable item catalog definitions.

use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::{rental::LineItem, Rental};

/// Catalog product available for renting.
#[derive(Clone, Debug)]
pub struct Product {
    /// ID of this [`Product`].
    pub id: product::Id,

    /// [`Name`] of this [`Product`].
    pub name: Name,

    /// Total [`Stock`] of this [`Product`] available for renting.
    pub total_stock: Stock,

    /// [`DateTime`] when this [`Product`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime<Product>,
}

/// Legacy catalog tent available for renting.
///
/// Tents are priced per day like [`Product`]s, but are not tracked by the
/// collection checklist.
#[derive(Clone, Debug)]
pub struct Tent {
    /// ID of this [`Tent`].
    pub id: tent::Id,

    /// [`Name`] of this [`Tent`].
    pub name: Name,

    /// Total [`Stock`] of this [`Tent`] available for renting.
    pub total_stock: Stock,

    /// [`DateTime`] when this [`Tent`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime<Tent>,
}

pub mod product {
    //! [`Product`]-specific definitions.

    use derive_more::{Display, From, FromStr, Into};
    #[cfg(feature = "postgres")]
    use postgres_types::{FromSql, ToSql};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[cfg(doc)]
    use super::Product;

    /// ID of a [`Product`].
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
    #[cfg_attr(
        feature = "postgres",
        derive(ToSql, FromSql),
        postgres(transparent)
    )]
    pub struct Id(Uuid);

    impl Id {
        /// Creates a new random [`Id`].
        #[must_use]
        pub fn new() -> Self {
            Self(Uuid::new_v4())
        }
    }
}

pub mod tent {
    //! [`Tent`]-specific definitions.

    use derive_more::{Display, From, FromStr, Into};
    #[cfg(feature = "postgres")]
    use postgres_types::{FromSql, ToSql};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[cfg(doc)]
    use super::Tent;

    /// ID of a [`Tent`].
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
    #[cfg_attr(
        feature = "postgres",
        derive(ToSql, FromSql),
        postgres(transparent)
    )]
    pub struct Id(Uuid);

    impl Id {
        /// Creates a new random [`Id`].
        #[must_use]
        pub fn new() -> Self {
            Self(Uuid::new_v4())
        }
    }
}

/// Name of a [`Product`] or a [`Tent`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Stock counter of a [`Product`] or a [`Tent`].
///
/// Never negative.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Stock(i32);

impl Stock {
    /// Creates a new [`Stock`] if the given `count` is not negative.
    #[must_use]
    pub fn new(count: i32) -> Option<Self> {
        (count >= 0).then_some(Self(count))
    }

    /// Returns the count of this [`Stock`].
    #[must_use]
    pub fn count(self) -> i32 {
        self.0
    }
}

/// Reference to a catalog entity.
#[derive(Clone, Copy, Debug, Eq, From, Hash, PartialEq)]
pub enum Ref {
    /// [`Product`] reference.
    Product(product::Id),

    /// [`Tent`] reference.
    Tent(tent::Id),
}

/// Reservation of catalog [`Stock`] for a [`Rental`].
///
/// Applied as an atomic conditional decrement: fails when the available
/// [`Stock`] is less than the reserved `quantity`.
#[derive(Clone, Copy, Debug)]
pub struct Reserve {
    /// Catalog entity to reserve.
    pub what: Ref,

    /// Quantity of units to reserve.
    pub quantity: i32,
}

/// Restocking of catalog [`Stock`] after a [`Rental`] close-out or
/// cancellation.
///
/// Applied as an atomic increment.
#[derive(Clone, Copy, Debug)]
pub struct Restock {
    /// Catalog entity to restock.
    pub what: Ref,

    /// Quantity of units returning to the [`Stock`].
    pub quantity: i32,
}

/// [`DateTime`] when a catalog entity was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime<E> = DateTimeOf<(E, unit::Creation)>;
