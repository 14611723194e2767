//! [`LineItem`] definitions.

use common::{define_kind, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    catalog::{self, product, tent},
    rental,
};
#[cfg(doc)]
use crate::domain::{ChecklistItem, Product, Rental, Tent};

/// One catalog entry within a [`Rental`], with quantity and per-day price.
#[derive(Clone, Debug, From)]
pub enum LineItem {
    #[doc(hidden)]
    Tent(TentItem),
    #[doc(hidden)]
    Product(ProductItem),
}

impl LineItem {
    /// Returns ID of this [`LineItem`].
    #[must_use]
    pub fn id(&self) -> Id {
        match self {
            Self::Tent(i) => i.id,
            Self::Product(i) => i.id,
        }
    }

    /// Returns [`Kind`] of this [`LineItem`].
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Tent(_) => Kind::Tent,
            Self::Product(_) => Kind::Product,
        }
    }

    /// Returns ID of the [`Rental`] this [`LineItem`] belongs to.
    #[must_use]
    pub fn rental_id(&self) -> rental::Id {
        match self {
            Self::Tent(i) => i.rental_id,
            Self::Product(i) => i.rental_id,
        }
    }

    /// Returns the catalog entity this [`LineItem`] references.
    #[must_use]
    pub fn catalog_ref(&self) -> catalog::Ref {
        match self {
            Self::Tent(i) => i.tent_id.into(),
            Self::Product(i) => i.product_id.into(),
        }
    }

    /// Returns [`Quantity`] of this [`LineItem`].
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        match self {
            Self::Tent(i) => i.quantity,
            Self::Product(i) => i.quantity,
        }
    }

    /// Returns the per-day price of a single unit of this [`LineItem`].
    #[must_use]
    pub fn unit_price(&self) -> Money {
        match self {
            Self::Tent(i) => i.unit_price,
            Self::Product(i) => i.unit_price,
        }
    }

    /// Returns the per-day charge of this [`LineItem`]
    /// (unit price times quantity).
    #[must_use]
    pub fn daily_charge(&self) -> Money {
        self.unit_price().scaled(i64::from(self.quantity().count()))
    }

    /// Indicates whether this [`LineItem`] is tracked by the collection
    /// checklist.
    ///
    /// Only [`Product`] items are collectible; [`Tent`] items return outside
    /// the checklist flow.
    #[must_use]
    pub fn is_collectible(&self) -> bool {
        matches!(self, Self::Product(_))
    }
}

/// [`Tent`] entry within a [`Rental`].
#[derive(Clone, Debug)]
pub struct TentItem {
    /// ID of this [`LineItem`].
    pub id: Id,

    /// ID of the [`Rental`] this [`LineItem`] belongs to.
    pub rental_id: rental::Id,

    /// ID of the rented [`Tent`].
    pub tent_id: tent::Id,

    /// Quantity of rented units.
    pub quantity: Quantity,

    /// Per-day price of a single unit.
    pub unit_price: Money,
}

/// [`Product`] entry within a [`Rental`].
///
/// Tracked by a [`ChecklistItem`] at collection time.
#[derive(Clone, Debug)]
pub struct ProductItem {
    /// ID of this [`LineItem`].
    pub id: Id,

    /// ID of the [`Rental`] this [`LineItem`] belongs to.
    pub rental_id: rental::Id,

    /// ID of the rented [`Product`].
    pub product_id: product::Id,

    /// Quantity of rented units.
    pub quantity: Quantity,

    /// Per-day price of a single unit.
    pub unit_price: Money,
}

/// ID of a [`LineItem`].
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

/// Quantity of units in a [`LineItem`].
///
/// Always positive.
#[derive(
    Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Quantity(i32);

impl Quantity {
    /// Creates a new [`Quantity`] if the given `count` is positive.
    #[must_use]
    pub fn new(count: i32) -> Option<Self> {
        (count > 0).then_some(Self(count))
    }

    /// Returns the count of this [`Quantity`].
    #[must_use]
    pub fn count(self) -> i32 {
        self.0
    }
}

define_kind! {
    #[doc = "Kind of a [`LineItem`]."]
    enum Kind {
        #[doc = "[`TentItem`] [`LineItem`]."]
        Tent = 1,

        #[doc = "[`ProductItem`] [`LineItem`]."]
        Product = 2,
    }
}

/// Sums the per-day charges of the given [`LineItem`]s.
///
/// [`None`] is returned for an empty set or when the items are priced in
/// differing currencies.
#[must_use]
pub fn daily_rate<'i>(
    items: impl IntoIterator<Item = &'i LineItem>,
) -> Option<Money> {
    items
        .into_iter()
        .map(LineItem::daily_charge)
        .try_fold(None, |acc: Option<Money>, charge| match acc {
            None => Some(Some(charge)),
            Some(sum) => sum.checked_add(charge).map(Some),
        })?
}
