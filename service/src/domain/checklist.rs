//! [`ChecklistItem`] definitions.

use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{catalog::product, rental};
#[cfg(doc)]
use crate::domain::{Product, Rental};

/// Tracks the physical return of one [`Product`] line item of a [`Rental`].
///
/// Generated lazily from the [`Rental`]'s product line items, one per
/// distinct item. Never deleted on its own, only via the [`Rental`] cascade.
#[derive(Clone, Debug)]
pub struct ChecklistItem {
    /// ID of this [`ChecklistItem`].
    pub id: Id,

    /// ID of the [`Rental`] this [`ChecklistItem`] belongs to.
    pub rental_id: rental::Id,

    /// ID of the [`Product`] to collect back.
    pub product_id: product::Id,

    /// Quantity of units expected back.
    pub expected: rental::item::Quantity,

    /// [`Collection`] of this [`ChecklistItem`], once it happened.
    pub collection: Option<Collection>,

    /// Free-form notes about the collection.
    pub notes: Option<Notes>,

    /// [`DateTime`] when this [`ChecklistItem`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: CreationDateTime,

    /// [`Revision`] of this [`ChecklistItem`] for optimistic concurrency.
    ///
    /// [`Revision`]: rental::Revision
    pub revision: rental::Revision,
}

impl ChecklistItem {
    /// Indicates whether this [`ChecklistItem`] has been collected.
    #[must_use]
    pub fn is_collected(&self) -> bool {
        self.collection.is_some()
    }

    /// Returns the quantity of units actually collected back.
    ///
    /// Zero until the collection happens.
    #[must_use]
    pub fn collected_quantity(&self) -> i32 {
        self.collection.as_ref().map_or(0, |c| c.quantity)
    }

    /// Indicates whether fewer units came back than expected.
    ///
    /// Under-collection is allowed and surfaced as a warning, not an error.
    #[must_use]
    pub fn is_under_collected(&self) -> bool {
        self.collection
            .as_ref()
            .is_some_and(|c| c.quantity < self.expected.count())
    }
}

/// Recorded physical collection of a [`ChecklistItem`].
#[derive(Clone, Debug)]
pub struct Collection {
    /// Name of the person who collected the items.
    pub by: CollectorName,

    /// Quantity of units actually collected.
    ///
    /// May be less than expected (partial return), never more.
    pub quantity: i32,

    /// [`DateTime`] when the collection happened.
    ///
    /// [`DateTime`]: common::DateTime
    pub at: CollectionDateTime,
}

/// Indicates whether the given checklist reports complete collection.
///
/// Complete means non-empty with every [`ChecklistItem`] collected. An empty
/// checklist is not complete in the per-item sense: the degenerate
/// "no products to collect" case is resolved by the finalization flow, not
/// here.
#[must_use]
pub fn is_complete<'i>(
    items: impl IntoIterator<Item = &'i ChecklistItem>,
) -> bool {
    let mut items = items.into_iter().peekable();
    items.peek().is_some() && items.all(ChecklistItem::is_collected)
}

/// ID of a [`ChecklistItem`].
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

/// Name of the person collecting a [`ChecklistItem`].
///
/// Never empty: a collection without a collector is invalid.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct CollectorName(String);

impl CollectorName {
    /// Creates a new [`CollectorName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`CollectorName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for CollectorName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `CollectorName`")
    }
}

/// Free-form notes of a [`ChecklistItem`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Creates a new [`Notes`] if the given `notes` are valid.
    #[must_use]
    pub fn new(notes: impl Into<String>) -> Option<Self> {
        let notes = notes.into();
        let valid = !notes.is_empty() && notes.len() <= 2048;
        valid.then_some(Self(notes))
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Notes`")
    }
}

/// [`DateTime`] when a [`ChecklistItem`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(ChecklistItem, unit::Creation)>;

/// [`DateTime`] when a [`ChecklistItem`] was collected.
///
/// [`DateTime`]: common::DateTime
pub type CollectionDateTime = DateTimeOf<(ChecklistItem, unit::Collection)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{
        catalog::product,
        rental::{self, item::Quantity},
    };

    use super::{
        is_complete, ChecklistItem, Collection, CollectorName, Id,
    };

    fn item(collected: Option<i32>) -> ChecklistItem {
        ChecklistItem {
            id: Id::new(),
            rental_id: rental::Id::new(),
            product_id: product::Id::new(),
            expected: Quantity::new(5).unwrap(),
            collection: collected.map(|quantity| Collection {
                by: CollectorName::new("Ana").unwrap(),
                quantity,
                at: DateTime::now().coerce(),
            }),
            notes: None,
            created_at: DateTime::now().coerce(),
            revision: rental::Revision::INITIAL,
        }
    }

    #[test]
    fn complete_means_non_empty_and_fully_collected() {
        let empty: [ChecklistItem; 0] = [];
        assert!(!is_complete(&empty));
        assert!(!is_complete(&[item(None)]));
        assert!(!is_complete(&[item(Some(5)), item(None)]));
        assert!(is_complete(&[item(Some(5)), item(Some(3))]));
    }

    #[test]
    fn under_collection_is_flagged_but_still_counts_as_collected() {
        let short = item(Some(3));
        assert!(short.is_collected());
        assert!(short.is_under_collected());
        assert_eq!(short.collected_quantity(), 3);

        let full = item(Some(5));
        assert!(!full.is_under_collected());

        let missing = item(None);
        assert!(!missing.is_under_collected());
        assert_eq!(missing.collected_quantity(), 0);
    }
}
