//! [`Command`] for adding a [`LineItem`] to a [`Rental`].

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        catalog, payment,
        rental::{
            self, billing,
            item::{self, ProductItem, TentItem},
            LineItem,
        },
        role, Payment, Rental, Role,
    },
    infra::{database, Database},
    Service,
};

use super::{create_rental::NewItem, Command};

/// [`Command`] for adding a [`LineItem`] to a not-yet-confirmed [`Rental`].
///
/// Reserves catalog stock for the added item and requotes the [`Rental`]
/// along with its pending [`Payment`].
#[derive(Clone, Copy, Debug)]
pub struct AddLineItem {
    /// [`Role`] of the user editing the [`Rental`].
    pub initiator: Role,

    /// ID of the [`Rental`] to add the [`LineItem`] to.
    pub rental_id: rental::Id,

    /// Item to be added.
    pub item: NewItem,
}

/// Output of an [`AddLineItem`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Requoted [`Rental`].
    pub rental: Rental,

    /// Added [`LineItem`].
    pub item: LineItem,
}

impl<Db> Command<AddLineItem> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Rental, rental::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Rental>, rental::Id>>,
            Ok = Option<Rental>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<LineItem>, rental::Id>>,
            Ok = Vec<LineItem>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, rental::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<catalog::Reserve, Ok = bool, Err = Traced<database::Error>>
        + Database<Insert<LineItem>, Err = Traced<database::Error>>
        + Database<Update<Rental>, Ok = bool, Err = Traced<database::Error>>
        + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AddLineItem) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddLineItem {
            initiator,
            rental_id,
            item: new,
        } = cmd;

        if !initiator.permits(role::Action::EditLineItems) {
            return Err(tracerr::new!(E::Forbidden(initiator)));
        }
        if new.unit_price.is_negative() {
            return Err(tracerr::new!(E::NegativeAmount));
        }

        self.database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent edits of the same `Rental`.
        tx.execute(Lock(By::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut rental = tx
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;
        if !matches!(
            rental.status,
            rental::Status::Pending | rental::Status::AwaitingPayment,
        ) {
            return Err(tracerr::new!(E::RentalNotEditable(rental_id)));
        }

        let mut items = tx
            .execute(Select(By::<Vec<LineItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        // Checklists are keyed per catalog entity, so the same one cannot
        // appear in two `LineItem`s.
        if items.iter().any(|i| i.catalog_ref() == new.what) {
            return Err(tracerr::new!(E::DuplicateLineItem(new.what)));
        }

        let reserved = tx
            .execute(catalog::Reserve {
                what: new.what,
                quantity: new.quantity.count(),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !reserved {
            return Err(tracerr::new!(E::InsufficientStock(new.what)));
        }

        let added = match new.what {
            catalog::Ref::Tent(tent_id) => LineItem::Tent(TentItem {
                id: item::Id::new(),
                rental_id,
                tent_id,
                quantity: new.quantity,
                unit_price: new.unit_price,
            }),
            catalog::Ref::Product(product_id) => {
                LineItem::Product(ProductItem {
                    id: item::Id::new(),
                    rental_id,
                    product_id,
                    quantity: new.quantity,
                    unit_price: new.unit_price,
                })
            }
        };
        tx.execute(Insert(added.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        items.push(added.clone());
        let daily_rate = item::daily_rate(items.iter())
            .ok_or(E::CurrencyMismatch)
            .map_err(tracerr::wrap!())?;

        let days = if self.config().pricing.charge_business_days_only {
            billing::business_days(rental.period.start(), rental.period.end())
        } else {
            billing::calendar_days(rental.period.start(), rental.period.end())
        };
        rental.daily_rate = daily_rate;
        rental.total_value = daily_rate
            .scaled(days)
            .checked_sub(rental.discount)
            .and_then(|v| v.checked_add(rental.delivery_fee))
            .ok_or(E::CurrencyMismatch)
            .map_err(tracerr::wrap!())?
            .clamped();

        let updated = tx
            .execute(Update(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::ConcurrentModification(rental_id)));
        }
        rental.revision = rental.revision.bumped();

        let pending = tx
            .execute(Select(By::<Vec<Payment>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|p| p.status == payment::Status::Pending);
        if let Some(mut p) = pending {
            p.amount = rental.total_value;
            tx.execute(Update(p))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output {
            rental,
            item: added,
        })
    }
}

/// Error of [`AddLineItem`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Rental`] was modified concurrently.
    #[display("`Rental(id: {_0})` was modified concurrently")]
    ConcurrentModification(#[error(not(source))] rental::Id),

    /// [`LineItem`]s don't share a single currency.
    #[display("`LineItem`s don't share a single currency")]
    CurrencyMismatch,

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Same catalog entity appears in two [`LineItem`]s.
    #[display("`{_0:?}` appears in two `LineItem`s")]
    DuplicateLineItem(#[error(not(source))] catalog::Ref),

    /// Initiator's [`Role`] is not permitted to edit [`LineItem`]s.
    #[display("`Role::{_0}` is not permitted to edit `LineItem`s")]
    Forbidden(#[error(not(source))] Role),

    /// Catalog entity doesn't have enough stock available.
    #[display("not enough stock available for `{_0:?}`")]
    InsufficientStock(#[error(not(source))] catalog::Ref),

    /// Monetary input is negative.
    #[display("monetary inputs cannot be negative")]
    NegativeAmount,

    /// [`Rental`] has advanced past the point where items may be edited.
    #[display("`Rental(id: {_0})` is no longer editable")]
    RentalNotEditable(#[error(not(source))] rental::Id),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
