//! [`Command`] for removing a [`LineItem`] from a [`Rental`].

use common::operations::{By, Commit, Delete, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        catalog, payment,
        rental::{self, billing, item, LineItem},
        role, Payment, Rental, Role,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`LineItem`] from a not-yet-confirmed
/// [`Rental`].
///
/// Restores the reserved stock of the removed item and requotes the
/// [`Rental`] along with its pending [`Payment`].
#[derive(Clone, Copy, Debug)]
pub struct RemoveLineItem {
    /// [`Role`] of the user editing the [`Rental`].
    pub initiator: Role,

    /// ID of the [`Rental`] to remove the [`LineItem`] from.
    pub rental_id: rental::Id,

    /// ID of the [`LineItem`] to remove.
    pub item_id: item::Id,
}

impl<Db> Command<RemoveLineItem> for Service<Db>
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
        > + Database<catalog::Restock, Err = Traced<database::Error>>
        + Database<Delete<LineItem>, Err = Traced<database::Error>>
        + Database<Update<Rental>, Ok = bool, Err = Traced<database::Error>>
        + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Rental;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: RemoveLineItem,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let RemoveLineItem {
            initiator,
            rental_id,
            item_id,
        } = cmd;

        if !initiator.permits(role::Action::EditLineItems) {
            return Err(tracerr::new!(E::Forbidden(initiator)));
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

        let items = tx
            .execute(Select(By::<Vec<LineItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let removed = items
            .iter()
            .find(|i| i.id() == item_id)
            .cloned()
            .ok_or(E::ItemNotExists(item_id))
            .map_err(tracerr::wrap!())?;
        if items.len() == 1 {
            return Err(tracerr::new!(E::LastLineItem(rental_id)));
        }

        tx.execute(Delete(removed.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(catalog::Restock {
            what: removed.catalog_ref(),
            quantity: removed.quantity().count(),
        })
        .await
        .map_err(tracerr::map_from_and_wrap!(=> E))
        .map(drop)?;

        let remaining = items
            .iter()
            .filter(|i| i.id() != item_id)
            .collect::<Vec<_>>();
        let daily_rate = item::daily_rate(remaining.into_iter())
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

        Ok(rental)
    }
}

/// Error of [`RemoveLineItem`] [`Command`] execution.
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

    /// Initiator's [`Role`] is not permitted to edit [`LineItem`]s.
    #[display("`Role::{_0}` is not permitted to edit `LineItem`s")]
    Forbidden(#[error(not(source))] Role),

    /// [`LineItem`] with the provided ID does not exist.
    #[display("`LineItem(id: {_0})` does not exist")]
    ItemNotExists(#[error(not(source))] item::Id),

    /// [`Rental`] must keep at least one [`LineItem`].
    #[display("`Rental(id: {_0})` must keep at least one `LineItem`")]
    LastLineItem(#[error(not(source))] rental::Id),

    /// [`Rental`] has advanced past the point where items may be edited.
    #[display("`Rental(id: {_0})` is no longer editable")]
    RentalNotEditable(#[error(not(source))] rental::Id),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
