//! [`Command`] for finalizing a [`Rental`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        catalog, checklist,
        rental::{self, billing::FinalValues, LineItem},
        role, ChecklistItem, Event, Rental, Role,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for finalizing a [`Rental`] with its definitive billing.
///
/// Resolves the final values off the actual return date, restores catalog
/// stock by the collected quantities, and moves the [`Rental`] into
/// [`Finished`].
///
/// [`Finished`]: rental::Status::Finished
#[derive(Clone, Copy, Debug)]
pub struct FinalizeRental {
    /// [`Role`] of the user finalizing the [`Rental`].
    pub initiator: Role,

    /// ID of the [`Rental`] to finalize.
    pub rental_id: rental::Id,

    /// [`Date`] the rented items were actually returned.
    ///
    /// [`Date`]: common::Date
    pub returned_on: rental::ReturnDate,
}

/// Output of a [`FinalizeRental`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Finalized [`Rental`].
    pub rental: Rental,

    /// Definitive billing values of the [`Rental`].
    pub values: FinalValues,

    /// [`Event`]s describing the finalization.
    pub events: Vec<Event>,
}

impl<Db> Command<FinalizeRental> for Service<Db>
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
            Select<By<Vec<ChecklistItem>, rental::Id>>,
            Ok = Vec<ChecklistItem>,
            Err = Traced<database::Error>,
        > + Database<catalog::Restock, Err = Traced<database::Error>>
        + Database<Update<Rental>, Ok = bool, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: FinalizeRental,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let FinalizeRental {
            initiator,
            rental_id,
            returned_on,
        } = cmd;

        if !initiator.permits(role::Action::FinalizeRental) {
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

        // Avoid concurrent finalizations of the same `Rental`.
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

        let from = rental.status;
        if from != rental::Status::Collecting {
            return Err(tracerr::new!(E::RentalNotCollecting(rental_id)));
        }
        if rental.period.start().days_until(returned_on) < 0 {
            return Err(tracerr::new!(E::ReturnPrecedesStart(rental_id)));
        }

        let items = tx
            .execute(Select(By::<Vec<LineItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let checklist = tx
            .execute(Select(By::<Vec<ChecklistItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Tents are not checklist-tracked, so rentals without collectible
        // items pass straight through.
        let has_collectibles = items.iter().any(LineItem::is_collectible);
        if has_collectibles && !checklist::is_complete(checklist.iter()) {
            return Err(tracerr::new!(E::ChecklistIncomplete(rental_id)));
        }

        for item in &items {
            let quantity = match item {
                LineItem::Tent(_) => item.quantity().count(),
                LineItem::Product(p) => checklist
                    .iter()
                    .find(|c| c.product_id == p.product_id)
                    .map_or(p.quantity.count(), ChecklistItem::collected_quantity),
            };
            if quantity == 0 {
                continue;
            }
            tx.execute(catalog::Restock {
                what: item.catalog_ref(),
                quantity,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        let quoted = rental.total_value;
        let values = FinalValues::compute(&rental, returned_on);
        rental.status = rental::Status::Finished;
        rental.returned_on = Some(returned_on);
        rental.total_value = values.total_value;

        let updated = tx
            .execute(Update(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::ConcurrentModification(rental_id)));
        }
        rental.revision = rental.revision.bumped();

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Rental(id: {rental_id})` finalized: {}",
            values.total_value,
        );
        if values.varies_from(quoted) {
            log::warn!(
                "`Rental(id: {rental_id})` settled off-quote: \
                 {quoted} quoted, {} final",
                values.total_value,
            );
        }

        let events = vec![
            Event::StatusChanged {
                rental_id,
                from,
                to: rental::Status::Finished,
            },
            Event::Finalized {
                rental_id,
                total_value: values.total_value,
            },
        ];

        Ok(Output {
            rental,
            values,
            events,
        })
    }
}

/// Error of [`FinalizeRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Checklist of the [`Rental`] is not complete yet.
    #[display("checklist of `Rental(id: {_0})` is not complete yet")]
    ChecklistIncomplete(#[error(not(source))] rental::Id),

    /// [`Rental`] was modified concurrently.
    #[display("`Rental(id: {_0})` was modified concurrently")]
    ConcurrentModification(#[error(not(source))] rental::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator's [`Role`] is not permitted to finalize [`Rental`]s.
    #[display("`Role::{_0}` is not permitted to finalize `Rental`s")]
    Forbidden(#[error(not(source))] Role),

    /// [`Rental`] is not in its collection phase.
    #[display("`Rental(id: {_0})` is not in its collection phase")]
    RentalNotCollecting(#[error(not(source))] rental::Id),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),

    /// Return date precedes the start of the [`Rental`] period.
    #[display("return date of `Rental(id: {_0})` precedes its period start")]
    ReturnPrecedesStart(#[error(not(source))] rental::Id),
}
