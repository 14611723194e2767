//! [`Command`] for cancelling a [`Rental`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        catalog, rental, role, Event, Rental, Role,
    },
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::rental::LineItem;

use super::Command;

/// [`Command`] for cancelling a [`Rental`].
///
/// Legal from any non-terminal [`Status`]. Restores the full reserved stock
/// of every [`LineItem`].
///
/// [`Status`]: rental::Status
#[derive(Clone, Copy, Debug)]
pub struct CancelRental {
    /// [`Role`] of the user cancelling the [`Rental`].
    pub initiator: Role,

    /// ID of the [`Rental`] to cancel.
    pub rental_id: rental::Id,
}

/// Output of a [`CancelRental`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Cancelled [`Rental`].
    pub rental: Rental,

    /// [`Event`] describing the transition.
    pub event: Event,
}

impl<Db> Command<CancelRental> for Service<Db>
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
            Select<By<Vec<rental::LineItem>, rental::Id>>,
            Ok = Vec<rental::LineItem>,
            Err = Traced<database::Error>,
        > + Database<catalog::Restock, Err = Traced<database::Error>>
        + Database<Update<Rental>, Ok = bool, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CancelRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelRental {
            initiator,
            rental_id,
        } = cmd;

        if !initiator.permits(role::Action::CancelRental) {
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

        // Avoid concurrent transitions of the same `Rental`.
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
        if !from.allows(rental::Status::Cancelled) {
            return Err(tracerr::new!(E::RentalAlreadyClosed(rental_id)));
        }

        let items = tx
            .execute(Select(By::<Vec<rental::LineItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for i in &items {
            tx.execute(catalog::Restock {
                what: i.catalog_ref(),
                quantity: i.quantity().count(),
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        }

        rental.status = rental::Status::Cancelled;
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

        log::info!("`Rental(id: {rental_id})` cancelled out of `{from}`");

        Ok(Output {
            rental,
            event: Event::StatusChanged {
                rental_id,
                from,
                to: rental::Status::Cancelled,
            },
        })
    }
}

/// Error of [`CancelRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Rental`] was modified concurrently.
    #[display("`Rental(id: {_0})` was modified concurrently")]
    ConcurrentModification(#[error(not(source))] rental::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator's [`Role`] is not permitted to cancel [`Rental`]s.
    #[display("`Role::{_0}` is not permitted to cancel `Rental`s")]
    Forbidden(#[error(not(source))] Role),

    /// [`Rental`] is already in a terminal [`Status`].
    ///
    /// [`Status`]: rental::Status
    #[display("`Rental(id: {_0})` is already closed")]
    RentalAlreadyClosed(#[error(not(source))] rental::Id),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
