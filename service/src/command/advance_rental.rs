//! [`Command`] for advancing a [`Rental`] along its lifecycle.

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{rental, role, Event, Payment, Rental, Role},
    infra::{database, Database},
    read::Paid,
    Service,
};

use super::Command;

/// [`Command`] for advancing a [`Rental`] one step forward along its
/// lifecycle.
///
/// Covers every forward step except the final one: a [`Rental`] only becomes
/// [`Finished`] via the [`FinalizeRental`] [`Command`].
///
/// [`Finished`]: rental::Status::Finished
/// [`FinalizeRental`]: super::FinalizeRental
#[derive(Clone, Copy, Debug)]
pub struct AdvanceRental {
    /// [`Role`] of the user advancing the [`Rental`].
    pub initiator: Role,

    /// ID of the [`Rental`] to advance.
    pub rental_id: rental::Id,
}

/// Output of an [`AdvanceRental`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Advanced [`Rental`].
    pub rental: Rental,

    /// [`Event`] describing the transition.
    pub event: Event,
}

impl<Db> Command<AdvanceRental> for Service<Db>
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
            Select<By<Option<Paid<Payment>>, rental::Id>>,
            Ok = Option<Paid<Payment>>,
            Err = Traced<database::Error>,
        > + Database<Update<Rental>, Ok = bool, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: AdvanceRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AdvanceRental {
            initiator,
            rental_id,
        } = cmd;

        if !initiator.permits(role::Action::AdvanceRental) {
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
        let to = from
            .next()
            .ok_or(E::IllegalTransition { from, to: None })
            .map_err(tracerr::wrap!())?;
        if to == rental::Status::Finished {
            return Err(tracerr::new!(E::RentalMustBeFinalized(rental_id)));
        }

        if to == rental::Status::Confirmed {
            // Confirmation is gated on a settled `Payment`.
            tx.execute(Select(By::<Option<Paid<Payment>>, _>::new(rental_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::PaymentMissing(rental_id))
                .map_err(tracerr::wrap!())
                .map(drop)?;
        }

        rental.status = to;
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

        Ok(Output {
            rental,
            event: Event::StatusChanged {
                rental_id,
                from,
                to,
            },
        })
    }
}

/// Error of [`AdvanceRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Rental`] was modified concurrently.
    #[display("`Rental(id: {_0})` was modified concurrently")]
    ConcurrentModification(#[error(not(source))] rental::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator's [`Role`] is not permitted to advance [`Rental`]s.
    #[display("`Role::{_0}` is not permitted to advance `Rental`s")]
    Forbidden(#[error(not(source))] Role),

    /// [`Rental`] cannot move out of its current [`Status`].
    ///
    /// [`Status`]: rental::Status
    #[display("illegal transition out of `Status::{from}`")]
    IllegalTransition {
        /// [`Status`] the [`Rental`] is in.
        ///
        /// [`Status`]: rental::Status
        from: rental::Status,

        /// [`Status`] the transition was aimed at, if any.
        ///
        /// [`Status`]: rental::Status
        to: Option<rental::Status>,
    },

    /// [`Rental`] has no settled [`Payment`] yet.
    #[display("`Rental(id: {_0})` has no settled `Payment`")]
    PaymentMissing(#[error(not(source))] rental::Id),

    /// [`Rental`] may only be finished via finalization.
    #[display("`Rental(id: {_0})` may only be finished via finalization")]
    RentalMustBeFinalized(#[error(not(source))] rental::Id),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
