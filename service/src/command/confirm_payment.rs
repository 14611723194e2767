//! [`Command`] for registering a [`Payment`] as settled.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{payment, rental, role, Payment, Rental, Role},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering the pending [`Payment`] of a [`Rental`] as
/// settled.
#[derive(Clone, Copy, Debug)]
pub struct ConfirmPayment {
    /// [`Role`] of the user confirming the [`Payment`].
    pub initiator: Role,

    /// ID of the [`Rental`] whose [`Payment`] is settled.
    pub rental_id: rental::Id,
}

impl<Db> Command<ConfirmPayment> for Service<Db>
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
            Select<By<Vec<Payment>, rental::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<Update<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: ConfirmPayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmPayment {
            initiator,
            rental_id,
        } = cmd;

        if !initiator.permits(role::Action::ConfirmPayment) {
            return Err(tracerr::new!(E::Forbidden(initiator)));
        }

        let rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;
        if rental.status.is_terminal() {
            return Err(tracerr::new!(E::RentalAlreadyClosed(rental_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent settlements of the same `Rental`.
        tx.execute(Lock(By::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut payment = tx
            .execute(Select(By::<Vec<Payment>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|p| p.status == payment::Status::Pending)
            .ok_or(E::NoPendingPayment(rental_id))
            .map_err(tracerr::wrap!())?;

        payment.status = payment::Status::Paid;
        payment.paid_at = Some(DateTime::now().coerce());
        tx.execute(Update(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Payment(id: {})` of `Rental(id: {rental_id})` settled: {}",
            payment.id,
            payment.amount,
        );

        Ok(payment)
    }
}

/// Error of [`ConfirmPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator's [`Role`] is not permitted to confirm [`Payment`]s.
    #[display("`Role::{_0}` is not permitted to confirm `Payment`s")]
    Forbidden(#[error(not(source))] Role),

    /// [`Rental`] has no pending [`Payment`].
    #[display("`Rental(id: {_0})` has no pending `Payment`")]
    NoPendingPayment(#[error(not(source))] rental::Id),

    /// [`Rental`] is already in a terminal [`Status`].
    ///
    /// [`Status`]: rental::Status
    #[display("`Rental(id: {_0})` is already closed")]
    RentalAlreadyClosed(#[error(not(source))] rental::Id),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
