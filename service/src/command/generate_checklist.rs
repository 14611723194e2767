//! [`Command`] for generating the collection checklist of a [`Rental`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        checklist, rental, role, ChecklistItem, Rental, Role,
    },
    infra::{database, Database},
    Service,
};
#[cfg(doc)]
use crate::domain::rental::LineItem;

use super::Command;

/// [`Command`] for generating [`ChecklistItem`]s out of the collectible
/// [`LineItem`]s of a [`Rental`].
///
/// Idempotent: items already present in the checklist are kept as they are,
/// so re-running it only fills the gaps.
#[derive(Clone, Copy, Debug)]
pub struct GenerateChecklist {
    /// [`Role`] of the user generating the checklist.
    pub initiator: Role,

    /// ID of the [`Rental`] to generate the checklist for.
    pub rental_id: rental::Id,
}

impl<Db> Command<GenerateChecklist> for Service<Db>
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
            Select<By<Vec<rental::LineItem>, rental::Id>>,
            Ok = Vec<rental::LineItem>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<ChecklistItem>, rental::Id>>,
            Ok = Vec<ChecklistItem>,
            Err = Traced<database::Error>,
        > + Database<Insert<ChecklistItem>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<ChecklistItem>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: GenerateChecklist,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let GenerateChecklist {
            initiator,
            rental_id,
        } = cmd;

        if !initiator.permits(role::Action::EditChecklist) {
            return Err(tracerr::new!(E::Forbidden(initiator)));
        }

        let rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;
        if !matches!(
            rental.status,
            rental::Status::Ongoing | rental::Status::Collecting,
        ) {
            return Err(tracerr::new!(E::RentalNotCollecting(rental_id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent generations for the same `Rental`.
        tx.execute(Lock(By::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut checklist = tx
            .execute(Select(By::<Vec<ChecklistItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let items = tx
            .execute(Select(By::<Vec<rental::LineItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        for item in &items {
            let rental::LineItem::Product(product) = item else {
                continue;
            };
            if checklist.iter().any(|c| c.product_id == product.product_id) {
                continue;
            }

            let new = ChecklistItem {
                id: checklist::Id::new(),
                rental_id,
                product_id: product.product_id,
                expected: product.quantity,
                collection: None,
                notes: None,
                created_at: DateTime::now().coerce(),
                revision: rental::Revision::INITIAL,
            };
            tx.execute(Insert(new.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            checklist.push(new);
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(checklist)
    }
}

/// Error of [`GenerateChecklist`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator's [`Role`] is not permitted to edit checklists.
    #[display("`Role::{_0}` is not permitted to edit checklists")]
    Forbidden(#[error(not(source))] Role),

    /// [`Rental`] is not in its collection phase.
    #[display("`Rental(id: {_0})` is not in its collection phase")]
    RentalNotCollecting(#[error(not(source))] rental::Id),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),
}
