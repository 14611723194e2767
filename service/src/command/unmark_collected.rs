//! [`Command`] for reverting the collection of a [`ChecklistItem`].

use common::operations::{By, Commit, Lock, Select, Transact, Transacted, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{checklist, rental, role, ChecklistItem, Rental, Role},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for reverting a previously marked [`ChecklistItem`] back to
/// its not-collected state.
#[derive(Clone, Copy, Debug)]
pub struct UnmarkCollected {
    /// [`Role`] of the user reverting the collection.
    pub initiator: Role,

    /// ID of the [`ChecklistItem`] to revert.
    pub item_id: checklist::Id,
}

impl<Db> Command<UnmarkCollected> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<ChecklistItem>, checklist::Id>>,
            Ok = Option<ChecklistItem>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Rental, rental::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<ChecklistItem>, checklist::Id>>,
            Ok = Option<ChecklistItem>,
            Err = Traced<database::Error>,
        > + Database<Update<ChecklistItem>, Ok = bool, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = ChecklistItem;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UnmarkCollected,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UnmarkCollected { initiator, item_id } = cmd;

        if !initiator.permits(role::Action::EditChecklist) {
            return Err(tracerr::new!(E::Forbidden(initiator)));
        }

        let rental_id = self
            .database()
            .execute(Select(By::<Option<ChecklistItem>, _>::new(item_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ItemNotExists(item_id))
            .map_err(tracerr::wrap!())?
            .rental_id;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reconciliations of the same `Rental`.
        tx.execute(Lock(By::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut item = tx
            .execute(Select(By::<Option<ChecklistItem>, _>::new(item_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ItemNotExists(item_id))
            .map_err(tracerr::wrap!())?;

        if item.collection.is_none() {
            return Err(tracerr::new!(E::ItemNotCollected(item_id)));
        }

        item.collection = None;
        let updated = tx
            .execute(Update(item.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::ConcurrentModification(item_id)));
        }
        item.revision = item.revision.bumped();

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(item)
    }
}

/// Error of [`UnmarkCollected`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`ChecklistItem`] was modified concurrently.
    #[display("`ChecklistItem(id: {_0})` was modified concurrently")]
    ConcurrentModification(#[error(not(source))] checklist::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator's [`Role`] is not permitted to edit checklists.
    #[display("`Role::{_0}` is not permitted to edit checklists")]
    Forbidden(#[error(not(source))] Role),

    /// [`ChecklistItem`] has not been collected yet.
    #[display("`ChecklistItem(id: {_0})` has not been collected yet")]
    ItemNotCollected(#[error(not(source))] checklist::Id),

    /// [`ChecklistItem`] with the provided ID does not exist.
    #[display("`ChecklistItem(id: {_0})` does not exist")]
    ItemNotExists(#[error(not(source))] checklist::Id),
}
