//! [`Command`] for marking a [`ChecklistItem`] as collected.

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        checklist::{self, Collection},
        rental, role, ChecklistItem, Event, Rental, Role,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for marking a [`ChecklistItem`] as collected.
///
/// Collecting less than expected is allowed and merely flagged, collecting
/// more is rejected.
#[derive(Clone, Debug)]
pub struct MarkCollected {
    /// [`Role`] of the user collecting the item.
    pub initiator: Role,

    /// ID of the [`ChecklistItem`] to mark.
    pub item_id: checklist::Id,

    /// Name of whoever collected the item.
    pub by: checklist::CollectorName,

    /// Quantity of units actually collected.
    pub quantity: i32,

    /// Free-form notes about the collection, if any.
    pub notes: Option<checklist::Notes>,
}

/// Output of a [`MarkCollected`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Marked [`ChecklistItem`].
    pub item: ChecklistItem,

    /// [`Event`] fired once the whole checklist became complete, if it did.
    pub event: Option<Event>,
}

impl<Db> Command<MarkCollected> for Service<Db>
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
        > + Database<
            Select<By<Vec<ChecklistItem>, rental::Id>>,
            Ok = Vec<ChecklistItem>,
            Err = Traced<database::Error>,
        > + Database<Update<ChecklistItem>, Ok = bool, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: MarkCollected) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let MarkCollected {
            initiator,
            item_id,
            by,
            quantity,
            notes,
        } = cmd;

        if !initiator.permits(role::Action::EditChecklist) {
            return Err(tracerr::new!(E::Forbidden(initiator)));
        }
        if quantity < 0 {
            return Err(tracerr::new!(E::NegativeQuantity(quantity)));
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

        if quantity > item.expected.count() {
            return Err(tracerr::new!(E::OverCollected {
                expected: item.expected.count(),
                collected: quantity,
            }));
        }

        item.collection = Some(Collection {
            by,
            quantity,
            at: DateTime::now().coerce(),
        });
        if notes.is_some() {
            item.notes = notes;
        }
        let updated = tx
            .execute(Update(item.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::ConcurrentModification(item_id)));
        }
        item.revision = item.revision.bumped();

        let checklist = tx
            .execute(Select(By::<Vec<ChecklistItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let event = checklist::is_complete(
            checklist.iter().filter(|c| c.id != item_id).chain([&item]),
        )
        .then_some(Event::ChecklistCompleted { rental_id });

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output { item, event })
    }
}

/// Error of [`MarkCollected`] [`Command`] execution.
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

    /// [`ChecklistItem`] with the provided ID does not exist.
    #[display("`ChecklistItem(id: {_0})` does not exist")]
    ItemNotExists(#[error(not(source))] checklist::Id),

    /// Collected quantity cannot be negative.
    #[display("collected quantity cannot be negative: {_0}")]
    NegativeQuantity(#[error(not(source))] i32),

    /// Collected quantity exceeds the expected one.
    #[display("collected {collected} units while only {expected} expected")]
    OverCollected {
        /// Expected quantity of units.
        expected: i32,

        /// Collected quantity of units.
        collected: i32,
    },
}
