//! [`Query`] collection related to a single [`Rental`].

use common::{
    operations::{By, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        rental::{
            self,
            billing::{FinalValues, RunningMetrics},
            LineItem,
        },
        ChecklistItem, Rental,
    },
    infra::{database, Database},
    read,
    Query, Service,
};

use super::DatabaseQuery;

/// Queries a [`Rental`] by its [`rental::Id`].
pub type ById = DatabaseQuery<By<Option<Rental>, rental::Id>>;

/// Queries all [`LineItem`]s of a [`Rental`].
pub type Items = DatabaseQuery<By<Vec<LineItem>, rental::Id>>;

/// [`Query`] of the [`RunningMetrics`] of a [`Rental`] as of today.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Metrics {
    /// ID of the [`Rental`] to compute [`RunningMetrics`] for.
    pub rental_id: rental::Id,
}

impl<Db> Query<Metrics> for Service<Db>
where
    Db: Database<
        Select<By<Option<Rental>, rental::Id>>,
        Ok = Option<Rental>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = RunningMetrics;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Metrics) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Metrics { rental_id } = query;

        let rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        Ok(RunningMetrics::compute(&rental, Date::today()))
    }
}

/// [`Query`] of the full [`Settlement`] of a finalized [`Rental`].
///
/// [`Settlement`]: read::Settlement
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Settlement {
    /// ID of the [`Rental`] to resolve the [`Settlement`] of.
    ///
    /// [`Settlement`]: read::Settlement
    pub rental_id: rental::Id,
}

impl<Db> Query<Settlement> for Service<Db>
where
    Db: Database<
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
        >,
{
    type Ok = read::Settlement;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Settlement) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Settlement { rental_id } = query;

        let rental = self
            .database()
            .execute(Select(By::<Option<Rental>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RentalNotExists(rental_id))
            .map_err(tracerr::wrap!())?;

        let returned_on = rental
            .returned_on
            .filter(|_| rental.status == rental::Status::Finished)
            .ok_or(E::RentalNotFinalized(rental_id))
            .map_err(tracerr::wrap!())?;

        let items = self
            .database()
            .execute(Select(By::<Vec<LineItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let checklist = self
            .database()
            .execute(Select(By::<Vec<ChecklistItem>, _>::new(rental_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let values = FinalValues::compute(&rental, returned_on);

        Ok(read::Settlement {
            rental,
            items,
            checklist,
            values,
        })
    }
}

/// Error of [`Metrics`] or [`Settlement`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Rental`] with the provided ID does not exist.
    #[display("`Rental(id: {_0})` does not exist")]
    RentalNotExists(#[error(not(source))] rental::Id),

    /// [`Rental`] has not been finalized yet.
    #[display("`Rental(id: {_0})` is not finalized")]
    RentalNotFinalized(#[error(not(source))] rental::Id),
}
