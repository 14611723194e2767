//! [`ChecklistItem`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        checklist::{self, Collection},
        rental, ChecklistItem,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

fn checklist_item(row: &Row) -> ChecklistItem {
    let collection = row
        .get::<_, Option<checklist::CollectorName>>("collected_by")
        .map(|by| Collection {
            by,
            quantity: row.get("collected_quantity"),
            at: row.get("collected_at"),
        });
    ChecklistItem {
        id: row.get("id"),
        rental_id: row.get("rental_id"),
        product_id: row.get("product_id"),
        expected: row.get("expected"),
        collection,
        notes: row.get("notes"),
        created_at: row.get("created_at"),
        revision: row.get("revision"),
    }
}

impl<C> Database<Select<By<Vec<ChecklistItem>, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<ChecklistItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<ChecklistItem>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let rental_id: rental::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, rental_id, product_id, expected, \
                   collected_by, collected_quantity, collected_at, \
                   notes, created_at, revision \
            FROM checklist_items \
            WHERE rental_id = $1::UUID \
            ORDER BY created_at ASC, id ASC";
        Ok(self
            .query(SQL, &[&rental_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(checklist_item)
            .collect())
    }
}

impl<C> Database<Select<By<Option<ChecklistItem>, checklist::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<ChecklistItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ChecklistItem>, checklist::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: checklist::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, rental_id, product_id, expected, \
                   collected_by, collected_quantity, collected_at, \
                   notes, created_at, revision \
            FROM checklist_items \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(checklist_item))
    }
}

impl<C> Database<Insert<ChecklistItem>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(item): Insert<ChecklistItem>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO checklist_items (\
                id, rental_id, product_id, expected, \
                collected_by, collected_quantity, collected_at, \
                notes, created_at, revision\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::INT4, \
                $5::VARCHAR, $6::INT4, $7::TIMESTAMPTZ, \
                $8::VARCHAR, $9::TIMESTAMPTZ, $10::INT4\
            )";
        self.exec(
            SQL,
            &[
                &item.id,
                &item.rental_id,
                &item.product_id,
                &item.expected,
                &item.collection.as_ref().map(|c| &c.by),
                &item.collection.as_ref().map(|c| c.quantity),
                &item.collection.as_ref().map(|c| c.at),
                &item.notes,
                &item.created_at,
                &item.revision,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<ChecklistItem>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(item): Update<ChecklistItem>,
    ) -> Result<Self::Ok, Self::Err> {
        // Conditional on the read revision, so stale writers lose.
        const SQL: &str = "\
            UPDATE checklist_items \
            SET expected = $2::INT4, \
                collected_by = $3::VARCHAR, \
                collected_quantity = $4::INT4, \
                collected_at = $5::TIMESTAMPTZ, \
                notes = $6::VARCHAR, \
                revision = revision + 1 \
            WHERE id = $1::UUID \
              AND revision = $7::INT4";
        self.exec(
            SQL,
            &[
                &item.id,
                &item.expected,
                &item.collection.as_ref().map(|c| &c.by),
                &item.collection.as_ref().map(|c| c.quantity),
                &item.collection.as_ref().map(|c| c.at),
                &item.notes,
                &item.revision,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|affected| affected == 1)
    }
}
