//! [`Payment`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{payment, rental, Payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read::Paid,
};

fn payment(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        rental_id: row.get("rental_id"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("currency"),
        },
        status: row.get("status"),
        due_on: row.get("due_on"),
        created_at: row.get("created_at"),
        paid_at: row.get("paid_at"),
    }
}

impl<C> Database<Select<By<Vec<Payment>, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let rental_id: rental::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, rental_id, amount, currency, status, \
                   due_on, created_at, paid_at \
            FROM payments \
            WHERE rental_id = $1::UUID \
            ORDER BY created_at ASC, id ASC";
        Ok(self
            .query(SQL, &[&rental_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment)
            .collect())
    }
}

impl<C> Database<Select<By<Option<Paid<Payment>>, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Paid<Payment>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Paid<Payment>>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let rental_id: rental::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, rental_id, amount, currency, status, \
                   due_on, created_at, paid_at \
            FROM payments \
            WHERE rental_id = $1::UUID \
              AND status = $2::INT2 \
            ORDER BY paid_at ASC \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&rental_id, &payment::Status::Paid])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(payment)
            .map(Paid))
    }
}

impl<C> Database<Select<By<Vec<Payment>, payment::DueDate>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, payment::DueDate>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let today: payment::DueDate = by.into_inner();

        const SQL: &str = "\
            SELECT id, rental_id, amount, currency, status, \
                   due_on, created_at, paid_at \
            FROM payments \
            WHERE status = $1::INT2 \
              AND due_on < $2::DATE \
            ORDER BY due_on ASC, id ASC";
        Ok(self
            .query(SQL, &[&payment::Status::Pending, &today])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment)
            .collect())
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO payments (\
                id, rental_id, amount, currency, status, \
                due_on, created_at, paid_at\
            ) VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, $4::INT2, $5::INT2, \
                $6::DATE, $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &payment.id,
                &payment.rental_id,
                &payment.amount.amount,
                &payment.amount.currency,
                &payment.status,
                &payment.due_on,
                &payment.created_at,
                &payment.paid_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            UPDATE payments \
            SET amount = $2::NUMERIC, \
                currency = $3::INT2, \
                status = $4::INT2, \
                due_on = $5::DATE, \
                paid_at = $6::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &payment.id,
                &payment.amount.amount,
                &payment.amount.currency,
                &payment.status,
                &payment.due_on,
                &payment.paid_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
