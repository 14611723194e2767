//! [`Rental`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tracerr::Traced;

use crate::{
    domain::{
        rental::{self, Period},
        Rental,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

impl<C> Database<Select<By<Option<Rental>, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rental::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, customer_id, \
                   start_on, end_on, \
                   installation_on, installation_time, \
                   status, returned_on, \
                   daily_rate, discount, delivery_fee, total_value, currency, \
                   created_at, revision \
            FROM rentals \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| {
                let currency = row.get("currency");
                let money = |column: &str| common::Money {
                    amount: row.get(column),
                    currency,
                };
                Rental {
                    id: row.get("id"),
                    customer_id: row.get("customer_id"),
                    period: Period::new(
                        row.get("start_on"),
                        row.get("end_on"),
                    )
                    .expect("validated on write"),
                    installation_on: row.get("installation_on"),
                    installation_time: row.get("installation_time"),
                    status: row.get("status"),
                    returned_on: row.get("returned_on"),
                    daily_rate: money("daily_rate"),
                    discount: money("discount"),
                    delivery_fee: money("delivery_fee"),
                    total_value: money("total_value"),
                    created_at: row.get("created_at"),
                    revision: row.get("revision"),
                }
            }))
    }
}

impl<C> Database<Insert<Rental>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            INSERT INTO rentals (\
                id, customer_id, \
                start_on, end_on, \
                installation_on, installation_time, \
                status, returned_on, \
                daily_rate, discount, delivery_fee, total_value, currency, \
                created_at, revision\
            ) VALUES (\
                $1::UUID, $2::UUID, \
                $3::DATE, $4::DATE, \
                $5::DATE, $6::VARCHAR, \
                $7::INT2, $8::DATE, \
                $9::NUMERIC, $10::NUMERIC, $11::NUMERIC, $12::NUMERIC, \
                $13::INT2, \
                $14::TIMESTAMPTZ, $15::INT4\
            )";
        self.exec(
            SQL,
            &[
                &rental.id,
                &rental.customer_id,
                &rental.period.start(),
                &rental.period.end(),
                &rental.installation_on,
                &rental.installation_time,
                &rental.status,
                &rental.returned_on,
                &rental.daily_rate.amount,
                &rental.discount.amount,
                &rental.delivery_fee.amount,
                &rental.total_value.amount,
                &rental.daily_rate.currency,
                &rental.created_at,
                &rental.revision,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Rental>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        // Conditional on the read revision, so stale writers lose.
        const SQL: &str = "\
            UPDATE rentals \
            SET customer_id = $2::UUID, \
                start_on = $3::DATE, \
                end_on = $4::DATE, \
                installation_on = $5::DATE, \
                installation_time = $6::VARCHAR, \
                status = $7::INT2, \
                returned_on = $8::DATE, \
                daily_rate = $9::NUMERIC, \
                discount = $10::NUMERIC, \
                delivery_fee = $11::NUMERIC, \
                total_value = $12::NUMERIC, \
                currency = $13::INT2, \
                revision = revision + 1 \
            WHERE id = $1::UUID \
              AND revision = $14::INT4";
        self.exec(
            SQL,
            &[
                &rental.id,
                &rental.customer_id,
                &rental.period.start(),
                &rental.period.end(),
                &rental.installation_on,
                &rental.installation_time,
                &rental.status,
                &rental.returned_on,
                &rental.daily_rate.amount,
                &rental.discount.amount,
                &rental.delivery_fee.amount,
                &rental.total_value.amount,
                &rental.daily_rate.currency,
                &rental.revision,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|affected| affected == 1)
    }
}

impl<C> Database<Lock<By<Rental, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Rental, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: rental::Id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO rentals_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO NOTHING";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C>
    Database<Select<By<read::rental::list::Page, read::rental::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::rental::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::rental::list::Page, read::rental::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::rental::list::Selector {
            arguments,
            filter: read::rental::list::Filter {
                status,
                customer_id,
            },
        } = by.into_inner();

        let limit = i32::try_from(arguments.limit()).unwrap() + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let status_idx = status.as_ref().map(|s| {
            ps.push(s);
            ps.len()
        });
        let customer_idx = customer_id.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });

        let order = arguments.kind().order().sql();
        let sql = format!(
            "SELECT id, status \
             FROM rentals \
             WHERE true \
                   {cursor} \
                   {status_filtering} \
                   {customer_filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = arguments.kind().operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            status_filtering =
                status_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND status = ${idx}::INT2"))
                }),
            customer_filtering =
                customer_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND customer_id = ${idx}::UUID"))
                }),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .into_iter()
            .take(arguments.limit())
            .map(|row| {
                let id = row.get("id");
                let status = row.get("status");
                (id, (id, status))
            })
            .collect::<Vec<_>>();

        Ok(read::rental::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<By<read::rental::list::TotalCount, read::rental::list::Filter>>,
    > for Postgres<C>
where
    C: Connection,
{
    type Ok = read::rental::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::rental::list::TotalCount, read::rental::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::rental::list::Filter {
            status,
            customer_id,
        } = by.into_inner();

        const SQL: &str = "\
            SELECT COUNT(*)::INT4 \
            FROM rentals \
            WHERE ($1::INT2 IS NULL OR status = $1::INT2) \
              AND ($2::UUID IS NULL OR customer_id = $2::UUID)";
        self.query_opt(SQL, &[&status, &customer_id])
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i32>(0).into())
    }
}
