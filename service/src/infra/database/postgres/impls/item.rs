//! [`LineItem`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select},
    Money,
};
use tracerr::Traced;

use crate::{
    domain::rental::{
        self,
        item::{Kind, ProductItem, TentItem},
        LineItem,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Vec<LineItem>, rental::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<LineItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<LineItem>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let rental_id: rental::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, kind, rental_id, product_id, tent_id, \
                   quantity, unit_price, currency \
            FROM rental_items \
            WHERE rental_id = $1::UUID \
            ORDER BY id ASC";
        Ok(self
            .query(SQL, &[&rental_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| {
                let id = row.get("id");
                let rental_id = row.get("rental_id");
                let quantity = row.get("quantity");
                let unit_price = Money {
                    amount: row.get("unit_price"),
                    currency: row.get("currency"),
                };
                match row.get("kind") {
                    Kind::Tent => LineItem::Tent(TentItem {
                        id,
                        rental_id,
                        tent_id: row.get("tent_id"),
                        quantity,
                        unit_price,
                    }),
                    Kind::Product => LineItem::Product(ProductItem {
                        id,
                        rental_id,
                        product_id: row.get("product_id"),
                        quantity,
                        unit_price,
                    }),
                }
            })
            .collect())
    }
}

impl<C> Database<Insert<LineItem>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(item): Insert<LineItem>,
    ) -> Result<Self::Ok, Self::Err> {
        let (product_id, tent_id) = match &item {
            LineItem::Tent(i) => (None, Some(i.tent_id)),
            LineItem::Product(i) => (Some(i.product_id), None),
        };

        const SQL: &str = "\
            INSERT INTO rental_items (\
                id, kind, rental_id, product_id, tent_id, \
                quantity, unit_price, currency\
            ) VALUES (\
                $1::UUID, $2::INT2, $3::UUID, $4::UUID, $5::UUID, \
                $6::INT4, $7::NUMERIC, $8::INT2\
            )";
        self.exec(
            SQL,
            &[
                &item.id(),
                &item.kind(),
                &item.rental_id(),
                &product_id,
                &tent_id,
                &item.quantity(),
                &item.unit_price().amount,
                &item.unit_price().currency,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<LineItem>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(item): Delete<LineItem>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            DELETE FROM rental_items \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&item.id()])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
