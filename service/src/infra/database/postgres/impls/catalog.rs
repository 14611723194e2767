//! Catalog-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{
        catalog::{self, product, tent},
        Product, Tent,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Product>, product::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: product::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, total_stock, created_at \
            FROM products \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Product {
                id: row.get("id"),
                name: row.get("name"),
                total_stock: row.get("total_stock"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Select<By<Option<Tent>, tent::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Tent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Tent>, tent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: tent::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, total_stock, created_at \
            FROM tents \
            WHERE id = $1::UUID \
            LIMIT 1";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Tent {
                id: row.get("id"),
                name: row.get("name"),
                total_stock: row.get("total_stock"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<catalog::Reserve> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        op: catalog::Reserve,
    ) -> Result<Self::Ok, Self::Err> {
        // Conditional decrement, so overbooking never commits.
        const PRODUCT_SQL: &str = "\
            UPDATE products \
            SET total_stock = total_stock - $2::INT4 \
            WHERE id = $1::UUID \
              AND total_stock >= $2::INT4";
        const TENT_SQL: &str = "\
            UPDATE tents \
            SET total_stock = total_stock - $2::INT4 \
            WHERE id = $1::UUID \
              AND total_stock >= $2::INT4";

        let affected = match op.what {
            catalog::Ref::Product(id) => {
                self.exec(PRODUCT_SQL, &[&id, &op.quantity]).await
            }
            catalog::Ref::Tent(id) => {
                self.exec(TENT_SQL, &[&id, &op.quantity]).await
            }
        }
        .map_err(tracerr::wrap!())?;

        Ok(affected == 1)
    }
}

impl<C> Database<catalog::Restock> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        op: catalog::Restock,
    ) -> Result<Self::Ok, Self::Err> {
        const PRODUCT_SQL: &str = "\
            UPDATE products \
            SET total_stock = total_stock + $2::INT4 \
            WHERE id = $1::UUID";
        const TENT_SQL: &str = "\
            UPDATE tents \
            SET total_stock = total_stock + $2::INT4 \
            WHERE id = $1::UUID";

        match op.what {
            catalog::Ref::Product(id) => {
                self.exec(PRODUCT_SQL, &[&id, &op.quantity]).await
            }
            catalog::Ref::Tent(id) => {
                self.exec(TENT_SQL, &[&id, &op.quantity]).await
            }
        }
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
