//! [`Command`] for creating a new [`Rental`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        catalog,
        rental::{
            self, billing,
            item::{self, ProductItem, TentItem},
            LineItem, Period, Revision, Status,
        },
        customer, payment, role, Customer, Payment, Rental, Role,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Rental`] with its [`LineItem`]s.
///
/// Reserves catalog stock for every item and registers a pending [`Payment`]
/// for the quoted total.
#[derive(Clone, Debug)]
pub struct CreateRental {
    /// [`Role`] of the user creating the [`Rental`].
    pub initiator: Role,

    /// ID of the [`Customer`] the [`Rental`] is leased to.
    pub customer_id: customer::Id,

    /// [`Period`] the [`Rental`] is planned for.
    pub period: Period,

    /// [`Date`] when the rented items are installed, if scheduled.
    ///
    /// [`Date`]: common::Date
    pub installation_on: Option<rental::InstallationDate>,

    /// Free-form time note for the installation.
    pub installation_time: Option<rental::InstallationTime>,

    /// Items to be rented.
    pub items: Vec<NewItem>,

    /// Discount applied to the total.
    pub discount: Money,

    /// Delivery fee charged on top of the total.
    pub delivery_fee: Money,
}

/// Single item of a [`CreateRental`] [`Command`], becoming a [`LineItem`].
#[derive(Clone, Copy, Debug)]
pub struct NewItem {
    /// Catalog entity to rent.
    pub what: catalog::Ref,

    /// Quantity of units to rent.
    pub quantity: item::Quantity,

    /// Per-day price of a single unit.
    pub unit_price: Money,
}

/// Output of a [`CreateRental`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`Rental`].
    pub rental: Rental,

    /// Created [`LineItem`]s of the [`Rental`].
    pub items: Vec<LineItem>,

    /// Pending [`Payment`] registered for the quoted total.
    pub payment: Payment,
}

impl<Db> Command<CreateRental> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Customer>, customer::Id>>,
            Ok = Option<Customer>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            catalog::Reserve,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Insert<Rental>, Err = Traced<database::Error>>
        + Database<Insert<LineItem>, Err = Traced<database::Error>>
        + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRental) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRental {
            initiator,
            customer_id,
            period,
            installation_on,
            installation_time,
            items,
            discount,
            delivery_fee,
        } = cmd;

        if !initiator.permits(role::Action::CreateRental) {
            return Err(tracerr::new!(E::Forbidden(initiator)));
        }

        if items.is_empty() {
            return Err(tracerr::new!(E::NoLineItems));
        }
        // Checklists are keyed per catalog entity, so the same one cannot
        // appear in two `LineItem`s.
        for (n, i) in items.iter().enumerate() {
            if items[..n].iter().any(|prev| prev.what == i.what) {
                return Err(tracerr::new!(E::DuplicateLineItem(i.what)));
            }
        }
        if items.iter().any(|i| i.unit_price.is_negative())
            || discount.is_negative()
            || delivery_fee.is_negative()
        {
            return Err(tracerr::new!(E::NegativeAmount));
        }

        self.database()
            .execute(Select(By::<Option<Customer>, _>::new(customer_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::CustomerNotExists(customer_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

        let rental_id = rental::Id::new();
        let line_items = items
            .iter()
            .map(|i| line_item(rental_id, i))
            .collect::<Vec<_>>();

        let daily_rate = item::daily_rate(line_items.iter())
            .ok_or(E::CurrencyMismatch)
            .map_err(tracerr::wrap!())?;

        let days = if self.config().pricing.charge_business_days_only {
            billing::business_days(period.start(), period.end())
        } else {
            billing::calendar_days(period.start(), period.end())
        };
        let total_value = daily_rate
            .scaled(days)
            .checked_sub(discount)
            .and_then(|v| v.checked_add(delivery_fee))
            .ok_or(E::CurrencyMismatch)
            .map_err(tracerr::wrap!())?
            .clamped();

        let rental = Rental {
            id: rental_id,
            customer_id,
            period,
            installation_on,
            installation_time,
            status: Status::Pending,
            returned_on: None,
            daily_rate,
            discount,
            delivery_fee,
            total_value,
            created_at: DateTime::now().coerce(),
            revision: Revision::INITIAL,
        };
        let payment = Payment {
            id: payment::Id::new(),
            rental_id,
            amount: total_value,
            status: payment::Status::Pending,
            due_on: Some(period.start().coerce()),
            created_at: DateTime::now().coerce(),
            paid_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        for i in &items {
            let reserved = tx
                .execute(catalog::Reserve {
                    what: i.what,
                    quantity: i.quantity.count(),
                })
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if !reserved {
                return Err(tracerr::new!(E::InsufficientStock(i.what)));
            }
        }

        tx.execute(Insert(rental.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        for i in line_items.clone() {
            tx.execute(Insert(i))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }
        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Rental(id: {rental_id})` created for \
             `Customer(id: {customer_id})`: {total_value} quoted",
        );

        Ok(Output {
            rental,
            items: line_items,
            payment,
        })
    }
}

/// Builds a [`LineItem`] of the [`Rental`] from the provided [`NewItem`].
fn line_item(rental_id: rental::Id, new: &NewItem) -> LineItem {
    match new.what {
        catalog::Ref::Tent(tent_id) => LineItem::Tent(TentItem {
            id: item::Id::new(),
            rental_id,
            tent_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
        }),
        catalog::Ref::Product(product_id) => LineItem::Product(ProductItem {
            id: item::Id::new(),
            rental_id,
            product_id,
            quantity: new.quantity,
            unit_price: new.unit_price,
        }),
    }
}

/// Error of [`CreateRental`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`LineItem`]s don't share a single currency.
    #[display("`LineItem`s don't share a single currency")]
    CurrencyMismatch,

    /// [`Customer`] with the provided ID does not exist.
    #[display("`Customer(id: {_0})` does not exist")]
    CustomerNotExists(#[error(not(source))] customer::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Same catalog entity appears in two [`LineItem`]s.
    #[display("`{_0:?}` appears in two `LineItem`s")]
    DuplicateLineItem(#[error(not(source))] catalog::Ref),

    /// Initiator's [`Role`] is not permitted to create [`Rental`]s.
    #[display("`Role::{_0}` is not permitted to create `Rental`s")]
    Forbidden(#[error(not(source))] Role),

    /// Catalog entity doesn't have enough stock available.
    #[display("not enough stock available for `{_0:?}`")]
    InsufficientStock(#[error(not(source))] catalog::Ref),

    /// Monetary input is negative.
    #[display("monetary inputs cannot be negative")]
    NegativeAmount,

    /// [`Rental`] must contain at least one [`LineItem`].
    #[display("`Rental` must contain at least one `LineItem`")]
    NoLineItems,
}
