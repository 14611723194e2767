//! [`InMemory`] [`Database`] implementation.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::operations::{
    By, Commit, Delete, Insert, Lock, Select, Transact, Update,
};
use tracerr::Traced;
use uuid::Uuid;

use crate::{
    domain::{
        catalog::{self, product, tent, Product, Tent},
        checklist, customer, payment,
        rental::{self, LineItem},
        ChecklistItem, Customer, Payment, Rental,
    },
    infra::{database, Database},
    read::{self, Paid},
};

/// In-memory [`Database`], channeling every operation through a single
/// process-local state.
///
/// Intended for tests and local development: transactions are degenerate
/// (operations apply immediately and [`Commit`] is a no-op), while revision
/// checks behave exactly like the durable implementation.
#[derive(Clone, Debug, Default)]
pub struct InMemory {
    /// Shared state of this [`InMemory`] database.
    state: Arc<Mutex<State>>,
}

/// State of an [`InMemory`] database.
#[derive(Clone, Debug, Default)]
struct State {
    /// Stored [`Rental`]s.
    rentals: HashMap<rental::Id, Rental>,

    /// Stored [`LineItem`]s, in insertion order.
    items: Vec<LineItem>,

    /// Stored [`ChecklistItem`]s, in insertion order.
    checklist: Vec<ChecklistItem>,

    /// Stored [`Payment`]s, in insertion order.
    payments: Vec<Payment>,

    /// Stored [`Customer`]s.
    customers: HashMap<customer::Id, Customer>,

    /// Stored [`Product`]s.
    products: HashMap<product::Id, Product>,

    /// Stored [`Tent`]s.
    tents: HashMap<tent::Id, Tent>,
}

impl InMemory {
    /// Creates a new empty [`InMemory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the guarded [`State`] of this [`InMemory`] database.
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seeds the provided [`Customer`] into this [`InMemory`] database.
    pub fn seed_customer(&self, customer: Customer) {
        drop(self.state().customers.insert(customer.id, customer));
    }

    /// Seeds the provided [`Product`] into this [`InMemory`] database.
    pub fn seed_product(&self, product: Product) {
        drop(self.state().products.insert(product.id, product));
    }

    /// Seeds the provided [`Tent`] into this [`InMemory`] database.
    pub fn seed_tent(&self, tent: Tent) {
        drop(self.state().tents.insert(tent.id, tent));
    }
}

impl Database<Transact> for InMemory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Lock<By<Rental, rental::Id>>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Rental, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<Rental>, rental::Id>>> for InMemory {
    type Ok = Option<Rental>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Rental>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().rentals.get(&by.into_inner()).cloned())
    }
}

impl Database<Insert<Rental>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(rental): Insert<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().rentals.insert(rental.id, rental));
        Ok(())
    }
}

impl Database<Update<Rental>> for InMemory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(rental): Update<Rental>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        let Some(stored) = state.rentals.get_mut(&rental.id) else {
            return Ok(false);
        };
        if stored.revision != rental.revision {
            return Ok(false);
        }

        *stored = Rental {
            revision: rental.revision.bumped(),
            ..rental
        };
        Ok(true)
    }
}

impl Database<Select<By<Vec<LineItem>, rental::Id>>> for InMemory {
    type Ok = Vec<LineItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<LineItem>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let rental_id = by.into_inner();
        Ok(self
            .state()
            .items
            .iter()
            .filter(|i| i.rental_id() == rental_id)
            .cloned()
            .collect())
    }
}

impl Database<Insert<LineItem>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(item): Insert<LineItem>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().items.push(item);
        Ok(())
    }
}

impl Database<Delete<LineItem>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(item): Delete<LineItem>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().items.retain(|i| i.id() != item.id());
        Ok(())
    }
}

impl Database<Select<By<Option<ChecklistItem>, checklist::Id>>> for InMemory {
    type Ok = Option<ChecklistItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<ChecklistItem>, checklist::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .state()
            .checklist
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }
}

impl Database<Select<By<Vec<ChecklistItem>, rental::Id>>> for InMemory {
    type Ok = Vec<ChecklistItem>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<ChecklistItem>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let rental_id = by.into_inner();
        Ok(self
            .state()
            .checklist
            .iter()
            .filter(|c| c.rental_id == rental_id)
            .cloned()
            .collect())
    }
}

impl Database<Insert<ChecklistItem>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(item): Insert<ChecklistItem>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().checklist.push(item);
        Ok(())
    }
}

impl Database<Update<ChecklistItem>> for InMemory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(item): Update<ChecklistItem>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        let Some(stored) =
            state.checklist.iter_mut().find(|c| c.id == item.id)
        else {
            return Ok(false);
        };
        if stored.revision != item.revision {
            return Ok(false);
        }

        *stored = ChecklistItem {
            revision: item.revision.bumped(),
            ..item
        };
        Ok(true)
    }
}

impl Database<Select<By<Vec<Payment>, rental::Id>>> for InMemory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let rental_id = by.into_inner();
        Ok(self
            .state()
            .payments
            .iter()
            .filter(|p| p.rental_id == rental_id)
            .cloned()
            .collect())
    }
}

impl Database<Select<By<Option<Paid<Payment>>, rental::Id>>> for InMemory {
    type Ok = Option<Paid<Payment>>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Paid<Payment>>, rental::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let rental_id = by.into_inner();
        Ok(self
            .state()
            .payments
            .iter()
            .find(|p| p.rental_id == rental_id && p.is_paid())
            .cloned()
            .map(Paid))
    }
}

impl Database<Select<By<Vec<Payment>, payment::DueDate>>> for InMemory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, payment::DueDate>>,
    ) -> Result<Self::Ok, Self::Err> {
        let today = by.into_inner();
        Ok(self
            .state()
            .payments
            .iter()
            .filter(|p| p.is_overdue(today.coerce()))
            .cloned()
            .collect())
    }
}

impl Database<Insert<Payment>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().payments.push(payment);
        Ok(())
    }
}

impl Database<Update<Payment>> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        if let Some(stored) =
            state.payments.iter_mut().find(|p| p.id == payment.id)
        {
            *stored = payment;
        }
        Ok(())
    }
}

impl Database<Select<By<Option<Customer>, customer::Id>>> for InMemory {
    type Ok = Option<Customer>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Customer>, customer::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().customers.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Product>, product::Id>>> for InMemory {
    type Ok = Option<Product>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Product>, product::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().products.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Tent>, tent::Id>>> for InMemory {
    type Ok = Option<Tent>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Tent>, tent::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().tents.get(&by.into_inner()).cloned())
    }
}

impl Database<catalog::Reserve> for InMemory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        op: catalog::Reserve,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        let stock = match op.what {
            catalog::Ref::Product(id) => {
                state.products.get_mut(&id).map(|p| &mut p.total_stock)
            }
            catalog::Ref::Tent(id) => {
                state.tents.get_mut(&id).map(|t| &mut t.total_stock)
            }
        };
        let Some(stock) = stock else {
            return Ok(false);
        };

        let Some(decremented) = catalog::Stock::new(stock.count() - op.quantity)
        else {
            return Ok(false);
        };
        *stock = decremented;
        Ok(true)
    }
}

impl Database<catalog::Restock> for InMemory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        op: catalog::Restock,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state();
        let stock = match op.what {
            catalog::Ref::Product(id) => {
                state.products.get_mut(&id).map(|p| &mut p.total_stock)
            }
            catalog::Ref::Tent(id) => {
                state.tents.get_mut(&id).map(|t| &mut t.total_stock)
            }
        };
        if let Some(stock) = stock {
            if let Some(incremented) =
                catalog::Stock::new(stock.count() + op.quantity)
            {
                *stock = incremented;
            }
        }
        Ok(())
    }
}

impl Database<Select<By<read::rental::list::Page, read::rental::list::Selector>>>
    for InMemory
{
    type Ok = read::rental::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::rental::list::Page, read::rental::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::rental::list::Selector { arguments, filter } =
            by.into_inner();

        let mut nodes = self
            .state()
            .rentals
            .values()
            .filter(|r| matches(r, &filter))
            .map(|r| (r.id, (r.id, r.status)))
            .collect::<Vec<_>>();
        nodes.sort_unstable_by_key(|(id, _)| Uuid::from(*id));
        if arguments.kind().order()
            == common::pagination::Order::Descending
        {
            nodes.reverse();
        }

        let nodes = if let Some(&cursor) = arguments.cursor() {
            let op = arguments.kind().operator();
            nodes
                .into_iter()
                .filter(|(id, _)| match op {
                    ">" => Uuid::from(*id) > Uuid::from(cursor),
                    ">=" => Uuid::from(*id) >= Uuid::from(cursor),
                    "<" => Uuid::from(*id) < Uuid::from(cursor),
                    _ => Uuid::from(*id) <= Uuid::from(cursor),
                })
                .collect()
        } else {
            nodes
        };

        let has_more = nodes.len() > arguments.limit();
        let edges = nodes
            .into_iter()
            .take(arguments.limit())
            .collect::<Vec<_>>();

        Ok(read::rental::list::Page::new(&arguments, edges, has_more))
    }
}

impl
    Database<
        Select<By<read::rental::list::TotalCount, read::rental::list::Filter>>,
    > for InMemory
{
    type Ok = read::rental::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::rental::list::TotalCount, read::rental::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let count = self
            .state()
            .rentals
            .values()
            .filter(|r| matches(r, &filter))
            .count();
        Ok(i32::try_from(count).unwrap_or(i32::MAX).into())
    }
}

/// Checks whether the given [`Rental`] passes the provided list [`Filter`].
///
/// [`Filter`]: read::rental::list::Filter
fn matches(rental: &Rental, filter: &read::rental::list::Filter) -> bool {
    filter.status.map_or(true, |s| rental.status == s)
        && filter.customer_id.map_or(true, |c| rental.customer_id == c)
}

#[cfg(test)]
mod spec {
    use common::operations::{Insert, Select, Update, By};
    use common::DateTime;

    use crate::domain::{
        customer,
        rental::{self, Period, Revision, Status},
    };
    use crate::infra::Database as _;

    use super::InMemory;

    fn rental() -> rental::Rental {
        let start = common::Date::from_iso8601("2024-03-01").unwrap();
        let end = common::Date::from_iso8601("2024-03-03").unwrap();
        let period =
            Period::new(start.coerce(), end.coerce()).unwrap();
        let brl = |amount: i64| common::Money {
            amount: amount.into(),
            currency: common::money::Currency::Brl,
        };
        rental::Rental {
            id: rental::Id::new(),
            customer_id: customer::Id::new(),
            period,
            installation_on: None,
            installation_time: None,
            status: Status::Pending,
            returned_on: None,
            daily_rate: brl(100),
            discount: brl(0),
            delivery_fee: brl(0),
            total_value: brl(300),
            created_at: DateTime::now().coerce(),
            revision: Revision::INITIAL,
        }
    }

    #[tokio::test]
    async fn update_rejects_stale_revisions() {
        let db = InMemory::new();
        let stored = rental();

        db.execute(Insert(stored.clone())).await.unwrap();

        let mut fresh = stored.clone();
        fresh.status = Status::AwaitingPayment;
        assert!(db.execute(Update(fresh)).await.unwrap());

        // Still carries the initial revision.
        let mut stale = stored.clone();
        stale.status = Status::Cancelled;
        assert!(!db.execute(Update(stale)).await.unwrap());

        let current = db
            .execute(Select(By::<Option<rental::Rental>, _>::new(stored.id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, Status::AwaitingPayment);
        assert_eq!(current.revision, Revision::INITIAL.bumped());
    }
}
