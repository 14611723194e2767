//! Rental lifecycle scenarios running against the [`InMemory`] database.

use common::{money::Currency, Date, DateTime, Money};
use rust_decimal::Decimal;
use service::{
    command::{
        self, AddLineItem, AdvanceRental, CancelRental, ConfirmPayment,
        CreateRental, FinalizeRental, GenerateChecklist, MarkCollected,
        RemoveLineItem, UnmarkCollected,
    },
    domain::{
        catalog::{self, product, tent, Product, Tent},
        checklist::CollectorName,
        customer, payment,
        rental::{self, item, Period, Status},
        Customer, Event, Role,
    },
    query::{self, rental::Settlement},
    Command as _, Config, Query as _, Service,
};
use service::infra::InMemory;

fn date(s: &str) -> Date {
    Date::from_iso8601(s).unwrap()
}

fn brl(amount: i64) -> Money {
    Money {
        amount: Decimal::from(amount),
        currency: Currency::Brl,
    }
}

struct Catalog {
    customer_id: customer::Id,
    product_id: product::Id,
    tent_id: tent::Id,
}

/// Seeds a [`Customer`], a [`Product`] with 10 units in stock and a [`Tent`]
/// with 5.
fn seeded() -> (Service<InMemory>, Catalog) {
    service_with(Config::default())
}

fn service_with(config: Config) -> (Service<InMemory>, Catalog) {
    let db = InMemory::new();

    let customer_id = customer::Id::new();
    db.seed_customer(Customer {
        id: customer_id,
        name: "Maria Silva".parse().unwrap(),
        created_at: DateTime::now().coerce(),
    });

    let product_id = product::Id::new();
    db.seed_product(Product {
        id: product_id,
        name: "Folding chair".parse().unwrap(),
        total_stock: catalog::Stock::new(10).unwrap(),
        created_at: DateTime::now().coerce(),
    });

    let tent_id = tent::Id::new();
    db.seed_tent(Tent {
        id: tent_id,
        name: "Gazebo 3x3".parse().unwrap(),
        total_stock: catalog::Stock::new(5).unwrap(),
        created_at: DateTime::now().coerce(),
    });

    (
        Service::new(config, db),
        Catalog {
            customer_id,
            product_id,
            tent_id,
        },
    )
}

fn period(start: &str, end: &str) -> Period {
    Period::new(date(start).coerce(), date(end).coerce()).unwrap()
}

fn new_item(what: catalog::Ref, quantity: i32, price: i64) -> command::create_rental::NewItem {
    command::create_rental::NewItem {
        what,
        quantity: item::Quantity::new(quantity).unwrap(),
        unit_price: brl(price),
    }
}

async fn stock_of(
    svc: &Service<InMemory>,
    what: catalog::Ref,
) -> i32 {
    use common::operations::{By, Select};
    use service::infra::Database as _;

    match what {
        catalog::Ref::Product(id) => svc
            .database()
            .execute(Select(By::<Option<Product>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .total_stock
            .count(),
        catalog::Ref::Tent(id) => svc
            .database()
            .execute(Select(By::<Option<Tent>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .total_stock
            .count(),
    }
}

#[tokio::test]
async fn full_lifecycle_settles_and_restores_stock() {
    let (svc, cat) = seeded();

    // 2 chairs at 50/day plus 1 gazebo at 20/day, 3 days: 360 total.
    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![
                new_item(cat.product_id.into(), 2, 50),
                new_item(cat.tent_id.into(), 1, 20),
            ],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();
    let rental_id = created.rental.id;
    assert_eq!(created.rental.status, Status::Pending);
    assert_eq!(created.rental.total_value, brl(360));
    assert_eq!(created.payment.amount, brl(360));
    assert_eq!(created.payment.status, payment::Status::Pending);
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 8);
    assert_eq!(stock_of(&svc, cat.tent_id.into()).await, 4);

    let advanced = svc
        .execute(AdvanceRental {
            initiator: Role::Comercial,
            rental_id,
        })
        .await
        .unwrap();
    assert_eq!(advanced.rental.status, Status::AwaitingPayment);
    assert_eq!(
        advanced.event,
        Event::StatusChanged {
            rental_id,
            from: Status::Pending,
            to: Status::AwaitingPayment,
        },
    );

    // Confirmation is gated on a settled payment.
    let gated = svc
        .execute(AdvanceRental {
            initiator: Role::Comercial,
            rental_id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        gated.as_ref(),
        command::advance_rental::ExecutionError::PaymentMissing(_),
    ));

    let paid = svc
        .execute(ConfirmPayment {
            initiator: Role::Comercial,
            rental_id,
        })
        .await
        .unwrap();
    assert_eq!(paid.status, payment::Status::Paid);
    assert!(paid.paid_at.is_some());

    for expected in [Status::Confirmed, Status::Ongoing, Status::Collecting] {
        let advanced = svc
            .execute(AdvanceRental {
                initiator: Role::Operacional,
                rental_id,
            })
            .await
            .unwrap();
        assert_eq!(advanced.rental.status, expected);
    }

    // Only the product is tracked by the checklist, the tent is not.
    let checklist = svc
        .execute(GenerateChecklist {
            initiator: Role::Operacional,
            rental_id,
        })
        .await
        .unwrap();
    assert_eq!(checklist.len(), 1);
    assert_eq!(checklist[0].expected.count(), 2);

    let incomplete = svc
        .execute(FinalizeRental {
            initiator: Role::Operacional,
            rental_id,
            returned_on: date("2024-03-05").coerce(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        incomplete.as_ref(),
        command::finalize_rental::ExecutionError::ChecklistIncomplete(_),
    ));
    // The rejected finalize leaves both the status and the stock untouched.
    let unchanged = svc
        .execute(query::rental::ById::by(rental_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, Status::Collecting);
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 8);
    assert_eq!(stock_of(&svc, cat.tent_id.into()).await, 4);

    let marked = svc
        .execute(MarkCollected {
            initiator: Role::Operacional,
            item_id: checklist[0].id,
            by: CollectorName::new("Ana").unwrap(),
            quantity: 2,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(
        marked.event,
        Some(Event::ChecklistCompleted { rental_id }),
    );

    // Returned 2 days late: 5 days at 120/day.
    let finalized = svc
        .execute(FinalizeRental {
            initiator: Role::Operacional,
            rental_id,
            returned_on: date("2024-03-05").coerce(),
        })
        .await
        .unwrap();
    assert_eq!(finalized.rental.status, Status::Finished);
    assert_eq!(finalized.values.planned_days, 3);
    assert_eq!(finalized.values.actual_days, 5);
    assert_eq!(finalized.values.extra_days, 2);
    assert_eq!(finalized.values.total_value, brl(600));
    assert!(finalized.values.varies_from(created.rental.total_value));
    assert_eq!(finalized.events.len(), 2);
    assert!(finalized.events.contains(&Event::Finalized {
        rental_id,
        total_value: brl(600),
    }));

    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 10);
    assert_eq!(stock_of(&svc, cat.tent_id.into()).await, 5);

    let settlement = svc
        .execute(Settlement { rental_id })
        .await
        .unwrap();
    assert_eq!(settlement.values.total_value, brl(600));
    assert_eq!(settlement.items.len(), 2);
    assert_eq!(settlement.checklist.len(), 1);
}

#[tokio::test]
async fn roles_gate_commands() {
    let (svc, cat) = seeded();

    let denied = svc
        .execute(CreateRental {
            initiator: Role::Operacional,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        denied.as_ref(),
        command::create_rental::ExecutionError::Forbidden(Role::Operacional),
    ));

    let created = svc
        .execute(CreateRental {
            initiator: Role::Admin,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();

    let denied = svc
        .execute(GenerateChecklist {
            initiator: Role::Comercial,
            rental_id: created.rental.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        denied.as_ref(),
        command::generate_checklist::ExecutionError::Forbidden(
            Role::Comercial,
        ),
    ));

    let denied = svc
        .execute(FinalizeRental {
            initiator: Role::Comercial,
            rental_id: created.rental.id,
            returned_on: date("2024-03-03").coerce(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        denied.as_ref(),
        command::finalize_rental::ExecutionError::Forbidden(Role::Comercial),
    ));
}

#[tokio::test]
async fn cancellation_restores_reserved_stock() {
    let (svc, cat) = seeded();

    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 4, 25)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 6);

    let cancelled = svc
        .execute(CancelRental {
            initiator: Role::Comercial,
            rental_id: created.rental.id,
        })
        .await
        .unwrap();
    assert_eq!(cancelled.rental.status, Status::Cancelled);
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 10);

    // Terminal statuses cannot be cancelled again.
    let closed = svc
        .execute(CancelRental {
            initiator: Role::Comercial,
            rental_id: created.rental.id,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        closed.as_ref(),
        command::cancel_rental::ExecutionError::RentalAlreadyClosed(_),
    ));
}

#[tokio::test]
async fn checklist_generation_is_idempotent() {
    let (svc, cat) = seeded();

    let rental_id = collecting_rental(&svc, &cat, 3).await;

    let first = svc
        .execute(GenerateChecklist {
            initiator: Role::Operacional,
            rental_id,
        })
        .await
        .unwrap();
    let second = svc
        .execute(GenerateChecklist {
            initiator: Role::Admin,
            rental_id,
        })
        .await
        .unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].id, second[0].id);
}

#[tokio::test]
async fn over_collection_is_rejected() {
    let (svc, cat) = seeded();

    let rental_id = collecting_rental(&svc, &cat, 2).await;
    let checklist = svc
        .execute(GenerateChecklist {
            initiator: Role::Operacional,
            rental_id,
        })
        .await
        .unwrap();

    let rejected = svc
        .execute(MarkCollected {
            initiator: Role::Operacional,
            item_id: checklist[0].id,
            by: CollectorName::new("Ana").unwrap(),
            quantity: 5,
            notes: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::mark_collected::ExecutionError::OverCollected {
            expected: 2,
            collected: 5,
        },
    ));
}

#[tokio::test]
async fn under_collection_settles_with_partial_restock() {
    let (svc, cat) = seeded();

    let rental_id = collecting_rental(&svc, &cat, 4).await;
    let checklist = svc
        .execute(GenerateChecklist {
            initiator: Role::Operacional,
            rental_id,
        })
        .await
        .unwrap();

    // Only 3 of the 4 rented units came back.
    let marked = svc
        .execute(MarkCollected {
            initiator: Role::Operacional,
            item_id: checklist[0].id,
            by: CollectorName::new("Ana").unwrap(),
            quantity: 3,
            notes: "one chair broken".parse().ok(),
        })
        .await
        .unwrap();
    assert!(marked.item.is_under_collected());

    let finalized = svc
        .execute(FinalizeRental {
            initiator: Role::Operacional,
            rental_id,
            returned_on: date("2024-03-03").coerce(),
        })
        .await
        .unwrap();
    assert_eq!(finalized.rental.status, Status::Finished);

    // The missing unit stays out of stock.
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 9);
}

#[tokio::test]
async fn unmarking_reopens_the_checklist() {
    let (svc, cat) = seeded();

    let rental_id = collecting_rental(&svc, &cat, 2).await;
    let checklist = svc
        .execute(GenerateChecklist {
            initiator: Role::Operacional,
            rental_id,
        })
        .await
        .unwrap();
    let item_id = checklist[0].id;

    let marked = svc
        .execute(MarkCollected {
            initiator: Role::Operacional,
            item_id,
            by: CollectorName::new("Ana").unwrap(),
            quantity: 2,
            notes: None,
        })
        .await
        .unwrap();
    assert!(marked.item.is_collected());

    let unmarked = svc
        .execute(UnmarkCollected {
            initiator: Role::Operacional,
            item_id,
        })
        .await
        .unwrap();
    assert!(!unmarked.is_collected());

    let incomplete = svc
        .execute(FinalizeRental {
            initiator: Role::Operacional,
            rental_id,
            returned_on: date("2024-03-03").coerce(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        incomplete.as_ref(),
        command::finalize_rental::ExecutionError::ChecklistIncomplete(_),
    ));
    // The rejected finalize leaves both the status and the stock untouched.
    let unchanged = svc
        .execute(query::rental::ById::by(rental_id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unchanged.status, Status::Collecting);
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 8);
}

#[tokio::test]
async fn insufficient_stock_fails_creation() {
    let (svc, cat) = seeded();

    let rejected = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 20, 10)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::create_rental::ExecutionError::InsufficientStock(_),
    ));
}

#[tokio::test]
async fn duplicate_catalog_entities_are_rejected() {
    let (svc, cat) = seeded();

    // Two line items for the same product would collapse into a single
    // checklist row and over-restore stock on finalization.
    let rejected = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![
                new_item(cat.product_id.into(), 2, 50),
                new_item(cat.product_id.into(), 3, 50),
            ],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::create_rental::ExecutionError::DuplicateLineItem(_),
    ));
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 10);

    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 2, 50)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();

    let rejected = svc
        .execute(AddLineItem {
            initiator: Role::Comercial,
            rental_id: created.rental.id,
            item: new_item(cat.product_id.into(), 3, 50),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::add_line_item::ExecutionError::DuplicateLineItem(_),
    ));
    assert_eq!(stock_of(&svc, cat.product_id.into()).await, 8);
}

#[tokio::test]
async fn negative_amounts_are_rejected() {
    let (svc, cat) = seeded();

    let rejected = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, -50)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::create_rental::ExecutionError::NegativeAmount,
    ));

    // A negative discount would silently inflate the quote.
    let rejected = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(-100),
            delivery_fee: brl(0),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::create_rental::ExecutionError::NegativeAmount,
    ));

    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();

    let rejected = svc
        .execute(AddLineItem {
            initiator: Role::Comercial,
            rental_id: created.rental.id,
            item: new_item(cat.tent_id.into(), 1, -50),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::add_line_item::ExecutionError::NegativeAmount,
    ));
}

#[tokio::test]
async fn discount_clamps_the_quote_at_zero() {
    let (svc, cat) = seeded();

    // 300 rental with a 1000 discount and a 50 delivery fee quotes as 0.
    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(1000),
            delivery_fee: brl(50),
        })
        .await
        .unwrap();
    assert_eq!(created.rental.total_value, brl(0));
}

#[tokio::test]
async fn business_day_pricing_skips_weekends() {
    let (svc, cat) = service_with(Config {
        pricing: service::Pricing {
            charge_business_days_only: true,
        },
    });

    // Friday through Monday spans 4 calendar days but only 2 business ones.
    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-04"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();
    assert_eq!(created.rental.total_value, brl(200));
}

#[tokio::test]
async fn line_items_stay_editable_until_confirmation() {
    let (svc, cat) = seeded();

    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();
    let rental_id = created.rental.id;

    let added = svc
        .execute(AddLineItem {
            initiator: Role::Comercial,
            rental_id,
            item: new_item(cat.tent_id.into(), 1, 50),
        })
        .await
        .unwrap();
    assert_eq!(added.rental.total_value, brl(450));
    assert_eq!(stock_of(&svc, cat.tent_id.into()).await, 4);

    let removed = svc
        .execute(RemoveLineItem {
            initiator: Role::Comercial,
            rental_id,
            item_id: added.item.id(),
        })
        .await
        .unwrap();
    assert_eq!(removed.total_value, brl(300));
    assert_eq!(stock_of(&svc, cat.tent_id.into()).await, 5);

    // The last line item cannot be removed.
    let last = svc
        .execute(RemoveLineItem {
            initiator: Role::Comercial,
            rental_id,
            item_id: created.items[0].id(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        last.as_ref(),
        command::remove_line_item::ExecutionError::LastLineItem(_),
    ));

    // Editing stops once the rental is confirmed.
    svc.execute(AdvanceRental {
        initiator: Role::Comercial,
        rental_id,
    })
    .await
    .unwrap();
    let _ = svc
        .execute(ConfirmPayment {
            initiator: Role::Comercial,
            rental_id,
        })
        .await
        .unwrap();
    svc.execute(AdvanceRental {
        initiator: Role::Comercial,
        rental_id,
    })
    .await
    .unwrap();

    let frozen = svc
        .execute(AddLineItem {
            initiator: Role::Comercial,
            rental_id,
            item: new_item(cat.tent_id.into(), 1, 50),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        frozen.as_ref(),
        command::add_line_item::ExecutionError::RentalNotEditable(_),
    ));
}

#[tokio::test]
async fn return_date_cannot_precede_the_start() {
    let (svc, cat) = seeded();

    let rental_id = collecting_rental(&svc, &cat, 1).await;
    svc.execute(GenerateChecklist {
        initiator: Role::Operacional,
        rental_id,
    })
    .await
    .map(drop)
    .unwrap();

    let rejected = svc
        .execute(FinalizeRental {
            initiator: Role::Operacional,
            rental_id,
            returned_on: date("2024-02-28").coerce(),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        rejected.as_ref(),
        command::finalize_rental::ExecutionError::ReturnPrecedesStart(_),
    ));
}

#[tokio::test]
async fn listing_filters_by_status() {
    use service::read::rental::list;

    let (svc, cat) = seeded();

    let first = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();
    let _ = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-04-01", "2024-04-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();
    svc.execute(CancelRental {
        initiator: Role::Comercial,
        rental_id: first.rental.id,
    })
    .await
    .map(drop)
    .unwrap();

    let arguments =
        list::Arguments::new(Some(10), None, None, None, 10).unwrap();
    let page = svc
        .execute(query::rentals::List::by(list::Selector {
            arguments,
            filter: list::Filter {
                status: Some(Status::Cancelled),
                customer_id: None,
            },
        }))
        .await
        .unwrap();
    assert_eq!(page.edges.len(), 1);
    assert_eq!(page.edges[0].node, (first.rental.id, Status::Cancelled));

    let total = svc
        .execute(query::rentals::TotalCount::by(list::Filter::default()))
        .await
        .unwrap();
    assert_eq!(i32::from(total), 2);
}

#[tokio::test]
async fn overdue_query_finds_unsettled_payments() {
    let (svc, cat) = seeded();

    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), 1, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();

    // The pending payment is due on the period start, long past by now.
    let today: payment::DueDate = Date::today().coerce();
    let overdue = svc
        .execute(query::payment::OverdueAsOf::by(today))
        .await
        .unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].rental_id, created.rental.id);

    let _ = svc
        .execute(ConfirmPayment {
            initiator: Role::Comercial,
            rental_id: created.rental.id,
        })
        .await
        .unwrap();

    let overdue = svc
        .execute(query::payment::OverdueAsOf::by(today))
        .await
        .unwrap();
    assert!(overdue.is_empty());
}

/// Creates a rental for the given product `quantity` and drives it into
/// [`Status::Collecting`].
async fn collecting_rental(
    svc: &Service<InMemory>,
    cat: &Catalog,
    quantity: i32,
) -> rental::Id {
    let created = svc
        .execute(CreateRental {
            initiator: Role::Comercial,
            customer_id: cat.customer_id,
            period: period("2024-03-01", "2024-03-03"),
            installation_on: None,
            installation_time: None,
            items: vec![new_item(cat.product_id.into(), quantity, 100)],
            discount: brl(0),
            delivery_fee: brl(0),
        })
        .await
        .unwrap();
    let rental_id = created.rental.id;

    svc.execute(AdvanceRental {
        initiator: Role::Comercial,
        rental_id,
    })
    .await
    .map(drop)
    .unwrap();
    let _ = svc
        .execute(ConfirmPayment {
            initiator: Role::Comercial,
            rental_id,
        })
        .await
        .unwrap();
    for _ in 0..3 {
        svc.execute(AdvanceRental {
            initiator: Role::Comercial,
            rental_id,
        })
        .await
        .map(drop)
        .unwrap();
    }

    rental_id
}
