//! Duration, proration and billing calculation for a [`Rental`].
//!
//! Day counting follows a single canonical convention: date ranges are
//! inclusive of both endpoints and never shorter than one day.

use common::{Date, DateOf, Money};

use super::{Rental, ReturnDate, Status};

/// Counts the chargeable calendar days between the given dates, both
/// endpoints included.
///
/// Never less than `1`: a same-day rental is charged as one day.
#[must_use]
pub fn calendar_days<A, B>(start: DateOf<A>, end: DateOf<B>) -> i64
where
    A: ?Sized,
    B: ?Sized,
{
    (start.days_until(end) + 1).max(1)
}

/// Counts the business days (Monday to Friday) between the given dates, both
/// endpoints included.
///
/// Zero when the `end` date precedes the `start` one.
#[must_use]
pub fn business_days<A, B>(start: DateOf<A>, end: DateOf<B>) -> i64
where
    A: ?Sized,
    B: ?Sized,
{
    let end: Date = end.coerce();
    let mut day: Date = start.coerce();
    let mut count = 0;
    while day <= end {
        if day.is_business_day() {
            count += 1;
        }
        let Some(next) = day.next_day() else {
            break;
        };
        day = next;
    }
    count
}

/// Live duration and billing metrics of a [`Rental`], relative to "today".
///
/// The delivery fee is intentionally excluded from [`current_total`]: it's
/// charged only at the final settlement ([`FinalValues`]).
///
/// [`current_total`]: RunningMetrics::current_total
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunningMetrics {
    /// Days originally quoted, start to end inclusive.
    pub planned_days: i64,

    /// Days elapsed so far, or the planned days when the [`Rental`] isn't
    /// out.
    pub actual_days: i64,

    /// Days elapsed beyond the planned end date.
    pub extra_days: i64,

    /// Indicator whether the [`Rental`] is past its planned end date.
    pub is_overdue: bool,

    /// Running estimate of the charge, discount applied, clamped at zero.
    pub current_total: Money,
}

impl RunningMetrics {
    /// Computes the [`RunningMetrics`] of the given [`Rental`] as of `today`.
    #[must_use]
    pub fn compute(rental: &Rental, today: Date) -> Self {
        let start = rental.period.start();
        let end = rental.period.end();
        let planned_days = calendar_days(start, end);

        let (actual_days, extra_days, is_overdue) = match rental.status {
            Status::Ongoing | Status::Collecting => (
                calendar_days(start, today),
                end.days_until(today).max(0),
                end.days_until(today) > 0,
            ),
            Status::Pending
            | Status::AwaitingPayment
            | Status::Confirmed
            | Status::Finished
            | Status::Cancelled => (planned_days, 0, false),
        };

        let gross = rental.daily_rate.scaled(actual_days);
        let current_total = Money {
            amount: gross.amount - rental.discount.amount,
            currency: rental.currency(),
        }
        .clamped();

        Self {
            planned_days,
            actual_days,
            extra_days,
            is_overdue,
            current_total,
        }
    }
}

/// Final billing of a [`Rental`], resolved at close-out against the actual
/// return date.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FinalValues {
    /// Days originally quoted, start to end inclusive.
    pub planned_days: i64,

    /// Days actually occupied, start to return inclusive.
    pub actual_days: i64,

    /// Days occupied beyond the planned end date.
    pub extra_days: i64,

    /// Charge for the planned days.
    pub base_value: Money,

    /// Charge for the extra (overdue) days.
    pub extra_value: Money,

    /// Discount applied to the settlement.
    pub discount: Money,

    /// Delivery fee charged on the settlement.
    pub delivery_fee: Money,

    /// Settled total: base plus extra, discount subtracted, delivery fee
    /// added, clamped at zero.
    pub total_value: Money,
}

impl FinalValues {
    /// Computes the [`FinalValues`] of the given [`Rental`] returned on the
    /// provided date.
    #[must_use]
    pub fn compute(rental: &Rental, returned_on: ReturnDate) -> Self {
        let start = rental.period.start();
        let end = rental.period.end();

        let planned_days = calendar_days(start, end);
        let actual_days = calendar_days(start, returned_on);
        let extra_days = end.days_until(returned_on).max(0);

        let base_value = rental.daily_rate.scaled(planned_days);
        let extra_value = rental.daily_rate.scaled(extra_days);
        let total_value = Money {
            amount: base_value.amount + extra_value.amount
                - rental.discount.amount
                + rental.delivery_fee.amount,
            currency: rental.currency(),
        }
        .clamped();

        Self {
            planned_days,
            actual_days,
            extra_days,
            base_value,
            extra_value,
            discount: rental.discount,
            delivery_fee: rental.delivery_fee,
            total_value,
        }
    }

    /// Indicates whether this settlement varies from the originally quoted
    /// total.
    ///
    /// Informational: the stored quote is never auto-corrected, the
    /// settlement is what's actually charged.
    #[must_use]
    pub fn varies_from(&self, quoted: Money) -> bool {
        self.total_value != quoted
    }
}

#[cfg(test)]
mod spec {
    use common::{money::Currency, Date, DateTime, Money};
    use rust_decimal::Decimal;

    use crate::domain::{
        customer,
        rental::{self, Period, Rental, Revision, Status},
    };

    use super::{business_days, calendar_days, FinalValues, RunningMetrics};

    fn date(s: &str) -> Date {
        Date::from_iso8601(s).unwrap()
    }

    fn brl(amount: i64) -> Money {
        Money {
            amount: Decimal::from(amount),
            currency: Currency::Brl,
        }
    }

    fn rental(
        start: &str,
        end: &str,
        daily_rate: i64,
        discount: i64,
        delivery_fee: i64,
    ) -> Rental {
        let period = Period::new(
            date(start).coerce(),
            date(end).coerce(),
        )
        .unwrap();
        Rental {
            id: rental::Id::new(),
            customer_id: customer::Id::new(),
            period,
            installation_on: None,
            installation_time: None,
            status: Status::Ongoing,
            returned_on: None,
            daily_rate: brl(daily_rate),
            discount: brl(discount),
            delivery_fee: brl(delivery_fee),
            total_value: brl(daily_rate * 3),
            created_at: DateTime::now().coerce(),
            revision: Revision::INITIAL,
        }
    }

    #[test]
    fn calendar_days_are_inclusive_and_floored_at_one() {
        assert_eq!(calendar_days(date("2024-03-01"), date("2024-03-03")), 3);
        assert_eq!(calendar_days(date("2024-03-01"), date("2024-03-01")), 1);
        // Inverted range still charges the minimum single day.
        assert_eq!(calendar_days(date("2024-03-03"), date("2024-03-01")), 1);
    }

    #[test]
    fn business_days_never_exceed_calendar_days() {
        // 2024-03-01 is a Friday, 2024-03-04 a Monday.
        assert_eq!(business_days(date("2024-03-01"), date("2024-03-04")), 2);
        assert_eq!(calendar_days(date("2024-03-01"), date("2024-03-04")), 4);

        // Saturday to Sunday contains no business days at all.
        assert_eq!(business_days(date("2024-03-02"), date("2024-03-03")), 0);
        assert_eq!(business_days(date("2024-03-03"), date("2024-03-02")), 0);

        for (start, end) in [
            ("2024-02-26", "2024-03-10"),
            ("2024-03-01", "2024-03-01"),
            ("2023-12-29", "2024-01-02"),
        ] {
            let b = business_days(date(start), date(end));
            assert!(b >= 0);
            assert!(b <= calendar_days(date(start), date(end)));
        }
    }

    #[test]
    fn running_metrics_track_elapsed_and_overdue_days() {
        let r = rental("2024-03-01", "2024-03-03", 100, 0, 0);

        let on_time = RunningMetrics::compute(&r, date("2024-03-02"));
        assert_eq!(on_time.planned_days, 3);
        assert_eq!(on_time.actual_days, 2);
        assert_eq!(on_time.extra_days, 0);
        assert!(!on_time.is_overdue);
        assert_eq!(on_time.current_total, brl(200));

        let overdue = RunningMetrics::compute(&r, date("2024-03-05"));
        assert_eq!(overdue.actual_days, 5);
        assert_eq!(overdue.extra_days, 2);
        assert!(overdue.is_overdue);
        assert_eq!(overdue.current_total, brl(500));
    }

    #[test]
    fn running_metrics_exclude_delivery_fee_and_clamp_at_zero() {
        let r = rental("2024-03-01", "2024-03-03", 100, 1000, 50);
        let m = RunningMetrics::compute(&r, date("2024-03-03"));
        assert_eq!(m.current_total, brl(0));
    }

    #[test]
    fn running_metrics_freeze_before_and_after_the_active_phase() {
        let mut r = rental("2024-03-01", "2024-03-03", 100, 0, 0);
        r.status = Status::Confirmed;

        let m = RunningMetrics::compute(&r, date("2024-03-10"));
        assert_eq!(m.actual_days, m.planned_days);
        assert_eq!(m.extra_days, 0);
        assert!(!m.is_overdue);
    }

    #[test]
    fn final_values_charge_planned_days_on_time() {
        let r = rental("2024-03-01", "2024-03-03", 100, 0, 0);
        let v = FinalValues::compute(&r, date("2024-03-03").coerce());

        assert_eq!(v.planned_days, 3);
        assert_eq!(v.actual_days, 3);
        assert_eq!(v.extra_days, 0);
        assert_eq!(v.base_value, brl(300));
        assert_eq!(v.extra_value, brl(0));
        assert_eq!(v.total_value, brl(300));
        assert!(!v.varies_from(brl(300)));
    }

    #[test]
    fn final_values_charge_overdue_days() {
        let r = rental("2024-03-01", "2024-03-03", 100, 0, 0);
        let v = FinalValues::compute(&r, date("2024-03-05").coerce());

        assert_eq!(v.extra_days, 2);
        assert_eq!(v.extra_value, brl(200));
        assert_eq!(v.total_value, brl(500));
        assert!(v.varies_from(brl(300)));
    }

    #[test]
    fn final_total_never_goes_negative() {
        let r = rental("2024-03-01", "2024-03-03", 100, 1000, 50);
        let v = FinalValues::compute(&r, date("2024-03-03").coerce());

        assert_eq!(v.base_value, brl(300));
        assert_eq!(v.total_value, brl(0));
    }
}
