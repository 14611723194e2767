//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new zero [`Money`] amount in the given [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Adds the given [`Money`] to this one.
    ///
    /// [`None`] is returned if the [`Currency`]s differ.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then(|| Self {
            amount: self.amount + rhs.amount,
            currency: self.currency,
        })
    }

    /// Subtracts the given [`Money`] from this one.
    ///
    /// The result may be negative. [`None`] is returned if the [`Currency`]s
    /// differ.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        (self.currency == rhs.currency).then(|| Self {
            amount: self.amount - rhs.amount,
            currency: self.currency,
        })
    }

    /// Multiplies this [`Money`] by the given number of units (days,
    /// quantity, etc).
    #[must_use]
    pub fn scaled(self, units: i64) -> Self {
        Self {
            amount: self.amount * Decimal::from(units),
            currency: self.currency,
        }
    }

    /// Clamps this [`Money`] at zero.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            amount: self.amount.max(Decimal::ZERO),
            currency: self.currency,
        }
    }

    /// Indicates whether this [`Money`] amount is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount < Decimal::ZERO
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Brazilian Real."]
        Brl = 1,

        #[doc = "US Dollar."]
        Usd = 2,

        #[doc = "Euro."]
        Eur = 3,
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn brl(s: &str) -> Money {
        Money {
            amount: decimal(s),
            currency: Currency::Brl,
        }
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45BRL").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Brl,
            },
        );

        assert_eq!(
            Money::from_str("123.45USD").unwrap(),
            Money {
                amount: decimal("123.45"),
                currency: Currency::Usd,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45Br").is_err());
        assert!(Money::from_str("123.45Brazil").is_err());

        assert!(Money::from_str("123.00BRL").is_ok());
        assert!(Money::from_str("123BRL").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(brl("123.45").to_string(), "123.45BRL");
        assert_eq!(brl("123.00").to_string(), "123BRL");
        assert_eq!(
            Money {
                amount: decimal("9.9"),
                currency: Currency::Eur,
            }
            .to_string(),
            "9.9EUR",
        );
    }

    #[test]
    fn arithmetic() {
        assert_eq!(
            brl("100").checked_add(brl("20.50")).unwrap(),
            brl("120.50"),
        );
        assert_eq!(brl("100").checked_sub(brl("150")).unwrap(), brl("-50"));
        assert!(brl("100").checked_sub(brl("150")).unwrap().is_negative());

        let usd = Money::from_str("1USD").unwrap();
        assert!(brl("1").checked_add(usd).is_none());
        assert!(brl("1").checked_sub(usd).is_none());

        assert_eq!(brl("100").scaled(3), brl("300"));
        assert_eq!(brl("-42").clamped(), brl("0"));
        assert_eq!(brl("42").clamped(), brl("42"));
    }
}
