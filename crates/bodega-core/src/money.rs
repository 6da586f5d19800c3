//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely in both
//! currencies the shop works with.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    2.10 * 40.35 = 84.73499999999999  (f64)                             │
//! │    → rounds to 84.73  ❌ should be 84.74                                │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Decimal Rate                             │
//! │    210 cents × 40.35 = 8473.5 → 8474 cents (half away from zero)       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Arithmetic is checked: quantities and prices come from callers, so an
//! overflow is an input error, never a wrap or a panic.
//!
//! `Money` carries no currency tag. Fields are named `*_usd` / `*_bs` and the
//! [`Currency`] enum is only used for display.
//!
//! On the wire an amount is a decimal string in major units with two places
//! (`"2.50"`), the same form `price_usd` is sent in. Input with fractional
//! cents is rejected rather than rounded.
//!
//! ## Usage
//! ```rust
//! use bodega_core::money::Money;
//!
//! let price = Money::from_cents(250);      // 2.50
//! let line = price.checked_mul(4).unwrap(); // 10.00
//! assert_eq!(line.cents(), 1000);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

// =============================================================================
// Currency
// =============================================================================

/// The two currencies every price is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Stable reference currency. Authoritative for prices and debts.
    Usd,
    /// Local currency, always derived from USD through the current rate.
    Bs,
}

impl Currency {
    /// Symbol used when formatting amounts.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Bs => "Bs ",
        }
    }
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in cents (1/100 of either USD or BS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    ///
    /// ## Example
    /// ```rust
    /// use bodega_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal amount in major units.
    ///
    /// Rounds to whole cents, half away from zero. Returns `None` when the
    /// amount does not fit in an `i64` number of cents.
    ///
    /// ## Example
    /// ```rust
    /// use bodega_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let price = Money::from_decimal(Decimal::new(2505, 3)).unwrap(); // 2.505
    /// assert_eq!(price.cents(), 251);
    /// ```
    pub fn from_decimal(amount: Decimal) -> Option<Self> {
        amount
            .checked_mul(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the value as a decimal in major units (e.g. `4.00`).
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts. `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Multiplies by a quantity. `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use bodega_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(8000); // 80.00 BS
    /// assert_eq!(unit_price.checked_mul(5).unwrap().cents(), 40000);
    /// assert!(unit_price.checked_mul(i64::MAX).is_none());
    /// ```
    #[inline]
    pub const fn checked_mul(self, qty: i64) -> Option<Money> {
        match self.0.checked_mul(qty) {
            Some(cents) => Some(Money(cents)),
            None => None,
        }
    }

    /// Sums amounts. `None` if any partial sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Money>
    where
        I: IntoIterator<Item = Money>,
    {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    /// Formats the amount with the currency symbol, e.g. `Bs 400.00`.
    pub fn format(&self, currency: Currency) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!(
            "{}{}{}.{:02}",
            sign,
            currency.symbol(),
            self.major().abs(),
            self.minor()
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain `major.minor` rendering without a currency symbol.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.to_decimal()
    }
}

/// Exact conversion from major units. Fractional cents are an error.
impl TryFrom<Decimal> for Money {
    type Error = CoreError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        if amount.normalize().scale() > 2 {
            return Err(CoreError::InvalidPrice(format!(
                "{} has more than two decimal places",
                amount
            )));
        }
        Money::from_decimal(amount)
            .ok_or_else(|| CoreError::InvalidPrice(format!("{} is out of range", amount)))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_decimal_rounds_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(2)).unwrap().cents(), 200);
        assert_eq!(Money::from_decimal(dec!(2.505)).unwrap().cents(), 251);
        assert_eq!(Money::from_decimal(dec!(2.504)).unwrap().cents(), 250);
        assert_eq!(Money::from_decimal(dec!(-1.005)).unwrap().cents(), -101);
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(Money::from_cents(40000).to_decimal(), dec!(400.00));
        assert_eq!(Money::from_cents(5).to_decimal(), dec!(0.05));
    }

    #[test]
    fn test_display_and_format() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(1000).format(Currency::Usd), "$10.00");
        assert_eq!(Money::from_cents(40000).format(Currency::Bs), "Bs 400.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(a.checked_mul(3), Some(Money::from_cents(3000)));

        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(10_000_000_000_000_000).checked_mul(1000), None);
    }

    #[test]
    fn test_checked_sum() {
        let total = Money::checked_sum([100, 250, 5].into_iter().map(Money::from_cents));
        assert_eq!(total, Some(Money::from_cents(355)));
        assert_eq!(Money::checked_sum(Vec::<Money>::new()), Some(Money::zero()));

        let huge = [i64::MAX, 1].into_iter().map(Money::from_cents);
        assert_eq!(Money::checked_sum(huge), None);
    }

    #[test]
    fn test_from_decimal_out_of_range() {
        assert_eq!(Money::from_decimal(Decimal::MAX), None);
        assert_eq!(Money::from_decimal(dec!(100000000000000000)), None);
    }

    #[test]
    fn test_wire_format_is_major_units() {
        let json = serde_json::to_string(&Money::from_cents(250)).unwrap();
        assert_eq!(json, r#""2.50""#);
        assert_eq!(serde_json::to_string(&Money::from_cents(-5)).unwrap(), r#""-0.05""#);

        let back: Money = serde_json::from_str(r#""2.50""#).unwrap();
        assert_eq!(back.cents(), 250);
        let whole: Money = serde_json::from_str(r#""40""#).unwrap();
        assert_eq!(whole.cents(), 4000);

        assert!(serde_json::from_str::<Money>(r#""2.505""#).is_err());
        assert!(serde_json::from_str::<Money>(r#""100000000000000000""#).is_err());
    }
}
