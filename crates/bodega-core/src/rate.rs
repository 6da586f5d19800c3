//! # Exchange Rate
//!
//! The single BS-per-USD rate the whole shop prices against.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_usd (authoritative)  ──× rate──►  price_bs (derived, rounded)   │
//! │                                                                         │
//! │  rate changes ──► every product's price_bs is recomputed               │
//! │  sale created ──► rate copied into sale.rate_at_sale                   │
//! │  debt settled ──► BS owed recomputed at the settlement rate            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

/// BS per one USD. Always strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    /// Creates a rate, rejecting zero and negative values.
    ///
    /// ## Example
    /// ```rust
    /// use bodega_core::rate::ExchangeRate;
    /// use rust_decimal::Decimal;
    ///
    /// assert!(ExchangeRate::new(Decimal::from(40)).is_ok());
    /// assert!(ExchangeRate::new(Decimal::ZERO).is_err());
    /// ```
    pub fn new(value: Decimal) -> CoreResult<Self> {
        if value <= Decimal::ZERO {
            return Err(CoreError::InvalidRate(value.to_string()));
        }
        Ok(ExchangeRate(value.normalize()))
    }

    /// The rate used before anyone sets one.
    pub const fn one() -> Self {
        ExchangeRate(Decimal::ONE)
    }

    /// Returns the raw decimal value.
    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Converts a USD amount to BS at this rate, rounded to whole cents
    /// (half away from zero).
    ///
    /// ## Example
    /// ```rust
    /// use bodega_core::money::Money;
    /// use bodega_core::rate::ExchangeRate;
    /// use rust_decimal::Decimal;
    ///
    /// let rate = ExchangeRate::new(Decimal::from(40)).unwrap();
    /// let bs = rate.to_bs(Money::from_cents(200)).unwrap();
    /// assert_eq!(bs.cents(), 8000);
    /// ```
    pub fn to_bs(&self, usd: Money) -> CoreResult<Money> {
        Decimal::from(usd.cents())
            .checked_mul(self.0)
            .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|cents| cents.to_i64())
            .map(Money::from_cents)
            .ok_or_else(|| CoreError::InvalidPrice(format!("{} USD at rate {} overflows", usd, self)))
    }
}

impl Default for ExchangeRate {
    fn default() -> Self {
        ExchangeRate::one()
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for ExchangeRate {
    type Error = CoreError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        ExchangeRate::new(value)
    }
}

impl From<ExchangeRate> for Decimal {
    fn from(rate: ExchangeRate) -> Self {
        rate.0
    }
}

/// Parses the textual form stored in the `config` table.
impl FromStr for ExchangeRate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| CoreError::InvalidRate(s.to_string()))?;
        ExchangeRate::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rejects_non_positive() {
        assert!(matches!(
            ExchangeRate::new(dec!(0)),
            Err(CoreError::InvalidRate(_))
        ));
        assert!(matches!(
            ExchangeRate::new(dec!(-3.5)),
            Err(CoreError::InvalidRate(_))
        ));
    }

    #[test]
    fn test_default_is_one() {
        assert_eq!(ExchangeRate::default().value(), dec!(1));
    }

    #[test]
    fn test_to_bs_rounds_to_cents() {
        let rate = ExchangeRate::new(dec!(40.35)).unwrap();
        // 2.10 × 40.35 = 84.735 → 84.74
        assert_eq!(rate.to_bs(Money::from_cents(210)).unwrap().cents(), 8474);

        let rate = ExchangeRate::new(dec!(50)).unwrap();
        assert_eq!(rate.to_bs(Money::from_cents(1000)).unwrap().cents(), 50000);
    }

    #[test]
    fn test_to_bs_overflow_is_an_error() {
        let rate = ExchangeRate::new(dec!(1000000000000)).unwrap();
        assert!(matches!(
            rate.to_bs(Money::from_cents(i64::MAX)),
            Err(CoreError::InvalidPrice(_))
        ));

        let huge = ExchangeRate::new(Decimal::MAX).unwrap();
        assert!(huge.to_bs(Money::from_cents(i64::MAX)).is_err());
    }

    #[test]
    fn test_parse_round_trip_text() {
        let rate: ExchangeRate = "36.5800".parse().unwrap();
        assert_eq!(rate.to_string(), "36.58");
        assert!("abc".parse::<ExchangeRate>().is_err());
        assert!("-1".parse::<ExchangeRate>().is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: ExchangeRate = serde_json::from_str("\"45.5\"").unwrap();
        assert_eq!(ok.value(), dec!(45.5));
        assert!(serde_json::from_str::<ExchangeRate>("\"0\"").is_err());
    }
}
