//! # Domain Types
//!
//! Core domain types used throughout Bodega.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  cedula (key)   │       │
//! │  │  code (business)│   │  customer snap  │   │  name           │       │
//! │  │  quantity       │   │  totals usd/bs  │   │  address, phone │       │
//! │  │  price_usd/bs   │   │  rate_at_sale   │   └─────────────────┘       │
//! │  └─────────────────┘   │  paid           │                              │
//! │                        └────────┬────────┘                              │
//! │                                 │ owns                                  │
//! │                        ┌────────▼────────┐   ┌─────────────────┐       │
//! │                        │    SaleItem     │   │  DebtorSummary  │       │
//! │                        │  frozen prices  │   │  unpaid sales   │       │
//! │                        └─────────────────┘   │  per cedula     │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: product `code`, customer `cedula`

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::rate::ExchangeRate;

// =============================================================================
// Product
// =============================================================================

/// A product on the shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code, unique across products.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Units on hand. Never negative.
    pub quantity: i64,

    /// Authoritative price.
    pub price_usd: Money,

    /// `price_usd` at the current rate. Recomputed on every rate or price change.
    pub price_bs: Money,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks if `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Contact details supplied with a sale or a registration.
///
/// Also used as the frozen snapshot stored on each sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub cedula: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
}

/// A registered customer, keyed by national ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    /// National ID. Immutable once created.
    pub cedula: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// One requested line of a new sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: i64,
}

/// A recorded sale header.
///
/// Customer fields and `rate_at_sale` are copied at creation and never
/// follow later edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    pub customer: CustomerInfo,
    pub total_usd: Money,
    pub total_bs: Money,
    pub rate_at_sale: ExchangeRate,
    pub sold_at: DateTime<Utc>,
    /// `false` while the sale is an outstanding debt.
    pub paid: bool,
    pub settled_at: Option<DateTime<Utc>>,
    /// Rate used when the sale was paid (equals `rate_at_sale` when paid at once).
    pub settlement_rate: Option<ExchangeRate>,
    /// BS actually collected.
    pub settled_bs: Option<Money>,
}

impl Sale {
    /// True while the sale is still owed.
    #[inline]
    pub fn is_debt(&self) -> bool {
        !self.paid
    }
}

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Code at time of sale (frozen).
    pub product_code: String,
    /// Name at time of sale (frozen).
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_usd: Money,
    pub unit_price_bs: Money,
    pub subtotal_usd: Money,
    pub subtotal_bs: Money,
}

/// Header plus items, as returned by a sale lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Reports
// =============================================================================

/// A sale row for listings, with items flattened to `"Rice (5), Beans (2)"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleListing {
    pub sale: Sale,
    pub products: String,
}

/// Sales count and totals for one bucket (day, month or year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    /// `2026-10-16`, `10` or `2026` depending on the grouping.
    pub period: String,
    pub sale_count: i64,
    pub total_usd: Money,
    pub total_bs: Money,
}

/// Per-day totals for a range plus the grand total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSummary {
    pub days: Vec<PeriodTotals>,
    pub total: GrandTotal,
}

/// Sum of every bucket in a summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrandTotal {
    pub sale_count: i64,
    pub total_usd: Money,
    pub total_bs: Money,
}

impl GrandTotal {
    /// Folds a list of buckets into one total. `None` if a sum overflows.
    pub fn of(buckets: &[PeriodTotals]) -> Option<Self> {
        buckets.iter().try_fold(GrandTotal::default(), |acc, b| {
            Some(GrandTotal {
                sale_count: acc.sale_count.checked_add(b.sale_count)?,
                total_usd: acc.total_usd.checked_add(b.total_usd)?,
                total_bs: acc.total_bs.checked_add(b.total_bs)?,
            })
        })
    }
}

// =============================================================================
// Debts
// =============================================================================

/// One unpaid sale inside a debtor summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutstandingSale {
    pub sale_id: String,
    pub sold_at: DateTime<Utc>,
    pub total_usd: Money,
    /// BS figure at sale time. Informational only; never used to settle.
    pub total_bs_at_sale: Money,
    pub rate_at_sale: ExchangeRate,
}

/// Everything one customer owes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtorSummary {
    /// Contact snapshot from the customer's most recent unpaid sale.
    pub customer: CustomerInfo,
    pub sale_count: i64,
    /// Stable USD obligation.
    pub total_usd: Money,
    pub oldest_sale_at: DateTime<Utc>,
    pub sales: Vec<OutstandingSale>,
}

/// What settling a customer's debts costs at a given rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtSettlement {
    pub cedula: String,
    pub rate: ExchangeRate,
    pub amount_paid_bs: Money,
    pub amount_paid_usd: Money,
    pub count: i64,
}

/// Calendar day helper used by the request layer for default ranges.
pub fn day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = day
        .and_hms_milli_opt(23, 59, 59, 999)
        .unwrap_or_default()
        .and_utc();
    (start, end)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket(period: &str, count: i64, usd: i64, bs: i64) -> PeriodTotals {
        PeriodTotals {
            period: period.to_string(),
            sale_count: count,
            total_usd: Money::from_cents(usd),
            total_bs: Money::from_cents(bs),
        }
    }

    #[test]
    fn test_grand_total_of_buckets() {
        let total = GrandTotal::of(&[
            bucket("2026-10-15", 2, 1500, 60000),
            bucket("2026-10-16", 1, 1000, 50000),
        ])
        .unwrap();
        assert_eq!(total.sale_count, 3);
        assert_eq!(total.total_usd.cents(), 2500);
        assert_eq!(total.total_bs.cents(), 110000);
    }

    #[test]
    fn test_grand_total_empty() {
        assert_eq!(GrandTotal::of(&[]), Some(GrandTotal::default()));
    }

    #[test]
    fn test_grand_total_overflow() {
        let buckets = [bucket("2025", 1, i64::MAX, 0), bucket("2026", 1, 1, 0)];
        assert_eq!(GrandTotal::of(&buckets), None);
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(start.to_rfc3339(), "2026-10-16T00:00:00+00:00");
        assert_eq!(end.date_naive(), day);
        assert!(end > start);
    }

    #[test]
    fn test_customer_info_optional_fields_default() {
        let info: CustomerInfo =
            serde_json::from_str(r#"{"cedula":"V123","name":"Ana"}"#).unwrap();
        assert_eq!(info.address, "");
        assert_eq!(info.phone, "");
    }
}
