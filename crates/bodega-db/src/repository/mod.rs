//! # Repository Module
//!
//! Storage operations for Bodega, one repository per concern.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Request layer                                                          │
//! │       │  db.sales().create(customer, lines, pay_now)                    │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── take write gate, BEGIN                                             │
//! │  ├── load rate + products through the transaction                       │
//! │  ├── bodega_core::pricing::draft_sale(...)   ← pure rules               │
//! │  ├── INSERT sale, items; UPDATE stock                                   │
//! │  └── COMMIT (or drop → ROLLBACK)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RateRepository`](rate::RateRepository) - Exchange rate store
//! - [`ProductRepository`](product::ProductRepository) - Inventory ledger
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer lookup and upsert
//! - [`SaleRepository`](sale::SaleRepository) - Sale creation, lookup, deletion
//! - [`ReportRepository`](report::ReportRepository) - Sales listings and summaries
//! - [`DebtRepository`](debt::DebtRepository) - Outstanding debts and settlement

use bodega_core::ExchangeRate;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

use crate::error::{DbError, DbResult};

pub mod customer;
pub mod debt;
pub mod product;
pub mod rate;
pub mod report;
pub mod sale;

// =============================================================================
// Column Codecs
// =============================================================================

/// Current time at the precision timestamps are stored with.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Stored timestamp form: `2026-10-16T12:00:00.123Z`.
///
/// Fixed width, so string comparison in SQL orders correctly.
pub(crate) fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(raw: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| DbError::CorruptRow(format!("bad timestamp '{}': {}", raw, e)))
}

pub(crate) fn parse_opt_ts(raw: Option<&str>) -> DbResult<Option<DateTime<Utc>>> {
    raw.map(parse_ts).transpose()
}

pub(crate) fn parse_rate(raw: &str) -> DbResult<ExchangeRate> {
    raw.parse()
        .map_err(|_| DbError::CorruptRow(format!("bad exchange rate '{}'", raw)))
}

pub(crate) fn parse_opt_rate(raw: Option<&str>) -> DbResult<Option<ExchangeRate>> {
    raw.map(parse_rate).transpose()
}
