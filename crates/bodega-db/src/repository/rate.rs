//! # Rate Repository
//!
//! The shop's single exchange rate, stored as decimal text in `config`.
//!
//! ## Rate Change
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set(50)                                                                │
//! │    │                                                                    │
//! │    ├── reject rate <= 0 (nothing written)                               │
//! │    ├── write gate + BEGIN                                               │
//! │    ├── UPDATE config SET value = '50'                                   │
//! │    ├── for every product: price_bs = round(price_usd × 50)              │
//! │    └── COMMIT                                                           │
//! │                                                                         │
//! │  A sale waiting on the gate sees either every old BS price or every     │
//! │  new one, never a mix.                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::{ExchangeRate, Money};
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite, SqliteConnection};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::{fmt_ts, now, parse_rate};

const RATE_KEY: &str = "exchange_rate";

/// Reads the current rate through any executor (pool or open transaction).
///
/// A missing row reads as 1.
pub(crate) async fn current_rate<'e, E>(executor: E) -> DbResult<ExchangeRate>
where
    E: Executor<'e, Database = Sqlite>,
{
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM config WHERE key = ?1")
        .bind(RATE_KEY)
        .fetch_optional(executor)
        .await?;

    match raw {
        Some(raw) => parse_rate(&raw),
        None => Ok(ExchangeRate::one()),
    }
}

/// Recomputes every product's BS price at `rate`. Returns how many changed.
pub(crate) async fn reprice_all(conn: &mut SqliteConnection, rate: ExchangeRate) -> DbResult<u64> {
    let prices: Vec<(String, i64)> =
        sqlx::query_as("SELECT id, price_usd_cents FROM products ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;

    let updated_at = fmt_ts(now());
    let mut repriced = 0;

    for (id, usd_cents) in prices {
        let price_bs = rate.to_bs(Money::from_cents(usd_cents))?;
        sqlx::query("UPDATE products SET price_bs_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&id)
            .bind(price_bs.cents())
            .bind(&updated_at)
            .execute(&mut *conn)
            .await?;
        repriced += 1;
    }

    Ok(repriced)
}

/// Repository for the exchange rate.
#[derive(Debug, Clone)]
pub struct RateRepository {
    db: Database,
}

impl RateRepository {
    /// Creates a new RateRepository.
    pub fn new(db: Database) -> Self {
        RateRepository { db }
    }

    /// Returns the current rate (1 if never set).
    pub async fn get(&self) -> DbResult<ExchangeRate> {
        current_rate(self.db.pool()).await
    }

    /// Stores a new rate and re-prices every product in the same transaction.
    ///
    /// ## Returns
    /// * `Ok(ExchangeRate)` - The rate now in effect
    /// * `Err(DbError::Rule(CoreError::InvalidRate))` - `value <= 0`
    pub async fn set(&self, value: Decimal) -> DbResult<ExchangeRate> {
        let rate = ExchangeRate::new(value)?;

        debug!(rate = %rate, "Setting exchange rate");

        let mut tx = self.db.begin_write().await?;

        sqlx::query(
            r#"
            INSERT INTO config (key, value) VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(RATE_KEY)
        .bind(rate.to_string())
        .execute(tx.conn())
        .await?;

        let repriced = reprice_all(tx.conn(), rate).await?;

        tx.commit().await?;

        info!(rate = %rate, repriced, "Exchange rate updated");
        Ok(rate)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
