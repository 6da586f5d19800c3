//! # Debt Repository
//!
//! Outstanding (unpaid) sales and their settlement.
//!
//! ## Settlement Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sale on credit:  total_usd = 10.00   rate_at_sale = 40   total_bs = 400│
//! │                                                                         │
//! │  rate moves to 50                                                       │
//! │                                                                         │
//! │  settle(V123, 50):  owed_bs = round(10.00 × 50) = 500.00                │
//! │                     the stored 400.00 is never used                     │
//! │                                                                         │
//! │  USD is the debt. BS is re-priced at the moment of payment.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A settlement clears every outstanding sale of one customer in one
//! transaction, or none of them.

use bodega_core::pricing::settle;
use bodega_core::validation::validate_cedula;
use bodega_core::{CoreError, DebtSettlement, DebtorSummary, ExchangeRate, OutstandingSale, Sale};
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::sale::{SaleRow, SALE_COLUMNS};
use crate::repository::{fmt_ts, now};

/// Unpaid sales, oldest first; all customers when `cedula` is `None`.
async fn fetch_unpaid<'e, E>(executor: E, cedula: Option<&str>) -> DbResult<Vec<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        SELECT {}
        FROM sales s
        WHERE s.paid = 0 AND (?1 IS NULL OR s.customer_cedula = ?1)
        ORDER BY s.customer_cedula, s.sold_at, s.id
        "#,
        SALE_COLUMNS
    );

    sqlx::query_as::<_, SaleRow>(&sql)
        .bind(cedula)
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(SaleRow::into_sale)
        .collect()
}

fn outstanding(sale: &Sale) -> OutstandingSale {
    OutstandingSale {
        sale_id: sale.id.clone(),
        sold_at: sale.sold_at,
        total_usd: sale.total_usd,
        total_bs_at_sale: sale.total_bs,
        rate_at_sale: sale.rate_at_sale,
    }
}

/// Groups unpaid sales (sorted by cedula, then date) into one summary per
/// customer. Contact details come from each customer's latest unpaid sale.
fn summarize(sales: Vec<Sale>) -> DbResult<Vec<DebtorSummary>> {
    let mut debtors: Vec<DebtorSummary> = Vec::new();

    for sale in sales {
        match debtors.last_mut() {
            Some(debtor) if debtor.customer.cedula == sale.customer.cedula => {
                debtor.sale_count += 1;
                debtor.total_usd = debtor
                    .total_usd
                    .checked_add(sale.total_usd)
                    .ok_or_else(|| {
                        CoreError::InvalidPrice(format!(
                            "debt of {} is out of range",
                            sale.customer.cedula
                        ))
                    })?;
                debtor.sales.push(outstanding(&sale));
                debtor.customer = sale.customer;
            }
            _ => debtors.push(DebtorSummary {
                sale_count: 1,
                total_usd: sale.total_usd,
                oldest_sale_at: sale.sold_at,
                sales: vec![outstanding(&sale)],
                customer: sale.customer,
            }),
        }
    }

    Ok(debtors)
}

/// Repository for customer debts.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    db: Database,
}

impl DebtRepository {
    /// Creates a new DebtRepository.
    pub fn new(db: Database) -> Self {
        DebtRepository { db }
    }

    /// Everyone who owes, ordered by cedula, with their unpaid sales.
    pub async fn outstanding(&self) -> DbResult<Vec<DebtorSummary>> {
        let sales = fetch_unpaid(self.db.pool(), None).await?;
        let debtors = summarize(sales)?;

        debug!(debtors = debtors.len(), "Listed outstanding debts");
        Ok(debtors)
    }

    /// What settling `cedula` at `rate` would charge. Writes nothing.
    pub async fn quote(&self, cedula: &str, rate: Decimal) -> DbResult<DebtSettlement> {
        let rate = ExchangeRate::new(rate)?;
        let cedula = cedula.trim();
        validate_cedula(cedula)?;

        let sales = fetch_unpaid(self.db.pool(), Some(cedula)).await?;
        let debts: Vec<OutstandingSale> = sales.iter().map(outstanding).collect();

        Ok(settle(cedula, &debts, rate)?)
    }

    /// Marks every unpaid sale of `cedula` paid, charging each sale's USD
    /// total at `rate`.
    ///
    /// ## Errors
    /// * `CoreError::InvalidRate` - `rate <= 0`
    /// * `CoreError::Validation` - blank cedula
    /// * `CoreError::NoDebt` - nothing outstanding for `cedula`
    pub async fn settle(&self, cedula: &str, rate: Decimal) -> DbResult<DebtSettlement> {
        let rate = ExchangeRate::new(rate)?;
        let cedula = cedula.trim();
        validate_cedula(cedula)?;

        debug!(cedula = %cedula, rate = %rate, "Settling debts");

        let mut tx = self.db.begin_write().await?;

        let sales = fetch_unpaid(tx.conn(), Some(cedula)).await?;
        let debts: Vec<OutstandingSale> = sales.iter().map(outstanding).collect();
        let settlement = settle(cedula, &debts, rate)?;

        let settled_at = fmt_ts(now());
        for debt in &debts {
            let owed_bs = rate.to_bs(debt.total_usd)?;

            sqlx::query(
                r#"
                UPDATE sales SET
                    paid = 1,
                    settled_at = ?2,
                    settlement_rate = ?3,
                    settled_bs_cents = ?4
                WHERE id = ?1 AND paid = 0
                "#,
            )
            .bind(&debt.sale_id)
            .bind(&settled_at)
            .bind(rate.to_string())
            .bind(owed_bs.cents())
            .execute(tx.conn())
            .await?;
        }

        tx.commit().await?;

        info!(
            cedula = %cedula,
            rate = %rate,
            count = settlement.count,
            paid_usd = %settlement.amount_paid_usd,
            paid_bs = %settlement.amount_paid_bs,
            "Debts settled"
        );

        Ok(settlement)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
