//! # Report Repository
//!
//! Read-only views over recorded sales. Totals come from the sale headers,
//! never from re-pricing items, so history stays fixed after price or rate
//! changes. Ranges are inclusive at both ends.

use std::collections::HashMap;

use bodega_core::{CoreError, GrandTotal, Money, PeriodTotals, RangeSummary, SaleListing};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use crate::repository::fmt_ts;
use crate::repository::sale::{SaleRow, SALE_COLUMNS};

#[derive(Debug, FromRow)]
struct PeriodRow {
    period: String,
    sale_count: i64,
    total_usd_cents: i64,
    total_bs_cents: i64,
}

impl From<PeriodRow> for PeriodTotals {
    fn from(row: PeriodRow) -> Self {
        PeriodTotals {
            period: row.period,
            sale_count: row.sale_count,
            total_usd: Money::from_cents(row.total_usd_cents),
            total_bs: Money::from_cents(row.total_bs_cents),
        }
    }
}

#[derive(Debug, FromRow)]
struct ItemLabelRow {
    sale_id: String,
    product_name: String,
    quantity: i64,
}

/// Repository for sales reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales in `[start, end]`, newest first, with their items flattened to
    /// `"Rice (5), Oil (3)"` in the order they were rung up.
    pub async fn sales_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<SaleListing>> {
        let (start, end) = (fmt_ts(start), fmt_ts(end));

        debug!(start = %start, end = %end, "Listing sales");

        let sql = format!(
            r#"
            SELECT {}
            FROM sales s
            WHERE s.sold_at BETWEEN ?1 AND ?2
            ORDER BY s.sold_at DESC, s.id
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, SaleRow>(&sql)
            .bind(&start)
            .bind(&end)
            .fetch_all(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, ItemLabelRow>(
            r#"
            SELECT si.sale_id, si.product_name, si.quantity
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.sold_at BETWEEN ?1 AND ?2
            ORDER BY si.sale_id, si.line_no
            "#,
        )
        .bind(&start)
        .bind(&end)
        .fetch_all(&self.pool)
        .await?;

        let mut labels: HashMap<String, Vec<String>> = HashMap::new();
        for item in items {
            labels
                .entry(item.sale_id)
                .or_default()
                .push(format!("{} ({})", item.product_name, item.quantity));
        }

        sales
            .into_iter()
            .map(|row| {
                let sale = row.into_sale()?;
                let products = labels.remove(&sale.id).unwrap_or_default().join(", ");
                Ok(SaleListing { sale, products })
            })
            .collect()
    }

    /// Per-day totals for `[start, end]`, latest day first, plus the grand
    /// total.
    pub async fn summary_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<RangeSummary> {
        let days: Vec<PeriodTotals> = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT
                DATE(sold_at)        AS period,
                COUNT(*)             AS sale_count,
                SUM(total_usd_cents) AS total_usd_cents,
                SUM(total_bs_cents)  AS total_bs_cents
            FROM sales
            WHERE sold_at BETWEEN ?1 AND ?2
            GROUP BY period
            ORDER BY period DESC
            "#,
        )
        .bind(fmt_ts(start))
        .bind(fmt_ts(end))
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(PeriodTotals::from)
        .collect();

        let total = GrandTotal::of(&days).ok_or_else(|| {
            CoreError::InvalidPrice("summary total is out of range".to_string())
        })?;
        Ok(RangeSummary { days, total })
    }

    /// Totals per month (`"01"`..`"12"`) of `year`, latest month first.
    pub async fn monthly_summary(&self, year: i32) -> DbResult<Vec<PeriodTotals>> {
        let rows = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT
                strftime('%m', sold_at) AS period,
                COUNT(*)                AS sale_count,
                SUM(total_usd_cents)    AS total_usd_cents,
                SUM(total_bs_cents)     AS total_bs_cents
            FROM sales
            WHERE strftime('%Y', sold_at) = ?1
            GROUP BY period
            ORDER BY period DESC
            "#,
        )
        .bind(format!("{:04}", year))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PeriodTotals::from).collect())
    }

    /// Totals per year over all recorded history, latest year first.
    pub async fn annual_summary(&self) -> DbResult<Vec<PeriodTotals>> {
        let rows = sqlx::query_as::<_, PeriodRow>(
            r#"
            SELECT
                strftime('%Y', sold_at) AS period,
                COUNT(*)                AS sale_count,
                SUM(total_usd_cents)    AS total_usd_cents,
                SUM(total_bs_cents)     AS total_bs_cents
            FROM sales
            GROUP BY period
            ORDER BY period DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PeriodTotals::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
