//! # Sale Commands
//!
//! Recording sales and querying them.
//!
//! ## Query Types
//! ```text
//! ┌────────────┬──────────────────────────────┬──────────────────────────┐
//! │ type       │ parameters                   │ data                     │
//! ├────────────┼──────────────────────────────┼──────────────────────────┤
//! │ raw        │ start, end (default: today)  │ sales, newest first      │
//! │ summary    │ start, end (default: today)  │ per-day totals + total   │
//! │ monthly    │ year (default: this year)    │ per-month totals         │
//! │ annual     │                              │ per-year totals          │
//! └────────────┴──────────────────────────────┴──────────────────────────┘
//! ```

use bodega_core::{
    day_bounds, CustomerInfo, PeriodTotals, RangeSummary, SaleDetail, SaleLine, SaleListing,
};
use bodega_db::Database;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::product::required;
use crate::error::{ApiError, ApiResult};

/// Body of `create_sale`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSaleRequest {
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub items: Vec<SaleLine>,
    /// `false` records the sale as a debt. Defaults to paid.
    pub pay_now: Option<bool>,
}

/// Body of `query_sales`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SalesQuery {
    Raw {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    Summary {
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    },
    Monthly {
        year: Option<i32>,
    },
    Annual,
}

/// Payload of `query_sales`, shaped by the query type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SalesReport {
    Raw(Vec<SaleListing>),
    Summary(RangeSummary),
    Periods(Vec<PeriodTotals>),
}

/// Body of `get_sale` and `delete_sale`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaleIdRequest {
    pub id: Option<String>,
}

/// Fills missing range bounds with the start/end of the current UTC day.
fn range_or_today(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let (day_start, day_end) = day_bounds(Utc::now().date_naive());
    (start.unwrap_or(day_start), end.unwrap_or(day_end))
}

/// Records a sale.
pub async fn create_sale(db: &Database, req: CreateSaleRequest) -> ApiResult<SaleDetail> {
    let customer = req.customer.ok_or_else(|| ApiError::missing("customer"))?;
    if req.items.is_empty() {
        return Err(ApiError::missing("items"));
    }

    debug!(cedula = %customer.cedula, items = req.items.len(), "create_sale");

    Ok(db
        .sales()
        .create(&customer, &req.items, req.pay_now.unwrap_or(true))
        .await?)
}

/// Runs one of the sales queries.
pub async fn query_sales(db: &Database, query: SalesQuery) -> ApiResult<SalesReport> {
    let reports = db.reports();

    let report = match query {
        SalesQuery::Raw { start, end } => {
            let (start, end) = range_or_today(start, end);
            SalesReport::Raw(reports.sales_in_range(start, end).await?)
        }
        SalesQuery::Summary { start, end } => {
            let (start, end) = range_or_today(start, end);
            SalesReport::Summary(reports.summary_in_range(start, end).await?)
        }
        SalesQuery::Monthly { year } => {
            let year = year.unwrap_or_else(|| Utc::now().year());
            SalesReport::Periods(reports.monthly_summary(year).await?)
        }
        SalesQuery::Annual => SalesReport::Periods(reports.annual_summary().await?),
    };

    Ok(report)
}

/// A sale with its items.
pub async fn get_sale(db: &Database, req: SaleIdRequest) -> ApiResult<SaleDetail> {
    let id = required(req.id, "id")?;
    Ok(db.sales().detail(&id).await?)
}

/// Deletes a sale and its items.
pub async fn delete_sale(db: &Database, req: SaleIdRequest) -> ApiResult<()> {
    let id = required(req.id, "id")?;
    Ok(db.sales().delete(&id).await?)
}
