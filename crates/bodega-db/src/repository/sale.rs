//! # Sale Repository
//!
//! Records sales atomically: stock check, pricing, header, items and stock
//! decrements all happen in one gated transaction.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        create(customer, lines, pay_now)                 │
//! │                                                                         │
//! │  1. Validate customer + lines             (nothing open yet)            │
//! │  2. Write gate + BEGIN                                                  │
//! │  3. Snapshot rate                         rate_at_sale                  │
//! │  4. Load every product, in request order  ProductNotFound               │
//! │  5. draft_sale                            InsufficientStock             │
//! │         │  per-line subtotals, totals = Σ subtotals                     │
//! │         ▼                                                               │
//! │  6. Upsert customer                                                     │
//! │  7. INSERT sales, INSERT sale_items (line_no keeps request order)       │
//! │  8. UPDATE products SET quantity = quantity - n                         │
//! │  9. COMMIT                                                              │
//! │                                                                         │
//! │  Any error before 9 drops the transaction: no rows, no stock change.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Customer contact fields, product code/name and unit prices are copied
//! into the sale rows. Later product, customer or rate changes do not touch
//! recorded sales.

use bodega_core::pricing::draft_sale;
use bodega_core::validation::{validate_customer, validate_sale_lines};
use bodega_core::{
    CoreError, CustomerInfo, Money, Product, Sale, SaleDetail, SaleItem, SaleLine,
};
use sqlx::{Executor, FromRow, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::customer::upsert_in;
use crate::repository::product::fetch_product;
use crate::repository::rate::current_rate;
use crate::repository::{fmt_ts, now, parse_opt_rate, parse_opt_ts, parse_rate, parse_ts};

/// Columns read into [`SaleRow`], qualified for use in joins.
pub(crate) const SALE_COLUMNS: &str = r#"
    s.id, s.customer_cedula, s.customer_name, s.customer_address, s.customer_phone,
    s.total_usd_cents, s.total_bs_cents, s.rate_at_sale, s.sold_at, s.paid,
    s.settled_at, s.settlement_rate, s.settled_bs_cents
"#;

/// Raw `sales` row.
#[derive(Debug, FromRow)]
pub(crate) struct SaleRow {
    id: String,
    customer_cedula: String,
    customer_name: String,
    customer_address: String,
    customer_phone: String,
    total_usd_cents: i64,
    total_bs_cents: i64,
    rate_at_sale: String,
    sold_at: String,
    paid: bool,
    settled_at: Option<String>,
    settlement_rate: Option<String>,
    settled_bs_cents: Option<i64>,
}

impl SaleRow {
    pub(crate) fn into_sale(self) -> DbResult<Sale> {
        Ok(Sale {
            id: self.id,
            customer: CustomerInfo {
                cedula: self.customer_cedula,
                name: self.customer_name,
                address: self.customer_address,
                phone: self.customer_phone,
            },
            total_usd: Money::from_cents(self.total_usd_cents),
            total_bs: Money::from_cents(self.total_bs_cents),
            rate_at_sale: parse_rate(&self.rate_at_sale)?,
            sold_at: parse_ts(&self.sold_at)?,
            paid: self.paid,
            settled_at: parse_opt_ts(self.settled_at.as_deref())?,
            settlement_rate: parse_opt_rate(self.settlement_rate.as_deref())?,
            settled_bs: self.settled_bs_cents.map(Money::from_cents),
        })
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    id: String,
    sale_id: String,
    product_id: String,
    product_code: String,
    product_name: String,
    quantity: i64,
    unit_price_usd_cents: i64,
    unit_price_bs_cents: i64,
    subtotal_usd_cents: i64,
    subtotal_bs_cents: i64,
}

impl From<SaleItemRow> for SaleItem {
    fn from(row: SaleItemRow) -> Self {
        SaleItem {
            id: row.id,
            sale_id: row.sale_id,
            product_id: row.product_id,
            product_code: row.product_code,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price_usd: Money::from_cents(row.unit_price_usd_cents),
            unit_price_bs: Money::from_cents(row.unit_price_bs_cents),
            subtotal_usd: Money::from_cents(row.subtotal_usd_cents),
            subtotal_bs: Money::from_cents(row.subtotal_bs_cents),
        }
    }
}

async fn fetch_sale<'e, E>(executor: E, id: &str) -> DbResult<Option<Sale>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM sales s WHERE s.id = ?1", SALE_COLUMNS);
    sqlx::query_as::<_, SaleRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .map(SaleRow::into_sale)
        .transpose()
}

async fn fetch_items<'e, E>(executor: E, sale_id: &str) -> DbResult<Vec<SaleItem>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, SaleItemRow>(
        r#"
        SELECT
            id, sale_id, product_id, product_code, product_name, quantity,
            unit_price_usd_cents, unit_price_bs_cents,
            subtotal_usd_cents, subtotal_bs_cents
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY line_no
        "#,
    )
    .bind(sale_id)
    .fetch_all(executor)
    .await?;

    Ok(rows.into_iter().map(SaleItem::from).collect())
}

/// Repository for sales.
///
/// ## Usage
/// ```rust,ignore
/// let detail = db.sales().create(&customer, &lines, false).await?;
/// let again = db.sales().detail(&detail.sale.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SaleRepository {
    db: Database,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(db: Database) -> Self {
        SaleRepository { db }
    }

    /// Records a sale.
    ///
    /// `pay_now = false` leaves the sale outstanding as a debt of
    /// `customer.cedula`.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - missing cedula/name, empty lines
    /// * `CoreError::InvalidQuantity` - a line with quantity <= 0
    /// * `CoreError::ProductNotFound` - unknown product id
    /// * `CoreError::InsufficientStock` - total requested exceeds stock
    pub async fn create(
        &self,
        customer: &CustomerInfo,
        lines: &[SaleLine],
        pay_now: bool,
    ) -> DbResult<SaleDetail> {
        validate_customer(customer)?;
        validate_sale_lines(lines)?;

        debug!(
            cedula = %customer.cedula,
            lines = lines.len(),
            pay_now,
            "Creating sale"
        );

        let mut tx = self.db.begin_write().await?;

        let rate = current_rate(tx.conn()).await?;

        let mut products: Vec<Product> = Vec::with_capacity(lines.len());
        for line in lines {
            let product = fetch_product(tx.conn(), line.product_id.trim())
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            products.push(product);
        }

        let priced: Vec<(&Product, i64)> = products
            .iter()
            .zip(lines)
            .map(|(product, line)| (product, line.quantity))
            .collect();
        let draft = draft_sale(&priced)?;

        let customer_id = upsert_in(tx.conn(), customer).await?;

        let sold_at = now();
        let snapshot = CustomerInfo {
            cedula: customer.cedula.trim().to_string(),
            name: customer.name.trim().to_string(),
            address: customer.address.trim().to_string(),
            phone: customer.phone.trim().to_string(),
        };

        let sale = Sale {
            id: Uuid::new_v4().to_string(),
            customer: snapshot,
            total_usd: draft.total_usd,
            total_bs: draft.total_bs,
            rate_at_sale: rate,
            sold_at,
            paid: pay_now,
            settled_at: pay_now.then_some(sold_at),
            settlement_rate: pay_now.then_some(rate),
            settled_bs: pay_now.then_some(draft.total_bs),
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, customer_id,
                customer_cedula, customer_name, customer_address, customer_phone,
                total_usd_cents, total_bs_cents, rate_at_sale, sold_at,
                paid, settled_at, settlement_rate, settled_bs_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&sale.id)
        .bind(customer_id)
        .bind(&sale.customer.cedula)
        .bind(&sale.customer.name)
        .bind(&sale.customer.address)
        .bind(&sale.customer.phone)
        .bind(sale.total_usd.cents())
        .bind(sale.total_bs.cents())
        .bind(sale.rate_at_sale.to_string())
        .bind(fmt_ts(sale.sold_at))
        .bind(sale.paid)
        .bind(sale.settled_at.map(fmt_ts))
        .bind(sale.settlement_rate.map(|r| r.to_string()))
        .bind(sale.settled_bs.map(|m| m.cents()))
        .execute(tx.conn())
        .await?;

        let mut items = Vec::with_capacity(draft.items.len());
        for (line_no, item) in draft.items.into_iter().enumerate() {
            let item = SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                product_id: item.product_id,
                product_code: item.product_code,
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price_usd: item.unit_price_usd,
                unit_price_bs: item.unit_price_bs,
                subtotal_usd: item.subtotal_usd,
                subtotal_bs: item.subtotal_bs,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, product_id, line_no,
                    product_code, product_name, quantity,
                    unit_price_usd_cents, unit_price_bs_cents,
                    subtotal_usd_cents, subtotal_bs_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.product_id)
            .bind(line_no as i64)
            .bind(&item.product_code)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price_usd.cents())
            .bind(item.unit_price_bs.cents())
            .bind(item.subtotal_usd.cents())
            .bind(item.subtotal_bs.cents())
            .execute(tx.conn())
            .await?;

            sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity - ?2, updated_at = ?3
                WHERE id = ?1
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(fmt_ts(sold_at))
            .execute(tx.conn())
            .await?;

            items.push(item);
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            cedula = %sale.customer.cedula,
            total_usd = %sale.total_usd,
            total_bs = %sale.total_bs,
            rate = %sale.rate_at_sale,
            paid = sale.paid,
            "Sale recorded"
        );

        Ok(SaleDetail { sale, items })
    }

    /// Gets a sale header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        fetch_sale(self.db.pool(), id).await
    }

    /// Gets the items of a sale in their original order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        fetch_items(self.db.pool(), sale_id).await
    }

    /// Gets a sale header and its items.
    pub async fn detail(&self, id: &str) -> DbResult<SaleDetail> {
        let sale = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = self.items(id).await?;
        Ok(SaleDetail { sale, items })
    }

    /// Deletes a sale; its items go with it. Stock is not restored.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting sale");

        let mut tx = self.db.begin_write().await?;

        let result = sqlx::query("DELETE FROM sales WHERE id = ?1")
            .bind(id)
            .execute(tx.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::SaleNotFound(id.to_string()).into());
        }

        tx.commit().await?;

        info!(id = %id, "Sale deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::DbConfig;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.rates().set(dec!(40)).await.unwrap();
        db
    }

    fn ana() -> CustomerInfo {
        CustomerInfo {
            cedula: "V123".to_string(),
            name: "Ana".to_string(),
            ..Default::default()
        }
    }

    fn line(product: &Product, quantity: i64) -> SaleLine {
        SaleLine {
            product_id: product.id.clone(),
            quantity,
        }
    }

    async fn sale_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_sale_totals_and_stock() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 100, dec!(2)).await.unwrap();
        let oil = db.products().create("B2", "Oil", 10, dec!(3.33)).await.unwrap();

        let detail = db
            .sales()
            .create(&ana(), &[line(&rice, 5), line(&oil, 3)], true)
            .await
            .unwrap();

        let sale = &detail.sale;
        assert_eq!(sale.total_usd.cents(), 1000 + 999);
        assert_eq!(sale.total_bs.cents(), 40000 + 39960);
        assert_eq!(sale.rate_at_sale.value(), dec!(40));
        assert!(sale.paid);
        assert_eq!(sale.settled_bs, Some(sale.total_bs));
        assert_eq!(sale.settlement_rate, Some(sale.rate_at_sale));

        let usd = Money::checked_sum(detail.items.iter().map(|i| i.subtotal_usd)).unwrap();
        let bs = Money::checked_sum(detail.items.iter().map(|i| i.subtotal_bs)).unwrap();
        assert_eq!(usd, sale.total_usd);
        assert_eq!(bs, sale.total_bs);

        assert_eq!(db.products().get_by_id(&rice.id).await.unwrap().unwrap().quantity, 95);
        assert_eq!(db.products().get_by_id(&oil.id).await.unwrap().unwrap().quantity, 7);

        let stored = db.sales().detail(&sale.id).await.unwrap();
        assert_eq!(stored, detail);
        assert_eq!(stored.items[0].product_code, "A1");
        assert_eq!(stored.items[1].product_code, "B2");
    }

    #[tokio::test]
    async fn test_failed_line_leaves_no_trace() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 100, dec!(2)).await.unwrap();
        let oil = db.products().create("B2", "Oil", 2, dec!(3)).await.unwrap();

        let err = db
            .sales()
            .create(&ana(), &[line(&rice, 5), line(&oil, 3)], true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        assert_eq!(db.products().get_by_id(&rice.id).await.unwrap().unwrap().quantity, 100);
        assert_eq!(db.products().get_by_id(&oil.id).await.unwrap().unwrap().quantity, 2);
        assert_eq!(sale_count(&db).await, 0);
        assert!(db.customers().get_by_cedula("V123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_product_rejected() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 100, dec!(2)).await.unwrap();

        let lines = [
            line(&rice, 1),
            SaleLine {
                product_id: "ghost".to_string(),
                quantity: 1,
            },
        ];
        assert!(matches!(
            db.sales().create(&ana(), &lines, true).await,
            Err(DbError::Rule(CoreError::ProductNotFound(ref id))) if id == "ghost"
        ));
        assert_eq!(sale_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_requests_rejected() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 100, dec!(2)).await.unwrap();
        let sales = db.sales();

        assert!(matches!(
            sales.create(&ana(), &[line(&rice, 0)], true).await,
            Err(DbError::Rule(CoreError::InvalidQuantity(_)))
        ));
        assert!(matches!(
            sales.create(&ana(), &[], true).await,
            Err(DbError::Rule(CoreError::Validation(_)))
        ));

        let anonymous = CustomerInfo {
            cedula: String::new(),
            ..ana()
        };
        assert!(matches!(
            sales.create(&anonymous, &[line(&rice, 1)], true).await,
            Err(DbError::Rule(CoreError::Validation(_)))
        ));
    }

    #[tokio::test]
    async fn test_credit_sale_is_outstanding() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 100, dec!(2)).await.unwrap();

        let detail = db.sales().create(&ana(), &[line(&rice, 5)], false).await.unwrap();
        assert!(detail.sale.is_debt());
        assert_eq!(detail.sale.settled_at, None);
        assert_eq!(detail.sale.settled_bs, None);

        let customer = db.customers().get_by_cedula("V123").await.unwrap().unwrap();
        assert_eq!(customer.name, "Ana");
    }

    #[tokio::test]
    async fn test_recorded_sale_ignores_later_changes() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 100, dec!(2)).await.unwrap();
        let detail = db.sales().create(&ana(), &[line(&rice, 5)], true).await.unwrap();

        db.rates().set(dec!(50)).await.unwrap();
        db.products().receive_stock(&rice.id, 10, dec!(3)).await.unwrap();
        db.customers()
            .upsert(&CustomerInfo {
                name: "Ana Pérez".to_string(),
                ..ana()
            })
            .await
            .unwrap();

        let stored = db.sales().detail(&detail.sale.id).await.unwrap();
        assert_eq!(stored, detail);
        assert_eq!(stored.sale.customer.name, "Ana");
        assert_eq!(stored.items[0].unit_price_bs.cents(), 8000);
    }

    #[tokio::test]
    async fn test_delete_cascades_without_restoring_stock() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 100, dec!(2)).await.unwrap();
        let detail = db.sales().create(&ana(), &[line(&rice, 5)], true).await.unwrap();

        db.sales().delete(&detail.sale.id).await.unwrap();

        assert!(db.sales().get_by_id(&detail.sale.id).await.unwrap().is_none());
        assert!(db.sales().items(&detail.sale.id).await.unwrap().is_empty());
        assert_eq!(db.products().get_by_id(&rice.id).await.unwrap().unwrap().quantity, 95);

        assert!(matches!(
            db.sales().delete(&detail.sale.id).await,
            Err(DbError::Rule(CoreError::SaleNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_overflowing_lines_are_rejected() {
        let db = setup().await;
        let rice = db.products().create("A1", "Rice", 5, dec!(2)).await.unwrap();

        let err = db
            .sales()
            .create(&ana(), &[line(&rice, 1), line(&rice, i64::MAX)], true)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::InvalidQuantity(_))));

        let gold = db
            .products()
            .create("G1", "Gold", 5000, dec!(100000000000000))
            .await
            .unwrap();
        let err = db
            .sales()
            .create(&ana(), &[line(&gold, 1000)], true)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Rule(CoreError::InvalidPrice(_))));

        assert_eq!(db.products().get_by_id(&rice.id).await.unwrap().unwrap().quantity, 5);
        assert_eq!(db.products().get_by_id(&gold.id).await.unwrap().unwrap().quantity, 5000);
        assert_eq!(sale_count(&db).await, 0);
    }

    /// A file database with a real multi-connection pool.
    async fn pooled(dir: &tempfile::TempDir) -> Database {
        let config = DbConfig::new(dir.path().join("bodega.db")).max_connections(8);
        let db = Database::new(config).await.unwrap();
        db.rates().set(dec!(40)).await.unwrap();
        db
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_cannot_oversell() {
        let dir = tempfile::tempdir().unwrap();
        let db = pooled(&dir).await;
        let rice = db.products().create("A1", "Rice", 5, dec!(2)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            let lines = vec![line(&rice, 2)];
            handles.push(tokio::spawn(async move {
                db.sales().create(&ana(), &lines, true).await
            }));
        }

        let mut sold = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => sold += 1,
                Err(DbError::Rule(CoreError::InsufficientStock { .. })) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(sold, 2);
        assert_eq!(db.products().get_by_id(&rice.id).await.unwrap().unwrap().quantity, 1);
        assert_eq!(sale_count(&db).await, 2);

        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rate_change_never_splits_a_sale() {
        let dir = tempfile::tempdir().unwrap();
        let db = pooled(&dir).await;
        let rice = db.products().create("A1", "Rice", 1000, dec!(2)).await.unwrap();
        let oil = db.products().create("B2", "Oil", 1000, dec!(3.33)).await.unwrap();

        let mut sales = Vec::new();
        let mut rates = Vec::new();
        for n in 0..20i64 {
            let sale_db = db.clone();
            let lines = vec![line(&rice, 1), line(&oil, 1)];
            sales.push(tokio::spawn(async move {
                sale_db.sales().create(&ana(), &lines, true).await
            }));

            if n % 2 == 0 {
                let db = db.clone();
                rates.push(tokio::spawn(async move {
                    db.rates().set(Decimal::from(41 + n)).await
                }));
            }
        }

        for handle in rates {
            handle.await.unwrap().unwrap();
        }

        let mut ids = Vec::new();
        for handle in sales {
            ids.push(handle.await.unwrap().unwrap().sale.id);
        }

        for id in ids {
            let detail = db.sales().detail(&id).await.unwrap();
            let rate = detail.sale.rate_at_sale;
            for item in &detail.items {
                assert_eq!(item.unit_price_bs, rate.to_bs(item.unit_price_usd).unwrap());
            }
        }

        db.close().await;
    }
}
