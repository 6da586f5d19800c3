//! # Product Repository
//!
//! The inventory ledger: products, stock levels and prices.
//!
//! ## Price Columns
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  price_usd_cents   authoritative, only ever raised by a restock         │
//! │  price_bs_cents    round(price_usd × rate), rewritten whenever the      │
//! │                    USD price or the rate changes                        │
//! │                                                                         │
//! │  create / receive_stock read the rate through the same transaction     │
//! │  that writes the price, so a concurrent rate change cannot leave a     │
//! │  product priced at the old rate.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::pricing::{bs_price, restock};
use bodega_core::validation::{
    validate_code, validate_price, validate_product_name, validate_stock_quantity,
};
use bodega_core::{CoreError, Money, Product};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::rate::current_rate;
use crate::repository::{fmt_ts, now, parse_ts};

const PRODUCT_COLUMNS: &str = r#"
    id, code, name, quantity, price_usd_cents, price_bs_cents, created_at, updated_at
"#;

/// Raw `products` row.
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    id: String,
    code: String,
    name: String,
    quantity: i64,
    price_usd_cents: i64,
    price_bs_cents: i64,
    created_at: String,
    updated_at: String,
}

impl ProductRow {
    pub(crate) fn into_product(self) -> DbResult<Product> {
        Ok(Product {
            id: self.id,
            code: self.code,
            name: self.name,
            quantity: self.quantity,
            price_usd: Money::from_cents(self.price_usd_cents),
            price_bs: Money::from_cents(self.price_bs_cents),
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

/// Loads one product by id through any executor.
pub(crate) async fn fetch_product<'e, E>(executor: E, id: &str) -> DbResult<Option<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    sqlx::query_as::<_, ProductRow>(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await?
        .map(ProductRow::into_product)
        .transpose()
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let rice = repo.create("A1", "Rice", 100, dec!(2)).await?;
/// let rice = repo.receive_stock(&rice.id, 20, dec!(2.5)).await?;
/// let all = repo.list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    db: Database,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(db: Database) -> Self {
        ProductRepository { db }
    }

    /// Lists every product ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY name COLLATE NOCASE, code",
            PRODUCT_COLUMNS
        );

        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(self.db.pool())
            .await?;

        debug!(count = rows.len(), "Listed products");
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        fetch_product(self.db.pool(), id).await
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE code = ?1", PRODUCT_COLUMNS);

        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(code.trim())
            .fetch_optional(self.db.pool())
            .await?
            .map(ProductRow::into_product)
            .transpose()
    }

    /// Number of products on file.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }

    /// Creates a product priced at the current rate.
    ///
    /// ## Errors
    /// * `CoreError::Validation` - blank or malformed code/name
    /// * `CoreError::InvalidQuantity` / `CoreError::InvalidPrice` - negative input
    /// * `CoreError::DuplicateCode` - code already on file
    pub async fn create(
        &self,
        code: &str,
        name: &str,
        quantity: i64,
        price_usd: Decimal,
    ) -> DbResult<Product> {
        let code = code.trim();
        let name = name.trim();

        validate_code(code)?;
        validate_product_name(name)?;
        validate_stock_quantity(quantity)?;
        let price_usd = validate_price(price_usd)?;

        debug!(code = %code, quantity, price_usd = %price_usd, "Creating product");

        let mut tx = self.db.begin_write().await?;

        let taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE code = ?1")
            .bind(code)
            .fetch_optional(tx.conn())
            .await?;
        if taken.is_some() {
            return Err(CoreError::DuplicateCode(code.to_string()).into());
        }

        let rate = current_rate(tx.conn()).await?;
        let created_at = now();

        let product = Product {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            name: name.to_string(),
            quantity,
            price_usd,
            price_bs: bs_price(price_usd, rate)?,
            created_at,
            updated_at: created_at,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, quantity,
                price_usd_cents, price_bs_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.quantity)
        .bind(product.price_usd.cents())
        .bind(product.price_bs.cents())
        .bind(fmt_ts(product.created_at))
        .bind(fmt_ts(product.updated_at))
        .execute(tx.conn())
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => CoreError::DuplicateCode(code.to_string()).into(),
            other => other,
        })?;

        tx.commit().await?;

        info!(id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    /// Records a supplier delivery.
    ///
    /// `quantity_delta` may be negative as long as the result stays >= 0.
    /// The USD price becomes `max(old, supplier_price_usd)` and the BS price
    /// is recomputed at the current rate.
    pub async fn receive_stock(
        &self,
        id: &str,
        quantity_delta: i64,
        supplier_price_usd: Decimal,
    ) -> DbResult<Product> {
        let supplier_price = validate_price(supplier_price_usd)?;

        debug!(id = %id, quantity_delta, supplier_price = %supplier_price, "Receiving stock");

        let mut tx = self.db.begin_write().await?;

        let product = fetch_product(tx.conn(), id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        let rate = current_rate(tx.conn()).await?;
        let next = restock(&product, quantity_delta, supplier_price, rate)?;
        let updated_at = now();

        sqlx::query(
            r#"
            UPDATE products SET
                quantity = ?2,
                price_usd_cents = ?3,
                price_bs_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(next.quantity)
        .bind(next.price_usd.cents())
        .bind(next.price_bs.cents())
        .bind(fmt_ts(updated_at))
        .execute(tx.conn())
        .await?;

        tx.commit().await?;

        info!(id = %id, quantity = next.quantity, price_usd = %next.price_usd, "Stock received");

        Ok(Product {
            quantity: next.quantity,
            price_usd: next.price_usd,
            price_bs: next.price_bs,
            updated_at,
            ..product
        })
    }

    /// Overwrites the stock level (inventory corrections).
    pub async fn set_quantity(&self, id: &str, quantity: i64) -> DbResult<Product> {
        validate_stock_quantity(quantity)?;

        debug!(id = %id, quantity, "Setting stock level");

        let mut tx = self.db.begin_write().await?;

        let result = sqlx::query("UPDATE products SET quantity = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(quantity)
            .bind(fmt_ts(now()))
            .execute(tx.conn())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        let product = fetch_product(tx.conn(), id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;

        tx.commit().await?;
        Ok(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
