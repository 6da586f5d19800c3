//! # Product Commands
//!
//! Listing, creating and restocking products.

use bodega_core::Product;
use bodega_db::Database;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Body of `create_product`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProductRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price_usd: Option<Decimal>,
}

/// Body of `restock_product`.
///
/// `quantity` is the delivered amount. The stored price becomes the higher of
/// the current price and `price_usd`. All three fields are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestockRequest {
    pub id: Option<String>,
    pub quantity: Option<i64>,
    pub price_usd: Option<Decimal>,
}

pub(crate) fn required(value: Option<String>, field: &str) -> ApiResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing(field))
}

/// All products, ordered by name.
pub async fn list_products(db: &Database) -> ApiResult<Vec<Product>> {
    Ok(db.products().list().await?)
}

/// Creates a product priced at the current rate.
pub async fn create_product(db: &Database, req: CreateProductRequest) -> ApiResult<Product> {
    let code = required(req.code, "code")?;
    let name = required(req.name, "name")?;
    let quantity = req.quantity.ok_or_else(|| ApiError::missing("quantity"))?;
    let price_usd = req.price_usd.ok_or_else(|| ApiError::missing("price_usd"))?;

    debug!(code = %code, "create_product");

    Ok(db
        .products()
        .create(&code, &name, quantity, price_usd)
        .await?)
}

/// Records a supplier delivery against a product.
pub async fn restock_product(db: &Database, req: RestockRequest) -> ApiResult<Product> {
    let id = required(req.id, "id")?;
    let quantity = req.quantity.ok_or_else(|| ApiError::missing("quantity"))?;
    let price_usd = req.price_usd.ok_or_else(|| ApiError::missing("price_usd"))?;

    debug!(id = %id, quantity, "restock_product");

    Ok(db.products().receive_stock(&id, quantity, price_usd).await?)
}
