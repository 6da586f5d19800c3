//! # Rate Commands

use bodega_core::ExchangeRate;
use bodega_db::Database;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};

/// Body of `set_rate`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetRateRequest {
    pub rate: Option<Decimal>,
}

/// Payload of both rate commands.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateResponse {
    pub rate: ExchangeRate,
}

/// The current rate.
pub async fn get_rate(db: &Database) -> ApiResult<RateResponse> {
    let rate = db.rates().get().await?;
    Ok(RateResponse { rate })
}

/// Sets the rate and re-prices every product.
pub async fn set_rate(db: &Database, req: SetRateRequest) -> ApiResult<RateResponse> {
    let value = req.rate.ok_or_else(|| ApiError::missing("rate"))?;
    let rate = db.rates().set(value).await?;
    Ok(RateResponse { rate })
}
