//! # Customer Commands

use bodega_core::{Customer, CustomerInfo};
use bodega_db::Database;
use serde::{Deserialize, Serialize};

use crate::commands::product::required;
use crate::error::ApiResult;

/// Body of `lookup_customer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LookupCustomerRequest {
    pub cedula: Option<String>,
}

/// The customer registered under `cedula`, or `None` for a first-time buyer.
pub async fn lookup_customer(
    db: &Database,
    req: LookupCustomerRequest,
) -> ApiResult<Option<Customer>> {
    let cedula = required(req.cedula, "cedula")?;
    Ok(db.customers().get_by_cedula(&cedula).await?)
}

/// Registers a customer or refreshes their contact details.
pub async fn upsert_customer(db: &Database, info: CustomerInfo) -> ApiResult<Customer> {
    Ok(db.customers().upsert(&info).await?)
}
