//! # Debt Commands
//!
//! Listing who owes and settling at a chosen rate.

use bodega_core::{DebtSettlement, DebtorSummary};
use bodega_db::Database;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commands::product::required;
use crate::error::{ApiError, ApiResult};

/// Body of `settle_debts` and `quote_debts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettleDebtsRequest {
    pub cedula: Option<String>,
    pub rate: Option<Decimal>,
}

impl SettleDebtsRequest {
    fn into_parts(self) -> ApiResult<(String, Decimal)> {
        let cedula = required(self.cedula, "cedula")?;
        let rate = self.rate.ok_or_else(|| ApiError::missing("rate"))?;
        Ok((cedula, rate))
    }
}

/// Every debtor with their unpaid sales.
pub async fn list_debts(db: &Database) -> ApiResult<Vec<DebtorSummary>> {
    Ok(db.debts().outstanding().await?)
}

/// What settling would charge, without recording anything.
pub async fn quote_debts(db: &Database, req: SettleDebtsRequest) -> ApiResult<DebtSettlement> {
    let (cedula, rate) = req.into_parts()?;
    Ok(db.debts().quote(&cedula, rate).await?)
}

/// Marks every unpaid sale of the customer paid at the given rate.
pub async fn settle_debts(db: &Database, req: SettleDebtsRequest) -> ApiResult<DebtSettlement> {
    let (cedula, rate) = req.into_parts()?;

    debug!(cedula = %cedula, rate = %rate, "settle_debts");

    Ok(db.debts().settle(&cedula, rate).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bodega_core::{CustomerInfo, SaleLine};
    use bodega_db::DbConfig;
    use rust_decimal_macros::dec;

    async fn setup_debt() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.rates().set(dec!(40)).await.unwrap();
        let oil = db.products().create("B2", "Oil", 10, dec!(5)).await.unwrap();
        let customer = CustomerInfo {
            cedula: "V123".into(),
            name: "Ana".into(),
            ..Default::default()
        };
        db.sales()
            .create(
                &customer,
                &[SaleLine {
                    product_id: oil.id,
                    quantity: 2,
                }],
                false,
            )
            .await
            .unwrap();
        db
    }

    fn at(rate: Decimal) -> SettleDebtsRequest {
        SettleDebtsRequest {
            cedula: Some("V123".into()),
            rate: Some(rate),
        }
    }

    #[tokio::test]
    async fn test_quote_then_settle() {
        let db = setup_debt().await;
        assert_eq!(list_debts(&db).await.unwrap().len(), 1);

        let quote = quote_debts(&db, at(dec!(50))).await.unwrap();
        assert_eq!(quote.amount_paid_bs.cents(), 50000);
        assert_eq!(list_debts(&db).await.unwrap().len(), 1);

        let settled = settle_debts(&db, at(dec!(50))).await.unwrap();
        assert_eq!(settled, quote);
        assert!(list_debts(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_settle_twice_is_no_debt() {
        let db = setup_debt().await;
        settle_debts(&db, at(dec!(50))).await.unwrap();

        let err = settle_debts(&db, at(dec!(50))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoDebt);
        assert_eq!(err.status(), 400);
    }

    #[tokio::test]
    async fn test_settle_missing_fields() {
        let db = setup_debt().await;

        let err = settle_debts(
            &db,
            SettleDebtsRequest {
                rate: None,
                ..at(dec!(50))
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "rate is required");

        let err = settle_debts(&db, at(dec!(-1))).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRate);
    }
}
