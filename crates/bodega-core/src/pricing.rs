//! # Pricing Rules
//!
//! The arithmetic behind every money-moving operation, kept free of I/O so
//! the storage layer only has to load rows, call in here, and persist.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create product  ──► bs_price(usd, rate)                               │
//! │  restock         ──► restock(product, delta, supplier usd, rate)       │
//! │  create sale     ──► draft_sale(lines with products)                   │
//! │  settle debts    ──► settle(cedula, unpaid sales, settlement rate)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::rate::ExchangeRate;
use crate::types::{DebtSettlement, OutstandingSale, Product};
use crate::validation::{validate_sale_quantity, validate_stock_quantity};

/// BS price for a USD price at `rate`.
#[inline]
pub fn bs_price(price_usd: Money, rate: ExchangeRate) -> CoreResult<Money> {
    rate.to_bs(price_usd)
}

// =============================================================================
// Restock
// =============================================================================

/// New stock level and prices after a supplier delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Restock {
    pub quantity: i64,
    pub price_usd: Money,
    pub price_bs: Money,
}

/// Applies a delivery to a product.
///
/// ## Rules
/// - `quantity = old + delta`, must stay >= 0 (delta may be negative)
/// - `price_usd = max(old, supplier)`: restocking never lowers a price
/// - `price_bs` recomputed from the current rate
pub fn restock(
    product: &Product,
    quantity_delta: i64,
    supplier_price_usd: Money,
    rate: ExchangeRate,
) -> CoreResult<Restock> {
    if supplier_price_usd.is_negative() {
        return Err(CoreError::InvalidPrice(format!(
            "supplier price cannot be negative (got {})",
            supplier_price_usd
        )));
    }

    let quantity = product.quantity.checked_add(quantity_delta).ok_or_else(|| {
        CoreError::InvalidQuantity(format!("quantity delta {} overflows", quantity_delta))
    })?;
    validate_stock_quantity(quantity)?;

    let price_usd = product.price_usd.max(supplier_price_usd);
    let price_bs = bs_price(price_usd, rate)?;

    Ok(Restock {
        quantity,
        price_usd,
        price_bs,
    })
}

// =============================================================================
// Sale Drafting
// =============================================================================

/// A priced line, ready to be persisted as a `SaleItem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftItem {
    pub product_id: String,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_usd: Money,
    pub unit_price_bs: Money,
    pub subtotal_usd: Money,
    pub subtotal_bs: Money,
}

/// All lines of a sale plus totals.
///
/// Totals are sums of the already-rounded line subtotals, so
/// `sum(items.subtotal_*) == total_*` holds exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleDraft {
    pub items: Vec<DraftItem>,
    pub total_usd: Money,
    pub total_bs: Money,
}

/// Prices a sale against a consistent snapshot of products.
///
/// `lines` pairs each requested quantity with the product as read inside the
/// sale's transaction, in request order. Stock is checked against the total
/// requested per product, so two lines for the same product cannot together
/// exceed what is on hand. Fails before producing anything if any line fails.
pub fn draft_sale(lines: &[(&Product, i64)]) -> CoreResult<SaleDraft> {
    let mut demand: HashMap<&str, i64> = HashMap::new();

    for (product, quantity) in lines {
        validate_sale_quantity(*quantity)?;

        let requested = demand.entry(product.id.as_str()).or_insert(0);
        *requested = requested.checked_add(*quantity).ok_or_else(|| {
            CoreError::InvalidQuantity(format!(
                "total requested for {} ({}) is out of range",
                product.name, product.code
            ))
        })?;

        if !product.can_sell(*requested) {
            return Err(CoreError::InsufficientStock {
                code: product.code.clone(),
                name: product.name.clone(),
                available: product.quantity,
                requested: *requested,
            });
        }
    }

    let items = lines
        .iter()
        .map(|(product, quantity)| -> CoreResult<DraftItem> {
            let line_total = |unit: Money| {
                unit.checked_mul(*quantity).ok_or_else(|| {
                    CoreError::InvalidPrice(format!(
                        "{} x {} of {} is out of range",
                        unit, quantity, product.code
                    ))
                })
            };

            Ok(DraftItem {
                product_id: product.id.clone(),
                product_code: product.code.clone(),
                product_name: product.name.clone(),
                quantity: *quantity,
                unit_price_usd: product.price_usd,
                unit_price_bs: product.price_bs,
                subtotal_usd: line_total(product.price_usd)?,
                subtotal_bs: line_total(product.price_bs)?,
            })
        })
        .collect::<CoreResult<Vec<DraftItem>>>()?;

    let total_usd = sum_or_overflow(items.iter().map(|i| i.subtotal_usd), "sale total")?;
    let total_bs = sum_or_overflow(items.iter().map(|i| i.subtotal_bs), "sale total")?;

    Ok(SaleDraft {
        items,
        total_usd,
        total_bs,
    })
}

/// Checked sum that reports overflow as an out-of-range price.
pub fn sum_or_overflow<I>(amounts: I, what: &str) -> CoreResult<Money>
where
    I: IntoIterator<Item = Money>,
{
    Money::checked_sum(amounts)
        .ok_or_else(|| CoreError::InvalidPrice(format!("{} is out of range", what)))
}

// =============================================================================
// Debt Settlement
// =============================================================================

/// Computes what a customer pays to clear `debts` at `rate`.
///
/// Each sale's BS amount is recomputed from its fixed USD total at the
/// settlement rate (rounded per sale); the BS figure stored at sale time is
/// never reused.
///
/// ## Example
/// ```text
/// sale: total_usd = 10.00, rate_at_sale = 40 (total_bs = 400.00)
/// settle at 50  ──►  amount_paid_bs = 500.00, amount_paid_usd = 10.00
/// ```
pub fn settle(
    cedula: &str,
    debts: &[OutstandingSale],
    rate: ExchangeRate,
) -> CoreResult<DebtSettlement> {
    if debts.is_empty() {
        return Err(CoreError::NoDebt {
            cedula: cedula.to_string(),
        });
    }

    let owed_bs = debts
        .iter()
        .map(|debt| rate.to_bs(debt.total_usd))
        .collect::<CoreResult<Vec<Money>>>()?;

    let amount_paid_bs = sum_or_overflow(owed_bs, "settlement")?;
    let amount_paid_usd = sum_or_overflow(debts.iter().map(|d| d.total_usd), "settlement")?;

    Ok(DebtSettlement {
        cedula: cedula.to_string(),
        rate,
        amount_paid_bs,
        amount_paid_usd,
        count: debts.len() as i64,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn rate(v: rust_decimal::Decimal) -> ExchangeRate {
        ExchangeRate::new(v).unwrap()
    }

    fn product(id: &str, qty: i64, usd: i64, bs: i64) -> Product {
        Product {
            id: id.to_string(),
            code: format!("C-{}", id),
            name: format!("Product {}", id),
            quantity: qty,
            price_usd: Money::from_cents(usd),
            price_bs: Money::from_cents(bs),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn debt(usd: i64, bs: i64, at: rust_decimal::Decimal) -> OutstandingSale {
        OutstandingSale {
            sale_id: "s".to_string(),
            sold_at: Utc::now(),
            total_usd: Money::from_cents(usd),
            total_bs_at_sale: Money::from_cents(bs),
            rate_at_sale: rate(at),
        }
    }

    #[test]
    fn test_restock_keeps_higher_price() {
        let p = product("1", 10, 200, 8000);

        let up = restock(&p, 5, Money::from_cents(250), rate(dec!(40))).unwrap();
        assert_eq!(up.quantity, 15);
        assert_eq!(up.price_usd.cents(), 250);
        assert_eq!(up.price_bs.cents(), 10000);

        let down = restock(&p, 5, Money::from_cents(150), rate(dec!(40))).unwrap();
        assert_eq!(down.price_usd.cents(), 200);
        assert_eq!(down.price_bs.cents(), 8000);
    }

    #[test]
    fn test_restock_negative_delta() {
        let p = product("1", 10, 200, 8000);
        assert_eq!(
            restock(&p, -10, Money::from_cents(200), rate(dec!(40)))
                .unwrap()
                .quantity,
            0
        );
        assert!(matches!(
            restock(&p, -11, Money::from_cents(200), rate(dec!(40))),
            Err(CoreError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_draft_sale_totals_are_sum_of_lines() {
        let rice = product("1", 100, 200, 8000);
        let beans = product("2", 10, 333, 13320);

        let draft = draft_sale(&[(&rice, 5), (&beans, 3)]).unwrap();
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].subtotal_usd.cents(), 1000);
        assert_eq!(draft.items[1].subtotal_usd.cents(), 999);
        assert_eq!(draft.total_usd.cents(), 1999);
        assert_eq!(draft.total_bs.cents(), 40000 + 39960);

        let sum_bs = Money::checked_sum(draft.items.iter().map(|i| i.subtotal_bs));
        assert_eq!(sum_bs, Some(draft.total_bs));
    }

    #[test]
    fn test_draft_sale_insufficient_stock() {
        let rice = product("1", 95, 200, 8000);
        let err = draft_sale(&[(&rice, 200)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock {
                available: 95,
                requested: 200,
                ..
            }
        ));
    }

    #[test]
    fn test_draft_sale_counts_repeated_lines() {
        let rice = product("1", 6, 200, 8000);
        assert!(draft_sale(&[(&rice, 3), (&rice, 3)]).is_ok());
        assert!(matches!(
            draft_sale(&[(&rice, 4), (&rice, 3)]),
            Err(CoreError::InsufficientStock { requested: 7, .. })
        ));
    }

    #[test]
    fn test_draft_sale_repeated_lines_overflowing_demand() {
        let rice = product("1", 5, 200, 8000);
        assert!(matches!(
            draft_sale(&[(&rice, 1), (&rice, i64::MAX)]),
            Err(CoreError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_draft_sale_subtotal_overflow() {
        // 1e14 USD each, x1000 does not fit in i64 cents
        let gold = product("1", 5000, 10_000_000_000_000_000, 10_000_000_000_000_000);
        assert!(matches!(
            draft_sale(&[(&gold, 1000)]),
            Err(CoreError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_draft_sale_total_overflow() {
        let a = product("1", 10, i64::MAX / 2 + 1, 1);
        let b = product("2", 10, i64::MAX / 2 + 1, 1);
        assert!(matches!(
            draft_sale(&[(&a, 1), (&b, 1)]),
            Err(CoreError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_settle_total_overflow() {
        let debts = vec![debt(i64::MAX, 0, dec!(1)), debt(1, 0, dec!(1))];
        assert!(matches!(
            settle("V1", &debts, rate(dec!(1))),
            Err(CoreError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_settle_uses_usd_at_settlement_rate() {
        let debts = vec![debt(1000, 40000, dec!(40))];
        let result = settle("V123", &debts, rate(dec!(50))).unwrap();
        assert_eq!(result.amount_paid_bs.cents(), 50000);
        assert_ne!(result.amount_paid_bs.cents(), 40000);
        assert_eq!(result.amount_paid_usd.cents(), 1000);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_settle_rounds_per_sale() {
        // 0.01 × 0.5 = 0.005 → 0.01 each, twice = 0.02 (not round(0.01) once)
        let debts = vec![debt(1, 0, dec!(1)), debt(1, 0, dec!(1))];
        let result = settle("V1", &debts, rate(dec!(0.5))).unwrap();
        assert_eq!(result.amount_paid_bs.cents(), 2);
    }

    #[test]
    fn test_settle_without_debts() {
        assert!(matches!(
            settle("V9", &[], rate(dec!(50))),
            Err(CoreError::NoDebt { .. })
        ));
    }
}
