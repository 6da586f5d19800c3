//! # Validation Module
//!
//! Input validation utilities for Bodega.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request layer (bodega-api)                                   │
//! │  ├── Required fields present                                           │
//! │  └── 400 on failure                                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + pricing rules                                  │
//! │  ├── Codes, names, cedulas, quantities, prices                         │
//! │  └── Runs before any write                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE (code, cedula), CHECK (quantity >= 0)                      │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CustomerInfo, SaleLine};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CODE_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_CEDULA_LEN: usize = 20;

// =============================================================================
// String Validators
// =============================================================================

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use bodega_core::validation::validate_code;
///
/// assert!(validate_code("A1").is_ok());
/// assert!(validate_code("").is_err());
/// ```
pub fn validate_code(code: &str) -> ValidationResult<()> {
    required("code", code, MAX_CODE_LEN)?;

    if !code
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product name.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("name", name, MAX_NAME_LEN)
}

/// Validates a national ID.
pub fn validate_cedula(cedula: &str) -> ValidationResult<()> {
    required("cedula", cedula, MAX_CEDULA_LEN)
}

/// Validates the contact fields that come with a sale or registration.
pub fn validate_customer(customer: &CustomerInfo) -> ValidationResult<()> {
    validate_cedula(&customer.cedula)?;
    required("customer name", &customer.name, MAX_NAME_LEN)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock level (zero allowed).
pub fn validate_stock_quantity(qty: i64) -> CoreResult<()> {
    if qty < 0 {
        return Err(CoreError::InvalidQuantity(format!(
            "stock cannot be negative (got {})",
            qty
        )));
    }
    Ok(())
}

/// Validates a quantity being sold. Must be strictly positive.
pub fn validate_sale_quantity(qty: i64) -> CoreResult<()> {
    if qty <= 0 {
        return Err(CoreError::InvalidQuantity(format!(
            "sale quantity must be positive (got {})",
            qty
        )));
    }
    Ok(())
}

/// Validates a USD price given in major units and converts it to cents.
///
/// ## Example
/// ```rust
/// use bodega_core::validation::validate_price;
/// use rust_decimal::Decimal;
///
/// assert_eq!(validate_price(Decimal::new(250, 2)).unwrap().cents(), 250);
/// assert!(validate_price(Decimal::new(-1, 0)).is_err());
/// ```
pub fn validate_price(price_usd: Decimal) -> CoreResult<Money> {
    if price_usd.is_sign_negative() && !price_usd.is_zero() {
        return Err(CoreError::InvalidPrice(format!(
            "price cannot be negative (got {})",
            price_usd
        )));
    }
    Money::from_decimal(price_usd)
        .ok_or_else(|| CoreError::InvalidPrice(format!("price {} is too large", price_usd)))
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the requested lines of a sale.
///
/// ## Rules
/// - At least one line
/// - Every product id present
/// - Every quantity > 0
pub fn validate_sale_lines(lines: &[SaleLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Empty {
            field: "items".to_string(),
        }
        .into());
    }

    for line in lines {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            }
            .into());
        }
        validate_sale_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_code() {
        assert!(validate_code("A1").is_ok());
        assert!(validate_code("RICE-1KG").is_ok());
        assert!(validate_code("harina_pan").is_ok());

        assert!(validate_code("").is_err());
        assert!(validate_code("   ").is_err());
        assert!(validate_code("has space").is_err());
        assert!(validate_code(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_customer() {
        let ok = CustomerInfo {
            cedula: "V123".to_string(),
            name: "Ana".to_string(),
            ..Default::default()
        };
        assert!(validate_customer(&ok).is_ok());

        let missing_name = CustomerInfo {
            cedula: "V123".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            validate_customer(&missing_name),
            Err(ValidationError::Required { .. })
        ));

        assert!(validate_cedula(" ").is_err());
    }

    #[test]
    fn test_quantities() {
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-1).is_err());
        assert!(validate_sale_quantity(1).is_ok());
        assert!(matches!(
            validate_sale_quantity(0),
            Err(CoreError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price(dec!(0)).unwrap().cents(), 0);
        assert_eq!(validate_price(dec!(2)).unwrap().cents(), 200);
        assert!(matches!(
            validate_price(dec!(-0.01)),
            Err(CoreError::InvalidPrice(_))
        ));
    }

    #[test]
    fn test_validate_sale_lines() {
        assert!(validate_sale_lines(&[]).is_err());

        let lines = vec![SaleLine {
            product_id: "p1".to_string(),
            quantity: 5,
        }];
        assert!(validate_sale_lines(&lines).is_ok());

        let zero = vec![SaleLine {
            product_id: "p1".to_string(),
            quantity: 0,
        }];
        assert!(matches!(
            validate_sale_lines(&zero),
            Err(CoreError::InvalidQuantity(_))
        ));
    }
}
