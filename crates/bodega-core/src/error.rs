//! # Error Types
//!
//! Domain-specific error types for bodega-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bodega-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bodega-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError as Rule      │
//! │                                                                         │
//! │  bodega-api errors                                                     │
//! │  └── ApiError         - Code + message + HTTP-style status             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Envelope     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every business rule is checked before the first write of an operation,
//! so any of these errors means nothing was committed.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product id or code does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale id does not exist.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// A product with this code already exists.
    #[error("Product code '{0}' already exists")]
    DuplicateCode(String),

    /// Requested quantity exceeds on-hand stock.
    ///
    /// ## When This Occurs
    /// ```text
    /// create_sale([Rice x 200])
    ///      │
    ///      ▼
    /// Check stock: available=95
    ///      │
    ///      ▼
    /// InsufficientStock { code: "A1", available: 95, requested: 200 }
    ///      │
    ///      ▼
    /// Nothing written; retry may succeed after a restock
    /// ```
    #[error("Insufficient stock for {name} ({code}): available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Exchange rate is zero or negative.
    #[error("Invalid exchange rate: {0} (must be greater than zero)")]
    InvalidRate(String),

    /// Quantity is out of range for the operation.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Price is negative or not representable in cents.
    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    /// Settlement requested for a customer with nothing outstanding.
    #[error("Customer {cedula} has no outstanding debt")]
    NoDebt { cedula: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised for missing or malformed fields. Always caller-fixable.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A list that needs at least one entry is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
