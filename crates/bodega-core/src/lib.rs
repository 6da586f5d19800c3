//! # bodega-core: Pure Business Logic for Bodega
//!
//! Types and rules for a shop that prices in USD and collects in BS.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bodega Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              bodega-api (request contract)                      │   │
//! │  │    DTOs, {success, data|error} envelope, status codes           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bodega-db (storage + engine)                 │   │
//! │  │     rate store, inventory ledger, sale & debt engine            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bodega-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │  types  │ │  money  │ │  rate   │ │ pricing │ │validation│ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Customer, Sale, debts, reports)
//! - [`money`] - Money type with integer cents
//! - [`rate`] - The BS/USD exchange rate and conversion
//! - [`pricing`] - Restock, sale and settlement arithmetic
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bodega_core::money::Money;
//! use bodega_core::rate::ExchangeRate;
//! use rust_decimal::Decimal;
//!
//! let rate = ExchangeRate::new(Decimal::from(40)).unwrap();
//! let price_bs = rate.to_bs(Money::from_cents(200)).unwrap();
//! assert_eq!(price_bs.cents(), 8000); // 80.00 BS
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod rate;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Currency, Money};
pub use rate::ExchangeRate;
pub use types::*;
