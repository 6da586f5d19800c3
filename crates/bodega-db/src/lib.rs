//! # bodega-db: Storage and Engine Layer for Bodega
//!
//! SQLite storage via sqlx, plus the operations that move stock and money.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bodega Data Flow                                 │
//! │                                                                         │
//! │  bodega-api command (create_sale)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bodega-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │ Repositories  │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │   │   │
//! │  │   │               │    │ RateRepo      │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_init.sql │   │   │
//! │  │   │ write gate    │    │ SaleRepo      │    │              │   │   │
//! │  │   │               │    │ DebtRepo ...  │    │              │   │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘   │   │
//! │  │                                │ pricing rules                  │   │
//! │  │                                ▼                                │   │
//! │  │                          bodega-core                            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, write gate, repository access
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Rate, product, customer, sale, report and debt storage
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bodega_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! db.rates().set(dec!(40)).await?;
//! let rice = db.products().create("A1", "Rice", 100, dec!(2)).await?;
//! let sale = db.sales().create(&customer, &lines, false).await?;
//! let paid = db.debts().settle("V123", dec!(50)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use migrations::MigrationStatus;
pub use pool::{Database, DbConfig, WriteTx};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::debt::DebtRepository;
pub use repository::product::ProductRepository;
pub use repository::rate::RateRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;

// =============================================================================
// End-to-End Tests
// =============================================================================
