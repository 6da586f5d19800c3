//! # bodega-api: Request Layer for Bodega
//!
//! JSON commands in, `{success, data|error}` envelopes out.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Request Handling                                │
//! │                                                                         │
//! │  stdin line ──► handle_json ──► Command ──► dispatch ──► commands::*   │
//! │                      │                                       │          │
//! │                      │ malformed                             ▼          │
//! │                      ▼                               bodega-db engine   │
//! │                (400, error)                                  │          │
//! │                                                              ▼          │
//! │  stdout line ◄── envelope + status ◄── respond ◄── ApiResult<T>         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! Environment variables:
//! - `BODEGA_STORE_NAME` - Store name (default: Bodega)
//! - `BODEGA_LOG` - Tracing filter
//! - `BODEGA_DB_PATH` - SQLite file (default: bodega.db)
//! - `BODEGA_DB_MAX_CONNECTIONS` - Pool size (default: 5)

pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;

// Re-exports
pub use commands::{dispatch, handle_json, response_line, Command};
pub use config::{AppConfig, ConfigError};
pub use envelope::{respond, Envelope};
pub use error::{ApiError, ApiResult, ErrorCode};
