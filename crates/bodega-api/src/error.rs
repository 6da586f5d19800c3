//! # API Error Type
//!
//! Unified error type for request commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Bodega                                 │
//! │                                                                         │
//! │  Command Function → Result<T, ApiError>                                 │
//! │         │                                                               │
//! │         ├── Business rule? ── CoreError ──► 400 / 404, message as is    │
//! │         │                                                               │
//! │         ├── Storage?  ─────── DbError  ──► 500, logged, generic message │
//! │         │                                                               │
//! │         └── Success ─────────────────────► 200 / 201                    │
//! │                                                                         │
//! │  Envelope on failure: {"success": false, "error": "<message>"}          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bodega_core::CoreError;
use bodega_db::DbError;
use serde::Serialize;

/// API error returned from commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Missing or malformed input (400)
    ValidationError,

    /// Product code already taken (400)
    DuplicateCode,

    /// Not enough stock for a sale (400)
    InsufficientStock,

    /// Rate is zero or negative (400)
    InvalidRate,

    /// Settlement for a customer who owes nothing (400)
    NoDebt,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP-style status for this code.
    pub fn status(self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError
            | ErrorCode::DuplicateCode
            | ErrorCode::InsufficientStock
            | ErrorCode::InvalidRate
            | ErrorCode::NoDebt => 400,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Error for a required request field that is absent or blank.
    pub fn missing(field: &str) -> Self {
        ApiError::validation(format!("{} is required", field))
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// Status code for this error.
    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rule(rule) => ApiError::from(rule),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, .. } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} already exists", field),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ApiError::new(ErrorCode::DatabaseError, "Database busy")
            }
            DbError::InvalidConfig(e) => {
                tracing::error!("Invalid database configuration: {}", e);
                ApiError::internal("Invalid database configuration")
            }
            DbError::QueryFailed(e) | DbError::CorruptRow(e) | DbError::Internal(e) => {
                tracing::error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors. Messages pass through unchanged.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => ErrorCode::NotFound,
            CoreError::DuplicateCode(_) => ErrorCode::DuplicateCode,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::InvalidRate(_) => ErrorCode::InvalidRate,
            CoreError::NoDebt { .. } => ErrorCode::NoDebt,
            CoreError::InvalidQuantity(_)
            | CoreError::InvalidPrice(_)
            | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for commands.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_core::ValidationError;

    #[test]
    fn test_rule_statuses() {
        let stock = CoreError::InsufficientStock {
            code: "A1".into(),
            name: "Rice".into(),
            available: 95,
            requested: 200,
        };
        let err = ApiError::from(DbError::from(stock));
        assert_eq!(err.status(), 400);
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(
            err.message,
            "Insufficient stock for Rice (A1): available 95, requested 200"
        );

        assert_eq!(ApiError::from(CoreError::ProductNotFound("x".into())).status(), 404);
        assert_eq!(ApiError::from(CoreError::InvalidRate("0".into())).status(), 400);
        assert_eq!(ApiError::from(CoreError::DuplicateCode("A1".into())).status(), 400);
        assert_eq!(
            ApiError::from(CoreError::NoDebt { cedula: "V1".into() }).status(),
            400
        );
        assert_eq!(
            ApiError::from(CoreError::Validation(ValidationError::Required {
                field: "cedula".into()
            }))
            .message,
            "Validation error: cedula is required"
        );
    }

    #[test]
    fn test_storage_errors_hide_details() {
        let err = ApiError::from(DbError::QueryFailed("no such table: sales".into()));
        assert_eq!(err.status(), 500);
        assert_eq!(err.message, "Database operation failed");
    }
}
