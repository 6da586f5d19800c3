//! # Customer Repository
//!
//! Customers keyed by cedula. A customer is created the first time a sale
//! or a registration names them and refreshed on every later mention.
//! Blank address or phone never overwrites a value already on file.

use bodega_core::validation::validate_customer;
use bodega_core::{Customer, CustomerInfo};
use sqlx::{FromRow, SqliteConnection};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::{fmt_ts, now, parse_ts};

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: i64,
    cedula: String,
    name: String,
    address: String,
    phone: String,
    created_at: String,
    updated_at: String,
}

impl CustomerRow {
    fn into_customer(self) -> DbResult<Customer> {
        Ok(Customer {
            id: self.id,
            cedula: self.cedula,
            name: self.name,
            address: self.address,
            phone: self.phone,
            created_at: parse_ts(&self.created_at)?,
            updated_at: parse_ts(&self.updated_at)?,
        })
    }
}

/// Inserts or refreshes a customer inside an open transaction.
///
/// Returns the customer's row id. `info` is expected to be validated.
pub(crate) async fn upsert_in(conn: &mut SqliteConnection, info: &CustomerInfo) -> DbResult<i64> {
    let stamp = fmt_ts(now());

    sqlx::query(
        r#"
        INSERT INTO customers (cedula, name, address, phone, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?5)
        ON CONFLICT(cedula) DO UPDATE SET
            name       = excluded.name,
            address    = CASE WHEN excluded.address = '' THEN customers.address
                              ELSE excluded.address END,
            phone      = CASE WHEN excluded.phone = '' THEN customers.phone
                              ELSE excluded.phone END,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(info.cedula.trim())
    .bind(info.name.trim())
    .bind(info.address.trim())
    .bind(info.phone.trim())
    .bind(&stamp)
    .execute(&mut *conn)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM customers WHERE cedula = ?1")
        .bind(info.cedula.trim())
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}

/// Repository for customers.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: Database,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(db: Database) -> Self {
        CustomerRepository { db }
    }

    /// Looks a customer up by cedula.
    ///
    /// ## Returns
    /// * `Ok(Some(Customer))` - Registered
    /// * `Ok(None)` - Never seen
    pub async fn get_by_cedula(&self, cedula: &str) -> DbResult<Option<Customer>> {
        sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, cedula, name, address, phone, created_at, updated_at
            FROM customers
            WHERE cedula = ?1
            "#,
        )
        .bind(cedula.trim())
        .fetch_optional(self.db.pool())
        .await?
        .map(CustomerRow::into_customer)
        .transpose()
    }

    /// Registers a customer or refreshes their contact details.
    pub async fn upsert(&self, info: &CustomerInfo) -> DbResult<Customer> {
        validate_customer(info)?;

        debug!(cedula = %info.cedula, "Upserting customer");

        let mut tx = self.db.begin_write().await?;
        let id = upsert_in(tx.conn(), info).await?;

        let customer = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, cedula, name, address, phone, created_at, updated_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(tx.conn())
        .await?
        .ok_or_else(|| DbError::not_found("Customer", info.cedula.trim()))?
        .into_customer()?;

        tx.commit().await?;

        info!(id = customer.id, cedula = %customer.cedula, "Customer saved");
        Ok(customer)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
