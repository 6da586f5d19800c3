//! # Commands Module
//!
//! Every operation the shop front can request.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (Command enum, dispatch)
//! ├── product.rs   ◄─── Inventory listing, creation, restock
//! ├── rate.rs      ◄─── Exchange rate get/set
//! ├── sale.rs      ◄─── Sale recording and reports
//! ├── customer.rs  ◄─── Customer lookup and registration
//! └── debt.rs      ◄─── Outstanding debts and settlement
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  {"command": "set_rate", "params": {"rate": "45.5"}}                    │
//! │         │                                                               │
//! │         │ serde_json::from_str::<Command>                               │
//! │         ▼                                                               │
//! │  Command::SetRate(SetRateRequest { rate: Some(45.5) })                  │
//! │         │                                                               │
//! │         │ dispatch(&db, command)                                        │
//! │         ▼                                                               │
//! │  rate::set_rate(&db, req) -> ApiResult<RateResponse>                    │
//! │         │                                                               │
//! │         │ respond(result, OK)                                           │
//! │         ▼                                                               │
//! │  (200, {"success": true, "data": {"rate": "45.5"}})                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod debt;
pub mod product;
pub mod rate;
pub mod sale;

use bodega_core::CustomerInfo;
use bodega_db::Database;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::envelope::{respond, CREATED, OK};
use crate::error::ApiResult;

use customer::LookupCustomerRequest;
use debt::SettleDebtsRequest;
use product::{CreateProductRequest, RestockRequest};
use rate::SetRateRequest;
use sale::{CreateSaleRequest, SaleIdRequest, SalesQuery};

/// One request, tagged by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", content = "params", rename_all = "snake_case")]
pub enum Command {
    ListProducts,
    CreateProduct(CreateProductRequest),
    RestockProduct(RestockRequest),
    GetRate,
    SetRate(SetRateRequest),
    CreateSale(CreateSaleRequest),
    QuerySales(SalesQuery),
    GetSale(SaleIdRequest),
    DeleteSale(SaleIdRequest),
    LookupCustomer(LookupCustomerRequest),
    UpsertCustomer(CustomerInfo),
    ListDebts,
    QuoteDebts(SettleDebtsRequest),
    SettleDebts(SettleDebtsRequest),
}

impl Command {
    /// The wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ListProducts => "list_products",
            Command::CreateProduct(_) => "create_product",
            Command::RestockProduct(_) => "restock_product",
            Command::GetRate => "get_rate",
            Command::SetRate(_) => "set_rate",
            Command::CreateSale(_) => "create_sale",
            Command::QuerySales(_) => "query_sales",
            Command::GetSale(_) => "get_sale",
            Command::DeleteSale(_) => "delete_sale",
            Command::LookupCustomer(_) => "lookup_customer",
            Command::UpsertCustomer(_) => "upsert_customer",
            Command::ListDebts => "list_debts",
            Command::QuoteDebts(_) => "quote_debts",
            Command::SettleDebts(_) => "settle_debts",
        }
    }
}

fn to_value<T: Serialize>(result: ApiResult<T>, success_status: u16) -> (u16, Value) {
    let (status, body) = respond(result, success_status);
    match serde_json::to_value(&body) {
        Ok(value) => (status, value),
        Err(e) => {
            error!(error = %e, "Failed to serialize response");
            failure(500, "Internal server error".to_string())
        }
    }
}

fn failure(status: u16, message: String) -> (u16, Value) {
    (status, json!({ "success": false, "error": message }))
}

/// Runs a command and returns its status and JSON envelope.
pub async fn dispatch(db: &Database, command: Command) -> (u16, Value) {
    let name = command.name();
    debug!(command = name, "Dispatching");

    let (status, body) = match command {
        Command::ListProducts => to_value(product::list_products(db).await, OK),
        Command::CreateProduct(req) => to_value(product::create_product(db, req).await, CREATED),
        Command::RestockProduct(req) => to_value(product::restock_product(db, req).await, OK),
        Command::GetRate => to_value(rate::get_rate(db).await, OK),
        Command::SetRate(req) => to_value(rate::set_rate(db, req).await, OK),
        Command::CreateSale(req) => to_value(sale::create_sale(db, req).await, CREATED),
        Command::QuerySales(query) => to_value(sale::query_sales(db, query).await, OK),
        Command::GetSale(req) => to_value(sale::get_sale(db, req).await, OK),
        Command::DeleteSale(req) => to_value(sale::delete_sale(db, req).await, OK),
        Command::LookupCustomer(req) => to_value(customer::lookup_customer(db, req).await, OK),
        Command::UpsertCustomer(info) => to_value(customer::upsert_customer(db, info).await, OK),
        Command::ListDebts => to_value(debt::list_debts(db).await, OK),
        Command::QuoteDebts(req) => to_value(debt::quote_debts(db, req).await, OK),
        Command::SettleDebts(req) => to_value(debt::settle_debts(db, req).await, OK),
    };

    debug!(command = name, status, "Dispatched");
    (status, body)
}

/// Parses one JSON command, runs it and returns its status and envelope.
///
/// Malformed JSON or an unknown command answers 400.
pub async fn handle_json(db: &Database, line: &str) -> (u16, Value) {
    match serde_json::from_str::<Command>(line) {
        Ok(command) => dispatch(db, command).await,
        Err(e) => {
            debug!(error = %e, "Rejected malformed command");
            failure(400, format!("Invalid request: {}", e))
        }
    }
}

/// One output line of the JSON-lines driver: `{"status": .., "body": ..}`.
pub fn response_line(status: u16, body: Value) -> String {
    let mut line = json!({ "status": status, "body": body }).to_string();
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_db::DbConfig;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn call(db: &Database, request: Value) -> (u16, Value) {
        handle_json(db, &request.to_string()).await
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let db = setup().await;

        let (status, body) = handle_json(&db, "{not json").await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], json!(false));

        let (status, _) = call(&db, json!({"command": "launch_rockets"})).await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn test_unit_commands_need_no_params() {
        let db = setup().await;
        let (status, body) = call(&db, json!({"command": "list_products"})).await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"success": true, "data": []}));
    }

    #[tokio::test]
    async fn test_lookup_miss_is_null_data() {
        let db = setup().await;
        let (status, body) = call(
            &db,
            json!({"command": "lookup_customer", "params": {"cedula": "V1"}}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"success": true, "data": null}));
    }

    #[tokio::test]
    async fn test_shop_day_through_dispatch() {
        let db = setup().await;

        let (status, _) = call(&db, json!({"command": "set_rate", "params": {"rate": "40"}})).await;
        assert_eq!(status, 200);

        let (status, body) = call(
            &db,
            json!({"command": "create_product", "params": {
                "code": "A1", "name": "Rice", "quantity": 10, "price_usd": "2.50"
            }}),
        )
        .await;
        assert_eq!(status, 201);
        let product_id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &db,
            json!({"command": "create_sale", "params": {
                "customer": {"cedula": "V123", "name": "Ana"},
                "items": [{"product_id": product_id, "quantity": 4}],
                "pay_now": false
            }}),
        )
        .await;
        assert_eq!(status, 201);
        assert_eq!(body["data"]["sale"]["paid"], json!(false));

        let (status, body) = call(
            &db,
            json!({"command": "create_sale", "params": {
                "customer": {"cedula": "V123", "name": "Ana"},
                "items": [{"product_id": product_id, "quantity": 7}]
            }}),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], json!(false));

        let (_, body) = call(&db, json!({"command": "list_debts"})).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let (status, _) = call(
            &db,
            json!({"command": "settle_debts", "params": {"cedula": "V123", "rate": 50}}),
        )
        .await;
        assert_eq!(status, 200);

        let (_, body) = call(&db, json!({"command": "list_debts"})).await;
        assert_eq!(body["data"], json!([]));

        let (status, body) = call(&db, json!({"command": "list_products"})).await;
        assert_eq!(status, 200);
        assert_eq!(body["data"][0]["quantity"], json!(6));

        let (status, body) = call(
            &db,
            json!({"command": "query_sales", "params": {"type": "summary"}}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["data"]["total"]["sale_count"], json!(1));
    }

    #[tokio::test]
    async fn test_restock_without_quantity_or_price_is_400() {
        let db = setup().await;
        call(&db, json!({"command": "set_rate", "params": {"rate": "40"}})).await;
        let (_, body) = call(
            &db,
            json!({"command": "create_product", "params": {
                "code": "A1", "name": "Rice", "quantity": 10, "price_usd": "2.50"
            }}),
        )
        .await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let (status, body) = call(
            &db,
            json!({"command": "restock_product", "params": {"id": id}}),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("quantity is required"));

        let (status, body) = call(
            &db,
            json!({"command": "restock_product", "params": {"id": id, "quantity": 5}}),
        )
        .await;
        assert_eq!(status, 400);
        assert_eq!(body["error"], json!("price_usd is required"));

        let (_, body) = call(&db, json!({"command": "list_products"})).await;
        assert_eq!(body["data"][0]["quantity"], json!(10));
    }

    #[tokio::test]
    async fn test_response_line_escapes_messages() {
        let db = setup().await;
        let (status, body) = handle_json(&db, r#"{"command":"say \"hi\""}"#).await;
        let line = response_line(status, body.clone());

        assert!(line.ends_with('\n'));
        let parsed: Value = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(parsed, json!({ "status": 400, "body": body }));
        assert!(parsed["body"]["error"].as_str().unwrap().contains("say \"hi\""));
    }
}
