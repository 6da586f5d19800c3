//! # Seed Data Generator
//!
//! Populates a database with a shelf of staple products for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./bodega.db (or $BODEGA_DB_PATH) at rate 40
//! cargo run -p bodega-db --bin seed
//!
//! # Custom database and rate
//! cargo run -p bodega-db --bin seed -- --db ./data/dev.db --rate 36.5
//! ```
//!
//! Prints the seeded products as JSON when done.

use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bodega_core::Currency;
use bodega_db::{Database, DbConfig};

/// `(code, name, stock, price_usd)`
const STAPLES: &[(&str, &str, i64, &str)] = &[
    ("HAR-PAN-1K", "Harina PAN 1kg", 120, "1.35"),
    ("ARR-1K", "Arroz 1kg", 80, "1.20"),
    ("PAS-500", "Pasta 500g", 90, "0.95"),
    ("AZU-1K", "Azucar 1kg", 60, "1.40"),
    ("ACE-1L", "Aceite 1L", 40, "3.10"),
    ("CAF-250", "Cafe molido 250g", 35, "2.75"),
    ("LEC-PV-400", "Leche en polvo 400g", 25, "5.60"),
    ("MAN-500", "Mantequilla 500g", 20, "3.25"),
    ("QUE-BLA-1K", "Queso blanco 1kg", 15, "6.80"),
    ("HUE-30", "Huevos carton 30", 18, "5.90"),
    ("CAR-MOL-1K", "Carne molida 1kg", 12, "7.50"),
    ("JAB-BAR", "Jabon de barra", 50, "0.85"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BODEGA_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut config = DbConfig::from_env()?;
    let mut rate = Decimal::from(40);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = args[i + 1].clone().into();
                    i += 1;
                }
            }
            "--rate" | "-r" => {
                if i + 1 < args.len() {
                    rate = Decimal::from_str(&args[i + 1])?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bodega Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>     Database file path (default: $BODEGA_DB_PATH or ./bodega.db)");
                println!("  -r, --rate <RATE>   BS per USD to set before seeding (default: 40)");
                println!("  -h, --help          Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let db = Database::new(config).await?;
    let status = db.migration_status().await?;
    info!(applied = status.applied, "Database ready");

    let rate = db.rates().set(rate).await?;
    info!(rate = %rate, "Exchange rate set");

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let mut seeded = Vec::with_capacity(STAPLES.len());
    for (code, name, stock, price) in STAPLES {
        let price = Decimal::from_str(price)?;
        match db.products().create(code, name, *stock, price).await {
            Ok(product) => {
                info!(
                    code = %product.code,
                    usd = %product.price_usd.format(Currency::Usd),
                    bs = %product.price_bs.format(Currency::Bs),
                    "Seeded"
                );
                seeded.push(product);
            }
            Err(e) => warn!(code = %code, error = %e, "Failed to seed product"),
        }
    }

    info!(count = seeded.len(), "Seed complete");
    println!("{}", serde_json::to_string_pretty(&seeded)?);

    db.close().await;
    Ok(())
}
