//! # Bodega
//!
//! JSON-lines driver: reads one command per stdin line and writes one
//! `{"status": .., "body": ..}` line per command to stdout.
//!
//! ```text
//! $ echo '{"command":"get_rate"}' | bodega
//! {"status":200,"body":{"success":true,"data":{"rate":"1"}}}
//! ```

use bodega_api::{handle_json, response_line, AppConfig};
use bodega_db::Database;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    config.init_tracing();

    info!(
        store = %config.store_name,
        db = %config.db.database_path.display(),
        "Starting Bodega"
    );

    let db = Database::new(config.db.clone()).await?;
    if !db.health_check().await {
        return Err("database did not answer a health check".into());
    }
    info!("Database ready");

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (status, body) = handle_json(&db, &line).await;
        if status >= 500 {
            warn!(status, "Command failed");
        }

        stdout.write_all(response_line(status, body).as_bytes()).await?;
        stdout.flush().await?;
    }

    db.close().await;
    info!("Bodega stopped");
    Ok(())
}
