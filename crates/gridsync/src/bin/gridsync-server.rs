//! Standalone Gridsync server binary.
//!
//! Configuration comes from the environment:
//!
//! - `GRIDSYNC_ADDR` — bind address (default `0.0.0.0:8080`)
//! - `GRIDSYNC_PLAYERS` — comma-separated turn order (default `A,B`)
//! - `RUST_LOG` — log filter (default `gridsync=info`)

use gridsync::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gridsync=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let addr = std::env::var("GRIDSYNC_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let players: Vec<String> = std::env::var("GRIDSYNC_PLAYERS")
        .unwrap_or_else(|_| "A,B".to_string())
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let server = GridServer::builder()
        .bind(&addr)
        .players(players)
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr()?, "gridsync listening");
    server.run().await?;
    Ok(())
}
