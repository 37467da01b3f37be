use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use presensi::config::Config;
use presensi::database;
use presensi::state::AppState;
use presensi::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    info!("Connecting to database: {}", config.database_url);
    let pool = database::connect(&config.database_url)
        .await
        .context("cannot connect to database")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("cannot create {}", config.upload_dir.display()))?;

    let host = config.host.clone();
    let port = config.port;
    let app = web::build_router(AppState::new(pool, config));

    // Fall back to the next port when the configured one is taken.
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("cannot parse HOST/PORT")?;
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!(
                "⚠️  Could not bind {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .context("cannot parse fallback address")?;
            tokio::net::TcpListener::bind(fallback)
                .await
                .context("cannot bind fallback port")?
        }
    };

    let bound_addr = listener.local_addr()?;
    info!("🚀 Presensi running on http://{} (build {})", bound_addr, presensi::BUILD_ID);
    info!("📍 Open http://{}/login to start", bound_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
