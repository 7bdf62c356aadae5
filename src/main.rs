use anyhow::Context;
use tokio::net::TcpListener;

use brent_backend::app;
use brent_backend::config::ServerConfig;
use brent_backend::logging::{init_logging, LoggingConfig};
use brent_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env("brent-backend"))?;

    let config = ServerConfig::from_env()?;

    // Tables are loaded once and never reloaded while serving
    let state = AppState::load(&config).context("Failed to load startup data")?;
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Brent backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
