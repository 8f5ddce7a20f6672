//! promo-janitor - periodic cleanup trigger
//!
//! Long-running HTTP service. An external scheduler posts to
//! `/api/cleanup` with the `x-cleanup-secret` header.

use anyhow::{Context, Result};
use clap::Parser;
use promo_common::config::EngineConfig;
use promo_common::db::connect;
use promo_ingest::cleanup::FsAssetStore;
use promo_janitor::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "promo-janitor", version, about = "Evidence photo cleanup trigger")]
struct Args {
    /// Config file (overrides PROMO_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Database URL (overrides the config file)
    #[arg(long, env = "PROMO_DATABASE_URL")]
    database_url: Option<String>,

    /// Listen port
    #[arg(long, env = "PROMO_JANITOR_PORT", default_value_t = 5731)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting promo-janitor v{} [{}] ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let config = EngineConfig::load(args.config.as_deref(), args.database_url.clone())
        .context("Failed to load configuration")?;
    let pool = connect(config.require_database_url()?)
        .await
        .context("Failed to open database")?;
    info!("Database connected");

    let asset_root = config.cleanup.require_asset_root()?;
    info!("Asset root: {}", asset_root.display());

    let shared_secret = config
        .cleanup
        .shared_secret
        .clone()
        .filter(|s| !s.trim().is_empty());
    if shared_secret.is_none() {
        warn!("cleanup.shared_secret is not set, /api/cleanup will reject every call");
    }

    let state = AppState::new(
        pool,
        Arc::new(FsAssetStore::new(asset_root)),
        config.cleanup.retention_days(),
        shared_secret,
    );
    let app = build_router(state);

    let addr = format!("127.0.0.1:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("promo-janitor listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
