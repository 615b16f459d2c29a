//! flare-viewer - Solar flare image viewer
//!
//! Serves a search page that lists DONKI solar flares for a date range and
//! pairs each with a Helioviewer SDO/AIA screenshot near its peak time.
//! Upstream calls go through this service so the NASA API key stays
//! server-side.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use flare_common::config::{CliOverrides, TomlConfig, ViewerConfig};
use flare_viewer::{build_router, AppState};

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(name = "flare-viewer", version, about = "Solar flare image viewer")]
struct Args {
    /// Listen address (overrides FLARE_VIEWER_BIND and the config file)
    #[arg(long)]
    bind: Option<String>,

    /// Config file path (default: <config dir>/flare-viewer/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// NASA API key (overrides NASA_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// Concurrent image resolutions per search (1 = sequential)
    #[arg(long)]
    image_workers: Option<usize>,
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
        "Starting flare-viewer v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let toml_config = match args.config.clone().or_else(TomlConfig::default_path) {
        Some(path) => TomlConfig::load(&path)?,
        None => TomlConfig::default(),
    };

    let cli = CliOverrides {
        bind: args.bind,
        api_key: args.api_key,
        image_workers: args.image_workers,
    };
    let config = ViewerConfig::resolve(&cli, &toml_config);
    info!(
        donki = %config.donki_base_url,
        helioviewer = %config.helioviewer_base_url,
        image_workers = config.image_workers,
        timeout = ?config.request_timeout,
        "Configuration resolved"
    );

    let state = AppState::from_config(&config).context("Failed to build upstream clients")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("flare-viewer listening on http://{}", config.bind);
    info!("Health check: http://{}/health", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
