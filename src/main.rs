use anyhow::{Context, Result};
use clap::Parser;
use lecture_capture::{create_router, AppState, Config, LocalFrameStore, SessionRegistry, Sweeper};
use std::sync::Arc;
use tracing::info;

/// Live lecture capture ingest service
#[derive(Debug, Parser)]
#[command(name = "lecture-capture", version)]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/lecture-capture")]
    config: String,

    /// Override service.http.bind
    #[arg(long)]
    bind: Option<String>,

    /// Override service.http.port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?;

    let bind = args.bind.unwrap_or_else(|| cfg.service.http.bind.clone());
    let port = args.port.unwrap_or(cfg.service.http.port);
    let registry_config = cfg.registry_config()?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Frame storage: {}", cfg.capture.storage_path);
    info!(
        "Idle sessions expire after {:?} (sweep every {:?})",
        registry_config.idle_ttl, registry_config.sweep_interval
    );

    let registry = Arc::new(SessionRegistry::new(registry_config));
    let frames = Arc::new(LocalFrameStore::new(&cfg.capture.storage_path));
    let sweeper = Sweeper::spawn(Arc::clone(&registry), registry.config().sweep_interval);

    let app = create_router(AppState::new(registry, frames));

    let listener = tokio::net::TcpListener::bind((bind.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", bind, port))?;
    info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    sweeper.stop().await?;
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
