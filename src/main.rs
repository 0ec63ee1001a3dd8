//! DigitalOcean exporter daemon.
//!
//! Refreshes resource counts from the DigitalOcean API in the background
//! and serves them to Prometheus over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use prometheus::Registry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use digitalocean_exporter::config::Args;
use digitalocean_exporter::{
    server, DigitalOceanClient, RefreshBuffer, ResourceCollector, ResourceService,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing (structured logs)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| args.default_log_filter().into());
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }

    info!("🌊 DigitalOcean Exporter v{}", env!("CARGO_PKG_VERSION"));
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // ── API Client ──────────────────────────────────────────────────
    let client = DigitalOceanClient::new(args.token.clone(), &args.api_url, args.request_timeout())
        .context("Failed to build DigitalOcean API client")?;
    info!(api_url = %args.api_url, timeout_secs = args.request_timeout, "API client ready");

    // ── Refresh Buffer ──────────────────────────────────────────────
    let settings = args.refresh_settings();
    let options = settings.options;
    let buffer = Arc::new(RefreshBuffer::new(Arc::new(client), settings));
    let _refresher = buffer.spawn();

    // ── Metrics ─────────────────────────────────────────────────────
    let service = ResourceService::new(Arc::clone(&buffer));
    let collector = ResourceCollector::new(Arc::new(service), &options)
        .context("Failed to build metric descriptors")?;
    let registry = Registry::new();
    registry
        .register(Box::new(collector))
        .context("Failed to register DigitalOcean collector")?;

    // ── HTTP Server ─────────────────────────────────────────────────
    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("Failed to bind {}", args.listen))?;
    info!(metrics_path = %args.metrics_path, "Serving metrics");

    server::serve(listener, server::router(registry, &args.metrics_path)).await
}
