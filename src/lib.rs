//! DigitalOcean exporter — Prometheus counts of DigitalOcean resources.
//!
//! A background task lists droplets, floating IPs, load balancers, tags and
//! volumes through the DigitalOcean API, aggregates each listing into grouped
//! counts, and publishes them as snapshots. Scrapes read the latest snapshots
//! and never wait on the API.
//!
//! Data flow:
//! - writer: [`client`] → [`lister`] → [`aggregate`] → [`refresh`]
//! - reader: [`service`] → [`collector`] → `prometheus::Registry` → [`server`]

pub mod aggregate;
pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod lister;
pub mod refresh;
pub mod server;
pub mod service;

/// Metric name prefix for every exported series.
pub const NAMESPACE: &str = "digitalocean";

pub use client::{DigitalOceanClient, ResourceKind, ResourceSource};
pub use collector::ResourceCollector;
pub use error::TransportError;
pub use refresh::{RefreshBuffer, RefreshReport, RefreshSettings};
pub use service::{ResourceService, SnapshotSource};
