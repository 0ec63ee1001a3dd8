//! Refresh buffer — background re-listing of every resource kind.
//!
//! Runs once at startup and then after every `interval`. Each cycle walks
//! the resource kinds in order, lists and aggregates each one, and swaps the
//! result into that kind's snapshot cell. A kind whose listing fails keeps
//! serving its previous snapshot until a later cycle succeeds.
//!
//! The delay is measured from the end of one cycle to the start of the next,
//! so slow API responses stretch the effective period.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregate::{
    aggregate, AggregateOptions, DropletKey, FloatingIpKey, LoadBalancerKey, Resource, TagKey,
    VolumeKey,
};
use crate::client::records::{Droplet, FloatingIp, LoadBalancer, Tag, Volume};
use crate::client::{ResourceKind, ResourceSource};
use crate::error::TransportError;
use crate::lister;

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotCell};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct RefreshSettings {
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    pub options: AggregateOptions,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            interval: DEFAULT_REFRESH_INTERVAL,
            options: AggregateOptions::default(),
        }
    }
}

// ── Cycle Report ────────────────────────────────────────────────────

/// A kind that refreshed successfully in a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRefresh {
    pub kind: ResourceKind,
    /// Records enumerated across all pages.
    pub records: usize,
    /// Distinct grouping keys in the new snapshot.
    pub series: usize,
}

/// A kind whose previous snapshot stayed in service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindFailure {
    pub kind: ResourceKind,
    pub error: String,
}

/// Outcome of one refresh cycle.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub refresh_id: Uuid,
    pub succeeded: Vec<KindRefresh>,
    pub failed: Vec<KindFailure>,
    pub duration: Duration,
}

impl RefreshReport {
    /// Every kind refreshed.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_kinds(&self) -> Vec<ResourceKind> {
        self.failed.iter().map(|f| f.kind).collect()
    }
}

// ── Buffer ──────────────────────────────────────────────────────────

pub struct RefreshBuffer {
    source: Arc<dyn ResourceSource>,
    settings: RefreshSettings,
    droplets: SnapshotCell<DropletKey>,
    floating_ips: SnapshotCell<FloatingIpKey>,
    load_balancers: SnapshotCell<LoadBalancerKey>,
    tags: SnapshotCell<TagKey>,
    volumes: SnapshotCell<VolumeKey>,
}

impl RefreshBuffer {
    /// A buffer with every snapshot empty. Nothing is fetched until
    /// [`refresh_once`](Self::refresh_once) or [`spawn`](Self::spawn).
    pub fn new(source: Arc<dyn ResourceSource>, settings: RefreshSettings) -> Self {
        Self {
            source,
            settings,
            droplets: SnapshotCell::new(),
            floating_ips: SnapshotCell::new(),
            load_balancers: SnapshotCell::new(),
            tags: SnapshotCell::new(),
            volumes: SnapshotCell::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.settings.interval
    }

    pub(crate) fn droplets(&self) -> Arc<Snapshot<DropletKey>> {
        self.droplets.load()
    }

    pub(crate) fn floating_ips(&self) -> Arc<Snapshot<FloatingIpKey>> {
        self.floating_ips.load()
    }

    pub(crate) fn load_balancers(&self) -> Arc<Snapshot<LoadBalancerKey>> {
        self.load_balancers.load()
    }

    pub(crate) fn tags(&self) -> Arc<Snapshot<TagKey>> {
        self.tags.load()
    }

    pub(crate) fn volumes(&self) -> Arc<Snapshot<VolumeKey>> {
        self.volumes.load()
    }

    /// When `kind` last refreshed successfully.
    pub fn last_refreshed(&self, kind: ResourceKind) -> Option<DateTime<Utc>> {
        match kind {
            ResourceKind::Droplets => self.droplets.load().refreshed_at(),
            ResourceKind::FloatingIps => self.floating_ips.load().refreshed_at(),
            ResourceKind::LoadBalancers => self.load_balancers.load().refreshed_at(),
            ResourceKind::Tags => self.tags.load().refreshed_at(),
            ResourceKind::Volumes => self.volumes.load().refreshed_at(),
        }
    }

    /// Run one full cycle over every resource kind.
    pub async fn refresh_once(&self) -> RefreshReport {
        let refresh_id = Uuid::new_v4();
        let started = Instant::now();
        info!(refresh_id = %refresh_id, "🔄 Refresh cycle starting");

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for kind in ResourceKind::ALL {
            let outcome = match kind {
                ResourceKind::Droplets => self.refresh_kind::<Droplet>(&self.droplets, refresh_id).await,
                ResourceKind::FloatingIps => {
                    self.refresh_kind::<FloatingIp>(&self.floating_ips, refresh_id).await
                }
                ResourceKind::LoadBalancers => {
                    self.refresh_kind::<LoadBalancer>(&self.load_balancers, refresh_id).await
                }
                ResourceKind::Tags => self.refresh_kind::<Tag>(&self.tags, refresh_id).await,
                ResourceKind::Volumes => self.refresh_kind::<Volume>(&self.volumes, refresh_id).await,
            };

            match outcome {
                Ok(done) => succeeded.push(done),
                Err(e) => {
                    match self.last_refreshed(kind) {
                        Some(at) => warn!(
                            refresh_id = %refresh_id,
                            kind = %kind,
                            stale_since = %at.to_rfc3339(),
                            "Refresh failed — serving previous snapshot: {}",
                            e
                        ),
                        None => warn!(
                            refresh_id = %refresh_id,
                            kind = %kind,
                            "Refresh failed — no snapshot yet, serving empty: {}",
                            e
                        ),
                    }
                    failed.push(KindFailure { kind, error: e.to_string() });
                }
            }
        }

        let report = RefreshReport {
            refresh_id,
            succeeded,
            failed,
            duration: started.elapsed(),
        };

        info!(
            refresh_id = %refresh_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            duration_ms = report.duration.as_millis() as u64,
            "🔄 Refresh cycle complete"
        );

        report
    }

    /// List, aggregate and publish one kind. Nothing is published on error.
    async fn refresh_kind<R: Resource>(
        &self,
        cell: &SnapshotCell<R::Key>,
        refresh_id: Uuid,
    ) -> Result<KindRefresh, TransportError> {
        let records: Vec<R> = lister::list_all(self.source.as_ref(), R::KIND).await?;
        let counts = aggregate(&records, &self.settings.options);
        let series = counts.len();

        cell.store(Snapshot::new(counts, refresh_id, Utc::now()));

        debug!(
            refresh_id = %refresh_id,
            kind = %R::KIND,
            records = records.len(),
            series,
            "Snapshot replaced"
        );

        Ok(KindRefresh {
            kind: R::KIND,
            records: records.len(),
            series,
        })
    }

    /// Refresh forever: one cycle now, then one per `interval` after each finishes.
    pub async fn run(self: Arc<Self>) {
        let interval = self.settings.interval;
        info!(interval_secs = interval.as_secs(), "📡 Refresh loop starting — initial cycle...");

        loop {
            let report = self.refresh_once().await;
            if report.duration > interval {
                warn!(
                    refresh_id = %report.refresh_id,
                    duration_ms = report.duration.as_millis() as u64,
                    interval_ms = interval.as_millis() as u64,
                    "Refresh cycle took longer than the refresh interval"
                );
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Start [`run`](Self::run) on the current tokio runtime.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(Arc::clone(self).run())
    }
}
