//! Prometheus collector over the current resource snapshots.
//!
//! Nothing is cached between scrapes: every `collect` reads each snapshot
//! once and builds fresh gauge families from it.

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{GaugeVec, Opts};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

use crate::aggregate::{AggregateOptions, GroupingKey, Resource};
use crate::client::records::{Droplet, FloatingIp, LoadBalancer, Tag, Volume};
use crate::client::ResourceKind;
use crate::refresh::Snapshot;
use crate::service::SnapshotSource;
use crate::NAMESPACE;

/// One exported series: `digitalocean_<subsystem>_count`.
struct Series {
    kind: ResourceKind,
    opts: Opts,
    labels: Vec<&'static str>,
    desc: Desc,
}

impl Series {
    fn new<R: Resource>(options: &AggregateOptions, help: &str) -> prometheus::Result<Self> {
        let opts = Opts::new("count", help)
            .namespace(NAMESPACE)
            .subsystem(R::KIND.subsystem());
        let labels = R::label_names(options);
        let desc = Desc::new(
            opts.fq_name(),
            help.to_string(),
            labels.iter().map(|l| l.to_string()).collect(),
            HashMap::new(),
        )?;
        Ok(Self {
            kind: R::KIND,
            opts,
            labels,
            desc,
        })
    }

    /// One gauge per key, valued at its count. Empty snapshots emit nothing.
    fn emit<K: GroupingKey>(&self, snapshot: &Snapshot<K>, out: &mut Vec<MetricFamily>) {
        if snapshot.is_empty() {
            return;
        }

        let gauges = match GaugeVec::new(self.opts.clone(), &self.labels) {
            Ok(g) => g,
            Err(e) => {
                warn!(kind = %self.kind, "Failed to build gauge family: {}", e);
                return;
            }
        };

        for (key, count) in snapshot.iter() {
            match gauges.get_metric_with_label_values(&key.label_values()) {
                Ok(gauge) => gauge.set(count as f64),
                Err(e) => warn!(kind = %self.kind, key = ?key, "Dropping sample: {}", e),
            }
        }

        out.extend(gauges.collect());
    }
}

pub struct ResourceCollector {
    source: Arc<dyn SnapshotSource>,
    droplets: Series,
    floating_ips: Series,
    load_balancers: Series,
    tags: Series,
    volumes: Series,
}

impl ResourceCollector {
    /// `options` must match the ones the buffer aggregates with, so the
    /// droplet descriptor carries the same labels as its samples.
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        options: &AggregateOptions,
    ) -> prometheus::Result<Self> {
        Ok(Self {
            source,
            droplets: Series::new::<Droplet>(
                options,
                "Number of Droplets by region, size, and status.",
            )?,
            floating_ips: Series::new::<FloatingIp>(
                options,
                "Number of Floating IPs by region and status.",
            )?,
            load_balancers: Series::new::<LoadBalancer>(
                options,
                "Number of Load Balancers by region and status.",
            )?,
            tags: Series::new::<Tag>(
                options,
                "Number of tagged resources by tag name and resource type.",
            )?,
            volumes: Series::new::<Volume>(
                options,
                "Number of Volumes by region, size in GiB, and status.",
            )?,
        })
    }
}

impl Collector for ResourceCollector {
    fn desc(&self) -> Vec<&Desc> {
        vec![
            &self.droplets.desc,
            &self.floating_ips.desc,
            &self.load_balancers.desc,
            &self.tags.desc,
            &self.volumes.desc,
        ]
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let mut families = Vec::with_capacity(5);
        self.droplets.emit(&self.source.droplets(), &mut families);
        self.floating_ips.emit(&self.source.floating_ips(), &mut families);
        self.load_balancers.emit(&self.source.load_balancers(), &mut families);
        self.tags.emit(&self.source.tags(), &mut families);
        self.volumes.emit(&self.source.volumes(), &mut families);
        families
    }
}
