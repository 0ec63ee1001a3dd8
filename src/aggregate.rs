//! Aggregator — reduces a full resource listing to grouped counts.
//!
//! Each resource record type knows its own grouping key and how much it
//! contributes to that key's count. Aggregation is a pure fold, so the
//! result never depends on record order.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::client::records::{Droplet, FloatingIp, LoadBalancer, Tag, Volume};
use crate::client::ResourceKind;

// ── Options ─────────────────────────────────────────────────────────

/// Extra droplet labels. Both off yields the plain `(region, size, status)` series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DropletDetail {
    /// Add `price_hourly` and `price_monthly`.
    pub prices: bool,
    /// Add the comma-joined `tags` list.
    pub tags: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    pub droplet_detail: DropletDetail,
}

// ── Resource Trait ──────────────────────────────────────────────────

/// A record type the exporter counts, with its statically known grouping rule.
pub trait Resource: DeserializeOwned + Send + 'static {
    const KIND: ResourceKind;

    type Key: GroupingKey;

    /// Label names of the metric series, in the order `GroupingKey::label_values` yields.
    fn label_names(opts: &AggregateOptions) -> Vec<&'static str>;

    fn key(&self, opts: &AggregateOptions) -> Self::Key;

    /// How much this record adds to its key's count.
    fn weight(&self) -> u64 {
        1
    }
}

/// The categorical attributes of one metric series.
pub trait GroupingKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    fn label_values(&self) -> Vec<&str>;
}

/// Group `records` by key and count them.
pub fn aggregate<R: Resource>(records: &[R], opts: &AggregateOptions) -> HashMap<R::Key, u64> {
    let mut counts: HashMap<R::Key, u64> = HashMap::new();
    for record in records {
        *counts.entry(record.key(opts)).or_insert(0) += record.weight();
    }
    counts
}

// ── Droplets ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DropletKey {
    pub status: String,
    pub region: String,
    pub size: String,
    pub price_hourly: Option<String>,
    pub price_monthly: Option<String>,
    pub tags: Option<String>,
}

impl DropletKey {
    pub fn new(status: &str, region: &str, size: &str) -> Self {
        Self {
            status: status.into(),
            region: region.into(),
            size: size.into(),
            price_hourly: None,
            price_monthly: None,
            tags: None,
        }
    }
}

impl GroupingKey for DropletKey {
    fn label_values(&self) -> Vec<&str> {
        let mut values = vec![self.region.as_str(), self.size.as_str(), self.status.as_str()];
        if let (Some(hourly), Some(monthly)) = (&self.price_hourly, &self.price_monthly) {
            values.push(hourly);
            values.push(monthly);
        }
        if let Some(tags) = &self.tags {
            values.push(tags);
        }
        values
    }
}

impl Resource for Droplet {
    const KIND: ResourceKind = ResourceKind::Droplets;
    type Key = DropletKey;

    fn label_names(opts: &AggregateOptions) -> Vec<&'static str> {
        let mut names = vec!["region", "size", "status"];
        if opts.droplet_detail.prices {
            names.extend(["price_hourly", "price_monthly"]);
        }
        if opts.droplet_detail.tags {
            names.push("tags");
        }
        names
    }

    fn key(&self, opts: &AggregateOptions) -> DropletKey {
        let detail = opts.droplet_detail;
        DropletKey {
            status: self.status.clone(),
            region: self.region.slug.clone(),
            size: self.size.slug.clone(),
            price_hourly: detail.prices.then(|| self.size.price_hourly.to_string()),
            price_monthly: detail.prices.then(|| self.size.price_monthly.to_string()),
            tags: detail.tags.then(|| self.tags.join(",")),
        }
    }
}

// ── Floating IPs ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatingIpStatus {
    Assigned,
    Unassigned,
}

impl FloatingIpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloatingIpStatus::Assigned => "assigned",
            FloatingIpStatus::Unassigned => "unassigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FloatingIpKey {
    pub status: FloatingIpStatus,
    pub region: String,
}

impl GroupingKey for FloatingIpKey {
    fn label_values(&self) -> Vec<&str> {
        vec![self.region.as_str(), self.status.as_str()]
    }
}

impl Resource for FloatingIp {
    const KIND: ResourceKind = ResourceKind::FloatingIps;
    type Key = FloatingIpKey;

    fn label_names(_opts: &AggregateOptions) -> Vec<&'static str> {
        vec!["region", "status"]
    }

    fn key(&self, _opts: &AggregateOptions) -> FloatingIpKey {
        let status = match self.droplet {
            Some(_) => FloatingIpStatus::Assigned,
            None => FloatingIpStatus::Unassigned,
        };
        FloatingIpKey {
            status,
            region: self.region.slug.clone(),
        }
    }
}

// ── Load Balancers ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadBalancerKey {
    pub status: String,
    pub region: String,
}

impl GroupingKey for LoadBalancerKey {
    fn label_values(&self) -> Vec<&str> {
        vec![self.region.as_str(), self.status.as_str()]
    }
}

impl Resource for LoadBalancer {
    const KIND: ResourceKind = ResourceKind::LoadBalancers;
    type Key = LoadBalancerKey;

    fn label_names(_opts: &AggregateOptions) -> Vec<&'static str> {
        vec!["region", "status"]
    }

    fn key(&self, _opts: &AggregateOptions) -> LoadBalancerKey {
        LoadBalancerKey {
            status: self.status.clone(),
            region: self.region.slug.clone(),
        }
    }
}

// ── Tags ────────────────────────────────────────────────────────────

/// Resource kinds a tag count can refer to. Only droplets are reported today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaggedResource {
    Droplets,
}

impl TaggedResource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaggedResource::Droplets => "droplets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagKey {
    pub name: String,
    pub resource_type: TaggedResource,
}

impl GroupingKey for TagKey {
    fn label_values(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.resource_type.as_str()]
    }
}

impl Resource for Tag {
    const KIND: ResourceKind = ResourceKind::Tags;
    type Key = TagKey;

    fn label_names(_opts: &AggregateOptions) -> Vec<&'static str> {
        vec!["name", "resource_type"]
    }

    fn key(&self, _opts: &AggregateOptions) -> TagKey {
        TagKey {
            name: self.name.clone(),
            resource_type: TaggedResource::Droplets,
        }
    }

    /// A tag contributes the number of droplets carrying it, not 1.
    fn weight(&self) -> u64 {
        self.resources.droplets.count
    }
}

// ── Volumes ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeStatus {
    Attached,
    Unattached,
}

impl VolumeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeStatus::Attached => "attached",
            VolumeStatus::Unattached => "unattached",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeKey {
    pub status: VolumeStatus,
    pub region: String,
    /// Capacity in GiB, rendered in decimal.
    pub size: String,
}

impl GroupingKey for VolumeKey {
    fn label_values(&self) -> Vec<&str> {
        vec![self.region.as_str(), self.size.as_str(), self.status.as_str()]
    }
}

impl Resource for Volume {
    const KIND: ResourceKind = ResourceKind::Volumes;
    type Key = VolumeKey;

    fn label_names(_opts: &AggregateOptions) -> Vec<&'static str> {
        vec!["region", "size", "status"]
    }

    fn key(&self, _opts: &AggregateOptions) -> VolumeKey {
        let status = if self.droplet_ids.is_empty() {
            VolumeStatus::Unattached
        } else {
            VolumeStatus::Attached
        };
        VolumeKey {
            status,
            region: self.region.slug.clone(),
            size: self.size_gigabytes.to_string(),
        }
    }
}
