//! Resource lister interface — how the refresh buffer reads the cloud API.
//!
//! The buffer only ever asks for one page of one resource kind at a time.
//! `DigitalOceanClient` implements this over HTTPS; tests implement it over
//! in-memory pages. Pagination itself lives in [`crate::lister`].

use async_trait::async_trait;
use std::fmt;

use crate::error::TransportError;

pub mod digitalocean;
pub mod records;

pub use digitalocean::DigitalOceanClient;

// ── Resource Kinds ──────────────────────────────────────────────────

/// Every resource kind the exporter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Droplets,
    FloatingIps,
    LoadBalancers,
    Tags,
    Volumes,
}

impl ResourceKind {
    /// Refresh order within one cycle.
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Droplets,
        ResourceKind::FloatingIps,
        ResourceKind::LoadBalancers,
        ResourceKind::Tags,
        ResourceKind::Volumes,
    ];

    /// Path under `/v2/` of the list endpoint.
    pub fn api_path(&self) -> &'static str {
        match self {
            ResourceKind::Droplets => "droplets",
            ResourceKind::FloatingIps => "floating_ips",
            ResourceKind::LoadBalancers => "load_balancers",
            ResourceKind::Tags => "tags",
            ResourceKind::Volumes => "volumes",
        }
    }

    /// Field of the response body holding the page's records.
    pub fn collection_field(&self) -> &'static str {
        // Every list endpoint names its array after the path.
        self.api_path()
    }

    /// Metric subsystem, e.g. `droplets` in `digitalocean_droplets_count`.
    pub fn subsystem(&self) -> &'static str {
        self.api_path()
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_path())
    }
}

// ── Paging ──────────────────────────────────────────────────────────

/// One page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

/// One page of raw records, still undecoded.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    pub items: Vec<serde_json::Value>,
    /// Whether the API advertised a further page.
    pub has_next: bool,
}

// ── Lister Trait ────────────────────────────────────────────────────

/// A paginated, authenticated source of resource records.
///
/// Any error is fatal to the current cycle's listing of that kind.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn list_page(
        &self,
        kind: ResourceKind,
        page: PageRequest,
    ) -> Result<ListPage, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_paths() {
        let paths: Vec<&str> = ResourceKind::ALL.iter().map(|k| k.api_path()).collect();
        assert_eq!(
            paths,
            vec!["droplets", "floating_ips", "load_balancers", "tags", "volumes"]
        );
        assert_eq!(ResourceKind::FloatingIps.to_string(), "floating_ips");
    }
}
