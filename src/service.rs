//! Read-only view over the refresh buffer's current snapshots.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::aggregate::{DropletKey, FloatingIpKey, LoadBalancerKey, TagKey, VolumeKey};
use crate::client::ResourceKind;
use crate::refresh::{RefreshBuffer, Snapshot};

/// Current snapshot per resource kind.
///
/// Every accessor returns immediately with the mapping valid at call time.
/// A concurrent refresh may replace it right after; the returned handle keeps
/// pointing at the generation it was taken from.
pub trait SnapshotSource: Send + Sync {
    fn droplets(&self) -> Arc<Snapshot<DropletKey>>;
    fn floating_ips(&self) -> Arc<Snapshot<FloatingIpKey>>;
    fn load_balancers(&self) -> Arc<Snapshot<LoadBalancerKey>>;
    fn tags(&self) -> Arc<Snapshot<TagKey>>;
    fn volumes(&self) -> Arc<Snapshot<VolumeKey>>;

    /// When `kind` last refreshed successfully, `None` if never.
    fn last_refreshed(&self, kind: ResourceKind) -> Option<DateTime<Utc>>;
}

#[derive(Clone)]
pub struct ResourceService {
    buffer: Arc<RefreshBuffer>,
}

impl ResourceService {
    pub fn new(buffer: Arc<RefreshBuffer>) -> Self {
        Self { buffer }
    }
}

impl SnapshotSource for ResourceService {
    fn droplets(&self) -> Arc<Snapshot<DropletKey>> {
        self.buffer.droplets()
    }

    fn floating_ips(&self) -> Arc<Snapshot<FloatingIpKey>> {
        self.buffer.floating_ips()
    }

    fn load_balancers(&self) -> Arc<Snapshot<LoadBalancerKey>> {
        self.buffer.load_balancers()
    }

    fn tags(&self) -> Arc<Snapshot<TagKey>> {
        self.buffer.tags()
    }

    fn volumes(&self) -> Arc<Snapshot<VolumeKey>> {
        self.buffer.volumes()
    }

    fn last_refreshed(&self, kind: ResourceKind) -> Option<DateTime<Utc>> {
        self.buffer.last_refreshed(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lister::tests::PagedSource;
    use crate::refresh::RefreshSettings;
    use serde_json::json;

    fn service(source: Arc<PagedSource>) -> ResourceService {
        let buffer = Arc::new(RefreshBuffer::new(source, RefreshSettings::default()));
        ResourceService::new(buffer)
    }

    #[test]
    fn test_empty_before_first_refresh() {
        let svc = service(Arc::new(PagedSource::default()));
        assert!(svc.droplets().is_empty());
        assert!(svc.floating_ips().is_empty());
        assert!(svc.load_balancers().is_empty());
        assert!(svc.tags().is_empty());
        assert!(svc.volumes().is_empty());
        assert!(svc.last_refreshed(ResourceKind::Droplets).is_none());
    }

    #[tokio::test]
    async fn test_reads_do_not_touch_the_api() {
        let source = Arc::new(PagedSource::default().with_pages(
            ResourceKind::LoadBalancers,
            vec![vec![json!({"status": "active", "region": {"slug": "nyc3"}})]],
        ));
        let buffer = Arc::new(RefreshBuffer::new(source.clone(), RefreshSettings::default()));
        let svc = ResourceService::new(Arc::clone(&buffer));

        buffer.refresh_once().await;
        let requests_after_refresh = source.requests.lock().unwrap().len();

        for _ in 0..10 {
            let lbs = svc.load_balancers();
            let key = LoadBalancerKey { status: "active".into(), region: "nyc3".into() };
            assert_eq!(lbs.get(&key), Some(1));
            svc.droplets();
            svc.tags();
        }

        assert_eq!(source.requests.lock().unwrap().len(), requests_after_refresh);
        assert!(svc.last_refreshed(ResourceKind::LoadBalancers).is_some());
    }

    #[tokio::test]
    async fn test_handle_outlives_replacement() {
        let source = Arc::new(PagedSource::default().with_pages(
            ResourceKind::Tags,
            vec![vec![json!({"name": "web", "resources": {"droplets": {"count": 2}}})]],
        ));
        let buffer = Arc::new(RefreshBuffer::new(source.clone(), RefreshSettings::default()));
        let svc = ResourceService::new(Arc::clone(&buffer));

        buffer.refresh_once().await;
        let held = svc.tags();

        source.set_pages(
            ResourceKind::Tags,
            vec![vec![json!({"name": "db", "resources": {"droplets": {"count": 5}}})]],
        );
        buffer.refresh_once().await;

        assert_eq!(held.total(), 2);
        assert_eq!(svc.tags().total(), 5);
        assert!(!Arc::ptr_eq(&held, &svc.tags()));
    }
}
