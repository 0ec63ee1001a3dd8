//! Typed views of DigitalOcean API objects.
//!
//! Only the fields the aggregation rules read are modelled; everything else
//! in the API payload is ignored. Absent optional fields fall back to empty
//! values so a sparse record still counts.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Size {
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub price_hourly: f64,
    #[serde(default)]
    pub price_monthly: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Droplet {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub size: Size,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The droplet a floating IP points at.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DropletRef {
    #[serde(default)]
    pub id: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FloatingIp {
    #[serde(default)]
    pub region: Region,
    /// `null` in the API when unassigned.
    #[serde(default)]
    pub droplet: Option<DropletRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LoadBalancer {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub region: Region,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaggedCount {
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TagResources {
    #[serde(default)]
    pub droplets: TaggedCount,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default)]
    pub resources: TagResources,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Volume {
    #[serde(default)]
    pub region: Region,
    #[serde(default)]
    pub droplet_ids: Vec<u64>,
    #[serde(default)]
    pub size_gigabytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floating_ip_null_droplet() {
        let fip: FloatingIp =
            serde_json::from_str(r#"{"droplet": null, "region": {"slug": "nyc3"}}"#).unwrap();
        assert!(fip.droplet.is_none());
        assert_eq!(fip.region.slug, "nyc3");

        let fip: FloatingIp =
            serde_json::from_str(r#"{"droplet": {"id": 7}, "region": {"slug": "nyc3"}}"#).unwrap();
        assert_eq!(fip.droplet, Some(DropletRef { id: 7 }));
    }

    #[test]
    fn test_droplet_ignores_unknown_fields() {
        let d: Droplet = serde_json::from_str(
            r#"{"id": 1, "name": "web-1", "status": "active",
                "size": {"slug": "1gb", "price_hourly": 0.01488, "price_monthly": 5.0, "vcpus": 1},
                "region": {"slug": "nyc3", "name": "New York 3"},
                "tags": ["web", "prod"]}"#,
        )
        .unwrap();
        assert_eq!(d.status, "active");
        assert_eq!(d.size.slug, "1gb");
        assert_eq!(d.size.price_monthly, 5.0);
        assert_eq!(d.tags, vec!["web".to_string(), "prod".to_string()]);
    }

    #[test]
    fn test_tag_without_resources_counts_zero() {
        let t: Tag = serde_json::from_str(r#"{"name": "empty"}"#).unwrap();
        assert_eq!(t.resources.droplets.count, 0);
    }
}
