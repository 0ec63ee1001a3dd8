//! Command-line and environment configuration.

use clap::Parser;
use std::time::Duration;

use crate::aggregate::{AggregateOptions, DropletDetail};
use crate::client::digitalocean::DEFAULT_API_URL;
use crate::refresh::RefreshSettings;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// DigitalOcean API token (read-only scope is enough)
    #[arg(long, env = "DIGITALOCEAN_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Listen address for the exporter
    #[arg(long, env = "DO_EXPORTER_LISTEN", default_value = "localhost:9292")]
    pub listen: String,

    /// URL path for surfacing metrics
    #[arg(
        long,
        env = "DO_EXPORTER_METRICS_PATH",
        default_value = "/metrics",
        value_parser = parse_metrics_path
    )]
    pub metrics_path: String,

    /// Seconds between the end of one refresh and the start of the next
    #[arg(
        long,
        env = "DO_EXPORTER_REFRESH_INTERVAL",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub refresh_interval: u64,

    /// Timeout in seconds for each API request
    #[arg(
        long,
        env = "DO_EXPORTER_REQUEST_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub request_timeout: u64,

    /// DigitalOcean API base URL
    #[arg(long, env = "DO_EXPORTER_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Label droplet counts with hourly and monthly price
    #[arg(long, env = "DO_EXPORTER_DROPLET_PRICES")]
    pub droplet_prices: bool,

    /// Label droplet counts with the droplet's tag list
    #[arg(long, env = "DO_EXPORTER_DROPLET_TAGS")]
    pub droplet_tags: bool,

    /// Print debug logs
    #[arg(long, env = "DO_EXPORTER_DEBUG")]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, env = "DO_EXPORTER_LOG_JSON")]
    pub log_json: bool,
}

impl Args {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            droplet_detail: DropletDetail {
                prices: self.droplet_prices,
                tags: self.droplet_tags,
            },
        }
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            interval: self.refresh_interval(),
            options: self.aggregate_options(),
        }
    }

    /// `RUST_LOG`-style directive used when `RUST_LOG` is unset.
    pub fn default_log_filter(&self) -> &'static str {
        if self.debug {
            "digitalocean_exporter=debug,tower_http=debug"
        } else {
            "digitalocean_exporter=info"
        }
    }
}

/// A literal route path: absolute, with no `:` captures or `*` wildcards.
fn parse_metrics_path(s: &str) -> Result<String, String> {
    if !s.starts_with('/') {
        return Err(format!("metrics path must start with '/', got {:?}", s));
    }
    if let Some(c) = s.chars().find(|c| matches!(c, ':' | '*')) {
        return Err(format!("metrics path must not contain {:?}, got {:?}", c, s));
    }
    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Args, clap::Error> {
        let mut argv = vec!["digitalocean-exporter", "--token", "dop_v1_test"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv)
    }

    #[test]
    fn test_explicit_flags() {
        let args = parse(&[
            "--listen",
            "0.0.0.0:9100",
            "--metrics-path",
            "/scrape",
            "--refresh-interval",
            "300",
            "--request-timeout",
            "5",
            "--api-url",
            "http://127.0.0.1:8080",
            "--droplet-prices",
            "--debug",
        ])
        .unwrap();

        assert_eq!(args.token, "dop_v1_test");
        assert_eq!(args.listen, "0.0.0.0:9100");
        assert_eq!(args.metrics_path, "/scrape");
        assert_eq!(args.refresh_interval(), Duration::from_secs(300));
        assert_eq!(args.request_timeout(), Duration::from_secs(5));
        assert_eq!(args.api_url, "http://127.0.0.1:8080");
        assert_eq!(
            args.aggregate_options().droplet_detail,
            DropletDetail { prices: true, tags: false }
        );
        assert_eq!(args.default_log_filter(), "digitalocean_exporter=debug,tower_http=debug");

        let settings = args.refresh_settings();
        assert_eq!(settings.interval, Duration::from_secs(300));
        assert!(settings.options.droplet_detail.prices);
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        assert!(parse(&["--refresh-interval", "0"]).is_err());
        assert!(parse(&["--request-timeout", "0"]).is_err());
    }

    #[test]
    fn test_metrics_path_must_be_absolute() {
        let err = parse(&["--metrics-path", "metrics"]).unwrap_err();
        assert!(err.to_string().contains("must start with '/'"));
    }

    #[test]
    fn test_parse_metrics_path() {
        assert_eq!(parse_metrics_path("/metrics").unwrap(), "/metrics");
        assert!(parse_metrics_path("").is_err());
    }

    #[test]
    fn test_metrics_path_rejects_route_patterns() {
        for path in ["/met*rics", "/a/:", "/:x", "/metrics/*rest"] {
            let err = parse(&["--metrics-path", path]).unwrap_err();
            assert!(err.to_string().contains("must not contain"), "{}: {}", path, err);
        }
        let args = parse(&["--metrics-path", "/scrape/do-metrics"]).unwrap();
        assert_eq!(args.metrics_path, "/scrape/do-metrics");
    }
}
