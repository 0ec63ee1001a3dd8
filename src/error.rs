//! Errors raised while talking to the DigitalOcean API.
//!
//! Every failure a list call can hit (network, auth, rate limit, bad status,
//! undecodable body) is a `TransportError`. The refresh task catches these at
//! its boundary; they never reach a scrape.

use thiserror::Error;

use crate::client::ResourceKind;

#[derive(Debug, Error)]
pub enum TransportError {
    /// The request never produced a response (connect, TLS, timeout).
    #[error("request for {kind} failed: {source}")]
    Http {
        kind: ResourceKind,
        #[source]
        source: reqwest::Error,
    },

    /// The API rejected the token.
    #[error("unauthorized listing {kind} (HTTP {status}): {message}")]
    Unauthorized {
        kind: ResourceKind,
        status: u16,
        message: String,
    },

    /// HTTP 429. `retry_after_secs` comes from the response headers when present.
    #[error("rate limited listing {kind}{}", retry_hint(.retry_after_secs))]
    RateLimited {
        kind: ResourceKind,
        retry_after_secs: Option<u64>,
    },

    /// Any other non-2xx response.
    #[error("listing {kind} failed with HTTP {status}: {message}")]
    Status {
        kind: ResourceKind,
        status: u16,
        message: String,
    },

    /// The body (or one of its records) did not match the expected shape.
    #[error("could not decode {kind} page {page}: {source}")]
    Decode {
        kind: ResourceKind,
        page: u32,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// The resource kind whose listing failed.
    pub fn kind(&self) -> ResourceKind {
        match self {
            TransportError::Http { kind, .. }
            | TransportError::Unauthorized { kind, .. }
            | TransportError::RateLimited { kind, .. }
            | TransportError::Status { kind, .. }
            | TransportError::Decode { kind, .. } => *kind,
        }
    }
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(" (retry after {}s)", secs),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_message_includes_retry_hint() {
        let err = TransportError::RateLimited {
            kind: ResourceKind::Droplets,
            retry_after_secs: Some(30),
        };
        assert_eq!(err.to_string(), "rate limited listing droplets (retry after 30s)");

        let err = TransportError::RateLimited {
            kind: ResourceKind::Volumes,
            retry_after_secs: None,
        };
        assert_eq!(err.to_string(), "rate limited listing volumes");
    }

    #[test]
    fn test_kind_accessor() {
        let err = TransportError::Status {
            kind: ResourceKind::Tags,
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.kind(), ResourceKind::Tags);
        assert_eq!(err.to_string(), "listing tags failed with HTTP 500: boom");
    }
}
