//! DigitalOcean API client — the HTTPS implementation of `ResourceSource`.
//!
//! Issues `GET /v2/{kind}?page=N&per_page=M` with the bearer token and maps
//! every failure onto a `TransportError`. Rate limiting is reported, never
//! retried here: the next refresh cycle is the retry.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

use super::{ListPage, PageRequest, ResourceKind, ResourceSource};
use crate::error::TransportError;

/// Public API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.digitalocean.com";

const USER_AGENT: &str = concat!("digitalocean-exporter/", env!("CARGO_PKG_VERSION"));

/// Longest error body echoed into a `TransportError`.
const MAX_ERROR_CHARS: usize = 500;

pub struct DigitalOceanClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DigitalOceanClient {
    /// Build a client. `timeout` bounds each individual page request.
    pub fn new(
        token: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn page_url(&self, kind: ResourceKind, page: PageRequest) -> String {
        format!(
            "{}/v2/{}?page={}&per_page={}",
            self.base_url,
            kind.api_path(),
            page.page,
            page.per_page
        )
    }
}

#[async_trait]
impl ResourceSource for DigitalOceanClient {
    async fn list_page(
        &self,
        kind: ResourceKind,
        page: PageRequest,
    ) -> Result<ListPage, TransportError> {
        let resp = self
            .client
            .get(self.page_url(kind, page))
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| TransportError::Http { kind, source })?;

        let status = resp.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(TransportError::RateLimited {
                kind,
                retry_after_secs: retry_after_secs(resp.headers()),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let message = error_message(&body);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TransportError::Unauthorized {
                    kind,
                    status: status.as_u16(),
                    message,
                },
                _ => TransportError::Status {
                    kind,
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|source| TransportError::Http { kind, source })?;

        parse_page(kind, page.page, &body)
    }
}

// ── Response Parsing ────────────────────────────────────────────────

/// Split a list response into its records and the "next page" indicator.
fn parse_page(kind: ResourceKind, page: u32, body: &[u8]) -> Result<ListPage, TransportError> {
    let decode = |source| TransportError::Decode { kind, page, source };

    let mut body: Value = serde_json::from_slice(body).map_err(decode)?;

    let items = match body.get_mut(kind.collection_field()).map(Value::take) {
        None | Some(Value::Null) => Vec::new(),
        Some(raw) => serde_json::from_value::<Vec<Value>>(raw).map_err(decode)?,
    };

    let has_next = body
        .pointer("/links/pages/next")
        .and_then(Value::as_str)
        .is_some_and(|next| !next.is_empty());

    Ok(ListPage { items, has_next })
}

/// Pull `message` out of an API error body, else echo the (truncated) body.
fn error_message(body: &str) -> String {
    let parsed: Value = serde_json::from_str(body).unwrap_or_default();
    match parsed["message"].as_str() {
        Some(msg) => msg.to_string(),
        None => body.trim().chars().take(MAX_ERROR_CHARS).collect(),
    }
}

/// Seconds until the rate limit lifts.
///
/// Prefers `Retry-After`; falls back to DigitalOcean's `RateLimit-Reset`,
/// which is a unix timestamp.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    let get = |name: &str| -> Option<u64> { headers.get(name)?.to_str().ok()?.trim().parse().ok() };

    if let Some(secs) = get("retry-after") {
        return Some(secs);
    }

    let reset_at = get("ratelimit-reset")?;
    let now = chrono::Utc::now().timestamp().max(0) as u64;
    Some(reset_at.saturating_sub(now))
}
