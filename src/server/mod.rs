//! HTTP exposition server.
//!
//! Serves the registry in Prometheus text format on the configured metrics
//! path and a small index page on `/`. Scrapes only read snapshots; they
//! never wait on the DigitalOcean API.

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, Registry, TextEncoder};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    registry: Registry,
    metrics_path: Arc<str>,
}

/// Routes for `metrics_path` and the `/` index page.
///
/// When `metrics_path` is `/` the index is not mounted.
pub fn router(registry: Registry, metrics_path: &str) -> Router {
    let state = AppState {
        registry,
        metrics_path: Arc::from(metrics_path),
    };

    let mut app = Router::new().route(metrics_path, get(metrics));
    if metrics_path != "/" {
        app = app.route("/", get(index));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Serve `app` until Ctrl-C or SIGTERM.
pub async fn serve(listener: TcpListener, app: Router) -> Result<()> {
    let addr = listener.local_addr().context("Listener has no local address")?;
    info!("🚀 Exporter listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Exporter stopped");
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────

async fn metrics(State(state): State<AppState>) -> Response {
    let encoder = TextEncoder::new();
    let families = state.registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("failed to encode metrics: {}", e))
            .into_response();
    }

    ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response()
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n\
         <head><title>DigitalOcean Exporter</title></head>\n\
         <body>\n\
         <h1>DigitalOcean Exporter</h1>\n\
         <p><a href='{}'>Metrics</a></p>\n\
         </body>\n\
         </html>\n",
        state.metrics_path
    ))
}

// ── Shutdown ────────────────────────────────────────────────────────

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl-C — shutting down"),
        _ = terminate => info!("Received SIGTERM — shutting down"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ResourceKind;
    use crate::collector::ResourceCollector;
    use crate::lister::tests::PagedSource;
    use crate::refresh::{RefreshBuffer, RefreshSettings};
    use crate::service::ResourceService;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;

    async fn refreshed_registry() -> Registry {
        let source = Arc::new(PagedSource::default().with_pages(
            ResourceKind::Droplets,
            vec![vec![
                json!({"status": "active", "size": {"slug": "1gb"}, "region": {"slug": "nyc3"}}),
                json!({"status": "active", "size": {"slug": "1gb"}, "region": {"slug": "nyc3"}}),
            ]],
        ));
        let settings = RefreshSettings::default();
        let options = settings.options;
        let buffer = Arc::new(RefreshBuffer::new(source, settings));
        buffer.refresh_once().await;

        let collector =
            ResourceCollector::new(Arc::new(ResourceService::new(buffer)), &options).unwrap();
        let registry = Registry::new();
        registry.register(Box::new(collector)).unwrap();
        registry
    }

    async fn get_path(app: Router, path: &str) -> (StatusCode, Option<String>, String) {
        let response = app
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_route_serves_text_exposition() {
        let app = router(refreshed_registry().await, "/metrics");

        let (status, content_type, body) = get_path(app, "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; version=0.0.4"));
        assert!(body.contains("# TYPE digitalocean_droplets_count gauge"));
        assert!(
            body.contains(r#"digitalocean_droplets_count{region="nyc3",size="1gb",status="active"} 2"#),
            "unexpected body:\n{}",
            body
        );
        // Never-refreshed kinds are absent, not zero.
        assert!(!body.contains("digitalocean_volumes_count"));
    }

    #[tokio::test]
    async fn test_custom_metrics_path() {
        let app = router(refreshed_registry().await, "/scrape/do");

        let (status, _, body) = get_path(app.clone(), "/scrape/do").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("digitalocean_droplets_count"));

        let (status, _, _) = get_path(app, "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_links_to_metrics_path() {
        let app = router(Registry::new(), "/scrape/do");

        let (status, content_type, body) = get_path(app, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(body.contains("<title>DigitalOcean Exporter</title>"));
        assert!(body.contains("<a href='/scrape/do'>Metrics</a>"));
    }

    #[tokio::test]
    async fn test_metrics_at_root_replaces_index() {
        let app = router(refreshed_registry().await, "/");
        let (status, _, body) = get_path(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("digitalocean_droplets_count"));
    }

    #[tokio::test]
    async fn test_serve_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(refreshed_registry().await, "/metrics");
        let server = tokio::spawn(serve(listener, app));

        let body = reqwest::get(format!("http://{}/metrics", addr))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert!(body.contains(r#"status="active"} 2"#));

        server.abort();
    }
}
