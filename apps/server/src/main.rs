// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mannequin Server - preview page and shape-key weights over HTTP.
//!
//! The server turns body measurements and a product selection into a
//! self-contained preview page (three.js, loaded from a CDN) or into the raw
//! weights a client-side viewer needs.
//!
//! # Endpoints
//!
//! - `GET /api/v1/health` - Health check
//! - `GET /mannequin` - Preview page from query parameters
//! - `POST /mannequin` - Preview page from a JSON body
//! - `POST /api/v1/mannequin/weights` - Weights and garment colour (JSON)

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use mannequin_core::MannequinConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

mod config;
mod error;
mod page;
mod routes;
mod types;

use config::Config;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub mannequin: Arc<MannequinConfig>,
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_is_permissive() {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Wrap a router in the common middleware stack.
fn with_middleware<S>(router: Router<S>, config: &Config) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(DefaultBodyLimit::max(config.max_body_kb * 1024))
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}

/// Build the application router.
pub fn build_router(config: &Config) -> Router {
    let state = AppState {
        config: Arc::new(config.clone()),
        mannequin: Arc::new(MannequinConfig::default()),
    };

    let router = Router::new()
        // Root endpoint - API information
        .route("/", get(routes::health::info))
        // Health check
        .route("/api/v1/health", get(routes::health::check))
        // Preview page
        .route(
            "/mannequin",
            get(routes::mannequin::page_from_query).post(routes::mannequin::page_from_body),
        )
        // Weights
        .route("/api/v1/mannequin/weights", post(routes::mannequin::weights));

    with_middleware(router, config).with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,tower_http=debug,mannequin_server=debug".into());
    if std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).pretty().init();
    }

    let config = Config::from_env();

    tracing::info!(
        port = config.port,
        model_url = %config.model_url,
        request_timeout_secs = config.request_timeout_secs,
        max_body_kb = config.max_body_kb,
        "Starting Mannequin Server"
    );

    let app = build_router(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_panics_become_generic_500() {
        let router: Router = with_middleware(
            Router::new().route(
                "/boom",
                get(|| async {
                    if true {
                        panic!("secret detail");
                    }
                    "unreachable"
                }),
            ),
            &Config::default(),
        );

        let response = router
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_info_lists_endpoints() {
        let response = build_router(&Config::default())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), 1 << 16).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["service"], "mannequin-server");
        assert!(body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .any(|e| e["path"] == "/mannequin"));
    }

    #[tokio::test]
    async fn test_restricted_cors() {
        let config = Config {
            cors_origins: vec!["https://shop.example".into()],
            ..Config::default()
        };
        let response = build_router(&config)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header(header::ORIGIN, "https://shop.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "https://shop.example"
        );
    }
}
