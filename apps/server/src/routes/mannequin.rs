// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mannequin preview endpoints.

use crate::error::ApiError;
use crate::page;
use crate::types::{MannequinRequest, PageConfig, WeightsResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Html,
    Json,
};
use std::collections::HashMap;

fn render(state: &AppState, request: &MannequinRequest) -> Result<Html<String>, ApiError> {
    let weights = WeightsResponse::compute(&request.params, &request.products, &state.mannequin);
    tracing::debug!(
        products = request.products.len(),
        signature = %weights.signature,
        garment = weights.garment.is_some(),
        "Rendering mannequin page"
    );

    let config = PageConfig::new(&state.config.model_url, weights, &state.mannequin);
    let html = page::render(&config, &state.config.three_module_url)?;
    Ok(Html(html))
}

/// GET /mannequin - Preview page from query parameters.
///
/// Lenient by construction: a malformed query renders the default mannequin.
pub async fn page_from_query(
    State(state): State<AppState>,
    query: Option<Query<HashMap<String, String>>>,
) -> Result<Html<String>, ApiError> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    render(&state, &MannequinRequest::from_query(&query))
}

/// POST /mannequin - Preview page from a JSON body.
pub async fn page_from_body(
    State(state): State<AppState>,
    payload: Result<Json<MannequinRequest>, JsonRejection>,
) -> Result<Html<String>, ApiError> {
    let Json(request) = payload?;
    render(&state, &request)
}

/// POST /api/v1/mannequin/weights - Weights, clamped measurements and garment
/// binding as JSON.
pub async fn weights(
    State(state): State<AppState>,
    payload: Result<Json<MannequinRequest>, JsonRejection>,
) -> Result<Json<WeightsResponse>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(WeightsResponse::compute(
        &request.params,
        &request.products,
        &state.mannequin,
    )))
}

#[cfg(test)]
mod tests {
    use crate::build_router;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(&Config {
            model_url: "/assets/mannequin.glb".into(),
            ..Config::default()
        })
    }

    async fn text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), 1 << 20).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_page_from_query() {
        let uri = "/mannequin?height=200&chest=abc&products=%5B%7B%22id%22%3A%221%22%2C%22type%22%3A%22shirt%22%7D%5D";
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html"));

        let html = text(response).await;
        assert!(html.contains(r#""modelUrl":"/assets/mannequin.glb""#));
        assert!(html.contains(r#""Height":1.0"#));
        assert!(html.contains(r#""Chest":0.5"#));
        // id "1" falls back to the built-in colour table
        assert!(html.contains(r##""color":"#1e3a8a""##));
    }

    #[tokio::test]
    async fn test_malformed_products_hide_garment() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/mannequin?products=not-json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(text(response).await.contains(r#""garment":null"#));
    }

    #[tokio::test]
    async fn test_page_from_body() {
        let response = app()
            .oneshot(post_json(
                "/mannequin",
                r##"{"waist": 100, "products": [{"id": 9, "type": "shirt", "color": "#112233"}]}"##,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = text(response).await;
        assert!(html.contains(r#""Waist":1.0"#));
        assert!(html.contains(r#""colorValue":1122867"#));
    }

    #[tokio::test]
    async fn test_weights_endpoint() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/mannequin/weights",
                r#"{"height": 150, "products": [{"id": "b"}, {"id": "a", "color": 255}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(json["params"]["height"], 160.0);
        assert_eq!(json["weights"]["Height"], 0.0);
        assert_eq!(json["garment"]["productId"], "b");
        assert_eq!(json["garment"]["color"], "#ffffff");
        assert_eq!(json["signature"], "a,b");
    }

    #[tokio::test]
    async fn test_products_without_ids_are_accepted() {
        let response = app()
            .oneshot(post_json(
                "/api/v1/mannequin/weights",
                r##"{"products": [{"type": "shirt", "color": "#112233"}, {"id": null}]}"##,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(json["garment"]["color"], "#112233");
        assert_eq!(json["signature"], ",");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        let response = app()
            .oneshot(post_json("/api/v1/mannequin/weights", "{"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(json["code"], "INVALID_BODY");
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&text(response).await).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
