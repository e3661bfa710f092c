// tests/router_tests.rs

//! In-process router checks driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use campus_wall::{
    config::Config,
    error::AppError,
    routes::create_router,
    sentiment::{Sentiment, SentimentAnalyzer},
    state::AppState,
    store::MemoryStore,
};
use serde_json::Value;
use tower::ServiceExt;

struct OfflineAnalyzer;

#[async_trait]
impl SentimentAnalyzer for OfflineAnalyzer {
    async fn analyze(&self, _text: &str) -> Result<Sentiment, AppError> {
        Err(AppError::Upstream("offline".to_string()))
    }
}

fn router() -> Router {
    let config = Config {
        database_url: String::new(),
        jwt_secret: "router_test_secret".to_string(),
        jwt_expiration: 60,
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        sentiment_url: String::new(),
        sentiment_timeout_secs: 1,
        admin_username: None,
        admin_password: None,
        admin_email: None,
    };
    create_router(AppState {
        store: Arc::new(MemoryStore::new()),
        config,
        analyzer: Arc::new(OfflineAnalyzer),
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn categories_are_listed_with_display_names() {
    let response = router()
        .oneshot(
            Request::get("/api/posts/categories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let categories = body.as_array().unwrap();
    assert_eq!(categories.len(), 20);
    assert!(categories.iter().any(|c| c["code"] == "dining"));
}

#[tokio::test]
async fn unknown_category_is_a_validation_error() {
    let response = router()
        .oneshot(
            Request::get("/api/posts/category/astrology")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_FAILED");
}

#[tokio::test]
async fn search_requires_a_keyword() {
    let response = router()
        .oneshot(
            Request::get("/api/posts/search?keyword=%20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let response = router()
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/posts/feed")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:3000"
    );
}

#[tokio::test]
async fn admin_surface_requires_a_token() {
    let response = router()
        .oneshot(
            Request::get("/api/admin/posts/statuses")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "AUTHENTICATION_FAILED");
}
