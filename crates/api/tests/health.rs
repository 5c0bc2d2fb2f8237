//! Integration tests for the health check endpoint and general HTTP behaviour.

mod common;

use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use common::{body_json, build_test_app, send};
use nsi_core::testing::InMemoryStore;

fn plain_get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_check_returns_ok_with_json() {
    let app = build_test_app(&InMemoryStore::new());
    let response = send(&app, plain_get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert_eq!(json["store_healthy"], true);
}

#[tokio::test]
async fn health_check_reports_unreachable_store() {
    let store = InMemoryStore::new();
    store.fail_reads(true);
    let app = build_test_app(&store);

    let response = send(&app, plain_get("/health")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["store_healthy"], false);
}

#[tokio::test]
async fn health_check_treats_slow_store_as_unhealthy() {
    let store = InMemoryStore::new();
    store.set_latency(Some(Duration::from_millis(300)));
    let mut config = common::test_config();
    config.operation_timeout_ms = 20;
    let app = nsi_api::router::build_app_router(common::test_state(&store, config.clone()), &config);

    let response = send(&app, plain_get("/health")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let app = build_test_app(&InMemoryStore::new());
    let response = send(&app, plain_get("/this-route-does-not-exist")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let app = build_test_app(&InMemoryStore::new());
    let response = send(&app, plain_get("/health")).await;

    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("Response must contain an x-request-id header");
    assert_eq!(request_id.to_str().unwrap().len(), 36, "x-request-id should be a UUID string");
}

#[tokio::test]
async fn cors_preflight_returns_correct_headers() {
    let app = build_test_app(&InMemoryStore::new());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/v1/dashboards")
        .header("Origin", "http://localhost:5173")
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        response.headers().get("access-control-allow-credentials").unwrap(),
        "true"
    );
}
