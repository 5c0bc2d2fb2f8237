#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use nsi_api::auth::jwt::{generate_access_token, JwtConfig};
use nsi_api::config::{LogFormat, ServerConfig};
use nsi_api::router::build_app_router;
use nsi_api::state::AppState;
use nsi_core::testing::InMemoryStore;
use nsi_core::types::DbId;
use nsi_events::EventBus;
use serde_json::Value;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        db_max_connections: 1,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        operation_timeout_ms: 5000,
        shutdown_timeout_secs: 1,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
        log_format: LogFormat::Text,
    }
}

/// Application state over an in-memory store, with a fresh event bus.
pub fn test_state(store: &InMemoryStore, config: ServerConfig) -> AppState {
    AppState::new(Arc::new(store.clone()), config, Arc::new(EventBus::default()))
}

/// Build the full application router (same middleware stack as the binary)
/// over `store`.
pub fn build_test_app(store: &InMemoryStore) -> Router {
    let config = test_config();
    build_app_router(test_state(store, config.clone()), &config)
}

/// A valid bearer token for `user_id` under [`test_config`].
pub fn token_for(user_id: DbId) -> String {
    generate_access_token(user_id, &test_config().jwt).expect("token generation should succeed")
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

async fn authed(
    app: &Router,
    method: Method,
    uri: &str,
    user_id: DbId,
    body: Option<Value>,
) -> Response<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token_for(user_id)));
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    send(app, request).await
}

pub async fn get(app: &Router, uri: &str, user_id: DbId) -> Response<Body> {
    authed(app, Method::GET, uri, user_id, None).await
}

pub async fn post_json(app: &Router, uri: &str, user_id: DbId, body: Value) -> Response<Body> {
    authed(app, Method::POST, uri, user_id, Some(body)).await
}

pub async fn patch_json(app: &Router, uri: &str, user_id: DbId, body: Value) -> Response<Body> {
    authed(app, Method::PATCH, uri, user_id, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, user_id: DbId) -> Response<Body> {
    authed(app, Method::DELETE, uri, user_id, None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// POST a dashboard as `owner` and return its id.
pub async fn create_dashboard(app: &Router, owner: DbId, name: &str) -> DbId {
    let response = post_json(app, "/api/v1/dashboards", owner, serde_json::json!({ "name": name })).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// POST a square widget on `dashboard_id` as `owner` and return its id.
pub async fn create_widget(app: &Router, owner: DbId, dashboard_id: DbId, name: &str) -> DbId {
    let response = post_json(
        app,
        "/api/v1/widgets",
        owner,
        serde_json::json!({
            "name": name,
            "dashboard_id": dashboard_id,
            "widget_type": "square",
            "config": "{\"x\":0,\"y\":0}",
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
