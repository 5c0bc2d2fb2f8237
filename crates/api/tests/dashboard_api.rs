//! Integration tests for `/api/v1/dashboards` and bearer authentication.

mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, create_dashboard, delete, get, post_json, send};
use nsi_api::auth::identity::{IdentityError, IdentityProvider, TokenValidation};
use nsi_api::router::build_app_router;
use nsi_api::state::AppState;
use nsi_core::grant::Subject;
use nsi_core::notify;
use nsi_core::rank::Rank;
use nsi_core::resource::ResourceRef;
use nsi_core::testing::InMemoryStore;
use nsi_events::EventBus;
use serde_json::json;

const OWNER: i64 = 1;
const OTHER: i64 = 2;

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_authorization_header_returns_401() {
    let app = build_test_app(&InMemoryStore::new());
    let request = Request::builder()
        .uri("/api/v1/dashboards")
        .body(Body::empty())
        .unwrap();

    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn malformed_or_forged_token_returns_401() {
    let app = build_test_app(&InMemoryStore::new());

    for header in ["Token abc", "Bearer not-a-jwt"] {
        let request = Request::builder()
            .uri("/api/v1/dashboards")
            .header("authorization", header)
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{header}");
    }
}

struct DownIdentity;

#[async_trait]
impl IdentityProvider for DownIdentity {
    async fn validate(&self, _token: &str) -> Result<TokenValidation, IdentityError> {
        Err(IdentityError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn identity_outage_returns_503() {
    let store = InMemoryStore::new();
    let config = common::test_config();
    let state = AppState::with_identity(
        Arc::new(store),
        config.clone(),
        Arc::new(EventBus::default()),
        Arc::new(DownIdentity),
    );
    let app = build_app_router(state, &config);

    let response = get(&app, "/api/v1/dashboards", OWNER).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["code"], "IDENTITY_UNAVAILABLE");
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[tokio::test]
async fn creator_is_admin_and_sees_dashboard_in_listing() {
    let store = InMemoryStore::new();
    let app = build_test_app(&store);

    let response = post_json(&app, "/api/v1/dashboards", OWNER, json!({ "name": "  Sales  " })).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["data"]["name"], "Sales");
    assert!(created["data"]["parent_id"].is_null());

    let response = get(&app, "/api/v1/dashboards", OWNER).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let items = listed["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], created["data"]["id"]);
    assert_eq!(items[0]["rank"], "admin");

    let response = get(&app, "/api/v1/dashboards", OTHER).await;
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn blank_name_returns_400() {
    let store = InMemoryStore::new();
    let app = build_test_app(&store);

    let response = post_json(&app, "/api/v1/dashboards", OWNER, json!({ "name": "   " })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    assert_eq!(store.dashboard_count().await, 0);
}

#[tokio::test]
async fn reading_without_a_grant_is_forbidden() {
    let app = build_test_app(&InMemoryStore::new());
    let id = create_dashboard(&app, OWNER, "Sales").await;

    let response = get(&app, &format!("/api/v1/dashboards/{id}"), OWNER).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["name"], "Sales");

    let response = get(&app, &format!("/api/v1/dashboards/{id}"), OTHER).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn unknown_dashboard_is_forbidden_not_leaked() {
    let app = build_test_app(&InMemoryStore::new());

    let response = get(&app, "/api/v1/dashboards/999", OWNER).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn nesting_requires_update_on_parent() {
    let store = InMemoryStore::new();
    let app = build_test_app(&store);
    let parent = create_dashboard(&app, OWNER, "Parent").await;
    store
        .seed_grant(ResourceRef::Dashboard(parent), Subject::User(OTHER), Rank::ReadOnly)
        .await;

    let body = json!({ "name": "Child", "parent_id": parent });
    let response = post_json(&app, "/api/v1/dashboards", OTHER, body.clone()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json(&app, "/api/v1/dashboards", OWNER, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["data"]["parent_id"], parent);
}

#[tokio::test]
async fn delete_requires_admin() {
    let store = InMemoryStore::new();
    let app = build_test_app(&store);
    let id = create_dashboard(&app, OWNER, "Sales").await;
    store
        .seed_grant(ResourceRef::Dashboard(id), Subject::User(OTHER), Rank::Update)
        .await;

    let response = delete(&app, &format!("/api/v1/dashboards/{id}"), OTHER).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete(&app, &format!("/api/v1/dashboards/{id}"), OWNER).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(store.dashboard_count().await, 0);
    assert_eq!(store.grant_count().await, 0);
}

#[tokio::test]
async fn changes_are_published_on_the_event_bus() {
    let store = InMemoryStore::new();
    let config = common::test_config();
    let state = common::test_state(&store, config.clone());
    let mut events = state.event_bus.subscribe();
    let app = build_app_router(state, &config);

    let id = create_dashboard(&app, OWNER, "Sales").await;
    delete(&app, &format!("/api/v1/dashboards/{id}"), OWNER).await;

    let created = events.recv().await.unwrap();
    assert_eq!(created.event_type, notify::DASHBOARD_CREATED);
    assert_eq!(created.resource, ResourceRef::Dashboard(id));
    assert_eq!(created.actor_user_id, OWNER);
    assert_eq!(events.recv().await.unwrap().event_type, notify::DASHBOARD_DELETED);
}

// ---------------------------------------------------------------------------
// Deadlines and store failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slow_store_returns_504() {
    let store = InMemoryStore::new();
    let mut config = common::test_config();
    config.operation_timeout_ms = 20;
    let app = build_app_router(common::test_state(&store, config.clone()), &config);
    let id = store.seed_dashboard("Sales", None).await;
    store
        .seed_grant(ResourceRef::Dashboard(id), Subject::User(OWNER), Rank::Admin)
        .await;
    store.set_latency(Some(Duration::from_millis(300)));

    let response = get(&app, &format!("/api/v1/dashboards/{id}"), OWNER).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body_json(response).await["code"], "TIMEOUT");
}

#[tokio::test]
async fn store_failure_fails_closed_with_500() {
    let store = InMemoryStore::new();
    let app = build_test_app(&store);
    let id = create_dashboard(&app, OWNER, "Sales").await;
    store.fail_reads(true);

    let response = get(&app, &format!("/api/v1/dashboards/{id}"), OWNER).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "An internal error occurred");
}
