//! Route definitions for dashboards, mounted at `/dashboards`.

use axum::routing::get;
use axum::Router;

use crate::handlers::{dashboard, rights};
use crate::state::AppState;

/// ```text
/// GET    /                 -> list
/// POST   /                 -> create
/// GET    /{id}             -> get
/// DELETE /{id}             -> delete
/// GET    /{id}/widgets     -> list_widgets
/// GET    /{id}/rights      -> rights::list_for_dashboard
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::list).post(dashboard::create))
        .route("/{id}", get(dashboard::get).delete(dashboard::delete))
        .route("/{id}/widgets", get(dashboard::list_widgets))
        .route("/{id}/rights", get(rights::list_for_dashboard))
}
