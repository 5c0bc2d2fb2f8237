//! Route definitions for access rights, mounted at `/rights`.

use axum::routing::{patch, post};
use axum::Router;

use crate::handlers::rights;
use crate::state::AppState;

/// ```text
/// POST   /                                  -> create
/// PATCH  /{id}                              -> update_rank
/// DELETE /{id}?dashboard_id=..|widget_id=.. -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(rights::create))
        .route("/{id}", patch(rights::update_rank).delete(rights::delete))
}
