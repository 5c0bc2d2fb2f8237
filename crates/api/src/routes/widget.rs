//! Route definitions for widgets, mounted at `/widgets`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{rights, widget};
use crate::state::AppState;

/// ```text
/// POST   /                 -> create
/// GET    /{id}             -> get
/// PATCH  /{id}             -> update
/// DELETE /{id}             -> delete
/// GET    /{id}/rights      -> rights::list_for_widget
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(widget::create))
        .route(
            "/{id}",
            get(widget::get).patch(widget::update).delete(widget::delete),
        )
        .route("/{id}/rights", get(rights::list_for_widget))
}
