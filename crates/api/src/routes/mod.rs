pub mod dashboard;
pub mod health;
pub mod rights;
pub mod widget;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /dashboards                     list, create
/// /dashboards/{id}                get, delete
/// /dashboards/{id}/widgets        widgets with effective rank
/// /dashboards/{id}/rights         grants on the dashboard (admin)
///
/// /widgets                        create
/// /widgets/{id}                   get, update, delete
/// /widgets/{id}/rights            grants on the widget (admin)
///
/// /rights                         grant (admin on target)
/// /rights/{id}                    re-rank, revoke
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/dashboards", dashboard::router())
        .nest("/widgets", widget::router())
        .nest("/rights", rights::router())
}
