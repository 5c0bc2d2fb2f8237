//! Handlers for dashboards.
//!
//! Every call runs under the per-request deadline; the rank each endpoint
//! requires is enforced by [`DashboardService`](nsi_core::services::DashboardService).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use nsi_core::dashboard::NewDashboard;
use nsi_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/dashboards
///
/// Create a dashboard. The caller becomes its Admin.
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewDashboard>,
) -> AppResult<impl IntoResponse> {
    let dashboard = state
        .deadline()
        .run(state.dashboards.create(user.user_id, input))
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: dashboard })))
}

/// GET /api/v1/dashboards
pub async fn list(user: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let dashboards = state
        .deadline()
        .run(state.dashboards.list_for(user.user_id))
        .await?;

    Ok(Json(DataResponse { data: dashboards }))
}

/// GET /api/v1/dashboards/{id}
pub async fn get(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let dashboard = state
        .deadline()
        .run(state.dashboards.get(user.user_id, id))
        .await?;

    Ok(Json(DataResponse { data: dashboard }))
}

/// DELETE /api/v1/dashboards/{id}
///
/// Removes the dashboard, its widgets and every grant bound to them.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .deadline()
        .run(state.dashboards.delete(user.user_id, id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/dashboards/{id}/widgets
///
/// Widgets of the dashboard with the caller's effective rank on each.
pub async fn list_widgets(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let widgets = state
        .deadline()
        .run(state.widgets.list_in_dashboard(user.user_id, id))
        .await?;

    Ok(Json(DataResponse { data: widgets }))
}
