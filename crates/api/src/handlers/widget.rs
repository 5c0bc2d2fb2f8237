//! Handlers for widgets.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use nsi_core::types::DbId;
use nsi_core::widget::{NewWidget, WidgetUpdate};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/widgets
///
/// Create a widget on a dashboard the caller can update.
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewWidget>,
) -> AppResult<impl IntoResponse> {
    let widget = state
        .deadline()
        .run(state.widgets.create(user.user_id, input))
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: widget })))
}

/// GET /api/v1/widgets/{id}
pub async fn get(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let widget = state
        .deadline()
        .run(state.widgets.get(user.user_id, id))
        .await?;

    Ok(Json(DataResponse { data: widget }))
}

/// PATCH /api/v1/widgets/{id}
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<WidgetUpdate>,
) -> AppResult<impl IntoResponse> {
    let widget = state
        .deadline()
        .run(state.widgets.update(user.user_id, id, input))
        .await?;

    Ok(Json(DataResponse { data: widget }))
}

/// DELETE /api/v1/widgets/{id}
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state
        .deadline()
        .run(state.widgets.delete(user.user_id, id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
