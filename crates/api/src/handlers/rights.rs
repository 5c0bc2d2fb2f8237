//! Handlers for access rights (grants).
//!
//! A grant targets exactly one resource, named on the wire by either
//! `dashboard_id` or `widget_id`. Every mutation requires the caller to hold
//! Admin on that resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use nsi_core::grant::{Grant, Subject};
use nsi_core::rank::Rank;
use nsi_core::resource::ResourceRef;
use nsi_core::types::DbId;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /rights`.
#[derive(Debug, Deserialize)]
pub struct CreateRightRequest {
    pub dashboard_id: Option<DbId>,
    pub widget_id: Option<DbId>,
    pub user_id: Option<DbId>,
    pub user_group_id: Option<DbId>,
    pub rank: Rank,
}

/// Request body for `PATCH /rights/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateRankRequest {
    pub rank: Rank,
}

/// Query parameters for `DELETE /rights/{id}`.
#[derive(Debug, Deserialize)]
pub struct ResourceQuery {
    pub dashboard_id: Option<DbId>,
    pub widget_id: Option<DbId>,
}

/// A grant together with the resource it is bound to.
#[derive(Debug, Serialize)]
pub struct RightResponse {
    #[serde(flatten)]
    pub grant: Grant,
    pub resource: ResourceRef,
}

/// A newly issued grant. `id` is the access right, `association_id` the row
/// that binds it to `resource`.
#[derive(Debug, Serialize)]
pub struct CreatedRight {
    #[serde(flatten)]
    pub grant: Grant,
    pub association_id: DbId,
    pub resource: ResourceRef,
}

#[derive(Debug, Serialize)]
pub struct RankChanged {
    pub id: DbId,
    pub rank: Rank,
    pub resource: ResourceRef,
}

/// POST /api/v1/rights
///
/// Grant a user or user group a rank on a dashboard or widget.
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRightRequest>,
) -> AppResult<impl IntoResponse> {
    let resource = ResourceRef::from_parts(input.dashboard_id, input.widget_id)?;
    let subject = Subject::from_columns(input.user_id, input.user_group_id)?;

    let binding = state
        .deadline()
        .run(state.rights.grant(user.user_id, resource, subject, input.rank))
        .await?;

    let grant = Grant {
        id: binding.access_right_id,
        subject,
        access_token: None,
        rank: input.rank,
    };
    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: CreatedRight {
                grant,
                association_id: binding.association_id,
                resource,
            },
        }),
    ))
}

/// PATCH /api/v1/rights/{id}
///
/// Change a grant's rank. Requires Admin on the resource the grant is bound to.
pub async fn update_rank(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRankRequest>,
) -> AppResult<impl IntoResponse> {
    let resource = state
        .deadline()
        .run(state.rights.reassign(user.user_id, id, input.rank))
        .await?;

    Ok(Json(DataResponse {
        data: RankChanged {
            id,
            rank: input.rank,
            resource,
        },
    }))
}

/// DELETE /api/v1/rights/{id}?dashboard_id=..|widget_id=..
///
/// Revoke a grant from the named resource. A grant bound to any other
/// resource is reported as not found and left untouched.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(query): Query<ResourceQuery>,
) -> AppResult<impl IntoResponse> {
    let resource = ResourceRef::from_parts(query.dashboard_id, query.widget_id)?;

    state
        .deadline()
        .run(state.rights.revoke(user.user_id, resource, id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/dashboards/{id}/rights
///
/// Requires Admin on the dashboard.
pub async fn list_for_dashboard(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    list_for(user, state, ResourceRef::Dashboard(id)).await
}

/// GET /api/v1/widgets/{id}/rights
///
/// Requires Admin on the widget, held directly or through its dashboard.
pub async fn list_for_widget(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    list_for(user, state, ResourceRef::Widget(id)).await
}

async fn list_for(
    user: AuthUser,
    state: AppState,
    resource: ResourceRef,
) -> AppResult<Json<DataResponse<Vec<RightResponse>>>> {
    let grants = state
        .deadline()
        .run(async {
            state
                .rights
                .resolver()
                .check(user.user_id, resource, Rank::Admin)
                .await?;
            state.rights.list_grants(resource).await
        })
        .await?;

    let data = grants
        .into_iter()
        .map(|grant| RightResponse { grant, resource })
        .collect();
    Ok(Json(DataResponse { data }))
}
