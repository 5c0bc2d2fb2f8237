use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nsi_core::access::{AccessError, CheckTarget, StoreError};
use nsi_core::error::CoreError;
use serde_json::json;

use crate::auth::identity::IdentityError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and the identity collaborator's
/// failures.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
/// Every variant is a failure response; nothing here is ever rendered as
/// success.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `nsi_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The identity collaborator could not answer.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        AppError::Core(CoreError::Access(err))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Core(CoreError::from(err))
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::Access(access) => classify_access_error(access),
            },

            // --- Identity collaborator ---
            AppError::Identity(err) => {
                tracing::error!(error = %err, "Identity provider failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "IDENTITY_UNAVAILABLE",
                    "Identity provider unavailable".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify an access-control failure into an HTTP status, error code, and
/// message.
///
/// - Missing or insufficient rights on a resource map to 403.
/// - An access right that is not bound where the caller said maps to 404.
/// - Malformed resource references map to 400.
/// - Duplicate grants map to 409.
/// - Store deadline expiry maps to 504; other store failures to 500.
fn classify_access_error(err: &AccessError) -> (StatusCode, &'static str, String) {
    match err {
        AccessError::RightNotFound {
            target: CheckTarget::AccessRight(id),
            ..
        } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("Access right with id {id} not found"),
        ),
        AccessError::RightNotFound { .. } | AccessError::InsufficientRank { .. } => {
            tracing::debug!(error = %err, "Permission denied");
            (StatusCode::FORBIDDEN, "PERMISSION_DENIED", err.to_string())
        }
        AccessError::InvalidReference(msg) => {
            (StatusCode::BAD_REQUEST, "INVALID_REFERENCE", msg.clone())
        }
        AccessError::RightExists { .. } => (StatusCode::CONFLICT, "CONFLICT", err.to_string()),
        AccessError::Store(StoreError::Timeout(budget)) => {
            tracing::warn!(budget_ms = budget.as_millis() as u64, "Store deadline exceeded");
            (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                "The operation did not complete in time".to_string(),
            )
        }
        AccessError::Store(store) => {
            tracing::error!(error = %store, "Store failure");
            internal()
        }
    }
}
