//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint returns the
//! same `{code, message, request_id, details}` body.
//!
//! # Key invariants and assumptions
//! - `unauthenticated` denials map to 401 and `forbidden` denials to 403.
//! - Validation failures map to 422 and carry field details.
//! - Internal errors log details server-side but return generic messages.
use crate::api::types::ErrorResponse;
use crate::model::ValidationErrors;
use crate::store::StoreError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use progress_authz::DenyReason;

/// Structured API error returned by handlers.
///
/// # Invariants
/// - `status` must match the semantics of `body.code`.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use progress_api::api::error::api_not_found;
///
/// let err = api_not_found("progress report not found");
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, message: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                message: message.to_string(),
                request_id: None,
                details: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn api_not_found(message: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 404 error for disabled features.
pub fn api_not_enabled(message: &str) -> ApiError {
    // Use NOT_FOUND to avoid exposing disabled feature presence.
    ApiError::new(StatusCode::NOT_FOUND, "not_enabled", message)
}

pub fn api_conflict(code: &str, message: &str) -> ApiError {
    ApiError::new(StatusCode::CONFLICT, code, message)
}

/// Build a 500 Internal Server Error from a store error.
///
/// Logs the store error and returns a generic internal error response.
pub fn api_internal(message: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "progress storage error");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_internal_message(message: &str) -> ApiError {
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}

pub fn api_unauthorized(message: &str) -> ApiError {
    ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized", message)
}

pub fn api_forbidden(message: &str) -> ApiError {
    ApiError::new(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 422 error carrying the store's field messages.
pub fn api_validation_failed(errors: ValidationErrors) -> ApiError {
    let mut err = ApiError::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        "validation_failed",
        &errors.to_string(),
    );
    err.body.details = Some(errors);
    err
}

/// Build a 422 error for request bodies that fail to decode.
pub fn api_invalid_body(rejection: &JsonRejection) -> ApiError {
    ApiError::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        "invalid_body",
        &rejection.body_text(),
    )
}

/// Translate a policy denial into its HTTP status.
pub fn api_denied(reason: DenyReason) -> ApiError {
    match reason {
        DenyReason::Unauthenticated => api_unauthorized("authentication required"),
        DenyReason::Forbidden => api_forbidden("not permitted"),
    }
}

/// Map the common store failures; anything unexpected becomes a 500.
///
/// `what` names the record for not-found messages and `context` is the
/// internal error message.
pub fn api_store_error(what: &str, context: &str, err: StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) => api_not_found(&format!("{what} not found")),
        StoreError::Validation(errors) => api_validation_failed(errors),
        StoreError::Conflict(message) => api_conflict("conflict", &message),
        other => api_internal(context, &other),
    }
}
