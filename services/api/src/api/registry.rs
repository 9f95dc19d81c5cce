//! User, indicator and due date registry handlers.
//!
//! Writes are manager-only. Indicator and due date reads are public.
use crate::api::error::{ApiError, api_invalid_body, api_store_error};
use crate::api::types::{
    CreateDueDateRequest, CreateIndicatorRequest, CreateUserRequest, DueDateDocument,
    ErrorResponse, IndicatorDocument, UserDocument,
};
use crate::app::AppState;
use crate::auth::actor::{require_manager, resolve_actor};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use progress_authz::{DueDateId, IndicatorId};

#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "registry",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User registered", body = UserDocument),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub(crate) async fn create_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    require_manager(&actor)?;
    let Json(body) = body.map_err(|rejection| api_invalid_body(&rejection))?;
    match state.store.create_user(body.user).await {
        Ok(user) => {
            tracing::info!(user_id = %user.id, role = %user.role, "user registered");
            Ok((StatusCode::CREATED, Json(UserDocument::from(user))))
        }
        Err(err) => Err(api_store_error("user", "failed to create user", err)),
    }
}

#[utoipa::path(
    post,
    path = "/v1/indicators",
    tag = "registry",
    request_body = CreateIndicatorRequest,
    responses(
        (status = 201, description = "Indicator created", body = IndicatorDocument),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub(crate) async fn create_indicator(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateIndicatorRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    require_manager(&actor)?;
    let Json(body) = body.map_err(|rejection| api_invalid_body(&rejection))?;
    match state.store.create_indicator(body.indicator).await {
        Ok(indicator) => Ok((StatusCode::CREATED, Json(IndicatorDocument::from(indicator)))),
        Err(err) => Err(api_store_error("indicator", "failed to create indicator", err)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/indicators/{id}",
    tag = "registry",
    params(("id" = u64, Path, description = "Indicator id")),
    responses(
        (status = 200, description = "Fetch indicator", body = IndicatorDocument),
        (status = 404, description = "Indicator not found", body = ErrorResponse)
    )
)]
pub(crate) async fn get_indicator(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<IndicatorDocument>, ApiError> {
    state
        .store
        .get_indicator(IndicatorId::new(id))
        .await
        .map(|indicator| Json(indicator.into()))
        .map_err(|err| api_store_error("indicator", "failed to fetch indicator", err))
}

#[utoipa::path(
    post,
    path = "/v1/due_dates",
    tag = "registry",
    request_body = CreateDueDateRequest,
    responses(
        (status = 201, description = "Due date created", body = DueDateDocument),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub(crate) async fn create_due_date(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateDueDateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    require_manager(&actor)?;
    let Json(body) = body.map_err(|rejection| api_invalid_body(&rejection))?;
    match state.store.create_due_date(body.due_date).await {
        Ok(due_date) => Ok((StatusCode::CREATED, Json(DueDateDocument::from(due_date)))),
        Err(err) => Err(api_store_error("due date", "failed to create due date", err)),
    }
}

#[utoipa::path(
    get,
    path = "/v1/due_dates/{id}",
    tag = "registry",
    params(("id" = u64, Path, description = "Due date id")),
    responses(
        (status = 200, description = "Fetch due date", body = DueDateDocument),
        (status = 404, description = "Due date not found", body = ErrorResponse)
    )
)]
pub(crate) async fn get_due_date(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> Result<Json<DueDateDocument>, ApiError> {
    state
        .store
        .get_due_date(DueDateId::new(id))
        .await
        .map(|due_date| Json(due_date.into()))
        .map_err(|err| api_store_error("due date", "failed to fetch due date", err))
}
