//! Progress report API handlers.
//!
//! # Purpose
//! Implements progress report list, read, create, update and delete with the
//! authorization policy applied before every store call.
//!
//! # Request flow
//! 1. Resolve the actor from the bearer token.
//! 2. Reject early when the role alone decides (`decide_by_role`), so a
//!    missing id never turns a 401/403 into a 404.
//! 3. Load the target and its indicator owners, then call `authorize`.
//!    Request bodies are decoded only once the caller is allowed.
//! 4. Stamp `last_modified_user_id` and hand the attributes to the store,
//!    which performs field validation.
//!
//! # Security considerations
//! - Denied reads are reported as 404 so hidden drafts are indistinguishable
//!   from missing reports.
//! - Moving a report to another indicator is authorized against the
//!   destination as well as the current report.
use crate::api::error::{
    ApiError, api_denied, api_internal, api_invalid_body, api_not_found, api_store_error,
    api_unauthorized,
};
use crate::api::types::{
    CreateProgressReportRequest, ErrorResponse, ProgressReportDocument,
    ProgressReportListDocument, UpdateProgressReportRequest,
};
use crate::app::AppState;
use crate::auth::actor::resolve_actor;
use crate::model::{ProgressReport, ProgressReportFilter};
use crate::store::StoreError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use progress_authz::{
    Action, Actor, Decision, DenyReason, IndicatorId, OwnershipMap, ProgressReportId, Target,
    UserId, authorize, decide_by_role,
};

#[utoipa::path(
    get,
    path = "/v1/progress_reports",
    tag = "progress_reports",
    params(
        ("draft" = Option<bool>, Query, description = "Only drafts (true) or only published (false)"),
        ("indicator_id" = Option<u64>, Query, description = "Only reports for this indicator")
    ),
    responses(
        (status = 200, description = "Progress reports the caller may read", body = ProgressReportListDocument),
        (status = 401, description = "Invalid bearer token", body = ErrorResponse)
    )
)]
pub(crate) async fn list_progress_reports(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(filter): Query<ProgressReportFilter>,
) -> Result<Json<ProgressReportListDocument>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let reports = state
        .store
        .list_progress_reports(&filter)
        .await
        .map_err(|err| api_internal("failed to list progress reports", &err))?;
    // Read rules never consult indicator ownership.
    let no_owners = OwnershipMap::new();
    let data = reports
        .into_iter()
        .filter(|report| {
            authorize(
                &actor,
                Action::Read,
                &Target::Report(report.policy_ref()),
                &no_owners,
            )
            .is_allowed()
        })
        .map(Into::into)
        .collect();
    Ok(Json(ProgressReportListDocument { data }))
}

#[utoipa::path(
    get,
    path = "/v1/progress_reports/{id}",
    tag = "progress_reports",
    params(("id" = u64, Path, description = "Progress report id")),
    responses(
        (status = 200, description = "Fetch progress report", body = ProgressReportDocument),
        (status = 401, description = "Invalid bearer token", body = ErrorResponse),
        (status = 404, description = "Progress report not found or not visible", body = ErrorResponse)
    )
)]
pub(crate) async fn get_progress_report(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProgressReportDocument>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    let report = load_report(&state, ProgressReportId::new(id)).await?;
    let target = Target::Report(report.policy_ref());
    if !decide(&state, &actor, Action::Read, &[target]).await?.is_allowed() {
        return Err(api_not_found("progress report not found"));
    }
    Ok(Json(report.into()))
}

#[utoipa::path(
    post,
    path = "/v1/progress_reports",
    tag = "progress_reports",
    request_body = CreateProgressReportRequest,
    responses(
        (status = 201, description = "Progress report created", body = ProgressReportDocument),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not permitted for this indicator", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub(crate) async fn create_progress_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<CreateProgressReportRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    precheck(&actor, Action::Create)?;
    let attrs = match body {
        Ok(Json(body)) => body.progress_report,
        Err(rejection) => {
            // An undecodable body names no indicator, so only managers get
            // to see the decode error.
            enforce(decide(&state, &actor, Action::Create, &[]).await?)?;
            return Err(api_invalid_body(&rejection));
        }
    };

    let targets: Vec<Target> = attrs.indicator_id.map(Target::Indicator).into_iter().collect();
    enforce(decide(&state, &actor, Action::Create, &targets).await?)?;

    let user_id = acting_user(&actor)?;
    match state
        .store
        .create_progress_report(attrs.into_new(user_id))
        .await
    {
        Ok(created) => {
            tracing::info!(
                report_id = %created.id,
                indicator_id = %created.indicator_id,
                user_id = %user_id,
                "progress report created"
            );
            Ok((StatusCode::CREATED, Json(ProgressReportDocument::from(created))))
        }
        Err(err) => Err(api_store_error(
            "progress report",
            "failed to create progress report",
            err,
        )),
    }
}

#[utoipa::path(
    patch,
    path = "/v1/progress_reports/{id}",
    tag = "progress_reports",
    params(("id" = u64, Path, description = "Progress report id")),
    request_body = UpdateProgressReportRequest,
    responses(
        (status = 200, description = "Progress report updated", body = ProgressReportDocument),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not permitted for this indicator", body = ErrorResponse),
        (status = 404, description = "Progress report not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub(crate) async fn update_progress_report(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UpdateProgressReportRequest>, JsonRejection>,
) -> Result<Json<ProgressReportDocument>, ApiError> {
    apply_update(state, headers, ProgressReportId::new(id), body).await
}

#[utoipa::path(
    put,
    path = "/v1/progress_reports/{id}",
    tag = "progress_reports",
    params(("id" = u64, Path, description = "Progress report id")),
    request_body = UpdateProgressReportRequest,
    responses(
        (status = 200, description = "Progress report updated", body = ProgressReportDocument),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Not permitted for this indicator", body = ErrorResponse),
        (status = 404, description = "Progress report not found", body = ErrorResponse),
        (status = 422, description = "Validation failed", body = ErrorResponse)
    )
)]
pub(crate) async fn replace_progress_report(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UpdateProgressReportRequest>, JsonRejection>,
) -> Result<Json<ProgressReportDocument>, ApiError> {
    // PUT carries the same partial semantics as PATCH.
    apply_update(state, headers, ProgressReportId::new(id), body).await
}

async fn apply_update(
    state: AppState,
    headers: HeaderMap,
    id: ProgressReportId,
    body: Result<Json<UpdateProgressReportRequest>, JsonRejection>,
) -> Result<Json<ProgressReportDocument>, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    precheck(&actor, Action::Update)?;
    let report = load_report(&state, id).await?;
    let current = Target::Report(report.policy_ref());
    enforce(decide(&state, &actor, Action::Update, &[current]).await?)?;

    let Json(body) = body.map_err(|rejection| api_invalid_body(&rejection))?;
    let attrs = body.progress_report;
    if let Some(destination) = attrs.indicator_id
        && destination != report.indicator_id
    {
        let target = Target::Indicator(destination);
        enforce(decide(&state, &actor, Action::Update, &[target]).await?)?;
    }

    let user_id = acting_user(&actor)?;
    match state
        .store
        .update_progress_report(id, attrs.into_patch(user_id))
        .await
    {
        Ok(updated) => {
            tracing::info!(report_id = %id, user_id = %user_id, "progress report updated");
            Ok(Json(updated.into()))
        }
        Err(err) => Err(api_store_error(
            "progress report",
            "failed to update progress report",
            err,
        )),
    }
}

#[utoipa::path(
    delete,
    path = "/v1/progress_reports/{id}",
    tag = "progress_reports",
    params(("id" = u64, Path, description = "Progress report id")),
    responses(
        (status = 204, description = "Progress report deleted"),
        (status = 401, description = "Authentication required", body = ErrorResponse),
        (status = 403, description = "Manager role required", body = ErrorResponse),
        (status = 404, description = "Progress report not found", body = ErrorResponse)
    )
)]
pub(crate) async fn delete_progress_report(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let actor = resolve_actor(&state, &headers).await?;
    precheck(&actor, Action::Delete)?;
    let id = ProgressReportId::new(id);
    let report = load_report(&state, id).await?;
    let target = Target::Report(report.policy_ref());
    enforce(decide(&state, &actor, Action::Delete, &[target]).await?)?;
    match state.store.delete_progress_report(id).await {
        Ok(()) => {
            tracing::info!(report_id = %id, "progress report deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => Err(api_store_error(
            "progress report",
            "failed to delete progress report",
            err,
        )),
    }
}

async fn load_report(state: &AppState, id: ProgressReportId) -> Result<ProgressReport, ApiError> {
    match state.store.find_progress_report(id).await {
        Ok(report) => Ok(report),
        Err(StoreError::NotFound(_)) => Err(api_not_found("progress report not found")),
        Err(err) => Err(api_internal("failed to load progress report", &err)),
    }
}

/// Deny before any lookup when the role alone rules the request out.
fn precheck(actor: &Actor, action: Action) -> Result<(), ApiError> {
    match decide_by_role(actor, action) {
        Some(decision @ Decision::Deny(_)) => {
            record(actor, action, decision);
            enforce(decision)
        }
        _ => Ok(()),
    }
}

/// Evaluate `action` against every target; the first denial wins.
async fn decide(
    state: &AppState,
    actor: &Actor,
    action: Action,
    targets: &[Target],
) -> Result<Decision, ApiError> {
    let decision = match decide_by_role(actor, action) {
        Some(decision) => decision,
        // No indicator to prove ownership of.
        None if targets.is_empty() => Decision::Deny(DenyReason::Forbidden),
        None => {
            let indicator_ids: Vec<IndicatorId> =
                targets.iter().map(Target::indicator_id).collect();
            let owners = state
                .store
                .indicator_ownership(&indicator_ids)
                .await
                .map_err(|err| api_internal("failed to load indicator owners", &err))?;
            targets
                .iter()
                .map(|target| authorize(actor, action, target, &owners))
                .find(|decision| !decision.is_allowed())
                .unwrap_or(Decision::Allow)
        }
    };
    record(actor, action, decision);
    Ok(decision)
}

fn enforce(decision: Decision) -> Result<(), ApiError> {
    match decision.deny_reason() {
        None => Ok(()),
        Some(reason) => Err(api_denied(reason)),
    }
}

fn record(actor: &Actor, action: Action, decision: Decision) {
    metrics::counter!(
        "progress_authz_decisions_total",
        "action" => action.as_str(),
        "outcome" => decision.outcome()
    )
    .increment(1);
    if let Decision::Deny(reason) = decision {
        tracing::debug!(
            actor = actor.label(),
            user_id = ?actor.id(),
            action = %action,
            reason = %reason,
            "progress report access denied"
        );
    }
}

fn acting_user(actor: &Actor) -> Result<UserId, ApiError> {
    actor
        .id()
        .ok_or_else(|| api_unauthorized("authentication required"))
}
