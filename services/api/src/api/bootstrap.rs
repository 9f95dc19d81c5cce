//! Bootstrap API handlers.
//!
//! # Purpose
//! Seeds the user registry, indicators and due dates of a fresh deployment
//! before any manager exists to do it through the public API.
//!
//! # Security considerations
//! - Served only on the bootstrap listener, and only when enabled.
//! - Requires the shared `X-Progress-Bootstrap-Token`, compared in constant
//!   time.
//!
//! # Key invariants
//! - A seed is checked in full before the first write. Rejected seeds leave
//!   the registry unchanged and can be retried as-is once corrected.
use crate::api::error::{
    ApiError, api_conflict, api_internal, api_internal_message, api_not_enabled,
    api_store_error, api_unauthorized, api_validation_failed,
};
use crate::app::AppState;
use crate::model::validation::{MUST_EXIST, NOT_GUEST};
use crate::model::{
    DueDate, Indicator, NewDueDate, NewIndicator, NewUser, User, ValidationErrors,
};
use crate::store::StoreError;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use chrono::NaiveDate;
use progress_authz::Role;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const BOOTSTRAP_TOKEN_HEADER: &str = "X-Progress-Bootstrap-Token";

#[derive(Debug, Deserialize, Serialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct SeedIndicator {
    pub title: String,
    /// Email of a user seeded in the same request.
    pub manager_email: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct SeedDueDate {
    pub due_date: NaiveDate,
    /// Title of an indicator seeded in the same request.
    #[serde(default)]
    pub indicator_title: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct SeedRequest {
    #[serde(default)]
    pub users: Vec<NewUser>,
    #[serde(default)]
    pub indicators: Vec<SeedIndicator>,
    #[serde(default)]
    pub due_dates: Vec<SeedDueDate>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct SeedResponse {
    pub users: Vec<User>,
    pub indicators: Vec<Indicator>,
    pub due_dates: Vec<DueDate>,
}

#[utoipa::path(
    post,
    path = "/internal/bootstrap/seed",
    tag = "bootstrap",
    request_body = SeedRequest,
    responses(
        (status = 201, description = "Registry seeded", body = SeedResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Not enabled"),
        (status = 409, description = "User email already registered"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn seed(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<SeedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.bootstrap_enabled {
        return Err(api_not_enabled("bootstrap not enabled"));
    }
    ensure_bootstrap_authorized(&state, &headers)?;
    let plan = plan_seed(&state, body).await?;

    let mut users = Vec::with_capacity(plan.users.len());
    for user in plan.users {
        let created = state
            .store
            .create_user(user)
            .await
            .map_err(|err| api_store_error("user", "failed to seed user", err))?;
        users.push(created);
    }

    let mut indicators = Vec::with_capacity(plan.indicators.len());
    for (title, manager) in plan.indicators {
        let created = state
            .store
            .create_indicator(NewIndicator {
                title,
                manager_id: users[manager].id,
            })
            .await
            .map_err(|err| api_store_error("indicator", "failed to seed indicator", err))?;
        indicators.push(created);
    }

    let mut due_dates = Vec::with_capacity(plan.due_dates.len());
    for (due_date, indicator) in plan.due_dates {
        let created = state
            .store
            .create_due_date(NewDueDate {
                due_date,
                indicator_id: indicator.map(|index| indicators[index].id),
            })
            .await
            .map_err(|err| api_store_error("due date", "failed to seed due date", err))?;
        due_dates.push(created);
    }

    tracing::info!(
        users = users.len(),
        indicators = indicators.len(),
        due_dates = due_dates.len(),
        "bootstrap seed applied"
    );
    Ok((
        StatusCode::CREATED,
        Json(SeedResponse {
            users,
            indicators,
            due_dates,
        }),
    ))
}

/// A seed request with every cross reference resolved to a position in the
/// same request.
struct SeedPlan {
    users: Vec<NewUser>,
    /// Title and index of the managing user.
    indicators: Vec<(String, usize)>,
    /// Date and index of the owning indicator.
    due_dates: Vec<(NaiveDate, Option<usize>)>,
}

/// Check the whole request before anything is written, so a rejected seed
/// leaves the registry untouched.
async fn plan_seed(state: &AppState, body: SeedRequest) -> Result<SeedPlan, ApiError> {
    let mut emails = Vec::with_capacity(body.users.len());
    for user in &body.users {
        user.validate().into_result().map_err(api_validation_failed)?;
        let email = user.normalized_email();
        if emails.contains(&email) {
            return Err(api_conflict("conflict", "user email exists"));
        }
        match state.store.find_user_by_email(&email).await {
            Ok(_) => return Err(api_conflict("conflict", "user email exists")),
            Err(StoreError::NotFound(_)) => {}
            Err(err) => return Err(api_internal("failed to check seeded users", &err)),
        }
        emails.push(email);
    }

    let mut indicators = Vec::with_capacity(body.indicators.len());
    for indicator in body.indicators {
        let mut errors = ValidationErrors::new();
        errors.require_present("title", Some(indicator.title.as_str()));
        let email = indicator.manager_email.trim().to_lowercase();
        let manager = emails.iter().position(|seeded| *seeded == email);
        match manager {
            None => errors.add("manager_email", MUST_EXIST),
            Some(index) if body.users[index].role == Role::Guest => {
                errors.add("manager_email", NOT_GUEST)
            }
            Some(_) => {}
        }
        errors.into_result().map_err(api_validation_failed)?;
        if let Some(index) = manager {
            indicators.push((indicator.title, index));
        }
    }

    let mut due_dates = Vec::with_capacity(body.due_dates.len());
    for due_date in body.due_dates {
        let indicator = match due_date.indicator_title.as_deref() {
            None => None,
            Some(title) => Some(
                indicators
                    .iter()
                    .position(|(seeded, _)| seeded == title)
                    .ok_or_else(|| {
                        api_validation_failed(ValidationErrors::single(
                            "indicator_title",
                            MUST_EXIST,
                        ))
                    })?,
            ),
        };
        due_dates.push((due_date.due_date, indicator));
    }

    Ok(SeedPlan {
        users: body.users,
        indicators,
        due_dates,
    })
}

fn ensure_bootstrap_authorized(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let token = match headers.get(BOOTSTRAP_TOKEN_HEADER) {
        Some(value) => value
            .to_str()
            .map_err(|_| api_unauthorized("invalid bootstrap token"))?,
        None => return Err(api_unauthorized("missing bootstrap token")),
    };

    let expected = state
        .bootstrap_token
        .as_ref()
        .ok_or_else(|| api_internal_message("bootstrap token missing"))?;

    if !constant_time_eq(token.as_bytes(), expected.as_bytes()) {
        return Err(api_unauthorized("invalid bootstrap token"));
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::constant_time_eq;

    #[test]
    fn constant_time_eq_compares_full_contents() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret-longer"));
    }
}
