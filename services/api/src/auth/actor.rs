//! Actor resolution from `Authorization: Bearer` tokens.
//!
//! # Key invariants
//! - No `Authorization` header means the request is anonymous.
//! - A header that is present but unusable is a 401, never anonymous.
//! - The role comes from the registry, not from token claims.
use crate::api::error::{ApiError, api_forbidden, api_internal, api_unauthorized};
use crate::app::AppState;
use crate::store::StoreError;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use progress_authz::{Actor, Role, UserId};

/// Resolve the actor for a request.
///
/// # Errors
/// - 401 when the header is malformed, the token fails verification or the
///   subject is not a registered user.
/// - 500 when the registry lookup fails.
pub async fn resolve_actor(state: &AppState, headers: &HeaderMap) -> Result<Actor, ApiError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(Actor::Anonymous);
    };
    let bearer = value
        .to_str()
        .ok()
        .and_then(extract_bearer)
        .ok_or_else(|| api_unauthorized("malformed authorization header"))?;
    let claims = state.verifier.verify(bearer).map_err(|err| {
        tracing::debug!(error = %err, "bearer token rejected");
        api_unauthorized("invalid token")
    })?;
    let user_id = claims
        .user_id()
        .map_err(|_| api_unauthorized("invalid token subject"))?;
    match state.store.get_user(user_id).await {
        Ok(user) => Ok(user.actor()),
        Err(StoreError::NotFound(_)) => Err(api_unauthorized("unknown user")),
        Err(err) => Err(api_internal("failed to load user", &err)),
    }
}

/// Gate for registry writes, which only managers may perform.
pub fn require_manager(actor: &Actor) -> Result<UserId, ApiError> {
    match actor {
        Actor::Anonymous => Err(api_unauthorized("authentication required")),
        Actor::User {
            id,
            role: Role::Manager,
        } => Ok(*id),
        Actor::User { .. } => Err(api_forbidden("manager role required")),
    }
}

fn extract_bearer(value: &str) -> Option<&str> {
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
