//! Progress API HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum routers, configures middleware, and defines the shared
//! application state injected into handlers.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::store::ProgressStore;
use axum::Router;
use axum::routing::{get, post};
use progress_authz::ActorTokenVerifier;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProgressStore>,
    pub verifier: ActorTokenVerifier,
    pub bootstrap_enabled: bool,
    pub bootstrap_token: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route("/v1/system/health", get(api::system::system_health))
        .route(
            "/v1/progress_reports",
            get(api::progress_reports::list_progress_reports)
                .post(api::progress_reports::create_progress_report),
        )
        .route(
            "/v1/progress_reports/:id",
            get(api::progress_reports::get_progress_report)
                .patch(api::progress_reports::update_progress_report)
                .put(api::progress_reports::replace_progress_report)
                .delete(api::progress_reports::delete_progress_report),
        )
        .route("/v1/users", post(api::registry::create_user))
        .route("/v1/indicators", post(api::registry::create_indicator))
        .route("/v1/indicators/:id", get(api::registry::get_indicator))
        .route("/v1/due_dates", post(api::registry::create_due_date))
        .route("/v1/due_dates/:id", get(api::registry::get_due_date))
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}

pub fn build_bootstrap_router(state: AppState) -> Router {
    Router::new()
        .route("/internal/bootstrap/seed", post(api::bootstrap::seed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
