//! OpenAPI schema aggregation for the progress API.
use crate::api::bootstrap::{SeedDueDate, SeedIndicator, SeedRequest, SeedResponse};
use crate::api::types::{
    CreateDueDateRequest, CreateIndicatorRequest, CreateProgressReportRequest,
    CreateUserRequest, DueDateDocument, DueDateResource, DueDateView, ErrorResponse,
    HealthStatus, IndicatorDocument, IndicatorResource, IndicatorView, ProgressReportAttributes,
    ProgressReportDocument, ProgressReportListDocument, ProgressReportResource,
    ProgressReportView, UpdateProgressReportRequest, UserDocument, UserResource, UserView,
};
use crate::api::{bootstrap, progress_reports, registry, system};
use crate::model::{DueDate, Indicator, NewDueDate, NewIndicator, NewUser, User};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "progress-api",
        version = "v1",
        description = "Indicator progress report HTTP API"
    ),
    paths(
        system::system_health,
        progress_reports::list_progress_reports,
        progress_reports::get_progress_report,
        progress_reports::create_progress_report,
        progress_reports::update_progress_report,
        progress_reports::replace_progress_report,
        progress_reports::delete_progress_report,
        registry::create_user,
        registry::create_indicator,
        registry::get_indicator,
        registry::create_due_date,
        registry::get_due_date,
        bootstrap::seed
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        ProgressReportAttributes,
        CreateProgressReportRequest,
        UpdateProgressReportRequest,
        ProgressReportView,
        ProgressReportResource,
        ProgressReportDocument,
        ProgressReportListDocument,
        CreateUserRequest,
        NewUser,
        User,
        UserView,
        UserResource,
        UserDocument,
        CreateIndicatorRequest,
        NewIndicator,
        Indicator,
        IndicatorView,
        IndicatorResource,
        IndicatorDocument,
        CreateDueDateRequest,
        NewDueDate,
        DueDate,
        DueDateView,
        DueDateResource,
        DueDateDocument,
        SeedRequest,
        SeedIndicator,
        SeedDueDate,
        SeedResponse
    )),
    tags(
        (name = "system", description = "System endpoints"),
        (name = "progress_reports", description = "Progress report management"),
        (name = "registry", description = "Users, indicators and due dates"),
        (name = "bootstrap", description = "Initial registry seeding")
    )
)]
pub struct ApiDoc;
