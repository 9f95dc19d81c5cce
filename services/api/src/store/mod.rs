use crate::model::{
    DueDate, Indicator, NewDueDate, NewIndicator, NewProgressReport, NewUser, ProgressReport,
    ProgressReportFilter, ProgressReportPatch, User, ValidationErrors,
};
use async_trait::async_trait;
use progress_authz::{DueDateId, IndicatorId, OwnershipMap, ProgressReportId, UserId};
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity store for the user registry, indicators, due dates and reports.
///
/// Implementations enforce required fields and reference existence. They
/// carry no authorization knowledge; callers decide before mutating.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, id: UserId) -> StoreResult<User>;
    /// Case-insensitive lookup by email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<User>;

    async fn create_indicator(&self, indicator: NewIndicator) -> StoreResult<Indicator>;
    async fn get_indicator(&self, id: IndicatorId) -> StoreResult<Indicator>;
    /// Managers of the listed indicators; unknown ids are left out.
    async fn indicator_ownership(&self, ids: &[IndicatorId]) -> StoreResult<OwnershipMap>;

    async fn create_due_date(&self, due_date: NewDueDate) -> StoreResult<DueDate>;
    async fn get_due_date(&self, id: DueDateId) -> StoreResult<DueDate>;

    async fn find_progress_report(&self, id: ProgressReportId) -> StoreResult<ProgressReport>;
    async fn list_progress_reports(
        &self,
        filter: &ProgressReportFilter,
    ) -> StoreResult<Vec<ProgressReport>>;
    async fn create_progress_report(
        &self,
        attrs: NewProgressReport,
    ) -> StoreResult<ProgressReport>;
    async fn update_progress_report(
        &self,
        id: ProgressReportId,
        patch: ProgressReportPatch,
    ) -> StoreResult<ProgressReport>;
    async fn delete_progress_report(&self, id: ProgressReportId) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}
