//! Progress report records, create/update attribute sets and list filters.
//!
//! # Purpose
//! Defines the stored report shape and the attribute sets the store accepts.
//! Create attributes are all optional so that missing fields surface as
//! validation failures from the store rather than as decode errors.
//!
//! # Key invariants
//! - Every stored report references exactly one indicator and one due date.
//! - `last_modified_user_id` names the actor of the most recent write.
use chrono::{DateTime, Utc};
use progress_authz::{DueDateId, IndicatorId, ProgressReportId, ReportRef, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ProgressReport {
    #[schema(value_type = u64)]
    pub id: ProgressReportId,
    #[schema(value_type = u64)]
    pub indicator_id: IndicatorId,
    #[schema(value_type = u64)]
    pub due_date_id: DueDateId,
    pub title: String,
    pub description: Option<String>,
    pub draft: bool,
    pub document_url: Option<String>,
    pub document_public: bool,
    #[schema(value_type = u64)]
    pub last_modified_user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressReport {
    /// The fields the authorization policy needs about this report.
    pub fn policy_ref(&self) -> ReportRef {
        ReportRef {
            indicator_id: self.indicator_id,
            draft: self.draft,
        }
    }
}

/// Attributes for a new report, stamped with the acting user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProgressReport {
    pub indicator_id: Option<IndicatorId>,
    pub due_date_id: Option<DueDateId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub draft: Option<bool>,
    pub document_url: Option<String>,
    pub document_public: Option<bool>,
    pub last_modified_user_id: UserId,
}

impl NewProgressReport {
    /// Empty attributes written by `last_modified_user_id`.
    pub fn stamped(last_modified_user_id: UserId) -> Self {
        Self {
            indicator_id: None,
            due_date_id: None,
            title: None,
            description: None,
            draft: None,
            document_url: None,
            document_public: None,
            last_modified_user_id,
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
///
/// `description` and `document_url` are doubly optional: `Some(None)` clears
/// the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressReportPatch {
    pub indicator_id: Option<IndicatorId>,
    pub due_date_id: Option<DueDateId>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub draft: Option<bool>,
    pub document_url: Option<Option<String>>,
    pub document_public: Option<bool>,
    pub last_modified_user_id: UserId,
}

impl ProgressReportPatch {
    /// A patch that changes nothing but the modifying user.
    pub fn stamp_only(last_modified_user_id: UserId) -> Self {
        Self {
            indicator_id: None,
            due_date_id: None,
            title: None,
            description: None,
            draft: None,
            document_url: None,
            document_public: None,
            last_modified_user_id,
        }
    }

    pub fn apply(self, report: &mut ProgressReport, now: DateTime<Utc>) {
        if let Some(value) = self.indicator_id {
            report.indicator_id = value;
        }
        if let Some(value) = self.due_date_id {
            report.due_date_id = value;
        }
        if let Some(value) = self.title {
            report.title = value;
        }
        if let Some(value) = self.description {
            report.description = value;
        }
        if let Some(value) = self.draft {
            report.draft = value;
        }
        if let Some(value) = self.document_url {
            report.document_url = value;
        }
        if let Some(value) = self.document_public {
            report.document_public = value;
        }
        report.last_modified_user_id = self.last_modified_user_id;
        report.updated_at = now;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressReportFilter {
    pub draft: Option<bool>,
    pub indicator_id: Option<IndicatorId>,
}

impl ProgressReportFilter {
    pub fn matches(&self, report: &ProgressReport) -> bool {
        self.draft.is_none_or(|draft| report.draft == draft)
            && self
                .indicator_id
                .is_none_or(|indicator_id| report.indicator_id == indicator_id)
    }
}
