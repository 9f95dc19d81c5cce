//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the wrapped request bodies and the JSON:API style resource
//! documents returned by the progress API, plus OpenAPI schemas for both.
//!
//! # Key invariants
//! - Request attribute sets reject unknown fields.
//! - Resource ids render as strings and attribute keys are dasherized.
use crate::model::{
    DueDate, Indicator, NewDueDate, NewIndicator, NewProgressReport, NewUser, ProgressReport,
    ProgressReportPatch, User, ValidationErrors,
};
use chrono::{DateTime, NaiveDate, Utc};
use progress_authz::{DueDateId, IndicatorId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
    /// Field-level messages, present on validation failures only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<ValidationErrors>,
}

/// Writable progress report attributes.
///
/// Every field is optional at decode time; required fields are enforced by
/// the store after authorization.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ProgressReportAttributes {
    #[serde(default)]
    #[schema(value_type = Option<u64>)]
    pub indicator_id: Option<IndicatorId>,
    #[serde(default)]
    #[schema(value_type = Option<u64>)]
    pub due_date_id: Option<DueDateId>,
    #[serde(default)]
    pub title: Option<String>,
    /// `null` clears the stored value on update.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub draft: Option<bool>,
    /// `null` clears the stored value on update.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "::serde_with::rust::double_option"
    )]
    #[schema(value_type = Option<String>)]
    pub document_url: Option<Option<String>>,
    #[serde(default)]
    pub document_public: Option<bool>,
}

impl ProgressReportAttributes {
    pub fn into_new(self, last_modified_user_id: UserId) -> NewProgressReport {
        NewProgressReport {
            indicator_id: self.indicator_id,
            due_date_id: self.due_date_id,
            title: self.title,
            description: self.description.flatten(),
            draft: self.draft,
            document_url: self.document_url.flatten(),
            document_public: self.document_public,
            last_modified_user_id,
        }
    }

    pub fn into_patch(self, last_modified_user_id: UserId) -> ProgressReportPatch {
        ProgressReportPatch {
            indicator_id: self.indicator_id,
            due_date_id: self.due_date_id,
            title: self.title,
            description: self.description,
            draft: self.draft,
            document_url: self.document_url,
            document_public: self.document_public,
            last_modified_user_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateProgressReportRequest {
    pub progress_report: ProgressReportAttributes,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct UpdateProgressReportRequest {
    pub progress_report: ProgressReportAttributes,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateUserRequest {
    pub user: NewUser,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateIndicatorRequest {
    pub indicator: NewIndicator,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(deny_unknown_fields)]
pub struct CreateDueDateRequest {
    pub due_date: NewDueDate,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub struct ProgressReportView {
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

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProgressReportResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: ProgressReportView,
}

impl From<ProgressReport> for ProgressReportResource {
    fn from(report: ProgressReport) -> Self {
        Self {
            id: report.id.to_string(),
            resource_type: "progress_reports".to_string(),
            attributes: ProgressReportView {
                indicator_id: report.indicator_id,
                due_date_id: report.due_date_id,
                title: report.title,
                description: report.description,
                draft: report.draft,
                document_url: report.document_url,
                document_public: report.document_public,
                last_modified_user_id: report.last_modified_user_id,
                created_at: report.created_at,
                updated_at: report.updated_at,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProgressReportDocument {
    pub data: ProgressReportResource,
}

impl From<ProgressReport> for ProgressReportDocument {
    fn from(report: ProgressReport) -> Self {
        Self { data: report.into() }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProgressReportListDocument {
    pub data: Vec<ProgressReportResource>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserView {
    pub email: String,
    pub name: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: UserView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserDocument {
    pub data: UserResource,
}

impl From<User> for UserDocument {
    fn from(user: User) -> Self {
        Self {
            data: UserResource {
                id: user.id.to_string(),
                resource_type: "users".to_string(),
                attributes: UserView {
                    email: user.email,
                    name: user.name,
                    role: user.role.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct IndicatorView {
    pub title: String,
    #[schema(value_type = u64)]
    pub manager_id: UserId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct IndicatorResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: IndicatorView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct IndicatorDocument {
    pub data: IndicatorResource,
}

impl From<Indicator> for IndicatorDocument {
    fn from(indicator: Indicator) -> Self {
        Self {
            data: IndicatorResource {
                id: indicator.id.to_string(),
                resource_type: "indicators".to_string(),
                attributes: IndicatorView {
                    title: indicator.title,
                    manager_id: indicator.manager_id,
                },
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct DueDateView {
    pub due_date: NaiveDate,
    #[schema(value_type = Option<u64>)]
    pub indicator_id: Option<IndicatorId>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DueDateResource {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: DueDateView,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct DueDateDocument {
    pub data: DueDateResource,
}

impl From<DueDate> for DueDateDocument {
    fn from(due_date: DueDate) -> Self {
        Self {
            data: DueDateResource {
                id: due_date.id.to_string(),
                resource_type: "due_dates".to_string(),
                attributes: DueDateView {
                    due_date: due_date.due_date,
                    indicator_id: due_date.indicator_id,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use progress_authz::ProgressReportId;
    use serde_json::json;

    #[test]
    fn progress_report_document_uses_dasherized_attributes() {
        let now = Utc::now();
        let report = ProgressReport {
            id: ProgressReportId::new(7),
            indicator_id: IndicatorId::new(2),
            due_date_id: DueDateId::new(3),
            title: "Q2".to_string(),
            description: None,
            draft: false,
            document_url: Some("https://example.org/q2.pdf".to_string()),
            document_public: true,
            last_modified_user_id: UserId::new(9),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(ProgressReportDocument::from(report)).expect("json");
        assert_eq!(json["data"]["id"], "7");
        assert_eq!(json["data"]["type"], "progress_reports");
        let attributes = &json["data"]["attributes"];
        assert_eq!(attributes["last-modified-user-id"], 9);
        assert_eq!(attributes["indicator-id"], 2);
        assert_eq!(attributes["due-date-id"], 3);
        assert_eq!(attributes["document-public"], true);
        assert_eq!(attributes["document-url"], "https://example.org/q2.pdf");
    }

    #[test]
    fn create_request_rejects_unknown_fields() {
        let ok: CreateProgressReportRequest = serde_json::from_value(json!({
            "progress_report": { "title": "Q1", "indicator_id": 1, "due_date_id": 2 }
        }))
        .expect("decode");
        assert_eq!(ok.progress_report.indicator_id, Some(IndicatorId::new(1)));

        let stray = serde_json::from_value::<CreateProgressReportRequest>(json!({
            "progress_report": { "title": "Q1", "last_modified_user_id": 5 }
        }));
        assert!(stray.is_err());
    }

    #[test]
    fn attributes_become_stamped_store_inputs() {
        let attrs = ProgressReportAttributes {
            title: Some("Q3".to_string()),
            ..ProgressReportAttributes::default()
        };
        let new = attrs.clone().into_new(UserId::new(4));
        assert_eq!(new.last_modified_user_id, UserId::new(4));
        assert_eq!(new.title.as_deref(), Some("Q3"));
        let patch = attrs.into_patch(UserId::new(5));
        assert_eq!(patch.last_modified_user_id, UserId::new(5));
        assert_eq!(patch.indicator_id, None);
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let decoded: UpdateProgressReportRequest = serde_json::from_value(json!({
            "progress_report": { "description": null, "title": "Q3" }
        }))
        .expect("decode");
        let patch = decoded.progress_report.into_patch(UserId::new(5));
        assert_eq!(patch.description, Some(None));
        assert_eq!(patch.document_url, None);

        let set: UpdateProgressReportRequest = serde_json::from_value(json!({
            "progress_report": { "document_url": "https://example.org/q3.pdf" }
        }))
        .expect("decode");
        assert_eq!(
            set.progress_report.document_url,
            Some(Some("https://example.org/q3.pdf".to_string()))
        );
    }

    #[test]
    fn error_response_omits_empty_details() {
        let body = ErrorResponse {
            code: "forbidden".to_string(),
            message: "nope".to_string(),
            request_id: None,
            details: None,
        };
        let json = serde_json::to_value(&body).expect("json");
        assert!(json.get("details").is_none());
    }
}
