//! In-memory implementation of the progress store.
//!
//! # Purpose
//! Implements `ProgressStore` with ordered maps guarded by
//! `tokio::sync::RwLock`. It backs local development, tests, and
//! deployments where durability is not required.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - **Single-process consistency**: writes to one table are serialized by its
//!   write lock. Concurrent updates to the same report are last-writer-wins.
//! - Reference checks hold read locks on the referenced tables while the
//!   report table is written, so a report never points at a missing row.
//!
//! # Lock order
//! users → indicators → due dates → reports. Every method acquires in this
//! order to stay deadlock free.
//!
//! # Metrics
//! Report mutations update `progress_reports_mutations_total{op}` and the
//! `progress_reports_total` gauge.
use super::{ProgressStore, StoreError, StoreResult};
use crate::model::validation::{BLANK, MUST_EXIST, NOT_GUEST};
use crate::model::{
    DueDate, Indicator, NewDueDate, NewIndicator, NewProgressReport, NewUser, ProgressReport,
    ProgressReportFilter, ProgressReportPatch, User, ValidationErrors,
};
use async_trait::async_trait;
use chrono::Utc;
use progress_authz::{DueDateId, IndicatorId, OwnershipMap, ProgressReportId, Role, UserId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Rows of one entity type keyed by a process-assigned id.
///
/// Ids start at 1 and are never reused, even after deletes.
#[derive(Debug)]
struct Table<T> {
    next_id: u64,
    rows: BTreeMap<u64, T>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    fn insert(&mut self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: u64) -> Option<&T> {
        self.rows.get(&id)
    }

    fn contains(&self, id: u64) -> bool {
        self.rows.contains_key(&id)
    }
}

pub struct InMemoryStore {
    users: Arc<RwLock<Table<User>>>,
    indicators: Arc<RwLock<Table<Indicator>>>,
    due_dates: Arc<RwLock<Table<DueDate>>>,
    reports: Arc<RwLock<Table<ProgressReport>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(Table::new())),
            indicators: Arc::new(RwLock::new(Table::new())),
            due_dates: Arc::new(RwLock::new(Table::new())),
            reports: Arc::new(RwLock::new(Table::new())),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        user.validate().into_result().map_err(StoreError::Validation)?;

        let mut users = self.users.write().await;
        let email = user.normalized_email();
        if users.rows.values().any(|existing| existing.email == email) {
            return Err(StoreError::Conflict("user email exists".into()));
        }
        Ok(users.insert(|id| User {
            id: UserId::new(id),
            email,
            name: user.name.trim().to_string(),
            role: user.role,
        }))
    }

    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.users
            .read()
            .await
            .get(id.get())
            .cloned()
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<User> {
        let email = email.trim().to_lowercase();
        self.users
            .read()
            .await
            .rows
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("user".into()))
    }

    async fn create_indicator(&self, indicator: NewIndicator) -> StoreResult<Indicator> {
        let users = self.users.read().await;
        let mut errors = ValidationErrors::new();
        errors.require_present("title", Some(indicator.title.as_str()));
        match users.get(indicator.manager_id.get()) {
            None => errors.add("manager", MUST_EXIST),
            Some(manager) if manager.role == Role::Guest => {
                errors.add("manager", NOT_GUEST)
            }
            Some(_) => {}
        }
        errors.into_result().map_err(StoreError::Validation)?;

        let mut indicators = self.indicators.write().await;
        Ok(indicators.insert(|id| Indicator {
            id: IndicatorId::new(id),
            title: indicator.title.trim().to_string(),
            manager_id: indicator.manager_id,
        }))
    }

    async fn get_indicator(&self, id: IndicatorId) -> StoreResult<Indicator> {
        self.indicators
            .read()
            .await
            .get(id.get())
            .cloned()
            .ok_or_else(|| StoreError::NotFound("indicator".into()))
    }

    async fn indicator_ownership(&self, ids: &[IndicatorId]) -> StoreResult<OwnershipMap> {
        let indicators = self.indicators.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| indicators.get(id.get()).map(|row| (*id, row.manager_id)))
            .collect())
    }

    async fn create_due_date(&self, due_date: NewDueDate) -> StoreResult<DueDate> {
        let indicators = self.indicators.read().await;
        if let Some(indicator_id) = due_date.indicator_id
            && !indicators.contains(indicator_id.get())
        {
            return Err(StoreError::Validation(ValidationErrors::single(
                "indicator",
                MUST_EXIST,
            )));
        }
        let mut due_dates = self.due_dates.write().await;
        Ok(due_dates.insert(|id| DueDate {
            id: DueDateId::new(id),
            due_date: due_date.due_date,
            indicator_id: due_date.indicator_id,
        }))
    }

    async fn get_due_date(&self, id: DueDateId) -> StoreResult<DueDate> {
        self.due_dates
            .read()
            .await
            .get(id.get())
            .cloned()
            .ok_or_else(|| StoreError::NotFound("due date".into()))
    }

    async fn find_progress_report(&self, id: ProgressReportId) -> StoreResult<ProgressReport> {
        self.reports
            .read()
            .await
            .get(id.get())
            .cloned()
            .ok_or_else(|| StoreError::NotFound("progress report".into()))
    }

    async fn list_progress_reports(
        &self,
        filter: &ProgressReportFilter,
    ) -> StoreResult<Vec<ProgressReport>> {
        Ok(self
            .reports
            .read()
            .await
            .rows
            .values()
            .filter(|report| filter.matches(report))
            .cloned()
            .collect())
    }

    async fn create_progress_report(
        &self,
        attrs: NewProgressReport,
    ) -> StoreResult<ProgressReport> {
        let indicators = self.indicators.read().await;
        let due_dates = self.due_dates.read().await;

        let mut errors = ValidationErrors::new();
        let indicator_id = match attrs.indicator_id {
            Some(id) if indicators.contains(id.get()) => Some(id),
            Some(_) => {
                errors.add("indicator", MUST_EXIST);
                None
            }
            None => {
                errors.add("indicator_id", BLANK);
                None
            }
        };
        let due_date_id = match attrs.due_date_id {
            Some(id) if due_dates.contains(id.get()) => Some(id),
            Some(_) => {
                errors.add("due_date", MUST_EXIST);
                None
            }
            None => {
                errors.add("due_date_id", BLANK);
                None
            }
        };
        let title = attrs.title.filter(|title| !title.trim().is_empty());
        if title.is_none() {
            errors.add("title", BLANK);
        }
        let (Some(indicator_id), Some(due_date_id), Some(title)) = (indicator_id, due_date_id, title)
        else {
            return Err(StoreError::Validation(errors));
        };

        let mut reports = self.reports.write().await;
        let now = Utc::now();
        let created = reports.insert(|id| ProgressReport {
            id: ProgressReportId::new(id),
            indicator_id,
            due_date_id,
            title,
            description: attrs.description,
            draft: attrs.draft.unwrap_or(false),
            document_url: attrs.document_url,
            document_public: attrs.document_public.unwrap_or(false),
            last_modified_user_id: attrs.last_modified_user_id,
            created_at: now,
            updated_at: now,
        });
        metrics::counter!("progress_reports_mutations_total", "op" => "created").increment(1);
        metrics::gauge!("progress_reports_total").set(reports.rows.len() as f64);
        Ok(created)
    }

    async fn update_progress_report(
        &self,
        id: ProgressReportId,
        patch: ProgressReportPatch,
    ) -> StoreResult<ProgressReport> {
        let indicators = self.indicators.read().await;
        let due_dates = self.due_dates.read().await;
        let mut reports = self.reports.write().await;
        let report = reports
            .rows
            .get_mut(&id.get())
            .ok_or_else(|| StoreError::NotFound("progress report".into()))?;

        let mut errors = ValidationErrors::new();
        if patch
            .title
            .as_deref()
            .is_some_and(|title| title.trim().is_empty())
        {
            errors.add("title", BLANK);
        }
        if patch
            .indicator_id
            .is_some_and(|indicator_id| !indicators.contains(indicator_id.get()))
        {
            errors.add("indicator", MUST_EXIST);
        }
        if patch
            .due_date_id
            .is_some_and(|due_date_id| !due_dates.contains(due_date_id.get()))
        {
            errors.add("due_date", MUST_EXIST);
        }
        errors.into_result().map_err(StoreError::Validation)?;

        patch.apply(report, Utc::now());
        let updated = report.clone();
        metrics::counter!("progress_reports_mutations_total", "op" => "updated").increment(1);
        Ok(updated)
    }

    async fn delete_progress_report(&self, id: ProgressReportId) -> StoreResult<()> {
        let mut reports = self.reports.write().await;
        if reports.rows.remove(&id.get()).is_none() {
            return Err(StoreError::NotFound("progress report".into()));
        }
        metrics::counter!("progress_reports_mutations_total", "op" => "deleted").increment(1);
        metrics::gauge!("progress_reports_total").set(reports.rows.len() as f64);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        // Always healthy while the process is running.
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    struct Fixture {
        store: InMemoryStore,
        manager: User,
        contributor: User,
        indicator: Indicator,
        due_date: DueDate,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let manager = store
            .create_user(NewUser {
                email: "manager@example.org".to_string(),
                name: "Manager".to_string(),
                role: Role::Manager,
            })
            .await
            .expect("manager");
        let contributor = store
            .create_user(NewUser {
                email: "contributor@example.org".to_string(),
                name: "Contributor".to_string(),
                role: Role::Contributor,
            })
            .await
            .expect("contributor");
        let indicator = store
            .create_indicator(NewIndicator {
                title: "Literacy rate".to_string(),
                manager_id: contributor.id,
            })
            .await
            .expect("indicator");
        let due_date = store
            .create_due_date(NewDueDate {
                due_date: NaiveDate::from_ymd_opt(2026, 12, 31).expect("date"),
                indicator_id: Some(indicator.id),
            })
            .await
            .expect("due date");
        Fixture {
            store,
            manager,
            contributor,
            indicator,
            due_date,
        }
    }

    fn attrs(f: &Fixture) -> NewProgressReport {
        NewProgressReport {
            indicator_id: Some(f.indicator.id),
            due_date_id: Some(f.due_date.id),
            title: Some("Q4 report".to_string()),
            ..NewProgressReport::stamped(f.contributor.id)
        }
    }

    fn validation(err: StoreError) -> ValidationErrors {
        match err {
            StoreError::Validation(errors) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_and_find_progress_report() {
        let f = fixture().await;
        let created = f.store.create_progress_report(attrs(&f)).await.expect("create");
        assert_eq!(created.id, ProgressReportId::new(1));
        assert!(!created.draft);
        assert!(!created.document_public);
        assert_eq!(created.last_modified_user_id, f.contributor.id);
        let found = f.store.find_progress_report(created.id).await.expect("find");
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn create_reports_every_missing_field() {
        let f = fixture().await;
        let err = f
            .store
            .create_progress_report(NewProgressReport {
                title: Some("  ".to_string()),
                ..NewProgressReport::stamped(f.manager.id)
            })
            .await
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(errors.messages("title"), [BLANK.to_string()]);
        assert_eq!(errors.messages("indicator_id"), [BLANK.to_string()]);
        assert_eq!(errors.messages("due_date_id"), [BLANK.to_string()]);
    }

    #[tokio::test]
    async fn create_rejects_dangling_references() {
        let f = fixture().await;
        let err = f
            .store
            .create_progress_report(NewProgressReport {
                indicator_id: Some(IndicatorId::new(404)),
                due_date_id: Some(DueDateId::new(404)),
                ..attrs(&f)
            })
            .await
            .unwrap_err();
        let errors = validation(err);
        assert_eq!(errors.messages("indicator"), [MUST_EXIST.to_string()]);
        assert_eq!(errors.messages("due_date"), [MUST_EXIST.to_string()]);
    }

    #[tokio::test]
    async fn update_applies_patch_and_stamps_user() {
        let f = fixture().await;
        let created = f.store.create_progress_report(attrs(&f)).await.expect("create");
        let updated = f
            .store
            .update_progress_report(
                created.id,
                ProgressReportPatch {
                    draft: Some(true),
                    ..ProgressReportPatch::stamp_only(f.manager.id)
                },
            )
            .await
            .expect("update");
        assert!(updated.draft);
        assert_eq!(updated.title, "Q4 report");
        assert_eq!(updated.last_modified_user_id, f.manager.id);
    }

    #[tokio::test]
    async fn update_checks_existence_before_validation() {
        let f = fixture().await;
        let err = f
            .store
            .update_progress_report(
                ProgressReportId::new(99),
                ProgressReportPatch {
                    title: Some(String::new()),
                    ..ProgressReportPatch::stamp_only(f.manager.id)
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_rejects_blank_title_and_unknown_indicator() {
        let f = fixture().await;
        let created = f.store.create_progress_report(attrs(&f)).await.expect("create");
        let err = f
            .store
            .update_progress_report(
                created.id,
                ProgressReportPatch {
                    title: Some(" ".to_string()),
                    indicator_id: Some(IndicatorId::new(404)),
                    ..ProgressReportPatch::stamp_only(f.manager.id)
                },
            )
            .await
            .unwrap_err();
        let errors = validation(err);
        assert!(!errors.messages("title").is_empty());
        assert!(!errors.messages("indicator").is_empty());
        let unchanged = f.store.find_progress_report(created.id).await.expect("find");
        assert_eq!(unchanged.title, "Q4 report");
    }

    #[tokio::test]
    async fn delete_removes_report_and_ids_are_not_reused() {
        let f = fixture().await;
        let first = f.store.create_progress_report(attrs(&f)).await.expect("create");
        f.store
            .delete_progress_report(first.id)
            .await
            .expect("delete");
        assert!(matches!(
            f.store.find_progress_report(first.id).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            f.store.delete_progress_report(first.id).await,
            Err(StoreError::NotFound(_))
        ));
        let second = f.store.create_progress_report(attrs(&f)).await.expect("create");
        assert_eq!(second.id, ProgressReportId::new(2));
    }

    #[tokio::test]
    async fn list_applies_filter_in_id_order() {
        let f = fixture().await;
        f.store
            .create_progress_report(NewProgressReport {
                draft: Some(true),
                ..attrs(&f)
            })
            .await
            .expect("draft");
        f.store.create_progress_report(attrs(&f)).await.expect("published");

        let all = f
            .store
            .list_progress_reports(&ProgressReportFilter::default())
            .await
            .expect("list");
        let ids: Vec<u64> = all.iter().map(|report| report.id.get()).collect();
        assert_eq!(ids, vec![1, 2]);

        let drafts = f
            .store
            .list_progress_reports(&ProgressReportFilter {
                draft: Some(true),
                indicator_id: None,
            })
            .await
            .expect("drafts");
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].draft);
    }

    #[tokio::test]
    async fn ownership_lists_known_indicators_only() {
        let f = fixture().await;
        let owners = f
            .store
            .indicator_ownership(&[f.indicator.id, IndicatorId::new(404)])
            .await
            .expect("ownership");
        use progress_authz::IndicatorOwnership;
        assert_eq!(owners.manager_of(f.indicator.id), Some(f.contributor.id));
        assert_eq!(owners.manager_of(IndicatorId::new(404)), None);
    }

    #[tokio::test]
    async fn user_emails_are_unique_case_insensitively() {
        let f = fixture().await;
        let err = f
            .store
            .create_user(NewUser {
                email: "Manager@Example.org".to_string(),
                name: "Again".to_string(),
                role: Role::Guest,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = f
            .store
            .find_user_by_email(" MANAGER@example.org ")
            .await
            .expect("find");
        assert_eq!(found, f.manager);
        assert!(matches!(
            f.store.find_user_by_email("nobody@example.org").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn indicator_manager_must_exist_and_not_be_guest() {
        let f = fixture().await;
        let guest = f
            .store
            .create_user(NewUser {
                email: "guest@example.org".to_string(),
                name: "Guest".to_string(),
                role: Role::Guest,
            })
            .await
            .expect("guest");
        for manager_id in [guest.id, UserId::new(404)] {
            let err = f
                .store
                .create_indicator(NewIndicator {
                    title: "Other".to_string(),
                    manager_id,
                })
                .await
                .unwrap_err();
            assert!(!validation(err).messages("manager").is_empty());
        }
    }

    #[tokio::test]
    async fn due_date_indicator_must_exist() {
        let f = fixture().await;
        let err = f
            .store
            .create_due_date(NewDueDate {
                due_date: NaiveDate::from_ymd_opt(2027, 6, 30).expect("date"),
                indicator_id: Some(IndicatorId::new(404)),
            })
            .await
            .unwrap_err();
        assert!(!validation(err).messages("indicator").is_empty());
        let stored = f.store.get_due_date(f.due_date.id).await.expect("get");
        assert_eq!(stored, f.due_date);
        assert!(matches!(
            f.store.get_due_date(DueDateId::new(404)).await,
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(f.store.backend_name(), "memory");
        assert!(f.store.health_check().await.is_ok());
    }
}
