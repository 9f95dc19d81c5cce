use chrono::NaiveDate;
use progress_authz::{DueDateId, IndicatorId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct DueDate {
    #[schema(value_type = u64)]
    pub id: DueDateId,
    pub due_date: NaiveDate,
    #[schema(value_type = Option<u64>)]
    pub indicator_id: Option<IndicatorId>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NewDueDate {
    pub due_date: NaiveDate,
    #[serde(default)]
    #[schema(value_type = Option<u64>)]
    pub indicator_id: Option<IndicatorId>,
}
