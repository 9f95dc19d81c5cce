//! Indicator records and their managing user.
use progress_authz::{IndicatorId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Indicator {
    #[schema(value_type = u64)]
    pub id: IndicatorId,
    pub title: String,
    /// The user whose contributor rights extend to this indicator's reports.
    #[schema(value_type = u64)]
    pub manager_id: UserId,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NewIndicator {
    pub title: String,
    #[schema(value_type = u64)]
    pub manager_id: UserId,
}
