//! Progress-tracking data model.
//!
//! # Purpose
//! Re-exports the user, indicator, due-date and progress-report records and
//! the attribute sets accepted by the store.
mod due_date;
mod indicator;
mod progress_report;
mod user;
pub mod validation;

pub use due_date::{DueDate, NewDueDate};
pub use indicator::{Indicator, NewIndicator};
pub use progress_report::{
    NewProgressReport, ProgressReport, ProgressReportFilter, ProgressReportPatch,
};
pub use user::{NewUser, User};
pub use validation::ValidationErrors;
