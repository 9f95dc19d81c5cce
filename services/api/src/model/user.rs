//! User registry records.
use crate::model::ValidationErrors;
use progress_authz::{Actor, Role, UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct User {
    #[schema(value_type = u64)]
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "contributor")]
    pub role: Role,
}

impl User {
    pub fn actor(&self) -> Actor {
        Actor::user(self.id, self.role)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    #[schema(value_type = String, example = "contributor")]
    pub role: Role,
}

impl NewUser {
    /// The email as stored: trimmed and lowercased.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }

    pub fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.require_present("email", Some(self.email.as_str()));
        errors.require_present("name", Some(self.name.as_str()));
        errors
    }
}
