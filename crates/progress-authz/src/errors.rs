use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("invalid action: {0}")]
    InvalidAction(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("invalid verification key {kid}: {reason}")]
    InvalidKey { kid: String, reason: String },
    #[error("no verification keys configured")]
    MissingVerificationKeys,
    #[error("token subject is not a user id: {0}")]
    InvalidSubject(String),
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub type AuthzResult<T> = Result<T, AuthzError>;
