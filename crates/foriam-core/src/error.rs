//! Error types for the ForIAM system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IamError {
    /// Email/password did not match an active account. Deliberately
    /// carries no detail about which part failed.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("token has expired")]
    Expired,

    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },

    #[error("{entity} name already taken: {name}")]
    DuplicateName { entity: String, name: String },

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IamError {
    /// Message safe to hand to an untrusted caller.
    ///
    /// `NotFound` and `InvalidCredentials` must not reveal whether the
    /// underlying account or resource exists, so they collapse to fixed
    /// strings. Infrastructure failures never echo their cause.
    pub fn public_message(&self) -> &'static str {
        match self {
            IamError::InvalidCredentials => "invalid credentials",
            IamError::InvalidToken { .. } | IamError::Expired => "unauthorized",
            IamError::DuplicateEmail { .. } => "email already registered",
            IamError::DuplicateName { .. } => "name already taken",
            IamError::NotFound { .. } => "not found",
            IamError::Validation { .. } => "invalid request",
            IamError::StoreUnavailable(_) | IamError::Crypto(_) | IamError::Internal(_) => {
                "internal error"
            }
        }
    }

    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        IamError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

pub type IamResult<T> = Result<T, IamError>;
