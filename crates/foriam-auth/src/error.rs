//! Authentication error types.

use foriam_core::error::IamError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for IamError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => IamError::InvalidCredentials,
            AuthError::TokenExpired => IamError::Expired,
            AuthError::TokenInvalid(reason) => IamError::InvalidToken { reason },
            AuthError::PasswordTooShort { min } => IamError::Validation {
                message: format!("password must be at least {min} characters"),
            },
            AuthError::Crypto(msg) => IamError::Crypto(msg),
        }
    }
}
