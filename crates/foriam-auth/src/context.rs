//! Typed request context derived from a verified session token.

use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::token::{AuthenticatedIdentity, verify_session_token};

const BEARER: &str = "bearer";

/// The authenticated caller of a request.
///
/// Fields are private and the only constructor verifies a token, so a
/// tenant id obtained from an `AuthContext` always comes from a token this
/// service signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    user_id: Uuid,
    tenant_id: Uuid,
    email: String,
}

impl AuthContext {
    /// Build the context from the raw `Authorization` header value.
    ///
    /// Expects `Bearer <token>`; the scheme is matched case-insensitively.
    pub fn from_authorization_header(
        header: Option<&str>,
        config: &AuthConfig,
    ) -> Result<Self, AuthError> {
        let header = header.ok_or_else(|| AuthError::TokenInvalid("missing credentials".into()))?;
        let token = bearer_token(header)
            .ok_or_else(|| AuthError::TokenInvalid("expected a bearer token".into()))?;

        verify_session_token(token, config).map(Self::from_identity)
    }

    fn from_identity(identity: AuthenticatedIdentity) -> Self {
        Self {
            user_id: identity.user_id,
            tenant_id: identity.tenant_id,
            email: identity.email,
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER) && !token.is_empty()).then_some(token)
}
