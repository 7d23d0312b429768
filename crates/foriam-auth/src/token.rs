//! Session token issuance and verification (HS256 JWT).
//!
//! Tokens are stateless: verification checks the signature and the
//! expiry only, without any store lookup.

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
}

/// Who a request or a successful credential check belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
}

impl From<SessionClaims> for AuthenticatedIdentity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            user_id: claims.user_id,
            tenant_id: claims.tenant_id,
            email: claims.email,
        }
    }
}

fn secret(config: &AuthConfig) -> Result<&[u8], AuthError> {
    if config.jwt_secret.is_empty() {
        return Err(AuthError::Crypto("JWT secret is not configured".into()));
    }
    Ok(config.jwt_secret.as_bytes())
}

/// Issue a signed HS256 session token for the identity.
pub fn issue_session_token(
    identity: &AuthenticatedIdentity,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    issue_at(identity, config, Utc::now().timestamp())
}

pub(crate) fn issue_at(
    identity: &AuthenticatedIdentity,
    config: &AuthConfig,
    iat: i64,
) -> Result<String, AuthError> {
    let exp = i64::try_from(config.token_lifetime_secs)
        .ok()
        .and_then(|lifetime| iat.checked_add(lifetime))
        .ok_or_else(|| AuthError::Crypto("token lifetime is out of range".into()))?;

    let claims = SessionClaims {
        user_id: identity.user_id,
        tenant_id: identity.tenant_id,
        email: identity.email.clone(),
        iat,
        exp,
    };

    let key = EncodingKey::from_secret(secret(config)?);
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify a session token.
pub fn decode_session_token(token: &str, config: &AuthConfig) -> Result<SessionClaims, AuthError> {
    let key = DecodingKey::from_secret(secret(config)?);

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Verify a session token and return the identity it was issued to.
pub fn verify_session_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AuthenticatedIdentity, AuthError> {
    decode_session_token(token, config).map(AuthenticatedIdentity::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "unit-test-secret".into(),
            ..AuthConfig::default()
        }
    }

    fn identity() -> AuthenticatedIdentity {
        AuthenticatedIdentity {
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            email: "alice@acme.io".into(),
        }
    }

    #[test]
    fn jwt_roundtrip() {
        let config = test_config();
        let who = identity();

        let token = issue_session_token(&who, &config).unwrap();
        let claims = decode_session_token(&token, &config).unwrap();

        assert_eq!(claims.user_id, who.user_id);
        assert_eq!(claims.tenant_id, who.tenant_id);
        assert_eq!(claims.email, who.email);
        assert_eq!(claims.exp - claims.iat, 86_400);
        assert_eq!(verify_session_token(&token, &config).unwrap(), who);
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = test_config();
        let token = issue_at(&identity(), &config, Utc::now().timestamp() - 86_401).unwrap();

        let err = verify_session_token(&token, &config).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = issue_session_token(&identity(), &test_config()).unwrap();
        let other = AuthConfig {
            jwt_secret: "someone-else".into(),
            ..AuthConfig::default()
        };

        let err = verify_session_token(&token, &other).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn garbage_is_invalid() {
        let err = verify_session_token("not.a.jwt", &test_config()).unwrap_err();
        assert!(matches!(err, AuthError::TokenInvalid(_)));
    }

    #[test]
    fn oversized_lifetime_is_rejected() {
        let config = AuthConfig {
            token_lifetime_secs: u64::MAX,
            ..test_config()
        };
        let err = issue_session_token(&identity(), &config).unwrap_err();
        assert!(matches!(err, AuthError::Crypto(_)));

        let config = AuthConfig {
            token_lifetime_secs: i64::MAX as u64,
            ..test_config()
        };
        let err = issue_session_token(&identity(), &config).unwrap_err();
        assert!(matches!(err, AuthError::Crypto(_)));
    }

    #[test]
    fn empty_secret_is_a_crypto_error() {
        let err = issue_session_token(&identity(), &AuthConfig::default()).unwrap_err();
        assert!(matches!(err, AuthError::Crypto(_)));
    }
}
