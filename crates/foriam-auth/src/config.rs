//! Authentication configuration.

use std::time::Duration;

/// Shortest password any deployment may accept.
pub const MIN_PASSWORD_FLOOR: usize = 6;

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HMAC-SHA256 secret used to sign and verify session tokens.
    pub jwt_secret: String,
    /// Session token lifetime in seconds (default: 86_400 = 24 hours).
    pub token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id hashing.
    pub pepper: Option<String>,
    /// Minimum password length for policy enforcement. Values below
    /// [`MIN_PASSWORD_FLOOR`] are raised to it.
    pub min_password_length: usize,
    /// How long a request waits for its audit write before moving on.
    pub audit_wait_ms: u64,
}

impl AuthConfig {
    pub fn effective_min_password_length(&self) -> usize {
        self.min_password_length.max(MIN_PASSWORD_FLOOR)
    }

    pub fn audit_budget(&self) -> Duration {
        Duration::from_millis(self.audit_wait_ms)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_lifetime_secs: 86_400,
            pepper: None,
            min_password_length: MIN_PASSWORD_FLOOR,
            audit_wait_ms: 250,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_floor_cannot_be_lowered() {
        let lax = AuthConfig {
            min_password_length: 2,
            ..AuthConfig::default()
        };
        assert_eq!(lax.effective_min_password_length(), MIN_PASSWORD_FLOOR);

        let strict = AuthConfig {
            min_password_length: 12,
            ..AuthConfig::default()
        };
        assert_eq!(strict.effective_min_password_length(), 12);
    }
}
