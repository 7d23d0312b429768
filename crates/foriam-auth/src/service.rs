//! Authentication service: credential checks, login, account creation
//! and logout orchestration.

use foriam_audit::{AuditEvent, AuditRecorder, ClientInfo, actions};
use foriam_core::error::{IamError, IamResult};
use foriam_core::models::audit::AuditStatus;
use foriam_core::models::user::{CreateUser, User};
use foriam_core::repository::{AuditLogRepository, UserRepository};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, AuthenticatedIdentity};

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
    pub client: ClientInfo,
}

/// Successful login result.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed session token.
    pub access_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    pub expires_in: u64,
    pub identity: AuthenticatedIdentity,
}

/// Input for creating a user inside the caller's tenant.
#[derive(Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate. Audit writes run on their own
/// task; a request waits for one at most [`AuthConfig::audit_budget`].
pub struct AuthService<U: UserRepository, A: AuditLogRepository + Clone + 'static> {
    user_repo: U,
    audit: AuditRecorder<A>,
    config: AuthConfig,
}

impl<U: UserRepository, A: AuditLogRepository + Clone + 'static> AuthService<U, A> {
    pub fn new(user_repo: U, audit_repo: A, config: AuthConfig) -> Self {
        Self {
            user_repo,
            audit: AuditRecorder::new(audit_repo),
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Check an email/password pair against the active accounts.
    ///
    /// A missing account, an inactive account and a wrong password all
    /// fail with the same [`IamError::InvalidCredentials`] after the same
    /// amount of hashing work.
    pub async fn authenticate(&self, email: &str, password: &str) -> IamResult<AuthenticatedIdentity> {
        let pepper = self.config.pepper.as_deref();

        let user = match self.user_repo.get_active_by_email(email).await {
            Ok(user) => user,
            Err(IamError::NotFound { .. }) => {
                password::verify_dummy(password, pepper);
                debug!("Credential check failed");
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };

        let matches = match password::verify_password(password, &user.password_hash, pepper) {
            Ok(matches) => matches,
            Err(e) => {
                warn!(user_id = %user.id, error = %e, "Stored password hash is unusable");
                password::verify_dummy(password, pepper);
                false
            }
        };
        if !matches {
            debug!("Credential check failed");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(AuthenticatedIdentity {
            user_id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
        })
    }

    /// Authenticate and issue a session token.
    pub async fn login(&self, input: LoginInput) -> IamResult<LoginOutput> {
        let identity = self.authenticate(&input.email, &input.password).await?;
        let access_token = token::issue_session_token(&identity, &self.config)?;

        self.audit
            .record_within(
                AuditEvent::new(identity.tenant_id, actions::AUTH_LOGIN, AuditStatus::Success)
                    .actor(identity.user_id)
                    .client(&input.client),
                self.config.audit_budget(),
            )
            .await;

        info!(
            user_id = %identity.user_id,
            tenant_id = %identity.tenant_id,
            "User logged in"
        );

        Ok(LoginOutput {
            access_token,
            token_type: "Bearer",
            expires_in: self.config.token_lifetime_secs,
            identity,
        })
    }

    /// Verify the `Authorization` header of a request.
    pub fn authorize(&self, header: Option<&str>) -> IamResult<AuthContext> {
        Ok(AuthContext::from_authorization_header(header, &self.config)?)
    }

    /// Create a user in the caller's tenant.
    pub async fn create_user(
        &self,
        ctx: &AuthContext,
        input: NewUser,
        client: &ClientInfo,
    ) -> IamResult<User> {
        validate_email(&input.email)?;
        let min = self.config.effective_min_password_length();
        if input.password.chars().count() < min {
            return Err(AuthError::PasswordTooShort { min }.into());
        }

        let password_hash = password::hash_password(&input.password, self.config.pepper.as_deref())?;
        let user = self
            .user_repo
            .create(CreateUser {
                tenant_id: ctx.tenant_id(),
                email: input.email,
                password_hash,
            })
            .await?;

        self.audit
            .record_within(
                AuditEvent::new(ctx.tenant_id(), actions::USER_CREATE, AuditStatus::Success)
                    .actor(ctx.user_id())
                    .resource("user", user.id)
                    .client(client),
                self.config.audit_budget(),
            )
            .await;

        Ok(user)
    }

    /// The caller's own account.
    pub async fn profile(&self, ctx: &AuthContext) -> IamResult<User> {
        self.user_repo.get_by_id(ctx.tenant_id(), ctx.user_id()).await
    }

    /// Record a logout. Session tokens are stateless, so the presented
    /// token remains valid until it expires.
    pub async fn logout(&self, ctx: &AuthContext, client: &ClientInfo) {
        self.audit
            .record_within(
                AuditEvent::new(ctx.tenant_id(), actions::AUTH_LOGOUT, AuditStatus::Success)
                    .actor(ctx.user_id())
                    .client(client),
                self.config.audit_budget(),
            )
            .await;
    }
}

fn validate_email(email: &str) -> IamResult<()> {
    let well_formed = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if well_formed {
        Ok(())
    } else {
        Err(IamError::Validation {
            message: "email address is malformed".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(validate_email("alice@acme.io").is_ok());
        assert!(validate_email("a@b").is_ok());
        for bad in ["", "alice", "@acme.io", "alice@", "a@b@c", "al ice@acme.io"] {
            assert!(
                matches!(validate_email(bad), Err(IamError::Validation { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
