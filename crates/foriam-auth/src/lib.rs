//! ForIAM Auth — password authentication, session token issuance and
//! verification, typed request context, and RBAC permission resolution.

pub mod config;
pub mod context;
pub mod error;
pub mod password;
pub mod rbac;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use rbac::{EffectivePermissions, PermissionResolver};
pub use service::{AuthService, LoginInput, LoginOutput, NewUser};
pub use token::{AuthenticatedIdentity, SessionClaims};
