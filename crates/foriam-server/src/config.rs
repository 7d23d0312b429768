//! Layered server configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `FORIAM__<SECTION>__<KEY>` environment variables
//! (e.g. `FORIAM__AUTH__JWT_SECRET`).

use std::path::Path;

use config::{Config, Environment, File};
use foriam_auth::AuthConfig;
use foriam_auth::config::MIN_PASSWORD_FLOOR;
use foriam_db::DbConfig;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "foriam.toml";
const ENV_PREFIX: &str = "FORIAM";
const DEV_JWT_SECRET: &str = "foriam-development-secret";
const DEV_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("insecure configuration for production: {0}")]
    Insecure(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub database: DbConfig,
    pub auth: AuthSection,
    pub bootstrap: BootstrapSection,
    /// `development` or `production`.
    pub environment: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub jwt_secret: String,
    pub token_lifetime_secs: u64,
    pub min_password_length: usize,
    pub pepper: Option<String>,
    pub audit_wait_ms: u64,
}

/// Administrator created by the first-boot seed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BootstrapSection {
    pub admin_email: String,
    pub admin_password: String,
}

impl Default for AuthSection {
    fn default() -> Self {
        let auth = AuthConfig::default();
        Self {
            jwt_secret: DEV_JWT_SECRET.into(),
            token_lifetime_secs: auth.token_lifetime_secs,
            min_password_length: auth.min_password_length,
            pepper: auth.pepper,
            audit_wait_ms: auth.audit_wait_ms,
        }
    }
}

impl Default for BootstrapSection {
    fn default() -> Self {
        Self {
            admin_email: "admin@system.local".into(),
            admin_password: DEV_ADMIN_PASSWORD.into(),
        }
    }
}

impl ServerConfig {
    /// Load from `path` (if it exists) and the process environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    fn load_with_env(path: impl AsRef<Path>, env: Environment) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut builder = Config::builder();

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(env.separator("__").try_parsing(true));

        let mut cfg: ServerConfig = builder.build()?.try_deserialize()?;
        if cfg.environment.is_empty() {
            cfg.environment = "development".into();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// The password floor always applies; development defaults are
    /// refused in production.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.min_password_length < MIN_PASSWORD_FLOOR {
            return Err(ConfigError::Invalid(format!(
                "auth.min_password_length must be at least {MIN_PASSWORD_FLOOR}"
            )));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Insecure("auth.jwt_secret must not be empty"));
        }
        if !self.is_production() {
            return Ok(());
        }
        if self.auth.jwt_secret == DEV_JWT_SECRET {
            return Err(ConfigError::Insecure("auth.jwt_secret is the development default"));
        }
        if self.bootstrap.admin_password == DEV_ADMIN_PASSWORD {
            return Err(ConfigError::Insecure(
                "bootstrap.admin_password is the development default",
            ));
        }
        Ok(())
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.auth.jwt_secret.clone(),
            token_lifetime_secs: self.auth.token_lifetime_secs,
            pepper: self.auth.pepper.clone().filter(|p| !p.is_empty()),
            min_password_length: self.auth.min_password_length,
            audit_wait_ms: self.auth.audit_wait_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let cfg = ServerConfig::load_with_env(dir.path().join("missing.toml"), env(&[])).unwrap();

        assert_eq!(cfg.environment, "development");
        assert_eq!(cfg.database.url, "ws://127.0.0.1:8000");
        assert_eq!(cfg.database.namespace, "foriam");
        assert_eq!(cfg.auth.token_lifetime_secs, 86_400);
        assert_eq!(cfg.auth.min_password_length, 6);
        assert_eq!(cfg.bootstrap.admin_email, "admin@system.local");
        assert!(cfg.auth_config().pepper.is_none());
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foriam.toml");
        fs::write(
            &path,
            r#"
[database]
url = "ws://db.internal:8000"
database = "iam_test"

[auth]
jwt_secret = "from-file"
token_lifetime_secs = 3600
pepper = "pepper"
"#,
        )
        .unwrap();

        let cfg = ServerConfig::load_with_env(&path, env(&[])).unwrap();
        assert_eq!(cfg.database.url, "ws://db.internal:8000");
        assert_eq!(cfg.database.database, "iam_test");
        assert_eq!(cfg.database.namespace, "foriam");

        let auth = cfg.auth_config();
        assert_eq!(auth.jwt_secret, "from-file");
        assert_eq!(auth.token_lifetime_secs, 3600);
        assert_eq!(auth.pepper.as_deref(), Some("pepper"));

        assert_eq!(cfg.database.username, "root");
    }

    #[test]
    fn environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foriam.toml");
        fs::write(&path, "[auth]\njwt_secret = \"from-file\"\n").unwrap();

        let cfg = ServerConfig::load_with_env(
            &path,
            env(&[
                ("FORIAM__AUTH__JWT_SECRET", "from-env"),
                ("FORIAM__AUTH__TOKEN_LIFETIME_SECS", "60"),
                ("FORIAM__BOOTSTRAP__ADMIN_EMAIL", "root@acme.io"),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.auth.jwt_secret, "from-env");
        assert_eq!(cfg.auth.token_lifetime_secs, 60);
        assert_eq!(cfg.bootstrap.admin_email, "root@acme.io");
    }

    #[test]
    fn production_rejects_development_defaults() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");

        let err = ServerConfig::load_with_env(&missing, env(&[("FORIAM__ENVIRONMENT", "production")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Insecure(_)));

        let cfg = ServerConfig::load_with_env(
            &missing,
            env(&[
                ("FORIAM__ENVIRONMENT", "production"),
                ("FORIAM__AUTH__JWT_SECRET", "a-real-secret"),
                ("FORIAM__BOOTSTRAP__ADMIN_PASSWORD", "a-real-password"),
            ]),
        )
        .unwrap();
        assert!(cfg.is_production());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("foriam.toml");
        fs::write(&path, "[auth]\njwt_secret = \"\"\n").unwrap();

        let err = ServerConfig::load_with_env(&path, env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Insecure(_)));
    }

    #[test]
    fn password_floor_is_enforced() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");

        let err = ServerConfig::load_with_env(
            &missing,
            env(&[("FORIAM__AUTH__MIN_PASSWORD_LENGTH", "3")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let cfg = ServerConfig::load_with_env(
            &missing,
            env(&[("FORIAM__AUTH__MIN_PASSWORD_LENGTH", "10")]),
        )
        .unwrap();
        assert_eq!(cfg.auth_config().min_password_length, 10);
    }
}
