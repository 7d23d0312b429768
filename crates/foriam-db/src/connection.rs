//! Opening the identity store.
//!
//! The engine is picked from the URL scheme: `ws://host:port` reaches a
//! SurrealDB server, `mem://` runs an embedded in-memory store (useful for
//! local development and tests). Opening always brings the schema up to
//! date before any repository touches it.

use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::info;

use crate::error::DbError;
use crate::schema::{latest_version, run_migrations};

const MEMORY_SCHEME: &str = "mem://";

/// The `[database]` section of the server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Engine URL, e.g. `ws://127.0.0.1:8000` or `mem://`.
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials; ignored by the in-memory engine.
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000".into(),
            namespace: "foriam".into(),
            database: "iam".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl DbConfig {
    pub fn is_in_memory(&self) -> bool {
        self.url.starts_with(MEMORY_SCHEME)
    }
}

/// An open, migrated identity store. Clones share one connection.
#[derive(Clone)]
pub struct Database {
    db: Surreal<Any>,
}

impl Database {
    /// Connect, authenticate, select the namespace and database, then
    /// apply pending migrations.
    pub async fn open(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Opening identity store"
        );

        let db = any::connect(config.url.as_str()).await?;
        if !config.is_in_memory() {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }
        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await?;

        run_migrations(&db).await?;
        info!(schema_version = latest_version(), "Identity store ready");

        Ok(Self { db })
    }

    pub fn handle(&self) -> &Surreal<Any> {
        &self.db
    }
}
