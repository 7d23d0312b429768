//! ForIAM Server — application entry point.
//!
//! Loads configuration, opens and migrates the identity store, seeds the
//! `system` tenant on first boot, then waits for shutdown.

mod config;

use anyhow::Context;
use foriam_auth::password::hash_password;
use foriam_db::{BootstrapAdmin, Database, SeedOutcome};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_CONFIG_PATH, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match dotenvy::dotenv() {
        Err(e) if !e.not_found() => return Err(e).context("failed to read .env"),
        _ => {}
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("foriam=info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    let config_path =
        std::env::var("FORIAM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let cfg = ServerConfig::load(&config_path)
        .with_context(|| format!("loading configuration from {config_path}"))?;

    info!(environment = %cfg.environment, "Starting ForIAM server");
    if !cfg.is_production() {
        warn!("Running with development configuration; do not expose this instance");
    }

    let store = Database::open(&cfg.database)
        .await
        .context("opening identity store")?;
    let db = store.handle();

    let auth = cfg.auth_config();
    let password_hash = hash_password(&cfg.bootstrap.admin_password, auth.pepper.as_deref())
        .context("hashing bootstrap admin password")?;
    let outcome = foriam_db::seed(
        db,
        BootstrapAdmin {
            email: cfg.bootstrap.admin_email.clone(),
            password_hash,
        },
    )
    .await
    .context("seeding system tenant")?;

    match outcome {
        SeedOutcome::Seeded {
            tenant_id,
            admin_user_id,
        } => info!(%tenant_id, %admin_user_id, "System tenant seeded"),
        SeedOutcome::AlreadySeeded { tenant_id } => info!(%tenant_id, "System tenant ready"),
    }

    info!(
        token_lifetime_secs = auth.token_lifetime_secs,
        "ForIAM server ready"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("ForIAM server stopped.");
    Ok(())
}
